//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes a [`Briefing`](crate::models::Briefing) to a dated JSON file
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2024-01-02/
//!     ├── stock.json
//!     └── coin.json
//! ```

pub mod json;
