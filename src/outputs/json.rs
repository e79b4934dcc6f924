//! JSON output of a finished briefing.
//!
//! Files are grouped by the reporting-timezone date of the run, one file per
//! desk; a second run on the same day replaces the earlier file.

use crate::models::Briefing;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the file [`write_briefing`] writes for `briefing`.
pub fn briefing_path(briefing: &Briefing, json_output_dir: &str) -> PathBuf {
    Path::new(json_output_dir)
        .join(&briefing.local_date)
        .join(format!("{}.json", briefing.desk))
}

/// Write `briefing` to `{json_output_dir}/{local_date}/{desk}.json`.
///
/// Creates the dated directory when needed and returns the written path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_briefing(
    briefing: &Briefing,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(briefing)?;
    let path = briefing_path(briefing, json_output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), items = briefing.report.items.len(), "Wrote JSON briefing");
    Ok(path)
}
