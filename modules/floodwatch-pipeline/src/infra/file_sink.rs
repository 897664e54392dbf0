use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use floodwatch_common::ConsolidatedReport;

use crate::traits::ReportSink;

const REPORT_PREFIX: &str = "flood_reports";

/// Filesystem report store: `<root>/<bucket>/flood_reports/<report_id>.json`.
/// Archived images land next to the reports under their original file name.
pub struct FileReportSink {
    root: PathBuf,
}

impl FileReportSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn prefix_dir(&self, bucket: &str) -> Result<PathBuf> {
        let bucket = bucket.trim();
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            bail!("invalid storage target {bucket:?}");
        }
        Ok(self.root.join(bucket).join(REPORT_PREFIX))
    }
}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn persist(&self, bucket: &str, report: &ConsolidatedReport) -> Result<String> {
        let dir = self.prefix_dir(bucket)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}.json", report.report_id));
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path.display().to_string())
    }

    async fn archive_image(&self, bucket: &str, path: &Path) -> Result<String> {
        let Some(name) = path.file_name() else {
            bail!("image path has no file name: {}", path.display());
        };
        let dir = self.prefix_dir(bucket)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let target = dir.join(name);
        tokio::fs::copy(path, &target)
            .await
            .with_context(|| format!("failed to copy {}", path.display()))?;
        Ok(target.display().to_string())
    }
}
