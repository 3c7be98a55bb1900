//! JSON report output

use crate::output::types::{OutputResult, Report, ReportWriter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the report as pretty-printed JSON
///
/// With `summary_only`, only the counts are written (see [`Report::summary`]).
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    path: PathBuf,
    summary_only: bool,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            summary_only: false,
        }
    }

    pub fn summary_only(mut self, summary_only: bool) -> Self {
        self.summary_only = summary_only;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportWriter for JsonReportWriter {
    fn write_report(&self, report: &Report) -> OutputResult<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        if self.summary_only {
            serde_json::to_writer_pretty(&mut writer, &report.summary())?;
        } else {
            serde_json::to_writer_pretty(&mut writer, report)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
