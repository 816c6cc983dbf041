use crate::error::ExportError;
use crate::report::CapacityReport;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Whitespace of the JSON export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonLayout {
    /// Indented, for reading and diffing.
    #[default]
    Pretty,
    /// One line, for piping into other tools.
    Compact,
}

/// Writes the whole report (header, records and summary) as JSON, ending
/// with a newline.
pub fn export_json<P: AsRef<Path>>(
    report: &CapacityReport,
    path: P,
    layout: JsonLayout,
) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    match layout {
        JsonLayout::Pretty => serde_json::to_writer_pretty(&mut writer, report)?,
        JsonLayout::Compact => serde_json::to_writer(&mut writer, report)?,
    }
    writeln!(writer)
        .and_then(|()| writer.flush())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    tracing::info!(
        path = %path_ref.display(),
        records = report.records.len(),
        ?layout,
        "Exported JSON"
    );
    Ok(())
}
