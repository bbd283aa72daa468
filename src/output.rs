use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use digest_core::{CoreError, PostRecord};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

/// Writes the day's records to `path` as a pretty-printed JSON array.
///
/// The file uses four-space indentation and leaves non-ASCII text
/// unescaped, so quoted post titles stay readable in the raw file.
pub fn write_batch(path: &Path, records: &[PostRecord]) -> Result<(), CoreError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer)?;
    writer.flush()?;

    info!(
        "Saved analysis for {} posts to {}",
        records.len(),
        path.display()
    );
    Ok(())
}
