use anyhow::Context;
use csv::{StringRecord, WriterBuilder};
use log::info;
use std::path::Path;

//////////////// Function to write the annotated metadata CSV ///////////////
pub fn write_annotated_csv(
    file_path: &Path,
    headers: &StringRecord,
    rows: &[StringRecord],
    delimiter: u8,
) -> anyhow::Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;

    let write_context = || format!("Could not write {}", file_path.display());
    csv_writer.write_record(headers).with_context(write_context)?;
    for row in rows {
        csv_writer.write_record(row).with_context(write_context)?;
    }

    csv_writer.flush().with_context(write_context)?;
    info!("CSV written to {}", file_path.display());

    Ok(())
}
