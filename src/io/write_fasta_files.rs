use anyhow::Context;
use log::info;
use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};

use crate::utils::data_processing::MatchedSeq;

//////////////// Function to write fasta ///////////////
pub fn write_to_fasta(output_file: &Path, matched: &[MatchedSeq]) -> anyhow::Result<()> {
    let mut writer = {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(output_file)
            .with_context(|| format!("Could not create {}", output_file.display()))?;
        BufWriter::new(file)
    };

    let mut write_all = || -> std::io::Result<()> {
        for seq in matched {
            writeln!(writer, ">{}", seq.header())?;
            writer.write_all(&seq.sequence)?;
            writeln!(writer)?;
        }
        writer.flush()
    };
    write_all().with_context(|| format!("Could not write {}", output_file.display()))?;

    info!(" -> FASTA written to {}", output_file.display());
    Ok(())
}
