use anyhow::bail;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::{
    io::{
        data_ingest::{read_fasta, read_metadata, read_paf_index},
        write_csv_files::write_annotated_csv,
        write_fasta_files::write_to_fasta,
    },
    utils::data_processing::{annotate_metadata, annotated_headers, filter_sequences},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Cross-reference PAF alignments with sample metadata and sequences"
)]
pub struct PafAnnotateArgs {
    #[arg(long)]
    /// PAF file of queries aligned against references
    pub paf: PathBuf,

    #[arg(long)]
    /// Delimited metadata table with a header row
    pub metadata: PathBuf,

    #[arg(long)]
    /// Metadata column matched against the PAF reference names
    pub search_field: String,

    #[arg(long)]
    /// Output path for the annotated metadata table
    pub csv_out: PathBuf,

    #[arg(long)]
    /// FASTA file of reference sequences
    pub seqs: PathBuf,

    #[arg(long)]
    /// Output path for the matched reference sequences
    pub seqs_out: PathBuf,

    #[arg(short = 'd', long, default_value = ",")]
    /// Field delimiter for reading the metadata and writing the annotated table
    pub delimiter: char,
}

impl PafAnnotateArgs {
    fn delimiter_byte(&self) -> anyhow::Result<u8> {
        match u8::try_from(self.delimiter) {
            Ok(byte) if byte.is_ascii() => Ok(byte),
            _ => bail!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub references: usize,
    pub alignments: usize,
    pub rows_written: usize,
    pub sequences_written: usize,
}

/// Build the reference index, join it against the metadata and sequences, then
/// write both outputs. All inputs are read before anything is written, so a
/// parse failure leaves no output behind.
pub fn paf_annotate_process(args: &PafAnnotateArgs) -> anyhow::Result<RunSummary> {
    let delimiter = args.delimiter_byte()?;

    let index = read_paf_index(&args.paf)?;

    let table = read_metadata(&args.metadata, &args.search_field, delimiter)?;
    let annotated_rows = annotate_metadata(&table, &index);

    let sequences = read_fasta(&args.seqs)?;
    let matched = filter_sequences(sequences, &index);

    write_annotated_csv(
        &args.csv_out,
        &annotated_headers(&table.headers),
        &annotated_rows,
        delimiter,
    )?;
    write_to_fasta(&args.seqs_out, &matched)?;

    let summary = RunSummary {
        references: index.len(),
        alignments: index.alignments(),
        rows_written: annotated_rows.len(),
        sequences_written: matched.len(),
    };
    info!(
        "{} metadata rows and {} sequences matched {} alignments across {} references",
        summary.rows_written, summary.sequences_written, summary.alignments, summary.references
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::data_ingest::IngestError;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    const PAF: &str = "q1\t100\t0\t100\t+\trefA\t500\t10\t90\t80\t90\n\
                       q2\t120\t0\t120\t-\trefA\t500\t5\t95\t85\t90\n\
                       q3\t90\t0\t90\t+\trefC\t400\t0\t90\t88\t90\tNM:i:2\n";
    const METADATA: &str = "id,label\nrefA,sample1\nrefB,sample2\nrefC,\"sample, three\"\n";
    const SEQS: &str = ">refA first reference\nACGT\nACGT\n>refB\nTTTT\n>refC\nGGCC\n";

    fn write_inputs(dir: &Path, paf: &str, metadata: &str, seqs: &str) -> PafAnnotateArgs {
        std::fs::write(dir.join("in.paf"), paf).unwrap();
        std::fs::write(dir.join("meta.csv"), metadata).unwrap();
        std::fs::write(dir.join("refs.fasta"), seqs).unwrap();

        PafAnnotateArgs {
            paf: dir.join("in.paf"),
            metadata: dir.join("meta.csv"),
            search_field: "id".to_string(),
            csv_out: dir.join("out.csv"),
            seqs: dir.join("refs.fasta"),
            seqs_out: dir.join("out.fasta"),
            delimiter: ',',
        }
    }

    fn standard_run() -> (TempDir, PafAnnotateArgs) {
        let dir = tempdir().unwrap();
        let args = write_inputs(dir.path(), PAF, METADATA, SEQS);
        (dir, args)
    }

    #[test]
    fn joins_metadata_and_sequences() {
        let (_dir, args) = standard_run();
        let summary = paf_annotate_process(&args).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                references: 2,
                alignments: 3,
                rows_written: 3,
                sequences_written: 2,
            }
        );
        assert_eq!(
            std::fs::read_to_string(&args.csv_out).unwrap(),
            "id,label,query,closest\n\
             refA,sample1,q1,refA\n\
             refA,sample1,q2,refA\n\
             refC,\"sample, three\",q3,refC\n"
        );
        assert_eq!(
            std::fs::read_to_string(&args.seqs_out).unwrap(),
            ">refA query=q1,q2\nACGTACGT\n>refC query=q3\nGGCC\n"
        );
    }

    #[test]
    fn single_alignment_example() {
        let dir = tempdir().unwrap();
        let args = write_inputs(
            dir.path(),
            "q1\t100\t*\t*\t*\t refA\t500\t10\t90\t80\t90\n",
            "id,label\nrefA,sample1\n",
            ">refA\nACGT\n",
        );

        paf_annotate_process(&args).unwrap();
        assert_eq!(
            std::fs::read_to_string(&args.csv_out).unwrap(),
            "id,label,query,closest\nrefA,sample1,q1,refA\n"
        );
        assert_eq!(
            std::fs::read_to_string(&args.seqs_out).unwrap(),
            ">refA query=q1\nACGT\n"
        );
    }

    #[test]
    fn rerun_is_byte_identical() {
        let (_dir, args) = standard_run();
        paf_annotate_process(&args).unwrap();
        let csv_first = std::fs::read(&args.csv_out).unwrap();
        let fasta_first = std::fs::read(&args.seqs_out).unwrap();

        paf_annotate_process(&args).unwrap();
        assert_eq!(std::fs::read(&args.csv_out).unwrap(), csv_first);
        assert_eq!(std::fs::read(&args.seqs_out).unwrap(), fasta_first);
    }

    #[test]
    fn tab_delimited_metadata_round_trips_delimiter() {
        let dir = tempdir().unwrap();
        let mut args = write_inputs(dir.path(), PAF, "label\tid\nsample1\trefA\n", SEQS);
        args.delimiter = '\t';

        paf_annotate_process(&args).unwrap();
        assert_eq!(
            std::fs::read_to_string(&args.csv_out).unwrap(),
            "label\tid\tquery\tclosest\nsample1\trefA\tq1\trefA\nsample1\trefA\tq2\trefA\n"
        );
    }

    #[test]
    fn empty_sequence_file_gives_empty_fasta() {
        let dir = tempdir().unwrap();
        let args = write_inputs(dir.path(), PAF, METADATA, "");

        let summary = paf_annotate_process(&args).unwrap();
        assert_eq!(summary.sequences_written, 0);
        assert_eq!(summary.rows_written, 3);
        assert_eq!(std::fs::read_to_string(&args.seqs_out).unwrap(), "");
    }

    #[test]
    fn missing_search_field_writes_nothing() {
        let (_dir, mut args) = standard_run();
        args.search_field = "accession".to_string();

        let err = paf_annotate_process(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::MissingSearchField { .. })
        ));
        assert!(!args.csv_out.exists());
        assert!(!args.seqs_out.exists());
    }

    #[test]
    fn malformed_paf_writes_nothing() {
        let dir = tempdir().unwrap();
        let args = write_inputs(dir.path(), "q1\t100\trefA\n", METADATA, SEQS);

        let err = paf_annotate_process(&args).unwrap_err();
        assert!(err.to_string().contains("in.paf:1"));
        assert!(!args.csv_out.exists());
        assert!(!args.seqs_out.exists());
    }

    #[test]
    fn missing_sequence_file_is_fatal() {
        let (dir, mut args) = standard_run();
        args.seqs = dir.path().join("absent.fasta");

        let err = paf_annotate_process(&args).unwrap_err();
        assert!(err.to_string().contains("absent.fasta"));
        assert!(!args.csv_out.exists());
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let (_dir, mut args) = standard_run();
        args.delimiter = '§';
        assert!(paf_annotate_process(&args).is_err());
    }

    #[test]
    fn cli_requires_all_paths() {
        assert!(PafAnnotateArgs::try_parse_from(["paf-annotate", "--paf", "a.paf"]).is_err());

        let args = PafAnnotateArgs::try_parse_from([
            "paf-annotate",
            "--paf",
            "a.paf",
            "--metadata",
            "m.csv",
            "--search-field",
            "strain",
            "--csv-out",
            "o.csv",
            "--seqs",
            "s.fasta",
            "--seqs-out",
            "o.fasta",
        ])
        .unwrap();
        assert_eq!(args.search_field, "strain");
        assert_eq!(args.delimiter, ',');
    }
}
