pub mod data_ingest;
pub mod write_csv_files;
pub mod write_fasta_files;
