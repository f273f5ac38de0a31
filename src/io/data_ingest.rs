use anyhow::Context;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use zoe::data::fasta::FastaSeq;

use crate::utils::file_io::{open_fasta_file, open_readable};

/// Number of mandatory columns in a PAF line.
pub const PAF_MIN_FIELDS: usize = 11;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(
        "{}:{line}: expected at least {min} tab-separated fields, found {found}",
        .path.display(),
        min = PAF_MIN_FIELDS
    )]
    MalformedPaf {
        path: PathBuf,
        line: usize,
        found: usize,
    },
    #[error(
        "{}:{line}: column {column} should be an unsigned integer, found {value:?}",
        .path.display()
    )]
    InvalidPafNumber {
        path: PathBuf,
        line: usize,
        column: usize,
        value: String,
    },
    #[error(
        "{}: search field {field:?} is not in the header (available: {available})",
        .path.display()
    )]
    MissingSearchField {
        path: PathBuf,
        field: String,
        available: String,
    },
    #[error("{}: malformed FASTA record", .path.display())]
    MalformedFasta {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/////////////// Structs to hold alignment data ///////////////

/// One line of a PAF file. Optional SAM-like tags past column 11 are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PafRecord {
    pub query_name: String,
    pub query_length: u64,
    pub reference_name: String,
    pub reference_length: u64,
    pub match_start: u64,
    pub match_end: u64,
    pub match_count: u64,
    pub block_length: u64,
}

impl PafRecord {
    /// Parse a single PAF line. `line` is 1-based and only used for errors.
    pub fn parse_line(text: &str, path: &Path, line: usize) -> Result<Self, IngestError> {
        let fields: Vec<&str> = text.split('\t').map(str::trim).collect();
        if fields.len() < PAF_MIN_FIELDS {
            return Err(IngestError::MalformedPaf {
                path: path.to_path_buf(),
                line,
                found: fields.len(),
            });
        }

        let number = |column: usize| {
            fields[column]
                .parse::<u64>()
                .map_err(|_| IngestError::InvalidPafNumber {
                    path: path.to_path_buf(),
                    line,
                    column,
                    value: fields[column].to_string(),
                })
        };

        Ok(PafRecord {
            query_name: fields[0].to_string(),
            query_length: number(1)?,
            reference_name: fields[5].to_string(),
            reference_length: number(6)?,
            match_start: number(7)?,
            match_end: number(8)?,
            match_count: number(9)?,
            block_length: number(10)?,
        })
    }
}

/// Reference name -> every query that aligned to it, in file order.
///
/// Only built through [`FromIterator`], so it is never modified once the
/// alignment file has been consumed.
#[derive(Debug, Default)]
pub struct ClosestIndex {
    closest_to_query: HashMap<String, Vec<String>>,
    alignments: usize,
}

impl ClosestIndex {
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<&[String]> {
        self.closest_to_query.get(reference).map(Vec::as_slice)
    }

    /// Number of distinct references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.closest_to_query.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closest_to_query.is_empty()
    }

    /// Number of alignment lines the index was built from.
    #[must_use]
    pub fn alignments(&self) -> usize {
        self.alignments
    }
}

impl FromIterator<PafRecord> for ClosestIndex {
    fn from_iter<I: IntoIterator<Item = PafRecord>>(iter: I) -> Self {
        let mut index = ClosestIndex::default();
        for record in iter {
            index
                .closest_to_query
                .entry(record.reference_name)
                .or_default()
                .push(record.query_name);
            index.alignments += 1;
        }
        index
    }
}

/// Read a PAF file into a [`ClosestIndex`]. The first malformed line aborts.
pub fn read_paf_index(path: &Path) -> anyhow::Result<ClosestIndex> {
    let reader = BufReader::new(
        open_readable(path)
            .with_context(|| format!("Could not open PAF file {}", path.display()))?,
    );

    let mut records = Vec::new();
    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result
            .with_context(|| format!("Could not read line {} of {}", idx + 1, path.display()))?;
        let record = PafRecord::parse_line(&line, path, idx + 1)?;
        debug!(
            "{} ({} bp) -> {} ({} bp) {}..{} matches {}/{}",
            record.query_name,
            record.query_length,
            record.reference_name,
            record.reference_length,
            record.match_start,
            record.match_end,
            record.match_count,
            record.block_length
        );
        records.push(record);
    }

    let index: ClosestIndex = records.into_iter().collect();
    if index.is_empty() {
        warn!("No alignments found in {}", path.display());
    }
    info!(
        "Indexed {} alignments against {} references from {}",
        index.alignments(),
        index.len(),
        path.display()
    );
    Ok(index)
}

/////////////// Metadata table ///////////////

/// A delimited metadata table with its header and the column used for joining.
#[derive(Debug)]
pub struct MetadataTable {
    pub headers: StringRecord,
    pub search_column: usize,
    pub rows: Vec<StringRecord>,
}

impl MetadataTable {
    /// Value of the search field for `row`.
    #[must_use]
    pub fn search_value<'a>(&self, row: &'a StringRecord) -> &'a str {
        row.get(self.search_column).unwrap_or_default()
    }
}

/// Read the full metadata table. Every row must have as many fields as the
/// header.
pub fn read_metadata(
    path: &Path,
    search_field: &str,
    delimiter: u8,
) -> anyhow::Result<MetadataTable> {
    let reader = open_readable(path)
        .with_context(|| format!("Could not open metadata file {}", path.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .with_context(|| format!("Could not read the header of {}", path.display()))?
        .clone();

    let search_column = headers
        .iter()
        .position(|name| name == search_field)
        .ok_or_else(|| IngestError::MissingSearchField {
            path: path.to_path_buf(),
            field: search_field.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let rows = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Could not read metadata rows from {}", path.display()))?;

    info!("Read {} metadata rows from {}", rows.len(), path.display());
    Ok(MetadataTable {
        headers,
        search_column,
        rows,
    })
}

/////////////// Sequences ///////////////

/// A FASTA record keyed by the first word of its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: String,
    pub sequence: Vec<u8>,
}

impl From<FastaSeq> for SeqRecord {
    fn from(FastaSeq { name, sequence }: FastaSeq) -> Self {
        let id = name.split_whitespace().next().unwrap_or_default().to_string();
        SeqRecord { id, sequence }
    }
}

/// Read every record of a (possibly gzipped) FASTA file.
pub fn read_fasta(path: &Path) -> anyhow::Result<Vec<SeqRecord>> {
    let Some(reader) = open_fasta_file(path)
        .with_context(|| format!("Could not open sequence file {}", path.display()))?
    else {
        warn!("No sequences found in {}", path.display());
        return Ok(Vec::new());
    };

    let records = reader
        .map(|record| {
            record
                .map(SeqRecord::from)
                .map_err(|source| IngestError::MalformedFasta {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!("Read {} sequences from {}", records.len(), path.display());
    Ok(records)
}
