use csv::StringRecord;
use log::debug;

use crate::io::data_ingest::{ClosestIndex, MetadataTable, SeqRecord};

/// Columns appended to the metadata header, in order.
pub const QUERY_COLUMN: &str = "query";
pub const CLOSEST_COLUMN: &str = "closest";

/// A sequence that received at least one query, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedSeq {
    pub id: String,
    pub queries: String,
    pub sequence: Vec<u8>,
}

impl MatchedSeq {
    /// FASTA header line without the leading `>`.
    #[must_use]
    pub fn header(&self) -> String {
        format!("{} query={}", self.id, self.queries)
    }
}

#[must_use]
pub fn annotated_headers(headers: &StringRecord) -> StringRecord {
    let mut out = headers.clone();
    out.push_field(QUERY_COLUMN);
    out.push_field(CLOSEST_COLUMN);
    out
}

/// Inner join of the metadata rows against the index. A row is emitted once
/// per query mapped to its search value; unmatched rows are dropped.
#[must_use]
pub fn annotate_metadata(table: &MetadataTable, index: &ClosestIndex) -> Vec<StringRecord> {
    let mut annotated = Vec::new();

    for row in &table.rows {
        let closest = table.search_value(row);
        let Some(queries) = index.get(closest) else {
            debug!("No alignment for metadata value {closest:?}");
            continue;
        };

        for query in queries {
            let mut new_row = row.clone();
            new_row.push_field(query);
            new_row.push_field(closest);
            annotated.push(new_row);
        }
    }

    annotated
}

/// Keep only sequences whose id is a reference in the index, tagging each with
/// its queries comma-joined in index order.
#[must_use]
pub fn filter_sequences(records: Vec<SeqRecord>, index: &ClosestIndex) -> Vec<MatchedSeq> {
    records
        .into_iter()
        .filter_map(|SeqRecord { id, sequence }| {
            let queries = index.get(&id)?.join(",");
            Some(MatchedSeq {
                id,
                queries,
                sequence,
            })
        })
        .collect()
}
