//! The collocation result store (§3 "CollocationResult", §6.2 CSV format).
//!
//! An append-only, ordered sequence of [`Pair`]s sharing one header of
//! fixed arity `K`. `collocation_index` is assigned as `last + 1` (or `0`
//! on an empty result) and never reassigned — removing a pair during
//! online nearest-neighbour reduction (§4.8) leaves a gap, which §5 and
//! §9 record as a deliberate, bug-compatible contract rather than
//! something to paper over with a separately tracked counter.

use std::io::{Read, Write};

use crate::error::{CollocationError, Result};

/// One `(name, unit)` column of the result's difference header, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceHeader {
    pub name: String,
    pub unit: String,
}

/// A single matched sample pair (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub collocation_index: i64,
    pub product_a: String,
    pub sample_a: i32,
    pub product_b: String,
    pub sample_b: i32,
    pub differences: Vec<f64>,
}

/// The append-only pair store. `header.len()` fixes `K`; every [`Pair`]
/// pushed must carry exactly `K` differences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollocationResult {
    header: Vec<DifferenceHeader>,
    pairs: Vec<Pair>,
}

impl CollocationResult {
    pub fn new(header: Vec<DifferenceHeader>) -> Self {
        CollocationResult { header, pairs: Vec::new() }
    }

    pub fn header(&self) -> &[DifferenceHeader] {
        &self.header
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `collocation_index` the next pushed pair will receive: one more
    /// than the last pair currently in the store, or `0` if empty. Never a
    /// separately tracked counter (§9) — so a pair removed from the
    /// middle of the store can leave its old index unreachable forever,
    /// while removing the very last pair makes its index available again.
    pub fn next_collocation_index(&self) -> i64 {
        self.pairs.last().map(|p| p.collocation_index + 1).unwrap_or(0)
    }

    /// Append a pair, which must carry exactly `K` differences.
    pub fn push(&mut self, pair: Pair) -> Result<()> {
        if pair.differences.len() != self.header.len() {
            return Err(CollocationError::Csv(format!(
                "pair carries {} differences, expected {}",
                pair.differences.len(),
                self.header.len()
            )));
        }
        self.pairs.push(pair);
        Ok(())
    }

    /// Remove and return the pair at position `idx` in the current list,
    /// used by the online nearest-neighbour replacement (§4.8).
    pub fn remove_at(&mut self, idx: usize) -> Pair {
        self.pairs.remove(idx)
    }

    /// Position of the one pair (if any) matching `key` on side A's
    /// `(source_product, sample)`.
    pub fn position_by_sample_a(&self, source_product: &str, sample: i32) -> Option<usize> {
        self.pairs.iter().position(|p| p.product_a == source_product && p.sample_a == sample)
    }

    /// Position of the one pair (if any) matching `key` on side B's
    /// `(source_product, sample)`.
    pub fn position_by_sample_b(&self, source_product: &str, sample: i32) -> Option<usize> {
        self.pairs.iter().position(|p| p.product_b == source_product && p.sample_b == sample)
    }

    /// Write the result as CSV (§6.2): `collocation_index`,
    /// `source_product_a`, `index_a`, `source_product_b`, `index_b`, then
    /// one `name [unit]`-headed column per difference, each suffixed
    /// `_absdiff` except `point_distance`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
        let mut header = vec!["collocation_index".to_string(), "source_product_a".to_string(), "index_a".to_string(), "source_product_b".to_string(), "index_b".to_string()];
        for column in &self.header {
            let suffix = if column.name == "point_distance" { "" } else { "_absdiff" };
            header.push(format!("{}{} [{}]", column.name, suffix, column.unit));
        }
        csv_writer.write_record(&header).map_err(|e| CollocationError::Csv(e.to_string()))?;

        for pair in &self.pairs {
            let mut record = vec![pair.collocation_index.to_string(), pair.product_a.clone(), pair.sample_a.to_string(), pair.product_b.clone(), pair.sample_b.to_string()];
            for diff in &pair.differences {
                record.push(diff.to_string());
            }
            csv_writer.write_record(&record).map_err(|e| CollocationError::Csv(e.to_string()))?;
        }
        csv_writer.flush().map_err(|e| CollocationError::Csv(e.to_string()))?;
        Ok(())
    }

    /// Read back a result previously written by [`CollocationResult::write_csv`].
    /// The difference header's unit is recovered from the `name [unit]`
    /// column label; the `_absdiff` suffix, if present, is stripped back
    /// off the name.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
        let headers = csv_reader.headers().map_err(|e| CollocationError::Csv(e.to_string()))?.clone();
        if headers.len() < 5 {
            return Err(CollocationError::Csv("collocation CSV is missing required leading columns".to_string()));
        }
        let mut header = Vec::new();
        for column in headers.iter().skip(5) {
            let (label, unit) = parse_column_label(column)?;
            let name = label.strip_suffix("_absdiff").unwrap_or(&label).to_string();
            header.push(DifferenceHeader { name, unit });
        }
        let mut result = CollocationResult::new(header);

        for record in csv_reader.records() {
            let record = record.map_err(|e| CollocationError::Csv(e.to_string()))?;
            let field = |i: usize| -> Result<&str> { record.get(i).ok_or_else(|| CollocationError::Csv(format!("missing column {i}"))) };
            let parse_i64 = |s: &str| s.parse::<i64>().map_err(|e| CollocationError::Csv(e.to_string()));
            let parse_i32 = |s: &str| s.parse::<i32>().map_err(|e| CollocationError::Csv(e.to_string()));
            let differences = (5..record.len())
                .map(|i| record.get(i).unwrap().parse::<f64>().map_err(|e| CollocationError::Csv(e.to_string())))
                .collect::<Result<Vec<f64>>>()?;
            result.push(Pair {
                collocation_index: parse_i64(field(0)?)?,
                product_a: field(1)?.to_string(),
                sample_a: parse_i32(field(2)?)?,
                product_b: field(3)?.to_string(),
                sample_b: parse_i32(field(4)?)?,
                differences,
            })?;
        }
        Ok(result)
    }
}

/// Split a `"name [unit]"` column label into its parts.
fn parse_column_label(label: &str) -> Result<(String, String)> {
    let open = label.rfind('[').ok_or_else(|| CollocationError::Csv(format!("malformed difference column '{label}'")))?;
    let close = label.rfind(']').ok_or_else(|| CollocationError::Csv(format!("malformed difference column '{label}'")))?;
    if close < open {
        return Err(CollocationError::Csv(format!("malformed difference column '{label}'")));
    }
    let name = label[..open].trim().to_string();
    let unit = label[open + 1..close].to_string();
    Ok((name, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Vec<DifferenceHeader> {
        vec![
            DifferenceHeader { name: "datetime".to_string(), unit: "s".to_string() },
            DifferenceHeader { name: "point_distance".to_string(), unit: "m".to_string() },
        ]
    }

    #[test]
    fn collocation_index_assignment_is_last_plus_one() {
        let mut result = CollocationResult::new(sample_header());
        assert_eq!(result.next_collocation_index(), 0);
        result
            .push(Pair { collocation_index: 0, product_a: "A".into(), sample_a: 0, product_b: "B".into(), sample_b: 0, differences: vec![1.0, 2.0] })
            .unwrap();
        assert_eq!(result.next_collocation_index(), 1);
    }

    #[test]
    fn removing_the_last_pair_makes_its_index_reusable() {
        let mut result = CollocationResult::new(sample_header());
        result.push(Pair { collocation_index: 0, product_a: "A".into(), sample_a: 0, product_b: "B".into(), sample_b: 0, differences: vec![1.0, 2.0] }).unwrap();
        result.push(Pair { collocation_index: 1, product_a: "A".into(), sample_a: 1, product_b: "B".into(), sample_b: 1, differences: vec![1.0, 2.0] }).unwrap();
        result.remove_at(1);
        assert_eq!(result.next_collocation_index(), 1);
    }

    #[test]
    fn rejects_pair_with_wrong_arity() {
        let mut result = CollocationResult::new(sample_header());
        let err = result.push(Pair { collocation_index: 0, product_a: "A".into(), sample_a: 0, product_b: "B".into(), sample_b: 0, differences: vec![1.0] });
        assert!(err.is_err());
    }

    #[test]
    fn csv_round_trips_header_and_pairs() {
        let mut result = CollocationResult::new(sample_header());
        result.push(Pair { collocation_index: 0, product_a: "A001".into(), sample_a: 3, product_b: "B007".into(), sample_b: 9, differences: vec![12.5, 111.0] }).unwrap();

        let mut buf = Vec::new();
        result.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("datetime_absdiff [s]"));
        assert!(text.contains("point_distance [m]"));
        assert!(!text.contains("point_distance_absdiff"));

        let read_back = CollocationResult::read_csv(buf.as_slice()).unwrap();
        assert_eq!(read_back.header(), result.header());
        assert_eq!(read_back.pairs(), result.pairs());
    }
}
