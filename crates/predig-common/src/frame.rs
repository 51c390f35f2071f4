//! A small ordered-column string table.
//!
//! Every predictor output and every pipeline intermediate is a `Frame`:
//! column names in a fixed order plus rows of string cells. Cells stay
//! strings until feature assembly, where the numeric columns are parsed
//! once, so adapters never need per-tool numeric schemas.

use crate::error::{PredigError, Result};
use std::collections::HashMap;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    // ── Construction ─────────────────────────────────────────────────────

    /// Read a headered CSV (or other delimiter) into a frame.
    pub fn from_delimited_reader<R: io::Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut frame = Frame::new(columns);

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            if row.len() != frame.columns.len() {
                return Err(PredigError::InputValidation(format!(
                    "row {} has {} field(s), the header has {}",
                    i + 2,
                    row.len(),
                    frame.columns.len()
                )));
            }
            frame.rows.push(row);
        }
        Ok(frame)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_delimited_reader(file, b',')
    }

    /// Read a headerless delimited table, assigning the given column names.
    pub fn from_headerless_reader<R: io::Read>(
        reader: R,
        delimiter: u8,
        columns: Vec<&str>,
    ) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut frame = Frame::new(columns);
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            if row.len() != frame.columns.len() {
                return Err(PredigError::InputValidation(format!(
                    "row {} has {} field(s), expected {}",
                    i + 1,
                    row.len(),
                    frame.columns.len()
                )));
            }
            frame.rows.push(row);
        }
        Ok(frame)
    }

    // ── Shape & access ───────────────────────────────────────────────────

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| PredigError::SchemaMismatch(format!("column '{}' not found", name)))?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PredigError::SchemaMismatch(format!(
                "row has {} field(s), frame has {} column(s)",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    // ── Column operations ────────────────────────────────────────────────

    /// Rename a column in place. Missing source columns are ignored so that
    /// adapters can normalize optional tool columns unconditionally.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Project onto a subset of columns, in the requested order.
    pub fn select(&self, names: &[&str]) -> Result<Frame> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| PredigError::SchemaMismatch(format!("column '{}' not found", n)))
            })
            .collect::<Result<_>>()?;

        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();

        Ok(Frame {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        })
    }

    pub fn add_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(PredigError::SchemaMismatch(format!(
                "column '{}' has {} value(s), frame has {} row(s)",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        if self.has_column(name) {
            return Err(PredigError::SchemaMismatch(format!(
                "column '{}' already exists",
                name
            )));
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Drop a column if present. No-op otherwise, which makes repeated
    /// deletion passes idempotent.
    pub fn drop_column(&mut self, name: &str) {
        if let Some(idx) = self.column_index(name) {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
    }

    /// Reorder columns so the listed names come first, keeping the remainder
    /// in their current relative order. Listed names absent from the frame
    /// are skipped.
    pub fn reorder_front(&mut self, front: &[&str]) {
        let mut order: Vec<usize> = Vec::with_capacity(self.columns.len());
        for name in front {
            if let Some(idx) = self.column_index(name) {
                if !order.contains(&idx) {
                    order.push(idx);
                }
            }
        }
        for idx in 0..self.columns.len() {
            if !order.contains(&idx) {
                order.push(idx);
            }
        }
        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        self.rows = self
            .rows
            .iter()
            .map(|r| order.iter().map(|&i| r[i].clone()).collect())
            .collect();
    }

    // ── Joins ────────────────────────────────────────────────────────────

    /// Inner join: for every row of `self`, look up `other` by key and append
    /// the matching row's non-key columns. Rows without a match are dropped;
    /// `self` row order is preserved.
    ///
    /// Duplicate keys in `other` collapse to the first occurrence. Colliding
    /// column names on the right side are disambiguated with `suffix`.
    pub fn inner_join(&self, other: &Frame, key: &str, suffix: &str) -> Result<Frame> {
        let self_key = self
            .column_index(key)
            .ok_or_else(|| PredigError::SchemaMismatch(format!("join key '{}' missing on left", key)))?;
        let other_key = other
            .column_index(key)
            .ok_or_else(|| PredigError::SchemaMismatch(format!("join key '{}' missing on right", key)))?;

        // First occurrence wins for duplicate right-side keys.
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(other.n_rows());
        for (i, row) in other.rows.iter().enumerate() {
            let k = row[other_key].as_str();
            if index.contains_key(k) {
                tracing::warn!(key = k, "duplicate join key on right side, keeping first");
            } else {
                index.insert(k, i);
            }
        }

        let mut columns = self.columns.clone();
        let mut appended: Vec<usize> = Vec::new();
        for (i, name) in other.columns.iter().enumerate() {
            if i == other_key {
                continue;
            }
            appended.push(i);
            if self.has_column(name) {
                columns.push(format!("{}_{}", name, suffix));
            } else {
                columns.push(name.clone());
            }
        }

        let mut rows = Vec::new();
        for row in &self.rows {
            if let Some(&match_idx) = index.get(row[self_key].as_str()) {
                let mut joined = row.clone();
                let other_row = &other.rows[match_idx];
                for &i in &appended {
                    joined.push(other_row[i].clone());
                }
                rows.push(joined);
            }
        }

        Ok(Frame { columns, rows })
    }

    // ── Persistence ──────────────────────────────────────────────────────

    pub fn to_csv_writer<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv_writer(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<&str>, rows: Vec<Vec<&str>>) -> Frame {
        let mut f = Frame::new(columns);
        for row in rows {
            f.push_row(row.into_iter().map(String::from).collect()).unwrap();
        }
        f
    }

    #[test]
    fn test_csv_round_trip() {
        let f = frame(
            vec!["epitope", "score"],
            vec![vec!["SIINFEKL", "0.9"], vec!["GILGFVFTL", "0.2"]],
        );
        let mut buf = Vec::new();
        f.to_csv_writer(&mut buf).unwrap();
        let parsed = Frame::from_delimited_reader(buf.as_slice(), b',').unwrap();
        assert_eq!(parsed, f);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let csv = "epitope,allele\nSIINFEKL,HLA-A*02:01\nGILGFVFTL\n";
        let err = Frame::from_delimited_reader(csv.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, PredigError::InputValidation(_)));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let left = frame(
            vec!["epitope", "a"],
            vec![vec!["SIINFEKL", "1"], vec!["GILGFVFTL", "2"]],
        );
        let right = frame(vec!["epitope", "b"], vec![vec!["SIINFEKL", "9"]]);
        let joined = left.inner_join(&right, "epitope", "right").unwrap();
        assert_eq!(joined.n_rows(), 1);
        assert_eq!(joined.cell(0, "b"), Some("9"));
    }

    #[test]
    fn test_inner_join_suffixes_collisions() {
        let left = frame(vec!["epitope", "score"], vec![vec!["SIINFEKL", "1"]]);
        let right = frame(vec!["epitope", "score"], vec![vec!["SIINFEKL", "2"]]);
        let joined = left.inner_join(&right, "epitope", "noah").unwrap();
        assert_eq!(joined.columns(), &["epitope", "score", "score_noah"]);
        assert_eq!(joined.cell(0, "score"), Some("1"));
        assert_eq!(joined.cell(0, "score_noah"), Some("2"));
    }

    #[test]
    fn test_inner_join_duplicate_right_keys_collapse() {
        let left = frame(vec!["epitope"], vec![vec!["SIINFEKL"]]);
        let right = frame(
            vec!["epitope", "b"],
            vec![vec!["SIINFEKL", "first"], vec!["SIINFEKL", "second"]],
        );
        let joined = left.inner_join(&right, "epitope", "x").unwrap();
        assert_eq!(joined.n_rows(), 1);
        assert_eq!(joined.cell(0, "b"), Some("first"));
    }

    #[test]
    fn test_drop_column_is_idempotent() {
        let mut f = frame(vec!["epitope", "junk"], vec![vec!["SIINFEKL", "x"]]);
        f.drop_column("junk");
        let once = f.clone();
        f.drop_column("junk");
        assert_eq!(f, once);
    }

    #[test]
    fn test_reorder_front() {
        let mut f = frame(
            vec!["b", "a", "id"],
            vec![vec!["2", "1", "k"]],
        );
        f.reorder_front(&["id", "a"]);
        assert_eq!(f.columns(), &["id", "a", "b"]);
        assert_eq!(f.rows()[0], vec!["k", "1", "2"]);
    }

    #[test]
    fn test_headerless_reader() {
        let text = "HLA-A*02:01\tSIINFEKL\t0.7\n";
        let f = Frame::from_headerless_reader(text.as_bytes(), b'\t', vec!["allele", "peptide", "score"])
            .unwrap();
        assert_eq!(f.n_rows(), 1);
        assert_eq!(f.cell(0, "score"), Some("0.7"));
    }
}
