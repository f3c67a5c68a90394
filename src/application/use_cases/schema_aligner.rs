// ============================================================
// SCHEMA ALIGNER
// ============================================================
// Project an arbitrary chunk onto the classifier's feature columns

use crate::domain::detection::{AlignedMatrix, Cell, FeatureSchema, RawChunk};

/// Value used for schema columns the upload does not provide
pub const MISSING_COLUMN_FILL: f64 = 0.0;

/// Select and reorder `chunk` columns to match `schema`.
///
/// Schema columns absent from the chunk are filled with `0`, columns the
/// schema does not name are dropped. When the header repeats a name the
/// first occurrence is used. Never fails.
pub fn align(chunk: RawChunk, schema: &FeatureSchema) -> AlignedMatrix {
    let sources: Vec<Option<usize>> = schema
        .names()
        .iter()
        .map(|name| chunk.columns.iter().position(|c| c == name))
        .collect();

    let rows = chunk
        .rows
        .into_iter()
        .map(|mut row| {
            sources
                .iter()
                .map(|source| match source {
                    Some(idx) => match row.get_mut(*idx) {
                        Some(value) => Cell::Text(std::mem::take(value)),
                        None => Cell::Missing,
                    },
                    None => Cell::Number(MISSING_COLUMN_FILL),
                })
                .collect()
        })
        .collect();

    AlignedMatrix {
        schema: schema.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(columns: &[&str], rows: &[&[&str]]) -> RawChunk {
        RawChunk {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
            first_row: 0,
        }
    }

    fn text(v: &str) -> Cell {
        Cell::Text(v.to_string())
    }

    #[test]
    fn test_missing_columns_are_zero_filled() {
        let schema = FeatureSchema::new(vec!["f1".into(), "f2".into()]).unwrap();
        let aligned = align(chunk(&["f1"], &[&["1"], &["bad"], &["1e9"]]), &schema);

        let zero = Cell::Number(0.0);
        assert_eq!(aligned.schema.names(), &["f1", "f2"]);
        assert_eq!(aligned.column("f2").unwrap(), vec![&zero; 3]);
        assert_eq!(
            aligned.column("f1").unwrap(),
            vec![&text("1"), &text("bad"), &text("1e9")]
        );
    }

    #[test]
    fn test_reorders_and_drops_extra_columns() {
        let schema = FeatureSchema::new(vec!["b".into(), "a".into()]).unwrap();
        let aligned = align(chunk(&["a", "extra", "b"], &[&["1", "x", "2"]]), &schema);

        assert_eq!(aligned.n_cols(), 2);
        assert_eq!(aligned.rows[0], vec![text("2"), text("1")]);
    }

    #[test]
    fn test_short_rows_yield_missing_cells() {
        let schema = FeatureSchema::new(vec!["a".into(), "b".into()]).unwrap();
        let aligned = align(chunk(&["a", "b"], &[&["1"]]), &schema);

        assert_eq!(aligned.rows[0], vec![text("1"), Cell::Missing]);
    }

    #[test]
    fn test_first_duplicate_header_wins() {
        let schema = FeatureSchema::new(vec!["a".into()]).unwrap();
        let aligned = align(chunk(&["a", "a"], &[&["first", "second"]]), &schema);

        assert_eq!(aligned.rows[0], vec![text("first")]);
    }

    #[test]
    fn test_empty_chunk_keeps_schema() {
        let schema = FeatureSchema::new(vec!["a".into()]).unwrap();
        let aligned = align(chunk(&[], &[]), &schema);

        assert_eq!(aligned.n_rows(), 0);
        assert_eq!(aligned.n_cols(), 1);
    }
}
