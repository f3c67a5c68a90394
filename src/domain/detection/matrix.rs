// ============================================================
// MATRIX TYPES
// ============================================================
// Tabular data as it moves from the input file to the classifier

use super::FeatureSchema;

/// A slice of input rows read as one unit.
///
/// Columns are whatever the uploaded file declared; rows may be shorter
/// than the header when the file is ragged.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    /// Header names in file order
    pub columns: Vec<String>,

    /// Raw field values, one vector per row
    pub rows: Vec<Vec<String>>,

    /// Zero-based index of the first row of this chunk within the file
    pub first_row: usize,
}

impl RawChunk {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single aligned value whose type is not yet known
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

/// Rows projected onto the feature schema, values still untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    pub schema: FeatureSchema,
    pub rows: Vec<Vec<Cell>>,
}

impl AlignedMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.schema.len()
    }

    /// All values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.schema.position(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Row-major `f32` matrix that is safe to hand to a classifier.
///
/// Every value is finite and lies within the clip bound used by the cleaner
/// that built it. Only the cleaner constructs one.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    schema: FeatureSchema,
    n_rows: usize,
    values: Vec<f32>,
}

impl NumericMatrix {
    pub(crate) fn from_clean_values(schema: FeatureSchema, n_rows: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), n_rows * schema.len());
        Self {
            schema,
            n_rows,
            values,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.schema.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.n_cols() + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let width = self.n_cols();
        &self.values[row * width..(row + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(self.n_cols())
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// View the matrix as untyped cells again, e.g. to run it back through a cleaner
    pub fn to_aligned(&self) -> AlignedMatrix {
        AlignedMatrix {
            schema: self.schema.clone(),
            rows: self
                .rows()
                .map(|row| row.iter().map(|&v| Cell::Number(v as f64)).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["x".into(), "y".into()]).unwrap()
    }

    #[test]
    fn test_numeric_rows_are_row_major() {
        let matrix = NumericMatrix::from_clean_values(schema(), 2, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(matrix.row(1), &[3.0, 4.0]);
        assert_eq!(matrix.get(0, 1), 2.0);
        assert_eq!(matrix.rows().count(), 2);
    }

    #[test]
    fn test_to_aligned_round_trips_cells() {
        let matrix = NumericMatrix::from_clean_values(schema(), 1, vec![1.5, -2.0]);
        let aligned = matrix.to_aligned();
        assert_eq!(aligned.rows, vec![vec![Cell::Number(1.5), Cell::Number(-2.0)]]);
        assert_eq!(aligned.column("y"), Some(vec![&Cell::Number(-2.0)]));
    }
}
