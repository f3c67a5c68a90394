// ============================================================
// MATRIX CLEANER
// ============================================================
// Turn untyped aligned cells into a finite, clipped f32 matrix

use crate::domain::detection::{AlignedMatrix, Cell, NumericMatrix};

/// Normalizes aligned data into classifier input.
///
/// Steps run in a fixed order: coerce to number, drop infinities, fill
/// missing values, clip, narrow to `f32`. No input makes it fail.
#[derive(Debug, Clone, Copy)]
pub struct MatrixCleaner {
    clip_bound: f64,
    fill_value: f64,
}

impl Default for MatrixCleaner {
    fn default() -> Self {
        Self {
            clip_bound: 1e6,
            fill_value: 0.0,
        }
    }
}

impl MatrixCleaner {
    pub fn new(clip_bound: f64) -> Self {
        Self {
            clip_bound,
            ..Self::default()
        }
    }

    pub fn clean(&self, matrix: AlignedMatrix) -> NumericMatrix {
        let n_rows = matrix.n_rows();
        let mut values = Vec::with_capacity(n_rows * matrix.n_cols());

        for row in &matrix.rows {
            values.extend(row.iter().map(|cell| self.clean_cell(cell)));
        }

        NumericMatrix::from_clean_values(matrix.schema, n_rows, values)
    }

    fn clean_cell(&self, cell: &Cell) -> f32 {
        let value = coerce_numeric(cell)
            .filter(|v| !v.is_infinite())
            .filter(|v| !v.is_nan())
            .unwrap_or(self.fill_value);

        value.clamp(-self.clip_bound, self.clip_bound) as f32
    }
}

/// Parse one cell as a number; `None` marks a missing value
pub fn coerce_numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) => Some(*v),
        Cell::Missing => None,
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.eq_ignore_ascii_case("true") {
                return Some(1.0);
            }
            if trimmed.eq_ignore_ascii_case("false") {
                return Some(0.0);
            }
            trimmed.parse::<f64>().ok()
        }
    }
}
