use ml_core::{MlError, Result, ensure_len};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// An in-memory table of samples whose last column holds the binary label.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    rows: Array2<f32>,
}

impl TabularDataset {
    /// Creates a new `TabularDataset`.
    ///
    /// # Arguments
    /// * `rows` - One sample per row, the label in the last column.
    ///
    /// # Returns
    /// An `InvalidInput` error if the table has no columns or a label is not finite.
    pub fn new(rows: Array2<f32>) -> Result<Self> {
        if rows.ncols() == 0 {
            return Err(MlError::InvalidInput("dataset needs a label column"));
        }

        let dataset = Self { rows };
        if dataset.labels().iter().any(|l| !l.is_finite()) {
            return Err(MlError::InvalidInput("labels must be finite"));
        }

        Ok(dataset)
    }

    /// Creates a new `TabularDataset` from row vectors of equal length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(nrows * ncols);
        for row in rows {
            ensure_len("row length", row.len(), ncols)?;
            flat.extend(row);
        }

        let rows = Array2::from_shape_vec((nrows, ncols), flat)
            .map_err(|_| MlError::InvalidInput("rows do not form a table"))?;

        Self::new(rows)
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    pub fn rows(&self) -> ArrayView2<'_, f32> {
        self.rows.view()
    }

    /// The last column of every row.
    pub fn labels(&self) -> Array1<f32> {
        self.rows.column(self.rows.ncols() - 1).to_owned()
    }

    /// Copies the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Array2<f32> {
        self.rows.select(Axis(0), indices)
    }
}
