use ml_core::{MlError, Result, ensure_len};
use ndarray::{Array1, Array2, ArrayD, ArrayView2};

use super::Device;

/// A sparse matrix in coordinate form: one `(row, col, value)` triplet per stored entry.
///
/// Duplicate coordinates are kept as separate entries, they add up when multiplied.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix {
    shape: (usize, usize),
    row: Vec<usize>,
    col: Vec<usize>,
    data: Vec<f64>,
}

impl CooMatrix {
    /// Creates a new `CooMatrix`.
    ///
    /// # Arguments
    /// * `shape` - The `(rows, cols)` of the dense matrix it represents.
    /// * `row` - Row index of every stored entry.
    /// * `col` - Column index of every stored entry.
    /// * `data` - Value of every stored entry.
    ///
    /// # Returns
    /// A `MalformedSparse` error if the three buffers differ in length or an index is out
    /// of bounds.
    pub fn new(
        shape: (usize, usize),
        row: Vec<usize>,
        col: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self> {
        if row.len() != data.len() || col.len() != data.len() {
            return Err(MlError::MalformedSparse(format!(
                "row ({}), col ({}) and data ({}) lengths differ",
                row.len(),
                col.len(),
                data.len()
            )));
        }

        if let Some(&r) = row.iter().find(|&&r| r >= shape.0) {
            return Err(MlError::MalformedSparse(format!(
                "row index {r} out of bounds for {} rows",
                shape.0
            )));
        }

        if let Some(&c) = col.iter().find(|&&c| c >= shape.1) {
            return Err(MlError::MalformedSparse(format!(
                "column index {c} out of bounds for {} columns",
                shape.1
            )));
        }

        Ok(Self {
            shape,
            row,
            col,
            data,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }
}

/// A sparse matrix in compressed sparse row form.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// Creates a new `CsrMatrix`.
    ///
    /// # Arguments
    /// * `shape` - The `(rows, cols)` of the dense matrix it represents.
    /// * `indptr` - Row pointers, `indptr[i]..indptr[i + 1]` spans the entries of row `i`.
    /// * `indices` - Column index of every stored entry.
    /// * `data` - Value of every stored entry.
    ///
    /// # Returns
    /// A `MalformedSparse` error if the row pointers are not a non-decreasing sequence of
    /// `rows + 1` offsets ending at the entry count, or a column index is out of bounds.
    pub fn new(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self> {
        if indptr.len() != shape.0 + 1 {
            return Err(MlError::MalformedSparse(format!(
                "indptr has {} offsets, expected {}",
                indptr.len(),
                shape.0 + 1
            )));
        }

        if indices.len() != data.len() {
            return Err(MlError::MalformedSparse(format!(
                "indices ({}) and data ({}) lengths differ",
                indices.len(),
                data.len()
            )));
        }

        if indptr[0] != 0 || indptr[shape.0] != data.len() {
            return Err(MlError::MalformedSparse(
                "indptr must start at 0 and end at the entry count".into(),
            ));
        }

        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(MlError::MalformedSparse("indptr is decreasing".into()));
        }

        if let Some(&c) = indices.iter().find(|&&c| c >= shape.1) {
            return Err(MlError::MalformedSparse(format!(
                "column index {c} out of bounds for {} columns",
                shape.1
            )));
        }

        Ok(Self {
            shape,
            indptr,
            indices,
            data,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }
}

/// Anything that can be canonicalized into coordinate form.
pub trait ToCoo {
    /// Converts `self` into a `CooMatrix`.
    ///
    /// # Returns
    /// A `MalformedSparse` error if `self` is not a 2-D matrix.
    fn to_coo(&self) -> Result<CooMatrix>;
}

impl ToCoo for CooMatrix {
    fn to_coo(&self) -> Result<CooMatrix> {
        Ok(self.clone())
    }
}

impl ToCoo for CsrMatrix {
    fn to_coo(&self) -> Result<CooMatrix> {
        let row = self
            .indptr
            .windows(2)
            .enumerate()
            .flat_map(|(i, w)| std::iter::repeat_n(i, w[1] - w[0]))
            .collect();

        CooMatrix::new(self.shape, row, self.indices.clone(), self.data.clone())
    }
}

fn dense_to_coo<I>(shape: (usize, usize), values: I) -> Result<CooMatrix>
where
    I: Iterator<Item = ((usize, usize), f64)>,
{
    let (mut row, mut col, mut data) = (Vec::new(), Vec::new(), Vec::new());

    for ((r, c), v) in values.filter(|&(_, v)| v != 0.) {
        row.push(r);
        col.push(c);
        data.push(v);
    }

    CooMatrix::new(shape, row, col, data)
}

impl ToCoo for Array2<f64> {
    fn to_coo(&self) -> Result<CooMatrix> {
        dense_to_coo(self.dim(), self.indexed_iter().map(|(ix, &v)| (ix, v)))
    }
}

impl ToCoo for Array2<f32> {
    fn to_coo(&self) -> Result<CooMatrix> {
        dense_to_coo(self.dim(), self.indexed_iter().map(|(ix, &v)| (ix, v as f64)))
    }
}

impl ToCoo for ArrayD<f64> {
    fn to_coo(&self) -> Result<CooMatrix> {
        let &[rows, cols] = self.shape() else {
            return Err(MlError::MalformedSparse(format!(
                "expected a 2-D matrix, got {} dimension(s)",
                self.ndim()
            )));
        };

        let values = self.indexed_iter().map(|(ix, &v)| ((ix[0], ix[1]), v));
        dense_to_coo((rows, cols), values)
    }
}

/// A coordinate-form sparse tensor ready for matrix multiplication.
///
/// Indices are stored as a `2 x nnz` matrix of `i64` (first row: row indices, second
/// row: column indices) and values as `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTensor {
    shape: (usize, usize),
    indices: Array2<i64>,
    values: Array1<f32>,
    device: Device,
}

impl SparseTensor {
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn indices(&self) -> &Array2<i64> {
        &self.indices
    }

    pub fn values(&self) -> &Array1<f32> {
        &self.values
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterates over the stored `(row, col, value)` triplets.
    fn entries(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.indices
            .row(0)
            .into_iter()
            .zip(self.indices.row(1))
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r as usize, c as usize, v))
    }

    /// Computes `self · h`.
    ///
    /// # Arguments
    /// * `h` - A dense matrix with as many rows as `self` has columns.
    ///
    /// # Returns
    /// The dense product or a `ShapeMismatch` error.
    pub fn matmul(&self, h: ArrayView2<f32>) -> Result<Array2<f32>> {
        ensure_len("sparse operand rows", h.nrows(), self.shape.1)?;

        let mut out = Array2::zeros((self.shape.0, h.ncols()));
        for (r, c, v) in self.entries() {
            out.row_mut(r).scaled_add(v, &h.row(c));
        }

        Ok(out)
    }

    /// Computes `selfᵀ · h` without materializing the transpose.
    ///
    /// # Arguments
    /// * `h` - A dense matrix with as many rows as `self` has rows.
    ///
    /// # Returns
    /// The dense product or a `ShapeMismatch` error.
    pub fn transposed_matmul(&self, h: ArrayView2<f32>) -> Result<Array2<f32>> {
        ensure_len("sparse operand rows", h.nrows(), self.shape.0)?;

        let mut out = Array2::zeros((self.shape.1, h.ncols()));
        for (r, c, v) in self.entries() {
            out.row_mut(c).scaled_add(v, &h.row(r));
        }

        Ok(out)
    }

    /// Materializes the tensor as a dense matrix, summing duplicate coordinates.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut out = Array2::zeros(self.shape);
        for (r, c, v) in self.entries() {
            out[[r, c]] += v;
        }

        out
    }
}

/// Converts any sparse (or dense) matrix representation into a `SparseTensor`.
///
/// The input is first canonicalized to coordinate form; indices are then cast to `i64`
/// and values to `f32`, preserving their order and the input's shape.
///
/// # Arguments
/// * `matrix` - The matrix to convert.
/// * `device` - The device the tensor is placed on.
///
/// # Returns
/// The sparse tensor or a `MalformedSparse` error if `matrix` is not a valid 2-D matrix.
pub fn to_sparse_tensor<M>(matrix: &M, device: Device) -> Result<SparseTensor>
where
    M: ToCoo + ?Sized,
{
    let coo = matrix.to_coo()?;
    let nnz = coo.nnz();

    let to_i64 = |i: usize| {
        i64::try_from(i).map_err(|_| MlError::MalformedSparse(format!("index {i} overflows i64")))
    };

    let mut indices = Array2::zeros((2, nnz));
    for (k, (&r, &c)) in coo.row.iter().zip(&coo.col).enumerate() {
        indices[[0, k]] = to_i64(r)?;
        indices[[1, k]] = to_i64(c)?;
    }

    let values = coo.data.iter().map(|&v| v as f32).collect();

    log::debug!(
        "converted {}x{} sparse matrix with {nnz} entries to {device}",
        coo.shape.0,
        coo.shape.1
    );

    Ok(SparseTensor {
        shape: coo.shape,
        indices,
        values,
        device,
    })
}
