//! Caller-supplied argument matrices.
//!
//! Standards are described by small matrices in the caller's own port order:
//! the measured `A`/`B` matrices hold one complex value per frequency in each
//! cell, the reference `S` matrix holds one parameter handle per cell. Either
//! may be given as a full matrix or, for reflect-only standards, as the
//! diagonal alone.

use nalgebra::DMatrix;
use num_complex::Complex64 as C64;

use crate::error::{Error, Result};
use crate::parameter::ParameterId;

/// Dimensions of an argument matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Full { rows: usize, columns: usize },
    /// Only the `n` diagonal cells of an `n × n` matrix are given.
    Diagonal(usize),
}

impl Shape {
    pub fn rows(&self) -> usize {
        match *self {
            Shape::Full { rows, .. } => rows,
            Shape::Diagonal(n) => n,
        }
    }

    pub fn columns(&self) -> usize {
        match *self {
            Shape::Full { columns, .. } => columns,
            Shape::Diagonal(n) => n,
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(self, Shape::Diagonal(_))
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        match *self {
            Shape::Full { rows, columns } => rows * columns,
            Shape::Diagonal(n) => n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row and column of stored cell `k`.
    pub fn cell(&self, k: usize) -> (usize, usize) {
        match *self {
            Shape::Full { columns, .. } => (k / columns, k % columns),
            Shape::Diagonal(_) => (k, k),
        }
    }

    /// Storage index of (`row`, `column`), if that cell is stored.
    pub fn index(&self, row: usize, column: usize) -> Option<usize> {
        match *self {
            Shape::Full { rows, columns } if row < rows && column < columns => {
                Some(row * columns + column)
            }
            Shape::Diagonal(n) if row == column && row < n => Some(row),
            _ => None,
        }
    }
}

/// Matrix of `T` cells stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgMatrix<T> {
    shape: Shape,
    cells: Vec<T>,
}

/// Measured matrix: one frequency series per cell.
pub type SeriesMatrix = ArgMatrix<Vec<C64>>;

/// Reference matrix: one parameter handle per cell.
pub type ParameterMatrix = ArgMatrix<ParameterId>;

impl<T> ArgMatrix<T> {
    /// Full `rows × columns` matrix from row-major `cells`.
    pub fn full(rows: usize, columns: usize, cells: Vec<T>) -> Result<Self> {
        if cells.len() != rows * columns {
            return Err(Error::InvalidDimensions(format!(
                "{}x{} matrix needs {} cells, got {}",
                rows,
                columns,
                rows * columns,
                cells.len()
            )));
        }
        Ok(Self {
            shape: Shape::Full { rows, columns },
            cells,
        })
    }

    /// Diagonal matrix from its diagonal cells.
    pub fn diagonal(cells: Vec<T>) -> Self {
        Self {
            shape: Shape::Diagonal(cells.len()),
            cells,
        }
    }

    /// Full matrix with cell (i, j) set to `f(i, j)`.
    pub fn from_fn(rows: usize, columns: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(rows * columns);
        for i in 0..rows {
            for j in 0..columns {
                cells.push(f(i, j));
            }
        }
        Self {
            shape: Shape::Full { rows, columns },
            cells,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Cell (`row`, `column`), if stored.
    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        self.shape.index(row, column).map(|k| &self.cells[k])
    }

    /// Stored cells with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.cells.iter().enumerate().map(|(k, v)| {
            let (i, j) = self.shape.cell(k);
            (i, j, v)
        })
    }
}

impl ArgMatrix<Vec<C64>> {
    /// Number of frequencies, if every cell holds the same number.
    pub fn frequencies(&self) -> Option<usize> {
        let n = self.cells.first().map_or(0, Vec::len);
        self.cells.iter().all(|c| c.len() == n).then_some(n)
    }

    /// Values at frequency index `findex` as a dense matrix; unstored cells
    /// of a diagonal matrix are zero.
    pub fn at(&self, findex: usize) -> DMatrix<C64> {
        let mut m = DMatrix::from_element(
            self.shape.rows(),
            self.shape.columns(),
            C64::new(0.0, 0.0),
        );
        for (i, j, series) in self.iter() {
            m[(i, j)] = series[findex];
        }
        m
    }
}
