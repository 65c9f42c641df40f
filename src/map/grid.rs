//! Growable rectangular grid

use serde::Serialize;

use crate::types::TileCode;
use crate::{Result, TrackError};

/// Rectangular 2-D buffer stored row-major.
///
/// The grid never has zero rows or columns. Growth keeps every stored value
/// at the same position relative to its neighbours: growing towards negative
/// coordinates shifts the existing contents by one row or column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// Raw reconstructed track.
pub type TileGrid = Grid<TileCode>;

impl<T: Copy + Default> Grid<T> {
    /// Create a grid filled with `T::default()`. Zero dimensions are bumped to 1.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self { width, height, cells: vec![T::default(); width * height] }
    }

    /// Build from rows, rejecting ragged or empty input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(TrackError::parse_error("grid rows", "grid must have at least one cell"));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(TrackError::parse_error(
                "grid rows",
                format!("row {} has {} cells, expected {}", index, row.len(), width),
            ));
        }

        let height = rows.len();
        let cells = rows.into_iter().flatten().collect();
        Ok(Self { width, height, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.width && y < self.height { Some(self.cells[y * self.width + x]) } else { None }
    }

    /// Store `value` at (x, y). Returns false when out of bounds.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> bool {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = value;
            true
        } else {
            false
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width)
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(<[T]>::to_vec).collect()
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Cell-wise transform into a grid of the same shape.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(T) -> U,
    {
        Grid { width: self.width, height: self.height, cells: self.cells.iter().copied().map(f).collect() }
    }

    /// Grow the grid until logical position (x, y) is inside it.
    ///
    /// Returns the position in grid coordinates after any shift caused by
    /// growing towards negative coordinates.
    pub fn ensure_contains(&mut self, x: isize, y: isize) -> (usize, usize) {
        let (mut x, mut y) = (x, y);
        while x < 0 {
            self.insert_column_front();
            x += 1;
        }
        while y < 0 {
            self.insert_row_front();
            y += 1;
        }
        let (x, y) = (x as usize, y as usize);
        while x >= self.width {
            self.push_column();
        }
        while y >= self.height {
            self.push_row();
        }
        (x, y)
    }

    fn insert_column_front(&mut self) {
        let mut cells = Vec::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            cells.push(T::default());
            cells.extend_from_slice(row);
        }
        self.cells = cells;
        self.width += 1;
    }

    fn push_column(&mut self) {
        let mut cells = Vec::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            cells.extend_from_slice(row);
            cells.push(T::default());
        }
        self.cells = cells;
        self.width += 1;
    }

    fn insert_row_front(&mut self) {
        self.cells.splice(0..0, std::iter::repeat_n(T::default(), self.width));
        self.height += 1;
    }

    fn push_row(&mut self) {
        self.cells.resize(self.cells.len() + self.width, T::default());
        self.height += 1;
    }
}

impl<T: Copy + Default> Default for Grid<T> {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
