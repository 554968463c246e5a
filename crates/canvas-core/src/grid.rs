//! The sparse cell grid.
//!
//! At most one [`Cell`] per coordinate. Placing at an occupied coordinate
//! replaces the previous cell entirely (last writer wins). The grid owns
//! bounds checking: raw signed coordinates from callers are validated into
//! a [`Coord`] here and nowhere else.

use std::collections::BTreeMap;

use canvas_types::{Cell, Coord, ParticipantId};

/// Sparse map of placed cells keyed by coordinate.
#[derive(Debug, Clone)]
pub struct CellGrid {
    /// Grid dimension N.
    size: u32,
    /// Placed cells.
    cells: BTreeMap<Coord, Cell>,
}

impl CellGrid {
    /// An empty `size x size` grid.
    pub const fn new(size: u32) -> Self {
        Self {
            size,
            cells: BTreeMap::new(),
        }
    }

    /// Grid dimension N.
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Validate raw coordinates. `None` if either lies outside `[0, N)`.
    pub fn coord(&self, x: i64, y: i64) -> Option<Coord> {
        let x = u32::try_from(x).ok().filter(|v| *v < self.size)?;
        let y = u32::try_from(y).ok().filter(|v| *v < self.size)?;
        Some(Coord::new(x, y))
    }

    /// Store `cell`, returning the cell it replaced, if any.
    ///
    /// The caller must have obtained the cell's coordinate from
    /// [`CellGrid::coord`].
    pub fn place(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.coord(), cell)
    }

    /// The cell at `coord`.
    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// Mutable access to the cell at `coord`.
    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.cells.get_mut(&coord)
    }

    /// Number of occupied coordinates.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing has been placed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, ordered by coordinate.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Number of cells currently owned by `owner`.
    pub fn owned_by(&self, owner: &ParticipantId) -> usize {
        self.cells.values().filter(|c| &c.owner_id == owner).count()
    }
}
