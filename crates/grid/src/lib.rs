//! Expanding-square grid placement.
//!
//! Deterministic enumeration of 2-D grid cells for an ordered collection,
//! chosen so that growth never moves an already-placed item:
//!
//! - **Seed**: indices 0..=3 fill a 2×2 block as top-left, top-right,
//!   bottom-right, bottom-left.
//! - **Growth**: once a `size × size` block is full, the next `size + 1`
//!   indices open the column at `col = size` top-to-bottom, and the
//!   `size` after that fill the row at `row = size` right-to-left (the
//!   shared corner belongs to the column leg).
//! - **Prefix stability**: the enumeration depends only on the index, so
//!   the cells for a prefix of the collection are exactly the first cells
//!   of any longer placement.
//!
//! The enumeration is a bijection between indices and cells; both
//! directions have closed forms (`cell_for_index`, `index_for_cell`). The
//! seed block needs no special case: it is the `size = 0` and `size = 1`
//! growth steps of the same pattern.

use serde::{Deserialize, Serialize};

/// A cell in the layout grid. Rows grow downward, columns to the right.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    /// Top-left cell.
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Number of cells in a filled block of edge length `size`.
#[inline]
pub const fn block_capacity(size: usize) -> usize {
    size * size
}

/// Number of cells appended when the filled block grows from `size` to
/// `size + 1`: a column of `size + 1` cells plus a row of `size` cells.
#[inline]
pub const fn growth_cells(size: usize) -> usize {
    2 * size + 1
}

/// Map an item index to its grid cell.
///
/// The enclosing block edge is `floor(sqrt(index))`; the offset past that
/// block's capacity selects a cell on the new column (top-to-bottom) or,
/// beyond it, on the new bottom row (right-to-left).
pub fn cell_for_index(index: usize) -> GridCoord {
    let size = index.isqrt();
    let offset = index - block_capacity(size);
    if offset <= size {
        GridCoord::new(offset, size)
    } else {
        GridCoord::new(size, 2 * size - offset)
    }
}

/// Inverse of [`cell_for_index`]: the index that lands on `cell`.
///
/// Every cell is reached exactly once, so this is total: a cell lies either
/// on the column leg (`col == max`) or the row leg (`row == max`) of the
/// growth step for `max(row, col)`.
pub fn index_for_cell(cell: GridCoord) -> usize {
    let size = cell.row.max(cell.col);
    if cell.col == size {
        block_capacity(size) + cell.row
    } else {
        block_capacity(size) + 2 * size - cell.col
    }
}

/// Minimal bounding grid dimension for `count` items.
///
/// Zero items need no grid at all; any non-empty collection is framed by at
/// least the 2×2 seed block, then by the smallest square holding `count`.
pub fn dimension(count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let root = count.isqrt();
    let ceil = if block_capacity(root) == count {
        root
    } else {
        root + 1
    };
    ceil.max(2)
}

/// First `count` cells of the enumeration, in item order.
pub fn coords_for(count: usize) -> Vec<GridCoord> {
    Cells::take_cells(count).collect()
}

/// Iterator over the cell enumeration.
pub struct Cells {
    current: usize,
    limit: Option<usize>,
}

impl Cells {
    /// Infinite enumeration starting at the origin.
    pub fn new() -> Self {
        Self {
            current: 0,
            limit: None,
        }
    }

    /// Enumeration bounded to the first `count` cells.
    pub fn take_cells(count: usize) -> Self {
        Self {
            current: 0,
            limit: Some(count),
        }
    }

    /// The cells appended when the filled block grows from `size` to
    /// `size + 1`.
    pub fn growth_step(size: usize) -> Self {
        Self {
            current: block_capacity(size),
            limit: Some(block_capacity(size + 1)),
        }
    }
}

impl Default for Cells {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Cells {
    type Item = GridCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(limit) = self.limit {
            if self.current >= limit {
                return None;
            }
        }

        let cell = cell_for_index(self.current);
        self.current += 1;
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(self.current);
                (remaining, Some(remaining))
            }
            None => (usize::MAX, None),
        }
    }
}

/// A computed layout: bounding dimension plus one cell per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPlan {
    dimension: usize,
    cells: Vec<GridCoord>,
}

impl GridPlan {
    /// Place `count` items in insertion order. This is the default placement.
    pub fn by_insertion(count: usize) -> Self {
        Self {
            dimension: dimension(count),
            cells: coords_for(count),
        }
    }

    /// Place items keyed by their server-assigned positions.
    ///
    /// A position is honored only when it is an integer in `0..n` and unique
    /// among the items; every other item falls back to the smallest unused
    /// enumeration index, in iteration order. Cells therefore stay pairwise
    /// distinct no matter what the server sent.
    pub fn by_position<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let positions: Vec<Option<i64>> = positions.into_iter().collect();
        let count = positions.len();

        let mut claims = vec![0usize; count];
        for position in positions.iter().flatten() {
            if let Ok(slot) = usize::try_from(*position) {
                if slot < count {
                    claims[slot] += 1;
                }
            }
        }

        let honored: Vec<Option<usize>> = positions
            .iter()
            .map(|position| {
                position
                    .and_then(|p| usize::try_from(p).ok())
                    .filter(|&slot| slot < count && claims[slot] == 1)
            })
            .collect();

        let mut taken = vec![false; count];
        for slot in honored.iter().flatten() {
            taken[*slot] = true;
        }

        let mut next_free = 0;
        let cells = honored
            .iter()
            .map(|honored_slot| {
                let slot = match honored_slot {
                    Some(slot) => *slot,
                    None => {
                        while taken[next_free] {
                            next_free += 1;
                        }
                        taken[next_free] = true;
                        next_free
                    }
                };
                cell_for_index(slot)
            })
            .collect();

        Self {
            dimension: dimension(count),
            cells,
        }
    }

    /// Edge length of the bounding grid.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// One cell per item, in item order.
    pub fn cells(&self) -> &[GridCoord] {
        &self.cells
    }

    /// Cell for a single item, if the item exists.
    pub fn cell(&self, index: usize) -> Option<GridCoord> {
        self.cells.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
