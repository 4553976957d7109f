//! Grid geometry over a square field of view.
//!
//! Squares are numbered row-major from 0. Boundaries are half-open on the
//! upper side except for the last row and column, which are closed so that
//! tracks lying exactly on the far edge of the field still land in a square.

/// Width of a 512 px recording at 0.1602804 µm/px.
pub const DEFAULT_FIELD_EXTENT: f64 = 82.0864;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareBounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    closed_x: bool,
    closed_y: bool,
}

impl SquareBounds {
    /// Membership used for track assignment: `[x0,x1) × [y0,y1)`, with the
    /// upper bound closed on the final row/column of the grid.
    pub fn contains_half_open(&self, x: f64, y: f64) -> bool {
        let in_x = x >= self.x0 && (x < self.x1 || (self.closed_x && x <= self.x1));
        let in_y = y >= self.y0 && (y < self.y1 || (self.closed_y && y <= self.y1));
        in_x && in_y
    }

    /// Membership used for the diffusion coefficient mean: `[x0,x1] × [y0,y1]`.
    /// Tracks on a shared edge match both neighbouring squares.
    pub fn contains_closed(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub size: usize,
    pub extent: f64,
}

impl Grid {
    pub fn new(size: usize, extent: f64) -> Self {
        Self { size, extent }
    }

    pub fn square_count(&self) -> usize {
        self.size * self.size
    }

    /// Returns `(row, col)`, both 0-based.
    pub fn row_col(&self, seq: usize) -> (usize, usize) {
        (seq / self.size, seq % self.size)
    }

    pub fn square_bounds(&self, seq: usize) -> SquareBounds {
        let (row, col) = self.row_col(seq);
        let step = self.extent / self.size as f64;
        let last = self.size - 1;
        SquareBounds {
            x0: col as f64 * step,
            y0: row as f64 * step,
            x1: if col == last { self.extent } else { (col + 1) as f64 * step },
            y1: if row == last { self.extent } else { (row + 1) as f64 * step },
            closed_x: col == last,
            closed_y: row == last,
        }
    }

    pub fn square_area(&self) -> f64 {
        let n = self.size as f64;
        self.extent * self.extent / (n * n)
    }

    /// Sequence number of the square a point belongs to under the half-open
    /// rule, or `None` when the point lies outside the field.
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        if self.size == 0 || !(x.is_finite() && y.is_finite()) {
            return None;
        }
        if x < 0.0 || y < 0.0 || x > self.extent || y > self.extent {
            return None;
        }
        let step = self.extent / self.size as f64;
        let last = self.size - 1;
        let col = ((x / step).floor() as usize).min(last);
        let row = ((y / step).floor() as usize).min(last);
        // Floating point division can land one cell off right at a boundary.
        for seq in candidate_cells(row, col, self.size) {
            if self.square_bounds(seq).contains_half_open(x, y) {
                return Some(seq);
            }
        }
        None
    }
}

fn candidate_cells(row: usize, col: usize, size: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(9);
    out.push(row * size + col);
    for dr in [-1i64, 0, 1] {
        for dc in [-1i64, 0, 1] {
            if dr == 0 && dc == 0 {
                continue;
            }
            let r = row as i64 + dr;
            let c = col as i64 + dc;
            if r >= 0 && c >= 0 && (r as usize) < size && (c as usize) < size {
                out.push(r as usize * size + c as usize);
            }
        }
    }
    out
}

pub fn square_bounds(grid_size: usize, seq: usize) -> SquareBounds {
    Grid::new(grid_size, DEFAULT_FIELD_EXTENT).square_bounds(seq)
}

pub fn square_area(grid_size: usize) -> f64 {
    Grid::new(grid_size, DEFAULT_FIELD_EXTENT).square_area()
}
