//! Draw adapter between a world and whatever displays it.

use ral_core::{Bbox, Rgb};

/// Receives draw calls from a world.
///
/// Coordinates are world coordinates; mapping them onto pixels or characters
/// is up to the implementation.
pub trait Canvas {
    /// Erase everything drawn so far.
    fn clear(&mut self);

    /// A filled disc.
    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb);

    /// A small fixed-size mark, independent of zoom.
    fn marker(&mut self, x: f64, y: f64, color: Rgb);

    /// A filled axis-aligned square with half-width `half`.
    fn rect(&mut self, x: f64, y: f64, half: f64, color: Rgb);
}

/// Rasterises a rectangular world region into a character grid.
///
/// Rects paint `.` on their center cell unless something is already there;
/// circles paint `o` on their center cell and on every cell whose center
/// lies inside the disc. Colors and markers are ignored.
#[derive(Debug, Clone)]
pub struct AsciiCanvas {
    cols: usize,
    rows: usize,
    extent: Bbox,
    cells: Vec<char>,
}

impl AsciiCanvas {
    /// Create a blank canvas of `cols` by `rows` characters covering `extent`.
    pub fn new(cols: usize, rows: usize, extent: Bbox) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            extent,
            cells: vec![' '; cols * rows],
        }
    }

    fn cell_width(&self) -> f64 {
        (self.extent.max[0] - self.extent.min[0]) / self.cols as f64
    }

    fn cell_height(&self) -> f64 {
        (self.extent.max[1] - self.extent.min[1]) / self.rows as f64
    }

    /// The `(col, row)` holding a world point. Row 0 is the top edge.
    fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let c = ((x - self.extent.min[0]) / self.cell_width()).floor();
        let r = ((self.extent.max[1] - y) / self.cell_height()).floor();
        if c.is_finite() && r.is_finite() && c >= 0.0 && r >= 0.0 {
            let (c, r) = (c as usize, r as usize);
            if c < self.cols && r < self.rows {
                return Some((c, r));
            }
        }
        None
    }

    fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.extent.min[0] + (col as f64 + 0.5) * self.cell_width(),
            self.extent.max[1] - (row as f64 + 0.5) * self.cell_height(),
        )
    }

    /// The canvas as text, one line per row, trailing blanks trimmed.
    pub fn render(&self) -> String {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Canvas for AsciiCanvas {
    fn clear(&mut self) {
        self.cells.fill(' ');
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64, _color: Rgb) {
        if let Some((c, r)) = self.cell_of(x, y) {
            self.cells[r * self.cols + c] = 'o';
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let (cx, cy) = self.cell_center(col, row);
                if (cx - x).hypot(cy - y) <= radius {
                    self.cells[row * self.cols + col] = 'o';
                }
            }
        }
    }

    fn marker(&mut self, _x: f64, _y: f64, _color: Rgb) {}

    fn rect(&mut self, x: f64, y: f64, _half: f64, _color: Rgb) {
        if let Some((c, r)) = self.cell_of(x, y) {
            let cell = &mut self.cells[r * self.cols + c];
            if *cell == ' ' {
                *cell = '.';
            }
        }
    }
}
