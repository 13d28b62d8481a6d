//! Per-intersection direction classification and symbol-grid emission.

use crate::config::DecoderConfig;
use crate::geometry::Point;

/// A single classified grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Dot sits above the intersection (north offset).
    Up,
    /// Dot sits below the intersection (south offset).
    Down,
    /// Dot sits to the left of the intersection (west offset).
    Left,
    /// Dot sits to the right of the intersection (east offset).
    Right,
    /// A dot is present nearby but its direction is ambiguous.
    Unknown,
    /// No dot found near this intersection.
    Absent,
}

impl Symbol {
    /// Single-character rendering, matching the spec's table (`U`, `D`, `L`,
    /// `R`, `!`, `*`).
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Symbol::Up => 'U',
            Symbol::Down => 'D',
            Symbol::Left => 'L',
            Symbol::Right => 'R',
            Symbol::Unknown => '!',
            Symbol::Absent => '*',
        }
    }
}

/// A rectangular grid of classified [`Symbol`]s, `rows` x `cols`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolGrid {
    cols: usize,
    cells: Vec<Symbol>,
}

impl SymbolGrid {
    /// Construct a grid directly from a flat row-major cell buffer. Visible
    /// within the crate for the codec adapter's unit tests.
    #[must_use]
    pub(crate) fn from_cells(cols: usize, cells: Vec<Symbol>) -> Self {
        Self { cols, cells }
    }

    /// Number of rows.
    #[must_use]
    #[inline]
    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.cells.len() / self.cols
        }
    }

    /// Number of columns.
    #[must_use]
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Symbol at `(row, col)`.
    #[must_use]
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Symbol {
        self.cells[row * self.cols + col]
    }
}

/// §4.6: classify every grid intersection by the direction to its nearest
/// rotated centroid.
///
/// `grid_shape` gives the `(rows, cols)` the intersections were laid out in
/// by [`crate::grid::estimate_grid`]'s lattice builder.
#[must_use]
pub fn classify_directions(
    intersections: &[Point],
    grid_shape: (usize, usize),
    rotated_centroids: &[Point],
    config: &DecoderConfig,
) -> SymbolGrid {
    let (rows, cols) = grid_shape;
    debug_assert_eq!(intersections.len(), rows * cols);

    let radius = config.nearby_dot_radius();
    let cells: Vec<Symbol> = intersections
        .iter()
        .map(|&intersection| classify_one(intersection, rotated_centroids, radius, config))
        .collect();

    log::trace!("classify_directions: {rows}x{cols} intersections classified");
    SymbolGrid { cols, cells }
}

fn classify_one(
    intersection: Point,
    centroids: &[Point],
    radius: f64,
    config: &DecoderConfig,
) -> Symbol {
    let nearest = centroids
        .iter()
        .copied()
        .map(|c| (c, intersection.distance(c)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    let Some((centroid, distance)) = nearest else {
        return Symbol::Absent;
    };
    if distance >= radius {
        return Symbol::Absent;
    }

    let angle = intersection.angle_360(centroid);
    let tol = config.direction_tolerance_deg;

    if angle.abs() <= tol {
        Symbol::Right
    } else if (angle - 90.0).abs() <= tol {
        Symbol::Down
    } else if (angle + 90.0).abs() <= tol {
        Symbol::Up
    } else if 180.0 - angle.abs() <= tol {
        Symbol::Left
    } else {
        diagonal_tie_break(angle).unwrap_or(Symbol::Unknown)
    }
}

/// At an exact 45-degree diagonal (e.g. `angle == 45.0`), a dot is
/// equidistant from two adjacent cardinal directions and the tolerance cones
/// of §4.6 leave it unclassified. Resolve such exact ties deterministically
/// by the documented priority order R > D > U > L (§8 boundary scenario),
/// rather than reporting them ambiguous.
fn diagonal_tie_break(angle: f64) -> Option<Symbol> {
    const EPS: f64 = 1e-9;
    let candidates = [
        (Symbol::Right, angle.abs()),
        (Symbol::Down, (angle - 90.0).abs()),
        (Symbol::Up, (angle + 90.0).abs()),
        (Symbol::Left, 180.0 - angle.abs()),
    ];
    let min_dist = candidates
        .iter()
        .map(|&(_, d)| d)
        .fold(f64::INFINITY, f64::min);
    if (min_dist - 45.0).abs() > EPS {
        return None;
    }
    let tied = candidates.iter().filter(|&&(_, d)| (d - min_dist).abs() <= EPS).count();
    if tied < 2 {
        return None;
    }
    candidates
        .into_iter()
        .find(|&(_, d)| (d - min_dist).abs() <= EPS)
        .map(|(symbol, _)| symbol)
}

/// §4.7: strip leading/trailing all-`*`/`!` rows and columns.
#[must_use]
pub fn emit_core(grid: &SymbolGrid) -> SymbolGrid {
    let rows = grid.rows();
    let cols = grid.cols();

    let is_blank = |s: Symbol| matches!(s, Symbol::Absent | Symbol::Unknown);
    let row_has_content = |row: usize| (0..cols).any(|col| !is_blank(grid.get(row, col)));
    let col_has_content = |col: usize| (0..rows).any(|row| !is_blank(grid.get(row, col)));

    let top = (0..rows).find(|&r| row_has_content(r)).unwrap_or(rows);
    let bottom = (0..rows).rev().find(|&r| row_has_content(r)).map_or(0, |r| r + 1);
    let left = (0..cols).find(|&c| col_has_content(c)).unwrap_or(cols);
    let right = (0..cols).rev().find(|&c| col_has_content(c)).map_or(0, |c| c + 1);

    if top >= bottom || left >= right {
        return SymbolGrid {
            cols: 0,
            cells: Vec::new(),
        };
    }

    let new_cols = right - left;
    let mut cells = Vec::with_capacity((bottom - top) * new_cols);
    for row in top..bottom {
        for col in left..right {
            cells.push(grid.get(row, col));
        }
    }

    SymbolGrid {
        cols: new_cols,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_prefers_right() {
        let config = DecoderConfig::default();
        let intersection = Point::new(10.0, 10.0);
        let symbol = classify_one(intersection, &[intersection], config.nearby_dot_radius(), &config);
        assert_eq!(symbol, Symbol::Right);
    }

    #[test]
    fn angle_45_degrees_prefers_right_or_down() {
        let config = DecoderConfig::default();
        let intersection = Point::new(0.0, 0.0);
        let centroid = Point::new(1.0, 1.0);
        let symbol = classify_one(intersection, &[centroid], config.nearby_dot_radius() * 10.0, &config);
        // Equidistant from R and D; priority order (R > D > U > L) resolves the tie to R.
        assert!(matches!(symbol, Symbol::Right | Symbol::Down));
        assert_eq!(symbol, Symbol::Right);
    }

    #[test]
    fn far_centroid_is_absent() {
        let config = DecoderConfig::default();
        let intersection = Point::new(0.0, 0.0);
        let centroid = Point::new(100.0, 100.0);
        let symbol = classify_one(intersection, &[centroid], config.nearby_dot_radius(), &config);
        assert_eq!(symbol, Symbol::Absent);
    }

    #[test]
    fn totality_every_intersection_gets_one_symbol() {
        let config = DecoderConfig::default();
        let intersections = vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(20.0, 20.0)];
        let centroids = vec![Point::new(0.1, 0.1)];
        let grid = classify_directions(&intersections, (1, 3), &centroids, &config);
        assert_eq!(grid.rows() * grid.cols(), 3);
    }

    #[test]
    fn emit_core_strips_blank_border() {
        let cells = vec![
            Symbol::Absent, Symbol::Absent, Symbol::Absent,
            Symbol::Absent, Symbol::Right, Symbol::Absent,
            Symbol::Absent, Symbol::Absent, Symbol::Absent,
        ];
        let grid = SymbolGrid { cols: 3, cells };
        let core = emit_core(&grid);
        assert_eq!((core.rows(), core.cols()), (1, 1));
        assert_eq!(core.get(0, 0), Symbol::Right);
    }
}
