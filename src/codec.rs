//! The external codec boundary: converts a classified symbol grid into the
//! 2-bit matrix the downstream Anoto position codec consumes.
//!
//! The codec's own algebra (MNS/A1/A2 sequences, prime factors, delta range)
//! is a parameter of the printed pattern, not of this decoder, and is
//! entirely out of scope here — this module only models the interface.

use crate::classify::{Symbol, SymbolGrid};
use crate::error::DecodeError;

/// A single encoded cell: the 2-bit vector the external codec expects.
pub type Bit2 = (u8, u8);

/// A 4x4 block of 2-bit vectors, the unit the external codec consumes.
pub type Matrix4x4 = [[Bit2; 4]; 4];

/// A decoded `(position, section)` pair, each an `(x, y)` coordinate.
pub type DecodedLocation = ((u32, u32), (u32, u32));

/// The external Anoto position/section codec, consumed but not implemented
/// here (§4.8, §9 "Codec opacity").
pub trait AnotoCodec {
    /// Decode the absolute pattern position from a 4x4 symbol matrix.
    fn decode_position(&self, matrix: &Matrix4x4) -> Result<(u32, u32), String>;
    /// Decode the section, given the matrix and its already-decoded position.
    fn decode_section(&self, matrix: &Matrix4x4, pos: (u32, u32)) -> Result<(u32, u32), String>;
}

fn symbol_to_bits(symbol: Symbol) -> Option<Bit2> {
    match symbol {
        Symbol::Up => Some((0, 0)),
        Symbol::Down => Some((1, 1)),
        Symbol::Left => Some((1, 0)),
        Symbol::Right => Some((0, 1)),
        Symbol::Unknown | Symbol::Absent => None,
    }
}

/// Try to extract a fully-populated 4x4 block starting at `(start_row,
/// start_col)`. Returns `None` if the block runs off the grid or hits an
/// unpopulated (`*`/`!`) cell.
fn extract_4x4(grid: &SymbolGrid, start_row: usize, start_col: usize) -> Option<Matrix4x4> {
    if start_row + 4 > grid.rows() || start_col + 4 > grid.cols() {
        return None;
    }
    let mut matrix: Matrix4x4 = [[(0, 0); 4]; 4];
    for (r, row_out) in matrix.iter_mut().enumerate() {
        for (c, cell_out) in row_out.iter_mut().enumerate() {
            *cell_out = symbol_to_bits(grid.get(start_row + r, start_col + c))?;
        }
    }
    Some(matrix)
}

/// Scan the symbol grid in raster order for the first fully-populated 4x4
/// block, returning it together with its `(row, col)` offset within the
/// grid.
fn find_4x4(grid: &SymbolGrid) -> Option<(Matrix4x4, (usize, usize))> {
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if let Some(matrix) = extract_4x4(grid, row, col) {
                return Some((matrix, (row, col)));
            }
        }
    }
    None
}

/// §4.8: find a 4x4 block in `grid` and hand it to `codec`, offsetting the
/// returned position by the block's location within the grid.
pub fn decode_via_codec(
    grid: &SymbolGrid,
    codec: &dyn AnotoCodec,
) -> Result<DecodedLocation, DecodeError> {
    let (matrix, (row_offset, col_offset)) =
        find_4x4(grid).ok_or(DecodeError::NoDecodableRegion)?;

    let pos = codec
        .decode_position(&matrix)
        .map_err(DecodeError::CodecRejected)?;
    let section = codec
        .decode_section(&matrix, pos)
        .map_err(DecodeError::CodecRejected)?;

    let offset_pos = (
        pos.0 + col_offset as u32,
        pos.1 + row_offset as u32,
    );
    log::debug!("decode_via_codec: block at ({row_offset}, {col_offset}), pos {offset_pos:?}, section {section:?}");
    Ok((offset_pos, section))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCodec;

    impl AnotoCodec for EchoCodec {
        fn decode_position(&self, _matrix: &Matrix4x4) -> Result<(u32, u32), String> {
            Ok((7, 9))
        }
        fn decode_section(&self, _matrix: &Matrix4x4, _pos: (u32, u32)) -> Result<(u32, u32), String> {
            Ok((0, 0))
        }
    }

    struct RejectingCodec;

    impl AnotoCodec for RejectingCodec {
        fn decode_position(&self, _matrix: &Matrix4x4) -> Result<(u32, u32), String> {
            Err("inconsistent matrix".to_string())
        }
        fn decode_section(&self, _matrix: &Matrix4x4, _pos: (u32, u32)) -> Result<(u32, u32), String> {
            Ok((0, 0))
        }
    }

    fn grid_of(cols: usize, cells: Vec<Symbol>) -> SymbolGrid {
        SymbolGrid::from_cells(cols, cells)
    }

    #[test]
    fn missing_block_is_no_decodable_region() {
        let grid = grid_of(4, vec![Symbol::Absent; 16]);
        let err = decode_via_codec(&grid, &EchoCodec).unwrap_err();
        assert_eq!(err, DecodeError::NoDecodableRegion);
    }

    #[test]
    fn full_block_decodes_with_no_offset() {
        let cells = vec![Symbol::Right; 16];
        let grid = grid_of(4, cells);
        let (pos, section) = decode_via_codec(&grid, &EchoCodec).expect("should decode");
        assert_eq!(pos, (7, 9));
        assert_eq!(section, (0, 0));
    }

    #[test]
    fn offset_block_shifts_position() {
        // 5x5 grid, only rows/cols 1..5 populated -> block found at (1, 1)
        let mut cells = vec![Symbol::Absent; 25];
        for r in 1..5 {
            for c in 1..5 {
                cells[r * 5 + c] = Symbol::Right;
            }
        }
        let grid = grid_of(5, cells);
        let (pos, _section) = decode_via_codec(&grid, &EchoCodec).expect("should decode");
        assert_eq!(pos, (7 + 1, 9 + 1));
    }

    #[test]
    fn codec_rejection_surfaces() {
        let cells = vec![Symbol::Right; 16];
        let grid = grid_of(4, cells);
        let err = decode_via_codec(&grid, &RejectingCodec).unwrap_err();
        assert_eq!(err, DecodeError::CodecRejected("inconsistent matrix".to_string()));
    }
}
