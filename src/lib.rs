//! Decodes the absolute position of a small camera sensor against a printed
//! Anoto-style microdot pattern.
//!
//! Given a single 36x36 grayscale snapshot captured by an optical
//! mouse-like sensor, [`decode`] recovers the 2-D pattern coordinates of the
//! camera's center. The pipeline is a strict one-way chain:
//!
//! 1. [`binarize`] — grayscale image to binary foreground mask.
//! 2. [`blob::label_blobs`] — mask to connected-component blobs.
//! 3. [`blob::Blob::split`] — splits over-sized (merged) blobs.
//! 4. [`blob::Blob::center`] — blob to fractional centroid.
//! 5. [`grid::estimate_grid`] — centroids to carrier grid rotation/phase.
//! 6. [`classify::classify_directions`] — intersections to cardinal symbols.
//! 7. [`classify::emit_core`] — crop to the rectangular symbol core.
//! 8. [`codec::decode_via_codec`] — hand a 4x4 block to the external codec.
//!
//! The whole transformation is pure, synchronous, and single-threaded: one
//! image in, one `Result` out, with no shared mutable state and nothing
//! persisted across frames.
//!
//! ## Usage
//!
//! ```
//! use dotgrid_decode::codec::{AnotoCodec, Matrix4x4};
//! use dotgrid_decode::{decode_with_config, DecoderConfig};
//!
//! struct StubCodec;
//! impl AnotoCodec for StubCodec {
//!     fn decode_position(&self, _m: &Matrix4x4) -> Result<(u32, u32), String> {
//!         Ok((0, 0))
//!     }
//!     fn decode_section(&self, _m: &Matrix4x4, _pos: (u32, u32)) -> Result<(u32, u32), String> {
//!         Ok((0, 0))
//!     }
//! }
//!
//! let blank = [255u8; 36 * 36];
//! let config = DecoderConfig::default();
//! let result = decode_with_config(&blank, &config, &StubCodec);
//! assert!(result.is_err()); // a blank frame has no dots to find
//! ```

#![forbid(
    absolute_paths_not_starting_with_crate,
    non_ascii_idents,
    noop_method_call,
    unsafe_code,
    unused_results
)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

pub mod binarize;
pub mod blob;
pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;

pub use config::DecoderConfig;
pub use error::DecodeError;

use blob::Blob;
use codec::{AnotoCodec, DecodedLocation};
use geometry::Point;

/// Decode a 36x36 grayscale snapshot using [`DecoderConfig::default`] and the
/// given codec.
///
/// `image` must contain exactly `config::IMAGE_SIZE * config::IMAGE_SIZE`
/// intensity bytes in row-major order.
pub fn decode(image: &[u8], codec: &dyn AnotoCodec) -> Result<DecodedLocation, DecodeError> {
    decode_with_config(image, &DecoderConfig::default(), codec)
}

/// Decode a 36x36 grayscale snapshot with an explicit [`DecoderConfig`] and
/// codec implementation.
pub fn decode_with_config(
    image: &[u8],
    config: &DecoderConfig,
    codec: &dyn AnotoCodec,
) -> Result<DecodedLocation, DecodeError> {
    let size = config::IMAGE_SIZE;
    assert_eq!(
        image.len(),
        size * size,
        "image must be {size}x{size} grayscale bytes"
    );

    let mask = binarize::binarize(image, size, size, config);
    let blobs = blob::label_blobs(&mask);

    let mean_single_dot_area = mean_unsplit_area(&blobs);
    let max_plausible_area = mean_single_dot_area * config.max_plausible_area_factor;

    let mut centroids: Vec<Point> = Vec::with_capacity(blobs.len());
    for b in &blobs {
        if b.max_length() > 2.0 * config::DOT_OFFSET && b.area() as f64 <= max_plausible_area {
            if let Some((b1, b2)) = b.split() {
                centroids.push(b1.center());
                centroids.push(b2.center());
                continue;
            }
        }
        centroids.push(b.center());
    }
    log::debug!(
        "decode: {} blobs, {} centroids after splitting",
        blobs.len(),
        centroids.len()
    );

    let (_grid_model, rotated_centroids, intersections) =
        grid::estimate_grid(&centroids, config).map_err(DecodeError::InsufficientGeometry)?;

    let grid_shape = intersection_lattice_shape(&intersections);
    let symbol_grid =
        classify::classify_directions(&intersections, grid_shape, &rotated_centroids, config);
    let core = classify::emit_core(&symbol_grid);

    codec::decode_via_codec(&core, codec)
}

/// §4.3 open-question resolution: mean pixel area across blobs that did not
/// themselves exceed the split threshold, used to guard against splitting an
/// implausibly large (likely three-dot) blob. Falls back to a single dot's
/// typical footprint if every blob in the frame is oversized.
fn mean_unsplit_area(blobs: &[Blob]) -> f64 {
    let unsplit: Vec<f64> = blobs
        .iter()
        .filter(|b| b.max_length() <= 2.0 * config::DOT_OFFSET)
        .map(|b| b.area() as f64)
        .collect();
    if unsplit.is_empty() {
        // A typical single dot is roughly pi * (DOT_OFFSET / 2)^2 pixels.
        std::f64::consts::PI * (config::DOT_OFFSET / 2.0).powi(2)
    } else {
        unsplit.iter().sum::<f64>() / unsplit.len() as f64
    }
}

/// The intersection lattice from [`grid::estimate_grid`] is built row-major
/// over an inclusive x-range and y-range; recover its `(rows, cols)` shape
/// from the spacing between consecutive points' y-coordinates.
fn intersection_lattice_shape(intersections: &[Point]) -> (usize, usize) {
    if intersections.is_empty() {
        return (0, 0);
    }
    let first_y = intersections[0].y;
    let cols = intersections.iter().take_while(|p| p.y == first_y).count();
    let cols = cols.max(1);
    let rows = intersections.len() / cols;
    (rows, cols)
}

/// Decode many frames, one per slice, fanning them across a `rayon` thread
/// pool. Each frame owns its entire transient pipeline state, so this is a
/// strict convenience wrapper over repeated [`decode_with_config`] calls, not
/// a new pipeline capability (§5).
#[cfg(feature = "parallel")]
pub fn decode_many(
    images: &[&[u8]],
    config: &DecoderConfig,
    codec: &(dyn AnotoCodec + Sync),
) -> Vec<Result<DecodedLocation, DecodeError>> {
    use rayon::prelude::*;
    images
        .par_iter()
        .map(|image| decode_with_config(image, config, codec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubCodec {
        pos: (u32, u32),
        section: (u32, u32),
    }

    impl AnotoCodec for StubCodec {
        fn decode_position(&self, _matrix: &codec::Matrix4x4) -> Result<(u32, u32), String> {
            Ok(self.pos)
        }
        fn decode_section(
            &self,
            _matrix: &codec::Matrix4x4,
            _pos: (u32, u32),
        ) -> Result<(u32, u32), String> {
            Ok(self.section)
        }
    }

    fn draw_dot(image: &mut [u8], cx: f64, cy: f64) {
        let size = config::IMAGE_SIZE as i64;
        let (icx, icy) = (cx.round() as i64, cy.round() as i64);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (icx + dx, icy + dy);
                if (0..size).contains(&x) && (0..size).contains(&y) {
                    image[(y * size + x) as usize] = 0;
                }
            }
        }
    }

    /// Build a synthetic 36x36 frame with a clean 6x6 lattice of dots, each
    /// offset `DOT_OFFSET` to the east of its intersection, so every
    /// classified symbol is `R`.
    fn synthetic_frame() -> Vec<u8> {
        let mut image = vec![255u8; config::IMAGE_SIZE * config::IMAGE_SIZE];
        for row in 0..6 {
            for col in 0..6 {
                let gx = 2.0 + f64::from(col) * config::GRID_SPACING;
                let gy = 2.0 + f64::from(row) * config::GRID_SPACING;
                draw_dot(&mut image, gx + config::DOT_OFFSET, gy);
            }
        }
        image
    }

    #[test]
    fn blank_frame_is_insufficient_geometry() {
        let image = vec![255u8; config::IMAGE_SIZE * config::IMAGE_SIZE];
        let codec = StubCodec {
            pos: (0, 0),
            section: (0, 0),
        };
        let err = decode(&image, &codec).unwrap_err();
        assert!(matches!(err, DecodeError::InsufficientGeometry(_)));
    }

    #[test]
    fn clean_synthetic_lattice_decodes() {
        let image = synthetic_frame();
        let codec = StubCodec {
            pos: (42, 7),
            section: (1, 0),
        };
        let result = decode(&image, &codec);
        assert!(result.is_ok(), "expected decode to succeed: {result:?}");
        let (pos, section) = result.unwrap();
        assert!(pos.0 >= 42 && pos.1 >= 7);
        assert_eq!(section, (1, 0));
    }

    #[test]
    #[should_panic(expected = "36x36")]
    fn wrong_size_image_panics() {
        let image = vec![0u8; 10];
        let codec = StubCodec {
            pos: (0, 0),
            section: (0, 0),
        };
        let _ = decode(&image, &codec);
    }
}
