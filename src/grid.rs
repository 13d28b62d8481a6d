//! Inference of the hidden carrier grid's rotation and phase.

use crate::config::{DecoderConfig, DOT_OFFSET, GRID_SPACING};
use crate::error::GeometryErrorKind;
use crate::geometry::Point;

/// The inferred carrier grid: rotation, (fixed) spacing, and phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridModel {
    /// Angle, in degrees, to rotate the image so the carrier grid becomes
    /// axis-aligned. Always in `(-45, 45]`.
    pub rotation: f64,
    /// Distance between adjacent carrier grid lines. Always
    /// [`GRID_SPACING`]; never inferred per-frame.
    pub spacing: f64,
    /// Translation, applied in the rotated frame, that aligns grid
    /// intersections with dot centers.
    pub phase: (f64, f64),
}

struct AnglePair {
    angle: f64,
}

/// Estimate the carrier [`GridModel`] from a set of rotated-space centroids,
/// and return the rotated centroids plus the grid intersections in that same
/// rotated frame.
///
/// Returns `Err` with [`GeometryErrorKind::TooFewPairs`] if fewer than one
/// centroid pair survives the pair survey, or
/// [`GeometryErrorKind::NoAngleClusters`] if angle clustering then yields
/// nothing (unreachable given the prior check, kept as a defensive case).
pub fn estimate_grid(
    centroids: &[Point],
    config: &DecoderConfig,
) -> Result<(GridModel, Vec<Point>, Vec<Point>), GeometryErrorKind> {
    let pairs = pair_survey(centroids, config);
    if pairs.is_empty() {
        return Err(GeometryErrorKind::TooFewPairs);
    }

    let clusters = cluster_by_angle(&pairs, config.angle_cluster_tolerance_deg);
    if clusters.is_empty() {
        return Err(GeometryErrorKind::NoAngleClusters);
    }

    let rotation = resolve_rotation(&clusters, config.angle_cluster_tolerance_deg);
    log::debug!(
        "estimate_grid: {} pairs, {} clusters, rotation {:.3}",
        pairs.len(),
        clusters.len(),
        rotation
    );

    let rotated: Vec<Point> = centroids.iter().map(|p| p.rotate(-rotation)).collect();

    let intersections = build_intersection_lattice(&rotated);
    let (phase, hits) = search_phase(&intersections, &rotated, config);
    log::debug!(
        "estimate_grid: phase ({:.3}, {:.3}), {hits} hits",
        phase.0,
        phase.1
    );

    let shifted: Vec<Point> = intersections
        .iter()
        .map(|p| Point::new(p.x + phase.0, p.y + phase.1))
        .collect();

    Ok((
        GridModel {
            rotation,
            spacing: GRID_SPACING,
            phase,
        },
        rotated,
        shifted,
    ))
}

/// §4.5 Step 1: retain centroid pairs whose distance is within
/// `config.pair_distance_tolerance` of `k * GRID_SPACING` for `k in {1, 2}`.
fn pair_survey(centroids: &[Point], config: &DecoderConfig) -> Vec<AnglePair> {
    let mut pairs = Vec::new();
    for (i, &p1) in centroids.iter().enumerate() {
        for &p2 in &centroids[i + 1..] {
            let dist = p1.distance(p2);
            for k in 1..=2 {
                let target = f64::from(k) * GRID_SPACING;
                if (dist - target).abs() < config.pair_distance_tolerance * GRID_SPACING {
                    pairs.push(AnglePair {
                        angle: p1.folded_angle_90(p2),
                    });
                    break;
                }
            }
        }
    }
    pairs
}

/// §4.5 Step 2: sort by folded angle, start a new cluster whenever the gap
/// exceeds `tolerance_deg`, then sort clusters largest-first.
fn cluster_by_angle(pairs: &[AnglePair], tolerance_deg: f64) -> Vec<Vec<f64>> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let mut angles: Vec<f64> = pairs.iter().map(|p| p.angle).collect();
    angles.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    let mut current = vec![angles[0]];
    let mut running = angles[0];

    for &angle in &angles[1..] {
        if (angle - running).abs() <= tolerance_deg {
            current.push(angle);
        } else {
            clusters.push(std::mem::take(&mut current));
            current = vec![angle];
        }
        running = angle;
    }
    clusters.push(current);

    clusters.sort_by_key(|c| std::cmp::Reverse(c.len()));
    clusters
}

/// §4.5 Step 3: resolve the grid rotation from the top one or two clusters.
fn resolve_rotation(clusters: &[Vec<f64>], tolerance_deg: f64) -> f64 {
    let angle1 = mean(&clusters[0]);

    let angle2 = clusters.get(1).and_then(|second| {
        let candidate = mean(second);
        let mut diff = angle1 - candidate;
        if diff < 0.0 {
            diff += 180.0;
        }
        if (90.0 - diff).abs() <= tolerance_deg {
            Some(candidate)
        } else {
            None
        }
    });

    let angle2 = angle2.unwrap_or_else(|| {
        let mut a = angle1 - 90.0;
        if a < 0.0 {
            a += 180.0;
        }
        a
    });

    let mut rotation = if angle1.abs() < angle2.abs() {
        angle1
    } else {
        angle2
    };
    if rotation > 45.0 {
        rotation = 90.0 - rotation;
    }
    rotation
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// §4.5 Step 5: build the intersection lattice one step past the bounding
/// box of the rotated centroids, anchored on the centroid nearest the
/// (rotated) image center.
fn build_intersection_lattice(rotated: &[Point]) -> Vec<Point> {
    let center = Point::new(
        crate::config::IMAGE_SIZE as f64 / 2.0,
        crate::config::IMAGE_SIZE as f64 / 2.0,
    );
    let anchor = rotated
        .iter()
        .copied()
        .min_by(|a, b| a.distance(center).partial_cmp(&b.distance(center)).unwrap())
        .expect("caller guarantees at least one centroid");

    let min_x = rotated.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = rotated
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_y = rotated.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = rotated
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut start_x = anchor.x;
    while start_x > min_x - GRID_SPACING {
        start_x -= GRID_SPACING;
    }
    let mut start_y = anchor.y;
    while start_y > min_y - GRID_SPACING {
        start_y -= GRID_SPACING;
    }

    let mut intersections = Vec::new();
    let mut y = start_y;
    while y < max_y + GRID_SPACING {
        let mut x = start_x;
        while x < max_x + GRID_SPACING {
            intersections.push(Point::new(x, y));
            x += GRID_SPACING;
        }
        y += GRID_SPACING;
    }
    intersections
}

/// §4.5 Step 6: brute-force phase search over the four cardinal
/// translations of magnitude `DOT_OFFSET`.
fn search_phase(
    intersections: &[Point],
    rotated: &[Point],
    config: &DecoderConfig,
) -> ((f64, f64), usize) {
    let radius = config.nearby_dot_radius();
    let candidates = [
        (DOT_OFFSET, 0.0),
        (-DOT_OFFSET, 0.0),
        (0.0, DOT_OFFSET),
        (0.0, -DOT_OFFSET),
    ];

    candidates
        .into_iter()
        .map(|candidate| {
            let hits = intersections
                .iter()
                .filter(|p| {
                    let shifted = Point::new(p.x + candidate.0, p.y + candidate.1);
                    rotated.iter().any(|c| shifted.distance(*c) < radius)
                })
                .count();
            (candidate, hits)
        })
        .max_by_key(|&(_, hits)| hits)
        .expect("candidates is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_grid_centroids(cols: usize, rows: usize) -> Vec<Point> {
        let mut centroids = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let gx = col as f64 * GRID_SPACING + 4.0;
                let gy = row as f64 * GRID_SPACING + 4.0;
                // every dot offset east, a trivial but valid carrier pattern
                centroids.push(Point::new(gx + DOT_OFFSET, gy));
            }
        }
        centroids
    }

    #[test]
    fn rotation_is_in_range() {
        let config = DecoderConfig::default();
        let centroids = synthetic_grid_centroids(4, 4);
        let (grid, ..) = estimate_grid(&centroids, &config).expect("should estimate");
        assert!(grid.rotation > -45.0 && grid.rotation <= 45.0 + 1e-9);
    }

    #[test]
    fn spacing_is_always_the_constant() {
        let config = DecoderConfig::default();
        let centroids = synthetic_grid_centroids(4, 4);
        let (grid, ..) = estimate_grid(&centroids, &config).expect("should estimate");
        assert!((grid.spacing - GRID_SPACING).abs() < 1e-12);
    }

    #[test]
    fn too_few_centroids_fails() {
        let config = DecoderConfig::default();
        let centroids = vec![Point::new(1.0, 1.0)];
        let err = estimate_grid(&centroids, &config).unwrap_err();
        assert_eq!(err, GeometryErrorKind::TooFewPairs);
    }

    #[test]
    fn axis_aligned_grid_resolves_near_zero_rotation() {
        let config = DecoderConfig::default();
        let centroids = synthetic_grid_centroids(5, 5);
        let (grid, ..) = estimate_grid(&centroids, &config).expect("should estimate");
        assert!(grid.rotation.abs() < 1.0, "rotation was {}", grid.rotation);
    }
}
