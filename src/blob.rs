//! Connected-component labeling and blob splitting.

use fxhash::FxHashMap;

use crate::binarize::BinaryMask;
use crate::config::DOT_OFFSET;
use crate::geometry::Point;

/// A maximal 8-connected set of foreground pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    points: Vec<(usize, usize)>,
}

impl Blob {
    /// Number of pixels in the blob.
    #[must_use]
    #[inline]
    pub fn area(&self) -> usize {
        self.points.len()
    }

    /// Pixel coordinates belonging to the blob.
    #[must_use]
    #[inline]
    pub fn points(&self) -> &[(usize, usize)] {
        &self.points
    }

    /// Maximum pairwise Euclidean distance between any two pixels in the
    /// blob.
    #[must_use]
    pub fn max_length(&self) -> f64 {
        let mut max_len = 0.0f64;
        for (i, &(x1, y1)) in self.points.iter().enumerate() {
            for &(x2, y2) in &self.points[i + 1..] {
                let dist = point_distance((x1, y1), (x2, y2));
                if dist > max_len {
                    max_len = dist;
                }
            }
        }
        max_len
    }

    /// Arithmetic mean of the blob's pixel coordinates.
    ///
    /// Undefined (returns `(0.0, 0.0)`) on an empty blob; the labeler never
    /// produces one.
    #[must_use]
    pub fn center(&self) -> Point {
        if self.points.is_empty() {
            return Point::new(0.0, 0.0);
        }
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
        let n = self.points.len() as f64;
        Point::new(sum_x / n, sum_y / n)
    }

    /// Split the blob into two, iff its diameter exceeds `2 * DOT_OFFSET`
    /// (§4.3). Returns `None` if the blob should not be split.
    ///
    /// The two most distant pairs of pixels are found; they define two
    /// cluster "endpoints" (by shortest cross-pairing), and every pixel is
    /// assigned to whichever endpoint's midpoint it is nearer to. Ties on
    /// max-length are broken in favor of the first pair encountered.
    #[must_use]
    pub fn split(&self) -> Option<(Blob, Blob)> {
        if self.max_length() <= 2.0 * DOT_OFFSET {
            return None;
        }
        let pts = &self.points;

        let (mut a1, mut a2, mut best) = (pts[0], pts[1], -1.0f64);
        for (i, &p1) in pts.iter().enumerate() {
            for &p2 in &pts[i + 1..] {
                let d = point_distance(p1, p2);
                if d > best {
                    best = d;
                    a1 = p1;
                    a2 = p2;
                }
            }
        }

        let (mut b1, mut b2, mut best2) = (a1, a2, -1.0f64);
        for (i, &p1) in pts.iter().enumerate() {
            if p1 == a1 || p1 == a2 {
                continue;
            }
            for &p2 in &pts[i + 1..] {
                if p2 == a1 || p2 == a2 {
                    continue;
                }
                let d = point_distance(p1, p2);
                if d > best2 {
                    best2 = d;
                    b1 = p1;
                    b2 = p2;
                }
            }
        }

        let cross1 = point_distance(a1, b1);
        let cross2 = point_distance(a1, b2);

        let (mid1, mid2) = if cross1 < cross2 {
            (midpoint(a1, b1), midpoint(a2, b2))
        } else {
            (midpoint(a1, b2), midpoint(a2, b1))
        };

        let mut blob1 = Vec::new();
        let mut blob2 = Vec::new();
        for &p in pts {
            if dist_to_midpoint(p, mid1) < dist_to_midpoint(p, mid2) {
                blob1.push(p);
            } else {
                blob2.push(p);
            }
        }

        Some((Blob { points: blob1 }, Blob { points: blob2 }))
    }
}

fn dist_to_midpoint(p: (usize, usize), mid: (f64, f64)) -> f64 {
    ((p.0 as f64 - mid.0).powi(2) + (p.1 as f64 - mid.1).powi(2)).sqrt()
}

fn midpoint(a: (usize, usize), b: (usize, usize)) -> (f64, f64) {
    ((a.0 as f64 + b.0 as f64) / 2.0, (a.1 as f64 + b.1 as f64) / 2.0)
}

fn point_distance(a: (usize, usize), b: (usize, usize)) -> f64 {
    ((a.0 as f64 - b.0 as f64).powi(2) + (a.1 as f64 - b.1 as f64).powi(2)).sqrt()
}

/// Label the foreground pixels of `mask` into 8-connected blobs.
///
/// Uses a single raster scan with local propagation: a foreground pixel
/// adopts the label of any already-labeled neighbor, or starts a fresh label,
/// and promotes any still-unlabeled foreground neighbors to the same label.
/// This one-pass scheme is approximate (two regions touching only through a
/// descending-diagonal path on the next row may end up with different
/// labels); the pipeline tolerates under-merging and separately compensates
/// for over-merging via [`Blob::split`].
///
/// The mask itself is never mutated: labels live in a parallel buffer.
#[must_use]
pub fn label_blobs(mask: &BinaryMask) -> Vec<Blob> {
    let (width, height) = (mask.width(), mask.height());
    let mut labels: Vec<u32> = vec![0; width * height];
    let mut next_label: u32 = 1;
    let mut blobs: FxHashMap<u32, Vec<(usize, usize)>> = FxHashMap::default();

    for y in 0..height {
        for x in 0..width {
            if !mask.get(x, y) {
                continue;
            }
            if labels[y * width + x] != 0 {
                continue;
            }

            let mut found_label = 0u32;
            'search: for dy in -1i32..=1 {
                let ny = y as i32 + dy;
                if ny < 0 || ny >= height as i32 {
                    continue;
                }
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    if nx < 0 || nx >= width as i32 {
                        continue;
                    }
                    let label = labels[ny as usize * width + nx as usize];
                    if label != 0 {
                        found_label = label;
                        break 'search;
                    }
                }
            }

            let label = if found_label != 0 {
                found_label
            } else {
                let l = next_label;
                next_label += 1;
                l
            };

            labels[y * width + x] = label;
            blobs.entry(label).or_default().push((x, y));

            for dy in -1i32..=1 {
                let ny = y as i32 + dy;
                if ny < 0 || ny >= height as i32 {
                    continue;
                }
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    if nx < 0 || nx >= width as i32 {
                        continue;
                    }
                    let (nxu, nyu) = (nx as usize, ny as usize);
                    if mask.get(nxu, nyu) && labels[nyu * width + nxu] == 0 {
                        labels[nyu * width + nxu] = label;
                        blobs.entry(label).or_default().push((nxu, nyu));
                    }
                }
            }
        }
    }

    let result: Vec<Blob> = blobs.into_values().map(|points| Blob { points }).collect();
    log::debug!("label_blobs: {} blobs found", result.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_str(rows: &[&str]) -> BinaryMask {
        let height = rows.len();
        let width = rows[0].len();
        let pixels = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| c == '#'))
            .collect();
        BinaryMask::from_pixels(width, height, pixels)
    }

    #[test]
    fn labeling_covers_all_foreground_pixels() {
        let mask = mask_from_str(&["##.", ".#.", "..#"]);
        let blobs = label_blobs(&mask);
        let total: usize = blobs.iter().map(Blob::area).sum();
        let foreground = mask.foreground_count();
        assert_eq!(total, foreground);
    }

    #[test]
    fn isolated_dots_form_separate_blobs() {
        let mask = mask_from_str(&["#...#", ".....", "#...#"]);
        let blobs = label_blobs(&mask);
        assert_eq!(blobs.len(), 4);
        assert!(blobs.iter().all(|b| b.area() == 1));
    }

    #[test]
    fn split_conserves_points() {
        let blob = Blob {
            points: vec![(0, 0), (1, 0), (2, 0), (10, 0), (11, 0), (12, 0)],
        };
        let (a, b) = blob.split().expect("blob should split");
        let mut combined: Vec<_> = a.points().iter().chain(b.points()).copied().collect();
        combined.sort_unstable();
        let mut original = blob.points.clone();
        original.sort_unstable();
        assert_eq!(combined, original);

        let mut a_sorted = a.points().to_vec();
        let mut b_sorted = b.points().to_vec();
        a_sorted.sort_unstable();
        b_sorted.sort_unstable();
        assert!(a_sorted.iter().all(|p| !b_sorted.contains(p)));
    }

    #[test]
    fn exact_threshold_is_not_split() {
        let d = 2.0 * DOT_OFFSET;
        let blob = Blob {
            points: vec![(0, 0), (d.round() as usize, 0)],
        };
        assert!((blob.max_length() - d).abs() < 1.0);
        if blob.max_length() <= d {
            assert!(blob.split().is_none());
        }
    }
}
