//! Curve densification
//!
//! Resamples a polyline to a fixed number of points. Parametrisation is by
//! source index, not arc length: unevenly spaced input stays unevenly spaced.

use crate::point::Point2;

/// Output point count used for track boundaries
pub const DEFAULT_DENSIFIED_POINTS: usize = 2000;

/// Resample `points` to exactly `k` points by per-axis linear interpolation
/// over a uniform index parameter in `[0, 1]`.
pub fn densify(points: &[Point2], k: usize) -> Vec<Point2> {
    match (points.len(), k) {
        (_, 0) | (0, _) => return Vec::new(),
        (1, _) => return vec![points[0]; k],
        (_, 1) => return vec![points[0]],
        _ => {}
    }

    let last_segment = points.len() - 2;
    let span = (points.len() - 1) as f64;
    let step = 1.0 / (k - 1) as f64;

    (0..k)
        .map(|i| {
            if i == k - 1 {
                return points[points.len() - 1];
            }
            // position along the source index axis
            let s = i as f64 * step * span;
            let seg = (s.floor() as usize).min(last_segment);
            points[seg].lerp(points[seg + 1], s - seg as f64)
        })
        .collect()
}
