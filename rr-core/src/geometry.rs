//! Track boundary reconstruction
//!
//! Builds inner and outer boundary curves by offsetting a reference-lap
//! centerline along its local left-hand normal.
//!
//! Tangents come from central differences (one-sided at the ends). A sample
//! whose tangent has zero length (duplicate neighbours) keeps a zero normal,
//! so both of its offsets collapse onto the centerline point. That is the
//! defined behaviour, not an error.

use crate::densify::{densify, DEFAULT_DENSIFIED_POINTS};
use crate::point::{Bounds, Point2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default full track width, in world units of the position trace
pub const DEFAULT_TRACK_WIDTH: f64 = 500.0;

/// Raw DRS channel values at or above this mean the flap is open
pub const DRS_OPEN_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("at least 2 centerline samples are required, got {0}")]
    InsufficientSamples(usize),

    #[error("no lap with usable telemetry was found")]
    NoValidLap,
}

/// Inclusive range of reference-lap sample indices with DRS available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrsZone {
    pub start_index: usize,
    pub end_index: usize,
}

/// Boundary curves computed per centerline sample, before densification
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetCurves {
    pub inner: Vec<Point2>,
    pub outer: Vec<Point2>,
    pub bounds: Bounds,
    /// Samples whose tangent was degenerate
    pub degenerate: usize,
}

/// Reconstructed track, immutable for the lifetime of a replay session
#[derive(Debug, Clone, PartialEq)]
pub struct TrackGeometry {
    pub centerline: Vec<Point2>,
    pub inner_boundary: Vec<Point2>,
    pub outer_boundary: Vec<Point2>,
    pub bounds: Bounds,
    pub drs_zones: Vec<DrsZone>,
}

impl TrackGeometry {
    /// Build geometry with boundaries densified to the default point count
    pub fn build(centerline: &[Point2], track_width: f64) -> Result<Self, GeometryError> {
        Self::build_with_density(centerline, track_width, DEFAULT_DENSIFIED_POINTS)
    }

    pub fn build_with_density(
        centerline: &[Point2],
        track_width: f64,
        densified_count: usize,
    ) -> Result<Self, GeometryError> {
        let offsets = offset_curves(centerline, track_width)?;

        debug!(
            samples = centerline.len(),
            degenerate = offsets.degenerate,
            densified_count,
            "Built track boundaries"
        );

        Ok(Self {
            centerline: centerline.to_vec(),
            inner_boundary: densify(&offsets.inner, densified_count),
            outer_boundary: densify(&offsets.outer, densified_count),
            bounds: offsets.bounds,
            drs_zones: Vec::new(),
        })
    }

    pub fn with_drs_zones(mut self, zones: Vec<DrsZone>) -> Self {
        self.drs_zones = zones;
        self
    }

    /// Number of points on each boundary curve
    pub fn densified_count(&self) -> usize {
        self.outer_boundary.len()
    }

    /// Map a reference-lap sample index onto the densified boundaries
    ///
    /// Densification is index-parametrised, so sample `i` of `n` sits at
    /// parameter `i / (n - 1)`.
    pub fn densified_index(&self, sample_index: usize) -> usize {
        let n = self.centerline.len();
        let k = self.densified_count();
        if n < 2 || k == 0 {
            return 0;
        }
        let t = sample_index.min(n - 1) as f64 / (n - 1) as f64;
        ((t * (k - 1) as f64).round() as usize).min(k - 1)
    }
}

/// Offset `centerline` by half of `track_width` on both sides
pub fn offset_curves(centerline: &[Point2], track_width: f64) -> Result<OffsetCurves, GeometryError> {
    if centerline.len() < 2 {
        return Err(GeometryError::InsufficientSamples(centerline.len()));
    }

    let half = track_width / 2.0;
    let mut inner = Vec::with_capacity(centerline.len());
    let mut outer = Vec::with_capacity(centerline.len());
    let mut degenerate = 0;

    for (c, tangent) in centerline.iter().zip(tangents(centerline)) {
        let mut norm = tangent.x.hypot(tangent.y);
        if norm == 0.0 {
            norm = 1.0;
            degenerate += 1;
        }
        let (tx, ty) = (tangent.x / norm, tangent.y / norm);
        // left-hand normal
        let (nx, ny) = (-ty, tx);

        outer.push(Point2::new(c.x + nx * half, c.y + ny * half));
        inner.push(Point2::new(c.x - nx * half, c.y - ny * half));
    }

    let bounds = Bounds::enclosing([centerline, &inner[..], &outer[..]]);

    Ok(OffsetCurves {
        inner,
        outer,
        bounds,
        degenerate,
    })
}

/// Central-difference gradient of x and y, one-sided at both ends
pub fn tangents(points: &[Point2]) -> Vec<Point2> {
    let n = points.len();
    if n < 2 {
        return vec![Point2::default(); n];
    }

    (0..n)
        .map(|i| {
            let (a, b, span) = match i {
                0 => (points[0], points[1], 1.0),
                i if i == n - 1 => (points[n - 2], points[n - 1], 1.0),
                i => (points[i - 1], points[i + 1], 2.0),
            };
            Point2::new((b.x - a.x) / span, (b.y - a.y) / span)
        })
        .collect()
}

/// Coalesce contiguous `true` runs into inclusive index zones
pub fn drs_zones_from_indicator(indicator: &[bool]) -> Vec<DrsZone> {
    let mut zones = Vec::new();
    let mut start = None;

    for (i, &open) in indicator.iter().enumerate() {
        match (open, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                zones.push(DrsZone {
                    start_index: s,
                    end_index: i - 1,
                });
                start = None;
            }
            _ => {}
        }
    }

    // zone still open when the lap ends
    if let Some(s) = start {
        zones.push(DrsZone {
            start_index: s,
            end_index: indicator.len() - 1,
        });
    }

    zones
}

/// Convert a raw DRS telemetry channel into an open/closed indicator
pub fn drs_indicator_from_channel(channel: &[f64]) -> Vec<bool> {
    channel.iter().map(|&v| v >= DRS_OPEN_THRESHOLD).collect()
}
