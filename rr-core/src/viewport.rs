//! World to screen mapping
//!
//! Fits world bounds into a padded viewport with one uniform scale, so the
//! track keeps its aspect ratio, and centres it. Computed once per session.

use crate::point::{Bounds, Point2};
use serde::{Deserialize, Serialize};

/// Target surface size and padding fraction per side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_padding() -> f64 {
    0.05
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            padding: default_padding(),
        }
    }
}

impl Viewport {
    pub fn usable_width(&self) -> f64 {
        self.width * (1.0 - 2.0 * self.padding)
    }

    pub fn usable_height(&self) -> f64 {
        self.height * (1.0 - 2.0 * self.padding)
    }

    /// The drawable region after padding is removed
    pub fn inner_bounds(&self) -> Bounds {
        let px = self.width * self.padding;
        let py = self.height * self.padding;
        Bounds {
            x_min: px,
            x_max: self.width - px,
            y_min: py,
            y_max: self.height - py,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
    viewport: Viewport,
    center: Point2,
    cos_rot: f64,
    sin_rot: f64,
}

impl CoordinateMapper {
    /// Fit `bounds` into `viewport` without rotation
    pub fn fit(bounds: &Bounds, viewport: Viewport) -> Self {
        Self::fit_rotated(bounds, viewport, 0.0)
    }

    /// Fit `bounds` after rotating the world by `rotation_deg` about its centre
    pub fn fit_rotated(bounds: &Bounds, viewport: Viewport, rotation_deg: f64) -> Self {
        let radians = rotation_deg.to_radians();
        let (sin_rot, cos_rot) = if rotation_deg == 0.0 {
            (0.0, 1.0)
        } else {
            radians.sin_cos()
        };
        let center = bounds.center();

        let mut mapper = Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
            viewport,
            center,
            cos_rot,
            sin_rot,
        };

        let mut rotated = Bounds::empty();
        for corner in bounds.corners() {
            rotated.include(mapper.rotate(corner));
        }

        // floor of 1 keeps degenerate bounds from dividing by zero
        let world_w = rotated.width().max(1.0);
        let world_h = rotated.height().max(1.0);
        let scale = (viewport.usable_width() / world_w).min(viewport.usable_height() / world_h);

        mapper.scale = scale;
        mapper.tx = viewport.width / 2.0 - scale * center.x;
        mapper.ty = viewport.height / 2.0 - scale * center.y;
        mapper
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn rotate(&self, p: Point2) -> Point2 {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        Point2::new(
            dx * self.cos_rot - dy * self.sin_rot + self.center.x,
            dx * self.sin_rot + dy * self.cos_rot + self.center.y,
        )
    }

    /// World coordinates to screen coordinates
    pub fn project(&self, x: f64, y: f64) -> Point2 {
        let r = self.rotate(Point2::new(x, y));
        Point2::new(self.scale * r.x + self.tx, self.scale * r.y + self.ty)
    }

    pub fn project_point(&self, p: Point2) -> Point2 {
        self.project(p.x, p.y)
    }

    pub fn project_polyline(&self, points: &[Point2]) -> Vec<Point2> {
        points.iter().map(|p| self.project_point(*p)).collect()
    }
}
