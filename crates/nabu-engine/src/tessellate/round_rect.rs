use std::f32::consts::FRAC_PI_2;

use crate::coords::{Rect, Vec2};
use crate::paint::Stroke;

use super::arc::{arc_angles, arc_step};
use super::path::Path1D;
use super::stroke::{dash_path_with, solid_polyline};
use super::{Mesh, dedup_points};

/// Where a perimeter offset falls on a [`RoundRect`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PerimeterLocation {
    /// On corner `corner` (0 = top-right, clockwise) at local angle `angle`
    /// (radians, y-up convention around the corner's center).
    Corner { corner: u8, angle: f32 },
    /// On a straight edge, at user-space `(x, y)`.
    Edge { x: f32, y: f32 },
}

/// Rectangle with elliptical corners of radii `rx`, `ry`.
///
/// The perimeter is walked clockwise on screen starting at the left end of
/// the top edge: top edge, top-right corner, right edge, and so on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoundRect {
    rect: Rect,
    rx: f32,
    ry: f32,
}

impl RoundRect {
    /// Radii are clamped to half the rectangle's extent.
    pub fn new(rect: Rect, arc_width: f32, arc_height: f32) -> Self {
        let rect = rect.normalized();
        let clamp = |r: f32, max: f32| if r.is_finite() { r.abs().min(max) } else { 0.0 };
        Self {
            rect,
            rx: clamp(arc_width, rect.size.x * 0.5),
            ry: clamp(arc_height, rect.size.y * 0.5),
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn radii(&self) -> (f32, f32) {
        (self.rx, self.ry)
    }

    /// `(π/2)·√(rx² + ry²)`, the length credited to each corner.
    #[inline]
    pub fn arc_length(&self) -> f32 {
        FRAC_PI_2 * (self.rx * self.rx + self.ry * self.ry).sqrt()
    }

    #[inline]
    pub fn horizontal_length(&self) -> f32 {
        self.rect.size.x - 2.0 * self.rx
    }

    #[inline]
    pub fn vertical_length(&self) -> f32 {
        self.rect.size.y - 2.0 * self.ry
    }

    pub fn perimeter(&self) -> f32 {
        4.0 * self.arc_length() + 2.0 * self.horizontal_length() + 2.0 * self.vertical_length()
    }

    fn corner_center(&self, corner: u8) -> Vec2 {
        let (x0, y0) = (self.rect.origin.x + self.rx, self.rect.origin.y + self.ry);
        let (x1, y1) = (self.rect.max().x - self.rx, self.rect.max().y - self.ry);
        match corner {
            0 => Vec2::new(x1, y0),
            1 => Vec2::new(x1, y1),
            2 => Vec2::new(x0, y1),
            _ => Vec2::new(x0, y0),
        }
    }

    /// Starting local angle of `corner`; each corner sweeps -90°.
    #[inline]
    fn corner_start(corner: u8) -> f32 {
        FRAC_PI_2 - FRAC_PI_2 * corner as f32
    }

    fn corner_point(&self, corner: u8, angle: f32) -> Vec2 {
        let c = self.corner_center(corner);
        let (s, co) = angle.sin_cos();
        Vec2::new(c.x + self.rx * co, c.y - self.ry * s)
    }

    /// Edge `side` (0 = top, clockwise) as `(start, end)`.
    fn edge(&self, side: u8) -> (Vec2, Vec2) {
        let r = self.rect;
        let (x0, y0, x1, y1) = (r.origin.x, r.origin.y, r.max().x, r.max().y);
        match side {
            0 => (Vec2::new(x0 + self.rx, y0), Vec2::new(x1 - self.rx, y0)),
            1 => (Vec2::new(x1, y0 + self.ry), Vec2::new(x1, y1 - self.ry)),
            2 => (Vec2::new(x1 - self.rx, y1), Vec2::new(x0 + self.rx, y1)),
            _ => (Vec2::new(x0, y1 - self.ry), Vec2::new(x0, y0 + self.ry)),
        }
    }

    /// Classifies perimeter offset `d` (wrapped into `[0, perimeter)`).
    pub fn locate(&self, d: f32) -> PerimeterLocation {
        let total = self.perimeter();
        let mut d = if total > 0.0 { d.rem_euclid(total) } else { 0.0 };
        let arc = self.arc_length();

        for side in 0..4u8 {
            let edge_len = if side % 2 == 0 { self.horizontal_length() } else { self.vertical_length() };
            if d <= edge_len {
                let (a, b) = self.edge(side);
                let t = if edge_len > 0.0 { d / edge_len } else { 0.0 };
                let p = a.lerp(b, t);
                return PerimeterLocation::Edge { x: p.x, y: p.y };
            }
            d -= edge_len;
            if d <= arc || side == 3 {
                let t = if arc > 0.0 { (d / arc).min(1.0) } else { 0.0 };
                return PerimeterLocation::Corner { corner: side, angle: Self::corner_start(side) - t * FRAC_PI_2 };
            }
            d -= arc;
        }
        unreachable!("loop returns on the last corner")
    }

    pub fn point_at(&self, d: f32) -> Vec2 {
        match self.locate(d) {
            PerimeterLocation::Edge { x, y } => Vec2::new(x, y),
            PerimeterLocation::Corner { corner, angle } => self.corner_point(corner, angle),
        }
    }

    /// Sampled outline with perimeter distances; the last sample closes the loop.
    pub(crate) fn outline(&self) -> Path1D {
        let arc = self.arc_length();
        let step = arc_step(2.0 * self.rx, 2.0 * self.ry);
        let mut points = Vec::new();
        let mut dists = Vec::new();
        let mut d = 0.0;

        for side in 0..4u8 {
            let (a, _) = self.edge(side);
            points.push(a);
            dists.push(d);
            d += if side % 2 == 0 { self.horizontal_length() } else { self.vertical_length() };

            let start = Self::corner_start(side);
            for angle in arc_angles(start, -FRAC_PI_2, step) {
                points.push(self.corner_point(side, angle));
                dists.push(d + arc * ((start - angle) / FRAC_PI_2));
            }
            d += arc;
        }

        points.push(points[0]);
        dists.push(d);
        Path1D::from_samples(points, dists)
    }

    pub fn fill(&self) -> Mesh {
        let mut mesh = Mesh::new();
        if self.rect.is_empty() {
            return mesh;
        }
        let outline = self.outline();
        let rim = dedup_points(outline.points(), false);
        mesh.fan(self.rect.center(), &rim);
        mesh.map_uv_to(self.rect);
        mesh
    }

    pub fn stroke(&self, stroke: &Stroke) -> Mesh {
        let outline = self.outline();
        let mut mesh = Mesh::new();
        if stroke.is_dashed() {
            dash_path_with(&mut mesh, &outline, stroke, |d| self.point_at(d));
        } else {
            solid_polyline(&mut mesh, outline.points(), true, stroke);
        }
        mesh.with_own_uv()
    }
}
