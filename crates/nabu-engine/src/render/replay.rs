//! CPU half of frame execution: replays a recorded buffer into batched
//! triangle geometry. Pure; the GPU half only uploads and draws the result.

use std::fmt;
use std::ops::Range;

use crate::canvas::{CommandBuffer, CommandView, GraphicsState, IMAGE_FLAG_BACKGROUND, Opcode, Operand, VERTEX_STRIDE};
use crate::coords::{Affine, Rect, Vec2, Viewport};
use crate::paint::{Color, GradientHandle, GradientId, GradientKind, ImageId, ImageTextureHandle, PaintSource};
use crate::tessellate::{
    Mesh, RoundRect, fill_arc, fill_polygon, image_quad, nine_slice, stroke_arc, stroke_line, stroke_polygon,
    stroke_polyline,
};
use crate::text::{FontHandle, FontId};

use super::common::BlendMode;
use super::vertex::{CanvasVertex, mode};

const UNIT: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// Texture a batch samples. Solid geometry samples a 1×1 white texel so every
/// batch runs through the same pipeline.
#[derive(Debug, Clone)]
pub enum TextureKey {
    White,
    Gradient(GradientHandle),
    Image(ImageTextureHandle),
    FontAtlas(FontHandle),
}

/// Cache identity of a [`TextureKey`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureId {
    White,
    Gradient(GradientId),
    Image(ImageId),
    FontAtlas(FontId),
}

impl TextureKey {
    pub fn id(&self) -> TextureId {
        match self {
            TextureKey::White => TextureId::White,
            TextureKey::Gradient(g) => TextureId::Gradient(g.id()),
            TextureKey::Image(i) => TextureId::Image(i.id()),
            TextureKey::FontAtlas(f) => TextureId::FontAtlas(f.id()),
        }
    }
}

impl PartialEq for TextureKey {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// A run of indices drawn with one texture, scissor and blend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub texture: TextureKey,
    /// Device-space clip; `None` is the whole viewport.
    pub clip: Option<Rect>,
    pub blend: BlendMode,
    pub indices: Range<u32>,
}

/// Replay output for one frame, in draw order.
#[derive(Debug, Clone, Default)]
pub struct FrameGeometry {
    pub vertices: Vec<CanvasVertex>,
    pub indices: Vec<u32>,
    pub batches: Vec<DrawBatch>,
    /// Background of a clear issued before any geometry; becomes the pass's
    /// load color.
    pub clear: Option<Color>,
    pub commands: usize,
    pub skipped: usize,
}

impl FrameGeometry {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Why a command was skipped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReplayError {
    BadOperands,
    NoFont,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::BadOperands => write!(f, "malformed operands"),
            ReplayError::NoFont => write!(f, "no font selected"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Replays `buffer` from `initial` state, identity transform and no clip.
///
/// Commands execute strictly in append order; a failing command is logged,
/// counted in `skipped`, and replay continues.
pub fn replay(buffer: &CommandBuffer, initial: &GraphicsState, viewport: Viewport) -> FrameGeometry {
    let mut r = Replayer {
        state: initial.clone(),
        transform: Affine::IDENTITY,
        clip: None,
        viewport,
        out: FrameGeometry::default(),
    };
    for cmd in buffer.iter() {
        r.out.commands += 1;
        if let Err(e) = r.execute(cmd) {
            log::warn!("skipping {:?}: {e}", cmd.opcode);
            r.out.skipped += 1;
        }
    }
    r.out
}

struct Fill {
    texture: TextureKey,
    color: Color,
    paint: [f32; 4],
    uv_scale: Vec2,
    blend: BlendMode,
}

impl Fill {
    fn solid(color: Color, blend: BlendMode) -> Self {
        Self {
            texture: TextureKey::White,
            color,
            paint: [mode::SOLID, 0.0, 0.0, 0.0],
            uv_scale: Vec2::new(1.0, 1.0),
            blend,
        }
    }

    fn textured(texture: TextureKey, color: Color, paint: [f32; 4]) -> Self {
        Self { texture, color, paint, uv_scale: Vec2::new(1.0, 1.0), blend: BlendMode::Over }
    }
}

struct Replayer {
    state: GraphicsState,
    transform: Affine,
    clip: Option<Rect>,
    viewport: Viewport,
    out: FrameGeometry,
}

fn fixed<T: Copy, const N: usize>(values: &[T]) -> Result<[T; N], ReplayError> {
    <[T; N]>::try_from(values).map_err(|_| ReplayError::BadOperands)
}

fn points_and_uvs(floats: &[f32]) -> Result<(Vec<Vec2>, Vec<Vec2>), ReplayError> {
    if floats.is_empty() || floats.len() % VERTEX_STRIDE != 0 {
        return Err(ReplayError::BadOperands);
    }
    Ok(floats
        .chunks_exact(VERTEX_STRIDE)
        .map(|c| (Vec2::new(c[0], c[1]), Vec2::new(c[2], c[3])))
        .unzip())
}

impl Replayer {
    fn execute(&mut self, cmd: CommandView<'_>) -> Result<(), ReplayError> {
        use Opcode::*;

        match cmd.opcode {
            Clear => self.clear(),
            ClearRect => {
                let [x, y, w, h] = fixed(cmd.floats)?;
                let fill = Fill::solid(self.state.background, BlendMode::Replace);
                self.emit(image_quad(Rect::new(x, y, w, h).normalized(), UNIT), fill);
            }
            ClipRect => {
                let [x, y, w, h] = fixed(cmd.floats)?;
                let r = self.transform.map_rect(Rect::new(x, y, w, h));
                let clip = match self.clip {
                    Some(c) => c.intersect(r).unwrap_or(Rect::new(r.origin.x, r.origin.y, 0.0, 0.0)),
                    None => r,
                };
                self.clip = Some(clip);
            }

            SetColor => {
                let [r, g, b, a] = fixed(cmd.floats)?;
                self.state.color = Color::from_premul(r, g, b, a);
            }
            SetBackground => {
                let [r, g, b, a] = fixed(cmd.floats)?;
                self.state.background = Color::from_premul(r, g, b, a);
            }
            SetStroke => match cmd.handles {
                [Operand::Stroke(s)] => self.state.stroke = s.clone(),
                _ => return Err(ReplayError::BadOperands),
            },
            SetFont => match cmd.handles {
                [Operand::Font(f)] => self.state.font = Some(f.clone()),
                _ => return Err(ReplayError::BadOperands),
            },
            SetGradient => match cmd.handles {
                [Operand::Gradient(g)] => {
                    self.state.paint = std::mem::take(&mut self.state.paint).with_gradient(g.clone())
                }
                _ => return Err(ReplayError::BadOperands),
            },
            SetImageTexture => match cmd.handles {
                [Operand::Image(i)] => self.state.paint = std::mem::take(&mut self.state.paint).with_image(i.clone()),
                _ => return Err(ReplayError::BadOperands),
            },

            Rotate => {
                let [theta] = fixed(cmd.floats)?;
                self.transform = self.transform.then(Affine::rotation(theta));
            }
            Scale => {
                let [sx, sy] = fixed(cmd.floats)?;
                self.transform = self.transform.then(Affine::scaling(sx, sy));
            }
            Translate => {
                let [tx, ty] = fixed(cmd.floats)?;
                self.transform = self.transform.then(Affine::translation(tx, ty));
            }
            Shear => {
                let [shx, shy] = fixed(cmd.floats)?;
                self.transform = self.transform.then(Affine::shearing(shx, shy));
            }
            SetTransform => {
                let [m00, m01, m02, m10, m11, m12] = fixed(cmd.floats)?;
                self.transform = Affine::new(m00, m01, m02, m10, m11, m12);
            }

            DrawLine => {
                let [x1, y1, x2, y2] = fixed(cmd.floats)?;
                let mesh = stroke_line(Vec2::new(x1, y1), Vec2::new(x2, y2), &self.state.stroke);
                self.emit_shape(mesh);
            }
            DrawArc | FillArc => {
                let [x, y, w, h, start, sweep] = fixed(cmd.floats)?;
                let bounds = Rect::new(x, y, w, h);
                let mesh = if cmd.opcode == FillArc {
                    fill_arc(bounds, start, sweep)
                } else {
                    stroke_arc(bounds, start, sweep, &self.state.stroke)
                };
                self.emit_shape(mesh);
            }
            DrawRoundRect | FillRoundRect => {
                let [x, y, w, h, aw, ah] = fixed(cmd.floats)?;
                let rr = RoundRect::new(Rect::new(x, y, w, h), aw, ah);
                let mesh = if cmd.opcode == FillRoundRect { rr.fill() } else { rr.stroke(&self.state.stroke) };
                self.emit_shape(mesh);
            }
            DrawRect | DrawPolygon | FillRect | FillPolygon | DrawPolyline => {
                let [count] = fixed(cmd.ints)?;
                let (points, uvs) = points_and_uvs(cmd.floats)?;
                if usize::try_from(count).ok() != Some(points.len()) {
                    return Err(ReplayError::BadOperands);
                }
                let mesh = match cmd.opcode {
                    FillRect | FillPolygon => fill_polygon(&points, &uvs),
                    DrawPolyline => stroke_polyline(&points, false, &self.state.stroke),
                    _ => stroke_polygon(&points, &self.state.stroke),
                };
                self.emit_shape(mesh);
            }

            DrawImage => self.draw_image(cmd)?,
            DrawString => self.draw_string(cmd)?,
        }
        Ok(())
    }

    fn clear(&mut self) {
        let bg = self.state.background;
        if self.out.indices.is_empty() && self.clip.is_none() {
            self.out.clear = Some(bg);
            return;
        }
        let mesh = image_quad(self.viewport.bounds(), UNIT);
        self.push(mesh, Fill::solid(bg, BlendMode::Replace));
    }

    fn draw_image(&mut self, cmd: CommandView<'_>) -> Result<(), ReplayError> {
        let [dx, dy, dw, dh, sx, sy, sw, sh] = fixed(cmd.floats)?;
        let [flags] = fixed(cmd.ints)?;
        let image = match cmd.handles {
            [Operand::Image(Some(i))] => i.clone(),
            _ => return Err(ReplayError::BadOperands),
        };

        let dst = Rect::new(dx, dy, dw, dh).normalized();
        if flags & IMAGE_FLAG_BACKGROUND != 0 {
            self.emit(image_quad(dst, UNIT), Fill::solid(self.state.background, BlendMode::Over));
        }

        let margins = image.options().margins;
        let mesh = if margins.is_zero() {
            let (iw, ih) = (image.width() as f32, image.height() as f32);
            image_quad(dst, Rect::new(sx / iw, sy / ih, sw / iw, sh / ih))
        } else {
            nine_slice(dst, image.width(), image.height(), margins)
        };
        let paint = [mode::IMAGE, 0.0, 0.0, 0.0];
        self.emit(mesh, Fill::textured(TextureKey::Image(image), Color::WHITE, paint));
        Ok(())
    }

    fn draw_string(&mut self, cmd: CommandView<'_>) -> Result<(), ReplayError> {
        let [x, y] = fixed(cmd.floats)?;
        let text = match cmd.handles {
            [Operand::Text(t)] => t.clone(),
            _ => return Err(ReplayError::BadOperands),
        };
        let font = self.state.font.clone().ok_or(ReplayError::NoFont)?;

        let mut mesh = Mesh::new();
        for p in font.layout(&text) {
            let g = p.glyph;
            if g.width <= 0.0 || g.height <= 0.0 {
                continue;
            }
            let dst = Rect::new(x + p.x + g.offset_x, y + g.offset_y, g.width, g.height);
            mesh.append(&image_quad(dst, g.uv));
        }
        let paint = [mode::GLYPH, 0.0, 0.0, 0.0];
        self.emit(mesh, Fill::textured(TextureKey::FontAtlas(font), self.state.color, paint));
        Ok(())
    }

    /// Fill for shapes, from the active paint source.
    fn shape_fill(&self) -> Fill {
        match &self.state.paint {
            PaintSource::Solid => Fill::solid(self.state.color, BlendMode::Over),
            PaintSource::Gradient(g) => {
                let o = g.origin();
                let paint = match g.kind() {
                    GradientKind::Linear { angle } => [mode::LINEAR, o.x, o.y, angle],
                    GradientKind::Radial { radius } => [mode::RADIAL, o.x, o.y, radius],
                };
                Fill::textured(TextureKey::Gradient(g.clone()), Color::WHITE, paint)
            }
            PaintSource::Image(i) => {
                let opts = i.options();
                Fill {
                    uv_scale: Vec2::new(opts.u_scale, opts.v_scale),
                    ..Fill::textured(TextureKey::Image(i.clone()), Color::WHITE, [mode::IMAGE, 0.0, 0.0, 0.0])
                }
            }
        }
    }

    fn emit_shape(&mut self, mesh: Mesh) {
        let fill = self.shape_fill();
        self.emit(mesh, fill);
    }

    /// Transforms `mesh` to device space and appends it.
    fn emit(&mut self, mut mesh: Mesh, fill: Fill) {
        mesh.transform(self.transform);
        self.push(mesh, fill);
    }

    fn push(&mut self, mesh: Mesh, fill: Fill) {
        if mesh.is_empty() {
            return;
        }
        let out = &mut self.out;
        let base = out.vertices.len() as u32;
        let color = fill.color.to_array();
        out.vertices.extend(mesh.vertices.iter().map(|v| CanvasVertex {
            pos: [v.pos.x, v.pos.y],
            uv: [v.uv.x * fill.uv_scale.x, v.uv.y * fill.uv_scale.y],
            color,
            paint: fill.paint,
        }));

        let start = out.indices.len() as u32;
        out.indices.extend(mesh.indices.iter().map(|i| i + base));
        let end = out.indices.len() as u32;

        match out.batches.last_mut() {
            Some(b) if b.indices.end == start && b.texture == fill.texture && b.clip == self.clip && b.blend == fill.blend => {
                b.indices.end = end;
            }
            _ => out.batches.push(DrawBatch {
                texture: fill.texture,
                clip: self.clip,
                blend: fill.blend,
                indices: start..end,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, CanvasConfig, RecordedFrame};
    use crate::paint::{Gradient, ImageOptions, ImageTexture, Margins, Stroke};
    use crate::tessellate::MAX_ARC_SEGMENTS;
    use crate::text::tests::ab_font;

    const VP: Viewport = Viewport::new(200.0, 100.0);

    fn frame(f: impl FnOnce(&Canvas)) -> RecordedFrame {
        let c = Canvas::new(CanvasConfig::default());
        assert!(c.reset());
        f(&c);
        c.done().unwrap();
        c.store().take_frame().unwrap()
    }

    fn run(frame: &RecordedFrame) -> FrameGeometry {
        replay(&frame.buffer, &frame.initial_state, VP)
    }

    fn positions(geo: &FrameGeometry) -> Vec<[f32; 2]> {
        geo.vertices.iter().map(|v| v.pos).collect()
    }

    // ── basic shapes ──────────────────────────────────────────────────────

    #[test]
    fn leading_clear_becomes_load_color() {
        let geo = run(&frame(|_| {}));
        assert_eq!(geo.clear, Some(Color::WHITE));
        assert!(geo.batches.is_empty());
        assert_eq!(geo.commands, 1);
    }

    #[test]
    fn filled_rect_is_one_quad_with_corner_uvs() {
        let geo = run(&frame(|c| c.fill_rect(10.0, 10.0, 50.0, 50.0).unwrap()));
        assert_eq!(geo.vertices.len(), 4);
        assert_eq!(geo.triangle_count(), 2);
        let uvs: Vec<[f32; 2]> = geo.vertices.iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(geo.batches.len(), 1);
        assert_eq!(geo.batches[0].texture, TextureKey::White);
        assert!(geo.vertices.iter().all(|v| v.color == Color::BLACK.to_array()));
    }

    #[test]
    fn oval_matches_full_arc() {
        let geo = run(&frame(|c| c.fill_oval(0.0, 0.0, 100.0, 50.0).unwrap()));
        let arc = fill_arc(Rect::new(0.0, 0.0, 100.0, 50.0), 0.0, 360.0);
        let expected: Vec<[f32; 2]> = arc.vertices.iter().map(|v| [v.pos.x, v.pos.y]).collect();
        assert_eq!(positions(&geo), expected);
        assert_eq!(geo.indices, arc.indices);
    }

    #[test]
    fn huge_ovals_replay_with_bounded_geometry() {
        let dashed = Stroke::builder().width(2.0).dash([1.0, 1.0], 0.0).build().unwrap();
        let geo = run(&frame(|c| {
            c.fill_oval(0.0, 0.0, 1e20, 1e20).unwrap();
            c.set_stroke(dashed).unwrap();
            c.draw_oval(-1e20, -1e20, 2e20, 2e20).unwrap();
        }));
        assert!(!geo.batches.is_empty());
        let fill = fill_arc(Rect::new(0.0, 0.0, 1e20, 1e20), 0.0, 360.0);
        assert!(fill.vertices.len() <= MAX_ARC_SEGMENTS as usize + 3);
        assert!(geo.vertices.iter().all(|v| v.pos.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn consecutive_solid_fills_share_a_batch() {
        let geo = run(&frame(|c| {
            c.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
            c.set_color(Color::WHITE).unwrap();
            c.fill_rect(20.0, 0.0, 10.0, 10.0).unwrap();
        }));
        assert_eq!(geo.batches.len(), 1);
        assert_eq!(geo.batches[0].indices, 0..12);
        assert_eq!(geo.vertices[4].color, Color::WHITE.to_array());
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[test]
    fn replay_sees_recorded_state_not_later_mutations() {
        let c = Canvas::new(CanvasConfig::default());
        let red = Color::from_premul(1.0, 0.0, 0.0, 1.0);
        assert!(c.reset());
        c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        c.set_color(red).unwrap();
        c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        c.done().unwrap();
        c.set_color(Color::WHITE).unwrap();

        let f = c.store().take_frame().unwrap();
        let geo = replay(&f.buffer, &f.initial_state, VP);
        assert_eq!(geo.vertices[0].color, Color::BLACK.to_array());
        assert_eq!(geo.vertices[4].color, red.to_array());
    }

    #[test]
    fn transforms_compose_in_call_order() {
        let geo = run(&frame(|c| {
            c.translate(10.0, 0.0).unwrap();
            c.scale(2.0, 2.0).unwrap();
            c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        }));
        assert_eq!(positions(&geo), vec![[10.0, 0.0], [12.0, 0.0], [12.0, 2.0], [10.0, 2.0]]);
    }

    #[test]
    fn gradient_paint_selects_lut_texture() {
        let g = Gradient::linear(Color::BLACK, Color::WHITE, 0.0).unwrap();
        let geo = run(&frame(|c| {
            c.set_gradient(Some(g.clone())).unwrap();
            c.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        }));
        assert_eq!(geo.batches[0].texture.id(), TextureId::Gradient(g.id()));
        assert_eq!(geo.vertices[0].mode(), mode::LINEAR);
    }

    // ── clip / clear ──────────────────────────────────────────────────────

    #[test]
    fn clip_is_transformed_and_intersected() {
        let geo = run(&frame(|c| {
            c.translate(5.0, 5.0).unwrap();
            c.clip_rect(0.0, 0.0, 50.0, 50.0).unwrap();
            c.clip_rect(20.0, 20.0, 100.0, 100.0).unwrap();
            c.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        }));
        assert_eq!(geo.batches[0].clip, Some(Rect::new(25.0, 25.0, 30.0, 30.0)));
    }

    #[test]
    fn clear_after_geometry_replaces() {
        let geo = run(&frame(|c| {
            c.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
            c.clear_rect(0.0, 0.0, 5.0, 5.0).unwrap();
        }));
        assert_eq!(geo.batches.len(), 2);
        assert_eq!(geo.batches[1].blend, BlendMode::Replace);
        assert_eq!(geo.vertices[4].color, Color::WHITE.to_array());
    }

    // ── images ────────────────────────────────────────────────────────────

    #[test]
    fn image_with_background_draws_two_batches() {
        let img = ImageTexture::new(::image::RgbaImage::new(4, 2), ImageOptions::default()).unwrap();
        let geo = run(&frame(|c| c.draw_image_region(&img, Rect::new(0.0, 0.0, 8.0, 4.0), Rect::new(2.0, 0.0, 2.0, 2.0), true).unwrap()));
        assert_eq!(geo.batches.len(), 2);
        assert_eq!(geo.batches[1].texture.id(), TextureId::Image(img.id()));
        let uvs: Vec<[f32; 2]> = geo.vertices[4..].iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.5, 0.0], [1.0, 0.0], [1.0, 1.0], [0.5, 1.0]]);
    }

    #[test]
    fn image_margins_use_nine_slice() {
        let opts = ImageOptions { margins: Margins::uniform(1), ..ImageOptions::default() };
        let img = ImageTexture::new(::image::RgbaImage::new(4, 4), opts).unwrap();
        let geo = run(&frame(|c| c.draw_image_scaled(&img, Rect::new(0.0, 0.0, 40.0, 40.0), false).unwrap()));
        assert_eq!(geo.triangle_count(), 18);
    }

    // ── text ──────────────────────────────────────────────────────────────

    #[test]
    fn text_without_font_is_skipped() {
        let geo = run(&frame(|c| {
            c.draw_string("AB", 0.0, 0.0).unwrap();
            c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        }));
        assert_eq!(geo.skipped, 1);
        assert_eq!(geo.vertices.len(), 4);
    }

    #[test]
    fn text_emits_one_quad_per_glyph() {
        let font = ab_font();
        let geo = run(&frame(|c| {
            c.set_font(font.clone()).unwrap();
            c.draw_string("AxB", 10.0, 20.0).unwrap();
        }));
        assert_eq!(geo.skipped, 0);
        assert_eq!(geo.vertices.len(), 8);
        assert_eq!(geo.batches[0].texture.id(), TextureId::FontAtlas(font.id()));
        let a = font.glyph('A').unwrap();
        assert_eq!(geo.vertices[0].pos, [10.0 + a.offset_x, 20.0 + a.offset_y]);
        assert_eq!(geo.vertices[0].uv, [a.uv.min().x, a.uv.min().y]);
        assert!(geo.vertices.iter().all(|v| v.mode() == mode::GLYPH));
    }
}
