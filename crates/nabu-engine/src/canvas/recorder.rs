use std::sync::Arc;

use crate::coords::{Affine, Rect, Vec2};
use crate::paint::{Color, GradientHandle, ImageTextureHandle, PaintSource, StrokeHandle};
use crate::tessellate::polygon_uvs;
use crate::text::FontHandle;

use super::buffer::Operand;
use super::config::CanvasConfig;
use super::error::CanvasError;
use super::observer::{FrameObserver, FrameStats};
use super::opcode::{IMAGE_FLAG_BACKGROUND, Opcode, VERTEX_STRIDE};
use super::state::GraphicsState;
use super::store::CommandStore;

/// Recording handle of one canvas.
///
/// Clones share the same store. Exactly one thread records at a time: the one
/// whose `reset()` succeeded, until it calls `done()`.
#[derive(Clone)]
pub struct Canvas {
    store: Arc<CommandStore>,
}

fn finite(values: &[f32], what: &'static str) -> Result<(), CanvasError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CanvasError::InvalidArgument(what))
    }
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self { store: Arc::new(CommandStore::new(config)) }
    }

    #[inline]
    pub fn store(&self) -> &Arc<CommandStore> {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &CanvasConfig {
        self.store.config()
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Begins recording a frame on the calling thread.
    ///
    /// Returns `false` if another session is open. Blocks while the previous
    /// frame is still being executed. On success the default colors and
    /// stroke are restored, the state is snapshotted for the executor, and a
    /// full clear is recorded; font and paint source carry over.
    pub fn reset(&self) -> bool {
        self.store.begin(true)
    }

    /// Like [`reset`](Self::reset) but returns `false` instead of waiting
    /// for an in-flight frame.
    pub fn try_reset(&self) -> bool {
        self.store.begin(false)
    }

    /// Closes the session and hands the frame to the executor.
    pub fn done(&self) -> Result<(), CanvasError> {
        let index = self.store.finish()?;
        for observer in self.store.observers() {
            observer.frame_recorded(self, index);
        }
        Ok(())
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.store.is_recording()
    }

    pub fn add_observer(&self, observer: Arc<dyn FrameObserver>) {
        self.store.add_observer(observer);
    }

    pub(crate) fn notify_rendered(&self, frame_index: u64, stats: &FrameStats) {
        for observer in self.store.observers() {
            observer.frame_rendered(self, frame_index, stats);
        }
    }

    fn push(&self, opcode: Opcode, floats: &[f32], ints: &[i32], handles: &[Operand]) -> Result<(), CanvasError> {
        self.store.record(|p| p.buffer.push(opcode, floats, ints, handles))
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn set_color(&self, color: Color) -> Result<(), CanvasError> {
        finite(&color.to_array(), "color")?;
        self.store.set_state(Opcode::SetColor, &color.to_array(), &[], |s| s.color = color)
    }

    pub fn color(&self) -> Color {
        self.store.current(|s| s.color)
    }

    pub fn set_background(&self, color: Color) -> Result<(), CanvasError> {
        finite(&color.to_array(), "background color")?;
        self.store.set_state(Opcode::SetBackground, &color.to_array(), &[], |s| s.background = color)
    }

    pub fn background(&self) -> Color {
        self.store.current(|s| s.background)
    }

    pub fn set_stroke(&self, stroke: StrokeHandle) -> Result<(), CanvasError> {
        let op = Operand::Stroke(stroke.clone());
        self.store.set_state(Opcode::SetStroke, &[], &[op], |s| s.stroke = stroke)
    }

    pub fn stroke(&self) -> StrokeHandle {
        self.store.current(|s| s.stroke.clone())
    }

    pub fn set_font(&self, font: FontHandle) -> Result<(), CanvasError> {
        let op = Operand::Font(font.clone());
        self.store.set_state(Opcode::SetFont, &[], &[op], |s| s.font = Some(font))
    }

    pub fn font(&self) -> Option<FontHandle> {
        self.store.current(|s| s.font.clone())
    }

    /// Selects a gradient paint, replacing any image texture. `None` returns
    /// to solid color if a gradient was active.
    pub fn set_gradient(&self, gradient: Option<GradientHandle>) -> Result<(), CanvasError> {
        let op = Operand::Gradient(gradient.clone());
        self.store.set_state(Opcode::SetGradient, &[], &[op], |s| {
            s.paint = std::mem::take(&mut s.paint).with_gradient(gradient)
        })
    }

    pub fn gradient(&self) -> Option<GradientHandle> {
        self.store.current(|s| s.paint.gradient().cloned())
    }

    /// Image counterpart of [`set_gradient`](Self::set_gradient).
    pub fn set_image_texture(&self, image: Option<ImageTextureHandle>) -> Result<(), CanvasError> {
        let op = Operand::Image(image.clone());
        self.store.set_state(Opcode::SetImageTexture, &[], &[op], |s| {
            s.paint = std::mem::take(&mut s.paint).with_image(image)
        })
    }

    pub fn image_texture(&self) -> Option<ImageTextureHandle> {
        self.store.current(|s| s.paint.image().cloned())
    }

    pub fn paint(&self) -> PaintSource {
        self.store.current(|s| s.paint.clone())
    }

    /// Copy of the current state.
    pub fn state(&self) -> GraphicsState {
        self.store.current(GraphicsState::clone)
    }

    // ── transforms ────────────────────────────────────────────────────────

    /// Rotates by `theta` radians.
    pub fn rotate(&self, theta: f32) -> Result<(), CanvasError> {
        finite(&[theta], "rotation angle")?;
        self.push(Opcode::Rotate, &[theta], &[], &[])
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Result<(), CanvasError> {
        finite(&[sx, sy], "scale")?;
        self.push(Opcode::Scale, &[sx, sy], &[], &[])
    }

    pub fn translate(&self, tx: f32, ty: f32) -> Result<(), CanvasError> {
        finite(&[tx, ty], "translation")?;
        self.push(Opcode::Translate, &[tx, ty], &[], &[])
    }

    pub fn shear(&self, shx: f32, shy: f32) -> Result<(), CanvasError> {
        finite(&[shx, shy], "shear")?;
        self.push(Opcode::Shear, &[shx, shy], &[], &[])
    }

    /// Replaces the transform outright.
    pub fn set_transform(&self, m: Affine) -> Result<(), CanvasError> {
        let f = [m.m00, m.m01, m.m02, m.m10, m.m11, m.m12];
        finite(&f, "transform")?;
        self.push(Opcode::SetTransform, &f, &[], &[])
    }

    // ── geometry ──────────────────────────────────────────────────────────

    pub fn draw_line(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<(), CanvasError> {
        let f = [x1, y1, x2, y2];
        finite(&f, "line endpoints")?;
        self.push(Opcode::DrawLine, &f, &[], &[])
    }

    pub fn draw_rect(&self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        self.rect(Opcode::DrawRect, x, y, w, h)
    }

    pub fn fill_rect(&self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        self.rect(Opcode::FillRect, x, y, w, h)
    }

    fn rect(&self, opcode: Opcode, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        finite(&[x, y, w, h], "rectangle")?;
        let r = Rect::new(x, y, w, h).normalized();
        let (min, max) = (r.min(), r.max());
        let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
        self.vertices(opcode, &corners)
    }

    pub fn draw_oval(&self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        self.draw_arc(x, y, w, h, 0.0, 360.0)
    }

    pub fn fill_oval(&self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        self.fill_arc(x, y, w, h, 0.0, 360.0)
    }

    /// Outlines the arc of the ellipse inscribed in `(x, y, w, h)`.
    ///
    /// Angles are degrees, counter-clockwise from 3 o'clock; a negative sweep
    /// runs clockwise.
    pub fn draw_arc(&self, x: f32, y: f32, w: f32, h: f32, start: f32, sweep: f32) -> Result<(), CanvasError> {
        let f = [x, y, w, h, start, sweep];
        finite(&f, "arc")?;
        self.push(Opcode::DrawArc, &f, &[], &[])
    }

    pub fn fill_arc(&self, x: f32, y: f32, w: f32, h: f32, start: f32, sweep: f32) -> Result<(), CanvasError> {
        let f = [x, y, w, h, start, sweep];
        finite(&f, "arc")?;
        self.push(Opcode::FillArc, &f, &[], &[])
    }

    pub fn draw_round_rect(&self, x: f32, y: f32, w: f32, h: f32, arc_w: f32, arc_h: f32) -> Result<(), CanvasError> {
        let f = [x, y, w, h, arc_w, arc_h];
        finite(&f, "round rectangle")?;
        self.push(Opcode::DrawRoundRect, &f, &[], &[])
    }

    pub fn fill_round_rect(&self, x: f32, y: f32, w: f32, h: f32, arc_w: f32, arc_h: f32) -> Result<(), CanvasError> {
        let f = [x, y, w, h, arc_w, arc_h];
        finite(&f, "round rectangle")?;
        self.push(Opcode::FillRoundRect, &f, &[], &[])
    }

    /// Closed outline through `points`.
    pub fn draw_polygon(&self, points: &[Vec2]) -> Result<(), CanvasError> {
        self.vertices(Opcode::DrawPolygon, points)
    }

    pub fn fill_polygon(&self, points: &[Vec2]) -> Result<(), CanvasError> {
        self.vertices(Opcode::FillPolygon, points)
    }

    /// Open outline through `points`.
    pub fn draw_polyline(&self, points: &[Vec2]) -> Result<(), CanvasError> {
        self.vertices(Opcode::DrawPolyline, points)
    }

    /// Records a polygon-class command with UVs resolved against the
    /// points' bounding box.
    fn vertices(&self, opcode: Opcode, points: &[Vec2]) -> Result<(), CanvasError> {
        if points.is_empty() {
            return Err(CanvasError::InvalidArgument("empty point list"));
        }
        let count = i32::try_from(points.len()).map_err(|_| CanvasError::InvalidArgument("too many points"))?;
        if !points.iter().all(|p| p.is_finite()) {
            return Err(CanvasError::InvalidArgument("point"));
        }

        let uvs = polygon_uvs(points);
        let mut floats = Vec::with_capacity(points.len() * VERTEX_STRIDE);
        for (p, uv) in points.iter().zip(&uvs) {
            floats.extend_from_slice(&[p.x, p.y, uv.x, uv.y]);
        }
        self.push(opcode, &floats, &[count], &[])
    }

    // ── images ────────────────────────────────────────────────────────────

    /// Draws `image` unscaled with its top-left corner at `(x, y)`.
    pub fn draw_image(&self, image: &ImageTextureHandle, x: f32, y: f32) -> Result<(), CanvasError> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        self.draw_image_region(image, Rect::new(x, y, w, h), Rect::new(0.0, 0.0, w, h), false)
    }

    /// Draws the whole of `image` stretched into `dst`; `background` fills
    /// `dst` with the background color first.
    pub fn draw_image_scaled(&self, image: &ImageTextureHandle, dst: Rect, background: bool) -> Result<(), CanvasError> {
        let src = Rect::new(0.0, 0.0, image.width() as f32, image.height() as f32);
        self.draw_image_region(image, dst, src, background)
    }

    /// Draws the `src` region of `image` (in image pixels) into `dst`.
    pub fn draw_image_region(
        &self,
        image: &ImageTextureHandle,
        dst: Rect,
        src: Rect,
        background: bool,
    ) -> Result<(), CanvasError> {
        let f = [
            dst.origin.x, dst.origin.y, dst.size.x, dst.size.y,
            src.origin.x, src.origin.y, src.size.x, src.size.y,
        ];
        finite(&f, "image rectangle")?;
        let flags = if background { IMAGE_FLAG_BACKGROUND } else { 0 };
        self.push(Opcode::DrawImage, &f, &[flags], &[Operand::Image(Some(image.clone()))])
    }

    // ── text ──────────────────────────────────────────────────────────────

    /// Draws `text` with its baseline origin at `(x, y)` in the current font.
    pub fn draw_string(&self, text: &str, x: f32, y: f32) -> Result<(), CanvasError> {
        finite(&[x, y], "text origin")?;
        self.push(Opcode::DrawString, &[x, y], &[], &[Operand::Text(Arc::from(text))])
    }

    /// Advance width and glyph height of `text` in the current font; zero
    /// without one.
    pub fn measure_string(&self, text: &str) -> Vec2 {
        self.store.current(|s| s.font.as_ref().map_or(Vec2::zero(), |f| f.measure(text)))
    }

    // ── clear / clip ──────────────────────────────────────────────────────

    /// Fills the rectangle with the background color, ignoring paint.
    pub fn clear_rect(&self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        let f = [x, y, w, h];
        finite(&f, "clear rectangle")?;
        self.push(Opcode::ClearRect, &f, &[], &[])
    }

    /// Intersects the clip with the rectangle, in current user space.
    pub fn clip_rect(&self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
        let f = [x, y, w, h];
        finite(&f, "clip rectangle")?;
        self.push(Opcode::ClipRect, &f, &[], &[])
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas").field("store", &self.store).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BufferLimits, Pool, RecordedFrame};
    use crate::paint::{Gradient, ImageOptions, ImageTexture, Stroke};
    use crate::text::tests::ab_font;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn canvas() -> Canvas {
        Canvas::new(CanvasConfig::default())
    }

    fn record(c: &Canvas, f: impl FnOnce(&Canvas)) -> RecordedFrame {
        assert!(c.reset());
        f(c);
        c.done().unwrap();
        c.store().take_frame().unwrap()
    }

    fn opcodes(frame: &RecordedFrame) -> Vec<Opcode> {
        frame.buffer.iter().map(|c| c.opcode).collect()
    }

    // ── session ───────────────────────────────────────────────────────────

    #[test]
    fn second_reset_fails_while_recording() {
        let c = canvas();
        assert!(c.reset());
        assert!(!c.reset());
        assert!(!c.clone().try_reset());
        c.done().unwrap();
    }

    #[test]
    fn concurrent_resets_admit_exactly_one() {
        let c = canvas();
        let barrier = Barrier::new(2);
        let wins = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    barrier.wait();
                    if c.reset() {
                        wins.fetch_add(1, Ordering::SeqCst);
                        c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
                        barrier.wait();
                        c.done().unwrap();
                    } else {
                        barrier.wait();
                    }
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn calls_from_other_threads_are_rejected() {
        let c = canvas();
        assert!(c.reset());
        thread::scope(|s| {
            s.spawn(|| {
                assert_eq!(c.fill_rect(0.0, 0.0, 1.0, 1.0), Err(CanvasError::ForeignThread));
                assert_eq!(c.set_color(Color::WHITE), Err(CanvasError::ForeignThread));
                assert_eq!(c.done(), Err(CanvasError::ForeignThread));
            });
        });
        c.done().unwrap();
    }

    #[test]
    fn drawing_outside_a_session_is_rejected() {
        let c = canvas();
        assert_eq!(c.draw_line(0.0, 0.0, 1.0, 1.0), Err(CanvasError::NotRecording));
        assert_eq!(c.done(), Err(CanvasError::NotRecording));
        assert!(c.reset());
        c.done().unwrap();
        assert_eq!(c.done(), Err(CanvasError::NotRecording));
    }

    #[test]
    fn reset_waits_for_the_previous_frame() {
        let c = canvas();
        assert!(c.reset());
        c.done().unwrap();
        assert!(!c.try_reset());
        assert!(!c.is_recording());

        let frame = c.store().take_frame().unwrap();
        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let ok = c.reset();
                if ok {
                    c.done().unwrap();
                }
                ok
            });
            thread::sleep(Duration::from_millis(20));
            c.store().complete_frame(frame.buffer);
            assert!(waiter.join().unwrap());
        });
        assert!(c.store().has_pending_frame());
    }

    #[test]
    fn frames_start_with_a_clear() {
        let frame = record(&canvas(), |_| {});
        assert_eq!(opcodes(&frame), vec![Opcode::Clear]);
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[test]
    fn reset_restores_default_colors_and_stroke() {
        let c = canvas();
        let f0 = record(&c, |c| {
            c.set_color(Color::WHITE).unwrap();
            c.set_stroke(Stroke::new(5.0).unwrap()).unwrap();
        });
        assert_eq!(opcodes(&f0), vec![Opcode::Clear, Opcode::SetColor, Opcode::SetStroke]);
        c.store().complete_frame(f0.buffer);

        let f1 = record(&c, |_| {});
        assert_eq!(f1.initial_state.color, Color::BLACK);
        assert_eq!(f1.initial_state.stroke.width, 1.0);
    }

    #[test]
    fn font_set_between_frames_reaches_the_next_snapshot() {
        let c = canvas();
        let font = ab_font();
        c.set_font(font.clone()).unwrap();
        let frame = record(&c, |_| {});
        assert_eq!(frame.initial_state.font.as_ref().map(|f| f.id()), Some(font.id()));
        assert_eq!(opcodes(&frame), vec![Opcode::Clear]);
    }

    #[test]
    fn snapshot_ignores_later_mutation() {
        let c = canvas();
        assert!(c.reset());
        c.set_color(Color::WHITE).unwrap();
        c.done().unwrap();
        let frame = c.store().take_frame().unwrap();
        assert_eq!(frame.initial_state.color, Color::BLACK);
        assert_eq!(c.color(), Color::WHITE);
    }

    #[test]
    fn gradient_and_image_are_exclusive() {
        let c = canvas();
        let g = Gradient::linear(Color::BLACK, Color::WHITE, 0.0).unwrap();
        let img = ImageTexture::new(::image::RgbaImage::new(2, 2), ImageOptions::default()).unwrap();

        c.set_gradient(Some(g)).unwrap();
        c.set_image_texture(Some(img.clone())).unwrap();
        assert!(c.gradient().is_none());
        assert_eq!(c.image_texture().map(|i| i.id()), Some(img.id()));

        c.set_gradient(None).unwrap();
        assert!(c.image_texture().is_some());
        c.set_image_texture(None).unwrap();
        assert!(matches!(c.paint(), PaintSource::Solid));
    }

    #[test]
    fn rejected_state_change_leaves_state_untouched() {
        let limits = BufferLimits { max_commands: 1, ..BufferLimits::default() };
        let c = Canvas::new(CanvasConfig { limits, ..CanvasConfig::default() });
        assert!(c.reset());
        let err = c.set_color(Color::WHITE).unwrap_err();
        assert_eq!(err, CanvasError::CapacityExceeded { pool: Pool::Commands, limit: 1 });
        assert_eq!(c.color(), Color::BLACK);
        c.done().unwrap();
    }

    // ── recording ─────────────────────────────────────────────────────────

    #[test]
    fn ovals_are_recorded_as_full_arcs() {
        let frame = record(&canvas(), |c| c.fill_oval(0.0, 0.0, 10.0, 20.0).unwrap());
        let cmd = frame.buffer.iter().nth(1).unwrap();
        assert_eq!(cmd.opcode, Opcode::FillArc);
        assert_eq!(cmd.floats, &[0.0, 0.0, 10.0, 20.0, 0.0, 360.0]);
    }

    #[test]
    fn rects_carry_corner_uvs() {
        let frame = record(&canvas(), |c| c.fill_rect(10.0, 10.0, 50.0, 50.0).unwrap());
        let cmd = frame.buffer.iter().nth(1).unwrap();
        assert_eq!(cmd.opcode, Opcode::FillRect);
        assert_eq!(cmd.ints, &[4]);
        assert_eq!(
            cmd.floats,
            &[
                10.0, 10.0, 0.0, 0.0, //
                60.0, 10.0, 1.0, 0.0, //
                60.0, 60.0, 1.0, 1.0, //
                10.0, 60.0, 0.0, 1.0,
            ]
        );
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let c = canvas();
        assert!(c.reset());
        assert!(matches!(c.draw_line(f32::NAN, 0.0, 1.0, 1.0), Err(CanvasError::InvalidArgument(_))));
        assert!(matches!(c.fill_polygon(&[]), Err(CanvasError::InvalidArgument(_))));
        assert!(matches!(c.rotate(f32::INFINITY), Err(CanvasError::InvalidArgument(_))));
        c.done().unwrap();
        let frame = c.store().take_frame().unwrap();
        assert_eq!(frame.buffer.len(), 1);
    }

    #[test]
    fn capacity_overflow_keeps_recording_consistent() {
        let limits = BufferLimits { max_floats: 10, ..BufferLimits::default() };
        let c = Canvas::new(CanvasConfig { limits, ..CanvasConfig::default() });
        let frame = record(&c, |c| {
            c.draw_line(0.0, 0.0, 1.0, 1.0).unwrap();
            let err = c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap_err();
            assert_eq!(err, CanvasError::CapacityExceeded { pool: Pool::Floats, limit: 10 });
            c.draw_line(1.0, 1.0, 2.0, 2.0).unwrap();
        });
        assert_eq!(opcodes(&frame), vec![Opcode::Clear, Opcode::DrawLine, Opcode::DrawLine]);
        assert_eq!(frame.buffer.iter().nth(2).unwrap().floats, &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn measure_uses_current_font() {
        let c = canvas();
        assert_eq!(c.measure_string("AB"), Vec2::zero());
        c.set_font(ab_font()).unwrap();
        assert_eq!(c.measure_string("AB").x, ab_font().measure("AB").x);
    }

    // ── observers ─────────────────────────────────────────────────────────

    #[derive(Default)]
    struct Counter {
        last: AtomicU64,
        calls: AtomicUsize,
    }

    impl FrameObserver for Counter {
        fn frame_recorded(&self, _canvas: &Canvas, frame_index: u64) {
            self.last.store(frame_index, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn observers_see_every_recorded_frame() {
        let c = canvas();
        let counter = Arc::new(Counter::default());
        c.add_observer(counter.clone());
        for _ in 0..3 {
            let frame = record(&c, |_| {});
            c.store().complete_frame(frame.buffer);
        }
        assert_eq!(counter.calls.load(Ordering::SeqCst), 3);
        assert_eq!(counter.last.load(Ordering::SeqCst), 2);
    }
}
