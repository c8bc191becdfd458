//! The animated demo frame.

use std::f32::consts::TAU;

use anyhow::Result;
use image::{Rgba, RgbaImage};

use nabu_engine::canvas::{Canvas, CanvasError};
use nabu_engine::coords::{Affine, Rect, Vec2};
use nabu_engine::paint::{
    Color, Gradient, GradientHandle, GradientStop, ImageFilter, ImageOptions, ImageTexture, ImageTextureHandle,
    ImageTiling, LineCap, LineJoin, Margins, Stroke, StrokeHandle,
};
use nabu_engine::text::FontHandle;

/// Resources are built once; only transforms and dash phases animate.
pub struct Scene {
    font: Option<FontHandle>,
    sky: GradientHandle,
    glow: GradientHandle,
    checker: ImageTextureHandle,
    frame: ImageTextureHandle,
    outline: StrokeHandle,
    rim: StrokeHandle,
}

impl Scene {
    pub fn new(font: Option<FontHandle>) -> Result<Self> {
        let sky = Gradient::new(
            vec![
                GradientStop::new(Color::from_rgb_hex(0x1d2b53), 0.0),
                GradientStop::new(Color::from_rgb_hex(0x7e2553), 0.6).with_midpoint(0.35),
                GradientStop::new(Color::from_rgb_hex(0xff77a8), 1.0),
            ],
            0.0,
            TAU / 4.0,
            0.0,
            0.0,
        )?;
        let glow = Gradient::new(
            vec![
                GradientStop::new(Color::from_rgb_hex(0xffec27), 0.0),
                GradientStop::new(Color::from_straight(1.0, 0.6, 0.1, 0.0), 1.0),
            ],
            0.5,
            0.0,
            0.5,
            0.5,
        )?;

        let checker = ImageTexture::new(
            RgbaImage::from_fn(8, 8, |x, y| {
                if (x + y) % 2 == 0 { Rgba([240, 240, 240, 255]) } else { Rgba([40, 40, 48, 255]) }
            }),
            ImageOptions {
                filter: ImageFilter::Nearest,
                tiling: ImageTiling::Repeat,
                u_scale: 4.0,
                v_scale: 4.0,
                ..ImageOptions::default()
            },
        )?;

        // Bordered panel for nine-slice scaling: 4 px dark rim around a light body.
        let frame = ImageTexture::new(
            RgbaImage::from_fn(16, 16, |x, y| {
                if x < 4 || y < 4 || x >= 12 || y >= 12 { Rgba([30, 30, 60, 255]) } else { Rgba([200, 210, 255, 230]) }
            }),
            ImageOptions { margins: Margins::uniform(4), ..ImageOptions::default() },
        )?;

        let outline = Stroke::builder().width(3.0).join(LineJoin::Round).cap(LineCap::Round).build()?;
        let rim = Stroke::builder().width(2.0).dash(vec![12.0, 6.0], 0.0).build()?;

        Ok(Self { font, sky, glow, checker, frame, outline, rim })
    }

    /// Records one frame at time `t` seconds into a `width`×`height` logical area.
    pub fn record(&mut self, canvas: &Canvas, t: f32, width: f32, height: f32) -> Result<(), CanvasError> {
        canvas.set_gradient(Some(self.sky.clone()))?;
        canvas.fill_rect(0.0, 0.0, width, height)?;
        canvas.set_gradient(None)?;

        // Sun with a radial glow.
        let sun = Vec2::new(width * 0.75, height * 0.3);
        canvas.set_gradient(Some(self.glow.clone()))?;
        canvas.fill_oval(sun.x - 90.0, sun.y - 90.0, 180.0, 180.0)?;
        canvas.set_gradient(None)?;

        // Spinning dashed square.
        let phase = (t * 24.0) % 18.0;
        if let Ok(rim) = Stroke::builder().width(2.0).dash(vec![12.0, 6.0], phase).build() {
            self.rim = rim;
        }
        canvas.set_stroke(self.rim.clone())?;
        canvas.set_color(Color::WHITE)?;
        canvas.set_transform(Affine::translation(width * 0.25, height * 0.4).then(Affine::rotation(t * 0.8)))?;
        canvas.draw_rect(-60.0, -60.0, 120.0, 120.0)?;
        canvas.set_stroke(self.outline.clone())?;
        canvas.draw_arc(-40.0, -40.0, 80.0, 80.0, 0.0, (t * 90.0) % 360.0)?;
        canvas.set_transform(Affine::IDENTITY)?;

        // Star polygon filled with the checkerboard.
        let star = star_points(Vec2::new(width * 0.5, height * 0.7), 70.0, 30.0, 5, t * 0.3);
        canvas.set_image_texture(Some(self.checker.clone()))?;
        canvas.fill_polygon(&star)?;
        canvas.set_image_texture(None)?;
        canvas.set_color(Color::from_rgb_hex(0x29adff))?;
        canvas.draw_polygon(&star)?;

        // Nine-slice panel and a nearest-filtered thumbnail.
        let panel = Rect::new(width - 260.0, height - 110.0, 240.0, 90.0);
        canvas.draw_image_scaled(&self.frame, panel, false)?;
        canvas.draw_image_region(
            &self.checker,
            Rect::new(panel.origin.x + 12.0, panel.origin.y + 12.0, 66.0, 66.0),
            Rect::new(0.0, 0.0, 4.0, 4.0),
            false,
        )?;

        if let Some(font) = &self.font {
            canvas.set_font(font.clone())?;
            let label = format!("nabu  t={t:.1}s");
            let size = canvas.measure_string(&label);
            canvas.set_color(Color::BLACK)?;
            canvas.draw_string(&label, panel.origin.x + 88.0, panel.origin.y + 45.0 + size.y * 0.5)?;
        }

        canvas.set_color(Color::WHITE)?;
        canvas.draw_line(0.0, height * 0.55, width, height * 0.55)?;

        // Clipped bars; the clip lasts until the next frame.
        canvas.clip_rect(20.0, height - 120.0, width * 0.3, 100.0)?;
        for i in 0..8 {
            let h = 40.0 + 50.0 * (t * 2.0 + i as f32 * 0.7).sin().abs();
            canvas.set_color(Color::from_straight(0.2 + i as f32 * 0.1, 0.9, 0.5, 0.85))?;
            canvas.fill_round_rect(30.0 + i as f32 * 30.0, height - 20.0 - h, 22.0, h + 10.0, 8.0, 8.0)?;
        }

        Ok(())
    }
}

fn star_points(center: Vec2, outer: f32, inner: f32, spikes: usize, spin: f32) -> Vec<Vec2> {
    (0..spikes * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let a = spin + i as f32 * TAU / (spikes * 2) as f32;
            Vec2::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect()
}
