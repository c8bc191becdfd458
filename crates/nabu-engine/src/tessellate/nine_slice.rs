use crate::coords::{Rect, Vec2};
use crate::paint::Margins;

use super::Mesh;

/// Textured quad covering `dst`, sampling `src_uv` of the texture.
pub fn image_quad(dst: Rect, src_uv: Rect) -> Mesh {
    let mut mesh = Mesh::new();
    push_quad(&mut mesh, dst, src_uv);
    mesh
}

fn push_quad(mesh: &mut Mesh, dst: Rect, uv: Rect) {
    let (p0, p1) = (dst.min(), dst.max());
    let (t0, t1) = (uv.min(), uv.max());
    let a = mesh.vertex_uv(p0, t0);
    let b = mesh.vertex_uv(Vec2::new(p1.x, p0.y), Vec2::new(t1.x, t0.y));
    let c = mesh.vertex_uv(p1, t1);
    let d = mesh.vertex_uv(Vec2::new(p0.x, p1.y), Vec2::new(t0.x, t1.y));
    mesh.quad(a, b, c, d);
}

/// Splits `dst` into up to nine quads so the `margins` (source pixels of an
/// `image_w × image_h` texture) are drawn unstretched and only the middle
/// scales. Margins shrink proportionally when `dst` is too small for them.
pub fn nine_slice(dst: Rect, image_w: u32, image_h: u32, margins: Margins) -> Mesh {
    let dst = dst.normalized();
    let (iw, ih) = (image_w.max(1) as f32, image_h.max(1) as f32);

    let fit = |a: u32, b: u32, avail: f32| {
        let (a, b) = (a as f32, b as f32);
        if a + b > avail && a + b > 0.0 {
            let k = avail / (a + b);
            (a * k, b * k)
        } else {
            (a, b)
        }
    };
    let (ml, mr) = fit(margins.left, margins.right, dst.size.x);
    let (mt, mb) = fit(margins.top, margins.bottom, dst.size.y);

    let (x0, y0) = (dst.origin.x, dst.origin.y);
    let (x1, y1) = (dst.max().x, dst.max().y);
    let xs = [x0, x0 + ml, x1 - mr, x1];
    let ys = [y0, y0 + mt, y1 - mb, y1];
    let us = [0.0, margins.left as f32 / iw, 1.0 - margins.right as f32 / iw, 1.0];
    let vs = [0.0, margins.top as f32 / ih, 1.0 - margins.bottom as f32 / ih, 1.0];

    let mut mesh = Mesh::new();
    for row in 0..3 {
        for col in 0..3 {
            if xs[col + 1] <= xs[col] || ys[row + 1] <= ys[row] {
                continue;
            }
            push_quad(
                &mut mesh,
                Rect::from_min_max(Vec2::new(xs[col], ys[row]), Vec2::new(xs[col + 1], ys[row + 1])),
                Rect::from_min_max(Vec2::new(us[col], vs[row]), Vec2::new(us[col + 1], vs[row + 1])),
            );
        }
    }
    mesh
}
