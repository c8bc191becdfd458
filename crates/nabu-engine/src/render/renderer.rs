use std::collections::HashSet;

use wgpu::util::DeviceExt;

use crate::device::{GpuError, GpuErrorCode};

use super::common::{BlendMode, ViewportUniform, logical_clip_to_scissor};
use super::replay::{FrameGeometry, TextureId};
use super::textures::TextureCache;
use super::vertex::CanvasVertex;
use super::{RenderCtx, RenderTarget};

const SHADER_SOURCE: &str = include_str!("shaders/canvas.wgsl");

/// Parses and validates WGSL so a broken shader surfaces as an error instead
/// of a device-lost abort inside `create_shader_module`.
pub(super) fn validate_wgsl(source: &str) -> Result<(), GpuError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| GpuError::new(GpuErrorCode::ShaderCompile, e.emit_to_string(source)))?;
    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::default())
        .validate(&module)
        .map_err(|e| GpuError::new(GpuErrorCode::ShaderCompile, e.emit_to_string(source)))?;
    Ok(())
}

/// What a [`CanvasRenderer::draw`] call issued.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DrawReport {
    pub draw_calls: usize,
    /// Batches dropped because their texture could not be created.
    pub skipped_batches: usize,
}

struct Pipelines {
    over: wgpu::RenderPipeline,
    replace: wgpu::RenderPipeline,
}

impl Pipelines {
    fn get(&self, blend: BlendMode) -> &wgpu::RenderPipeline {
        match blend {
            BlendMode::Over => &self.over,
            BlendMode::Replace => &self.replace,
        }
    }
}

/// Draws replayed [`FrameGeometry`] in one render pass.
///
/// GPU objects are created lazily; pipelines are rebuilt when the surface
/// format changes, vertex/index buffers grow to the next power of two.
#[derive(Default)]
pub struct CanvasRenderer {
    // pipeline
    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: Option<Pipelines>,
    viewport_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,

    // bindings
    viewport_ubo: Option<wgpu::Buffer>,
    viewport_bind_group: Option<wgpu::BindGroup>,

    // geometry
    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: usize,

    textures: TextureCache,
}

impl CanvasRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        geo: &FrameGeometry,
    ) -> Result<DrawReport, GpuError> {
        self.ensure_layouts(ctx);
        self.ensure_pipeline(ctx)?;
        self.ensure_viewport_bindings(ctx);
        self.write_viewport_uniform(ctx);

        // ── textures ───────────────────────────────────────────────────────
        let mut report = DrawReport::default();
        let mut failed: HashSet<TextureId> = HashSet::new();
        self.textures.begin_frame();
        if let Some(layout) = self.texture_layout.as_ref() {
            for batch in &geo.batches {
                let id = batch.texture.id();
                if failed.contains(&id) {
                    continue;
                }
                if let Err(e) = self.textures.prepare(ctx, layout, &batch.texture) {
                    log::error!("{id:?}: {e}");
                    failed.insert(id);
                }
            }
        }

        // ── geometry upload ────────────────────────────────────────────────
        if !geo.indices.is_empty() {
            self.ensure_capacity(ctx, geo.vertices.len(), geo.indices.len())?;
            if let (Some(vbo), Some(ibo)) = (self.vbo.as_ref(), self.ibo.as_ref()) {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&geo.vertices));
                ctx.queue.write_buffer(ibo, 0, bytemuck::cast_slice(&geo.indices));
            }
        }

        // ── pass ───────────────────────────────────────────────────────────
        let load = match geo.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("nabu canvas pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if geo.indices.is_empty() {
            return Ok(report);
        }

        let Some(pipelines) = self.pipelines.as_ref() else { return Ok(report); };
        let Some(viewport_bg) = self.viewport_bind_group.as_ref() else { return Ok(report); };
        let Some(vbo) = self.vbo.as_ref() else { return Ok(report); };
        let Some(ibo) = self.ibo.as_ref() else { return Ok(report); };

        rpass.set_bind_group(0, viewport_bg, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);

        let mut bound: Option<(BlendMode, TextureId)> = None;
        for batch in &geo.batches {
            let id = batch.texture.id();
            let Some(texture_bg) = self.textures.bind_group(id) else {
                report.skipped_batches += 1;
                continue;
            };
            let Some((x, y, w, h)) = logical_clip_to_scissor(batch.clip, ctx.viewport, ctx.scale_factor) else {
                continue;
            };

            if bound.map(|(b, _)| b) != Some(batch.blend) {
                rpass.set_pipeline(pipelines.get(batch.blend));
            }
            if bound.map(|(_, t)| t) != Some(id) {
                rpass.set_bind_group(1, texture_bg, &[]);
            }
            bound = Some((batch.blend, id));

            rpass.set_scissor_rect(x, y, w, h);
            rpass.draw_indexed(batch.indices.clone(), 0, 0..1);
            report.draw_calls += 1;
        }

        Ok(report)
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_layout.is_none() {
            self.viewport_layout = Some(ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("nabu viewport bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: ViewportUniform::binding_size(),
                    },
                    count: None,
                }],
            }));
        }

        if self.texture_layout.is_none() {
            self.texture_layout = Some(ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("nabu paint bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            }));
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) -> Result<(), GpuError> {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipelines.is_some() {
            return Ok(());
        }
        let (Some(viewport_layout), Some(texture_layout)) = (self.viewport_layout.as_ref(), self.texture_layout.as_ref())
        else {
            return Err(GpuError::new(GpuErrorCode::ShaderCompile, "bind group layouts missing"));
        };

        validate_wgsl(SHADER_SOURCE)?;
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("nabu canvas shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("nabu canvas pipeline layout"),
            bind_group_layouts: &[viewport_layout, texture_layout],
            immediate_size: 0,
        });

        let build = |blend: BlendMode, label: &'static str| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[CanvasVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(blend.state()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        self.pipelines = Some(Pipelines {
            over: build(BlendMode::Over, "nabu canvas pipeline (over)"),
            replace: build(BlendMode::Replace, "nabu canvas pipeline (replace)"),
        });
        self.pipeline_format = Some(ctx.surface_format);
        log::debug!("canvas pipelines built for {:?}", ctx.surface_format);
        Ok(())
    }

    fn ensure_viewport_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_bind_group.is_some() && self.viewport_ubo.is_some() {
            return;
        }
        let Some(layout) = self.viewport_layout.as_ref() else { return; };

        let ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nabu viewport ubo"),
            contents: bytemuck::bytes_of(&ViewportUniform::new(ctx.viewport)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu viewport bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }],
        });

        self.viewport_ubo = Some(ubo);
        self.viewport_bind_group = Some(bind_group);
    }

    fn write_viewport_uniform(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return; };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&ViewportUniform::new(ctx.viewport)));
    }

    fn ensure_capacity(&mut self, ctx: &RenderCtx<'_>, vertices: usize, indices: usize) -> Result<(), GpuError> {
        let max = ctx.device.limits().max_buffer_size;
        let vbo_grow = vertices > self.vbo_capacity || self.vbo.is_none();
        let ibo_grow = indices > self.ibo_capacity || self.ibo.is_none();
        // Size both before creating either so a rejected frame leaves the old buffers intact.
        let vbo_size = if vbo_grow { Some(buffer_capacity(vertices, std::mem::size_of::<CanvasVertex>(), max)?) } else { None };
        let ibo_size = if ibo_grow { Some(buffer_capacity(indices, std::mem::size_of::<u32>(), max)?) } else { None };

        if let Some((cap, bytes)) = vbo_size {
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("nabu canvas vbo"),
                size: bytes,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_capacity = cap;
        }
        if let Some((cap, bytes)) = ibo_size {
            self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("nabu canvas ibo"),
                size: bytes,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.ibo_capacity = cap;
        }
        Ok(())
    }
}

/// Element capacity and byte size for a buffer holding `count` elements.
///
/// Grows to the next power of two (at least 64), falls back to the exact
/// count when that would pass `max_bytes`, and fails with
/// [`GpuErrorCode::OutOfMemory`] when even the exact count does not fit.
fn buffer_capacity(count: usize, elem_size: usize, max_bytes: u64) -> Result<(usize, u64), GpuError> {
    let bytes = |n: usize| (n as u64).checked_mul(elem_size as u64).filter(|b| *b <= max_bytes);
    let grown = count.checked_next_power_of_two().map(|n| n.max(64));
    if let Some((n, b)) = grown.and_then(|n| Some((n, bytes(n)?))) {
        return Ok((n, b));
    }
    match bytes(count) {
        Some(b) => Ok((count, b)),
        None => Err(GpuError::new(
            GpuErrorCode::OutOfMemory,
            format!("{count} elements of {elem_size} B exceed the {max_bytes} B buffer limit"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_shader_validates() {
        validate_wgsl(SHADER_SOURCE).unwrap();
    }

    #[test]
    fn buffers_grow_to_a_power_of_two() {
        assert_eq!(buffer_capacity(10, 4, 1 << 20).unwrap(), (64, 256));
        assert_eq!(buffer_capacity(100, 48, 1 << 20).unwrap(), (128, 128 * 48));
    }

    #[test]
    fn growth_falls_back_to_exact_size_at_the_limit() {
        // 5000 vertices fit exactly; 8192 would not.
        let limit = 5000 * 48;
        assert_eq!(buffer_capacity(5000, 48, limit).unwrap(), (5000, limit));
    }

    #[test]
    fn oversized_geometry_is_out_of_memory() {
        let limit = 256 << 20;
        let err = buffer_capacity(6_000_000, std::mem::size_of::<CanvasVertex>(), limit).unwrap_err();
        assert_eq!(err.code, GpuErrorCode::OutOfMemory);
        assert_eq!(buffer_capacity(usize::MAX, 4, u64::MAX).unwrap_err().code, GpuErrorCode::OutOfMemory);
    }

    #[test]
    fn broken_shader_is_a_compile_error() {
        let err = validate_wgsl("@fragment fn fs_main() -> @location(0) vec4<f32> { return 1; }").unwrap_err();
        assert_eq!(err.code, GpuErrorCode::ShaderCompile);
        assert!(!err.detail.is_empty());
    }
}
