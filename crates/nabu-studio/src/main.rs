mod scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use nabu_engine::canvas::{Canvas, CanvasConfig, FrameObserver, FrameStats};
use nabu_engine::device::{CanvasSurface, GpuInit, RenderContext, RenderOutcome, SurfaceErrorAction};
use nabu_engine::logging::{init_logging, LoggingConfig};
use nabu_engine::render::RenderExecutor;
use nabu_engine::text::{create_font, Charset, FontHandle};

use scene::Scene;

const TITLE: &str = "nabu studio";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let font_path = std::env::args_os().nth(1).map(PathBuf::from);
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut studio = Studio::new(font_path);

    event_loop
        .run_app(&mut studio)
        .context("winit event loop terminated with error")?;

    studio.shutdown();
    Ok(())
}

/// Logs replay timings every few hundred frames.
struct FrameLog {
    every: u64,
}

impl FrameObserver for FrameLog {
    fn frame_rendered(&self, _canvas: &Canvas, frame_index: u64, stats: &FrameStats) {
        if frame_index % self.every == 0 {
            log::info!(
                "frame {frame_index}: {} commands ({} skipped), {} triangles, {} draw calls, replay {:?}",
                stats.commands,
                stats.skipped,
                stats.triangles,
                stats.draw_calls,
                stats.replay_time
            );
        }
    }
}

struct Running {
    window: Arc<Window>,
    ctx: Arc<RenderContext>,
    surface: CanvasSurface,
    canvas: Canvas,
    executor: RenderExecutor,
    producer: Option<JoinHandle<()>>,
}

struct Studio {
    font_path: Option<PathBuf>,
    stop: Arc<AtomicBool>,
    running: Option<Running>,
}

impl Studio {
    fn new(font_path: Option<PathBuf>) -> Self {
        Self { font_path, stop: Arc::new(AtomicBool::new(false)), running: None }
    }

    fn load_font(&self) -> Option<FontHandle> {
        let path = self.font_path.as_ref()?;
        let charset = Charset::Only((' '..='~').collect());
        match create_font(path, None, 16.0, 96.0, &charset) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("{e}; drawing without text");
                None
            }
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(960.0, 640.0));
        let window = Arc::new(event_loop.create_window(attrs).context("failed to create window")?);

        let size = window.inner_size();
        let (ctx, mut surface) = RenderContext::open_with_surface(
            GpuInit::default(),
            Arc::clone(&window),
            (size.width, size.height),
        )?;
        surface.set_scale_factor(window.scale_factor() as f32);

        let canvas = Canvas::new(CanvasConfig::default());
        canvas.add_observer(Arc::new(FrameLog { every: 300 }));

        let scene = Scene::new(self.load_font())?;
        let producer = spawn_producer(canvas.clone(), Arc::clone(&window), Arc::clone(&self.stop), scene)?;

        self.running = Some(Running {
            window,
            ctx,
            surface,
            canvas,
            executor: RenderExecutor::new(),
            producer: Some(producer),
        });
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(mut running) = self.running.take() else { return; };

        // Discard any pending frame so a producer blocked in reset() can
        // observe the stop flag.
        let store = running.canvas.store();
        if let Some(frame) = store.take_frame() {
            store.complete_frame(frame.buffer);
        }
        if let Some(handle) = running.producer.take() {
            if handle.join().is_err() {
                log::error!("producer thread panicked");
            }
        }
    }
}

fn spawn_producer(canvas: Canvas, window: Arc<Window>, stop: Arc<AtomicBool>, mut scene: Scene) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("nabu-producer".into())
        .spawn(move || {
            let start = Instant::now();
            while !stop.load(Ordering::Relaxed) {
                if !canvas.reset() {
                    log::error!("canvas already recording");
                    return;
                }
                if stop.load(Ordering::Relaxed) {
                    if let Err(e) = canvas.done() {
                        log::error!("{e}");
                    }
                    return;
                }

                let size = window.inner_size().to_logical::<f32>(window.scale_factor());
                if let Err(e) = scene.record(&canvas, start.elapsed().as_secs_f32(), size.width, size.height) {
                    log::warn!("scene recording stopped early: {e}");
                }
                if let Err(e) = canvas.done() {
                    log::error!("{e}");
                    return;
                }
                window.request_redraw();
            }
        })
        .context("failed to spawn producer thread")
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("failed to start: {e:#}");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else { return; };
        if running.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.ctx.resize(&mut running.surface, size.width, size.height);
                running.window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                running.surface.set_scale_factor(scale_factor as f32);
            }
            WindowEvent::RedrawRequested => {
                match running.ctx.render(&running.canvas, &mut running.executor, &running.surface) {
                    RenderOutcome::Rendered(_) | RenderOutcome::Idle | RenderOutcome::Discarded => {}
                    RenderOutcome::SurfaceError(SurfaceErrorAction::Fatal) => {
                        log::error!("surface lost for good; exiting");
                        event_loop.exit();
                    }
                    RenderOutcome::SurfaceError(_) => running.window.request_redraw(),
                }
            }
            _ => {}
        }
    }
}
