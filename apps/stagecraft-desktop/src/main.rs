use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use stagecraft_assets::{AssetLoader, LoadEvent};
use stagecraft_common::Color;
use stagecraft_demo::{DemoScene, SceneConfig};
use stagecraft_input::{PointerButton, PointerTracker};
use stagecraft_render::{LabelPlacement, ShadowSettings, place_labels};
use stagecraft_render_wgpu::{RenderSettings, WgpuRenderer};
use stagecraft_scene::MeasureText;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "stagecraft-desktop", about = "Stagecraft demo scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory textures and models are loaded from
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// YAML file overriding the scene constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable multisampling
    #[arg(long)]
    no_msaa: bool,

    /// Disable shadow maps
    #[arg(long)]
    no_shadows: bool,
}

/// Pixels per wheel "line" for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 100.0;

/// Text measurement through egui's font atlas.
struct EguiMeasure<'a>(&'a EguiContext);

impl MeasureText for EguiMeasure<'_> {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let font = egui::FontId::proportional(font_size);
        self.0
            .fonts(|f| f.layout_no_wrap(text.to_owned(), font, egui::Color32::WHITE).size().x)
    }
}

/// Application state.
struct AppState {
    demo: DemoScene,
    loader: AssetLoader,
    pointer: PointerTracker,
    show_panel: bool,
}

impl AppState {
    fn new(config: &SceneConfig, assets: PathBuf) -> Self {
        let mut loader = AssetLoader::new(assets);
        let demo = stagecraft_demo::build(config, &mut loader);
        Self {
            demo,
            loader,
            pointer: PointerTracker::new(),
            show_panel: true,
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed && key == KeyCode::F1 {
            self.show_panel = !self.show_panel;
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, viewport: Vec2) {
        if self.show_panel {
            let DemoScene {
                panel,
                scene,
                camera,
                ..
            } = &mut self.demo;
            if panel.show(ctx, scene, camera) {
                tracing::trace!("panel value changed");
            }
        }

        let placements = place_labels(
            &self.demo.scene,
            &self.demo.camera,
            viewport,
            &EguiMeasure(ctx),
        );
        let fog = self.demo.scene.fog.map_or(Color::WHITE, |f| f.color);
        draw_labels(ctx, &placements, fog);
    }
}

/// Paint label plates under every egui window, farthest first.
fn draw_labels(ctx: &EguiContext, placements: &[LabelPlacement], fog: Color) {
    let painter = ctx.layer_painter(egui::LayerId::background());
    let ppp = ctx.pixels_per_point();
    for label in placements {
        let center = egui::pos2(label.center.x / ppp, label.center.y / ppp);
        let size = egui::vec2(label.size.x / ppp, label.size.y / ppp);
        let rect = egui::Rect::from_center_size(center, size);
        painter.rect_filled(rect, 0.0, fogged(label.background, fog, label.fog));
        // egui cannot squeeze glyphs horizontally, so narrow text by font size
        let font_px = label.font_px * label.text_scale / ppp;
        if font_px >= 1.0 {
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                &label.text,
                egui::FontId::proportional(font_px),
                fogged(label.text_color, fog, label.fog),
            );
        }
    }
}

fn fogged(color: Color, fog: Color, amount: f32) -> egui::Color32 {
    let t = amount.clamp(0.0, 1.0);
    let mixed = Color::rgb(
        color.r + (fog.r - color.r) * t,
        color.g + (fog.g - color.g) * t,
        color.b + (fog.b - color.b) * t,
    );
    let [r, g, b] = mixed.to_srgb8();
    egui::Color32::from_rgb(r, g, b)
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

struct GpuApp {
    state: AppState,
    settings: RenderSettings,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState, settings: RenderSettings) -> Self {
        Self {
            state,
            settings,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    /// Hand finished loads to the renderer (textures) and the demo (scene changes).
    fn drain_loads(&mut self) {
        let (Some(device), Some(queue), Some(renderer)) =
            (&self.device, &self.queue, &mut self.renderer)
        else {
            return;
        };
        for event in self.state.loader.poll() {
            if let LoadEvent::TextureLoaded { handle, data, .. } = &event {
                renderer.upload_texture(device, queue, *handle, data);
            }
            self.state.demo.on_load_event(event);
        }
    }

    fn redraw(&mut self) {
        self.drain_loads();

        let (Some(window), Some(surface), Some(device), Some(queue), Some(config)) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &mut self.config,
        ) else {
            return;
        };

        let display = window.inner_size();
        if display.width == 0 || display.height == 0 {
            return;
        }
        let mut buffer = (config.width, config.height);
        if self.state.demo.tick(&mut buffer, (display.width, display.height)) {
            config.width = buffer.0;
            config.height = buffer.1;
            surface.configure(device, config);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(device, config.width, config.height);
            }
            tracing::debug!(width = buffer.0, height = buffer.1, "drawing buffer resized");
        }

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(renderer) = &mut self.renderer {
            renderer.render(device, queue, &view, &self.state.demo.scene, &self.state.demo.camera);
        }

        let (Some(egui_winit), Some(egui_renderer)) = (&mut self.egui_winit, &mut self.egui_renderer)
        else {
            output.present();
            return;
        };

        let viewport = Vec2::new(config.width as f32, config.height as f32);
        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx, viewport);
        });
        self.state.pointer.set_captured(
            self.egui_ctx.wants_pointer_input() || self.egui_ctx.is_pointer_over_area(),
        );
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Stagecraft")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("stagecraft_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        self.state.demo.camera.aspect = config.width as f32 / config.height as f32;

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            self.settings,
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        let viewport_height = self.config.as_ref().map_or(1.0, |c| c.height as f32);
        let state = &mut self.state;
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                state.handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                if let Some(button) = pointer_button(button) {
                    state
                        .pointer
                        .button(button, btn_state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let action = state
                    .pointer
                    .moved(Vec2::new(position.x as f32, position.y as f32));
                state
                    .demo
                    .controls
                    .apply(action, &state.demo.camera, viewport_height);
            }
            WindowEvent::CursorLeft { .. } => {
                state.pointer.left();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                let action = state.pointer.scroll(lines);
                state
                    .demo
                    .controls
                    .apply(action, &state.demo.camera, viewport_height);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("stagecraft-desktop starting");

    let config = SceneConfig::load(cli.config.as_deref())?;
    let settings = RenderSettings {
        msaa_samples: if cli.no_msaa { 1 } else { 4 },
        shadows: ShadowSettings {
            enabled: !cli.no_shadows,
            ..ShadowSettings::default()
        },
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(&config, cli.assets), settings);
    event_loop.run_app(&mut app)?;

    Ok(())
}
