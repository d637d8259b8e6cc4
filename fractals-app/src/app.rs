use std::sync::mpsc::{self, Receiver};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use eframe::egui;
use tracing::{error, info, warn};

use fractals_core::FractalKind;
use fractals_engine::{EngineSettings, GamepadConnection, RenderScheduler, WorkerStat};
use fractals_render::{export_png, FrameBuffer, SnapshotMetadata};

use crate::gamepad::GilrsGamepad;
use crate::preferences::AppPreferences;

pub(crate) const HUD_MARGIN: f32 = 8.0;
pub(crate) const HUD_CORNER_RADIUS: f32 = 6.0;

// ---------------------------------------------------------------------------
// Engine events
// ---------------------------------------------------------------------------

/// Receivers for the scheduler's observer lists, drained once per frame.
struct EngineEvents {
    fetching: Receiver<bool>,
    initial_render: Receiver<()>,
    stats: Receiver<Vec<WorkerStat>>,
    gamepad: Receiver<GamepadConnection>,
}

impl EngineEvents {
    fn subscribe(scheduler: &mut RenderScheduler) -> Self {
        let (fetching_tx, fetching) = mpsc::channel();
        scheduler.on_fetching_changed(move |v| {
            let _ = fetching_tx.send(*v);
        });
        let (initial_tx, initial_render) = mpsc::channel();
        scheduler.on_initial_render(move |_| {
            let _ = initial_tx.send(());
        });
        let (stats_tx, stats) = mpsc::channel();
        scheduler.on_stats(move |s| {
            let _ = stats_tx.send(s.to_vec());
        });
        let (gamepad_tx, gamepad) = mpsc::channel();
        scheduler.on_gamepad_connection(move |c| {
            let _ = gamepad_tx.send(c.clone());
        });
        Self {
            fetching,
            initial_render,
            stats,
            gamepad,
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub(crate) struct FractalsApp {
    pub(crate) scheduler: RenderScheduler,
    frame: FrameBuffer,
    texture: Option<egui::TextureHandle>,
    uploaded_revision: u64,
    /// Canvas size the scheduler was last resized to, in points.
    surface: [u32; 2],
    events: EngineEvents,

    pub(crate) fetching: bool,
    pub(crate) initial_rendered: bool,
    pub(crate) worker_stats: Vec<WorkerStat>,
    pub(crate) gamepad_status: Option<GamepadConnection>,
    pub(crate) status_message: Option<String>,

    pub(crate) show_hud: bool,
    pub(crate) show_settings: bool,
}

impl FractalsApp {
    pub(crate) fn new(prefs: AppPreferences) -> fractals_engine::Result<Self> {
        let width = prefs.window_width.max(1.0) as u32;
        let height = prefs.window_height.max(1.0) as u32;

        let mut scheduler = match RenderScheduler::new(prefs.engine, width, height) {
            Ok(s) => s,
            Err(e) => {
                warn!("Engine settings rejected ({e}), using defaults");
                RenderScheduler::new(EngineSettings::default(), width, height)?
            }
        };
        if let Some(pad) = GilrsGamepad::new() {
            scheduler = scheduler.with_gamepad(Box::new(pad));
        }
        let events = EngineEvents::subscribe(&mut scheduler);
        let res = scheduler.resolution();
        let worker_stats = scheduler.stats().to_vec();

        Ok(Self {
            frame: FrameBuffer::new(res.width, res.height),
            texture: None,
            uploaded_revision: 0,
            surface: [width, height],
            events,
            fetching: true,
            initial_rendered: false,
            worker_stats,
            gamepad_status: None,
            status_message: None,
            show_hud: true,
            show_settings: false,
            scheduler,
        })
    }

    fn drain_events(&mut self) {
        for fetching in self.events.fetching.try_iter() {
            self.fetching = fetching;
        }
        if self.events.initial_render.try_iter().count() > 0 {
            self.initial_rendered = true;
        }
        if let Some(stats) = self.events.stats.try_iter().last() {
            self.worker_stats = stats;
        }
        if let Some(connection) = self.events.gamepad.try_iter().last() {
            self.gamepad_status = Some(connection);
        }
    }

    fn check_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || [width, height] == self.surface {
            return;
        }
        self.surface = [width, height];
        match self.scheduler.resize(width, height) {
            Ok(()) => {
                let res = self.scheduler.resolution();
                self.frame.resize(res.width, res.height);
            }
            Err(e) => warn!("Canvas resize not applied: {e}"),
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() && self.frame.revision() == self.uploaded_revision {
            return;
        }
        let size = [self.frame.width() as usize, self.frame.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, self.frame.pixels());
        match self.texture.as_mut() {
            Some(tex) => tex.set(image, egui::TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("fractal", image, egui::TextureOptions::NEAREST))
            }
        }
        self.uploaded_revision = self.frame.revision();
    }

    /// Write the current frame to the images directory.
    pub(crate) fn export_snapshot(&mut self) {
        let dir = crate::app_dir::images_directory();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            error!("Failed to create {}: {e}", dir.display());
            self.status_message = Some(format!("Export failed: {e}"));
            return;
        }
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = dir.join(format!("fractal_{stamp}.png"));

        let fractal = self.scheduler.fractal();
        let metadata = SnapshotMetadata {
            kind: fractal.kind,
            plane: self.scheduler.viewport().plane(),
            julia_seed: (fractal.kind == FractalKind::Julia).then_some(fractal.julia_seed),
            max_iterations: self.scheduler.max_iterations(),
            smooth: self.scheduler.color().smooth_full_res(),
        };
        match export_png(&self.frame, &path, &metadata) {
            Ok(()) => {
                info!("Exported snapshot to {}", path.display());
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("Snapshot export failed: {e}");
                self.status_message = Some(format!("Export failed: {e}"));
            }
        }
    }

    fn draw_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let available = ui.available_size();
                self.check_resize(available.x.max(1.0) as u32, available.y.max(1.0) as u32);

                let (response, painter) =
                    ui.allocate_painter(available, egui::Sense::click_and_drag());

                // The frame is at least as large as the canvas; the excess
                // is clipped on the right and bottom.
                if let Some(tex) = &self.texture {
                    let size = egui::vec2(self.frame.width() as f32, self.frame.height() as f32);
                    let rect = egui::Rect::from_min_size(response.rect.min, size);
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
                }

                self.handle_canvas_input(ctx, &response);
            });
    }
}

impl eframe::App for FractalsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.scheduler.tick(Instant::now(), &mut self.frame);
        self.drain_events();
        self.upload_texture(ctx);

        self.draw_canvas(ctx);
        self.handle_keyboard(ctx);
        self.show_hud(ctx);
        self.show_settings_panel(ctx);

        ctx.request_repaint_after(self.scheduler.settings().tick_interval());
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.scheduler.shutdown();
        info!("Render workers stopped on exit");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub(crate) fn run() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Fractals");

    let prefs = AppPreferences::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Fractals")
            .with_inner_size([prefs.window_width, prefs.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        "Fractals",
        options,
        Box::new(move |_cc| Ok(Box::new(FractalsApp::new(prefs)?))),
    )
}
