use std::time::Instant;

use tracing::{debug, info, trace, warn};

use fractals_core::{
    band_requests, clamp_max_iterations, ColorConfig, ColorMode, Complex, FractalConfig,
    FractalKind, Resolution, ViewportTransform,
};
use fractals_render::{EscapeTimeKernel, FrameSink, TileKernel, WorkerPool};

use crate::events::{Observers, SubscriptionId};
use crate::input::{GamepadConnection, GamepadSource, InputAdapter};
use crate::progress::ProgressTracker;
use crate::settings::EngineSettings;
use crate::stats::{StatsAggregator, WorkerStat};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where the scheduler is in the preview / full-resolution cycle.
///
/// `PreviewDispatched` and `FullResDispatched` are passed through within a
/// single tick and are never observed between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Dirty,
    PreviewDispatched,
    FullResArmed,
    FullResDispatched,
}

/// Number of passes dispatched since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchCounts {
    pub previews: u64,
    pub full_res: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives progressive rendering from a single thread.
///
/// Call [`tick`](Self::tick) every `tick_interval`. Every change to the view,
/// the fractal, or the palette marks the frame dirty. A dirty frame gets a
/// downsampled preview as soon as the pool allows it, and a full-resolution
/// pass once no change has happened for `full_res_delay`.
///
/// Finished tiles are handed to the caller's [`FrameSink`] as they arrive.
pub struct RenderScheduler {
    settings: EngineSettings,
    viewport: ViewportTransform,
    input: InputAdapter,
    pool: WorkerPool,
    stats: StatsAggregator,
    progress: ProgressTracker,
    fractal: FractalConfig,
    color: ColorConfig,
    max_iterations: u32,
    state: RenderState,
    full_res_deadline: Option<Instant>,
    counts: DispatchCounts,
    stopped: bool,
    stats_listeners: Observers<[WorkerStat]>,
    gamepad_listeners: Observers<GamepadConnection>,
}

impl RenderScheduler {
    /// Build a scheduler with the escape-time kernel on every worker.
    pub fn new(
        settings: EngineSettings,
        surface_width: u32,
        surface_height: u32,
    ) -> crate::Result<Self> {
        Self::with_kernel(settings, surface_width, surface_height, |_| EscapeTimeKernel)
    }

    /// Build a scheduler whose workers run kernels made by `factory`.
    pub fn with_kernel<K, F>(
        settings: EngineSettings,
        surface_width: u32,
        surface_height: u32,
        factory: F,
    ) -> crate::Result<Self>
    where
        K: TileKernel + Send + 'static,
        F: FnMut(usize) -> K,
    {
        let tiling = settings.tiling()?;
        let viewport =
            ViewportTransform::new(surface_width, surface_height, tiling, settings.navigation)?;
        let pool = WorkerPool::new(tiling.workers as usize, factory)?;
        let resolution = viewport.resolution();

        info!(
            workers = tiling.workers,
            scaling = tiling.scaling,
            width = resolution.width,
            height = resolution.height,
            "Render scheduler ready"
        );

        Ok(Self {
            stats: StatsAggregator::new(pool.worker_count(), settings.stats_interval()),
            progress: ProgressTracker::new(settings.idle_delay()),
            input: InputAdapter::new(settings.gamepad),
            max_iterations: clamp_max_iterations(settings.max_iterations),
            fractal: FractalConfig::default(),
            color: ColorConfig::default(),
            state: RenderState::Dirty,
            full_res_deadline: None,
            counts: DispatchCounts::default(),
            stopped: false,
            stats_listeners: Observers::new(),
            gamepad_listeners: Observers::new(),
            settings,
            viewport,
            pool,
        })
    }

    /// Follow a gamepad backend, polled once per tick.
    pub fn with_gamepad(mut self, source: Box<dyn GamepadSource>) -> Self {
        self.input = InputAdapter::new(self.settings.gamepad).with_gamepad(source);
        self
    }

    // -- driver ---------------------------------------------------------------

    /// Advance the scheduler to `now`.
    pub fn tick<S: FrameSink + ?Sized>(&mut self, now: Instant, sink: &mut S) {
        if self.stopped {
            return;
        }
        self.pump(now, sink);

        for connection in self.input.poll_gamepad(&mut self.viewport) {
            self.gamepad_listeners.emit(&connection);
        }

        let full_res_pending = self.full_res_deadline.is_some();
        if self.viewport.take_dirty() {
            self.transition(RenderState::Dirty);
            self.full_res_deadline = Some(now + self.settings.full_res_delay());
            trace!("Full-resolution pass rearmed");
        }

        if self.state == RenderState::Dirty && (!full_res_pending || !self.pool.is_occupied()) {
            self.dispatch(false, now);
            self.transition(RenderState::PreviewDispatched);
            self.full_res_deadline = Some(now + self.settings.full_res_delay());
            self.transition(RenderState::FullResArmed);
        } else if self.full_res_deadline.is_some_and(|at| now >= at) {
            self.full_res_deadline = None;
            self.dispatch(true, now);
            self.transition(RenderState::FullResDispatched);
            self.transition(RenderState::Idle);
        }

        self.progress.poll(now);
    }

    /// Hand every reply received so far to `sink` and update stats and
    /// progress. Called by [`tick`](Self::tick).
    pub fn pump<S: FrameSink + ?Sized>(&mut self, now: Instant, sink: &mut S) {
        if self.stopped {
            return;
        }
        while let Some(result) = self.pool.try_recv() {
            trace!(
                worker_id = result.worker_id,
                tile_index = result.tile_index,
                full_res = result.full_res,
                elapsed_ms = result.elapsed_ms(),
                "Tile received"
            );
            if !self.pool.is_occupied() {
                self.progress.set_fetching(false, now);
            }
            sink.write_tile(&result);
            if self.stats.record(&result, now) {
                self.stats_listeners.emit(self.stats.stats());
            }
        }
    }

    fn dispatch(&mut self, full_res: bool, now: Instant) {
        let setup = self.viewport.setup();
        let requests = band_requests(
            &setup,
            self.max_iterations,
            self.fractal,
            &self.color,
            full_res,
        );
        debug!(
            full_res,
            tiles = requests.len(),
            width = setup.resolution.width,
            height = setup.resolution.height,
            max_iterations = self.max_iterations,
            "Dispatching pass"
        );
        self.progress.set_fetching(true, now);
        self.pool.dispatch(requests);
        if full_res {
            self.counts.full_res += 1;
        } else {
            self.counts.previews += 1;
        }
    }

    fn transition(&mut self, to: RenderState) {
        if self.state != to {
            trace!(from = ?self.state, to = ?to, "Render state");
            self.state = to;
        }
    }

    /// Stop the workers and release the gamepad. Idempotent; later ticks and
    /// pumps do nothing.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.full_res_deadline = None;
        self.input.release_gamepad();
        self.pool.shutdown();
        info!("Render scheduler stopped");
    }

    // -- input ----------------------------------------------------------------

    pub fn pointer_pressed(&mut self) {
        self.input.pointer_pressed();
    }

    pub fn pointer_released(&mut self) {
        self.input.pointer_released();
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    pub fn pointer_moved(&mut self, dx: f64, dy: f64) -> bool {
        self.input.pointer_moved(dx, dy, &mut self.viewport)
    }

    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.input.wheel(delta_y, &mut self.viewport)
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_to_base();
    }

    /// Apply a new surface size. In-flight tiles keep the old geometry.
    pub fn resize(&mut self, surface_width: u32, surface_height: u32) -> crate::Result<()> {
        if let Err(e) = self.viewport.resize(surface_width, surface_height) {
            warn!(surface_width, surface_height, "Resize ignored: {e}");
            return Err(e.into());
        }
        let res = self.viewport.resolution();
        debug!(width = res.width, height = res.height, "Resized");
        Ok(())
    }

    // -- configuration --------------------------------------------------------

    /// Clamped to `[100, 10000]`.
    pub fn set_max_iterations(&mut self, requested: u32) {
        let clamped = clamp_max_iterations(requested);
        if clamped != requested {
            warn!(requested, clamped, "Iteration cap clamped");
        }
        if clamped != self.max_iterations {
            self.max_iterations = clamped;
            self.viewport.mark_dirty();
        }
    }

    /// Switching generator also returns the view to the base plane.
    pub fn set_fractal_kind(&mut self, kind: FractalKind) {
        if kind != self.fractal.kind {
            self.fractal.kind = kind;
            self.viewport.reset_to_base();
        }
    }

    /// Non-finite seeds are logged and ignored.
    pub fn set_julia_seed(&mut self, re: f64, im: f64) {
        match self.fractal.with_seed(Complex::new(re, im)) {
            Ok(updated) => {
                if updated != self.fractal {
                    self.fractal = updated;
                    self.viewport.mark_dirty();
                }
            }
            Err(e) => warn!("Julia seed ignored: {e}"),
        }
    }

    pub fn set_hsv(&mut self, hue: f32, saturation: f32, value: f32) {
        self.update_color(|c| c.set_hsv(hue, saturation, value));
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.update_color(|c| c.mode = mode);
    }

    pub fn set_smooth_full_res(&mut self, smooth: bool) {
        self.update_color(|c| c.set_smooth_full_res(smooth));
    }

    pub fn set_smooth_preview(&mut self, smooth: bool) {
        self.update_color(|c| c.set_smooth_preview(smooth));
    }

    fn update_color(&mut self, f: impl FnOnce(&mut ColorConfig)) {
        let before = self.color;
        f(&mut self.color);
        if self.color != before {
            self.viewport.mark_dirty();
        }
    }

    // -- events ---------------------------------------------------------------

    /// Debounced loading indicator changes.
    pub fn on_fetching_changed(&mut self, listener: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.progress.on_loading_changed(listener)
    }

    /// Fires once, when the first pass has fully arrived.
    pub fn on_initial_render(&mut self, listener: impl FnMut(&()) + 'static) -> SubscriptionId {
        self.progress.on_initial_render(listener)
    }

    pub fn on_stats(&mut self, listener: impl FnMut(&[WorkerStat]) + 'static) -> SubscriptionId {
        self.stats_listeners.subscribe(listener)
    }

    pub fn on_gamepad_connection(
        &mut self,
        listener: impl FnMut(&GamepadConnection) + 'static,
    ) -> SubscriptionId {
        self.gamepad_listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.progress.unsubscribe(id)
            || self.stats_listeners.unsubscribe(id)
            || self.gamepad_listeners.unsubscribe(id)
    }

    // -- accessors ------------------------------------------------------------

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// `true` until the first pass has fully arrived, and while any tile is
    /// outstanding.
    pub fn is_fetching(&self) -> bool {
        !self.progress.initial_complete() || self.pool.is_occupied()
    }

    /// The debounced flag shown as a loading indicator.
    pub fn is_loading(&self) -> bool {
        self.progress.is_loading()
    }

    pub fn is_pool_occupied(&self) -> bool {
        self.pool.is_occupied()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn full_res_deadline(&self) -> Option<Instant> {
        self.full_res_deadline
    }

    pub fn dispatch_counts(&self) -> DispatchCounts {
        self.counts
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn resolution(&self) -> Resolution {
        self.viewport.resolution()
    }

    pub fn fractal(&self) -> FractalConfig {
        self.fractal
    }

    pub fn color(&self) -> ColorConfig {
        self.color
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn stats(&self) -> &[WorkerStat] {
        self.stats.stats()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("state", &self.state)
            .field("full_res_deadline", &self.full_res_deadline)
            .field("counts", &self.counts)
            .field("outstanding", &self.pool.outstanding())
            .finish()
    }
}
