use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use fractals_core::TileRequest;
use fractals_engine::{ChannelGamepad, EngineSettings, RenderScheduler, RenderState};
use fractals_render::{FrameBuffer, TileKernel};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every request it is asked to render and returns a blank band.
struct Recording {
    seen: Sender<TileRequest>,
}

impl TileKernel for Recording {
    fn render_tile(&mut self, request: &TileRequest) -> Vec<u8> {
        let _ = self.seen.send(request.clone());
        vec![0; request.byte_len()]
    }
}

/// Blocks until its gate closes, when it has one.
struct Gated {
    gate: Option<Receiver<()>>,
}

impl TileKernel for Gated {
    fn render_tile(&mut self, request: &TileRequest) -> Vec<u8> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        vec![0; request.byte_len()]
    }
}

fn settings() -> EngineSettings {
    EngineSettings {
        workers: Some(4),
        preview_scaling: 2,
        ..EngineSettings::default()
    }
}

fn recording_engine() -> (RenderScheduler, Receiver<TileRequest>, FrameBuffer) {
    let (tx, rx) = mpsc::channel();
    let engine = RenderScheduler::with_kernel(settings(), 800, 600, move |_| Recording {
        seen: tx.clone(),
    })
    .unwrap();
    let res = engine.resolution();
    (engine, rx, FrameBuffer::new(res.width, res.height))
}

/// Pump replies at `now` until nothing is outstanding.
fn settle(engine: &mut RenderScheduler, frame: &mut FrameBuffer, now: Instant) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.is_pool_occupied() {
        assert!(Instant::now() < deadline, "workers did not reply in time");
        std::thread::sleep(Duration::from_millis(1));
        engine.pump(now, frame);
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn pan(engine: &mut RenderScheduler, dx: f64) {
    engine.pointer_pressed();
    engine.pointer_moved(dx, 0.0);
    engine.pointer_released();
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn first_tick_dispatches_one_preview_band_per_worker() {
    let (mut engine, seen, mut frame) = recording_engine();
    assert_eq!(engine.resolution().width, 800);
    assert_eq!(engine.resolution().height, 600);

    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);

    let mut reqs: Vec<_> = seen.try_iter().collect();
    reqs.sort_by_key(|r| r.tile_index);
    assert_eq!(reqs.len(), 4);
    for (i, r) in reqs.iter().enumerate() {
        assert_eq!(r.tile_index, i as u32);
        assert_eq!(r.tile_count, 4);
        assert!(!r.full_res);
        assert_eq!(r.sampling_stride, 2);
        assert_eq!(r.band_height(), 150);
        assert_eq!(r.origin_y(), i as u32 * 150);
    }
    assert_eq!(frame.revision(), 4);
}

#[test]
fn quiet_period_yields_exactly_one_full_res_batch() {
    let (mut engine, seen, mut frame) = recording_engine();
    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);
    seen.try_iter().for_each(drop);

    for step in 1..50 {
        engine.tick(t0 + ms(step * 10), &mut frame);
    }
    assert_eq!(engine.dispatch_counts().full_res, 0);
    assert_eq!(engine.state(), RenderState::FullResArmed);

    engine.tick(t0 + ms(500), &mut frame);
    assert_eq!(engine.dispatch_counts().full_res, 1);
    assert_eq!(engine.state(), RenderState::Idle);
    settle(&mut engine, &mut frame, t0 + ms(500));

    for step in 51..200 {
        engine.tick(t0 + ms(step * 10), &mut frame);
    }
    assert_eq!(engine.dispatch_counts().full_res, 1);
    assert_eq!(engine.dispatch_counts().previews, 1);

    let reqs: Vec<_> = seen.try_iter().collect();
    assert_eq!(reqs.len(), 4);
    assert!(reqs.iter().all(|r| r.full_res && r.sampling_stride == 1));
}

#[test]
fn full_res_is_timed_from_the_last_change() {
    let (mut engine, _seen, mut frame) = recording_engine();
    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);

    for i in 1..=10 {
        let t = t0 + ms(i * 100);
        pan(&mut engine, 1.0);
        engine.tick(t, &mut frame);
        settle(&mut engine, &mut frame, t);
        engine.tick(t + ms(50), &mut frame);
        assert_eq!(engine.dispatch_counts().full_res, 0);
    }
    let last = t0 + ms(1000);
    assert_eq!(engine.full_res_deadline(), Some(last + ms(500)));
    assert_eq!(engine.dispatch_counts().previews, 11);

    engine.tick(last + ms(499), &mut frame);
    assert_eq!(engine.dispatch_counts().full_res, 0);
    engine.tick(last + ms(500), &mut frame);
    assert_eq!(engine.dispatch_counts().full_res, 1);
    settle(&mut engine, &mut frame, last + ms(500));

    engine.tick(last + ms(2000), &mut frame);
    assert_eq!(engine.dispatch_counts().full_res, 1);
}

#[test]
fn smoothing_flag_follows_the_pass() {
    let (mut engine, seen, mut frame) = recording_engine();
    engine.set_smooth_preview(false);
    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);
    engine.tick(t0 + ms(500), &mut frame);
    settle(&mut engine, &mut frame, t0 + ms(500));

    let reqs: Vec<_> = seen.try_iter().collect();
    assert_eq!(reqs.len(), 8);
    for r in &reqs {
        assert_eq!(r.color.smooth, r.full_res);
    }
}

#[test]
fn resize_applies_to_the_next_dispatch_only() {
    let (mut engine, seen, mut frame) = recording_engine();
    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    engine.resize(400, 300).unwrap();
    let new_res = engine.resolution();
    frame.resize(new_res.width, new_res.height);
    settle(&mut engine, &mut frame, t0);

    let in_flight: Vec<_> = seen.try_iter().collect();
    assert!(in_flight.iter().all(|r| r.resolution.width == 800));
    assert_eq!(frame.revision(), 1, "only the resize itself touched the frame");

    engine.tick(t0 + ms(10), &mut frame);
    settle(&mut engine, &mut frame, t0 + ms(10));
    let next: Vec<_> = seen.try_iter().collect();
    assert_eq!(next.len(), 4);
    assert!(next.iter().all(|r| r.resolution == new_res));
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[test]
fn stats_broadcast_is_rate_limited() {
    let (mut engine, _seen, mut frame) = recording_engine();
    let broadcasts = Rc::new(RefCell::new(Vec::new()));
    let b = Rc::clone(&broadcasts);
    engine.on_stats(move |stats| b.borrow_mut().push(stats.to_vec()));

    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);
    assert_eq!(broadcasts.borrow().len(), 1);

    pan(&mut engine, 3.0);
    engine.tick(t0 + ms(100), &mut frame);
    settle(&mut engine, &mut frame, t0 + ms(100));
    assert_eq!(broadcasts.borrow().len(), 1, "burst inside the interval");

    pan(&mut engine, 3.0);
    engine.tick(t0 + ms(450), &mut frame);
    settle(&mut engine, &mut frame, t0 + ms(450));
    assert_eq!(broadcasts.borrow().len(), 2);

    let last = broadcasts.borrow().last().cloned().unwrap();
    assert_eq!(last.len(), 4);
    for (i, stat) in last.iter().enumerate() {
        assert_eq!(stat.worker_id, i);
    }
}

#[test]
fn loading_indicator_is_debounced() {
    let (mut engine, _seen, mut frame) = recording_engine();
    let changes = Rc::new(RefCell::new(Vec::new()));
    let c = Rc::clone(&changes);
    engine.on_fetching_changed(move |v| c.borrow_mut().push(*v));
    let initial = Rc::new(RefCell::new(0));
    let i = Rc::clone(&initial);
    engine.on_initial_render(move |_| *i.borrow_mut() += 1);

    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);
    assert_eq!(*initial.borrow(), 1);
    assert!(!engine.is_fetching());
    assert!(engine.is_loading());

    engine.tick(t0 + ms(50), &mut frame);
    assert!(changes.borrow().is_empty());
    engine.tick(t0 + ms(100), &mut frame);
    assert_eq!(*changes.borrow(), vec![false]);

    engine.tick(t0 + ms(500), &mut frame);
    assert!(engine.is_fetching());
    settle(&mut engine, &mut frame, t0 + ms(500));
    engine.tick(t0 + ms(600), &mut frame);
    assert_eq!(*changes.borrow(), vec![false, true, false]);
    assert_eq!(*initial.borrow(), 1);
}

#[test]
fn gamepad_connection_and_sticks_reach_the_viewport() {
    let (pad, feed) = ChannelGamepad::new();
    let (mut engine, _seen, mut frame) = recording_engine();
    engine = engine.with_gamepad(Box::new(pad));
    let events = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&events);
    engine.on_gamepad_connection(move |c| e.borrow_mut().push(c.clone()));

    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);

    feed.connect(0, "test-pad");
    feed.set_axes(0, vec![0.0, 0.0, 0.0, 0.5]);
    let before = engine.viewport().plane();
    engine.tick(t0 + ms(10), &mut frame);

    assert_eq!(events.borrow().len(), 1);
    assert!(events.borrow()[0].connected);
    assert_eq!(events.borrow()[0].device_id, "test-pad");
    assert!(engine.viewport().plane().width() > before.width());
    assert_eq!(engine.dispatch_counts().previews, 2);
    settle(&mut engine, &mut frame, t0 + ms(10));

    engine.shutdown();
    assert!(!feed.disconnect(0, "test-pad"));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn silent_worker_stalls_the_pool() {
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let mut gate = Some(gate_rx);
    let mut engine = RenderScheduler::with_kernel(settings(), 800, 600, move |id| Gated {
        gate: if id == 0 { gate.take() } else { None },
    })
    .unwrap();
    let res = engine.resolution();
    let mut frame = FrameBuffer::new(res.width, res.height);
    let changes = Rc::new(RefCell::new(Vec::new()));
    let c = Rc::clone(&changes);
    engine.on_fetching_changed(move |v| c.borrow_mut().push(*v));

    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    let wait = Instant::now() + Duration::from_secs(10);
    while frame.revision() < 3 {
        assert!(Instant::now() < wait, "healthy workers did not reply");
        std::thread::sleep(Duration::from_millis(1));
        engine.pump(t0, &mut frame);
    }
    assert!(engine.is_pool_occupied());
    assert!(engine.is_fetching());

    // The debounced pass still goes out on time.
    engine.tick(t0 + ms(500), &mut frame);
    assert_eq!(engine.dispatch_counts().full_res, 1);

    // With a full-res pass armed and the pool occupied, previews wait.
    pan(&mut engine, 5.0);
    engine.tick(t0 + ms(600), &mut frame);
    assert_eq!(engine.dispatch_counts().previews, 2);
    pan(&mut engine, 5.0);
    for step in 61..100 {
        engine.tick(t0 + ms(step * 10), &mut frame);
    }
    assert_eq!(engine.dispatch_counts().previews, 2);
    assert_eq!(engine.state(), RenderState::Dirty);
    assert!(engine.is_pool_occupied());
    assert!(engine.is_loading());
    assert!(!changes.borrow().contains(&false), "loading never clears");

    drop(gate_tx);
    engine.shutdown();
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[test]
fn ticks_after_shutdown_dispatch_nothing() {
    let (mut engine, seen, mut frame) = recording_engine();
    engine.shutdown();
    assert!(engine.is_stopped());

    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    engine.tick(t0 + ms(600), &mut frame);

    assert_eq!(engine.dispatch_counts(), Default::default());
    assert_eq!(engine.state(), RenderState::Dirty);
    assert!(engine.full_res_deadline().is_none());
    assert!(seen.try_iter().next().is_none());
    assert_eq!(frame.revision(), 0);
}

#[test]
fn shutdown_leaves_an_idle_indicator_idle() {
    let (mut engine, _seen, mut frame) = recording_engine();
    let t0 = Instant::now();
    engine.tick(t0, &mut frame);
    settle(&mut engine, &mut frame, t0);
    engine.tick(t0 + ms(500), &mut frame);
    settle(&mut engine, &mut frame, t0 + ms(500));
    engine.tick(t0 + ms(700), &mut frame);
    assert!(!engine.is_loading());
    let before = engine.dispatch_counts();

    engine.shutdown();
    engine.shutdown();
    pan(&mut engine, 10.0);
    engine.set_max_iterations(2000);
    for step in 0..80 {
        engine.tick(t0 + ms(800 + step * 10), &mut frame);
    }

    assert_eq!(engine.dispatch_counts(), before);
    assert!(!engine.is_loading());
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn overflowing_tiling_is_a_settings_error() {
    let settings = EngineSettings {
        workers: Some(1 << 13),
        preview_scaling: 1 << 20,
        ..EngineSettings::default()
    };
    let built = RenderScheduler::with_kernel(settings, 800, 600, |_| Gated { gate: None });
    assert!(built.is_err());
}
