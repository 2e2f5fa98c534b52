//! Recurring frame task: orbit the camera and redraw once per tick.
//!
//! Ticks run on a dedicated worker thread and hold the shared frame context
//! for the whole draw. Host calls (`update`, `on_resize`) never take that
//! lock: they stage their writes in [`PendingInput`], which the next tick
//! applies before drawing. Stopping joins the worker, which guarantees no
//! tick runs after `stop` returns.

use crate::config::{OrbitConfig, VisualizerConfig};
use crate::renderer::RenderError;
use crate::scene::{ElementTransform, SceneGraph};
use crate::viewport::Viewport;
use glam::Vec3;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Phase accumulator driving the camera around the scene origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrbit {
    phase: f32,
    step: f32,
    radius: f32,
    height: f32,
}

impl CameraOrbit {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            phase: 0.0,
            step: config.phase_step,
            radius: config.radius,
            height: config.height,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Advance the phase by one step and return the new eye position.
    pub fn advance(&mut self) -> Vec3 {
        self.phase += self.step;
        Vec3::new(
            self.phase.sin() * self.radius,
            self.height,
            self.phase.cos() * self.radius,
        )
    }
}

/// Host writes waiting for the next tick.
///
/// Holds the latest transform per element. Its lock only ever covers a
/// handful of slot writes, never a draw.
#[derive(Debug)]
pub struct PendingInput {
    transforms: Mutex<Vec<Option<ElementTransform>>>,
    resize: AtomicBool,
    surface_lost: AtomicBool,
}

impl PendingInput {
    pub fn new(element_count: usize) -> Self {
        Self {
            transforms: Mutex::new(vec![None; element_count]),
            resize: AtomicBool::new(false),
            surface_lost: AtomicBool::new(false),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Option<ElementTransform>>> {
        self.transforms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the staged transform of each `(index, transform)` pair.
    /// Out-of-range indices are ignored.
    pub fn stage(&self, updates: impl IntoIterator<Item = (usize, ElementTransform)>) {
        let mut slots = self.slots();
        for (index, transform) in updates {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(transform);
            }
        }
    }

    /// Number of staged element transforms.
    pub fn staged(&self) -> usize {
        self.slots().iter().filter(|slot| slot.is_some()).count()
    }

    /// Move every staged transform into `scene`.
    pub fn drain_into(&self, scene: &mut SceneGraph) {
        let mut slots = self.slots();
        for (index, slot) in slots.iter_mut().enumerate() {
            if let Some(transform) = slot.take() {
                scene.apply_update(index, transform);
            }
        }
    }

    /// Apply staged transforms to `scene` and keep them staged.
    pub fn overlay(&self, scene: &mut SceneGraph) {
        for (index, slot) in self.slots().iter().enumerate() {
            if let Some(transform) = *slot {
                scene.apply_update(index, transform);
            }
        }
    }

    /// Ask the next tick to re-query the surface size.
    pub fn request_resize(&self) {
        self.resize.store(true, Ordering::Release);
    }

    fn take_resize(&self) -> bool {
        self.resize.swap(false, Ordering::AcqRel)
    }

    pub fn is_surface_lost(&self) -> bool {
        self.surface_lost.load(Ordering::Acquire)
    }

    fn mark_surface_lost(&self) {
        self.surface_lost.store(true, Ordering::Release);
    }
}

/// Everything one tick touches: the scene, the viewport and the camera orbit.
pub struct FrameContext {
    pub scene: SceneGraph,
    pub viewport: Viewport,
    input: Arc<PendingInput>,
    orbit: CameraOrbit,
    point_spin: f32,
    ticks: u64,
}

impl FrameContext {
    pub fn new(scene: SceneGraph, viewport: Viewport, config: &VisualizerConfig) -> Self {
        Self {
            input: Arc::new(PendingInput::new(scene.len())),
            scene,
            viewport,
            orbit: CameraOrbit::new(&config.orbit),
            point_spin: config.particles.spin_per_tick,
            ticks: 0,
        }
    }

    /// Handle for staging host writes without locking the frame.
    pub fn input(&self) -> Arc<PendingInput> {
        self.input.clone()
    }

    /// Apply staged input, then one camera update and one draw.
    pub fn tick(&mut self) -> Result<(), RenderError> {
        self.input.drain_into(&mut self.scene);
        if self.input.take_resize() {
            self.viewport.resize()?;
        }

        let eye = self.orbit.advance();
        self.viewport.camera_mut().set_position(eye);
        self.scene.spin_points(self.point_spin);
        self.ticks += 1;
        self.viewport.draw(&mut self.scene)
    }

    pub fn orbit(&self) -> &CameraOrbit {
        &self.orbit
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_surface_lost(&self) -> bool {
        self.input.is_surface_lost()
    }

    fn mark_surface_lost(&self) {
        self.input.mark_surface_lost();
    }
}

/// Frame context shared between the render loop and host calls.
pub type SharedFrame = Arc<Mutex<FrameContext>>;

/// Lock a shared frame, recovering from a poisoned lock.
pub fn lock_frame(frame: &SharedFrame) -> MutexGuard<'_, FrameContext> {
    frame.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Cancellable handle to a running tick worker.
pub struct TickHandle {
    stop: Sender<()>,
    worker: JoinHandle<()>,
}

impl TickHandle {
    /// Stop the worker and wait for its current tick to finish.
    pub fn cancel(self) {
        // The worker may already have exited on its own
        let _ = self.stop.send(());
        if self.worker.join().is_err() {
            log::error!("Render loop worker panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

/// Drives [`FrameContext::tick`] at a fixed interval.
pub struct RenderLoop {
    interval: Duration,
    handle: Option<TickHandle>,
}

impl RenderLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    pub fn state(&self) -> LoopState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => LoopState::Running,
            _ => LoopState::Stopped,
        }
    }

    /// Start ticking `frame`. The first tick runs immediately.
    ///
    /// Returns `Ok(false)` if the loop is already running.
    pub fn start(&mut self, frame: SharedFrame) -> io::Result<bool> {
        if self.state() == LoopState::Running {
            return Ok(false);
        }
        // Reap a worker that stopped itself
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }

        let (stop, stopped) = mpsc::channel();
        let interval = self.interval;
        let worker = thread::Builder::new()
            .name("phobz-render-loop".into())
            .spawn(move || {
                let mut deadline = Instant::now();
                loop {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match stopped.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    if !run_tick(&frame) {
                        break;
                    }
                    // Late ticks are not batched: the schedule restarts from now
                    deadline = (deadline + interval).max(Instant::now());
                }
                log::debug!("Render loop exited");
            })?;

        self.handle = Some(TickHandle { stop, worker });
        log::debug!("Render loop started ({:?} per tick)", interval);
        Ok(true)
    }

    /// Stop ticking. Returns once no tick is running.
    ///
    /// Returns `false` if the loop was not running.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.cancel();
                if was_running {
                    log::debug!("Render loop stopped");
                }
                was_running
            }
            None => false,
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one tick. Returns `false` when the loop must end.
fn run_tick(frame: &SharedFrame) -> bool {
    let mut ctx = lock_frame(frame);
    if ctx.viewport.is_disposed() {
        return false;
    }
    match ctx.tick() {
        Ok(()) => true,
        Err(err) if err.is_fatal() => {
            log::error!("Render loop stopping: {}", err);
            ctx.mark_surface_lost();
            false
        }
        Err(err) => {
            log::warn!("Frame draw failed: {}", err);
            true
        }
    }
}
