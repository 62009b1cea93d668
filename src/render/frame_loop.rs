// SPDX-License-Identifier: GPL-3.0-only

//! Render loop scheduling
//!
//! The loop body is driven by a [`TickSource`] and stopped through a
//! [`CancelToken`]. [`FrameClock`] paces ticks at the display refresh rate;
//! [`ManualTicks`] hands out a fixed number of ticks immediately so a loop
//! can be stepped synchronously. [`RenderLoopController`] runs a loop on
//! its own thread and cancels it when dropped, so no tick is ever scheduled
//! after its owner is gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the loop body to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Source of loop ticks
pub trait TickSource {
    /// Wait for the next tick
    ///
    /// Returns `None` when the source is exhausted or the token was
    /// cancelled while waiting.
    fn next_tick(&mut self, token: &CancelToken) -> Option<Instant>;
}

/// Fixed-rate tick source
///
/// Deadlines advance by one interval per tick. A tick that is late by more
/// than a whole interval resynchronizes to now instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    next_deadline: Option<Instant>,
}

/// Granularity at which a sleeping clock re-checks cancellation
const CANCEL_POLL: Duration = Duration::from_millis(5);

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TickSource for FrameClock {
    fn next_tick(&mut self, token: &CancelToken) -> Option<Instant> {
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);

        loop {
            if token.is_cancelled() {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(CANCEL_POLL));
        }

        let now = Instant::now();
        let next = deadline + self.interval;
        self.next_deadline = Some(if now > next { now } else { next });
        Some(now)
    }
}

/// Tick source that yields a fixed number of ticks without waiting
#[derive(Debug, Clone)]
pub struct ManualTicks {
    remaining: u64,
}

impl ManualTicks {
    pub fn new(count: u64) -> Self {
        Self { remaining: count }
    }
}

impl TickSource for ManualTicks {
    fn next_tick(&mut self, token: &CancelToken) -> Option<Instant> {
        if token.is_cancelled() || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Instant::now())
    }
}

/// Run a loop on the current thread until the body stops it, the token is
/// cancelled or the tick source runs out
///
/// Returns the number of ticks the body ran.
pub fn run_loop<T, F>(ticks: &mut T, token: &CancelToken, mut loop_fn: F) -> u64
where
    T: TickSource + ?Sized,
    F: FnMut() -> LoopAction,
{
    let mut count = 0;
    while ticks.next_tick(token).is_some() {
        count += 1;
        if loop_fn() == LoopAction::Stop {
            break;
        }
    }
    count
}

/// Controller for a render loop running in a separate thread
///
/// ```ignore
/// let controller = RenderLoopController::start(
///     "render",
///     FrameClock::new(render::FRAME_INTERVAL),
///     move || {
///         session.lock().render_tick();
///         LoopAction::Continue
///     },
/// );
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct RenderLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<u64>>,
    token: CancelToken,
    /// Name for logging
    name: String,
    ticks_run: Option<u64>,
}

impl RenderLoopController {
    /// Start a new loop in a separate thread
    ///
    /// The closure is called once per tick until it returns
    /// `LoopAction::Stop`, the tick source runs out, or the controller is
    /// stopped.
    pub fn start<T, F>(name: &str, mut ticks: T, loop_fn: F) -> Self
    where
        T: TickSource + Send + 'static,
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let token = CancelToken::new();
        let thread_token = token.clone();
        let thread_name = name.to_string();

        info!(name = %name, "Starting render loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %thread_name, "Render loop thread started");
            let count = run_loop(&mut ticks, &thread_token, loop_fn);
            info!(name = %thread_name, ticks = count, "Render loop thread exiting");
            count
        });

        Self {
            thread_handle: Some(thread_handle),
            token,
            name: name.to_string(),
            ticks_run: None,
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Token observed by the loop thread
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting render loop stop");
        self.token.cancel();
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) -> Option<u64> {
        self.request_stop();
        self.join()
    }

    /// Wait for the thread to finish without sending the stop signal
    ///
    /// Returns the number of ticks the loop ran, or `None` if the thread
    /// panicked.
    pub fn join(&mut self) -> Option<u64> {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for render loop thread to finish");
            match handle.join() {
                Ok(count) => self.ticks_run = Some(count),
                Err(e) => warn!(name = %self.name, "Render loop thread panicked: {:?}", e),
            }
        }
        self.ticks_run
    }
}

impl Drop for RenderLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "RenderLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_manual_ticks_drive_loop_synchronously() {
        let mut calls = 0;
        let ran = run_loop(&mut ManualTicks::new(5), &CancelToken::new(), || {
            calls += 1;
            LoopAction::Continue
        });
        assert_eq!(ran, 5);
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_body_can_stop_loop() {
        let ran = run_loop(&mut ManualTicks::new(100), &CancelToken::new(), || {
            LoopAction::Stop
        });
        assert_eq!(ran, 1);
    }

    #[test]
    fn test_cancelled_token_prevents_ticks() {
        let token = CancelToken::new();
        token.cancel();
        let ran = run_loop(&mut ManualTicks::new(3), &token, || LoopAction::Continue);
        assert_eq!(ran, 0);
        assert!(FrameClock::new(Duration::from_millis(1)).next_tick(&token).is_none());
    }

    #[test]
    fn test_frame_clock_paces_ticks() {
        let token = CancelToken::new();
        let mut clock = FrameClock::new(Duration::from_millis(10));
        let first = clock.next_tick(&token).unwrap();
        let _ = clock.next_tick(&token).unwrap();
        let third = clock.next_tick(&token).unwrap();
        assert!(third.duration_since(first) >= Duration::from_millis(20));
    }

    #[test]
    fn test_controller_stop() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = RenderLoopController::start(
            "test-loop",
            FrameClock::new(Duration::from_millis(2)),
            move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                LoopAction::Continue
            },
        );

        thread::sleep(Duration::from_millis(30));
        assert!(controller.is_running());

        let ran = controller.stop().unwrap();
        assert!(ran > 0);
        assert_eq!(ran, counter.load(Ordering::SeqCst) as u64);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_drop_cancels_loop() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let controller = RenderLoopController::start(
            "test-drop",
            FrameClock::new(Duration::from_millis(1)),
            move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                LoopAction::Continue
            },
        );
        thread::sleep(Duration::from_millis(10));
        drop(controller);

        let after_drop = counter.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_loop_ends_with_tick_source() {
        let mut controller =
            RenderLoopController::start("test-finite", ManualTicks::new(7), || {
                LoopAction::Continue
            });
        assert_eq!(controller.join(), Some(7));
    }
}
