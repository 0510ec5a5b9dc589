//! Async driver for the playback clock and the transition ramp.
//!
//! Two timer domains run concurrently: the cadence clock advancing the
//! frame index, and the sub-cadence ramp stepping the cross-fade. Both are
//! cancelled when a new sequence loads; completions tagged with a stale
//! epoch are dropped before they can touch the fresher state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use catalog::FrameSequence;
use viewer_common::ViewerResult;

use crate::controller::{PlaybackController, PlaybackStatus};
use crate::epoch::{Epoch, EpochGuard};
use crate::transition::{StepOutcome, Transition, TransitionConfig};

/// Timing and opacity settings for one player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    /// Interval between frame advances while playing.
    pub cadence: Duration,
    /// Cross-fade ramp settings.
    pub transition: TransitionConfig,
    /// User-configured overlay opacity applied before blending.
    pub base_opacity: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(1000),
            transition: TransitionConfig::default(),
            base_opacity: 0.6,
        }
    }
}

/// Snapshot published to the map shell after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub epoch: Epoch,
    pub index: usize,
    pub blend: crate::transition::Blend,
}

struct Inner {
    controller: PlaybackController,
    transition: Option<Transition>,
    clock: Option<JoinHandle<()>>,
    ramp: Option<JoinHandle<()>>,
}

impl Inner {
    fn cancel_timers(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.abort();
        }
        if let Some(ramp) = self.ramp.take() {
            ramp.abort();
        }
    }
}

/// Owns the playback and transition state machines and their timers.
pub struct Player {
    inner: Arc<Mutex<Inner>>,
    epoch: EpochGuard,
    render_tx: Arc<watch::Sender<Option<RenderFrame>>>,
    config: PlayerConfig,
}

impl Player {
    /// Create an idle player and the receiver its render snapshots arrive on.
    pub fn new(config: PlayerConfig) -> (Self, watch::Receiver<Option<RenderFrame>>) {
        let (render_tx, render_rx) = watch::channel(None);
        let player = Self {
            inner: Arc::new(Mutex::new(Inner {
                controller: PlaybackController::new(),
                transition: None,
                clock: None,
                ramp: None,
            })),
            epoch: EpochGuard::new(),
            render_tx: Arc::new(render_tx),
            config,
        };
        (player, render_rx)
    }

    /// Additional subscription to render snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Option<RenderFrame>> {
        self.render_tx.subscribe()
    }

    /// Load a new frame sequence: supersedes both timers, resets the index
    /// to 0 stopped, and publishes the first frame steady.
    pub async fn load(&self, sequence: FrameSequence) {
        let epoch = self.epoch.advance();
        let mut inner = self.inner.lock().await;
        inner.cancel_timers();
        inner.controller.load(sequence);
        inner.transition = inner
            .controller
            .current_frame()
            .cloned()
            .map(|frame| Transition::new(frame, &self.config.transition));
        Self::publish(&inner, epoch, &self.render_tx, self.config);
    }

    /// Start autoplay. No-op when already playing or nothing is loaded.
    pub async fn play(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.controller.play() {
            return false;
        }
        let epoch = self.epoch.current();
        inner.clock = Some(tokio::spawn(Self::run_clock(
            self.inner.clone(),
            self.epoch.clone(),
            epoch,
            self.render_tx.clone(),
            self.config,
        )));
        true
    }

    /// Stop autoplay. An in-flight cross-fade is left to finish.
    pub async fn pause(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.controller.pause() {
            return false;
        }
        if let Some(clock) = inner.clock.take() {
            clock.abort();
        }
        true
    }

    /// Jump to a frame; always stops autoplay. Out-of-range indexes are
    /// rejected with state unchanged.
    pub async fn seek(&self, index: usize) -> ViewerResult<usize> {
        let mut inner = self.inner.lock().await;
        let index = inner.controller.seek(index)?;
        if let Some(clock) = inner.clock.take() {
            clock.abort();
        }
        let epoch = self.epoch.current();
        Self::apply_index(
            &mut inner,
            &self.inner,
            &self.epoch,
            epoch,
            &self.render_tx,
            self.config,
        );
        Ok(index)
    }

    /// Tear down: invalidates outstanding timer callbacks and cancels both
    /// timers.
    pub async fn shutdown(&self) {
        self.epoch.advance();
        self.inner.lock().await.cancel_timers();
    }

    pub async fn status(&self) -> PlaybackStatus {
        self.inner.lock().await.controller.status()
    }

    pub async fn current_index(&self) -> usize {
        self.inner.lock().await.controller.current_index()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.controller.len()
    }

    async fn run_clock(
        inner: Arc<Mutex<Inner>>,
        guard: EpochGuard,
        epoch: Epoch,
        render_tx: Arc<watch::Sender<Option<RenderFrame>>>,
        config: PlayerConfig,
    ) {
        let mut ticker = interval(config.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !guard.is_current(epoch) {
                return;
            }
            let mut state = inner.lock().await;
            let Some(index) = state.controller.tick() else {
                return;
            };
            debug!(index, "Playback tick");
            Self::apply_index(&mut state, &inner, &guard, epoch, &render_tx, config);
        }
    }

    /// React to an index change: retarget the cross-fade and (re)start the
    /// ramp timer when the visible frame actually changed.
    fn apply_index(
        state: &mut Inner,
        inner: &Arc<Mutex<Inner>>,
        guard: &EpochGuard,
        epoch: Epoch,
        render_tx: &Arc<watch::Sender<Option<RenderFrame>>>,
        config: PlayerConfig,
    ) {
        let Some(frame) = state.controller.current_frame().cloned() else {
            return;
        };
        let Some(transition) = state.transition.as_mut() else {
            return;
        };

        if transition.retarget(frame) {
            if let Some(ramp) = state.ramp.take() {
                ramp.abort();
            }
            state.ramp = Some(tokio::spawn(Self::run_ramp(
                inner.clone(),
                guard.clone(),
                epoch,
                render_tx.clone(),
                config,
            )));
        }
        Self::publish(state, epoch, render_tx, config);
    }

    async fn run_ramp(
        inner: Arc<Mutex<Inner>>,
        guard: EpochGuard,
        epoch: Epoch,
        render_tx: Arc<watch::Sender<Option<RenderFrame>>>,
        config: PlayerConfig,
    ) {
        let mut ticker = interval(config.transition.step_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !guard.is_current(epoch) {
                return;
            }
            let mut state = inner.lock().await;
            let Some(transition) = state.transition.as_mut() else {
                return;
            };
            match transition.step(config.base_opacity) {
                StepOutcome::Idle => return,
                StepOutcome::Blending(blend) => {
                    let frame = RenderFrame {
                        epoch,
                        index: state.controller.current_index(),
                        blend,
                    };
                    render_tx.send_replace(Some(frame));
                }
                StepOutcome::Finished(blend) => {
                    let frame = RenderFrame {
                        epoch,
                        index: state.controller.current_index(),
                        blend,
                    };
                    render_tx.send_replace(Some(frame));
                    // Settle on the incoming frame at the base opacity.
                    Self::publish(&state, epoch, &render_tx, config);
                    return;
                }
            }
        }
    }

    fn publish(
        state: &Inner,
        epoch: Epoch,
        render_tx: &Arc<watch::Sender<Option<RenderFrame>>>,
        config: PlayerConfig,
    ) {
        if let Some(transition) = &state.transition {
            render_tx.send_replace(Some(RenderFrame {
                epoch,
                index: state.controller.current_index(),
                blend: transition.blend(config.base_opacity),
            }));
        }
    }
}
