//! Timer-driven playback state machine over the frame sequence.

use catalog::{FrameLocator, FrameSequence};
use viewer_common::{ViewerError, ViewerResult};

/// Playback states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
}

/// Owns the current frame index and the Stopped/Playing state.
///
/// Pure with respect to time: the owning driver calls `tick` at the cadence
/// while Playing. Index advance wraps at the end of the sequence, so
/// playback loops indefinitely with no terminal state. Before the first
/// `load` the controller is idle and `play` is a guarded no-op.
#[derive(Debug, Default)]
pub struct PlaybackController {
    sequence: Option<FrameSequence>,
    current_index: usize,
    status: PlaybackStatus,
}

impl PlaybackController {
    /// Create an idle controller with no sequence loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller over a sequence, at index 0, stopped.
    pub fn with_sequence(sequence: FrameSequence) -> Self {
        Self {
            sequence: Some(sequence),
            current_index: 0,
            status: PlaybackStatus::Stopped,
        }
    }

    /// Replace the sequence (date range or parameter changed): index resets
    /// to 0 and playback stops. Auto-start is the caller's policy.
    pub fn load(&mut self, sequence: FrameSequence) {
        self.sequence = Some(sequence);
        self.current_index = 0;
        self.status = PlaybackStatus::Stopped;
    }

    /// Start playback. Returns whether the state changed; a no-op when
    /// already playing or when nothing is loaded (the controller never
    /// ticks with nothing to show).
    pub fn play(&mut self) -> bool {
        if self.status == PlaybackStatus::Playing || self.len() == 0 {
            return false;
        }
        self.status = PlaybackStatus::Playing;
        true
    }

    /// Stop playback. Returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if self.status == PlaybackStatus::Stopped {
            return false;
        }
        self.status = PlaybackStatus::Stopped;
        true
    }

    /// Advance one frame, wrapping at the end. Only has effect while
    /// Playing; returns the new index when it advanced.
    pub fn tick(&mut self) -> Option<usize> {
        if self.status != PlaybackStatus::Playing {
            return None;
        }
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.current_index = (self.current_index + 1) % len;
        Some(self.current_index)
    }

    /// Jump to a frame. Valid in any state; always stops autoplay since
    /// manual control takes precedence over the clock. Out-of-range indexes
    /// are rejected with state unchanged.
    pub fn seek(&mut self, index: usize) -> ViewerResult<usize> {
        let len = self.len();
        if index >= len {
            return Err(ViewerError::IndexOutOfRange { index, len });
        }
        self.current_index = index;
        self.status = PlaybackStatus::Stopped;
        Ok(index)
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_frame(&self) -> Option<&FrameLocator> {
        self.sequence.as_ref()?.get(self.current_index)
    }

    pub fn sequence(&self) -> Option<&FrameSequence> {
        self.sequence.as_ref()
    }

    pub fn len(&self) -> usize {
        self.sequence.as_ref().map_or(0, FrameSequence::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
