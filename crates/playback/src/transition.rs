//! Cross-fade state between the outgoing and incoming raster frame.

use std::time::Duration;

use catalog::FrameLocator;

/// Fixed-step ramp parameters.
#[derive(Debug, Clone, Copy)]
pub struct TransitionConfig {
    /// Number of opacity steps per cross-fade.
    pub steps: u32,
    /// Total ramp duration; one quarter of the default playback cadence.
    pub duration: Duration,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            duration: Duration::from_millis(250),
        }
    }
}

impl TransitionConfig {
    /// Interval between ramp steps.
    pub fn step_interval(&self) -> Duration {
        self.duration / self.steps.max(1)
    }
}

/// Opacities to render right now: the outgoing frame always, the incoming
/// frame only while a cross-fade is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
    pub outgoing: (FrameLocator, f64),
    pub incoming: Option<(FrameLocator, f64)>,
}

/// Result of advancing the ramp one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// No cross-fade in flight; steady state.
    Idle,
    /// Ramp advanced; render both frames at the blended opacities.
    Blending(Blend),
    /// Ramp reached full progress with this final blend; the incoming frame
    /// is now the steady frame.
    Finished(Blend),
}

/// Cross-fade state machine.
///
/// At most one transition is in flight. Retargeting while a ramp runs
/// discards the interrupted target (the fade jumps: the interrupted
/// incoming frame becomes the new outgoing frame) and restarts progress at
/// zero toward the newest frame; transitions are restartable, never queued,
/// so fast seeking can skip intermediate days.
#[derive(Debug, Clone)]
pub struct Transition {
    outgoing: FrameLocator,
    incoming: Option<FrameLocator>,
    progress: f64,
    steps: u32,
}

impl Transition {
    /// Steady state on an initial frame.
    pub fn new(initial: FrameLocator, config: &TransitionConfig) -> Self {
        Self {
            outgoing: initial,
            incoming: None,
            progress: 0.0,
            steps: config.steps.max(1),
        }
    }

    /// React to an index change. Starts (or restarts) a ramp when the new
    /// frame differs from the outgoing frame; returns whether a ramp should
    /// now be driven.
    pub fn retarget(&mut self, frame: FrameLocator) -> bool {
        if frame == self.outgoing {
            // Back on the frame already on screen; a fade in flight would
            // otherwise settle on its interrupted target and desync the
            // display from the index.
            self.incoming = None;
            self.progress = 0.0;
            return false;
        }
        if let Some(interrupted) = self.incoming.take() {
            // The interrupted target is never queued; the fade jumps to it
            // and restarts toward the newest frame.
            if interrupted != frame {
                self.outgoing = interrupted;
            }
        }
        self.incoming = Some(frame);
        self.progress = 0.0;
        true
    }

    /// Advance the ramp one step and report the opacities to render.
    pub fn step(&mut self, base_opacity: f64) -> StepOutcome {
        let Some(incoming) = self.incoming.clone() else {
            return StepOutcome::Idle;
        };

        self.progress = (self.progress + 1.0 / self.steps as f64).min(1.0);
        let blend = self.blend(base_opacity);

        if self.progress >= 1.0 {
            self.outgoing = incoming;
            self.incoming = None;
            self.progress = 0.0;
            StepOutcome::Finished(blend)
        } else {
            StepOutcome::Blending(blend)
        }
    }

    /// Current render state: two complementary opacities mid-fade, a single
    /// frame at the base opacity otherwise.
    pub fn blend(&self, base_opacity: f64) -> Blend {
        match &self.incoming {
            Some(incoming) => Blend {
                outgoing: (self.outgoing.clone(), base_opacity * (1.0 - self.progress)),
                incoming: Some((incoming.clone(), base_opacity * self.progress)),
            },
            None => Blend {
                outgoing: (self.outgoing.clone(), base_opacity),
                incoming: None,
            },
        }
    }

    pub fn in_flight(&self) -> bool {
        self.incoming.is_some()
    }

    pub fn outgoing(&self) -> &FrameLocator {
        &self.outgoing
    }

    pub fn incoming(&self) -> Option<&FrameLocator> {
        self.incoming.as_ref()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use catalog::FrameCatalog;
    use viewer_common::{DateRange, Parameter};

    fn frames(n: u64) -> Vec<FrameLocator> {
        let catalog = FrameCatalog::new("http://store");
        let start = chrono::NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
        let end = start + chrono::Days::new(n - 1);
        let range = DateRange::new(start, end).unwrap();
        catalog
            .raster_sequence(&range, Parameter::Pm25)
            .locators()
            .to_vec()
    }

    fn config(steps: u32) -> TransitionConfig {
        TransitionConfig {
            steps,
            duration: Duration::from_millis(250),
        }
    }

    fn opacities(outcome: &StepOutcome) -> (f64, f64) {
        match outcome {
            StepOutcome::Blending(b) | StepOutcome::Finished(b) => {
                (b.outgoing.1, b.incoming.as_ref().unwrap().1)
            }
            StepOutcome::Idle => panic!("expected a blend"),
        }
    }

    #[test]
    fn test_four_step_ramp_opacity_pairs() {
        let f = frames(2);
        let mut t = Transition::new(f[0].clone(), &config(4));
        assert!(t.retarget(f[1].clone()));

        assert_eq!(opacities(&t.step(1.0)), (0.75, 0.25));
        assert_eq!(opacities(&t.step(1.0)), (0.5, 0.5));
        assert_eq!(opacities(&t.step(1.0)), (0.25, 0.75));

        let last = t.step(1.0);
        assert!(matches!(last, StepOutcome::Finished(_)));
        assert_eq!(opacities(&last), (0.0, 1.0));

        // Steady on the incoming frame, no transition in flight.
        assert!(!t.in_flight());
        assert_eq!(t.outgoing(), &f[1]);
        assert_eq!(
            t.blend(1.0),
            Blend {
                outgoing: (f[1].clone(), 1.0),
                incoming: None
            }
        );
        assert_eq!(t.step(1.0), StepOutcome::Idle);
    }

    #[test]
    fn test_base_opacity_scales_ramp() {
        let f = frames(2);
        let mut t = Transition::new(f[0].clone(), &config(4));
        t.retarget(f[1].clone());

        let (out, inc) = opacities(&t.step(0.6));
        assert!((out - 0.45).abs() < 1e-9);
        assert!((inc - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_retarget_same_frame_is_noop() {
        let f = frames(2);
        let mut t = Transition::new(f[0].clone(), &config(4));
        assert!(!t.retarget(f[0].clone()));
        assert!(!t.in_flight());
    }

    #[test]
    fn test_mid_ramp_retarget_discards_interrupted_target() {
        let f = frames(3);
        let mut t = Transition::new(f[0].clone(), &config(4));
        t.retarget(f[1].clone());
        t.step(1.0);
        t.step(1.0);
        assert!((t.progress() - 0.5).abs() < 1e-9);

        // Index moves again before the fade to f[1] completes.
        assert!(t.retarget(f[2].clone()));
        assert_eq!(t.outgoing(), &f[1]);
        assert_eq!(t.incoming(), Some(&f[2]));
        assert_eq!(t.progress(), 0.0);

        // The interrupted f[1] is never faded to; the ramp runs toward f[2].
        for _ in 0..4 {
            t.step(1.0);
        }
        assert_eq!(t.outgoing(), &f[2]);
        assert!(!t.in_flight());
    }

    #[test]
    fn test_mid_ramp_retarget_back_to_outgoing_cancels_fade() {
        let f = frames(2);
        let mut t = Transition::new(f[0].clone(), &config(4));
        t.retarget(f[1].clone());
        t.step(1.0);
        assert!(t.in_flight());

        // The frame on screen is the target again; nothing to fade to.
        assert!(!t.retarget(f[0].clone()));
        assert!(!t.in_flight());
        assert_eq!(t.outgoing(), &f[0]);
        assert_eq!(t.step(1.0), StepOutcome::Idle);
        assert_eq!(
            t.blend(1.0),
            Blend {
                outgoing: (f[0].clone(), 1.0),
                incoming: None
            }
        );
    }

    #[test]
    fn test_mid_ramp_retarget_to_same_target_restarts() {
        let f = frames(2);
        let mut t = Transition::new(f[0].clone(), &config(4));
        t.retarget(f[1].clone());
        t.step(1.0);
        assert!(t.progress() > 0.0);

        assert!(t.retarget(f[1].clone()));
        assert_eq!(t.outgoing(), &f[0]);
        assert_eq!(t.incoming(), Some(&f[1]));
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn test_step_interval_divides_duration() {
        let config = TransitionConfig {
            steps: 20,
            duration: Duration::from_millis(250),
        };
        assert_eq!(config.step_interval(), Duration::from_micros(12_500));
    }
}
