use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    /// Cubic ease-in-out.
    #[default]
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// How elapsed time maps onto progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemporalMode {
    /// Runs once and stops at the target.
    #[default]
    Once,
    /// Runs out and back every duration, forever.
    PingPong,
    /// Restarts every duration, forever.
    Repeat,
}

/// Normalised progress for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Eased progress within the current cycle, in [0, 1].
    pub eased: f64,
    /// Completed cycles (repeat mode only).
    pub cycles: f64,
    pub finished: bool,
}

impl Progress {
    /// Progress for a field; angles keep counting across repeat cycles.
    pub fn for_field(&self, angular: bool) -> f64 {
        if angular {
            self.cycles + self.eased
        } else {
            self.eased
        }
    }
}

impl TemporalMode {
    pub fn progress(self, elapsed: f64, duration: f64, easing: Easing) -> Progress {
        let elapsed = elapsed.max(0.0);
        match self {
            Self::Once => {
                let t = (elapsed / duration).clamp(0.0, 1.0);
                Progress {
                    eased: easing.apply(t),
                    cycles: 0.0,
                    finished: elapsed >= duration,
                }
            }
            Self::PingPong => {
                let phase = (elapsed % duration) / duration;
                let t = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
                Progress {
                    eased: easing.apply(t),
                    cycles: 0.0,
                    finished: false,
                }
            }
            Self::Repeat => Progress {
                eased: easing.apply((elapsed % duration) / duration),
                cycles: (elapsed / duration).floor(),
                finished: false,
            },
        }
    }
}
