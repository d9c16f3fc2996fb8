//! Loop policy: what happens when the clock runs past the end of the timeline.

use serde::{Deserialize, Serialize};

/// How playback wraps once the timeline end is exceeded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Jump back to time 0.
    #[default]
    Restart,
    /// Declared for hosts that set it; wraps exactly like `Restart`.
    Reverse,
}

/// Outcome of one loop evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopDecision {
    /// Still inside the timeline.
    Continue,
    /// Wrap to time 0 and keep playing with this many repeats left.
    WrapAndContinue(u32),
    /// Repeat budget exhausted; the play session ends.
    Stop,
}

/// Decide how to proceed at `position` on a timeline ending at `end`.
///
/// Both arguments share a unit: seconds for dynamic playback, frame slots
/// for the frame cache. `repeat_count == -1` never stops.
pub fn evaluate(
    position: f64,
    end: f64,
    repeat_count: i32,
    repeat_mode: RepeatMode,
    remaining_repeats: u32,
) -> LoopDecision {
    if position <= end {
        return LoopDecision::Continue;
    }
    match repeat_mode {
        RepeatMode::Restart | RepeatMode::Reverse => {
            if repeat_count == -1 {
                LoopDecision::WrapAndContinue(remaining_repeats)
            } else if repeat_count > 0 && remaining_repeats > 0 {
                LoopDecision::WrapAndContinue(remaining_repeats - 1)
            } else {
                LoopDecision::Stop
            }
        }
    }
}
