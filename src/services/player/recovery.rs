//! Failure classification per backend.
//!
//! Engines already retry short network blips on their own; the controller
//! only acts when an engine reports something it gave up on.
//!
//! | backend | error                   | verdict                         |
//! |---------|-------------------------|---------------------------------|
//! | DASH    | any                     | fatal                           |
//! | TS/FLV  | network                 | fatal                           |
//! | TS/FLV  | other                   | ignored                         |
//! | HLS     | non-fatal               | ignored                         |
//! | HLS     | fatal network           | resume loading                  |
//! | HLS     | fatal media             | media error recovery            |
//! | HLS     | other fatal             | fatal, "Stream Connection Failed" |
//! | native  | any element error       | fatal                           |

use crate::error::PlaybackFailure;
use crate::models::{ErrorClass, ErrorReport, Protocol, RecoveryAction};

pub const DASH_FAILURE: &str = "DASH Playback Error";
pub const MPEGTS_FAILURE: &str = "Stream Network Error";
pub const HLS_FAILURE: &str = "Stream Connection Failed";
pub const NATIVE_FAILURE: &str = "Format not supported or offline";

/// What the controller does with a backend error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Log and leave it to the engine
    Ignore,
    /// Absorb with a local recovery action; the session stays active
    Recover(RecoveryAction),
    /// End the session and escalate after the fixed delay
    Fatal(PlaybackFailure),
}

pub fn classify(protocol: Protocol, report: &ErrorReport) -> Verdict {
    match protocol {
        Protocol::Dash => Verdict::Fatal(PlaybackFailure::stream(DASH_FAILURE)),

        Protocol::MpegTsFlv => match report.class {
            ErrorClass::Network => Verdict::Fatal(PlaybackFailure::stream(MPEGTS_FAILURE)),
            _ => Verdict::Ignore,
        },

        Protocol::Hls if !report.fatal => Verdict::Ignore,
        Protocol::Hls => match report.class {
            ErrorClass::Network => Verdict::Recover(RecoveryAction::ResumeLoading),
            ErrorClass::Media => Verdict::Recover(RecoveryAction::RecoverMedia),
            ErrorClass::Other => Verdict::Fatal(PlaybackFailure::stream(HLS_FAILURE)),
        },

        Protocol::Native => Verdict::Fatal(PlaybackFailure::stream(NATIVE_FAILURE)),
    }
}
