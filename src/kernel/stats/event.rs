use serde::Serialize;
use crate::kernel::channel::{ChannelKind, JointGroup};
use crate::kernel::convergence::MoveOutcome;

// Allowed: kinds, indices, durations, outcomes.
// Sensor values never go in here.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LinkEvent {
    Ingested {
        kind: ChannelKind,
    },

    /// Malformed frame or unrecognized kind.
    FrameDropped,

    CommandSent {
        command: &'static str,
    },

    /// Outbound queue full or transport gone.
    CommandDropped {
        command: &'static str,
    },

    QueryResolved {
        kind: ChannelKind,
        latency_ms: u64,
    },

    QueryNoData {
        kind: ChannelKind,
    },

    QueryCanceled {
        kind: ChannelKind,
    },

    MoveFinished {
        group: JointGroup,
        joint: u8,
        outcome: MoveOutcome,
        elapsed_ms: u64,
    },
}
