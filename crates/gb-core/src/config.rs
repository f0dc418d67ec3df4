//! System configuration

use crate::clock::DMG_CLOCK_HZ;

/// How emulated time relates to wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Run as fast as the host allows
    #[default]
    Unthrottled,
    /// Sleep to hold the emulated clock at `clock_hz`
    Realtime { clock_hz: u64 },
}

impl Pacing {
    /// Real-time pacing at the DMG clock rate
    pub fn realtime() -> Self {
        Pacing::Realtime {
            clock_hz: DMG_CLOCK_HZ,
        }
    }
}

/// What the driver does when the CPU fetches an opcode with no handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnimplementedPolicy {
    /// Stop and return the error
    #[default]
    Halt,
    /// Log a warning and continue as a 4-clock no-op
    Skip,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemConfig {
    pub pacing: Pacing,
    pub unimplemented: UnimplementedPolicy,
    /// Emit a trace line and register dump per instruction
    pub trace: bool,
}
