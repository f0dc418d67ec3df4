//! Wall-clock pacing
//!
//! The [`Pacer`] counts emulated clock units and, once per frame's worth of them,
//! sleeps off any lead the emulation has over real time.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::Pacing;
use crate::ppu::FRAME_CYCLES;

/// DMG master clock rate in clock units per second
pub const DMG_CLOCK_HZ: u64 = 4_194_304;

/// Clock units between wall-clock checks
pub const SYNC_INTERVAL: u64 = FRAME_CYCLES as u64;

#[derive(Debug, Clone)]
pub struct Pacer {
    clock_hz: Option<u64>,
    start: Instant,
    emulated: u64,
    since_sync: u64,
}

impl Pacer {
    pub fn new(pacing: Pacing) -> Self {
        let clock_hz = match pacing {
            Pacing::Unthrottled => None,
            Pacing::Realtime { clock_hz } => Some(clock_hz.max(1)),
        };
        Self {
            clock_hz,
            start: Instant::now(),
            emulated: 0,
            since_sync: 0,
        }
    }

    /// Total clock units accounted so far
    pub fn emulated_cycles(&self) -> u64 {
        self.emulated
    }

    /// Wall-clock time the emulated cycles should have taken, `None` if unthrottled
    pub fn target_elapsed(&self) -> Option<Duration> {
        self.clock_hz
            .map(|hz| Duration::from_secs_f64(self.emulated as f64 / hz as f64))
    }

    /// Account elapsed clock units, sleeping at frame boundaries if ahead
    pub fn advance(&mut self, cycles: u32) {
        self.emulated += cycles as u64;
        self.since_sync += cycles as u64;
        if self.since_sync >= SYNC_INTERVAL {
            self.since_sync %= SYNC_INTERVAL;
            self.sync();
        }
    }

    fn sync(&self) {
        if let Some(target) = self.target_elapsed() {
            let elapsed = self.start.elapsed();
            if target > elapsed {
                thread::sleep(target - elapsed);
            }
        }
    }
}
