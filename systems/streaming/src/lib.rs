#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic streaming system that keeps the spawn window around the player.

use hop_runner_core::{Command, Event, LaneConfig, TileIndex};

/// Configuration parameters required to construct the streaming system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    ahead_count: u32,
    behind_margin: u32,
}

impl Config {
    /// Creates a new configuration from the lookahead and recycle margin.
    #[must_use]
    pub const fn new(ahead_count: u32, behind_margin: u32) -> Self {
        Self {
            ahead_count,
            behind_margin,
        }
    }

    /// Extracts the streaming tunables from a lane configuration.
    #[must_use]
    pub const fn from_lane(config: &LaneConfig) -> Self {
        Self::new(config.ahead_count, config.behind_margin)
    }
}

/// Pure system that emits one window advance per observed tick.
#[derive(Debug)]
pub struct Streaming {
    config: Config,
}

impl Streaming {
    /// Creates a new streaming system using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes world events and the player's settled index to emit window commands.
    ///
    /// `settled_index` must be the last tile the player landed on, not the
    /// destination of a jump in flight.
    pub fn handle(&mut self, events: &[Event], settled_index: TileIndex, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        out.push(Command::AdvanceWindow {
            reference: settled_index,
            ahead: self.config.ahead_count,
            behind: self.config.behind_margin,
        });
    }
}
