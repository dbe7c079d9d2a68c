#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic traversal system that turns player input into discrete jumps.
//!
//! The player stands on a settled tile until an input requests a one or two
//! tile jump. The jump's destination is generated before the move begins so the
//! landing can always be validated once the move completes.

use std::time::Duration;

use glam::Vec2;
use hop_runner_core::{
    Command, Event, InputEvent, LaneConfig, StepAnimator, StepSelector, TileIndex,
};
use tracing::{debug, info};

/// Configuration parameters required to construct the traversal system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    block_size: f32,
    move_duration: Duration,
}

impl Config {
    /// Creates a new configuration from a tile size and jump duration.
    #[must_use]
    pub const fn new(block_size: f32, move_duration: Duration) -> Self {
        Self {
            block_size,
            move_duration,
        }
    }

    /// Extracts the traversal tunables from a lane configuration.
    #[must_use]
    pub fn from_lane(config: &LaneConfig) -> Self {
        Self::new(config.block_size, config.move_duration())
    }
}

/// Coarse phase of the traversal state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Standing on a settled tile and accepting input.
    Idle,
    /// A timed move is in flight.
    MidJump,
    /// The player landed on a gap; input is ignored forever.
    Fallen,
}

/// Outcome of a completed move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Landing {
    /// The destination was ground and became the settled tile.
    Settled {
        /// New settled index.
        index: TileIndex,
    },
    /// The destination was a gap and the run is over.
    Fell {
        /// Index the player fell through.
        index: TileIndex,
    },
}

/// Move currently in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Jump {
    from: TileIndex,
    target: TileIndex,
    step: StepSelector,
    elapsed: Duration,
}

impl Jump {
    /// Settled tile the jump started from.
    #[must_use]
    pub const fn from(&self) -> TileIndex {
        self.from
    }

    /// Destination tile validated on completion.
    #[must_use]
    pub const fn target(&self) -> TileIndex {
        self.target
    }

    /// Jump length selected by the input.
    #[must_use]
    pub const fn step(&self) -> StepSelector {
        self.step
    }

    /// Simulated time accumulated since the jump started.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Idle,
    MidJump(Jump),
    Fallen { index: TileIndex },
}

/// Pure system that drives the player's discrete jumps along the lane.
#[derive(Debug)]
pub struct PlayerTraversal {
    config: Config,
    current_index: TileIndex,
    position: Vec2,
    state: State,
}

impl PlayerTraversal {
    /// Creates an idle traversal standing on `start`.
    #[must_use]
    pub fn new(config: Config, start: TileIndex) -> Self {
        Self {
            position: start.world_position(config.block_size),
            config,
            current_index: start,
            state: State::Idle,
        }
    }

    /// Handles a single input event, starting a jump when idle.
    ///
    /// The generation command for the destination is pushed before the move
    /// begins. The driver must apply it to the world before the next
    /// [`handle`](Self::handle) call: an undrawn destination reads as a gap and
    /// the jump ends in a fall. Returns whether a jump started.
    pub fn handle_input<A>(
        &mut self,
        input: InputEvent,
        animator: &mut A,
        out: &mut Vec<Command>,
    ) -> bool
    where
        A: StepAnimator,
    {
        if self.state != State::Idle {
            debug!(button = ?input.button, "input dropped while not idle");
            return false;
        }
        let Some(step) = input.button.step() else {
            return false;
        };

        let target = self.current_index.offset(step.step_count());
        out.push(Command::EnsureGeneratedUpTo { index: target });
        self.state = State::MidJump(Jump {
            from: self.current_index,
            target,
            step,
            elapsed: Duration::ZERO,
        });
        animator.play_step(step.animation());
        debug!(from = %self.current_index, %target, "jump started");
        true
    }

    /// Advances an in-flight jump by the simulated time carried in `events`.
    ///
    /// Once the accumulated time reaches the move duration the landing tile is
    /// validated through `is_ground_at_index` exactly once.
    pub fn handle<F>(&mut self, events: &[Event], is_ground_at_index: F) -> Option<Landing>
    where
        F: Fn(TileIndex) -> bool,
    {
        let State::MidJump(mut jump) = self.state else {
            return None;
        };

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }
        if accumulated.is_zero() {
            return None;
        }

        jump.elapsed = jump.elapsed.saturating_add(accumulated);
        if jump.elapsed < self.config.move_duration {
            let progress = jump.elapsed.as_secs_f32() / self.config.move_duration.as_secs_f32();
            self.position = self.world_position(jump.from).lerp(
                self.world_position(jump.target),
                progress,
            );
            self.state = State::MidJump(jump);
            return None;
        }

        Some(self.land(jump.target, is_ground_at_index(jump.target)))
    }

    fn land(&mut self, target: TileIndex, grounded: bool) -> Landing {
        self.position = self.world_position(target);
        if grounded {
            self.current_index = target;
            self.state = State::Idle;
            debug!(index = %target, "landed");
            Landing::Settled { index: target }
        } else {
            self.state = State::Fallen { index: target };
            info!(index = %target, "game over: no ground at landing index");
            Landing::Fell { index: target }
        }
    }

    fn world_position(&self, index: TileIndex) -> Vec2 {
        index.world_position(self.config.block_size)
    }

    /// Last tile the player settled on.
    #[must_use]
    pub fn current_index(&self) -> TileIndex {
        self.current_index
    }

    /// World-space position of the player, interpolated while mid jump.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Coarse phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::MidJump(_) => Phase::MidJump,
            State::Fallen { .. } => Phase::Fallen,
        }
    }

    /// Jump currently in flight, if any.
    #[must_use]
    pub fn jump(&self) -> Option<Jump> {
        match self.state {
            State::MidJump(jump) => Some(jump),
            _ => None,
        }
    }

    /// Destination of the jump in flight, if any.
    #[must_use]
    pub fn pending_target(&self) -> Option<TileIndex> {
        self.jump().map(|jump| jump.target)
    }

    /// Index the player fell through, once the run has ended.
    #[must_use]
    pub fn fallen_at(&self) -> Option<TileIndex> {
        match self.state {
            State::Fallen { index } => Some(index),
            _ => None,
        }
    }
}
