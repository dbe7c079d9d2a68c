#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hop Runner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative lane world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Presentation and animation are
//! reached exclusively through the [`Presentation`] and [`StepAnimator`] ports.

use std::{fmt, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Guarantees that every tile up to and including `index` has been drawn and,
    /// when filled, spawned.
    EnsureGeneratedUpTo {
        /// Highest index that must be known after the command is applied.
        index: TileIndex,
    },
    /// Slides the spawn window around a reference index.
    AdvanceWindow {
        /// Index the window is anchored to, normally the player's settled tile.
        reference: TileIndex,
        /// Number of tiles generated ahead of the reference.
        ahead: u32,
        /// Number of tiles kept behind the reference before recycling.
        behind: u32,
    },
    /// Releases every active tile and destroys all pooled visuals.
    Teardown,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a filled tile received a visual and entered the window.
    TileSpawned {
        /// Index of the spawned tile.
        index: TileIndex,
        /// Pooled visual now borrowed by the tile.
        handle: VisualHandle,
    },
    /// Confirms that a tile left the window and returned its visual to the pool.
    TileRecycled {
        /// Index of the recycled tile.
        index: TileIndex,
        /// Visual handed back to the pool.
        handle: VisualHandle,
    },
    /// Reports that the pool destroyed every visual it ever constructed.
    VisualsDestroyed {
        /// Number of visuals that existed when teardown ran.
        count: usize,
    },
}

/// Position of a tile along the lane measured in whole tiles.
///
/// Index `0` is the lane origin. Negative values are representable so callers
/// can express out-of-range queries, but they are never generated.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileIndex(i64);

impl TileIndex {
    /// First tile of every lane.
    pub const ORIGIN: Self = Self(0);

    /// Sentinel reported before any tile has been generated.
    pub const BEFORE_ORIGIN: Self = Self(-1);

    /// Creates a new tile index wrapper.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Retrieves the underlying signed index.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Shifts the index by `delta` tiles, saturating at the numeric bounds.
    #[must_use]
    pub const fn offset(self, delta: i64) -> Self {
        Self(self.0.saturating_add(delta))
    }

    /// Reports whether the index lies before the lane origin.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// World-space coordinate of the tile along the lane axis.
    #[must_use]
    pub fn world_x(self, block_size: f32) -> f32 {
        self.0 as f32 * block_size
    }

    /// World-space position of the tile, with the perpendicular coordinate fixed at zero.
    #[must_use]
    pub fn world_position(self, block_size: f32) -> Vec2 {
        Vec2::new(self.world_x(block_size), 0.0)
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a tile can be stood on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Steppable ground.
    Filled,
    /// A gap; landing here ends the run.
    Empty,
}

impl TileState {
    /// Reports whether the tile is steppable.
    #[must_use]
    pub const fn is_filled(self) -> bool {
        matches!(self, Self::Filled)
    }
}

/// Opaque identifier of a visual instance owned by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u32);

impl VisualHandle {
    /// Creates a new visual handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Pointer buttons reported by the input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Usually the left mouse button.
    Primary,
    /// Usually the right mouse button.
    Secondary,
    /// Usually the wheel button; not mapped to a jump.
    Middle,
}

impl PointerButton {
    /// Maps the button onto the jump it requests, if any.
    #[must_use]
    pub const fn step(self) -> Option<StepSelector> {
        match self {
            Self::Primary => Some(StepSelector::One),
            Self::Secondary => Some(StepSelector::Two),
            Self::Middle => None,
        }
    }
}

/// Single input event delivered to the traversal handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputEvent {
    /// Button released by the player.
    pub button: PointerButton,
}

impl InputEvent {
    /// Creates an input event for the provided button.
    #[must_use]
    pub const fn new(button: PointerButton) -> Self {
        Self { button }
    }
}

/// Length of a single jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepSelector {
    /// Hop onto the next tile.
    One,
    /// Leap over the next tile.
    Two,
}

impl StepSelector {
    /// Number of tiles covered by the jump.
    #[must_use]
    pub const fn step_count(self) -> i64 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Animation clip played while the jump is in flight.
    #[must_use]
    pub const fn animation(self) -> StepAnimation {
        match self {
            Self::One => StepAnimation::OneStep,
            Self::Two => StepAnimation::TwoStep,
        }
    }
}

/// Body animation clips understood by the animation port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepAnimation {
    /// Clip for a one tile hop.
    OneStep,
    /// Clip for a two tile leap.
    TwoStep,
}

impl StepAnimation {
    /// Clip name as authored in the animation assets.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OneStep => "oneStep",
            Self::TwoStep => "twoStep",
        }
    }
}

/// Port through which the lane drives its tile visuals.
///
/// Construction through [`Presentation::spawn_visual`] is assumed to always
/// succeed; an implementation that cannot allocate should abort.
pub trait Presentation {
    /// Constructs a new, inactive visual instance.
    fn spawn_visual(&mut self) -> VisualHandle;

    /// Moves the visual to the provided world-space coordinate.
    fn position_visual(&mut self, handle: VisualHandle, coordinate: Vec2);

    /// Shows or hides the visual.
    fn set_visual_active(&mut self, handle: VisualHandle, active: bool);

    /// Destroys every visual ever spawned. Only used at teardown.
    fn destroy_all_visuals(&mut self);
}

/// Fire-and-forget port that plays the player's body animation.
pub trait StepAnimator {
    /// Starts the clip associated with the jump.
    fn play_step(&mut self, step: StepAnimation);
}

const DEFAULT_BLOCK_SIZE: f32 = 40.0;
const DEFAULT_INITIAL_LENGTH: u32 = 10;
const DEFAULT_AHEAD_COUNT: u32 = 10;
const DEFAULT_BEHIND_MARGIN: u32 = 2;
const DEFAULT_FILL_PROBABILITY: f64 = 0.7;
const DEFAULT_MOVE_DURATION_SECS: f32 = 1.0;

/// Tunables fixed at construction time for a single run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaneConfig {
    /// World units covered by a single tile.
    pub block_size: f32,
    /// Number of tiles drawn and spawned before the first tick.
    pub initial_length: u32,
    /// Tiles generated ahead of the player's settled index every tick.
    pub ahead_count: u32,
    /// Tiles kept behind the player's settled index before recycling.
    pub behind_margin: u32,
    /// Probability that a freshly drawn tile (other than the origin) is filled.
    pub fill_probability: f64,
    /// Duration of a single jump in seconds of simulated time.
    pub move_duration_secs: f32,
}

impl LaneConfig {
    /// Duration of a single jump.
    ///
    /// Callers should [`validate`](Self::validate) first; invalid values map to zero.
    #[must_use]
    pub fn move_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.move_duration_secs).unwrap_or(Duration::ZERO)
    }

    /// Index of the last tile seeded at start, or `None` when nothing is seeded.
    #[must_use]
    pub fn initial_frontier(&self) -> Option<TileIndex> {
        self.initial_length
            .checked_sub(1)
            .map(|last| TileIndex::new(i64::from(last)))
    }

    /// Checks that every tunable lies within its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.block_size.is_finite() || self.block_size <= 0.0 {
            return Err(ConfigError::BlockSize(self.block_size));
        }
        if !(0.0..=1.0).contains(&self.fill_probability) {
            return Err(ConfigError::FillProbability(self.fill_probability));
        }
        if !self.move_duration_secs.is_finite() || self.move_duration_secs <= 0.0 {
            return Err(ConfigError::MoveDuration(self.move_duration_secs));
        }
        Ok(())
    }
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            initial_length: DEFAULT_INITIAL_LENGTH,
            ahead_count: DEFAULT_AHEAD_COUNT,
            behind_margin: DEFAULT_BEHIND_MARGIN,
            fill_probability: DEFAULT_FILL_PROBABILITY,
            move_duration_secs: DEFAULT_MOVE_DURATION_SECS,
        }
    }
}

/// Reasons a [`LaneConfig`] may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Tiles must cover a positive, finite distance.
    #[error("block size must be positive and finite, got {0}")]
    BlockSize(f32),
    /// Probabilities live in `0.0..=1.0`.
    #[error("fill probability must lie within 0.0..=1.0, got {0}")]
    FillProbability(f64),
    /// Jumps must take a positive, finite amount of time.
    #[error("move duration must be positive and finite, got {0}s")]
    MoveDuration(f32),
}
