#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative lane state management for Hop Runner.

mod pool;
mod sequence;
mod streamer;

use std::time::Duration;

use hop_runner_core::{Command, ConfigError, Event, LaneConfig, Presentation, TileIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use pool::TilePool;
pub use sequence::TileSequence;
pub use streamer::{ActiveTile, TileStreamer};

/// Generator used when a lane is built from a plain seed.
pub type DefaultRng = ChaCha8Rng;

/// Reasons the lane refused a request.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SequenceError {
    /// Tiles before the origin are never generated.
    #[error("tile index {0} lies before the lane origin")]
    InvalidIndex(TileIndex),
    /// The fill probability is not within `0.0..=1.0`.
    #[error("fill probability {0} is not a valid probability")]
    InvalidProbability(f64),
}

/// Failures raised while constructing a [`World`].
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The supplied configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The lane could not be built from the configuration.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Represents the authoritative Hop Runner lane state.
#[derive(Debug)]
pub struct World<P, R = DefaultRng> {
    config: LaneConfig,
    streamer: TileStreamer<P, R>,
    tick_index: u64,
    elapsed: Duration,
    torn_down: bool,
}

impl<P: Presentation> World<P> {
    /// Creates a world whose lane is drawn from a generator seeded with `seed`.
    ///
    /// Spawn events for the initial window are appended to `out_events`.
    pub fn new(
        config: LaneConfig,
        seed: u64,
        presentation: P,
        out_events: &mut Vec<Event>,
    ) -> Result<Self, WorldError> {
        Self::with_rng(
            config,
            DefaultRng::seed_from_u64(seed),
            presentation,
            out_events,
        )
    }
}

impl<P: Presentation, R: Rng> World<P, R> {
    /// Creates a world that draws its lane from the injected generator.
    pub fn with_rng(
        config: LaneConfig,
        rng: R,
        presentation: P,
        out_events: &mut Vec<Event>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let sequence = TileSequence::new(config.fill_probability, rng)?;
        let streamer = TileStreamer::new(
            sequence,
            presentation,
            config.block_size,
            config.initial_frontier(),
            out_events,
        );
        info!(
            initial_length = config.initial_length,
            block_size = config.block_size,
            "lane seeded"
        );
        Ok(Self {
            config,
            streamer,
            tick_index: 0,
            elapsed: Duration::ZERO,
            torn_down: false,
        })
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply<P, R>(world: &mut World<P, R>, command: Command, out_events: &mut Vec<Event>)
where
    P: Presentation,
    R: Rng,
{
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::EnsureGeneratedUpTo { index } => {
            if world.torn_down {
                warn!(%index, "generation requested after teardown");
                return;
            }
            world.streamer.ensure_generated_up_to(index, out_events);
        }
        Command::AdvanceWindow {
            reference,
            ahead,
            behind,
        } => {
            if world.torn_down {
                return;
            }
            world
                .streamer
                .advance(reference, ahead, behind, out_events);
        }
        Command::Teardown => {
            if world.torn_down {
                return;
            }
            world.streamer.teardown(out_events);
            world.torn_down = true;
            debug!(generated = world.streamer.sequence().len(), "lane torn down");
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use hop_runner_core::{LaneConfig, TileIndex, VisualHandle};

    use super::World;

    /// Reports whether the tile at `index` was drawn as filled.
    ///
    /// Tiles outside the drawn range answer `false`; the lane is never extended.
    #[must_use]
    pub fn is_ground_at_index<P, R>(world: &World<P, R>, index: TileIndex) -> bool {
        world.streamer.is_filled_at(index)
    }

    /// Number of tiles drawn so far, reported for diagnostics.
    #[must_use]
    pub fn generated_length<P, R>(world: &World<P, R>) -> usize {
        world.streamer.sequence().len()
    }

    /// Highest drawn index, or [`TileIndex::BEFORE_ORIGIN`] before the first draw.
    #[must_use]
    pub fn frontier<P, R>(world: &World<P, R>) -> TileIndex {
        world.streamer.sequence().frontier()
    }

    /// Highest index processed for spawning.
    #[must_use]
    pub fn generated_up_to<P, R>(world: &World<P, R>) -> TileIndex {
        world.streamer.generated_up_to()
    }

    /// Captures a read-only view of the spawned tiles.
    #[must_use]
    pub fn active_tiles<P, R>(world: &World<P, R>) -> ActiveTileView {
        let snapshots = world
            .streamer
            .active_tiles()
            .map(|(index, tile)| ActiveTileSnapshot {
                index,
                handle: tile.handle(),
                position: tile.position(),
            })
            .collect();
        ActiveTileView { snapshots }
    }

    /// Number of visuals the pool has constructed since start.
    #[must_use]
    pub fn allocated_visuals<P, R>(world: &World<P, R>) -> usize {
        world.streamer.pool().constructed()
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config<P, R>(world: &World<P, R>) -> &LaneConfig {
        &world.config
    }

    /// Number of ticks processed.
    #[must_use]
    pub fn tick_index<P, R>(world: &World<P, R>) -> u64 {
        world.tick_index
    }

    /// Total simulated time processed.
    #[must_use]
    pub fn elapsed<P, R>(world: &World<P, R>) -> Duration {
        world.elapsed
    }

    /// Presentation port owned by the world.
    #[must_use]
    pub fn presentation<P, R>(world: &World<P, R>) -> &P {
        world.streamer.presentation()
    }

    /// Reports whether the world released its visuals for good.
    #[must_use]
    pub fn is_torn_down<P, R>(world: &World<P, R>) -> bool {
        world.torn_down
    }

    /// Read-only snapshot of the spawned tiles in ascending index order.
    #[derive(Clone, Debug, Default)]
    pub struct ActiveTileView {
        snapshots: Vec<ActiveTileSnapshot>,
    }

    impl ActiveTileView {
        /// Iterator over the captured tiles.
        pub fn iter(&self) -> impl Iterator<Item = &ActiveTileSnapshot> {
            self.snapshots.iter()
        }

        /// Indices of the captured tiles.
        #[must_use]
        pub fn indices(&self) -> Vec<TileIndex> {
            self.snapshots.iter().map(|snapshot| snapshot.index).collect()
        }

        /// Number of captured tiles.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no tile is spawned.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ActiveTileSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single spawned tile.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ActiveTileSnapshot {
        /// Lane index of the tile.
        pub index: TileIndex,
        /// Visual borrowed by the tile.
        pub handle: VisualHandle,
        /// World-space position of the visual.
        pub position: Vec2,
    }
}
