//! Windowed spawn and recycle scheduling around a moving reference index.

use std::collections::BTreeMap;

use glam::Vec2;
use hop_runner_core::{Event, Presentation, TileIndex, VisualHandle};
use rand::Rng;
use tracing::{debug, warn};

use crate::{pool::TilePool, sequence::TileSequence};

/// Filled tile that currently owns a positioned, visible visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveTile {
    handle: VisualHandle,
    position: Vec2,
}

impl ActiveTile {
    /// Visual borrowed from the pool.
    #[must_use]
    pub const fn handle(&self) -> VisualHandle {
        self.handle
    }

    /// World-space position the visual was placed at.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }
}

/// Owns the lane, the visual pool, and the set of spawned tiles.
#[derive(Debug)]
pub struct TileStreamer<P, R> {
    sequence: TileSequence<R>,
    pool: TilePool,
    active: BTreeMap<TileIndex, ActiveTile>,
    generated_up_to: TileIndex,
    block_size: f32,
    presentation: P,
}

impl<P, R> TileStreamer<P, R>
where
    P: Presentation,
    R: Rng,
{
    /// Creates a streamer and spawns the initial window `0..=initial_frontier`.
    pub fn new(
        sequence: TileSequence<R>,
        presentation: P,
        block_size: f32,
        initial_frontier: Option<TileIndex>,
        out_events: &mut Vec<Event>,
    ) -> Self {
        let mut streamer = Self {
            sequence,
            pool: TilePool::new(),
            active: BTreeMap::new(),
            generated_up_to: TileIndex::BEFORE_ORIGIN,
            block_size,
            presentation,
        };
        if let Some(frontier) = initial_frontier {
            streamer.ensure_generated_up_to(frontier, out_events);
        }
        streamer
    }

    /// Draws and spawns every tile after the generated mark up to `index`.
    ///
    /// Calls with an index at or below the mark, or before the origin, do nothing.
    pub fn ensure_generated_up_to(&mut self, index: TileIndex, out_events: &mut Vec<Event>) {
        if index.is_negative() {
            warn!(%index, "ignoring generation request before the lane origin");
            return;
        }
        if index <= self.generated_up_to {
            return;
        }

        let mut next = self.generated_up_to.offset(1);
        while next <= index {
            let Ok(state) = self.sequence.state_at(next) else {
                break;
            };
            if state.is_filled() {
                self.spawn(next, out_events);
            }
            self.generated_up_to = next;
            next = next.offset(1);
        }
        debug!(
            generated_up_to = %self.generated_up_to,
            active = self.active.len(),
            "lane generated"
        );
    }

    /// Extends the window `ahead` tiles past `reference` and recycles every
    /// tile more than `behind` tiles before it.
    pub fn advance(
        &mut self,
        reference: TileIndex,
        ahead: u32,
        behind: u32,
        out_events: &mut Vec<Event>,
    ) {
        self.ensure_generated_up_to(reference.offset(i64::from(ahead)), out_events);

        let threshold = reference.offset(-i64::from(behind));
        let retained = self.active.split_off(&threshold);
        let expired = std::mem::replace(&mut self.active, retained);
        if !expired.is_empty() {
            debug!(%threshold, recycled = expired.len(), "lane recycled");
        }
        for (index, tile) in expired {
            self.recycle(index, tile, out_events);
        }
    }

    /// Recycles every active tile and destroys all pooled visuals.
    pub fn teardown(&mut self, out_events: &mut Vec<Event>) {
        let remaining = std::mem::take(&mut self.active);
        for (index, tile) in remaining {
            self.recycle(index, tile, out_events);
        }
        let count = self.pool.teardown(&mut self.presentation);
        out_events.push(Event::VisualsDestroyed { count });
    }

    fn spawn(&mut self, index: TileIndex, out_events: &mut Vec<Event>) {
        if self.active.contains_key(&index) {
            return;
        }
        let handle = self.pool.acquire(&mut self.presentation);
        let position = index.world_position(self.block_size);
        self.presentation.position_visual(handle, position);
        self.presentation.set_visual_active(handle, true);
        let _ = self.active.insert(index, ActiveTile { handle, position });
        out_events.push(Event::TileSpawned { index, handle });
    }

    fn recycle(&mut self, index: TileIndex, tile: ActiveTile, out_events: &mut Vec<Event>) {
        self.presentation.set_visual_active(tile.handle, false);
        self.pool.release(tile.handle);
        out_events.push(Event::TileRecycled {
            index,
            handle: tile.handle,
        });
    }
}

impl<P, R> TileStreamer<P, R> {
    /// Reports whether `index` has been drawn as filled. Never draws new tiles.
    #[must_use]
    pub fn is_filled_at(&self, index: TileIndex) -> bool {
        self.sequence
            .get(index)
            .map_or(false, |state| state.is_filled())
    }

    /// Highest index the streamer has processed for spawning.
    #[must_use]
    pub fn generated_up_to(&self) -> TileIndex {
        self.generated_up_to
    }

    /// Active tile spawned at `index`, if any.
    #[must_use]
    pub fn active_tile(&self, index: TileIndex) -> Option<&ActiveTile> {
        self.active.get(&index)
    }

    /// Active tiles in ascending index order.
    pub fn active_tiles(&self) -> impl Iterator<Item = (TileIndex, &ActiveTile)> {
        self.active.iter().map(|(index, tile)| (*index, tile))
    }

    /// Number of tiles currently spawned.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Lane backing the streamer.
    #[must_use]
    pub fn sequence(&self) -> &TileSequence<R> {
        &self.sequence
    }

    /// Pool lending visuals to active tiles.
    #[must_use]
    pub fn pool(&self) -> &TilePool {
        &self.pool
    }

    /// Presentation port driven by the streamer.
    #[must_use]
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Size of a tile in world units.
    #[must_use]
    pub fn block_size(&self) -> f32 {
        self.block_size
    }
}
