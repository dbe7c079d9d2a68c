//! Lazily extended, append-only lane of tile states.

use hop_runner_core::{TileIndex, TileState};
use rand::{distributions::Bernoulli, Rng};

use crate::SequenceError;

/// Infinite lane of tile states, drawn on demand from an injected generator.
///
/// States are dense from the origin upward and never change once drawn. The
/// origin is always filled so every run starts on solid ground.
#[derive(Debug)]
pub struct TileSequence<R> {
    states: Vec<TileState>,
    fill: Bernoulli,
    rng: R,
}

impl<R: Rng> TileSequence<R> {
    /// Creates an empty sequence that fills tiles with the provided probability.
    pub fn new(fill_probability: f64, rng: R) -> Result<Self, SequenceError> {
        let fill = Bernoulli::new(fill_probability)
            .map_err(|_| SequenceError::InvalidProbability(fill_probability))?;
        Ok(Self {
            states: Vec::new(),
            fill,
            rng,
        })
    }

    /// Returns the state at `index`, drawing every missing tile up to it first.
    ///
    /// Each tile is drawn independently exactly once; repeated queries return
    /// the stored state.
    pub fn state_at(&mut self, index: TileIndex) -> Result<TileState, SequenceError> {
        let position = slot(index).ok_or(SequenceError::InvalidIndex(index))?;
        while self.states.len() <= position {
            let next = if self.states.is_empty() {
                TileState::Filled
            } else if self.rng.sample(self.fill) {
                TileState::Filled
            } else {
                TileState::Empty
            };
            self.states.push(next);
        }
        Ok(self.states[position])
    }
}

impl<R> TileSequence<R> {
    /// Returns the state at `index` without drawing anything new.
    #[must_use]
    pub fn get(&self, index: TileIndex) -> Option<TileState> {
        slot(index).and_then(|position| self.states.get(position).copied())
    }

    /// Highest drawn index, or [`TileIndex::BEFORE_ORIGIN`] when nothing was drawn yet.
    #[must_use]
    pub fn frontier(&self) -> TileIndex {
        TileIndex::new(self.states.len() as i64 - 1)
    }

    /// Number of drawn tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Reports whether no tile has been drawn yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn slot(index: TileIndex) -> Option<usize> {
    usize::try_from(index.get()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sequence(probability: f64, seed: u64) -> TileSequence<ChaCha8Rng> {
        TileSequence::new(probability, ChaCha8Rng::seed_from_u64(seed)).expect("valid probability")
    }

    #[test]
    fn starts_before_origin() {
        let lane = sequence(0.7, 1);
        assert!(lane.is_empty());
        assert_eq!(lane.frontier(), TileIndex::BEFORE_ORIGIN);
    }

    #[test]
    fn origin_is_filled_even_when_nothing_else_can_be() {
        let mut lane = sequence(0.0, 9);
        assert_eq!(lane.state_at(TileIndex::ORIGIN), Ok(TileState::Filled));
        assert_eq!(lane.state_at(TileIndex::new(5)), Ok(TileState::Empty));
    }

    #[test]
    fn querying_far_ahead_fills_every_gap() {
        let mut lane = sequence(0.7, 3);
        let _ = lane.state_at(TileIndex::new(41)).expect("non-negative index");
        assert_eq!(lane.len(), 42);
        assert_eq!(lane.frontier(), TileIndex::new(41));
        for raw in 0..=41 {
            assert!(lane.get(TileIndex::new(raw)).is_some(), "gap at {raw}");
        }
    }

    #[test]
    fn drawn_states_survive_extending_the_lane() {
        let mut lane = sequence(0.7, 11);
        let before: Vec<TileState> = (0..=20)
            .map(|raw| lane.state_at(TileIndex::new(raw)).expect("non-negative index"))
            .collect();

        let _ = lane.state_at(TileIndex::new(2000)).expect("non-negative index");
        assert_eq!(lane.len(), 2001);

        for (raw, expected) in (0..=20).zip(before) {
            let index = TileIndex::new(raw);
            assert_eq!(lane.state_at(index), Ok(expected), "state at {raw} changed");
            assert_eq!(lane.get(index), Some(expected));
        }
        assert_eq!(lane.len(), 2001, "requery draws nothing");
    }

    #[test]
    fn get_never_draws() {
        let lane = sequence(0.7, 3);
        assert_eq!(lane.get(TileIndex::new(4)), None);
        assert!(lane.is_empty());
    }

    #[test]
    fn negative_index_is_rejected() {
        let mut lane = sequence(0.7, 3);
        let index = TileIndex::new(-1);
        assert_eq!(lane.state_at(index), Err(SequenceError::InvalidIndex(index)));
        assert!(lane.is_empty());
    }

    #[test]
    fn invalid_probability_is_rejected() {
        let result = TileSequence::new(1.2, ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(SequenceError::InvalidProbability(probability)) if (probability - 1.2).abs() < f64::EPSILON
        ));
    }
}
