//! Reusable pool of tile visuals.

use hop_runner_core::{Presentation, VisualHandle};

/// Free list of visual handles backed by the presentation port.
///
/// Handles are constructed only when the free list is empty, so the number of
/// constructed visuals is bounded by the peak number of tiles borrowed at once.
#[derive(Debug, Default)]
pub struct TilePool {
    free: Vec<VisualHandle>,
    live: usize,
    constructed: usize,
}

impl TilePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows a free handle, constructing a new visual when none is available.
    pub fn acquire<P: Presentation>(&mut self, presentation: &mut P) -> VisualHandle {
        if let Some(handle) = self.free.pop() {
            return handle;
        }
        self.live += 1;
        self.constructed += 1;
        presentation.spawn_visual()
    }

    /// Returns a borrowed handle to the free list.
    ///
    /// The caller must not use `handle` again until it is re-acquired.
    pub fn release(&mut self, handle: VisualHandle) {
        debug_assert!(
            !self.free.contains(&handle),
            "visual {handle:?} released twice"
        );
        self.free.push(handle);
    }

    /// Number of visuals constructed over the pool's lifetime.
    ///
    /// Teardown does not reset this count.
    #[must_use]
    pub fn constructed(&self) -> usize {
        self.constructed
    }

    /// Number of handles waiting for reuse.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Number of handles currently lent out.
    #[must_use]
    pub fn borrowed_len(&self) -> usize {
        self.live - self.free.len()
    }

    /// Destroys every live visual and forgets all handles.
    ///
    /// Returns the number of visuals that existed before teardown.
    pub fn teardown<P: Presentation>(&mut self, presentation: &mut P) -> usize {
        let count = std::mem::take(&mut self.live);
        if count > 0 {
            presentation.destroy_all_visuals();
        }
        self.free.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Default)]
    struct Counter {
        spawned: u32,
        destroyed: u32,
    }

    impl Presentation for Counter {
        fn spawn_visual(&mut self) -> VisualHandle {
            self.spawned += 1;
            VisualHandle::new(self.spawned)
        }

        fn position_visual(&mut self, _handle: VisualHandle, _coordinate: Vec2) {}

        fn set_visual_active(&mut self, _handle: VisualHandle, _active: bool) {}

        fn destroy_all_visuals(&mut self) {
            self.destroyed += 1;
        }
    }

    #[test]
    fn released_handles_are_reused_before_constructing() {
        let mut presentation = Counter::default();
        let mut pool = TilePool::new();

        let first = pool.acquire(&mut presentation);
        let second = pool.acquire(&mut presentation);
        assert_ne!(first, second);
        assert_eq!(pool.constructed(), 2);

        pool.release(first);
        assert_eq!(pool.free_len(), 1);
        assert_eq!(pool.borrowed_len(), 1);

        let reused = pool.acquire(&mut presentation);
        assert_eq!(reused, first);
        assert_eq!(presentation.spawned, 2, "no construction while free handles exist");
    }

    #[test]
    fn teardown_destroys_visuals_once() {
        let mut presentation = Counter::default();
        let mut pool = TilePool::new();
        let handle = pool.acquire(&mut presentation);
        let _ = pool.acquire(&mut presentation);
        pool.release(handle);

        assert_eq!(pool.teardown(&mut presentation), 2);
        assert_eq!(presentation.destroyed, 1);
        assert_eq!(pool.constructed(), 2, "lifetime count survives teardown");
        assert_eq!(pool.free_len(), 0);
        assert_eq!(pool.borrowed_len(), 0);

        assert_eq!(pool.teardown(&mut presentation), 0);
        assert_eq!(presentation.destroyed, 1, "empty pool has nothing to destroy");
    }
}
