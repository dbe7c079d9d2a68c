use std::time::Duration;

use glam::Vec2;
use hop_runner_core::{
    Command, Event, InputEvent, LaneConfig, PointerButton, Presentation, StepAnimation,
    StepAnimator, TileIndex, VisualHandle,
};
use hop_runner_system_streaming::{Config as StreamingConfig, Streaming};
use hop_runner_system_traversal::{Config as TraversalConfig, Landing, PlayerTraversal};
use hop_runner_world::{self as world, query, World};

#[derive(Debug, Default)]
struct CountingPresentation {
    spawned: u32,
}

impl Presentation for CountingPresentation {
    fn spawn_visual(&mut self) -> VisualHandle {
        self.spawned += 1;
        VisualHandle::new(self.spawned)
    }

    fn position_visual(&mut self, _handle: VisualHandle, _coordinate: Vec2) {}

    fn set_visual_active(&mut self, _handle: VisualHandle, _active: bool) {}

    fn destroy_all_visuals(&mut self) {}
}

struct Silent;

impl StepAnimator for Silent {
    fn play_step(&mut self, _step: StepAnimation) {}
}

struct Harness {
    world: World<CountingPresentation>,
    traversal: PlayerTraversal,
    streaming: Streaming,
}

impl Harness {
    fn new(start: i64) -> Self {
        let config = LaneConfig {
            fill_probability: 1.0,
            ..LaneConfig::default()
        };
        let mut events = Vec::new();
        let world = World::new(config.clone(), 0, CountingPresentation::default(), &mut events)
            .expect("valid config");
        Self {
            world,
            traversal: PlayerTraversal::new(
                TraversalConfig::from_lane(&config),
                TileIndex::new(start),
            ),
            streaming: Streaming::new(StreamingConfig::from_lane(&config)),
        }
    }

    fn press(&mut self, button: PointerButton) {
        let mut commands = Vec::new();
        let _ = self
            .traversal
            .handle_input(InputEvent::new(button), &mut Silent, &mut commands);
        self.apply(commands);
    }

    fn tick(&mut self, dt: Duration) -> Option<Landing> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let world = &self.world;
        let landing = self
            .traversal
            .handle(&events, |index| query::is_ground_at_index(world, index));

        let mut commands = Vec::new();
        self.streaming
            .handle(&events, self.traversal.current_index(), &mut commands);
        self.apply(commands);
        landing
    }

    fn apply(&mut self, commands: Vec<Command>) {
        let mut events: Vec<Event> = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
    }

    fn lowest_active(&self) -> Option<TileIndex> {
        query::active_tiles(&self.world).indices().first().copied()
    }
}

#[test]
fn window_tracks_the_settled_index_during_a_jump() {
    let mut harness = Harness::new(3);
    let _ = harness.tick(Duration::from_millis(100));
    assert_eq!(harness.lowest_active(), Some(TileIndex::new(1)));
    assert_eq!(query::generated_up_to(&harness.world), TileIndex::new(13));

    harness.press(PointerButton::Secondary);
    for _ in 0..4 {
        assert_eq!(harness.tick(Duration::from_millis(200)), None);
        assert_eq!(
            harness.lowest_active(),
            Some(TileIndex::new(1)),
            "window must not follow the in-flight destination"
        );
        assert_eq!(query::generated_up_to(&harness.world), TileIndex::new(13));
    }

    let landing = harness.tick(Duration::from_millis(200));
    assert_eq!(
        landing,
        Some(Landing::Settled {
            index: TileIndex::new(5)
        })
    );
    assert_eq!(harness.lowest_active(), Some(TileIndex::new(3)));
    assert_eq!(query::generated_up_to(&harness.world), TileIndex::new(15));
}

#[test]
fn long_run_allocations_stay_bounded() {
    let mut harness = Harness::new(0);
    for _ in 0..200 {
        harness.press(PointerButton::Primary);
        let mut landing = None;
        while landing.is_none() {
            landing = harness.tick(Duration::from_millis(250));
        }
    }

    assert_eq!(harness.traversal.current_index(), TileIndex::new(200));
    assert!(
        query::allocated_visuals(&harness.world) <= 10 + 2 + 2,
        "visuals are reused rather than reallocated"
    );
    assert_eq!(
        query::presentation(&harness.world).spawned as usize,
        query::allocated_visuals(&harness.world)
    );
}
