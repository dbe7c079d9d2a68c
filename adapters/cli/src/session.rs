use std::{fmt, time::Duration};

use anyhow::{ensure, Context, Result};
use hop_runner_core::{Command, Event, InputEvent, LaneConfig, PointerButton, TileIndex};
use hop_runner_system_streaming::{Config as StreamingConfig, Streaming};
use hop_runner_system_traversal::{Config as TraversalConfig, Landing, Phase, PlayerTraversal};
use hop_runner_world::{self as world, query, World};
use tracing::info;

use crate::{
    headless::{HeadlessPresentation, LoggingAnimator},
    input::{InputBus, ScriptStep},
};

/// Headless run wiring the lane world, the systems, and the stand-in ports.
#[derive(Debug)]
pub(crate) struct Session {
    world: World<HeadlessPresentation>,
    traversal: PlayerTraversal,
    streaming: Streaming,
    input: InputBus,
    animator: LoggingAnimator,
    dt: Duration,
    events: Vec<Event>,
}

impl Session {
    /// Builds a session whose ticks each advance the clock by `dt`.
    pub(crate) fn new(config: LaneConfig, seed: u64, dt: Duration) -> Result<Self> {
        ensure!(!dt.is_zero(), "tick duration must be positive");

        let mut events = Vec::new();
        let world = World::new(
            config.clone(),
            seed,
            HeadlessPresentation::default(),
            &mut events,
        )
        .context("failed to seed the lane")?;
        info!(seed, "session started");

        Ok(Self {
            world,
            traversal: PlayerTraversal::new(TraversalConfig::from_lane(&config), TileIndex::ORIGIN),
            streaming: Streaming::new(StreamingConfig::from_lane(&config)),
            input: InputBus::subscribed(),
            animator: LoggingAnimator::default(),
            dt,
            events,
        })
    }

    /// Delivers a button release through the input bus. Returns whether a jump started.
    pub(crate) fn press(&mut self, button: PointerButton) -> bool {
        let Some(event) = self.input.dispatch(InputEvent::new(button)) else {
            return false;
        };
        let mut commands = Vec::new();
        let started = self
            .traversal
            .handle_input(event, &mut self.animator, &mut commands);
        self.apply(commands);
        if let Some(target) = self.traversal.pending_target() {
            debug_assert!(
                query::generated_up_to(&self.world) >= target,
                "destination {target} must be drawn before the jump advances"
            );
        }
        started
    }

    /// Runs a single tick: clock, traversal, then window streaming.
    pub(crate) fn tick(&mut self) -> Option<Landing> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt: self.dt }, &mut events);

        let world = &self.world;
        let landing = self
            .traversal
            .handle(&events, |index| query::is_ground_at_index(world, index));
        if let Some(Landing::Fell { index }) = landing {
            self.input.unsubscribe();
            info!(
                %index,
                ticks = query::tick_index(&self.world),
                generated = query::generated_length(&self.world),
                "run ended"
            );
        }

        let mut commands = Vec::new();
        self.streaming
            .handle(&events, self.traversal.current_index(), &mut commands);
        self.events.extend(events);
        self.apply(commands);
        landing
    }

    /// Plays the scripted steps until the script ends or the player falls.
    pub(crate) fn run_script(&mut self, steps: &[ScriptStep]) {
        for step in steps {
            if self.traversal.phase() == Phase::Fallen {
                break;
            }
            match *step {
                ScriptStep::Press(button) => {
                    if self.press(button) {
                        let _ = self.settle();
                    }
                }
                ScriptStep::Wait => {
                    let _ = self.tick();
                }
            }
        }
    }

    /// Jumps up to `jumps` times, preferring a hop whenever the next tile is ground.
    pub(crate) fn run_autopilot(&mut self, jumps: u32) {
        for _ in 0..jumps {
            if self.traversal.phase() == Phase::Fallen {
                break;
            }
            let next = self.traversal.current_index().offset(1);
            let button = if query::is_ground_at_index(&self.world, next) {
                PointerButton::Primary
            } else {
                PointerButton::Secondary
            };
            if self.press(button) {
                let _ = self.settle();
            }
        }
    }

    /// Tears the lane down and summarises the run.
    pub(crate) fn finish(mut self) -> RunReport {
        let visible_before_teardown = query::presentation(&self.world).visible_count();
        self.apply(vec![Command::Teardown]);

        RunReport {
            settled_index: self.traversal.current_index(),
            fallen_at: self.traversal.fallen_at(),
            ticks: query::tick_index(&self.world),
            generated_length: query::generated_length(&self.world),
            allocated_visuals: query::allocated_visuals(&self.world),
            visible_before_teardown,
            destroyed_visuals: query::presentation(&self.world).destroyed(),
            clips_played: self.animator.played(),
            input_attached: self.input.is_subscribed(),
            events_logged: self.events.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn events(&self) -> &[Event] {
        &self.events
    }

    fn settle(&mut self) -> Option<Landing> {
        while self.traversal.phase() == Phase::MidJump {
            if let Some(landing) = self.tick() {
                return Some(landing);
            }
        }
        None
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}

/// Summary printed once a headless run finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RunReport {
    pub(crate) settled_index: TileIndex,
    pub(crate) fallen_at: Option<TileIndex>,
    pub(crate) ticks: u64,
    pub(crate) generated_length: usize,
    pub(crate) allocated_visuals: usize,
    pub(crate) visible_before_teardown: usize,
    pub(crate) destroyed_visuals: usize,
    pub(crate) clips_played: usize,
    pub(crate) input_attached: bool,
    pub(crate) events_logged: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fallen_at {
            Some(index) => writeln!(f, "Game over: no ground at index {index}")?,
            None => writeln!(f, "Still standing on index {}", self.settled_index)?,
        }
        writeln!(f, "settled index     {}", self.settled_index)?;
        writeln!(f, "ticks             {}", self.ticks)?;
        writeln!(f, "groundList length {}", self.generated_length)?;
        writeln!(
            f,
            "visuals           {} allocated, {} visible, {} destroyed",
            self.allocated_visuals, self.visible_before_teardown, self.destroyed_visuals
        )?;
        writeln!(f, "clips played      {}", self.clips_played)?;
        writeln!(f, "input attached    {}", self.input_attached)?;
        write!(f, "events logged     {}", self.events_logged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_script;

    const TICK: Duration = Duration::from_millis(100);

    fn lane(fill_probability: f64) -> LaneConfig {
        LaneConfig {
            fill_probability,
            ..LaneConfig::default()
        }
    }

    #[test]
    fn replaying_a_script_is_deterministic() {
        let steps = parse_script("1121.12211").expect("valid script");
        let mut first = Session::new(LaneConfig::default(), 42, TICK).expect("session");
        let mut second = Session::new(LaneConfig::default(), 42, TICK).expect("session");

        first.run_script(&steps);
        second.run_script(&steps);

        assert_eq!(first.events(), second.events(), "replay diverged");
        assert_eq!(first.finish(), second.finish());
    }

    #[test]
    fn falling_detaches_input() {
        let mut session = Session::new(lane(0.0), 1, TICK).expect("session");
        assert!(session.press(PointerButton::Primary));
        assert_eq!(
            session.settle(),
            Some(Landing::Fell {
                index: TileIndex::new(1)
            })
        );

        assert!(!session.press(PointerButton::Primary), "input is detached");
        let report = session.finish();
        assert_eq!(report.fallen_at, Some(TileIndex::new(1)));
        assert_eq!(report.settled_index, TileIndex::ORIGIN);
        assert!(!report.input_attached);
        assert_eq!(report.clips_played, 1);
        assert!(report.to_string().starts_with("Game over: no ground at index 1"));
    }

    #[test]
    fn autopilot_on_solid_ground_keeps_allocations_bounded() {
        let mut session = Session::new(lane(1.0), 3, TICK).expect("session");
        session.run_autopilot(50);
        let report = session.finish();

        assert_eq!(report.fallen_at, None);
        assert_eq!(report.settled_index, TileIndex::new(50));
        assert_eq!(report.ticks, 500, "ten ticks per one second jump");
        assert!(report.allocated_visuals <= 14, "{report:?}");
        assert_eq!(report.destroyed_visuals, report.allocated_visuals);
        assert_eq!(report.visible_before_teardown, 13);
    }

    #[test]
    fn report_counts_allocations_made_before_teardown() {
        let mut session = Session::new(lane(1.0), 9, TICK).expect("session");
        session.run_autopilot(5);
        let high_water = query::allocated_visuals(&session.world);
        assert!(high_water > 0);

        let report = session.finish();
        assert_eq!(report.allocated_visuals, high_water);
        assert_eq!(report.destroyed_visuals, high_water);
        assert!(
            report.to_string().contains(&format!("{high_water} allocated")),
            "{report}"
        );
    }

    #[test]
    fn jump_destination_is_drawn_before_the_first_tick() {
        let config = LaneConfig {
            initial_length: 1,
            ..lane(1.0)
        };
        let mut session = Session::new(config, 2, TICK).expect("session");
        assert_eq!(query::generated_up_to(&session.world), TileIndex::ORIGIN);

        assert!(session.press(PointerButton::Secondary));
        assert_eq!(session.traversal.pending_target(), Some(TileIndex::new(2)));
        assert_eq!(query::generated_up_to(&session.world), TileIndex::new(2));
        assert!(query::is_ground_at_index(&session.world, TileIndex::new(2)));
        assert_eq!(query::tick_index(&session.world), 0);
    }

    #[test]
    fn waits_stream_without_moving() {
        let mut session = Session::new(LaneConfig::default(), 5, TICK).expect("session");
        session.run_script(&parse_script("...").expect("valid script"));
        let report = session.finish();

        assert_eq!(report.ticks, 3);
        assert_eq!(report.settled_index, TileIndex::ORIGIN);
        assert_eq!(report.generated_length, 11, "window reaches ten tiles ahead");
        assert_eq!(report.clips_played, 0);
    }

    #[test]
    fn zero_tick_duration_is_rejected() {
        assert!(Session::new(LaneConfig::default(), 0, Duration::ZERO).is_err());
    }
}
