use anyhow::{bail, Result};
use hop_runner_core::{InputEvent, PointerButton};

/// Single-subscriber input bus standing in for the platform's pointer events.
#[derive(Debug)]
pub(crate) struct InputBus {
    subscribed: bool,
}

impl InputBus {
    /// Creates a bus with the traversal handler attached.
    pub(crate) fn subscribed() -> Self {
        Self { subscribed: true }
    }

    /// Detaches the handler; later events are discarded.
    pub(crate) fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    /// Reports whether the handler is still attached.
    pub(crate) fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Forwards the event to the handler if one is attached.
    pub(crate) fn dispatch(&self, event: InputEvent) -> Option<InputEvent> {
        self.subscribed.then_some(event)
    }
}

/// One scripted action of a headless run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScriptStep {
    /// Release the button, then let the resulting jump play out.
    Press(PointerButton),
    /// Let a single tick pass without input.
    Wait,
}

/// Parses a script such as `"12.1 m2"`.
///
/// `1`/`p` press primary, `2`/`s` press secondary, `m` presses the middle
/// button and `.` waits one tick. Whitespace is ignored.
pub(crate) fn parse_script(script: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::with_capacity(script.len());
    for (position, symbol) in script.chars().enumerate() {
        let step = match symbol {
            '1' | 'p' | 'P' => ScriptStep::Press(PointerButton::Primary),
            '2' | 's' | 'S' => ScriptStep::Press(PointerButton::Secondary),
            'm' | 'M' => ScriptStep::Press(PointerButton::Middle),
            '.' => ScriptStep::Wait,
            symbol if symbol.is_whitespace() => continue,
            other => bail!("unknown script symbol `{other}` at position {position}"),
        };
        steps.push(step);
    }
    Ok(steps)
}
