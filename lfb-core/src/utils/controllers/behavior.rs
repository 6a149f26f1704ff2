//! Behavior state machine for reactive line following.
//!
//! Three states share one transition function. `Forward` drives straight until a
//! single ground sensor sees the line, then the matching turn is held for a fixed
//! number of ticks regardless of what the sensors report in the meantime.
//!
//! # Example
//! ```rust
//! use lfb_core::utils::{BehaviorMachine, BehaviorState, ControllerConfig, LineSignal};
//!
//! let mut machine = BehaviorMachine::new(&ControllerConfig::default()).unwrap();
//! let decision = machine.step(LineSignal::new(false, true));
//! assert_eq!(decision.state, BehaviorState::TurnRight);
//! ```

use core::fmt;

use serde::Serialize;

use crate::utils::{
    config::{ControllerConfig, SpeedFractions},
    error::ControllerError,
    sensors::line::LineSignal,
};

/// Discrete behavior states. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    #[default]
    Forward,
    TurnRight,
    TurnLeft,
}

impl BehaviorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorState::Forward => "forward",
            BehaviorState::TurnRight => "turn_right",
            BehaviorState::TurnLeft => "turn_left",
        }
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Left/right wheel angular speed targets (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WheelCommand {
    pub left: f32,
    pub right: f32,
}

impl WheelCommand {
    pub const STOP: WheelCommand = WheelCommand {
        left: 0.0,
        right: 0.0,
    };

    pub const fn new(
        left: f32,
        right: f32,
    ) -> Self {
        Self { left, right }
    }

    /// Clamp both wheels to `[-limit, limit]`. NaN maps to zero.
    pub fn clamped(
        self,
        limit: f32,
    ) -> Self {
        fn clamp(
            v: f32,
            limit: f32,
        ) -> f32 {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(-limit, limit)
            }
        }
        Self {
            left: clamp(self.left, limit),
            right: clamp(self.right, limit),
        }
    }

    /// Whether both wheels lie within `[-limit, limit]`.
    pub fn within(
        &self,
        limit: f32,
    ) -> bool {
        (-limit..=limit).contains(&self.left) && (-limit..=limit).contains(&self.right)
    }
}

/// Result of evaluating one tick, before it is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub previous: BehaviorState,
    pub state: BehaviorState,
    pub command: WheelCommand,
}

impl Decision {
    pub fn transitioned(&self) -> bool {
        self.previous != self.state
    }
}

/// Holds the active state and its dwell counter.
///
/// `decide` is pure; `commit` is the only place state or counter change. The loop
/// driver calls them around actuation, `step` does both at once.
#[derive(Debug, Clone)]
pub struct BehaviorMachine {
    state: BehaviorState,
    dwell: u32,
    dwell_ticks_threshold: u32,
    max_speed: f32,
    turn_right: SpeedFractions,
    turn_left: SpeedFractions,
}

impl BehaviorMachine {
    /// Build a machine in `Forward` with a zero counter.
    pub fn new(config: &ControllerConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        Ok(Self {
            state: BehaviorState::Forward,
            dwell: 0,
            dwell_ticks_threshold: config.dwell_ticks_threshold,
            max_speed: config.max_speed,
            turn_right: config.turn_right,
            turn_left: config.turn_left,
        })
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Ticks spent in the current state, 0 on the tick it was entered.
    pub fn dwell(&self) -> u32 {
        self.dwell
    }

    /// Transition rule, a pure function of `(state, line, dwell)`.
    pub fn next_state(
        &self,
        line: LineSignal,
    ) -> BehaviorState {
        match self.state {
            BehaviorState::Forward if line.right_only() => BehaviorState::TurnRight,
            BehaviorState::Forward if line.left_only() => BehaviorState::TurnLeft,
            BehaviorState::Forward => BehaviorState::Forward,
            BehaviorState::TurnRight | BehaviorState::TurnLeft => {
                if self.dwell >= self.dwell_ticks_threshold {
                    BehaviorState::Forward
                } else {
                    self.state
                }
            }
        }
    }

    /// Output rule, a pure function of the state.
    pub fn command_for(
        &self,
        state: BehaviorState,
    ) -> WheelCommand {
        let max = self.max_speed;
        match state {
            BehaviorState::Forward => WheelCommand::new(max, max),
            BehaviorState::TurnRight => {
                WheelCommand::new(self.turn_right.left * max, self.turn_right.right * max)
            }
            BehaviorState::TurnLeft => {
                WheelCommand::new(self.turn_left.left * max, self.turn_left.right * max)
            }
        }
    }

    /// Evaluate the tick without mutating anything.
    pub fn decide(
        &self,
        line: LineSignal,
    ) -> Decision {
        let state = self.next_state(line);
        Decision {
            previous: self.state,
            state,
            command: self.command_for(state),
        }
    }

    /// Apply a decision made against the current state and advance the counter.
    pub fn commit(
        &mut self,
        decision: &Decision,
    ) {
        if decision.transitioned() {
            tracing::debug!(
                from = decision.previous.as_str(),
                to = decision.state.as_str(),
                dwell = self.dwell,
                "behavior transition"
            );
            self.state = decision.state;
            self.dwell = 0;
        } else {
            self.dwell = self.dwell.saturating_add(1);
        }
    }

    /// Decide and commit in one call.
    pub fn step(
        &mut self,
        line: LineSignal,
    ) -> Decision {
        let decision = self.decide(line);
        self.commit(&decision);
        decision
    }
}
