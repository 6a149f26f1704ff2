//! Fixed-period control loop driver.
//!
//! One call to [`ControlLoop::tick`] is one sense → decide → act iteration. The
//! host owns the clock: it calls `tick` once per period and stops calling it to
//! shut the controller down. Nothing here sleeps.

use serde::Serialize;

use super::{
    behavior::{BehaviorMachine, BehaviorState, WheelCommand},
    motors::{ActuatorFault, ActuatorSink, ActuatorWriter},
};
use crate::utils::{
    config::ControllerConfig,
    error::ControllerError,
    sensors::{
        line::{LineDetector, LineSignal},
        read_frame, SensorFault, SensorSource,
    },
};

/// Diagnostic record of one decided tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickTrace {
    pub tick: u64,
    pub state: BehaviorState,
    pub dwell: u32,
    pub line: LineSignal,
    pub command: WheelCommand,
}

/// Running counters over the controller's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub ticks: u64,
    pub actuated: u64,
    pub sensor_faults: u64,
    pub actuator_faults: u64,
    pub transitions: u64,
}

/// What happened on a tick.
#[derive(Debug)]
pub enum TickOutcome<SE, AE> {
    /// Decision made and both motors written.
    Actuated(TickTrace),
    /// Sensor read failed; nothing decided, previous command held.
    SensorSkipped {
        tick: u64,
        fault: SensorFault<SE>,
        held: WheelCommand,
    },
    /// Decision made but the motor write failed; retried next tick.
    ActuatorFailed {
        trace: TickTrace,
        fault: ActuatorFault<AE>,
    },
}

impl<SE, AE> TickOutcome<SE, AE> {
    /// Trace for ticks on which the state machine ran.
    pub fn trace(&self) -> Option<&TickTrace> {
        match self {
            TickOutcome::Actuated(trace) | TickOutcome::ActuatorFailed { trace, .. } => {
                Some(trace)
            }
            TickOutcome::SensorSkipped { .. } => None,
        }
    }
}

/// A line-following controller bound to one robot's devices.
pub struct ControlLoop<S, A> {
    sensors: S,
    writer: ActuatorWriter<A>,
    detector: LineDetector,
    machine: BehaviorMachine,
    config: ControllerConfig,
    last_command: WheelCommand,
    next_tick: u64,
    stats: LoopStats,
    tick_trace: bool,
}

impl<S, A> ControlLoop<S, A>
where
    S: SensorSource,
    A: ActuatorSink,
{
    /// Validate `config` and bind the controller to its devices.
    ///
    /// Starts in `Forward` with a zero dwell counter and a stopped last command.
    pub fn new(
        config: ControllerConfig,
        sensors: S,
        actuators: A,
    ) -> Result<Self, ControllerError> {
        let machine = BehaviorMachine::new(&config)?;
        Ok(Self {
            sensors,
            writer: ActuatorWriter::new(actuators, config.max_speed),
            detector: LineDetector::new(config.ground_line_threshold),
            machine,
            config,
            last_command: WheelCommand::STOP,
            next_tick: 0,
            stats: LoopStats::default(),
            tick_trace: false,
        })
    }

    /// Emit a `debug!` record for every decided tick.
    pub fn with_tick_trace(
        mut self,
        enabled: bool,
    ) -> Self {
        self.tick_trace = enabled;
        self
    }

    /// Run one sense → decide → act iteration.
    pub fn tick(&mut self) -> TickOutcome<S::Error, A::Error> {
        let tick = self.next_tick;
        self.next_tick += 1;
        self.stats.ticks += 1;

        let frame = match read_frame(&mut self.sensors, tick) {
            Ok(frame) => frame,
            Err(fault) => {
                self.stats.sensor_faults += 1;
                tracing::warn!(tick, device = fault.device_index, "sensor fault, tick skipped");
                return TickOutcome::SensorSkipped {
                    tick,
                    fault,
                    held: self.last_command,
                };
            }
        };

        let line = self.detector.detect_frame(&frame);
        let decision = self.machine.decide(line);
        let command = decision.command.clamped(self.config.max_speed);
        let written = self.writer.write(command);

        self.machine.commit(&decision);
        self.last_command = command;
        if decision.transitioned() {
            self.stats.transitions += 1;
        }

        let trace = TickTrace {
            tick,
            state: self.machine.state(),
            dwell: self.machine.dwell(),
            line,
            command,
        };
        if self.tick_trace {
            tracing::debug!(
                tick,
                state = trace.state.as_str(),
                dwell = trace.dwell,
                left = command.left,
                right = command.right,
                "tick"
            );
        }

        match written {
            Ok(_) => {
                self.stats.actuated += 1;
                TickOutcome::Actuated(trace)
            }
            Err(fault) => {
                self.stats.actuator_faults += 1;
                tracing::error!(tick, side = ?fault.side, error = ?fault.error, "actuator fault");
                TickOutcome::ActuatorFailed { trace, fault }
            }
        }
    }

    /// Tick until `keep_running` returns false, then return the final counters.
    pub fn run<F>(
        &mut self,
        mut keep_running: F,
    ) -> LoopStats
    where
        F: FnMut(&LoopStats) -> bool,
    {
        while keep_running(&self.stats) {
            self.tick();
        }
        self.stats
    }

    /// Command both wheels to zero.
    pub fn halt(&mut self) -> Result<(), ActuatorFault<A::Error>> {
        self.writer.write(WheelCommand::STOP)?;
        self.last_command = WheelCommand::STOP;
        tracing::info!(tick = self.next_tick, "motors halted");
        Ok(())
    }

    pub fn state(&self) -> BehaviorState {
        self.machine.state()
    }

    pub fn dwell(&self) -> u32 {
        self.machine.dwell()
    }

    /// Command issued on the most recent decided tick.
    pub fn last_command(&self) -> WheelCommand {
        self.last_command
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn actuators_mut(&mut self) -> &mut A {
        self.writer.sink_mut()
    }

    /// Release the device handles.
    pub fn into_parts(self) -> (S, A) {
        (self.sensors, self.writer.into_inner())
    }
}
