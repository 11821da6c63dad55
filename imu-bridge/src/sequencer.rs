//! One-shot configuration script run after a device connects.
//!
//! The script is planned once, when the device is first asked to connect,
//! and the one-shot action flags are cleared at that moment. Stages only
//! run while a link is open: each stage starts at a fixed offset from the
//! moment the link opened, but never before the previous stage finished.
//! If the link is lost mid-stage, the stage restarts from its first write
//! after the next open.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use witmotion::{Command, OutputRate, DEFAULT_OUTPUT_CONTENT};

use crate::config::DeviceConfig;

/// Settle time between consecutive configuration writes.
pub const STEP_DELAY: Duration = Duration::from_millis(200);

/// How long the accelerometer calibration runs before it is stopped.
pub const CALIBRATION_DURATION: Duration = Duration::from_millis(5000);

pub const OUTPUT_RATE_OFFSET: Duration = Duration::from_millis(10_000);
pub const OUTPUT_SET_OFFSET: Duration = Duration::from_millis(12_000);
pub const CALIBRATION_OFFSET: Duration = Duration::from_millis(14_000);
pub const ANGLE_RESET_OFFSET: Duration = Duration::from_millis(20_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    OutputRate,
    OutputSet,
    Calibration,
    AngleReset,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::OutputRate => "output rate",
            StageKind::OutputSet => "output set",
            StageKind::Calibration => "accelerometer calibration",
            StageKind::AngleReset => "angle reset",
        };
        f.write_str(name)
    }
}

/// A group of writes that must complete together.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub kind: StageKind,
    /// Earliest start, relative to the link opening
    pub start_offset: Duration,
    /// Writes with their offsets from the stage start, ascending
    pub writes: Vec<(Duration, Command)>,
}

impl Stage {
    /// Unlock, write, unlock again and save, with a settle delay between each.
    fn persisted(kind: StageKind, start_offset: Duration, command: Command) -> Self {
        Self {
            kind,
            start_offset,
            writes: vec![
                (Duration::ZERO, Command::Unlock),
                (STEP_DELAY, command),
                (STEP_DELAY * 2, Command::Unlock),
                (STEP_DELAY * 3, Command::Save),
            ],
        }
    }

    fn output_rate(rate: OutputRate) -> Self {
        Self::persisted(
            StageKind::OutputRate,
            OUTPUT_RATE_OFFSET,
            Command::SetOutputRate(rate),
        )
    }

    fn output_set() -> Self {
        Self::persisted(
            StageKind::OutputSet,
            OUTPUT_SET_OFFSET,
            Command::SelectOutput(DEFAULT_OUTPUT_CONTENT),
        )
    }

    fn calibration() -> Self {
        Self {
            kind: StageKind::Calibration,
            start_offset: CALIBRATION_OFFSET,
            writes: vec![
                (Duration::ZERO, Command::StartAccelCalibration),
                (CALIBRATION_DURATION, Command::StopAccelCalibration),
                (CALIBRATION_DURATION + STEP_DELAY, Command::Save),
            ],
        }
    }

    fn angle_reset() -> Self {
        Self {
            kind: StageKind::AngleReset,
            start_offset: ANGLE_RESET_OFFSET,
            writes: vec![
                (Duration::ZERO, Command::ResetAngleReference),
                (STEP_DELAY, Command::Save),
            ],
        }
    }
}

/// The full script for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPlan {
    pub stages: Vec<Stage>,
}

impl ConfigPlan {
    /// Plan the script for `device`, consuming its one-shot action flags.
    pub fn for_device(device: &mut DeviceConfig) -> Self {
        let mut stages = vec![Stage::output_rate(device.rate), Stage::output_set()];
        if std::mem::take(&mut device.calibrate) {
            stages.push(Stage::calibration());
        }
        if std::mem::take(&mut device.reset_angle) {
            stages.push(Stage::angle_reset());
        }
        Self { stages }
    }

    /// Every command in script order.
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.stages
            .iter()
            .flat_map(|s| s.writes.iter().map(|(_, c)| *c))
    }
}

/// Runs a [`ConfigPlan`] against link open/loss events and the clock.
#[derive(Debug)]
pub struct Sequencer {
    plan: ConfigPlan,
    stage: usize,
    write: usize,
    /// When the current link opened; `None` while no link is open
    opened_at: Option<Instant>,
    stage_started_at: Option<Instant>,
    previous_done_at: Option<Instant>,
}

impl Sequencer {
    pub fn new(plan: ConfigPlan) -> Self {
        Self {
            plan,
            stage: 0,
            write: 0,
            opened_at: None,
            stage_started_at: None,
            previous_done_at: None,
        }
    }

    pub fn plan(&self) -> &ConfigPlan {
        &self.plan
    }

    pub fn is_finished(&self) -> bool {
        self.stage >= self.plan.stages.len()
    }

    /// Stage currently running or waiting to run.
    pub fn current_stage(&self) -> Option<StageKind> {
        self.plan.stages.get(self.stage).map(|s| s.kind)
    }

    pub fn link_opened(&mut self, now: Instant) {
        self.opened_at = Some(now);
        self.stage_started_at = None;
        self.previous_done_at = None;
        self.write = 0;
    }

    /// Pause; the interrupted stage restarts from its first write.
    pub fn link_lost(&mut self) {
        self.opened_at = None;
        self.stage_started_at = None;
        self.write = 0;
    }

    /// When the next write is due, if one can run.
    pub fn deadline(&self) -> Option<Instant> {
        let opened_at = self.opened_at?;
        let stage = self.plan.stages.get(self.stage)?;
        match self.stage_started_at {
            Some(started) => stage.writes.get(self.write).map(|(at, _)| started + *at),
            None => {
                let scheduled = opened_at + stage.start_offset;
                Some(self.previous_done_at.map_or(scheduled, |done| done.max(scheduled)))
            }
        }
    }

    /// Take every write due at `now`, advancing through the script.
    pub fn due(&mut self, now: Instant) -> Vec<Command> {
        let mut out = Vec::new();
        while let Some(deadline) = self.deadline() {
            if deadline > now {
                break;
            }
            let Some(stage) = self.plan.stages.get(self.stage) else {
                break;
            };
            let Some(&(at, command)) = stage.writes.get(self.write) else {
                break;
            };
            let started = *self.stage_started_at.get_or_insert(deadline);
            out.push(command);
            self.write += 1;

            if self.write == stage.writes.len() {
                self.stage += 1;
                self.write = 0;
                self.stage_started_at = None;
                self.previous_done_at = Some(started + at);
            }
        }
        out
    }
}
