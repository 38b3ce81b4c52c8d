//! Core data models for the swarm simulator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mission item command, numbered the way MAVLink mission files number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum MissionCommand {
    Home,
    NavigateTo,
    LoiterUnlimited,
    LoiterTime,
    Land,
    Takeoff,
    Other(u16),
}

impl From<u16> for MissionCommand {
    fn from(code: u16) -> Self {
        match code {
            179 => MissionCommand::Home,
            16 => MissionCommand::NavigateTo,
            17 => MissionCommand::LoiterUnlimited,
            19 => MissionCommand::LoiterTime,
            21 => MissionCommand::Land,
            22 => MissionCommand::Takeoff,
            other => MissionCommand::Other(other),
        }
    }
}

impl From<MissionCommand> for u16 {
    fn from(command: MissionCommand) -> Self {
        match command {
            MissionCommand::Home => 179,
            MissionCommand::NavigateTo => 16,
            MissionCommand::LoiterUnlimited => 17,
            MissionCommand::LoiterTime => 19,
            MissionCommand::Land => 21,
            MissionCommand::Takeoff => 22,
            MissionCommand::Other(code) => code,
        }
    }
}

/// A mission waypoint as loaded from a mission file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    #[serde(default = "default_command")]
    pub command: MissionCommand,
}

fn default_command() -> MissionCommand {
    MissionCommand::NavigateTo
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64, altitude_m: f64, command: MissionCommand) -> Self {
        Self {
            lat,
            lon,
            altitude_m,
            command,
        }
    }

    pub fn home(lat: f64, lon: f64) -> Self {
        Self::new(lat, lon, 0.0, MissionCommand::Home)
    }

    pub fn navigate(lat: f64, lon: f64, altitude_m: f64) -> Self {
        Self::new(lat, lon, altitude_m, MissionCommand::NavigateTo)
    }
}

/// Flight phase tag carried by every trajectory sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightPhase {
    Taxi,
    Takeoff,
    Hover,
    Auto,
    /// Holding position for conflict avoidance
    Loiter,
    Landing,
}

impl FlightPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            FlightPhase::Taxi => "Ground Taxi",
            FlightPhase::Takeoff => "Taking Off",
            FlightPhase::Hover => "Hover Wait",
            FlightPhase::Auto => "Auto Mission",
            FlightPhase::Loiter => "Avoidance Wait",
            FlightPhase::Landing => "Landing",
        }
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightPhase::Taxi => write!(f, "TAXI"),
            FlightPhase::Takeoff => write!(f, "TAKEOFF"),
            FlightPhase::Hover => write!(f, "HOVER"),
            FlightPhase::Auto => write!(f, "AUTO"),
            FlightPhase::Loiter => write!(f, "LOITER"),
            FlightPhase::Landing => write!(f, "LANDING"),
        }
    }
}

/// Point in the local frame (x east, y north, z altitude), meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position3) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    pub fn midpoint(&self, other: &Position3) -> Position3 {
        Position3 {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    /// Linear interpolation, `ratio` 0 gives `self`, 1 gives `other`.
    pub fn lerp(&self, other: &Position3, ratio: f64) -> Position3 {
        Position3 {
            x: self.x + ratio * (other.x - self.x),
            y: self.y + ratio * (other.y - self.y),
            z: self.z + ratio * (other.z - self.z),
        }
    }
}

/// One time-stamped point of a synthesized trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub position: Position3,
    /// Mission time in seconds from the start of taxi
    pub time: f64,
    pub phase: FlightPhase,
    /// Index into the originating waypoint list; `None` for samples inserted
    /// only to smooth a long segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint_index: Option<usize>,
}

impl TrajectorySample {
    pub fn new(
        position: Position3,
        time: f64,
        phase: FlightPhase,
        waypoint_index: Option<usize>,
    ) -> Self {
        Self {
            position,
            time,
            phase,
            waypoint_index,
        }
    }
}

/// Hold instruction applied to one agent's playback clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoiterDelay {
    pub start_time: f64,
    pub duration: f64,
}

/// Severity levels for separation violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Inside safety distance
    Warning,
    /// Inside critical distance
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Separation violation found by offline trajectory analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictEvent {
    pub time: f64,
    pub distance: f64,
    pub agent_a: String,
    pub agent_b: String,
    pub position_a: Position3,
    pub position_b: Position3,
    pub waypoint_index_a: usize,
    pub waypoint_index_b: usize,
    pub severity: Severity,
    /// Seconds the waiting agent must hold
    pub wait_time: f64,
    pub priority_agent: String,
    pub waiting_agent: String,
}

/// Separation violation at the current simulation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveWarning {
    pub agent_a: String,
    pub agent_b: String,
    pub distance: f64,
    pub time: f64,
    pub midpoint: Position3,
    pub severity: Severity,
}

/// Remedy derived from a conflict, independent of any mission file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldInstruction {
    pub agent_id: String,
    /// Waypoint after which the hold is inserted
    pub waypoint_index: usize,
    pub start_time: f64,
    pub duration_s: f64,
}
