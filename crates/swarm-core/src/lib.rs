pub mod collision_log;
pub mod conflict;
pub mod error;
pub mod fleet;
pub mod geo;
pub mod models;
pub mod rules;
pub mod trajectory;

pub use collision_log::{CollisionLog, CollisionRecord, CollisionStats, RecordSource};
pub use conflict::{
    effective_time, plan_holds, position_with_loiter, right_of_way, ConflictEngine,
    ConflictSummary,
};
pub use error::{CoreError, Result};
pub use fleet::{Agent, AgentState, Fleet};
pub use geo::{bearing, destination, great_circle_distance, validate, GeoProjector, Origin};
pub use models::{
    ConflictEvent, FlightPhase, HoldInstruction, LiveWarning, LoiterDelay, MissionCommand,
    Position3, Severity, TrajectorySample, Waypoint,
};
pub use rules::{FlightProfile, FormationConfig, SafetyConfig};
pub use trajectory::{Trajectory, TrajectorySynthesizer};
