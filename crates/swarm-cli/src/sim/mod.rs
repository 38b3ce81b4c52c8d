//! Swarm simulation building blocks for the CLI.

mod mission_file;
mod playback;
mod scenarios;

pub use mission_file::{load_mission_file, parse_missions};
pub use playback::{run_playback, PlaybackReport};
pub use scenarios::{crossing_mission, formation_mission, takeoff_grid, Scenario};
