//! JSON mission file input.
//!
//! A mission file maps agent ids to ordered waypoint lists:
//!
//! ```json
//! { "Drone_1": [ { "lat": 24.0, "lon": 121.0, "altitude_m": 0.0, "command": 179 } ] }
//! ```

use super::Scenario;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use swarm_core::Waypoint;

pub fn parse_missions(name: &str, json: &str) -> Result<Scenario> {
    let missions: BTreeMap<String, Vec<Waypoint>> =
        serde_json::from_str(json).context("Invalid mission JSON")?;
    if missions.is_empty() {
        anyhow::bail!("Mission file contains no agents");
    }

    Ok(Scenario {
        name: name.to_string(),
        missions: missions.into_iter().collect(),
    })
}

pub fn load_mission_file(path: &Path) -> Result<Scenario> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mission file {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mission".to_string());
    parse_missions(&name, &json).with_context(|| format!("Failed to load {}", path.display()))
}
