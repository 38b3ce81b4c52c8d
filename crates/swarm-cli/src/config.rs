//! Simulator configuration from environment.

use std::env;
use std::str::FromStr;
use swarm_core::{FlightProfile, SafetyConfig};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub safety: SafetyConfig,
    pub profile: FlightProfile,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let safety = SafetyConfig::default();
        let profile = FlightProfile::default();
        let get = |key: &str, default: f64| parse_or(lookup(key), default);

        Self {
            safety: SafetyConfig {
                safety_distance: get("SWARM_SAFETY_DISTANCE", safety.safety_distance),
                warning_distance: get("SWARM_WARNING_DISTANCE", safety.warning_distance),
                critical_distance: get("SWARM_CRITICAL_DISTANCE", safety.critical_distance),
                check_interval: get("SWARM_CHECK_INTERVAL", safety.check_interval),
            },
            profile: FlightProfile {
                takeoff_altitude_m: get("SWARM_TAKEOFF_ALTITUDE", profile.takeoff_altitude_m),
                climb_duration_s: get("SWARM_CLIMB_DURATION", profile.climb_duration_s),
                hover_time_s: get("SWARM_HOVER_TIME", profile.hover_time_s),
                cruise_speed_mps: get("SWARM_CRUISE_SPEED", profile.cruise_speed_mps),
            },
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
