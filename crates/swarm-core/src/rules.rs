//! Safety rules and flight timing parameters.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Separation thresholds read by the conflict engine on every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Minimum allowed 3D separation in meters
    pub safety_distance: f64,
    /// Distance at which operators should start paying attention
    pub warning_distance: f64,
    /// Separation below which a violation is critical
    pub critical_distance: f64,
    /// Minimum simulation time between real-time checks (seconds)
    pub check_interval: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            safety_distance: 5.0,
            warning_distance: 8.0,
            critical_distance: 3.0,
            check_interval: 0.1,
        }
    }
}

impl SafetyConfig {
    /// Reject non-positive values and a critical distance that is not
    /// strictly inside the safety distance.
    ///
    /// `safety_distance <= warning_distance` is a convention only and is
    /// not enforced.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("safety_distance", self.safety_distance),
            ("warning_distance", self.warning_distance),
            ("critical_distance", self.critical_distance),
            ("check_interval", self.check_interval),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.critical_distance >= self.safety_distance {
            return Err(CoreError::InvalidConfig(format!(
                "critical_distance ({}) must be below safety_distance ({})",
                self.critical_distance, self.safety_distance
            )));
        }
        if self.safety_distance > self.warning_distance {
            tracing::debug!(
                "safety_distance {} exceeds warning_distance {}",
                self.safety_distance,
                self.warning_distance
            );
        }
        Ok(())
    }
}

/// Phase timing used to synthesize trajectories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightProfile {
    pub takeoff_altitude_m: f64,
    pub climb_duration_s: f64,
    pub hover_time_s: f64,
    pub cruise_speed_mps: f64,
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self {
            takeoff_altitude_m: 10.0,
            climb_duration_s: 5.0,
            hover_time_s: 2.0,
            cruise_speed_mps: 8.0,
        }
    }
}

impl FlightProfile {
    pub fn validate(&self) -> Result<()> {
        if !(self.cruise_speed_mps.is_finite() && self.cruise_speed_mps > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "cruise_speed_mps must be positive, got {}",
                self.cruise_speed_mps
            )));
        }
        if !(self.climb_duration_s.is_finite() && self.climb_duration_s > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "climb_duration_s must be positive, got {}",
                self.climb_duration_s
            )));
        }
        if !(self.hover_time_s.is_finite() && self.hover_time_s >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "hover_time_s must not be negative, got {}",
                self.hover_time_s
            )));
        }
        if !(self.takeoff_altitude_m.is_finite() && self.takeoff_altitude_m >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "takeoff_altitude_m must not be negative, got {}",
                self.takeoff_altitude_m
            )));
        }
        Ok(())
    }
}

/// Ground layout for the generated test mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Spacing between neighbouring takeoff slots
    pub formation_spacing_m: f64,
    /// Distance east of the base point where the grid starts
    pub east_offset_m: f64,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            formation_spacing_m: 6.0,
            east_offset_m: 50.0,
        }
    }
}
