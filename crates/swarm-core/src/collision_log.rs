//! Append-only record of detected conflicts and warnings, exportable as JSON.

use crate::error::Result;
use crate::models::{ConflictEvent, LiveWarning, Position3, Severity, TrajectorySample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Offline trajectory analysis
    Analysis,
    /// Real-time check during playback
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    pub timestamp: DateTime<Utc>,
    pub simulation_time: f64,
    pub agent_a: String,
    pub agent_b: String,
    pub distance: f64,
    pub severity: Severity,
    pub position_a: Option<Position3>,
    pub position_b: Option<Position3>,
    pub waypoint_index_a: Option<usize>,
    pub waypoint_index_b: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<f64>,
    pub source: RecordSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionStats {
    pub total_events: usize,
    pub critical_events: usize,
    pub warning_events: usize,
}

#[derive(Debug, Serialize)]
struct ExportMetadata {
    total_events: usize,
    export_time: DateTime<Utc>,
    simulation_version: &'static str,
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata,
    events: &'a [CollisionRecord],
}

#[derive(Debug, Clone, Default)]
pub struct CollisionLog {
    records: Vec<CollisionRecord>,
}

impl CollisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_conflict(&mut self, conflict: &ConflictEvent) {
        self.records.push(CollisionRecord {
            timestamp: Utc::now(),
            simulation_time: conflict.time,
            agent_a: conflict.agent_a.clone(),
            agent_b: conflict.agent_b.clone(),
            distance: conflict.distance,
            severity: conflict.severity,
            position_a: Some(conflict.position_a),
            position_b: Some(conflict.position_b),
            waypoint_index_a: Some(conflict.waypoint_index_a),
            waypoint_index_b: Some(conflict.waypoint_index_b),
            wait_time: Some(conflict.wait_time),
            source: RecordSource::Analysis,
        });
    }

    /// Record a live warning. The agents' samples are optional because the
    /// warning itself only carries the midpoint.
    pub fn record_warning(
        &mut self,
        warning: &LiveWarning,
        sample_a: Option<&TrajectorySample>,
        sample_b: Option<&TrajectorySample>,
    ) {
        self.records.push(CollisionRecord {
            timestamp: Utc::now(),
            simulation_time: warning.time,
            agent_a: warning.agent_a.clone(),
            agent_b: warning.agent_b.clone(),
            distance: warning.distance,
            severity: warning.severity,
            position_a: sample_a.map(|s| s.position),
            position_b: sample_b.map(|s| s.position),
            waypoint_index_a: sample_a.and_then(|s| s.waypoint_index),
            waypoint_index_b: sample_b.and_then(|s| s.waypoint_index),
            wait_time: None,
            source: RecordSource::Live,
        });
    }

    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }

    pub fn statistics(&self) -> CollisionStats {
        let critical_events = self
            .records
            .iter()
            .filter(|record| record.severity == Severity::Critical)
            .count();
        CollisionStats {
            total_events: self.records.len(),
            critical_events,
            warning_events: self.records.len() - critical_events,
        }
    }

    /// Write the log as pretty-printed JSON with a metadata header.
    pub fn export_json<W: Write>(&self, writer: W) -> Result<()> {
        let document = ExportDocument {
            metadata: ExportMetadata {
                total_events: self.records.len(),
                export_time: Utc::now(),
                simulation_version: env!("CARGO_PKG_VERSION"),
            },
            events: &self.records,
        };
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }

    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_json(&mut writer)?;
        writer.flush()?;
        tracing::info!(
            "Exported {} collision events to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }
}
