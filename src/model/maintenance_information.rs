use serde::{Deserialize, Serialize};

pub const DATABASE_STATUS_KEY: &str = "database_status";
pub const DIGESTION_PARAMETERS_KEY: &str = "digestion_parameters";
pub const PARTITION_BOUNDARIES_KEY: &str = "partition_boundaries";

/// A single row of the `maintenance_information` key/value store. `values`
/// is whatever JSON shape the key implies; callers are expected to go
/// through the typed wrappers below rather than poke at the JSON directly.
#[derive(Debug, Clone)]
pub struct MaintenanceInformation {
    pub key: String,
    pub values: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Maintenance,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseStatusInfo {
    pub maintenance_mode: bool,
    pub last_update: Option<i64>,
    pub status: DatabaseStatus,
}

impl DatabaseStatusInfo {
    pub fn to_maintenance_information(&self) -> MaintenanceInformation {
        MaintenanceInformation {
            key: DATABASE_STATUS_KEY.to_string(),
            values: serde_json::to_value(self).expect("DatabaseStatusInfo always serializes"),
        }
    }

    pub fn from_maintenance_information(info: &MaintenanceInformation) -> Result<Self, serde_json::Error> {
        serde_json::from_value(info.values.clone())
    }
}

impl Default for DatabaseStatusInfo {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            last_update: None,
            status: DatabaseStatus::Ready,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestionParameters {
    pub enzyme_name: String,
    pub max_missed_cleavages: usize,
    pub min_len: usize,
    pub max_len: usize,
}

impl DigestionParameters {
    pub fn to_maintenance_information(&self) -> MaintenanceInformation {
        MaintenanceInformation {
            key: DIGESTION_PARAMETERS_KEY.to_string(),
            values: serde_json::to_value(self).expect("DigestionParameters always serializes"),
        }
    }
}

/// A half-open mass interval `[lower, upper)` and the partition index it
/// maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionBoundary {
    pub partition: i32,
    pub lower: i64,
    pub upper: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionBoundaries {
    pub boundaries: Vec<PartitionBoundary>,
}

impl PartitionBoundaries {
    pub fn to_maintenance_information(&self) -> MaintenanceInformation {
        MaintenanceInformation {
            key: PARTITION_BOUNDARIES_KEY.to_string(),
            values: serde_json::to_value(self).expect("PartitionBoundaries always serializes"),
        }
    }

    /// Finds the partition index whose interval contains `mass`, if any.
    pub fn partition_for(&self, mass: i64) -> Option<i32> {
        self.boundaries
            .iter()
            .find(|b| b.lower <= mass && mass < b.upper)
            .map(|b| b.partition)
    }

    pub fn from_maintenance_information(info: &MaintenanceInformation) -> Result<Self, serde_json::Error> {
        serde_json::from_value(info.values.clone())
    }
}

impl Default for PartitionBoundaries {
    /// A single partition spanning every mass, used until a real partition
    /// plan has been written to `maintenance_information`.
    fn default() -> Self {
        Self {
            boundaries: vec![PartitionBoundary {
                partition: 0,
                lower: 0,
                upper: i64::MAX,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_for_finds_containing_interval() {
        let boundaries = PartitionBoundaries {
            boundaries: vec![
                PartitionBoundary { partition: 0, lower: 0, upper: 100 },
                PartitionBoundary { partition: 1, lower: 100, upper: 200 },
            ],
        };
        assert_eq!(boundaries.partition_for(50), Some(0));
        assert_eq!(boundaries.partition_for(100), Some(1));
        assert_eq!(boundaries.partition_for(200), None);
    }
}
