use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{HelpdeskError, Result};

/// Comprehensive help-desk engine configuration
///
/// This is the main configuration structure that encompasses all aspects of the
/// assignment engine, from retry policy to monitoring thresholds and storage.
///
/// # Configuration Sections
///
/// - [`general`]: System limits and retry policy for store operations
/// - [`assignment`]: Skill matching and candidate selection behavior
/// - [`monitoring`]: Workload monitor interval, thresholds, and retention
/// - [`database`]: Backing store settings
///
/// # Examples
///
/// ## Default Configuration
///
/// ```
/// use helpdesk_engine::config::HelpdeskConfig;
///
/// let config = HelpdeskConfig::default();
/// assert_eq!(config.monitoring.high_workload_threshold, 8);
/// assert_eq!(config.monitoring.critical_workload_threshold, 12);
/// ```
///
/// ## Custom Configuration
///
/// ```
/// use helpdesk_engine::config::HelpdeskConfig;
/// use std::time::Duration;
///
/// let mut config = HelpdeskConfig::default();
/// config.monitoring.monitoring_interval = Duration::from_secs(30);
/// config.general.max_store_retries = 5;
///
/// config.validate().expect("configuration should be valid");
/// ```
///
/// [`general`]: GeneralConfig
/// [`assignment`]: AssignmentConfig
/// [`monitoring`]: MonitoringConfig
/// [`database`]: DatabaseConfig
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    /// General system settings including retry policy
    pub general: GeneralConfig,

    /// Candidate selection and skill matching configuration
    pub assignment: AssignmentConfig,

    /// Workload monitoring configuration
    pub monitoring: MonitoringConfig,

    /// Backing store configuration
    pub database: DatabaseConfig,
}

/// General engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Maximum number of retries for a failed store operation
    ///
    /// Applies to transient failures (timeouts, connectivity) during
    /// assignment and workload updates. After the last retry the error is
    /// surfaced to the caller.
    pub max_store_retries: u32,

    /// Base delay between store retries
    ///
    /// The actual delay grows linearly with the attempt number.
    pub store_retry_delay: Duration,
}

/// Candidate selection and skill matching configuration
///
/// Controls how ticket attributes are matched against technician skills and
/// how match quality is weighted into a score. The weights correspond to the
/// components of the per-candidate match score; they should sum to roughly 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// Weight of required-skill coverage in the match score
    pub skill_weight: f64,

    /// Weight of role/issue-type alignment in the match score
    pub role_weight: f64,

    /// Weight of specialization alignment in the match score
    pub specialization_weight: f64,

    /// Flat boost applied to every candidate for critical-priority tickets
    pub critical_priority_boost: f64,

    /// Minimum required-skill coverage ratio for a strong (tier 1) match
    pub strong_match_ratio: f64,

    /// Default technician capacity when the roster does not specify one
    pub default_max_workload: u32,
}

/// Workload monitoring configuration
///
/// # Examples
///
/// ```
/// use helpdesk_engine::config::MonitoringConfig;
/// use std::time::Duration;
///
/// let config = MonitoringConfig {
///     monitoring_interval: Duration::from_secs(30),
///     high_workload_threshold: 6,
///     ..Default::default()
/// };
/// assert_eq!(config.high_workload_threshold, 6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Interval between workload refresh ticks
    pub monitoring_interval: Duration,

    /// Workload at or above which a HIGH alert is raised
    pub high_workload_threshold: u32,

    /// Workload at or above which a CRITICAL alert is raised
    ///
    /// CRITICAL suppresses HIGH: a workload past both thresholds produces a
    /// single CRITICAL alert.
    pub critical_workload_threshold: u32,

    /// How long workload snapshots are retained per technician
    pub history_retention: Duration,

    /// Maximum number of alerts kept in the bounded alert list
    pub max_recent_alerts: usize,

    /// How long `stop()` waits for the monitor loop to join
    pub stop_timeout: Duration,
}

/// Backing store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (`sqlite::memory:` for in-memory operation)
    pub url: String,

    /// Bounded timeout applied to individual store operations
    ///
    /// On expiry the operation fails with a store-timeout error rather than
    /// hanging the caller.
    pub operation_timeout: Duration,

    /// SQLite busy timeout for lock contention
    pub busy_timeout: Duration,

    /// Maximum pool connections
    pub max_connections: u32,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            assignment: AssignmentConfig::default(),
            monitoring: MonitoringConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_store_retries: 3,
            store_retry_delay: Duration::from_secs(2),
        }
    }
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.4,
            role_weight: 0.3,
            specialization_weight: 0.2,
            critical_priority_boost: 0.1,
            strong_match_ratio: 0.75,
            default_max_workload: 10,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            monitoring_interval: Duration::from_secs(60),
            high_workload_threshold: 8,
            critical_workload_threshold: 12,
            history_retention: Duration::from_secs(24 * 60 * 60),
            max_recent_alerts: 100,
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            operation_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            max_connections: 5,
        }
    }
}

impl HelpdeskConfig {
    /// Validate the configuration
    ///
    /// Checks threshold ordering, non-zero intervals, and score weight sanity.
    ///
    /// # Examples
    ///
    /// ```
    /// use helpdesk_engine::config::HelpdeskConfig;
    ///
    /// let config = HelpdeskConfig::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.monitoring.monitoring_interval.is_zero() {
            return Err(HelpdeskError::configuration(
                "monitoring interval must be non-zero",
            ));
        }
        if self.monitoring.critical_workload_threshold < self.monitoring.high_workload_threshold {
            return Err(HelpdeskError::configuration(format!(
                "critical threshold ({}) must be >= high threshold ({})",
                self.monitoring.critical_workload_threshold,
                self.monitoring.high_workload_threshold
            )));
        }
        if self.monitoring.max_recent_alerts == 0 {
            return Err(HelpdeskError::configuration(
                "max_recent_alerts must be at least 1",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(HelpdeskError::configuration(
                "max_connections must be at least 1",
            ));
        }
        if self.database.operation_timeout.is_zero() {
            return Err(HelpdeskError::configuration(
                "store operation timeout must be non-zero",
            ));
        }

        let total_weight = self.assignment.skill_weight
            + self.assignment.role_weight
            + self.assignment.specialization_weight
            + self.assignment.critical_priority_boost;
        if !(0.5..=1.5).contains(&total_weight) {
            return Err(HelpdeskError::configuration(format!(
                "score weights sum to {:.2}, expected ~1.0",
                total_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.assignment.strong_match_ratio) {
            return Err(HelpdeskError::configuration(
                "strong_match_ratio must be between 0.0 and 1.0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(HelpdeskConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = HelpdeskConfig::default();
        config.monitoring.high_workload_threshold = 20;
        config.monitoring.critical_workload_threshold = 10;
        assert!(matches!(
            config.validate(),
            Err(HelpdeskError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = HelpdeskConfig::default();
        config.monitoring.monitoring_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unbalanced_weights() {
        let mut config = HelpdeskConfig::default();
        config.assignment.skill_weight = 3.0;
        assert!(config.validate().is_err());
    }
}
