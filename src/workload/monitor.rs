//! # Workload Monitor
//!
//! Background observer that keeps the workload picture fresh and flags
//! technicians under pressure. Every tick it:
//!
//! 1. Recomputes all workload counters from active ticket counts (the store's
//!    reconciliation path), so drift never outlives one interval;
//! 2. Logs every change against the previous tick;
//! 3. Raises a HIGH or CRITICAL alert per technician over a threshold
//!    (CRITICAL suppresses HIGH);
//! 4. Records a snapshot per technician into a bounded rolling history.
//!
//! A tick that fails (store unreachable, query error) is logged and skipped;
//! the loop always survives to the next interval.
//!
//! Monitors are plain owned components: construct as many as needed, each with
//! its own store handle, and `start()`/`stop()` them independently. There is
//! no process-global instance.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use helpdesk_engine::config::MonitoringConfig;
//! use helpdesk_engine::workload::{WorkloadMonitor, WorkloadStore};
//!
//! # async fn example() -> helpdesk_engine::Result<()> {
//! let store = Arc::new(WorkloadStore::new_in_memory().await?);
//! let monitor = WorkloadMonitor::new(store, MonitoringConfig::default());
//!
//! monitor.start().await;
//! let stats = monitor.get_workload_statistics().await?;
//! println!("{} technicians tracked", stats.total_technicians);
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::MonitoringConfig;
use crate::error::Result;

use super::store::WorkloadStore;

/// Severity of a workload alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Workload at or above the high threshold
    High,
    /// Workload at or above the critical threshold
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A threshold-crossing alert raised during a monitoring tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadAlert {
    /// Unique alert id
    pub id: Uuid,

    /// Technician the alert concerns
    pub technician_email: String,

    /// Alert severity
    pub severity: AlertSeverity,

    /// Workload observed at the time of the alert
    pub workload: u32,

    /// Threshold that was crossed
    pub threshold: u32,

    /// When the alert was raised
    pub raised_at: DateTime<Utc>,
}

/// A point-in-time workload observation for one technician
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    /// Observed workload
    pub workload: u32,

    /// When the observation was taken
    pub observed_at: DateTime<Utc>,
}

/// Aggregate workload statistics across the roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadStatistics {
    /// Number of technicians tracked
    pub total_technicians: usize,

    /// Sum of all active tickets across technicians
    pub total_active_tickets: u32,

    /// Mean workload (0.0 for an empty roster)
    pub average_workload: f64,

    /// Highest single workload
    pub max_workload: u32,

    /// Lowest single workload
    pub min_workload: u32,

    /// Technicians at or above the high threshold (but below critical)
    pub high_workload_count: usize,

    /// Technicians at or above the critical threshold
    pub critical_workload_count: usize,

    /// When the underlying counts were last refreshed
    pub last_updated: DateTime<Utc>,
}

/// Interior monitor state behind one lock
///
/// History and alerts are bounded: snapshots older than the retention window
/// are pruned each tick, and the alert list evicts its oldest entries past
/// the configured cap.
#[derive(Debug, Default)]
struct MonitorState {
    /// Latest workload per technician
    current: HashMap<String, u32>,

    /// Rolling snapshot history per technician
    history: HashMap<String, VecDeque<WorkloadSnapshot>>,

    /// Recent alerts, oldest first
    alerts: VecDeque<WorkloadAlert>,

    /// Timestamp of the last successful refresh
    last_updated: Option<DateTime<Utc>>,
}

/// Background workload monitor over a [`WorkloadStore`]
///
/// Cheap to clone; all clones share the same state and running loop.
#[derive(Clone)]
pub struct WorkloadMonitor {
    store: Arc<WorkloadStore>,
    config: MonitoringConfig,
    state: Arc<RwLock<MonitorState>>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl WorkloadMonitor {
    /// Create a monitor (does not start the background loop)
    pub fn new(store: Arc<WorkloadStore>, config: MonitoringConfig) -> Self {
        Self {
            store,
            config,
            state: Arc::new(RwLock::new(MonitorState::default())),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the background monitoring loop
    ///
    /// Idempotent: calling `start` on a running monitor logs a warning and
    /// leaves the existing loop untouched.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("⚠️ Workload monitor already running, ignoring start request");
            return;
        }

        info!(
            "🔄 Workload monitor started (interval: {:?}, thresholds: high={}, critical={})",
            self.config.monitoring_interval,
            self.config.high_workload_threshold,
            self.config.critical_workload_threshold
        );

        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.monitoring_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so the loop waits a
            // full interval before the first refresh, like a fresh schedule.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = monitor.check_all_workloads().await {
                            error!("❌ Workload check failed, will retry next tick: {}", e);
                        }
                    }
                    _ = monitor.shutdown.notified() => break,
                }
            }
            debug!("Workload monitor loop exited");
        });

        *self.handle.lock().await = Some(handle);
    }

    /// Stop the background loop
    ///
    /// Signals shutdown and waits up to the configured stop timeout for the
    /// loop to exit. Stopping an already stopped monitor is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.shutdown.notify_one();
        if let Some(handle) = self.handle.lock().await.take() {
            match tokio::time::timeout(self.config.stop_timeout, handle).await {
                Ok(_) => info!("✅ Workload monitor stopped"),
                Err(_) => warn!(
                    "⚠️ Workload monitor did not stop within {:?}",
                    self.config.stop_timeout
                ),
            }
        }
    }

    /// Whether the background loop is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one monitoring pass immediately
    ///
    /// Same work as a scheduled tick: refresh, change logging, alert
    /// evaluation, history recording. Usable whether or not the loop runs.
    pub async fn force_refresh(&self) -> Result<HashMap<String, u32>> {
        self.check_all_workloads().await?;
        Ok(self.get_current_workloads().await)
    }

    async fn check_all_workloads(&self) -> Result<()> {
        let workloads = self.store.refresh_all_workloads().await?;
        let now = Utc::now();

        let mut state = self.state.write().await;

        for (email, &workload) in &workloads {
            match state.current.get(email) {
                Some(&previous) if previous != workload => {
                    info!(
                        "📊 Workload change for {}: {} -> {}",
                        email, previous, workload
                    );
                }
                None => debug!("📊 Tracking new technician {}: workload {}", email, workload),
                _ => {}
            }

            if let Some(alert) = self.evaluate_thresholds(email, workload, now) {
                info!(
                    "🚨 {} workload alert for {}: {} tickets (threshold {})",
                    alert.severity, alert.technician_email, alert.workload, alert.threshold
                );
                state.alerts.push_back(alert);
                while state.alerts.len() > self.config.max_recent_alerts {
                    state.alerts.pop_front();
                }
            }

            let history = state.history.entry(email.clone()).or_default();
            history.push_back(WorkloadSnapshot {
                workload,
                observed_at: now,
            });
        }

        // Technicians removed from the roster drop out of current and history.
        state.history.retain(|email, _| workloads.contains_key(email));
        state.current = workloads;

        let retention = ChronoDuration::from_std(self.config.history_retention)
            .unwrap_or_else(|_| ChronoDuration::hours(24));
        let cutoff = now - retention;
        for history in state.history.values_mut() {
            while history.front().is_some_and(|s| s.observed_at < cutoff) {
                history.pop_front();
            }
        }

        state.last_updated = Some(now);
        Ok(())
    }

    /// Evaluate thresholds for one technician
    ///
    /// At most one alert per tick: CRITICAL when at or above the critical
    /// threshold, otherwise HIGH when at or above the high threshold.
    fn evaluate_thresholds(
        &self,
        email: &str,
        workload: u32,
        now: DateTime<Utc>,
    ) -> Option<WorkloadAlert> {
        let (severity, threshold) = if workload >= self.config.critical_workload_threshold {
            (AlertSeverity::Critical, self.config.critical_workload_threshold)
        } else if workload >= self.config.high_workload_threshold {
            (AlertSeverity::High, self.config.high_workload_threshold)
        } else {
            return None;
        };

        Some(WorkloadAlert {
            id: Uuid::new_v4(),
            technician_email: email.to_string(),
            severity,
            workload,
            threshold,
            raised_at: now,
        })
    }

    /// Latest known workload per technician
    pub async fn get_current_workloads(&self) -> HashMap<String, u32> {
        self.state.read().await.current.clone()
    }

    /// Most recent alerts, newest first
    pub async fn get_workload_alerts(&self, limit: usize) -> Vec<WorkloadAlert> {
        let state = self.state.read().await;
        state.alerts.iter().rev().take(limit).cloned().collect()
    }

    /// Workload history for one technician within the last `hours` hours
    pub async fn get_technician_workload_history(
        &self,
        email: &str,
        hours: i64,
    ) -> Vec<WorkloadSnapshot> {
        let cutoff = Utc::now() - ChronoDuration::hours(hours);
        let state = self.state.read().await;
        state
            .history
            .get(email)
            .map(|history| {
                history
                    .iter()
                    .filter(|s| s.observed_at >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Aggregate statistics across the roster
    ///
    /// Computed against live store counts rather than the last tick, so it is
    /// accurate even when the loop is not running.
    pub async fn get_workload_statistics(&self) -> Result<WorkloadStatistics> {
        let workloads = self.store.refresh_all_workloads().await?;
        let now = Utc::now();

        let total_technicians = workloads.len();
        let total_active_tickets: u32 = workloads.values().sum();
        let average_workload = if total_technicians == 0 {
            0.0
        } else {
            f64::from(total_active_tickets) / total_technicians as f64
        };
        let max_workload = workloads.values().copied().max().unwrap_or(0);
        let min_workload = workloads.values().copied().min().unwrap_or(0);
        let critical_workload_count = workloads
            .values()
            .filter(|&&w| w >= self.config.critical_workload_threshold)
            .count();
        let high_workload_count = workloads
            .values()
            .filter(|&&w| {
                w >= self.config.high_workload_threshold
                    && w < self.config.critical_workload_threshold
            })
            .count();

        Ok(WorkloadStatistics {
            total_technicians,
            total_active_tickets,
            average_workload,
            max_workload,
            min_workload,
            high_workload_count,
            critical_workload_count,
            last_updated: now,
        })
    }
}
