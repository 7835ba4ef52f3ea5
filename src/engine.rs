//! # Help-Desk Engine Orchestrator
//!
//! The [`HelpdeskEngine`] ties the components together: the workload store
//! (roster, tickets, counters), the assignment engine (candidate scoring and
//! selection), and the workload monitor (background refresh and alerts). It
//! owns the cross-cutting policy the components deliberately stay out of:
//!
//! - **Bounded timeouts**: every store call runs under the configured
//!   operation timeout and fails with a store-timeout error rather than
//!   hanging its caller.
//! - **Retry with backoff**: transient store failures are retried with a
//!   linearly growing delay, up to the configured attempt count. Business
//!   failures (no candidate, not found, invalid input) surface immediately.
//! - **Failure isolation**: a failed assignment affects only its ticket; the
//!   monitor and other in-flight work continue untouched.
//!
//! # Quick Start
//!
//! ```
//! use helpdesk_engine::config::HelpdeskConfig;
//! use helpdesk_engine::engine::HelpdeskEngine;
//! use helpdesk_engine::ticket::{Ticket, TicketPriority};
//!
//! # async fn example() -> helpdesk_engine::Result<()> {
//! let engine = HelpdeskEngine::new(HelpdeskConfig::default()).await?;
//! engine.start_monitoring().await;
//!
//! let ticket = Ticket::new("T20250804.0001", "Network", TicketPriority::High,
//!                          "VPN unreachable from the branch office");
//! match engine.submit_ticket(ticket).await {
//!     Ok(result) => println!("assigned to {}", result.technician_id),
//!     Err(e) => println!("ticket left unassigned: {}", e),
//! }
//!
//! engine.stop_monitoring().await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::assignment::{AssignmentEngine, AssignmentResult};
use crate::config::HelpdeskConfig;
use crate::error::{HelpdeskError, Result};
use crate::technician::Technician;
use crate::ticket::Ticket;
use crate::workload::{WorkloadMonitor, WorkloadStatistics, WorkloadStore};

/// Top-level engine combining assignment, workload tracking, and monitoring
pub struct HelpdeskEngine {
    config: HelpdeskConfig,
    store: Arc<WorkloadStore>,
    assignment: AssignmentEngine,
    monitor: WorkloadMonitor,
}

impl HelpdeskEngine {
    /// Create a new engine from a validated configuration
    ///
    /// Connects the store (running migrations) and wires the assignment engine
    /// and monitor. The monitor is created but not started; call
    /// [`start_monitoring`](Self::start_monitoring) to begin background
    /// refresh.
    pub async fn new(config: HelpdeskConfig) -> Result<Self> {
        config.validate()?;
        info!("🚀 Initializing help-desk engine");

        let store = Arc::new(WorkloadStore::connect(&config.database).await?);
        let assignment = AssignmentEngine::new(config.assignment.clone());
        let monitor = WorkloadMonitor::new(Arc::clone(&store), config.monitoring.clone());

        info!("✅ Help-desk engine ready");
        Ok(Self {
            config,
            store,
            assignment,
            monitor,
        })
    }

    /// The engine configuration
    pub fn config(&self) -> &HelpdeskConfig {
        &self.config
    }

    /// The underlying workload store
    pub fn store(&self) -> &Arc<WorkloadStore> {
        &self.store
    }

    /// The workload monitor
    pub fn monitor(&self) -> &WorkloadMonitor {
        &self.monitor
    }

    /// Start the background workload monitor
    pub async fn start_monitoring(&self) {
        self.monitor.start().await;
    }

    /// Stop the background workload monitor
    pub async fn stop_monitoring(&self) {
        self.monitor.stop().await;
    }

    /// Run a store future under the configured operation timeout
    async fn bounded<F, T>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.database.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(HelpdeskError::store_timeout(format!(
                "{operation} exceeded {:?}",
                self.config.database.operation_timeout
            ))),
        }
    }

    /// Retry a store operation on transient failures with linear backoff
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.general.max_store_retries.max(1);
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.general.store_retry_delay * attempt;
                    warn!(
                        "⚠️ {} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempt, max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// Roster management
impl HelpdeskEngine {
    /// Register or update a technician in the roster
    ///
    /// A zero `max_workload` is replaced with the configured default capacity.
    pub async fn register_technician(&self, mut technician: Technician) -> Result<()> {
        if technician.email.trim().is_empty() {
            return Err(HelpdeskError::invalid_input(
                "technician email must not be empty",
            ));
        }
        if technician.max_workload == 0 {
            technician.max_workload = self.config.assignment.default_max_workload;
        }

        self.bounded(
            "register_technician",
            self.store.upsert_technician(&technician),
        )
        .await
    }

    /// List all technicians in the roster
    pub async fn list_technicians(&self) -> Result<Vec<Technician>> {
        self.bounded("list_technicians", self.store.list_technicians())
            .await
    }
}

// Ticket intake and assignment
impl HelpdeskEngine {
    /// Store a new ticket and immediately attempt assignment
    ///
    /// The ticket row is persisted first, so a failed assignment leaves an
    /// unassigned open ticket rather than losing the intake. A
    /// [`HelpdeskError::NoCandidate`] therefore means "stored but nobody
    /// eligible", and the caller decides what to do with the ticket.
    pub async fn submit_ticket(&self, ticket: Ticket) -> Result<AssignmentResult> {
        if ticket.ticket_number.trim().is_empty() {
            return Err(HelpdeskError::invalid_input(
                "ticket number must not be empty",
            ));
        }

        self.bounded("insert_ticket", self.store.insert_ticket(&ticket))
            .await?;
        info!(
            "🎫 Ticket {} received ({}, {})",
            ticket.ticket_number, ticket.issue_type, ticket.priority
        );

        self.assign_ticket(&ticket.ticket_number).await
    }

    /// Assign a stored, unassigned ticket to the best available technician
    ///
    /// Selection ranks the available pool by skill tier, then workload, then
    /// match score; persistence makes the selection and the workload increment
    /// durable in one transaction. Transient store failures are retried with
    /// backoff; selection reruns on each attempt so a retry sees fresh
    /// workloads.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::NoCandidate`] when no technician is eligible; the
    ///   ticket stays unassigned.
    /// - [`HelpdeskError::NotFound`] when the ticket does not exist.
    /// - [`HelpdeskError::InvalidInput`] when the ticket is closed or already
    ///   assigned.
    pub async fn assign_ticket(&self, ticket_number: &str) -> Result<AssignmentResult> {
        let ticket = self
            .bounded("get_ticket", self.store.get_ticket(ticket_number))
            .await?
            .ok_or_else(|| HelpdeskError::not_found(format!("ticket {ticket_number}")))?;

        if !ticket.status.is_active() {
            return Err(HelpdeskError::invalid_input(format!(
                "ticket {ticket_number} is {} and cannot be assigned",
                ticket.status
            )));
        }
        if let Some(assignee) = &ticket.assigned_technician {
            return Err(HelpdeskError::invalid_input(format!(
                "ticket {ticket_number} is already assigned to {assignee}"
            )));
        }

        let ticket_ref = &ticket;
        self.with_retry("assign_ticket", move || async move {
            let pool = self
                .bounded(
                    "list_available_technicians",
                    self.store.list_available_technicians(),
                )
                .await?;

            let candidate = self.assignment.select_technician(ticket_ref, pool)?;
            let new_workload = self
                .bounded(
                    "persist_assignment",
                    self.store
                        .persist_assignment(&ticket_ref.ticket_number, &candidate.technician.email),
                )
                .await?;

            Ok(AssignmentResult {
                ticket_number: ticket_ref.ticket_number.clone(),
                technician_id: candidate.technician.id(),
                technician_name: candidate.technician.display_name.clone(),
                skill_tier: candidate.tier,
                match_score: candidate.match_score,
                new_workload,
                assigned_at: Utc::now(),
            })
        })
        .await
    }

    /// Transfer an active ticket to a specific technician
    ///
    /// The target must exist, be available, and have remaining capacity;
    /// counters for both technicians move in one transaction. Returns the
    /// previous assignee, if any.
    pub async fn reassign_ticket(
        &self,
        ticket_number: &str,
        new_email: &str,
    ) -> Result<Option<String>> {
        let target = self
            .bounded("get_technician", self.store.get_technician(new_email))
            .await?
            .ok_or_else(|| HelpdeskError::not_found(format!("technician {new_email}")))?;

        if target.status != crate::technician::TechnicianStatus::Available {
            return Err(HelpdeskError::invalid_input(format!(
                "technician {new_email} is {} and cannot take tickets",
                target.status
            )));
        }
        if !target.has_capacity() {
            return Err(HelpdeskError::invalid_input(format!(
                "technician {new_email} is at capacity ({}/{})",
                target.current_workload, target.max_workload
            )));
        }

        self.with_retry("reassign_ticket", move || {
            self.bounded(
                "reassign_ticket",
                self.store.reassign_ticket(ticket_number, new_email),
            )
        })
        .await
    }

    /// Close a ticket, decrementing its assignee's workload exactly once
    ///
    /// Returns `true` when the ticket transitioned to closed, `false` when it
    /// was already closed (no decrement happens in that case).
    pub async fn close_ticket(&self, ticket_number: &str) -> Result<bool> {
        self.with_retry("close_ticket", move || {
            self.bounded("close_ticket", self.store.close_ticket(ticket_number))
        })
        .await
    }

    /// Get a stored ticket
    pub async fn get_ticket(&self, ticket_number: &str) -> Result<Option<Ticket>> {
        self.bounded("get_ticket", self.store.get_ticket(ticket_number))
            .await
    }
}

// Workload operations
impl HelpdeskEngine {
    /// Apply a workload delta for a technician
    ///
    /// For lifecycle callers that track assignment changes themselves; most
    /// code should prefer [`submit_ticket`](Self::submit_ticket),
    /// [`reassign_ticket`](Self::reassign_ticket), and
    /// [`close_ticket`](Self::close_ticket), which move the counters as part
    /// of their transactions.
    pub async fn update_workload(&self, email: &str, delta: i64) -> Result<u32> {
        self.with_retry("update_workload", move || {
            self.bounded("update_workload", self.store.update_workload(email, delta))
        })
        .await
    }

    /// Recompute all workload counters from active ticket counts
    pub async fn refresh_all_workloads(&self) -> Result<std::collections::HashMap<String, u32>> {
        self.bounded(
            "refresh_all_workloads",
            self.store.refresh_all_workloads(),
        )
        .await
    }

    /// Aggregate workload statistics across the roster
    pub async fn get_workload_statistics(&self) -> Result<WorkloadStatistics> {
        self.monitor.get_workload_statistics().await
    }
}
