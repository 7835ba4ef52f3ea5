//! # Workload Store (sqlx + SQLite)
//!
//! Durable storage for the technician roster, ticket rows, and the live
//! per-technician workload counters. Built on sqlx with SQLite: fully async,
//! Send-safe, WAL mode with a busy timeout, and migrations embedded at compile
//! time.
//!
//! ## Atomicity
//!
//! Counter updates for the same technician must serialize (no lost updates).
//! Every mutation here is either a single conditional `UPDATE` statement or an
//! explicit transaction, so atomicity is enforced in the store rather than
//! with application-level locks spanning technicians.
//!
//! ## Quick Start
//!
//! ```
//! use helpdesk_engine::workload::WorkloadStore;
//!
//! # async fn example() -> helpdesk_engine::Result<()> {
//! let store = WorkloadStore::new_in_memory().await?;
//! let technicians = store.list_available_technicians().await?;
//! println!("Found {} available technicians", technicians.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{HelpdeskError, Result};
use crate::technician::{Technician, TechnicianStatus};
use crate::ticket::Ticket;

/// SQL fragment matching statuses that count toward workload
const ACTIVE_STATUSES: &str = "('OPEN', 'INPROGRESS', 'ONHOLD')";

/// Main workload store backed by SQLite
#[derive(Clone)]
pub struct WorkloadStore {
    pool: SqlitePool,
}

impl WorkloadStore {
    /// Create a new workload store with automatic migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("🗄️ Initializing workload store: {}", config.url);

        let options = SqliteConnectOptions::from_str(&config.url)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        // An in-memory SQLite database exists per connection; keep a single
        // connection so every operation sees the same database.
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.operation_timeout)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| HelpdeskError::database(format!("failed to run migrations: {e}")))?;

        info!("✅ Workload store initialized (WAL mode enabled)");
        Ok(Self { pool })
    }

    /// Create an in-memory store for testing
    pub async fn new_in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::default()).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn technician_from_row(row: &SqliteRow) -> Result<Technician> {
    let skills_json: Option<String> = row.try_get("skills")?;
    let skills = match skills_json {
        Some(json) if !json.is_empty() => serde_json::from_str(&json)
            .map_err(|e| HelpdeskError::database(format!("malformed skills column: {e}")))?,
        _ => Vec::new(),
    };

    let status_str: String = row.try_get("status")?;
    let status = TechnicianStatus::from_str(&status_str).map_err(HelpdeskError::Database)?;

    Ok(Technician {
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        role: row.try_get("role")?,
        skills,
        status,
        current_workload: row.try_get::<i64, _>("current_workload")? as u32,
        max_workload: row.try_get::<i64, _>("max_workload")? as u32,
    })
}

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket> {
    let status_str: String = row.try_get("status")?;
    let priority_str: String = row.try_get("priority")?;

    Ok(Ticket {
        ticket_number: row.try_get("ticket_number")?,
        issue_type: row.try_get("issue_type")?,
        sub_issue_type: row.try_get("sub_issue_type")?,
        category: row.try_get("category")?,
        priority: priority_str.parse().map_err(HelpdeskError::Database)?,
        description: row
            .try_get::<Option<String>, _>("description")?
            .unwrap_or_default(),
        requester_name: row.try_get("requester_name")?,
        requester_email: row.try_get("requester_email")?,
        status: status_str.parse().map_err(HelpdeskError::Database)?,
        assigned_technician: row.try_get("assigned_technician")?,
        created_at: row.try_get("created_at")?,
    })
}

// Technician roster operations
impl WorkloadStore {
    /// Register or update a technician
    pub async fn upsert_technician(&self, technician: &Technician) -> Result<()> {
        let skills_json = serde_json::to_string(&technician.skills)
            .map_err(|e| HelpdeskError::internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO technicians (email, display_name, role, skills, status, current_workload, max_workload, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                skills = excluded.skills,
                status = excluded.status,
                max_workload = excluded.max_workload,
                updated_at = excluded.updated_at",
        )
        .bind(&technician.email)
        .bind(&technician.display_name)
        .bind(&technician.role)
        .bind(skills_json)
        .bind(technician.status.as_str())
        .bind(technician.current_workload as i64)
        .bind(technician.max_workload as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!("Technician {} upserted", technician.email);
        Ok(())
    }

    /// Get a technician by email
    pub async fn get_technician(&self, email: &str) -> Result<Option<Technician>> {
        let row = sqlx::query("SELECT * FROM technicians WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(technician_from_row).transpose()
    }

    /// List all technicians ordered by email
    pub async fn list_technicians(&self) -> Result<Vec<Technician>> {
        let rows = sqlx::query("SELECT * FROM technicians ORDER BY email")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(technician_from_row).collect()
    }

    /// List technicians eligible for new assignment
    ///
    /// Filters by availability status and remaining capacity, with current
    /// workloads populated. Ordered by email for stable iteration.
    pub async fn list_available_technicians(&self) -> Result<Vec<Technician>> {
        let rows = sqlx::query(
            "SELECT * FROM technicians
             WHERE status = 'AVAILABLE' AND current_workload < max_workload
             ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;

        let technicians: Vec<Technician> =
            rows.iter().map(technician_from_row).collect::<Result<_>>()?;
        debug!("Found {} available technicians", technicians.len());
        Ok(technicians)
    }

    /// Update a technician's availability status
    pub async fn update_technician_status(
        &self,
        email: &str,
        status: TechnicianStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE technicians SET status = ?, updated_at = ? WHERE email = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(HelpdeskError::not_found(format!("technician {email}")));
        }
        debug!("Technician {} status updated to {}", email, status);
        Ok(())
    }
}

// Workload counter operations
impl WorkloadStore {
    /// Apply a delta to a technician's workload counter
    ///
    /// `+1` on assignment, `-1` on closure, or an arbitrary delta for bulk
    /// corrections. The update is a single conditional statement, so
    /// concurrent updates for the same technician cannot lose increments.
    ///
    /// An over-decrement clamps the counter at 0 and logs a drift warning
    /// instead of failing: it indicates bookkeeping drift, not a caller error.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the technician does not exist.
    pub async fn update_workload(&self, email: &str, delta: i64) -> Result<u32> {
        loop {
            let row = sqlx::query(
                "UPDATE technicians
                 SET current_workload = current_workload + ?1, updated_at = ?3
                 WHERE email = ?2 AND current_workload + ?1 >= 0
                 RETURNING current_workload",
            )
            .bind(delta)
            .bind(email)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                let new_workload = row.try_get::<i64, _>("current_workload")? as u32;
                debug!("Workload for {} adjusted by {} -> {}", email, delta, new_workload);
                return Ok(new_workload);
            }

            // The delta would drive the counter negative. The clamp carries
            // the same guard, so a concurrent update that lands between the
            // two statements can never be zeroed out.
            let clamped = sqlx::query(
                "UPDATE technicians SET current_workload = 0, updated_at = ?3
                 WHERE email = ?2 AND current_workload + ?1 < 0
                 RETURNING current_workload",
            )
            .bind(delta)
            .bind(email)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

            if clamped.is_some() {
                warn!(
                    "⚠️ Workload drift: delta {} for {} would go below zero, clamped to 0",
                    delta, email
                );
                return Ok(0);
            }

            // Neither statement matched: unknown technician, or a concurrent
            // update moved the counter between the two statements. Re-apply
            // the delta in the latter case.
            let exists = sqlx::query("SELECT 1 FROM technicians WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?
                .is_some();
            if !exists {
                return Err(HelpdeskError::not_found(format!("technician {email}")));
            }
        }
    }

    /// Recompute every technician's workload from ground truth
    ///
    /// Counts tickets currently in an active status per assignee and
    /// overwrites every stored counter with the recomputed value. This is the
    /// authoritative reconciliation path for drift from missed updates, and
    /// the monitor's periodic tick.
    ///
    /// Running it twice without intervening ticket changes yields identical
    /// output.
    pub async fn refresh_all_workloads(&self) -> Result<HashMap<String, u32>> {
        sqlx::query(&format!(
            "UPDATE technicians SET current_workload = (
                 SELECT COUNT(*) FROM tickets
                 WHERE tickets.assigned_technician = technicians.email
                   AND tickets.status IN {ACTIVE_STATUSES})"
        ))
        .execute(&self.pool)
        .await?;

        let rows = sqlx::query("SELECT email, current_workload FROM technicians")
            .fetch_all(&self.pool)
            .await?;

        let mut workloads = HashMap::with_capacity(rows.len());
        for row in rows {
            workloads.insert(
                row.try_get::<String, _>("email")?,
                row.try_get::<i64, _>("current_workload")? as u32,
            );
        }

        debug!("Refreshed workloads for {} technicians", workloads.len());
        Ok(workloads)
    }

    /// Count active tickets grouped by assigned technician
    ///
    /// The ground truth the refresh path reconciles against; unassigned
    /// tickets are excluded.
    pub async fn count_active_tickets_by_technician(&self) -> Result<HashMap<String, u32>> {
        let rows = sqlx::query(&format!(
            "SELECT assigned_technician, COUNT(*) as active_count FROM tickets
             WHERE status IN {ACTIVE_STATUSES} AND assigned_technician IS NOT NULL
             GROUP BY assigned_technician"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            counts.insert(
                row.try_get::<String, _>("assigned_technician")?,
                row.try_get::<i64, _>("active_count")? as u32,
            );
        }
        Ok(counts)
    }
}

// Ticket lifecycle operations
impl WorkloadStore {
    /// Insert a new ticket row
    pub async fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
        sqlx::query(
            "INSERT INTO tickets (ticket_number, issue_type, sub_issue_type, category, priority,
                                  description, requester_name, requester_email, status,
                                  assigned_technician, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ticket.ticket_number)
        .bind(&ticket.issue_type)
        .bind(&ticket.sub_issue_type)
        .bind(&ticket.category)
        .bind(ticket.priority.as_str())
        .bind(&ticket.description)
        .bind(&ticket.requester_name)
        .bind(&ticket.requester_email)
        .bind(ticket.status.as_str())
        .bind(&ticket.assigned_technician)
        .bind(ticket.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Ticket {} inserted", ticket.ticket_number);
        Ok(())
    }

    /// Get a ticket by number
    pub async fn get_ticket(&self, ticket_number: &str) -> Result<Option<Ticket>> {
        let row = sqlx::query("SELECT * FROM tickets WHERE ticket_number = ?")
            .bind(ticket_number)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    /// Persist an assignment and increment the technician's workload atomically
    ///
    /// The selection decision becomes durable here: the ticket row gains its
    /// assignee and moves to in-progress, and the technician's workload is
    /// incremented, in one transaction. If either step fails nothing is
    /// applied and the selection is not final.
    ///
    /// The ticket update is guarded on `assigned_technician IS NULL`, so a
    /// ticket contributes to at most one workload: racing assignments for the
    /// same ticket resolve to one winner, and the loser gets `InvalidInput`.
    /// Transfers go through [`reassign_ticket`](Self::reassign_ticket), which
    /// moves both counters.
    ///
    /// Returns the technician's workload after the increment.
    pub async fn persist_assignment(&self, ticket_number: &str, email: &str) -> Result<u32> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let updated = sqlx::query(&format!(
            "UPDATE tickets
             SET assigned_technician = ?, status = 'INPROGRESS', assigned_at = ?
             WHERE ticket_number = ? AND status IN {ACTIVE_STATUSES}
               AND assigned_technician IS NULL"
        ))
        .bind(email)
        .bind(now)
        .bind(ticket_number)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            // Distinguish already-assigned from missing or closed.
            let row = sqlx::query(
                "SELECT assigned_technician FROM tickets WHERE ticket_number = ?",
            )
            .bind(ticket_number)
            .fetch_optional(&self.pool)
            .await?;

            return match row {
                Some(row) => {
                    let assignee: Option<String> = row.try_get("assigned_technician")?;
                    match assignee {
                        Some(assignee) => Err(HelpdeskError::invalid_input(format!(
                            "ticket {ticket_number} is already assigned to {assignee}"
                        ))),
                        None => Err(HelpdeskError::not_found(format!(
                            "active ticket {ticket_number}"
                        ))),
                    }
                }
                None => Err(HelpdeskError::not_found(format!("ticket {ticket_number}"))),
            };
        }

        let row = sqlx::query(
            "UPDATE technicians
             SET current_workload = current_workload + 1, updated_at = ?
             WHERE email = ?
             RETURNING current_workload",
        )
        .bind(now)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(HelpdeskError::not_found(format!("technician {email}")));
        };
        let new_workload = row.try_get::<i64, _>("current_workload")? as u32;

        tx.commit().await?;
        info!(
            "✅ Ticket {} assigned to {} (workload now {})",
            ticket_number, email, new_workload
        );
        Ok(new_workload)
    }

    /// Transfer a ticket to a different technician atomically
    ///
    /// Decrements the previous assignee (clamped at zero), sets the new
    /// assignee, and increments their workload, all in one transaction.
    ///
    /// Returns the previous assignee, if any.
    pub async fn reassign_ticket(
        &self,
        ticket_number: &str,
        new_email: &str,
    ) -> Result<Option<String>> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "SELECT assigned_technician FROM tickets
             WHERE ticket_number = ? AND status IN {ACTIVE_STATUSES}"
        ))
        .bind(ticket_number)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(HelpdeskError::not_found(format!(
                "active ticket {ticket_number}"
            )));
        };
        let previous: Option<String> = row.try_get("assigned_technician")?;

        if previous.as_deref() == Some(new_email) {
            tx.rollback().await?;
            return Err(HelpdeskError::invalid_input(format!(
                "ticket {ticket_number} is already assigned to {new_email}"
            )));
        }

        if let Some(ref old_email) = previous {
            let decremented = sqlx::query(
                "UPDATE technicians
                 SET current_workload = current_workload - 1, updated_at = ?
                 WHERE email = ? AND current_workload >= 1",
            )
            .bind(now)
            .bind(old_email)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                warn!(
                    "⚠️ Workload drift: decrement for {} during reassignment found counter at 0",
                    old_email
                );
            }
        }

        sqlx::query(
            "UPDATE tickets SET assigned_technician = ?, assigned_at = ? WHERE ticket_number = ?",
        )
        .bind(new_email)
        .bind(now)
        .bind(ticket_number)
        .execute(&mut *tx)
        .await?;

        let incremented = sqlx::query(
            "UPDATE technicians
             SET current_workload = current_workload + 1, updated_at = ?
             WHERE email = ?",
        )
        .bind(now)
        .bind(new_email)
        .execute(&mut *tx)
        .await?;

        if incremented.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(HelpdeskError::not_found(format!("technician {new_email}")));
        }

        tx.commit().await?;
        info!(
            "🔁 Ticket {} reassigned {} -> {}",
            ticket_number,
            previous.as_deref().unwrap_or("(unassigned)"),
            new_email
        );
        Ok(previous)
    }

    /// Close a ticket and decrement its assignee's workload exactly once
    ///
    /// The decrement fires only on the transition from an active status to
    /// `CLOSED`; closing an already-closed ticket is a no-op that returns
    /// `false`, so repeated closure calls never double-decrement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ticket does not exist at all.
    pub async fn close_ticket(&self, ticket_number: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "UPDATE tickets SET status = 'CLOSED', closed_at = ?
             WHERE ticket_number = ? AND status IN {ACTIVE_STATUSES}
             RETURNING assigned_technician"
        ))
        .bind(now)
        .bind(ticket_number)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            // Distinguish "already closed" from "never existed".
            let exists = sqlx::query("SELECT 1 FROM tickets WHERE ticket_number = ?")
                .bind(ticket_number)
                .fetch_optional(&self.pool)
                .await?
                .is_some();
            return if exists {
                debug!("Ticket {} already closed, no decrement", ticket_number);
                Ok(false)
            } else {
                Err(HelpdeskError::not_found(format!("ticket {ticket_number}")))
            };
        };

        let assignee: Option<String> = row.try_get("assigned_technician")?;
        if let Some(ref email) = assignee {
            let decremented = sqlx::query(
                "UPDATE technicians
                 SET current_workload = current_workload - 1, updated_at = ?
                 WHERE email = ? AND current_workload >= 1",
            )
            .bind(now)
            .bind(email)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                warn!(
                    "⚠️ Workload drift: closure of {} found {}'s counter already at 0",
                    ticket_number, email
                );
            }
        }

        tx.commit().await?;
        info!(
            "📪 Ticket {} closed (assignee: {})",
            ticket_number,
            assignee.as_deref().unwrap_or("none")
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{TicketPriority, TicketStatus};

    fn technician(email: &str, workload: u32) -> Technician {
        Technician {
            email: email.to_string(),
            display_name: email.split('@').next().unwrap().to_string(),
            role: None,
            skills: vec!["General IT Support".to_string()],
            status: TechnicianStatus::Available,
            current_workload: workload,
            max_workload: 10,
        }
    }

    fn ticket(number: &str) -> Ticket {
        Ticket::new(number, "Email", TicketPriority::Medium, "test ticket")
    }

    async fn store_with_tech(email: &str) -> WorkloadStore {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        store.upsert_technician(&technician(email, 0)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn store_creation() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        let technicians = store.list_available_technicians().await.unwrap();
        assert!(technicians.is_empty());
    }

    #[tokio::test]
    async fn send_safety() {
        let store = WorkloadStore::new_in_memory().await.unwrap();

        // Must compile without Send trait issues.
        let handle = tokio::spawn(async move {
            let _technicians = store.list_available_technicians().await.unwrap();
        });

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn technician_round_trip() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        let mut tech = technician("alice@example.com", 3);
        tech.role = Some("Network".to_string());
        store.upsert_technician(&tech).await.unwrap();

        let fetched = store
            .get_technician("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.role.as_deref(), Some("Network"));
        assert_eq!(fetched.skills, vec!["General IT Support".to_string()]);
        assert_eq!(fetched.current_workload, 3);
    }

    #[tokio::test]
    async fn availability_filter_excludes_full_and_offline() {
        let store = WorkloadStore::new_in_memory().await.unwrap();

        let mut full = technician("full@example.com", 10);
        full.max_workload = 10;
        let mut offline = technician("offline@example.com", 0);
        offline.status = TechnicianStatus::Offline;
        let free = technician("free@example.com", 2);

        for t in [&full, &offline, &free] {
            store.upsert_technician(t).await.unwrap();
        }

        let available = store.list_available_technicians().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].email, "free@example.com");
    }

    #[tokio::test]
    async fn increment_and_decrement() {
        let store = store_with_tech("alice@example.com").await;

        assert_eq!(store.update_workload("alice@example.com", 1).await.unwrap(), 1);
        assert_eq!(store.update_workload("alice@example.com", 1).await.unwrap(), 2);
        assert_eq!(store.update_workload("alice@example.com", -1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn over_decrement_clamps_to_zero() {
        let store = store_with_tech("alice@example.com").await;

        // Counter is 0; a decrement is drift, clamped rather than failed.
        assert_eq!(store.update_workload("alice@example.com", -1).await.unwrap(), 0);
        assert_eq!(store.update_workload("alice@example.com", -5).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_technician_is_not_found() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        let err = store.update_workload("ghost@example.com", 1).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn assignment_increments_exactly_one_technician() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        store.upsert_technician(&technician("alice@example.com", 0)).await.unwrap();
        store.upsert_technician(&technician("bob@example.com", 0)).await.unwrap();
        store.insert_ticket(&ticket("T20250804.0001")).await.unwrap();

        let new_workload = store
            .persist_assignment("T20250804.0001", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(new_workload, 1);

        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        let bob = store.get_technician("bob@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 1);
        assert_eq!(bob.current_workload, 0);

        let stored = store.get_ticket("T20250804.0001").await.unwrap().unwrap();
        assert_eq!(stored.assigned_technician.as_deref(), Some("alice@example.com"));
        assert_eq!(stored.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn second_assignment_of_same_ticket_is_rejected() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        store.upsert_technician(&technician("alice@example.com", 0)).await.unwrap();
        store.upsert_technician(&technician("bob@example.com", 0)).await.unwrap();
        store.insert_ticket(&ticket("T20250804.0001")).await.unwrap();

        store
            .persist_assignment("T20250804.0001", "alice@example.com")
            .await
            .unwrap();
        let err = store
            .persist_assignment("T20250804.0001", "bob@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidInput(_)));

        // The ticket contributes to exactly one workload.
        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        let bob = store.get_technician("bob@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 1);
        assert_eq!(bob.current_workload, 0);

        let stored = store.get_ticket("T20250804.0001").await.unwrap().unwrap();
        assert_eq!(stored.assigned_technician.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn clamp_only_fires_when_result_would_be_negative() {
        let store = store_with_tech("alice@example.com").await;
        store.update_workload("alice@example.com", 2).await.unwrap();

        // -5 from 2 clamps; the subsequent deltas apply normally.
        assert_eq!(store.update_workload("alice@example.com", -5).await.unwrap(), 0);
        assert_eq!(store.update_workload("alice@example.com", 3).await.unwrap(), 3);
        assert_eq!(store.update_workload("alice@example.com", -3).await.unwrap(), 0);

        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 0);
    }

    #[tokio::test]
    async fn failed_assignment_rolls_back_ticket_update() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        store.insert_ticket(&ticket("T20250804.0002")).await.unwrap();

        let err = store
            .persist_assignment("T20250804.0002", "ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::NotFound(_)));

        // The increment failed, so the ticket update must not have survived.
        let stored = store.get_ticket("T20250804.0002").await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Open);
        assert!(stored.assigned_technician.is_none());
    }

    #[tokio::test]
    async fn close_decrements_exactly_once() {
        let store = store_with_tech("alice@example.com").await;
        store.insert_ticket(&ticket("T20250804.0003")).await.unwrap();
        store
            .persist_assignment("T20250804.0003", "alice@example.com")
            .await
            .unwrap();

        assert!(store.close_ticket("T20250804.0003").await.unwrap());
        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 0);

        // Second closure is a no-op: no double decrement, counter stays at 0.
        assert!(!store.close_ticket("T20250804.0003").await.unwrap());
        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 0);
    }

    #[tokio::test]
    async fn closing_missing_ticket_is_not_found() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        let err = store.close_ticket("T19990101.0000").await.unwrap_err();
        assert!(matches!(err, HelpdeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn reassignment_transfers_workload() {
        let store = WorkloadStore::new_in_memory().await.unwrap();
        store.upsert_technician(&technician("alice@example.com", 0)).await.unwrap();
        store.upsert_technician(&technician("bob@example.com", 0)).await.unwrap();
        store.insert_ticket(&ticket("T20250804.0004")).await.unwrap();
        store
            .persist_assignment("T20250804.0004", "alice@example.com")
            .await
            .unwrap();

        let previous = store
            .reassign_ticket("T20250804.0004", "bob@example.com")
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some("alice@example.com"));

        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        let bob = store.get_technician("bob@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 0);
        assert_eq!(bob.current_workload, 1);
    }

    #[tokio::test]
    async fn reassignment_to_current_assignee_is_rejected() {
        let store = store_with_tech("alice@example.com").await;
        store.insert_ticket(&ticket("T20250804.0005")).await.unwrap();
        store
            .persist_assignment("T20250804.0005", "alice@example.com")
            .await
            .unwrap();

        let err = store
            .reassign_ticket("T20250804.0005", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn refresh_reconciles_drifted_counter() {
        let store = store_with_tech("alice@example.com").await;
        for n in 1..=3 {
            store
                .insert_ticket(&ticket(&format!("T20250804.000{n}")))
                .await
                .unwrap();
            store
                .persist_assignment(&format!("T20250804.000{n}"), "alice@example.com")
                .await
                .unwrap();
        }

        // Simulate drift from a missed decrement.
        store.update_workload("alice@example.com", 4).await.unwrap();

        let workloads = store.refresh_all_workloads().await.unwrap();
        assert_eq!(workloads["alice@example.com"], 3);
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let store = store_with_tech("alice@example.com").await;
        store.insert_ticket(&ticket("T20250804.0001")).await.unwrap();
        store
            .persist_assignment("T20250804.0001", "alice@example.com")
            .await
            .unwrap();

        let first = store.refresh_all_workloads().await.unwrap();
        let second = store.refresh_all_workloads().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrent_increments_lose_no_updates() {
        let store = store_with_tech("alice@example.com").await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update_workload("alice@example.com", 1).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let alice = store.get_technician("alice@example.com").await.unwrap().unwrap();
        assert_eq!(alice.current_workload, 20);
    }

    #[tokio::test]
    async fn active_counts_exclude_closed_tickets() {
        let store = store_with_tech("alice@example.com").await;
        store.insert_ticket(&ticket("T20250804.0001")).await.unwrap();
        store.insert_ticket(&ticket("T20250804.0002")).await.unwrap();
        store
            .persist_assignment("T20250804.0001", "alice@example.com")
            .await
            .unwrap();
        store
            .persist_assignment("T20250804.0002", "alice@example.com")
            .await
            .unwrap();
        store.close_ticket("T20250804.0001").await.unwrap();

        let counts = store.count_active_tickets_by_technician().await.unwrap();
        assert_eq!(counts["alice@example.com"], 1);
    }
}
