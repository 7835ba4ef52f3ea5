//! # Help-Desk Engine
//!
//! Ticket assignment and workload management for an IT help desk. The engine
//! takes classified tickets, selects the best available technician for each,
//! keeps per-technician workload counters transactionally correct, and runs a
//! background monitor that reconciles counters from ground truth and raises
//! alerts for overloaded technicians.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     HelpdeskEngine                       │
//! │        (timeouts, retries, failure isolation)            │
//! ├──────────────┬──────────────────────┬────────────────────┤
//! │  Assignment  │    Workload Store    │  Workload Monitor  │
//! │  (scoring &  │  (SQLite: roster,    │  (periodic refresh │
//! │   ranking)   │   tickets, counters) │   & alerts)        │
//! └──────────────┴──────────────────────┴────────────────────┘
//! ```
//!
//! ## Candidate Selection
//!
//! Candidates are ranked by skill tier first, current workload second, and
//! match score third, with technician email as a deterministic final
//! tie-break. Skill match dominates: an idle technician with no relevant
//! skills never outranks a busy specialist. When no technician is eligible
//! the assignment fails with [`HelpdeskError::NoCandidate`] and the ticket
//! stays unassigned.
//!
//! ## Workload Bookkeeping
//!
//! A technician's workload is the count of their active (non-closed) tickets.
//! Assignment increments the counter in the same transaction that persists
//! the assignment; closure decrements it exactly once. The monitor's
//! periodic refresh recomputes every counter from the ticket table, so any
//! drift is corrected within one monitoring interval.
//!
//! ## Quick Start
//!
//! ```
//! use helpdesk_engine::config::HelpdeskConfig;
//! use helpdesk_engine::engine::HelpdeskEngine;
//! use helpdesk_engine::technician::{Technician, TechnicianStatus};
//! use helpdesk_engine::ticket::{Ticket, TicketPriority};
//!
//! # async fn example() -> helpdesk_engine::Result<()> {
//! let engine = HelpdeskEngine::new(HelpdeskConfig::default()).await?;
//!
//! engine.register_technician(Technician {
//!     email: "casey@example.com".to_string(),
//!     display_name: "Casey".to_string(),
//!     role: Some("Network".to_string()),
//!     skills: vec!["Network Troubleshooting".to_string(), "WiFi Setup".to_string()],
//!     status: TechnicianStatus::Available,
//!     current_workload: 0,
//!     max_workload: 10,
//! }).await?;
//!
//! let ticket = Ticket::new("T20250804.0001", "Network", TicketPriority::High,
//!                          "Office WiFi dropping every few minutes");
//! let result = engine.submit_ticket(ticket).await?;
//! println!("assigned to {} ({})", result.technician_name, result.skill_tier);
//! # Ok(())
//! # }
//! ```

pub mod assignment;
pub mod config;
pub mod engine;
pub mod error;
pub mod technician;
pub mod ticket;
pub mod workload;

pub use assignment::{AssignmentEngine, AssignmentResult};
pub use config::HelpdeskConfig;
pub use engine::HelpdeskEngine;
pub use error::{HelpdeskError, Result};
pub use technician::{SkillTier, Technician, TechnicianId, TechnicianStatus};
pub use ticket::{Ticket, TicketPriority, TicketStatus};
pub use workload::{WorkloadMonitor, WorkloadStatistics, WorkloadStore};

/// Common imports for working with the help-desk engine
pub mod prelude {
    pub use crate::assignment::{AssignmentEngine, AssignmentResult, Candidate};
    pub use crate::config::{
        AssignmentConfig, DatabaseConfig, GeneralConfig, HelpdeskConfig, MonitoringConfig,
    };
    pub use crate::engine::HelpdeskEngine;
    pub use crate::error::{HelpdeskError, Result};
    pub use crate::technician::{SkillTier, Technician, TechnicianId, TechnicianStatus};
    pub use crate::ticket::{Ticket, TicketPriority, TicketStatus};
    pub use crate::workload::{
        AlertSeverity, WorkloadAlert, WorkloadMonitor, WorkloadSnapshot, WorkloadStatistics,
        WorkloadStore,
    };
}
