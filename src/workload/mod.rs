//! Workload tracking for technicians
//!
//! The workload of a technician is the count of currently active (non-closed)
//! tickets assigned to them. This module owns both sides of that number:
//!
//! - [`store`]: the durable counter and the ticket rows it is reconciled
//!   against, with atomic increment/decrement and a full-overwrite refresh
//!   path that corrects drift from missed updates.
//! - [`monitor`]: a background task that periodically refreshes counts from
//!   ground truth, logs changes, raises threshold alerts, and keeps a bounded
//!   recent history per technician.
//!
//! All workload mutation goes through the store's update and refresh
//! operations; no other code path writes the counters directly.

pub mod monitor;
pub mod store;

pub use monitor::{
    AlertSeverity, WorkloadAlert, WorkloadMonitor, WorkloadSnapshot, WorkloadStatistics,
};
pub use store::WorkloadStore;
