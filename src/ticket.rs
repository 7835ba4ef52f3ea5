//! Core ticket types as consumed by the assignment engine
//!
//! Ticket numbers are generated upstream (format `T<YYYYMMDD>.<NNNN>`) and are
//! treated as opaque identifiers here. The engine only reads the attributes it
//! needs for scoring and tracks the status transitions that drive workload
//! bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket status enumeration
///
/// The transition into [`TicketStatus::Resolved`] or [`TicketStatus::Closed`]
/// is the trigger for workload decrement, exactly once per ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Newly created, not yet assigned or being worked
    Open,

    /// Assigned and actively being worked
    InProgress,

    /// Waiting on requester or third party
    OnHold,

    /// Work complete, pending confirmation
    Resolved,

    /// Fully closed
    Closed,
}

impl TicketStatus {
    /// Whether a ticket in this status counts toward its assignee's workload
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::OnHold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "INPROGRESS",
            Self::OnHold => "ONHOLD",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "INPROGRESS" | "IN PROGRESS" | "IN_PROGRESS" => Ok(Self::InProgress),
            "ONHOLD" | "ON HOLD" | "ON_HOLD" => Ok(Self::OnHold),
            "RESOLVED" => Ok(Self::Resolved),
            "CLOSED" => Ok(Self::Closed),
            other => Err(format!("Unknown ticket status: {}", other)),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ticket priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Complexity estimate on a 1-5 scale used by skill analysis
    pub fn complexity_level(&self) -> u8 {
        match self {
            Self::Low => 2,
            Self::Medium => 3,
            Self::High => 4,
            Self::Critical => 5,
        }
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("Unknown ticket priority: {}", other)),
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ticket descriptor as consumed by the assignment engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Externally generated ticket number (`T<YYYYMMDD>.<NNNN>`)
    pub ticket_number: String,

    /// Issue type used for skill matching ("Hardware", "Network", ...)
    pub issue_type: String,

    /// Finer-grained issue classification
    pub sub_issue_type: Option<String>,

    /// Ticket category
    pub category: Option<String>,

    /// Priority level
    pub priority: TicketPriority,

    /// Free-text problem description
    pub description: String,

    /// Requester display name
    pub requester_name: Option<String>,

    /// Requester email
    pub requester_email: Option<String>,

    /// Current lifecycle status
    pub status: TicketStatus,

    /// Email of the technician who owns this ticket, if assigned
    pub assigned_technician: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a minimal open ticket for the given issue type and priority
    ///
    /// # Examples
    ///
    /// ```
    /// use helpdesk_engine::ticket::{Ticket, TicketPriority, TicketStatus};
    ///
    /// let ticket = Ticket::new("T20250804.0001", "Email", TicketPriority::High,
    ///                          "Users report slow email response times");
    /// assert_eq!(ticket.status, TicketStatus::Open);
    /// assert!(ticket.assigned_technician.is_none());
    /// ```
    pub fn new(
        ticket_number: impl Into<String>,
        issue_type: impl Into<String>,
        priority: TicketPriority,
        description: impl Into<String>,
    ) -> Self {
        Self {
            ticket_number: ticket_number.into(),
            issue_type: issue_type.into(),
            sub_issue_type: None,
            category: None,
            priority,
            description: description.into(),
            requester_name: None,
            requester_email: None,
            status: TicketStatus::Open,
            assigned_technician: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn active_statuses() {
        assert!(TicketStatus::Open.is_active());
        assert!(TicketStatus::InProgress.is_active());
        assert!(TicketStatus::OnHold.is_active());
        assert!(!TicketStatus::Resolved.is_active());
        assert!(!TicketStatus::Closed.is_active());
    }

    #[test]
    fn status_round_trip() {
        for status in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::OnHold,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ] {
            assert_eq!(TicketStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert_eq!(
            TicketStatus::from_str("In Progress").unwrap(),
            TicketStatus::InProgress
        );
    }

    #[test]
    fn priority_ordering() {
        assert!(TicketPriority::Critical > TicketPriority::High);
        assert_eq!(TicketPriority::Critical.complexity_level(), 5);
    }
}
