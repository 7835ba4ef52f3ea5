//! Core types for technician management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Technician identifier type for strongly-typed references
///
/// Technicians are identified by their unique email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TechnicianId(pub String);

impl From<String> for TechnicianId {
    fn from(s: String) -> Self {
        TechnicianId(s)
    }
}

impl From<&str> for TechnicianId {
    fn from(s: &str) -> Self {
        TechnicianId(s.to_string())
    }
}

impl fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TechnicianId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Technician availability status
///
/// Only [`TechnicianStatus::Available`] technicians are eligible for new
/// ticket assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechnicianStatus {
    /// Available for new tickets
    Available,

    /// Temporarily not taking new tickets
    Unavailable,

    /// Logged out or disconnected
    Offline,
}

impl TechnicianStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Unavailable => "UNAVAILABLE",
            Self::Offline => "OFFLINE",
        }
    }
}

impl std::str::FromStr for TechnicianStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(Self::Available),
            "UNAVAILABLE" => Ok(Self::Unavailable),
            "OFFLINE" => Ok(Self::Offline),
            other => Err(format!("Unknown technician status: {}", other)),
        }
    }
}

impl fmt::Display for TechnicianStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Skill tier expressing how well a technician's skills match a ticket
///
/// Lower tier number = better match; the tier dominates workload in candidate
/// ranking, so an idle but weakly-matched technician cannot steal work from a
/// busy, well-matched one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillTier {
    /// Strong match: full coverage of the required skills
    Tier1 = 1,

    /// Partial match: some required skills or a matching role
    Tier2 = 2,

    /// Weak match: eligible but with no direct skill overlap
    Tier3 = 3,
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {}", *self as u8)
    }
}

/// Technician profile with live workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    /// Unique email address (primary key)
    pub email: String,

    /// Human-readable display name
    pub display_name: String,

    /// Role / department ("Network", "System Admin", ...)
    pub role: Option<String>,

    /// Skill tags used for ticket matching
    pub skills: Vec<String>,

    /// Current availability status
    pub status: TechnicianStatus,

    /// Count of currently active tickets assigned to this technician
    ///
    /// Mutated exclusively through the workload store's update and refresh
    /// operations; never negative.
    pub current_workload: u32,

    /// Maximum concurrent active tickets
    pub max_workload: u32,
}

impl Technician {
    /// Whether this technician can accept another ticket
    pub fn has_capacity(&self) -> bool {
        self.current_workload < self.max_workload
    }

    pub fn id(&self) -> TechnicianId {
        TechnicianId(self.email.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering() {
        assert!(SkillTier::Tier1 < SkillTier::Tier2);
        assert!(SkillTier::Tier2 < SkillTier::Tier3);
    }

    #[test]
    fn capacity_gating() {
        let tech = Technician {
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            role: None,
            skills: vec![],
            status: TechnicianStatus::Available,
            current_workload: 10,
            max_workload: 10,
        };
        assert!(!tech.has_capacity());
    }
}
