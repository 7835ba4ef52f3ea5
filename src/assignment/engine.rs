//! # Assignment Engine Implementation
//!
//! Core candidate ranking and selection for incoming tickets. Selection is a
//! pure computation over a candidate pool; the caller (the orchestrating
//! [`HelpdeskEngine`](crate::engine::HelpdeskEngine)) makes the selection
//! durable together with the workload increment in one store transaction, so a
//! failed persistence never leaves a half-applied assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AssignmentConfig;
use crate::error::{HelpdeskError, Result};
use crate::technician::{SkillTier, Technician, TechnicianId};
use crate::ticket::Ticket;

use super::skills::{SkillAnalysis, SkillAnalyzer};

/// A technician candidate with its computed ranking inputs
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The technician profile (workload populated by the store)
    pub technician: Technician,

    /// Skill tier for this ticket (lower = better)
    pub tier: SkillTier,

    /// Within-tier match score (higher = better)
    pub match_score: f64,

    /// Scoring breakdown for assignment logs
    pub reasoning: String,
}

/// Outcome of a completed ticket assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    /// The assigned ticket
    pub ticket_number: String,

    /// Selected technician
    pub technician_id: TechnicianId,

    /// Selected technician's display name
    pub technician_name: String,

    /// Skill tier of the selected match
    pub skill_tier: SkillTier,

    /// Match score of the selected candidate
    pub match_score: f64,

    /// Technician workload after the increment
    pub new_workload: u32,

    /// Assignment timestamp
    pub assigned_at: DateTime<Utc>,
}

/// # Assignment Engine for Ticket Distribution
///
/// Given a ticket and a candidate pool (already filtered for availability and
/// capacity), the engine scores every candidate and ranks them by:
///
/// 1. **Skill tier** ascending — skill match dominates;
/// 2. **Current workload** ascending — load-balance within a tier;
/// 3. **Match score** descending — finer skill quality as tie-breaker;
/// 4. **Technician id** ascending — deterministic final tie-break so that
///    repeated runs over identical pools are reproducible.
///
/// # Examples
///
/// ```
/// use helpdesk_engine::assignment::AssignmentEngine;
/// use helpdesk_engine::config::AssignmentConfig;
/// use helpdesk_engine::ticket::{Ticket, TicketPriority};
///
/// let engine = AssignmentEngine::new(AssignmentConfig::default());
/// let ticket = Ticket::new("T20250804.0001", "Network", TicketPriority::High,
///                          "VPN unreachable from branch office");
///
/// // Empty pool: selection fails rather than silently defaulting.
/// assert!(engine.select_technician(&ticket, vec![]).is_err());
/// ```
pub struct AssignmentEngine {
    analyzer: SkillAnalyzer,
}

impl AssignmentEngine {
    /// Create a new assignment engine
    pub fn new(config: AssignmentConfig) -> Self {
        Self {
            analyzer: SkillAnalyzer::new(config),
        }
    }

    /// Analyze a ticket's skill requirements
    pub fn analyze(&self, ticket: &Ticket) -> SkillAnalysis {
        self.analyzer.analyze(ticket)
    }

    /// Score a technician pool against a ticket
    ///
    /// Produces one [`Candidate`] per technician; no filtering happens here —
    /// availability and capacity filtering is the technician source's concern.
    pub fn build_candidates(&self, ticket: &Ticket, pool: Vec<Technician>) -> Vec<Candidate> {
        let analysis = self.analyzer.analyze(ticket);
        pool.into_iter()
            .map(|technician| {
                let scored = self
                    .analyzer
                    .score_technician(ticket, &analysis, &technician);
                debug!("{}", scored.reasoning);
                Candidate {
                    technician,
                    tier: scored.tier,
                    match_score: scored.score,
                    reasoning: scored.reasoning,
                }
            })
            .collect()
    }

    /// Rank candidates in place by the tiered sort key
    pub fn rank_candidates(&self, candidates: &mut [Candidate]) {
        candidates.sort_by(|a, b| {
            a.tier
                .cmp(&b.tier)
                .then(a.technician.current_workload.cmp(&b.technician.current_workload))
                .then(
                    b.match_score
                        .partial_cmp(&a.match_score)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.technician.email.cmp(&b.technician.email))
        });
    }

    /// Select the best technician for a ticket
    ///
    /// Scores and ranks the pool, then returns the first candidate. An empty
    /// pool raises [`HelpdeskError::NoCandidate`], which must propagate to the
    /// caller — the ticket stays unassigned.
    ///
    /// # Errors
    ///
    /// Returns `HelpdeskError::NoCandidate` when the pool is empty.
    pub fn select_technician(&self, ticket: &Ticket, pool: Vec<Technician>) -> Result<Candidate> {
        if pool.is_empty() {
            return Err(HelpdeskError::no_candidate(format!(
                "no available technicians for ticket {}",
                ticket.ticket_number
            )));
        }

        let mut candidates = self.build_candidates(ticket, pool);
        self.rank_candidates(&mut candidates);

        let Some(selected) = candidates.into_iter().next() else {
            return Err(HelpdeskError::no_candidate(format!(
                "no scorable candidates for ticket {}",
                ticket.ticket_number
            )));
        };
        info!(
            "🎯 Selected {} for ticket {} ({}, workload {}, score {:.2})",
            selected.technician.email,
            ticket.ticket_number,
            selected.tier,
            selected.technician.current_workload,
            selected.match_score
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technician::TechnicianStatus;
    use crate::ticket::TicketPriority;

    fn engine() -> AssignmentEngine {
        AssignmentEngine::new(AssignmentConfig::default())
    }

    fn email_tech(email: &str, skills: &[&str], workload: u32) -> Technician {
        Technician {
            email: email.to_string(),
            display_name: email.split('@').next().unwrap().to_string(),
            role: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            status: TechnicianStatus::Available,
            current_workload: workload,
            max_workload: 20,
        }
    }

    fn email_ticket() -> Ticket {
        Ticket::new(
            "T20250804.0001",
            "Email",
            TicketPriority::Medium,
            "cannot send mail",
        )
    }

    const FULL_EMAIL_SKILLS: &[&str] = &[
        "Email Configuration",
        "Outlook Support",
        "Exchange Server",
    ];

    #[test]
    fn tier_dominates_workload() {
        // (Tier1, w=5), (Tier1, w=2), (Tier2/3, w=0): the idle but weakly
        // matched candidate must not win; within tier 1 the lower workload wins.
        let pool = vec![
            email_tech("busy-tier1@example.com", FULL_EMAIL_SKILLS, 5),
            email_tech("calm-tier1@example.com", FULL_EMAIL_SKILLS, 2),
            email_tech("idle-weak@example.com", &["Printer Support"], 0),
        ];

        let selected = engine().select_technician(&email_ticket(), pool).unwrap();
        assert_eq!(selected.technician.email, "calm-tier1@example.com");
        assert_eq!(selected.tier, crate::technician::SkillTier::Tier1);
    }

    #[test]
    fn workload_breaks_ties_within_tier() {
        let pool = vec![
            email_tech("a@example.com", FULL_EMAIL_SKILLS, 7),
            email_tech("b@example.com", FULL_EMAIL_SKILLS, 1),
        ];
        let selected = engine().select_technician(&email_ticket(), pool).unwrap();
        assert_eq!(selected.technician.email, "b@example.com");
    }

    #[test]
    fn match_score_breaks_equal_workload() {
        // Equal workload; the weaker-coverage candidate ranks below the full match.
        let partial = email_tech("partial@example.com", &["Outlook Support"], 3);
        let full = email_tech("full@example.com", FULL_EMAIL_SKILLS, 3);

        let eng = engine();
        let ticket = email_ticket();
        let mut candidates = eng.build_candidates(&ticket, vec![partial, full]);
        eng.rank_candidates(&mut candidates);
        assert_eq!(candidates[0].technician.email, "full@example.com");
    }

    #[test]
    fn fully_equal_candidates_break_by_id() {
        let pool = vec![
            email_tech("zeta@example.com", FULL_EMAIL_SKILLS, 4),
            email_tech("alpha@example.com", FULL_EMAIL_SKILLS, 4),
        ];
        let selected = engine().select_technician(&email_ticket(), pool).unwrap();
        assert_eq!(selected.technician.email, "alpha@example.com");
    }

    #[test]
    fn empty_pool_raises_no_candidate() {
        let err = engine()
            .select_technician(&email_ticket(), vec![])
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::NoCandidate(_)));
    }
}
