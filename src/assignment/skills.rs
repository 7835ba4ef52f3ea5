//! # Skill-Based Technician Matching
//!
//! Derives skill requirements from ticket attributes and scores technicians
//! against them. The output of scoring is a `(SkillTier, match score)` pair:
//! the tier is the dominant ranking criterion in candidate selection, and the
//! score breaks ties within a tier.

use std::collections::HashMap;

use tracing::debug;

use crate::config::AssignmentConfig;
use crate::technician::{SkillTier, Technician};
use crate::ticket::{Ticket, TicketPriority};

/// Result of analyzing a ticket's skill requirements
#[derive(Debug, Clone)]
pub struct SkillAnalysis {
    /// Skills a technician should have to work this ticket
    pub required_skills: Vec<String>,

    /// Complexity estimate on a 1-5 scale
    pub complexity_level: u8,

    /// Specialized knowledge areas (issue-type derived)
    pub specialized_knowledge: Vec<String>,
}

/// Per-candidate scoring outcome
#[derive(Debug, Clone)]
pub struct TechnicianScore {
    /// Skill tier (lower = better match)
    pub tier: SkillTier,

    /// Match quality within the tier (0.0 - 1.0)
    pub score: f64,

    /// Human-readable scoring breakdown for logs
    pub reasoning: String,
}

/// # Skill Analyzer for Ticket/Technician Matching
///
/// The `SkillAnalyzer` maps a ticket's issue type to required technical skills
/// through a static mapping, estimates complexity from priority, and scores
/// each technician candidate on:
///
/// - **Skill coverage** (default 40%): fraction of required skills the
///   technician has (case-insensitive substring match, so "SQL Database"
///   matches a "Database" requirement and vice versa).
/// - **Role alignment** (default 30%): whether the technician's role covers
///   the ticket's issue type.
/// - **Specialization** (default 20%): overlap between specialized knowledge
///   areas and the technician's role/skills.
/// - **Critical boost** (default 10%): flat boost for critical tickets.
///
/// The tier is derived from required-skill coverage: full coverage (at or
/// above the configured strong-match ratio) is tier 1, any partial skill or
/// role match is tier 2, and everything else is tier 3.
///
/// # Examples
///
/// ```
/// use helpdesk_engine::assignment::SkillAnalyzer;
/// use helpdesk_engine::config::AssignmentConfig;
/// use helpdesk_engine::ticket::{Ticket, TicketPriority};
///
/// let analyzer = SkillAnalyzer::new(AssignmentConfig::default());
///
/// let ticket = Ticket::new("T20250804.0002", "Hardware", TicketPriority::Low,
///                          "Printer jams on every second page");
/// let analysis = analyzer.analyze(&ticket);
///
/// assert_eq!(analysis.complexity_level, 2);
/// assert!(analysis.required_skills.contains(&"Printer Support".to_string()));
/// ```
pub struct SkillAnalyzer {
    config: AssignmentConfig,

    /// Issue type -> required skills mapping
    skill_mapping: HashMap<&'static str, Vec<&'static str>>,

    /// Role -> issue-type keywords mapping for role alignment
    role_issue_mapping: HashMap<&'static str, Vec<&'static str>>,
}

impl SkillAnalyzer {
    /// Create a new skill analyzer with the built-in issue-type mappings
    pub fn new(config: AssignmentConfig) -> Self {
        let skill_mapping = HashMap::from([
            (
                "Hardware",
                vec!["Hardware Troubleshooting", "PC Repair", "Printer Support"],
            ),
            (
                "Software/SaaS",
                vec!["Software Installation", "Application Support", "Troubleshooting"],
            ),
            (
                "Network",
                vec!["Network Troubleshooting", "Router Configuration", "WiFi Setup"],
            ),
            (
                "Security",
                vec!["Security Analysis", "Antivirus Support", "Access Control"],
            ),
            (
                "Database",
                vec!["SQL Database", "Database Administration", "Data Recovery"],
            ),
            (
                "Email",
                vec!["Email Configuration", "Outlook Support", "Exchange Server"],
            ),
            (
                "Server",
                vec!["Windows Server", "Linux Server", "Server Administration"],
            ),
        ]);

        let role_issue_mapping = HashMap::from([
            ("Email", vec!["Email", "Outlook", "Exchange"]),
            ("Hardware", vec!["Hardware", "PC", "Printer", "Device"]),
            ("Software", vec!["Software/SaaS", "Application", "Software"]),
            ("Network", vec!["Network", "WiFi", "Router", "Connectivity"]),
            ("Security", vec!["Security", "Antivirus", "Threat"]),
            ("Database", vec!["Database", "SQL", "Data"]),
            ("System Admin", vec!["Server", "System", "Admin"]),
            ("IT Support", vec!["General", "Support", "Help Desk"]),
        ]);

        Self {
            config,
            skill_mapping,
            role_issue_mapping,
        }
    }

    /// Analyze a ticket's skill requirements
    ///
    /// Maps the issue type to required skills and derives complexity from
    /// priority. Unknown issue types fall back to general IT support.
    pub fn analyze(&self, ticket: &Ticket) -> SkillAnalysis {
        let required_skills: Vec<String> = self
            .skill_mapping
            .get(ticket.issue_type.as_str())
            .map(|skills| skills.iter().map(|s| s.to_string()).collect())
            .unwrap_or_else(|| vec!["General IT Support".to_string()]);

        let specialized_knowledge = if ticket.issue_type.is_empty() {
            Vec::new()
        } else {
            vec![ticket.issue_type.clone()]
        };

        let analysis = SkillAnalysis {
            required_skills,
            complexity_level: ticket.priority.complexity_level(),
            specialized_knowledge,
        };

        debug!(
            "Skill analysis for {}: required={:?}, complexity={}",
            ticket.ticket_number, analysis.required_skills, analysis.complexity_level
        );

        analysis
    }

    /// Score a technician against a ticket's requirements
    ///
    /// Returns the skill tier and the within-tier match score along with a
    /// reasoning string for assignment logs.
    pub fn score_technician(
        &self,
        ticket: &Ticket,
        analysis: &SkillAnalysis,
        technician: &Technician,
    ) -> TechnicianScore {
        let mut score = 0.0;
        let mut reasoning_parts = Vec::new();

        // Skill coverage
        let skill_matches = analysis
            .required_skills
            .iter()
            .filter(|required| {
                technician
                    .skills
                    .iter()
                    .any(|skill| skills_overlap(skill, required))
            })
            .count();
        let coverage = if analysis.required_skills.is_empty() {
            0.0
        } else {
            skill_matches as f64 / analysis.required_skills.len() as f64
        };
        score += coverage * self.config.skill_weight;
        reasoning_parts.push(format!(
            "Skill match: {}/{}",
            skill_matches,
            analysis.required_skills.len()
        ));

        // Role alignment
        let role_matched = self.role_matches(&ticket.issue_type, technician);
        if role_matched {
            score += self.config.role_weight;
        }
        reasoning_parts.push(format!(
            "Role match: {} (Role: {})",
            role_matched,
            technician.role.as_deref().unwrap_or("-")
        ));

        // Specialization
        let spec_matches = analysis
            .specialized_knowledge
            .iter()
            .filter(|area| {
                technician
                    .role
                    .as_deref()
                    .map(|role| skills_overlap(role, area))
                    .unwrap_or(false)
                    || technician.skills.iter().any(|s| skills_overlap(s, area))
            })
            .count();
        if !analysis.specialized_knowledge.is_empty() {
            score += (spec_matches as f64 / analysis.specialized_knowledge.len() as f64)
                * self.config.specialization_weight;
            reasoning_parts.push(format!(
                "Specialization match: {}/{}",
                spec_matches,
                analysis.specialized_knowledge.len()
            ));
        }

        // Critical priority boost
        if ticket.priority == TicketPriority::Critical {
            score += self.config.critical_priority_boost;
            reasoning_parts.push("Critical priority boost".to_string());
        }

        let tier = if coverage >= self.config.strong_match_ratio {
            SkillTier::Tier1
        } else if skill_matches > 0 || role_matched || spec_matches > 0 {
            SkillTier::Tier2
        } else {
            SkillTier::Tier3
        };

        let reasoning = format!(
            "{}: {} ({}, score {:.2})",
            technician.display_name,
            reasoning_parts.join(", "),
            tier,
            score
        );

        TechnicianScore {
            tier,
            score: score.min(1.0),
            reasoning,
        }
    }

    fn role_matches(&self, issue_type: &str, technician: &Technician) -> bool {
        let Some(role) = technician.role.as_deref() else {
            return false;
        };
        let issue_lower = issue_type.to_lowercase();
        let role_lower = role.to_lowercase();

        // Direct overlap between the role and the issue type.
        if role_lower.contains(&issue_lower) || issue_lower.contains(&role_lower) {
            return true;
        }

        // Mapped overlap: the role covers one of the issue-type keywords.
        self.role_issue_mapping.iter().any(|(mapped_role, issues)| {
            role_lower.contains(&mapped_role.to_lowercase())
                && issues
                    .iter()
                    .any(|issue| issue_lower.contains(&issue.to_lowercase()))
        })
    }
}

/// Case-insensitive bidirectional substring match between skill names
fn skills_overlap(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technician::TechnicianStatus;

    fn analyzer() -> SkillAnalyzer {
        SkillAnalyzer::new(AssignmentConfig::default())
    }

    fn tech(email: &str, role: Option<&str>, skills: &[&str]) -> Technician {
        Technician {
            email: email.to_string(),
            display_name: email.split('@').next().unwrap().to_string(),
            role: role.map(|r| r.to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            status: TechnicianStatus::Available,
            current_workload: 0,
            max_workload: 10,
        }
    }

    #[test]
    fn maps_known_issue_types() {
        let ticket = Ticket::new(
            "T20250804.0001",
            "Network",
            TicketPriority::Medium,
            "no connectivity",
        );
        let analysis = analyzer().analyze(&ticket);
        assert_eq!(analysis.required_skills.len(), 3);
        assert_eq!(analysis.complexity_level, 3);
        assert_eq!(analysis.specialized_knowledge, vec!["Network".to_string()]);
    }

    #[test]
    fn unknown_issue_type_falls_back_to_general_support() {
        let ticket = Ticket::new(
            "T20250804.0002",
            "Quantum Flux",
            TicketPriority::Low,
            "odd",
        );
        let analysis = analyzer().analyze(&ticket);
        assert_eq!(
            analysis.required_skills,
            vec!["General IT Support".to_string()]
        );
    }

    #[test]
    fn full_coverage_is_tier1() {
        let a = analyzer();
        let ticket = Ticket::new(
            "T20250804.0003",
            "Email",
            TicketPriority::Medium,
            "outlook broken",
        );
        let analysis = a.analyze(&ticket);
        let technician = tech(
            "mail@example.com",
            Some("Email"),
            &["Email Configuration", "Outlook Support", "Exchange Server"],
        );
        let scored = a.score_technician(&ticket, &analysis, &technician);
        assert_eq!(scored.tier, SkillTier::Tier1);
        assert!(scored.score > 0.8);
    }

    #[test]
    fn role_only_match_is_tier2() {
        let a = analyzer();
        let ticket = Ticket::new(
            "T20250804.0004",
            "Network",
            TicketPriority::Medium,
            "wifi down",
        );
        let analysis = a.analyze(&ticket);
        let technician = tech("net@example.com", Some("Network"), &[]);
        let scored = a.score_technician(&ticket, &analysis, &technician);
        assert_eq!(scored.tier, SkillTier::Tier2);
    }

    #[test]
    fn no_overlap_is_tier3() {
        let a = analyzer();
        let ticket = Ticket::new(
            "T20250804.0005",
            "Database",
            TicketPriority::Medium,
            "query slow",
        );
        let analysis = a.analyze(&ticket);
        let technician = tech("desk@example.com", None, &["Printer Support"]);
        let scored = a.score_technician(&ticket, &analysis, &technician);
        assert_eq!(scored.tier, SkillTier::Tier3);
    }

    #[test]
    fn critical_priority_boosts_score() {
        let a = analyzer();
        let mut ticket = Ticket::new(
            "T20250804.0006",
            "Security",
            TicketPriority::Medium,
            "malware",
        );
        let analysis = a.analyze(&ticket);
        let technician = tech("sec@example.com", Some("Security"), &["Security Analysis"]);

        let base = a.score_technician(&ticket, &analysis, &technician).score;
        ticket.priority = TicketPriority::Critical;
        let boosted = a.score_technician(&ticket, &analysis, &technician).score;
        assert!(boosted > base);
    }
}
