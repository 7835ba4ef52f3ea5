//! Technician assignment for incoming tickets
//!
//! This module turns a classified ticket and a pool of technician candidates
//! into a single assignment decision:
//!
//! 1. **Skill analysis** ([`skills`]): derive the required skills and
//!    specialized knowledge from the ticket's issue type and priority.
//! 2. **Scoring** ([`skills`]): place each candidate into a skill tier and
//!    compute a within-tier match score.
//! 3. **Selection** ([`engine`]): rank candidates by
//!    `(skill tier asc, workload asc, match score desc)` and pick the first.
//!
//! Tiering ensures skill match dominates; workload is only a tie-breaker
//! within a tier, which load-balances among equally qualified technicians
//! without letting an idle generalist outrank a busy specialist.
//!
//! # Examples
//!
//! ```
//! use helpdesk_engine::assignment::{AssignmentEngine, SkillAnalyzer};
//! use helpdesk_engine::config::AssignmentConfig;
//! use helpdesk_engine::ticket::{Ticket, TicketPriority};
//!
//! let ticket = Ticket::new("T20250804.0001", "Network", TicketPriority::High,
//!                          "Office WiFi dropping every few minutes");
//!
//! let analyzer = SkillAnalyzer::new(AssignmentConfig::default());
//! let analysis = analyzer.analyze(&ticket);
//! assert!(analysis.required_skills.iter().any(|s| s.contains("Network")));
//! ```

pub mod engine;
pub mod skills;

pub use engine::{AssignmentEngine, AssignmentResult, Candidate};
pub use skills::{SkillAnalysis, SkillAnalyzer};
