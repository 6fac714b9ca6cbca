use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentLevel {
    P0,
    P1,
    P2,
}

impl IncidentLevel {
    pub const ALL: [IncidentLevel; 3] = [IncidentLevel::P0, IncidentLevel::P1, IncidentLevel::P2];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "P0" | "p0" => Some(IncidentLevel::P0),
            "P1" | "p1" => Some(IncidentLevel::P1),
            "P2" | "p2" => Some(IncidentLevel::P2),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            IncidentLevel::P0 => "P0",
            IncidentLevel::P1 => "P1",
            IncidentLevel::P2 => "P2",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IncidentLevel::P0 => "阻塞性问题",
            IncidentLevel::P1 => "核心功能问题",
            IncidentLevel::P2 => "一般问题",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub report_name: String,
    pub incident_date: Option<NaiveDate>,
    /// Raw date cell, echoed in the unmatched listing even when unparseable.
    pub incident_date_raw: Option<String>,
    pub severity_level: Option<IncidentLevel>,
    pub customer: Option<String>,
    pub owning_team: Option<String>,
}

impl IncidentRecord {
    pub fn is_saas_customer(&self) -> bool {
        self.customer
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains("saas"))
    }
}
