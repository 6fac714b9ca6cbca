use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyEntry {
    pub date: String, // "YYYYMMDD"
    pub raw_content: String,
    pub privatization: Vec<String>,
    pub incidents: Vec<String>,
    pub products: BTreeMap<String, Vec<String>>,
    pub personnel: Vec<String>,
    pub clients: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Attention,
    Critical,
}

impl HealthStatus {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.2 {
            HealthStatus::Healthy
        } else if ratio < 0.5 {
            HealthStatus::Attention
        } else {
            HealthStatus::Critical
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✅",
            HealthStatus::Attention => "⚠️",
            HealthStatus::Critical => "🔴",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHealth {
    pub client: String,
    pub total_mentions: usize,
    pub incident_count: usize,
    pub incident_ratio: f64,
    pub health_status: HealthStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
}

impl ActivityLevel {
    pub fn from_mentions(mentions: usize) -> Self {
        if mentions > 20 {
            ActivityLevel::High
        } else if mentions > 10 {
            ActivityLevel::Medium
        } else {
            ActivityLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::High => "high",
            ActivityLevel::Medium => "medium",
            ActivityLevel::Low => "low",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActivityLevel::High => "🔥",
            ActivityLevel::Medium => "📈",
            ActivityLevel::Low => "📊",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductProgress {
    pub product: String,
    pub weekly_mentions: usize,
    pub activity_level: ActivityLevel,
    pub recent_activities: Vec<(String, String)>, // (date, line)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatedLine {
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentDigest {
    pub total_incidents: usize,
    pub monthly_distribution: BTreeMap<String, usize>,
    pub client_incidents: Vec<(String, usize)>,
    pub recent_incidents: Vec<DatedLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonnelDigest {
    pub total_events: usize,
    pub events: Vec<DatedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSearchHit {
    pub date: String,
    pub incidents: Vec<String>,
    pub relevant_content: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSearchHit {
    pub date: String,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Document written by `weekly export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAnalysis {
    pub generated_at: String,
    pub total_entries: usize,
    pub date_range: DateRange,
    pub client_health: Vec<ClientHealth>,
    pub product_progress: Vec<ProductProgress>,
    pub incidents: IncidentDigest,
    pub personnel: PersonnelDigest,
}
