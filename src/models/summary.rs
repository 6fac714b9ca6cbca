use crate::models::deployment::DeploymentClass;
use crate::models::incident::IncidentLevel;
use serde::{Deserialize, Serialize};

/// Value counts ordered by count descending, ties in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub entries: Vec<(String, usize)>,
}

impl Distribution {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn get(&self, key: &str) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn top(&self, n: usize) -> &[(String, usize)] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Counts per calendar month, index 0 = January.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCounts {
    pub counts: [usize; 12],
}

impl MonthlyCounts {
    /// `month` is 1-based; out-of-range months read as zero.
    pub fn get(&self, month: u32) -> usize {
        match month {
            1..=12 => self.counts[(month - 1) as usize],
            _ => 0,
        }
    }

    /// `quarter` is 1-based.
    pub fn quarter(&self, quarter: u32) -> usize {
        let first = (quarter.saturating_sub(1)) * 3 + 1;
        (first..first + 3).map(|m| self.get(m)).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn active_months(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(i, count)| (i as u32 + 1, *count))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierResolution {
    pub total: usize,
    pub resolved: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStats {
    pub total: usize,
    pub resolved: usize,
    pub resolution_rate: f64,
    pub p0: TierResolution,
    pub p1: TierResolution,
    pub unresolved_count: usize,
    pub status_dist: Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSlice {
    pub class: DeploymentClass,
    pub total: usize,
    pub resolution: ResolutionStats,
    pub severity_dist: Distribution,
    pub defect_types: Distribution,
    pub customers: Distribution,
    pub p0_customers: Distribution,
    pub monthly: MonthlyCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentComparison {
    pub total_bugs: usize,
    pub saas: DeploymentSlice,
    pub private: DeploymentSlice,
    pub unclassified: DeploymentSlice,
}

impl DeploymentComparison {
    pub fn slice(&self, class: DeploymentClass) -> &DeploymentSlice {
        match class {
            DeploymentClass::Saas => &self.saas,
            DeploymentClass::Private => &self.private,
            DeploymentClass::Unclassified => &self.unclassified,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub total: usize,
    pub p0: usize,
    pub p1: usize,
    pub p2: usize,
}

impl LevelCounts {
    pub fn get(&self, level: IncidentLevel) -> usize {
        match level {
            IncidentLevel::P0 => self.p0,
            IncidentLevel::P1 => self.p1,
            IncidentLevel::P2 => self.p2,
        }
    }
}

/// Aggregates over the incident log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentStats {
    pub levels: LevelCounts,
    pub saas: LevelCounts,
    pub private: LevelCounts,
    pub team_dist: Distribution,
    pub customer_dist: Distribution,
    /// Month of incident date across all years.
    pub monthly: MonthlyCounts,
}
