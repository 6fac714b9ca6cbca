use crate::analysis::distribution::{monthly_any_year, option_counts};
use crate::models::incident::{IncidentLevel, IncidentRecord};
use crate::models::summary::{IncidentStats, LevelCounts};

pub fn level_counts<'a, I>(incidents: I) -> LevelCounts
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let mut counts = LevelCounts::default();
    for incident in incidents {
        counts.total += 1;
        match incident.severity_level {
            Some(IncidentLevel::P0) => counts.p0 += 1,
            Some(IncidentLevel::P1) => counts.p1 += 1,
            Some(IncidentLevel::P2) => counts.p2 += 1,
            None => {}
        }
    }
    counts
}

/// Aggregates over the incident log. SaaS incidents are those whose customer
/// mentions "saas" in any case; everything else, blank customers included,
/// counts as private.
pub fn incident_stats(incidents: &[IncidentRecord]) -> IncidentStats {
    let (saas, private): (Vec<&IncidentRecord>, Vec<&IncidentRecord>) =
        incidents.iter().partition(|i| i.is_saas_customer());

    IncidentStats {
        levels: level_counts(incidents),
        saas: level_counts(saas),
        private: level_counts(private),
        team_dist: option_counts(incidents.iter().map(|i| i.owning_team.as_deref())),
        customer_dist: option_counts(incidents.iter().map(|i| i.customer.as_deref())),
        monthly: monthly_any_year(incidents.iter().map(|i| i.incident_date)),
    }
}
