use serde::Serialize;
use std::collections::BTreeMap;

use crate::activity::models::ActivityRecordModel;
use crate::team::models::TeamModel;

const UNKNOWN_TEAM: &str = "Unknown";

/// Per-team totals over a set of activity records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamMetrics {
    pub team_id: i64,
    pub team_name: String,
    pub points: i64,
    pub new_attendees: i64,
    pub cells_held: i64,
    pub elite_cells: i64,
    pub tuesday_attendance: i64,
    pub arena_attendance: i64,
    pub sunday_attendance: i64,
    pub donations: f64,
    pub record_count: usize,
}

impl TeamMetrics {
    fn add(&mut self, record: &ActivityRecordModel) {
        let c = &record.counters;
        self.points = self.points.saturating_add(record.score);
        self.new_attendees = self.new_attendees.saturating_add(c.new_attendees);
        self.cells_held = self.cells_held.saturating_add(c.cells_held);
        self.elite_cells = self.elite_cells.saturating_add(c.elite_cells);
        self.tuesday_attendance = self.tuesday_attendance.saturating_add(c.tuesday_attendance);
        self.arena_attendance = self.arena_attendance.saturating_add(c.arena_attendance);
        self.sunday_attendance = self.sunday_attendance.saturating_add(c.sunday_attendance);
        self.donations += c.partner_donation;
        self.record_count += 1;
    }
}

/// Aggregates records per team, ordered by points descending then team id.
///
/// Only teams with at least one record appear.
pub fn aggregate(records: &[ActivityRecordModel], teams: &[TeamModel]) -> Vec<TeamMetrics> {
    let mut by_team: BTreeMap<i64, TeamMetrics> = BTreeMap::new();

    for record in records {
        by_team
            .entry(record.team_id)
            .or_insert_with(|| TeamMetrics {
                team_id: record.team_id,
                team_name: teams
                    .iter()
                    .find(|t| t.id == record.team_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
                ..TeamMetrics::default()
            })
            .add(record);
    }

    let mut metrics: Vec<TeamMetrics> = by_team.into_values().collect();
    metrics.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.team_id.cmp(&b.team_id)));
    metrics
}
