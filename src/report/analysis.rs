use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use strum_macros::{Display, EnumString};

use super::metrics::TeamMetrics;
use crate::scoring::{Counter, WeightTable};
use crate::shared::AppError;

const STRONG_NEW_ATTENDEES: i64 = 10;
const STRONG_ELITE_CELLS: i64 = 5;
const STRONG_DONATIONS: f64 = 100.0;
const STRONG_ARENA: i64 = 20;

const LOW_NEW_ATTENDEES: i64 = 5;
const EXPECTED_CELLS_PER_RECORD: i64 = 3;
const LOW_SUNDAY: i64 = 15;
const LOW_DONATIONS: f64 = 50.0;

const GROWTH_MEAN_NEW_ATTENDEES: f64 = 8.0;

/// Which sections an analysis report contains
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisKind {
    #[default]
    #[serde(alias = "completa")]
    Complete,
    Individual,
    #[serde(alias = "comparativa")]
    Comparative,
    #[serde(alias = "recomendacoes")]
    Recommendations,
}

impl AnalysisKind {
    pub fn includes_individual(&self) -> bool {
        matches!(self, AnalysisKind::Complete | AnalysisKind::Individual)
    }

    pub fn includes_comparative(&self) -> bool {
        matches!(self, AnalysisKind::Complete | AnalysisKind::Comparative)
    }

    pub fn includes_recommendations(&self) -> bool {
        matches!(self, AnalysisKind::Complete | AnalysisKind::Recommendations)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAnalysis {
    pub metrics: TeamMetrics,
    pub strengths: Vec<String>,
    pub attention_areas: Vec<String>,
    pub recommendations: Vec<String>,
}

impl TeamAnalysis {
    pub fn evaluate(metrics: TeamMetrics) -> Self {
        let mut strengths = Vec::new();
        let mut attention_areas = Vec::new();
        let mut recommendations = Vec::new();

        if metrics.new_attendees > STRONG_NEW_ATTENDEES {
            strengths.push(format!(
                "Outstanding outreach: {} new attendees",
                metrics.new_attendees
            ));
        }
        if metrics.elite_cells > STRONG_ELITE_CELLS {
            strengths.push(format!(
                "Elite cells: {} elite cell groups show excellent execution",
                metrics.elite_cells
            ));
        }
        if metrics.donations > STRONG_DONATIONS {
            strengths.push(format!(
                "Financial commitment: {:.2} in partner donations",
                metrics.donations
            ));
        }
        if metrics.arena_attendance > STRONG_ARENA {
            strengths.push(format!(
                "Arena turnout: {} people mobilized",
                metrics.arena_attendance
            ));
        }

        if metrics.new_attendees < LOW_NEW_ATTENDEES {
            attention_areas.push("Outreach needs attention: few new attendees".to_string());
            recommendations
                .push("Run personal invitation strategies and outreach events".to_string());
        }
        if metrics.cells_held < metrics.record_count as i64 * EXPECTED_CELLS_PER_RECORD {
            attention_areas.push("Cell meetings held are below the expected rate".to_string());
            recommendations.push("Strengthen cell leader commitment and offer support".to_string());
        }
        if metrics.sunday_attendance < LOW_SUNDAY {
            attention_areas.push("Sunday attendance can improve".to_string());
            recommendations
                .push("Encourage Sunday service attendance as a habit".to_string());
        }
        if metrics.donations < LOW_DONATIONS {
            attention_areas.push("Partner donation engagement is low".to_string());
            recommendations
                .push("Teach about giving and the benefits of becoming a partner".to_string());
        }

        if strengths.is_empty() {
            strengths.push("Team in development: keep investing".to_string());
        }
        if attention_areas.is_empty() {
            attention_areas.push("No critical areas identified".to_string());
        }
        if recommendations.is_empty() {
            recommendations.push("Keep up the excellent work".to_string());
        }

        Self {
            metrics,
            strengths,
            attention_areas,
            recommendations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub position: usize,
    pub medal: Option<Medal>,
    pub team_id: i64,
    pub team_name: String,
    pub points: i64,
    /// Categories in which this team holds the maximum
    pub highlights: Vec<Counter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLeader {
    pub category: Counter,
    pub team_id: i64,
    pub team_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeSection {
    pub ranking: Vec<RankingRow>,
    pub leaders: Vec<CategoryLeader>,
}

const LEADER_CATEGORIES: [Counter; 4] = [
    Counter::NewAttendees,
    Counter::EliteCells,
    Counter::ArenaAttendance,
    Counter::PartnerDonation,
];

fn category_value(metrics: &TeamMetrics, category: Counter) -> f64 {
    match category {
        Counter::NewAttendees => metrics.new_attendees as f64,
        Counter::EliteCells => metrics.elite_cells as f64,
        Counter::ArenaAttendance => metrics.arena_attendance as f64,
        Counter::PartnerDonation => metrics.donations,
        _ => 0.0,
    }
}

impl ComparativeSection {
    /// Expects metrics already ordered by points
    pub fn build(metrics: &[TeamMetrics]) -> Self {
        let max_new = metrics.iter().map(|m| m.new_attendees).max().unwrap_or(0);
        let max_elite = metrics.iter().map(|m| m.elite_cells).max().unwrap_or(0);

        let ranking = metrics
            .iter()
            .enumerate()
            .map(|(index, m)| {
                let mut highlights = Vec::new();
                if m.new_attendees == max_new {
                    highlights.push(Counter::NewAttendees);
                }
                if m.elite_cells == max_elite {
                    highlights.push(Counter::EliteCells);
                }
                RankingRow {
                    position: index + 1,
                    medal: Medal::for_position(index + 1),
                    team_id: m.team_id,
                    team_name: m.team_name.clone(),
                    points: m.points,
                    highlights,
                }
            })
            .collect();

        // First team in ranking order wins a tie for a category
        let leaders = LEADER_CATEGORIES
            .iter()
            .filter_map(|&category| {
                metrics
                    .iter()
                    .fold(None::<&TeamMetrics>, |best, m| match best {
                        Some(b) if category_value(b, category) >= category_value(m, category) => {
                            Some(b)
                        }
                        _ => Some(m),
                    })
                    .map(|m| CategoryLeader {
                        category,
                        team_id: m.team_id,
                        team_name: m.team_name.clone(),
                        value: category_value(m, category),
                    })
            })
            .collect();

        Self { ranking, leaders }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralRecommendation {
    pub title: String,
    pub description: String,
}

fn general_recommendations(metrics: &[TeamMetrics]) -> Vec<GeneralRecommendation> {
    let mean_new = if metrics.is_empty() {
        0.0
    } else {
        metrics.iter().map(|m| m.new_attendees as f64).sum::<f64>() / metrics.len() as f64
    };

    let mut items = Vec::with_capacity(3);
    if mean_new > GROWTH_MEAN_NEW_ATTENDEES {
        items.push(GeneralRecommendation {
            title: "Strong growth".to_string(),
            description: "New attendee numbers are excellent. Keep investing in invitation events and outreach training.".to_string(),
        });
    } else {
        items.push(GeneralRecommendation {
            title: "Focus on outreach".to_string(),
            description: "Run an intensive outreach campaign: social events, visits and leader training.".to_string(),
        });
    }
    items.push(GeneralRecommendation {
        title: "Strategic planning".to_string(),
        description: "Set clear goals for the next period based on this analysis and follow up weekly.".to_string(),
    });
    items.push(GeneralRecommendation {
        title: "Recognition and motivation".to_string(),
        description: "Celebrate wins publicly and recognize the teams and leaders who stand out.".to_string(),
    });
    items
}

/// Rule-based narrative over a period's team metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub weights: WeightTable,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub individual: Vec<TeamAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparative: Option<ComparativeSection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<GeneralRecommendation>,
}

impl AnalysisReport {
    pub fn build(
        kind: AnalysisKind,
        start: NaiveDate,
        end: NaiveDate,
        metrics: Vec<TeamMetrics>,
        weights: &WeightTable,
    ) -> Result<Self, AppError> {
        if metrics.is_empty() {
            return Err(AppError::Validation(
                "No records found for the selected period".to_string(),
            ));
        }

        let comparative = kind
            .includes_comparative()
            .then(|| ComparativeSection::build(&metrics));
        let recommendations = if kind.includes_recommendations() {
            general_recommendations(&metrics)
        } else {
            Vec::new()
        };
        let individual = if kind.includes_individual() {
            metrics.into_iter().map(TeamAnalysis::evaluate).collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            kind,
            start,
            end,
            generated_at: Utc::now(),
            weights: weights.clone(),
            individual,
            comparative,
            recommendations,
        })
    }

    /// Plain-text rendering of the report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Period: {} to {}", self.start, self.end);

        if !self.individual.is_empty() {
            let _ = writeln!(out, "\n== Team analysis ==");
            for team in &self.individual {
                let m = &team.metrics;
                let _ = writeln!(out, "\n{} ({} points)", m.team_name, m.points);
                let _ = writeln!(out, "Strengths:");
                for item in &team.strengths {
                    let _ = writeln!(out, "  + {item}");
                }
                let _ = writeln!(out, "Attention areas:");
                for item in &team.attention_areas {
                    let _ = writeln!(out, "  ! {item}");
                }
                let _ = writeln!(out, "Recommendations:");
                for item in &team.recommendations {
                    let _ = writeln!(out, "  > {item}");
                }
                let _ = writeln!(
                    out,
                    "Metrics: {} new | {} cells | {} elite | {:.2} donations",
                    m.new_attendees, m.cells_held, m.elite_cells, m.donations
                );
            }
        }

        if let Some(comparative) = &self.comparative {
            let _ = writeln!(out, "\n== Comparative analysis ==");
            for row in &comparative.ranking {
                let medal = row.medal.map(|m| format!(" [{m}]")).unwrap_or_default();
                let highlights = row
                    .highlights
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = write!(out, "{}.{} {} - {} points", row.position, medal, row.team_name, row.points);
                if !highlights.is_empty() {
                    let _ = write!(out, " (top {highlights})");
                }
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "Category leaders:");
            for leader in &comparative.leaders {
                let value = if leader.category.is_monetary() {
                    format!("{:.2}", leader.value)
                } else {
                    format!("{}", leader.value as i64)
                };
                let _ = writeln!(out, "  {}: {} ({value})", leader.category, leader.team_name);
            }
        }

        if !self.recommendations.is_empty() {
            let _ = writeln!(out, "\n== General recommendations ==");
            for item in &self.recommendations {
                let _ = writeln!(out, "* {}: {}", item.title, item.description);
            }
        }

        let _ = writeln!(out, "\nScoring weights:");
        for (counter, weight) in self.weights.entries() {
            let _ = writeln!(out, "  {counter}: {weight}");
        }
        let _ = writeln!(
            out,
            "\nGenerated at {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringPolicy;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metrics(team_id: i64, points: i64) -> TeamMetrics {
        TeamMetrics {
            team_id,
            team_name: format!("Team {team_id}"),
            points,
            record_count: 1,
            ..TeamMetrics::default()
        }
    }

    fn strong(team_id: i64, points: i64) -> TeamMetrics {
        TeamMetrics {
            new_attendees: 12,
            cells_held: 6,
            elite_cells: 6,
            arena_attendance: 25,
            sunday_attendance: 30,
            donations: 150.0,
            ..metrics(team_id, points)
        }
    }

    fn build(kind: AnalysisKind, metrics: Vec<TeamMetrics>) -> Result<AnalysisReport, AppError> {
        AnalysisReport::build(
            kind,
            date(2024, 1, 1),
            date(2024, 1, 31),
            metrics,
            &WeightTable::for_policy(ScoringPolicy::Standard),
        )
    }

    #[test]
    fn strong_team_has_all_strengths_and_no_attention_areas() {
        let analysis = TeamAnalysis::evaluate(strong(1, 300));

        assert_eq!(analysis.strengths.len(), 4);
        assert_eq!(analysis.attention_areas, vec!["No critical areas identified"]);
        assert_eq!(analysis.recommendations, vec!["Keep up the excellent work"]);
    }

    #[test]
    fn weak_team_gets_paired_recommendations() {
        let analysis = TeamAnalysis::evaluate(metrics(1, 0));

        assert_eq!(analysis.strengths, vec!["Team in development: keep investing"]);
        assert_eq!(analysis.attention_areas.len(), 4);
        assert_eq!(analysis.recommendations.len(), 4);
    }

    #[rstest]
    #[case(10, false)]
    #[case(11, true)]
    fn new_attendee_strength_threshold(#[case] new_attendees: i64, #[case] strong: bool) {
        let analysis = TeamAnalysis::evaluate(TeamMetrics {
            new_attendees,
            ..metrics(1, 0)
        });
        let has = analysis
            .strengths
            .iter()
            .any(|s| s.starts_with("Outstanding outreach"));
        assert_eq!(has, strong);
    }

    #[test]
    fn cell_rate_depends_on_record_count() {
        let on_target = TeamAnalysis::evaluate(TeamMetrics {
            cells_held: 6,
            record_count: 2,
            ..strong(1, 0)
        });
        let below = TeamAnalysis::evaluate(TeamMetrics {
            cells_held: 5,
            record_count: 2,
            ..strong(1, 0)
        });

        assert!(!on_target
            .attention_areas
            .iter()
            .any(|a| a.starts_with("Cell meetings")));
        assert!(below.attention_areas.iter().any(|a| a.starts_with("Cell meetings")));
    }

    #[test]
    fn comparative_assigns_medals_and_highlights() {
        let teams = vec![
            TeamMetrics {
                new_attendees: 4,
                elite_cells: 9,
                ..metrics(1, 90)
            },
            TeamMetrics {
                new_attendees: 7,
                ..metrics(2, 60)
            },
            metrics(3, 30),
            metrics(4, 10),
        ];

        let section = ComparativeSection::build(&teams);

        let medals: Vec<Option<Medal>> = section.ranking.iter().map(|r| r.medal).collect();
        assert_eq!(
            medals,
            vec![Some(Medal::Gold), Some(Medal::Silver), Some(Medal::Bronze), None]
        );
        assert_eq!(section.ranking[0].highlights, vec![Counter::EliteCells]);
        assert_eq!(section.ranking[1].highlights, vec![Counter::NewAttendees]);
    }

    #[test]
    fn category_leaders_prefer_higher_ranked_team_on_tie() {
        let teams = vec![
            TeamMetrics {
                donations: 80.0,
                ..metrics(1, 90)
            },
            TeamMetrics {
                donations: 80.0,
                arena_attendance: 12,
                ..metrics(2, 60)
            },
        ];

        let section = ComparativeSection::build(&teams);

        let donation = section
            .leaders
            .iter()
            .find(|l| l.category == Counter::PartnerDonation)
            .unwrap();
        assert_eq!(donation.team_id, 1);
        let arena = section
            .leaders
            .iter()
            .find(|l| l.category == Counter::ArenaAttendance)
            .unwrap();
        assert_eq!(arena.team_id, 2);
        assert_eq!(section.leaders.len(), 4);
    }

    #[rstest]
    #[case(9, "Strong growth")]
    #[case(8, "Focus on outreach")]
    fn general_recommendation_depends_on_mean_new_attendees(
        #[case] new_attendees: i64,
        #[case] expected: &str,
    ) {
        let teams = vec![
            TeamMetrics {
                new_attendees,
                ..metrics(1, 10)
            },
            TeamMetrics {
                new_attendees,
                ..metrics(2, 5)
            },
        ];

        let items = general_recommendations(&teams);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, expected);
    }

    #[test]
    fn kind_selects_sections() {
        let individual = build(AnalysisKind::Individual, vec![metrics(1, 10)]).unwrap();
        assert_eq!(individual.individual.len(), 1);
        assert!(individual.comparative.is_none());
        assert!(individual.recommendations.is_empty());

        let comparative = build(AnalysisKind::Comparative, vec![metrics(1, 10)]).unwrap();
        assert!(comparative.individual.is_empty());
        assert!(comparative.comparative.is_some());

        let complete = build(AnalysisKind::Complete, vec![metrics(1, 10)]).unwrap();
        assert!(!complete.individual.is_empty());
        assert!(complete.comparative.is_some());
        assert!(!complete.recommendations.is_empty());
    }

    #[test]
    fn empty_metrics_is_a_validation_error() {
        let result = build(AnalysisKind::Complete, Vec::new());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!(
            "recommendations".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::Recommendations
        );
        let legacy: AnalysisKind = serde_json::from_str("\"comparativa\"").unwrap();
        assert_eq!(legacy, AnalysisKind::Comparative);
    }

    #[test]
    fn render_text_contains_sections() {
        let report = build(AnalysisKind::Complete, vec![strong(1, 300), metrics(2, 20)]).unwrap();

        let text = report.render_text();

        assert!(text.starts_with("Period: 2024-01-01 to 2024-01-31"));
        assert!(text.contains("== Team analysis =="));
        assert!(text.contains("1. [gold] Team 1 - 300 points"));
        assert!(text.contains("== General recommendations =="));
        assert!(text.contains("elite_cells: 15"));
        assert!(text.contains("Generated at"));
    }
}
