use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::analysis::{AnalysisKind, AnalysisReport};
use crate::activity::models::ActivityRecordModel;

/// Query string for the period report listing
#[derive(Debug, Deserialize)]
pub struct PeriodReportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub team_id: Option<i64>,
}

/// Records whose whole reporting period lies in the range
#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    pub record_count: usize,
    pub total_points: i64,
    pub records: Vec<ActivityRecordModel>,
}

impl PeriodReport {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<i64>,
        records: Vec<ActivityRecordModel>,
    ) -> Self {
        Self {
            start,
            end,
            team_id,
            record_count: records.len(),
            total_points: records
                .iter()
                .fold(0i64, |total, r| total.saturating_add(r.score)),
            records,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    #[serde(alias = "data_inicio")]
    pub start: NaiveDate,
    #[serde(alias = "data_fim")]
    pub end: NaiveDate,
    #[serde(default, alias = "tipo_analise")]
    pub kind: AnalysisKind,
    #[serde(default, alias = "equipe_id")]
    pub team_id: Option<i64>,
}

/// Structured report plus its plain-text rendering
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub text: String,
}

impl From<AnalysisReport> for AnalysisResponse {
    fn from(report: AnalysisReport) -> Self {
        let text = report.render_text();
        Self { report, text }
    }
}
