use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for teams table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TeamModel {
    pub id: i64,
    pub name: String,
    pub total_score: i64, // Running total of all record scores, never negative
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>, // Last rename or logo change
}

impl TeamModel {
    /// Total after applying a score delta, floored at zero and saturating at `i64::MAX`
    pub fn adjusted_total(&self, delta: i64) -> i64 {
        self.total_score.saturating_add(delta).max(0)
    }

    /// Renames the team and optionally replaces its logo
    pub fn apply_update(&mut self, name: String, logo_url: Option<Option<String>>) {
        self.name = name;
        if let Some(logo_url) = logo_url {
            self.logo_url = logo_url;
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Fields needed to register a team; the repository assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub name: String,
    pub logo_url: Option<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, logo_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            logo_url,
        }
    }

    /// Materializes the team with a given id and zero score
    pub fn into_model(self, id: i64) -> TeamModel {
        TeamModel {
            id,
            name: self.name,
            total_score: 0,
            logo_url: self.logo_url,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}
