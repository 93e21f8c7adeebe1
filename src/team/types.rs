use serde::{Deserialize, Serialize};

use super::models::TeamModel;
use crate::activity::models::ActivityRecordModel;
use crate::ranking::Division;
use crate::shared::AppError;

/// Request payload for registering a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Request payload for renaming a team.
/// An absent `logo_url` keeps the current logo; an empty one removes it.
#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Trimmed team name, rejecting blanks
pub(crate) fn validated_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Team name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

/// Empty or whitespace-only logo URLs mean "no logo"
pub(crate) fn normalized_logo(logo_url: Option<String>) -> Option<String> {
    logo_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Team with its current place on the overall scoreboard
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamDetails {
    #[serde(flatten)]
    pub team: TeamModel,
    pub position: usize,
    pub division: Division,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamHistory {
    pub team: TeamModel,
    pub records: Vec<ActivityRecordModel>,
}
