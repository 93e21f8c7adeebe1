use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{PeriodMatch, RecordFilter, ScoreboardRepository};
use crate::activity::models::{ActivityRecordModel, NewActivityRecord};
use crate::scoring::CounterSet;
use crate::shared::AppError;
use crate::team::models::{NewTeam, TeamModel};

const TEAMS_TABLE: &str = "teams";
const RECORDS_TABLE: &str = "activity_records";

/// Connection settings for a PostgREST-style table service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedTableConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Repository backed by a hosted table service speaking the PostgREST protocol.
///
/// The remote tables mirror the relational schema in `migrations/`.
/// Score adjustment reads the team and writes the new total back in two
/// requests, so concurrent adjustments to one team can lose an update.
pub struct HostedTableRepository {
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct TeamInsert<'a> {
    name: &'a str,
    logo_url: Option<&'a str>,
}

#[derive(Serialize)]
struct RecordRow<'a> {
    team_id: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    #[serde(flatten)]
    counters: &'a CounterSet,
    score: i64,
}

impl HostedTableRepository {
    pub fn new(config: HostedTableConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| AppError::Validation("Hosted table key is not a valid header".into()))?;
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| AppError::Validation("Hosted table key is not a valid header".into()))?;
        headers.insert("apikey", key);
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            "Prefer",
            header::HeaderValue::from_static("return=representation"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to build hosted table client");
                AppError::StorageUnavailable(e.to_string())
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response, AppError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, context, "Hosted table request failed");
            AppError::StorageUnavailable(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, context, "Hosted table returned an error status");
            return Err(AppError::StorageUnavailable(format!(
                "{context}: hosted table returned {status}"
            )));
        }

        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, AppError> {
        response.json::<Vec<T>>().await.map_err(|e| {
            warn!(error = %e, "Failed to decode hosted table response");
            AppError::StorageUnavailable(e.to_string())
        })
    }

    async fn first_row<T: DeserializeOwned>(response: Response) -> Result<Option<T>, AppError> {
        Ok(Self::rows::<T>(response).await?.into_iter().next())
    }
}

fn id_filter(id: i64) -> (String, String) {
    ("id".to_string(), format!("eq.{id}"))
}

/// PATCH body for a rename or logo change; total_score is never sent
fn team_update_body(team: &TeamModel) -> serde_json::Value {
    json!({
        "name": team.name,
        "logo_url": team.logo_url,
        "updated_at": team.updated_at,
    })
}

/// PostgREST query parameters selecting the records a filter matches
fn record_query(filter: &RecordFilter) -> Vec<(String, String)> {
    let mut query = vec![
        ("select".to_string(), "*".to_string()),
        ("order".to_string(), "created_at.desc,id.desc".to_string()),
    ];

    if let Some(team_id) = filter.team_id {
        query.push(("team_id".to_string(), format!("eq.{team_id}")));
    }

    if let Some(period) = filter.period {
        query.push(("period_start".to_string(), format!("gte.{}", period.start)));
        match period.matching {
            PeriodMatch::StartWithin => {
                query.push(("period_start".to_string(), format!("lte.{}", period.end)))
            }
            PeriodMatch::SpanWithin => {
                query.push(("period_end".to_string(), format!("lte.{}", period.end)))
            }
        }
    }

    query
}

#[async_trait]
impl ScoreboardRepository for HostedTableRepository {
    #[instrument(skip(self, team))]
    async fn create_team(&self, team: NewTeam) -> Result<TeamModel, AppError> {
        debug!(name = %team.name, "Creating team in hosted table");

        let body = TeamInsert {
            name: &team.name,
            logo_url: team.logo_url.as_deref(),
        };
        let response = self
            .send(
                self.client.post(self.table_url(TEAMS_TABLE)).json(&body),
                "create team",
            )
            .await?;

        Self::first_row(response)
            .await?
            .ok_or_else(|| AppError::StorageUnavailable("create team returned no row".into()))
    }

    #[instrument(skip(self))]
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError> {
        debug!(team_id, "Fetching team from hosted table");

        let response = self
            .send(
                self.client
                    .get(self.table_url(TEAMS_TABLE))
                    .query(&[id_filter(team_id)]),
                "get team",
            )
            .await?;

        Self::first_row(response).await
    }

    #[instrument(skip(self))]
    async fn list_teams(&self) -> Result<Vec<TeamModel>, AppError> {
        let response = self
            .send(
                self.client
                    .get(self.table_url(TEAMS_TABLE))
                    .query(&[("select", "*"), ("order", "id.asc")]),
                "list teams",
            )
            .await?;

        Self::rows(response).await
    }

    #[instrument(skip(self, team))]
    async fn update_team(&self, team: &TeamModel) -> Result<TeamModel, AppError> {
        debug!(team_id = team.id, "Updating team in hosted table");

        let body = team_update_body(team);
        let response = self
            .send(
                self.client
                    .patch(self.table_url(TEAMS_TABLE))
                    .query(&[id_filter(team.id)])
                    .json(&body),
                "update team",
            )
            .await?;

        Self::first_row::<TeamModel>(response)
            .await?
            .ok_or_else(|| {
                warn!(team_id = team.id, "Team not found for update in hosted table");
                AppError::NotFound("Team not found".to_string())
            })
    }

    #[instrument(skip(self))]
    async fn delete_team(&self, team_id: i64) -> Result<(), AppError> {
        debug!(team_id, "Deleting team from hosted table");

        if self.get_team(team_id).await?.is_none() {
            warn!(team_id, "Team not found for deletion in hosted table");
            return Err(AppError::NotFound("Team not found".to_string()));
        }

        self.send(
            self.client
                .delete(self.table_url(RECORDS_TABLE))
                .query(&[("team_id", format!("eq.{team_id}"))]),
            "delete team records",
        )
        .await?;

        self.send(
            self.client
                .delete(self.table_url(TEAMS_TABLE))
                .query(&[id_filter(team_id)]),
            "delete team",
        )
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn adjust_team_score(&self, team_id: i64, delta: i64) -> Result<TeamModel, AppError> {
        let team = self.get_team(team_id).await?.ok_or_else(|| {
            warn!(team_id, "Team not found for score adjustment in hosted table");
            AppError::NotFound("Team not found".to_string())
        })?;

        let total_score = team.adjusted_total(delta);
        let response = self
            .send(
                self.client
                    .patch(self.table_url(TEAMS_TABLE))
                    .query(&[id_filter(team_id)])
                    .json(&json!({ "total_score": total_score })),
                "adjust team score",
            )
            .await?;

        let updated = Self::first_row::<TeamModel>(response)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        debug!(team_id, delta, total_score, "Team score adjusted in hosted table");
        Ok(updated)
    }

    #[instrument(skip(self, record))]
    async fn create_record(
        &self,
        record: NewActivityRecord,
    ) -> Result<ActivityRecordModel, AppError> {
        debug!(team_id = record.team_id, score = record.score, "Creating record in hosted table");

        let body = RecordRow {
            team_id: record.team_id,
            period_start: record.period_start,
            period_end: record.period_end,
            counters: &record.counters,
            score: record.score,
        };
        let response = self
            .client
            .post(self.table_url(RECORDS_TABLE))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Hosted table request failed");
                AppError::StorageUnavailable(e.to_string())
            })?;

        // Foreign key violations surface as 409
        if response.status() == StatusCode::CONFLICT {
            warn!(team_id = record.team_id, "Record references unknown team");
            return Err(AppError::NotFound("Team not found".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "Hosted table rejected record insert");
            return Err(AppError::StorageUnavailable(format!(
                "create record: hosted table returned {status}"
            )));
        }

        Self::first_row(response)
            .await?
            .ok_or_else(|| AppError::StorageUnavailable("create record returned no row".into()))
    }

    #[instrument(skip(self))]
    async fn get_record(&self, record_id: i64) -> Result<Option<ActivityRecordModel>, AppError> {
        let response = self
            .send(
                self.client
                    .get(self.table_url(RECORDS_TABLE))
                    .query(&[id_filter(record_id)]),
                "get record",
            )
            .await?;

        Self::first_row(response).await
    }

    #[instrument(skip(self, record))]
    async fn update_record(&self, record: &ActivityRecordModel) -> Result<(), AppError> {
        debug!(record_id = record.id, "Updating record in hosted table");

        let body = RecordRow {
            team_id: record.team_id,
            period_start: record.period_start,
            period_end: record.period_end,
            counters: &record.counters,
            score: record.score,
        };
        let response = self
            .send(
                self.client
                    .patch(self.table_url(RECORDS_TABLE))
                    .query(&[id_filter(record.id)])
                    .json(&body),
                "update record",
            )
            .await?;

        if Self::rows::<ActivityRecordModel>(response).await?.is_empty() {
            warn!(record_id = record.id, "Record not found for update in hosted table");
            return Err(AppError::NotFound("Record not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, record_id: i64) -> Result<(), AppError> {
        let response = self
            .send(
                self.client
                    .delete(self.table_url(RECORDS_TABLE))
                    .query(&[id_filter(record_id)]),
                "delete record",
            )
            .await?;

        if Self::rows::<ActivityRecordModel>(response).await?.is_empty() {
            warn!(record_id, "Record not found for deletion in hosted table");
            return Err(AppError::NotFound("Record not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<ActivityRecordModel>, AppError> {
        let response = self
            .send(
                self.client
                    .get(self.table_url(RECORDS_TABLE))
                    .query(&record_query(filter)),
                "list records",
            )
            .await?;

        let records: Vec<ActivityRecordModel> = Self::rows(response).await?;
        debug!(record_count = records.len(), "Records listed from hosted table");
        Ok(records)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.send(
            self.client
                .get(self.table_url(TEAMS_TABLE))
                .query(&[("select", "id"), ("limit", "1")]),
            "ping",
        )
        .await
        .map(|_| ())
    }
}
