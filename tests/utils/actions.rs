use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

/// Status and parsed JSON body of one request
pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl TestSetup {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        Response { status, body }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send("GET", uri, None).await
    }

    /// Logs a report for a team and returns the created record's id
    pub async fn log_activity(&self, team_id: i64, start: &str, end: &str, counters: Value) -> i64 {
        let mut body = counters;
        body["team_id"] = team_id.into();
        body["period_start"] = start.into();
        body["period_end"] = end.into();

        let response = self.send("POST", "/api/records", Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["record"]["id"].as_i64().unwrap()
    }

    pub async fn team_total(&self, team_id: i64) -> i64 {
        let response = self.get(&format!("/api/teams/{team_id}")).await;
        response.body["total_score"].as_i64().unwrap()
    }
}
