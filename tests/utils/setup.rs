use axum::Router;
use std::sync::Arc;

use scoreboard::{
    router, AppState, InMemoryScoreboardRepository, ScoreboardRepository, ScoringPolicy,
    WeightTable,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub repository: Arc<InMemoryScoreboardRepository>,
    /// Ids of the teams registered by the builder, in the order given
    pub team_ids: Vec<i64>,
}

pub struct TestSetupBuilder {
    teams: Vec<String>,
    weights: WeightTable,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            teams: vec![],
            weights: WeightTable::for_policy(ScoringPolicy::Standard),
        }
    }

    pub fn with_teams(mut self, teams: Vec<&str>) -> Self {
        self.teams = teams.into_iter().map(|s| s.to_string()).collect();
        self
    }

    #[allow(dead_code)]
    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.weights = WeightTable::for_policy(policy);
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryScoreboardRepository::new());

        let mut team_ids = Vec::with_capacity(self.teams.len());
        for name in self.teams {
            let team = repository
                .create_team(scoreboard::team::models::NewTeam::new(name, None))
                .await
                .unwrap();
            team_ids.push(team.id);
        }

        let state = AppState::new(repository.clone(), Arc::new(self.weights));

        TestSetup {
            app: router(state),
            repository,
            team_ids,
        }
    }
}
