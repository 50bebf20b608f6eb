use serde::Serialize;

use crate::model::{ChampionshipId, CompetitionType, MatchId, MatchStatus, TeamId};

/// Failures raised by the pure engine.
///
/// Scoring failures (`InvalidScore`, `RuleSetMismatch`) only ever knock out the single
/// match they describe; the calculator turns them into [`DataIntegrityWarning`]s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("match {match_id}: invalid score: {reason}")]
    InvalidScore { match_id: MatchId, reason: String },

    #[error("match {match_id} belongs to championship {found}, not {expected} ({rule_set} rules)")]
    RuleSetMismatch {
        match_id: MatchId,
        expected: ChampionshipId,
        found: ChampionshipId,
        rule_set: CompetitionType,
    },

    #[error("match {match_id} is {status}, expected scheduled")]
    NotScheduled {
        match_id: MatchId,
        status: MatchStatus,
    },

    #[error("standings belong to championships {home} and {away}, expected {expected}")]
    ChampionshipMismatch {
        expected: ChampionshipId,
        home: ChampionshipId,
        away: ChampionshipId,
    },

    #[error("standing for team {found} passed where team {expected} was expected")]
    TeamMismatch { expected: TeamId, found: TeamId },

    #[error("invalid probability config: {reason}")]
    InvalidConfig { reason: String },
}

impl EngineError {
    pub fn invalid_score(match_id: MatchId, reason: impl Into<String>) -> Self {
        EngineError::InvalidScore {
            match_id,
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// A skipped match. Non-fatal: the rest of the table is still aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataIntegrityWarning {
    pub match_id: MatchId,
    pub message: String,
    #[serde(skip)]
    pub error: EngineError,
}

impl DataIntegrityWarning {
    pub fn new(match_id: MatchId, error: EngineError) -> Self {
        Self {
            match_id,
            message: error.to_string(),
            error,
        }
    }
}
