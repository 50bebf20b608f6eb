pub mod config;
pub mod error;
pub mod export;
pub mod fake_league;
pub mod fingerprint;
pub mod logging;
pub mod model;
pub mod rules;
pub mod service;
pub mod standings;
pub mod store;
pub mod tiebreak;
pub mod win_prob;

pub use config::EngineConfig;
pub use error::{DataIntegrityWarning, EngineError};
pub use model::{
    Championship, ChampionshipId, CompetitionType, Match, MatchId, MatchProbability, MatchStatus,
    PeriodScore, Standing, Team, TeamId,
};
pub use rules::RuleSet;
pub use service::{StandingsOutcome, StandingsService};
pub use standings::{StandingsCalculator, StandingsReport, compute_standings};
pub use store::{MatchSource, ProjectionStore, SqliteStore};
pub use win_prob::{ProbabilityEstimator, estimate_probability};
