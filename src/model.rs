use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type ChampionshipId = u32;
pub type MatchId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompetitionType {
    Csi,
    Uisp,
}

impl CompetitionType {
    pub fn as_str(self) -> &'static str {
        match self {
            CompetitionType::Csi => "CSI",
            CompetitionType::Uisp => "UISP",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CSI" => Some(CompetitionType::Csi),
            "UISP" => Some(CompetitionType::Uisp),
            _ => None,
        }
    }
}

impl fmt::Display for CompetitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Championship {
    pub id: ChampionshipId,
    pub name: String,
    pub competition_type: CompetitionType,
    pub team_ids: Vec<TeamId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Completed,
    Postponed,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Completed => "completed",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(MatchStatus::Scheduled),
            "completed" => Some(MatchStatus::Completed),
            "postponed" => Some(MatchStatus::Postponed),
            "cancelled" | "canceled" => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodScore {
    pub home: i32,
    pub away: i32,
}

/// A fixture between two teams of one championship.
///
/// Scores are signed: the store hands over whatever was recorded and the rule-sets reject
/// negative values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub championship_id: ChampionshipId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub status: MatchStatus,
    pub scheduled_at: DateTime<Utc>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    #[serde(default)]
    pub periods: Vec<PeriodScore>,
}

impl Match {
    pub fn has_score(&self) -> bool {
        self.home_score.is_some() || self.away_score.is_some()
    }

    /// True when the match was played between exactly `a` and `b`, in either direction.
    pub fn is_between(&self, a: TeamId, b: TeamId) -> bool {
        (self.home_team_id == a && self.away_team_id == b)
            || (self.home_team_id == b && self.away_team_id == a)
    }
}

/// Aggregated table row for one team in one championship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub championship_id: ChampionshipId,
    pub team_id: TeamId,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub points: u32,
    pub scored: u32,
    pub conceded: u32,
}

impl Standing {
    pub fn zeroed(championship_id: ChampionshipId, team_id: TeamId) -> Self {
        Self {
            championship_id,
            team_id,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            points: 0,
            scored: 0,
            conceded: 0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.scored) - i64::from(self.conceded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProbability {
    pub match_id: MatchId,
    pub home_win_probability: u8,
    pub away_win_probability: u8,
    pub calculated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competition_type_parses_case_insensitively() {
        assert_eq!(CompetitionType::parse("csi"), Some(CompetitionType::Csi));
        assert_eq!(CompetitionType::parse(" UISP "), Some(CompetitionType::Uisp));
        assert_eq!(CompetitionType::parse("fiba"), None);
    }

    #[test]
    fn match_status_round_trips_through_str() {
        for status in [
            MatchStatus::Scheduled,
            MatchStatus::Completed,
            MatchStatus::Postponed,
            MatchStatus::Cancelled,
        ] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MatchStatus::parse("canceled"), Some(MatchStatus::Cancelled));
    }

    #[test]
    fn goal_difference_can_go_negative() {
        let mut row = Standing::zeroed(1, 7);
        row.scored = 60;
        row.conceded = 85;
        assert_eq!(row.goal_difference(), -25);
    }
}
