use std::cmp::Ordering;

use tracing::warn;

use crate::config::{CsiPoints, EngineConfig, UispPoints};
use crate::error::EngineError;
use crate::model::{CompetitionType, Match, MatchId, MatchStatus, PeriodScore};

/// Per-team increments produced by scoring one completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultDelta {
    pub points: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
}

impl ResultDelta {
    fn win(points: u32) -> Self {
        Self {
            points,
            won: 1,
            ..Self::default()
        }
    }

    fn loss(points: u32) -> Self {
        Self {
            points,
            lost: 1,
            ..Self::default()
        }
    }

    fn draw(points: u32) -> Self {
        Self {
            points,
            drawn: 1,
            ..Self::default()
        }
    }
}

/// Scoring policy selected by a championship's competition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    Csi(CsiPoints),
    Uisp(UispPoints),
}

impl RuleSet {
    pub fn for_competition(kind: CompetitionType, cfg: &EngineConfig) -> Self {
        match kind {
            CompetitionType::Csi => RuleSet::Csi(cfg.csi),
            CompetitionType::Uisp => RuleSet::Uisp(cfg.uisp),
        }
    }

    pub fn competition_type(&self) -> CompetitionType {
        match self {
            RuleSet::Csi(_) => CompetitionType::Csi,
            RuleSet::Uisp(_) => CompetitionType::Uisp,
        }
    }

    /// Season-level tie-break bonus, only defined for UISP.
    pub fn tie_break_bonus(&self) -> Option<u32> {
        match self {
            RuleSet::Csi(_) => None,
            RuleSet::Uisp(p) => Some(p.bonus),
        }
    }

    pub fn apply_result(&self, m: &Match) -> Result<(ResultDelta, ResultDelta), EngineError> {
        if m.status != MatchStatus::Completed {
            return Err(EngineError::invalid_score(
                m.id,
                format!("match is {}, only completed matches carry a result", m.status),
            ));
        }
        let (Some(home), Some(away)) = (m.home_score, m.away_score) else {
            return Err(EngineError::invalid_score(
                m.id,
                "completed match without a final score",
            ));
        };
        self.apply_scores(m.id, home, away, &m.periods)
    }

    pub fn apply_scores(
        &self,
        match_id: MatchId,
        home: i32,
        away: i32,
        periods: &[PeriodScore],
    ) -> Result<(ResultDelta, ResultDelta), EngineError> {
        if home < 0 || away < 0 {
            return Err(EngineError::invalid_score(
                match_id,
                format!("negative final score {home}-{away}"),
            ));
        }
        match self {
            RuleSet::Csi(p) => Ok(csi_deltas(match_id, p, home, away)),
            RuleSet::Uisp(p) => uisp_deltas(match_id, p, home, away, periods),
        }
    }
}

fn csi_deltas(
    match_id: MatchId,
    p: &CsiPoints,
    home: i32,
    away: i32,
) -> (ResultDelta, ResultDelta) {
    match home.cmp(&away) {
        Ordering::Greater => (ResultDelta::win(p.win), ResultDelta::loss(p.loss)),
        Ordering::Less => (ResultDelta::loss(p.loss), ResultDelta::win(p.win)),
        Ordering::Equal => {
            // No draw award is defined for CSI; both sides keep the loss value until the
            // regulation says otherwise.
            warn!(
                match_id,
                home,
                away,
                "CSI match ended level, awarding loss points to both sides"
            );
            (ResultDelta::draw(p.loss), ResultDelta::draw(p.loss))
        }
    }
}

fn uisp_deltas(
    match_id: MatchId,
    p: &UispPoints,
    home: i32,
    away: i32,
    periods: &[PeriodScore],
) -> Result<(ResultDelta, ResultDelta), EngineError> {
    if periods.len() != p.periods as usize {
        return Err(EngineError::invalid_score(
            match_id,
            format!("expected {} periods, got {}", p.periods, periods.len()),
        ));
    }

    let mut home_points = 0u32;
    let mut away_points = 0u32;
    let mut home_sum = 0i64;
    let mut away_sum = 0i64;
    for (idx, period) in periods.iter().enumerate() {
        if period.home < 0 || period.away < 0 {
            return Err(EngineError::invalid_score(
                match_id,
                format!(
                    "negative score {}-{} in period {}",
                    period.home,
                    period.away,
                    idx + 1
                ),
            ));
        }
        home_sum += i64::from(period.home);
        away_sum += i64::from(period.away);
        let (h, a) = match period.home.cmp(&period.away) {
            Ordering::Greater => (p.period_win, p.period_loss),
            Ordering::Less => (p.period_loss, p.period_win),
            Ordering::Equal => (p.period_draw, p.period_draw),
        };
        home_points += h;
        away_points += a;
    }

    if home_sum != i64::from(home) || away_sum != i64::from(away) {
        return Err(EngineError::invalid_score(
            match_id,
            format!("periods add up to {home_sum}-{away_sum}, final score is {home}-{away}"),
        ));
    }

    Ok(match home.cmp(&away) {
        Ordering::Greater => (ResultDelta::win(home_points), ResultDelta::loss(away_points)),
        Ordering::Less => (ResultDelta::loss(home_points), ResultDelta::win(away_points)),
        Ordering::Equal => (ResultDelta::draw(home_points), ResultDelta::draw(away_points)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csi() -> RuleSet {
        RuleSet::Csi(CsiPoints::default())
    }

    fn uisp() -> RuleSet {
        RuleSet::Uisp(UispPoints::default())
    }

    fn periods(pairs: &[(i32, i32)]) -> Vec<PeriodScore> {
        pairs
            .iter()
            .map(|&(home, away)| PeriodScore { home, away })
            .collect()
    }

    #[test]
    fn csi_home_win() {
        let (h, a) = csi().apply_scores(1, 85, 70, &[]).unwrap();
        assert_eq!(h, ResultDelta { points: 2, won: 1, drawn: 0, lost: 0 });
        assert_eq!(a, ResultDelta { points: 0, won: 0, drawn: 0, lost: 1 });
    }

    #[test]
    fn csi_away_win() {
        let (h, a) = csi().apply_scores(1, 50, 51, &[]).unwrap();
        assert_eq!(h.lost, 1);
        assert_eq!(a.won, 1);
        assert_eq!(a.points, 2);
    }

    #[test]
    fn csi_level_score_grants_loss_points_only() {
        let rules = RuleSet::Csi(CsiPoints { win: 3, loss: 1 });
        let (h, a) = rules.apply_scores(1, 60, 60, &[]).unwrap();
        assert_eq!(h, ResultDelta { points: 1, won: 0, drawn: 1, lost: 0 });
        assert_eq!(h, a);
    }

    #[test]
    fn negative_score_is_rejected() {
        let err = csi().apply_scores(9, 10, -1, &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidScore { match_id: 9, .. }));
    }

    #[test]
    fn uisp_sums_period_points() {
        let p = periods(&[(20, 15), (10, 18), (22, 22), (19, 11)]);
        let (h, a) = uisp().apply_scores(1, 71, 66, &p).unwrap();
        assert_eq!(h, ResultDelta { points: 2, won: 1, drawn: 0, lost: 0 });
        assert_eq!(a, ResultDelta { points: 1, won: 0, drawn: 0, lost: 1 });
    }

    #[test]
    fn uisp_period_draw_value_is_used() {
        let rules = RuleSet::Uisp(UispPoints {
            period_draw: 1,
            ..UispPoints::default()
        });
        let p = periods(&[(10, 10), (10, 10), (10, 10), (10, 10)]);
        let (h, a) = rules.apply_scores(1, 40, 40, &p).unwrap();
        assert_eq!(h.points, 4);
        assert_eq!(h.drawn, 1);
        assert_eq!(a, h);
    }

    #[test]
    fn uisp_periods_must_sum_to_final() {
        let p = periods(&[(20, 15), (10, 18), (22, 22), (19, 11)]);
        let err = uisp().apply_scores(3, 70, 66, &p).unwrap_err();
        assert!(matches!(err, EngineError::InvalidScore { match_id: 3, .. }));
    }

    #[test]
    fn uisp_needs_every_period() {
        let p = periods(&[(20, 15), (10, 18)]);
        assert!(uisp().apply_scores(3, 30, 33, &p).is_err());
    }

    #[test]
    fn non_completed_match_has_no_result() {
        let m = Match {
            id: 4,
            championship_id: 1,
            home_team_id: 1,
            away_team_id: 2,
            status: MatchStatus::Scheduled,
            scheduled_at: chrono::Utc::now(),
            home_score: None,
            away_score: None,
            periods: Vec::new(),
        };
        assert!(matches!(
            csi().apply_result(&m),
            Err(EngineError::InvalidScore { match_id: 4, .. })
        ));
    }
}
