use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ProbabilityConfig;
use crate::error::EngineError;
use crate::model::{ChampionshipId, Match, MatchProbability, MatchStatus, Standing, TeamId};

/// Output of one estimate plus the inputs that produced it, for display/debugging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub home_pct: u8,
    pub away_pct: u8,
    pub home_strength: f64,
    pub away_strength: f64,
    pub head_to_head: Option<HeadToHeadRecord>,
    // True when at least one side had no matches and the neutral prior was used.
    pub neutral_prior: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadToHeadRecord {
    pub meetings: u32,
    pub home_wins: u32,
    pub away_wins: u32,
    pub level: u32,
}

impl HeadToHeadRecord {
    /// Share of meetings won by the home side of the upcoming match, level results count half.
    pub fn home_win_ratio(&self) -> f64 {
        if self.meetings == 0 {
            return 0.5;
        }
        (f64::from(self.home_wins) + 0.5 * f64::from(self.level)) / f64::from(self.meetings)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProbabilityEstimator {
    cfg: ProbabilityConfig,
}

impl ProbabilityEstimator {
    pub fn new(cfg: ProbabilityConfig) -> Result<Self, EngineError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Pre-match win split for `home` hosting `away`. Never fails for two rows of the same
    /// championship: missing history degrades to the home-advantage-only prior.
    pub fn estimate(
        &self,
        home: &Standing,
        away: &Standing,
        head_to_head: &[Match],
    ) -> Result<Estimate, EngineError> {
        if home.championship_id != away.championship_id {
            return Err(EngineError::ChampionshipMismatch {
                expected: home.championship_id,
                home: home.championship_id,
                away: away.championship_id,
            });
        }

        let half_spread = self.cfg.home_advantage_spread / 2.0;
        if home.played == 0 || away.played == 0 {
            let home_pct = self.bound(50.0 + half_spread);
            return Ok(Estimate {
                home_pct,
                away_pct: 100 - home_pct,
                home_strength: 0.0,
                away_strength: 0.0,
                head_to_head: None,
                neutral_prior: true,
            });
        }

        let home_strength = self.strength(home);
        let away_strength = self.strength(away);
        let record = head_to_head_record(
            home.team_id,
            away.team_id,
            home.championship_id,
            head_to_head,
        );
        let h2h_term = record
            .map(|r| self.cfg.head_to_head_weight * 2.0 * (r.home_win_ratio() - 0.5))
            .unwrap_or(0.0);

        let diff = home_strength - away_strength + h2h_term;
        let mut p_home = logistic(self.cfg.logistic_scale * diff) * 100.0;
        if !p_home.is_finite() {
            p_home = 50.0;
        }
        let home_pct = self.bound(p_home + half_spread);

        Ok(Estimate {
            home_pct,
            away_pct: 100 - home_pct,
            home_strength,
            away_strength,
            head_to_head: record,
            neutral_prior: false,
        })
    }

    /// Checks that `scheduled` is still open and that the rows belong to its two teams, then
    /// estimates and stamps the result.
    pub fn estimate_match(
        &self,
        scheduled: &Match,
        home: &Standing,
        away: &Standing,
        head_to_head: &[Match],
        now: DateTime<Utc>,
    ) -> Result<MatchProbability, EngineError> {
        if scheduled.status != MatchStatus::Scheduled {
            return Err(EngineError::NotScheduled {
                match_id: scheduled.id,
                status: scheduled.status,
            });
        }
        if home.championship_id != scheduled.championship_id
            || away.championship_id != scheduled.championship_id
        {
            return Err(EngineError::ChampionshipMismatch {
                expected: scheduled.championship_id,
                home: home.championship_id,
                away: away.championship_id,
            });
        }
        check_team(scheduled.home_team_id, home.team_id)?;
        check_team(scheduled.away_team_id, away.team_id)?;

        let est = self.estimate(home, away, head_to_head)?;
        Ok(MatchProbability {
            match_id: scheduled.id,
            home_win_probability: est.home_pct,
            away_win_probability: est.away_pct,
            calculated_at: now,
        })
    }

    fn strength(&self, s: &Standing) -> f64 {
        let played = f64::from(s.played.max(1));
        let win_ratio = f64::from(s.won) / played;
        let avg_diff = s.goal_difference() as f64 / played;
        let diff_term = clamp(avg_diff / self.cfg.goal_diff_scale, -1.0, 1.0);
        self.cfg.win_ratio_weight * win_ratio + self.cfg.goal_diff_weight * diff_term
    }

    // Round the home side once and hand the complement to away so the pair is exact.
    fn bound(&self, home_pct: f64) -> u8 {
        let floor = f64::from(self.cfg.floor_pct);
        let ceiling = f64::from(self.cfg.ceiling_pct);
        clamp(home_pct.round(), floor, ceiling) as u8
    }
}

/// `(home %, away %)` with the given config.
pub fn estimate_probability(
    home: &Standing,
    away: &Standing,
    head_to_head: &[Match],
    cfg: &ProbabilityConfig,
) -> Result<(u8, u8), EngineError> {
    let est = ProbabilityEstimator::new(*cfg)?.estimate(home, away, head_to_head)?;
    Ok((est.home_pct, est.away_pct))
}

/// Tallies completed meetings between exactly these two teams in this championship. Anything
/// else in the slice is ignored. `None` when they never met.
pub fn head_to_head_record(
    home_team: TeamId,
    away_team: TeamId,
    championship_id: ChampionshipId,
    matches: &[Match],
) -> Option<HeadToHeadRecord> {
    let mut rec = HeadToHeadRecord {
        meetings: 0,
        home_wins: 0,
        away_wins: 0,
        level: 0,
    };
    for m in matches {
        if m.status != MatchStatus::Completed
            || m.championship_id != championship_id
            || !m.is_between(home_team, away_team)
        {
            continue;
        }
        let (Some(h), Some(a)) = (m.home_score, m.away_score) else {
            continue;
        };
        if h < 0 || a < 0 {
            continue;
        }
        // Orient the score from the upcoming home team's side.
        let (ours, theirs) = if m.home_team_id == home_team {
            (h, a)
        } else {
            (a, h)
        };
        rec.meetings += 1;
        if ours > theirs {
            rec.home_wins += 1;
        } else if ours < theirs {
            rec.away_wins += 1;
        } else {
            rec.level += 1;
        }
    }
    (rec.meetings > 0).then_some(rec)
}

fn check_team(expected: TeamId, found: TeamId) -> Result<(), EngineError> {
    if expected != found {
        return Err(EngineError::TeamMismatch { expected, found });
    }
    Ok(())
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
