use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{DataIntegrityWarning, EngineError};
use crate::model::{Championship, Match, MatchId, MatchStatus, Standing, Team, TeamId};
use crate::rules::{ResultDelta, RuleSet};
use crate::tiebreak::{HeadToHead, TieBreaker};

#[derive(Debug, Clone, Serialize)]
pub struct StandingsReport {
    /// Ranked, first place first.
    pub rows: Vec<Standing>,
    pub warnings: Vec<DataIntegrityWarning>,
    pub matches_counted: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct StandingsCalculator {
    rules: RuleSet,
}

impl StandingsCalculator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn for_championship(championship: &Championship, cfg: &EngineConfig) -> Self {
        Self::new(RuleSet::for_competition(championship.competition_type, cfg))
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Folds the completed matches of `championship` into one ranked row per participating
    /// team. Bad records are skipped and reported; they never abort the table.
    pub fn compute(
        &self,
        championship: &Championship,
        teams: &[Team],
        matches: &[Match],
    ) -> StandingsReport {
        // Rows come from the registered members only; `teams` just supplies names.
        let mut table: BTreeMap<TeamId, Standing> = championship
            .team_ids
            .iter()
            .map(|&id| (id, Standing::zeroed(championship.id, id)))
            .collect();

        // Sorting by id keeps warnings and duplicate handling independent of input order.
        let mut ordered: Vec<&Match> = matches.iter().collect();
        ordered.sort_by_key(|m| m.id);

        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        let mut head_to_head = HeadToHead::new();
        let mut counted = 0usize;

        for m in ordered {
            if !seen.insert(m.id) {
                push_warning(
                    &mut warnings,
                    m.id,
                    EngineError::invalid_score(m.id, "duplicate match record"),
                );
                continue;
            }
            if m.status != MatchStatus::Completed && !m.has_score() {
                debug!(match_id = m.id, status = %m.status, "ignoring unplayed match");
                continue;
            }
            if let Err(err) = self.check_membership(championship, &table, m) {
                push_warning(&mut warnings, m.id, err);
                continue;
            }
            let (home_delta, away_delta) = match self.rules.apply_result(m) {
                Ok(deltas) => deltas,
                Err(err) => {
                    push_warning(&mut warnings, m.id, err);
                    continue;
                }
            };

            // apply_result only succeeds with both scores present and non-negative.
            let home_score = m.home_score.unwrap_or(0).max(0) as u32;
            let away_score = m.away_score.unwrap_or(0).max(0) as u32;

            if let Some(row) = table.get_mut(&m.home_team_id) {
                accumulate(row, home_delta, home_score, away_score);
            }
            if let Some(row) = table.get_mut(&m.away_team_id) {
                accumulate(row, away_delta, away_score, home_score);
            }
            head_to_head.record(
                m.home_team_id,
                m.away_team_id,
                home_delta.points,
                away_delta.points,
            );
            counted += 1;
        }

        let mut rows: Vec<Standing> = table.into_values().collect();
        if let Some(bonus) = self.rules.tie_break_bonus() {
            apply_tie_break_bonus(&mut rows, bonus);
        }
        TieBreaker::new(teams, &head_to_head).rank(&mut rows);

        debug!(
            championship_id = championship.id,
            rule_set = %self.rules.competition_type(),
            teams = rows.len(),
            matches = counted,
            skipped = warnings.len(),
            "standings computed"
        );

        StandingsReport {
            rows,
            warnings,
            matches_counted: counted,
        }
    }

    fn check_membership(
        &self,
        championship: &Championship,
        table: &BTreeMap<TeamId, Standing>,
        m: &Match,
    ) -> Result<(), EngineError> {
        if m.championship_id != championship.id {
            return Err(EngineError::RuleSetMismatch {
                match_id: m.id,
                expected: championship.id,
                found: m.championship_id,
                rule_set: self.rules.competition_type(),
            });
        }
        if m.home_team_id == m.away_team_id {
            return Err(EngineError::invalid_score(
                m.id,
                format!("team {} listed as both home and away", m.home_team_id),
            ));
        }
        for team_id in [m.home_team_id, m.away_team_id] {
            if !table.contains_key(&team_id) {
                return Err(EngineError::invalid_score(
                    m.id,
                    format!(
                        "team {team_id} is not registered in championship {}",
                        championship.id
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Convenience wrapper: rules picked from the championship's competition type.
pub fn compute_standings(
    championship: &Championship,
    teams: &[Team],
    completed_matches: &[Match],
    cfg: &EngineConfig,
) -> StandingsReport {
    StandingsCalculator::for_championship(championship, cfg).compute(
        championship,
        teams,
        completed_matches,
    )
}

fn accumulate(row: &mut Standing, delta: ResultDelta, scored: u32, conceded: u32) {
    row.played = row.played.saturating_add(1);
    row.won = row.won.saturating_add(delta.won);
    row.drawn = row.drawn.saturating_add(delta.drawn);
    row.lost = row.lost.saturating_add(delta.lost);
    row.points = row.points.saturating_add(delta.points);
    row.scored = row.scored.saturating_add(scored);
    row.conceded = row.conceded.saturating_add(conceded);
}

fn push_warning(warnings: &mut Vec<DataIntegrityWarning>, match_id: MatchId, err: EngineError) {
    warn!(match_id, error = %err, "skipping match");
    warnings.push(DataIntegrityWarning::new(match_id, err));
}

/// Season-level UISP bonus: inside every group of teams level on points, the single team with
/// the most goals scored gets `bonus` extra points. Groups are formed from the full-season
/// totals before any bonus is handed out, so awards never cascade into other groups. A group
/// whose top scorer is shared gets nothing.
pub fn apply_tie_break_bonus(rows: &mut [Standing], bonus: u32) {
    if bonus == 0 {
        return;
    }
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        groups.entry(row.points).or_default().push(idx);
    }

    let mut winners = Vec::new();
    for members in groups.values().filter(|g| g.len() > 1) {
        let Some(best) = members.iter().map(|&i| rows[i].scored).max() else {
            continue;
        };
        let leaders: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| rows[i].scored == best)
            .collect();
        if let [only] = leaders.as_slice()
            && rows[*only].played > 0
        {
            winners.push(*only);
        }
    }

    for idx in winners {
        let row = &mut rows[idx];
        debug!(
            team_id = row.team_id,
            points = row.points,
            scored = row.scored,
            bonus,
            "tie-break bonus awarded"
        );
        row.points = row.points.saturating_add(bonus);
    }
}
