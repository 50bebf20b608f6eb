use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Standing, Team, TeamId};

/// Points each team took off each opponent, keyed by `(team, opponent)`.
#[derive(Debug, Clone, Default)]
pub struct HeadToHead {
    points: HashMap<(TeamId, TeamId), u32>,
}

impl HeadToHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, home: TeamId, away: TeamId, home_points: u32, away_points: u32) {
        *self.points.entry((home, away)).or_insert(0) += home_points;
        *self.points.entry((away, home)).or_insert(0) += away_points;
    }

    pub fn points(&self, team: TeamId, opponent: TeamId) -> u32 {
        self.points.get(&(team, opponent)).copied().unwrap_or(0)
    }
}

/// Orders table rows: points, goal difference, goals scored, head-to-head points (only for a
/// pair left tied), then display name. Team id is the last resort for duplicate names so the
/// order never depends on input order.
#[derive(Debug, Clone)]
pub struct TieBreaker<'a> {
    names: HashMap<TeamId, &'a str>,
    head_to_head: &'a HeadToHead,
}

impl<'a> TieBreaker<'a> {
    pub fn new(teams: &'a [Team], head_to_head: &'a HeadToHead) -> Self {
        let names = teams.iter().map(|t| (t.id, t.name.as_str())).collect();
        Self {
            names,
            head_to_head,
        }
    }

    fn name(&self, team_id: TeamId) -> &str {
        self.names.get(&team_id).copied().unwrap_or("")
    }

    /// Compares two rows. `tied_group` is how many rows share the first three keys with
    /// them; head-to-head only applies when it is exactly two.
    pub fn compare(&self, a: &Standing, b: &Standing, tied_group: usize) -> Ordering {
        primary_cmp(a, b)
            .then_with(|| {
                if tied_group == 2 {
                    let a_h2h = self.head_to_head.points(a.team_id, b.team_id);
                    let b_h2h = self.head_to_head.points(b.team_id, a.team_id);
                    b_h2h.cmp(&a_h2h)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| self.name(a.team_id).cmp(self.name(b.team_id)))
            .then_with(|| a.team_id.cmp(&b.team_id))
    }

    pub fn rank(&self, rows: &mut [Standing]) {
        rows.sort_by(|a, b| self.compare(a, b, 0));

        let mut start = 0usize;
        while start < rows.len() {
            let mut end = start + 1;
            while end < rows.len() && primary_cmp(&rows[start], &rows[end]) == Ordering::Equal {
                end += 1;
            }
            let group = end - start;
            if group == 2 {
                rows[start..end].sort_by(|a, b| self.compare(a, b, group));
            }
            start = end;
        }
    }
}

/// Points, goal difference and goals scored, all descending.
pub fn primary_cmp(a: &Standing, b: &Standing) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.scored.cmp(&a.scored))
}
