use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{
    Championship, ChampionshipId, CompetitionType, Match, MatchStatus, PeriodScore, Team, TeamId,
};

const TEAM_NAMES: &[&str] = &[
    "Aquile Bergamo",
    "Basket Cremona",
    "Castello Lodi",
    "Delfini Rimini",
    "Falchi Pavia",
    "Giganti Monza",
    "Leoni Brescia",
    "Lupi Varese",
    "Orsi Trento",
    "Pantere Como",
    "Squali Ancona",
    "Tigri Parma",
    "Tori Novara",
    "Vipere Asti",
    "Volpi Lecco",
    "Zebre Cuneo",
];

pub struct FakeSeason {
    pub championship: Championship,
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Copy)]
pub struct SeasonShape {
    pub team_count: usize,
    /// Rounds already played; later rounds stay scheduled.
    pub completed_rounds: usize,
    pub periods: u32,
    pub seed: u64,
}

impl Default for SeasonShape {
    fn default() -> Self {
        Self {
            team_count: 8,
            completed_rounds: 10,
            periods: 4,
            seed: 7,
        }
    }
}

/// Double round robin with deterministic scores for a given seed. UISP fixtures carry
/// period scores that add up to the final score.
pub fn generate_season(
    championship_id: ChampionshipId,
    competition_type: CompetitionType,
    shape: SeasonShape,
) -> FakeSeason {
    let mut rng = StdRng::seed_from_u64(shape.seed ^ u64::from(championship_id));
    let team_count = shape.team_count.max(2);

    let teams: Vec<Team> = (0..team_count)
        .map(|i| Team {
            id: championship_id * 100 + i as TeamId + 1,
            name: TEAM_NAMES
                .get(i)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("Team {}", i + 1)),
        })
        .collect();
    // Per-team scoring rate per period.
    let skill: Vec<f64> = teams.iter().map(|_| rng.gen_range(14.0..24.0)).collect();

    let rounds = round_robin(team_count);
    let kickoff = season_start();
    let periods = shape.periods.max(1);

    let mut matches = Vec::new();
    let legs = [false, true];
    let mut round_idx = 0usize;
    for swap in legs {
        for pairs in &rounds {
            let scheduled_at = kickoff + Duration::weeks(round_idx as i64);
            let played = round_idx < shape.completed_rounds;
            for &(a, b) in pairs {
                let (h, w) = if swap { (b, a) } else { (a, b) };
                let id = u64::from(championship_id) * 10_000 + matches.len() as u64 + 1;
                let mut m = Match {
                    id,
                    championship_id,
                    home_team_id: teams[h].id,
                    away_team_id: teams[w].id,
                    status: MatchStatus::Scheduled,
                    scheduled_at,
                    home_score: None,
                    away_score: None,
                    periods: Vec::new(),
                };
                if played {
                    let split = play(&mut rng, skill[h] + 1.0, skill[w], periods);
                    m.status = MatchStatus::Completed;
                    m.home_score = Some(split.iter().map(|p| p.home).sum());
                    m.away_score = Some(split.iter().map(|p| p.away).sum());
                    if competition_type == CompetitionType::Uisp {
                        m.periods = split;
                    }
                }
                matches.push(m);
            }
            round_idx += 1;
        }
    }

    let championship = Championship {
        id: championship_id,
        name: format!("{} Demo League {}", competition_type, championship_id),
        competition_type,
        team_ids: teams.iter().map(|t| t.id).collect(),
    };

    FakeSeason {
        championship,
        teams,
        matches,
    }
}

fn play(rng: &mut impl Rng, home_rate: f64, away_rate: f64, periods: u32) -> Vec<PeriodScore> {
    (0..periods)
        .map(|_| PeriodScore {
            home: (home_rate + rng.gen_range(-6.0..6.0)).round().max(0.0) as i32,
            away: (away_rate + rng.gen_range(-6.0..6.0)).round().max(0.0) as i32,
        })
        .collect()
}

// Circle method; an odd field gets a bye slot that is dropped from the pairings.
fn round_robin(team_count: usize) -> Vec<Vec<(usize, usize)>> {
    let mut slots: Vec<Option<usize>> = (0..team_count).map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut rounds = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (slots[i], slots[n - 1 - i]) {
                // Alternate who hosts so the first leg is balanced.
                pairs.push(if round % 2 == 0 { (a, b) } else { (b, a) });
            }
        }
        rounds.push(pairs);
        slots[1..].rotate_right(1);
    }
    rounds
}

fn season_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 5, 18, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
