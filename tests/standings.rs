use chrono::{TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use league_standings::config::EngineConfig;
use league_standings::error::EngineError;
use league_standings::fake_league::{SeasonShape, generate_season};
use league_standings::model::{
    Championship, CompetitionType, Match, MatchStatus, PeriodScore, Team, TeamId,
};
use league_standings::standings::compute_standings;
use league_standings::tiebreak::primary_cmp;

fn teams(names: &[(TeamId, &str)]) -> Vec<Team> {
    names
        .iter()
        .map(|(id, name)| Team {
            id: *id,
            name: name.to_string(),
        })
        .collect()
}

fn championship(kind: CompetitionType, team_ids: &[TeamId]) -> Championship {
    Championship {
        id: 10,
        name: "Serie Open".to_string(),
        competition_type: kind,
        team_ids: team_ids.to_vec(),
    }
}

fn played(id: u64, home: TeamId, away: TeamId, hs: i32, aw: i32) -> Match {
    Match {
        id,
        championship_id: 10,
        home_team_id: home,
        away_team_id: away,
        status: MatchStatus::Completed,
        scheduled_at: Utc.with_ymd_and_hms(2026, 10, 1, 20, 0, 0).unwrap(),
        home_score: Some(hs),
        away_score: Some(aw),
        periods: Vec::new(),
    }
}

fn uisp(id: u64, home: TeamId, away: TeamId, periods: &[(i32, i32)]) -> Match {
    let periods: Vec<PeriodScore> = periods
        .iter()
        .map(|&(home, away)| PeriodScore { home, away })
        .collect();
    let hs = periods.iter().map(|p| p.home).sum();
    let aw = periods.iter().map(|p| p.away).sum();
    Match {
        periods,
        ..played(id, home, away, hs, aw)
    }
}

#[test]
fn csi_home_win_85_70() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "Home"), (2, "Away")]);
    let ch = championship(CompetitionType::Csi, &[1, 2]);
    let report = compute_standings(&ch, &teams, &[played(1, 1, 2, 85, 70)], &cfg);

    assert!(report.warnings.is_empty());
    let home = &report.rows[0];
    assert_eq!(home.team_id, 1);
    assert_eq!(
        (home.played, home.won, home.lost, home.points, home.scored, home.conceded),
        (1, 1, 0, cfg.csi.win, 85, 70)
    );
    let away = &report.rows[1];
    assert_eq!((away.played, away.lost, away.points), (1, 1, cfg.csi.loss));
}

#[test]
fn teams_without_matches_still_appear() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "A"), (2, "B"), (3, "Idle")]);
    let ch = championship(CompetitionType::Csi, &[1, 2, 3]);
    let report = compute_standings(&ch, &teams, &[played(1, 1, 2, 60, 50)], &cfg);
    let idle = report.rows.iter().find(|r| r.team_id == 3).unwrap();
    assert_eq!(idle.played, 0);
    assert_eq!(idle.points, 0);
    assert_eq!(report.rows.last().map(|r| r.team_id), Some(3));
}

#[test]
fn three_way_tie_falls_back_to_names() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "Zeta"), (2, "Alpha"), (3, "Mu")]);
    let ch = championship(CompetitionType::Csi, &[1, 2, 3]);
    let mut matches = vec![
        played(1, 1, 2, 80, 70),
        played(2, 2, 3, 80, 70),
        played(3, 3, 1, 80, 70),
    ];

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        matches.shuffle(&mut rng);
        let report = compute_standings(&ch, &teams, &matches, &cfg);
        let order: Vec<TeamId> = report.rows.iter().map(|r| r.team_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}

#[test]
fn two_way_tie_uses_head_to_head_before_name() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "Bravo"), (2, "Alpha"), (3, "Charlie"), (4, "Delta")]);
    let ch = championship(CompetitionType::Csi, &[1, 2, 3, 4]);
    let matches = vec![
        played(1, 1, 2, 80, 70),
        played(2, 3, 1, 80, 70),
        played(3, 2, 4, 80, 70),
    ];
    let report = compute_standings(&ch, &teams, &matches, &cfg);
    let order: Vec<TeamId> = report.rows.iter().map(|r| r.team_id).collect();
    // Bravo beat Alpha, so it ranks first despite the name.
    assert_eq!(order, vec![3, 1, 2, 4]);
}

#[test]
fn negative_score_skips_only_that_match() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "A"), (2, "B"), (3, "C")]);
    let ch = championship(CompetitionType::Csi, &[1, 2, 3]);
    let matches = vec![
        played(1, 1, 2, 70, 60),
        played(2, 2, 3, 75, -5),
        played(3, 3, 1, 66, 64),
    ];
    let report = compute_standings(&ch, &teams, &matches, &cfg);

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].match_id, 2);
    assert!(matches!(
        report.warnings[0].error,
        EngineError::InvalidScore { match_id: 2, .. }
    ));
    assert_eq!(report.matches_counted, 2);

    let b = report.rows.iter().find(|r| r.team_id == 2).unwrap();
    assert_eq!((b.played, b.scored, b.conceded), (1, 60, 70));
    let total: u32 = report.rows.iter().map(|r| r.played).sum();
    assert_eq!(total, 4);
}

#[test]
fn scored_without_completion_is_reported() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "A"), (2, "B")]);
    let ch = championship(CompetitionType::Csi, &[1, 2]);
    let mut odd = played(5, 1, 2, 70, 60);
    odd.status = MatchStatus::Postponed;
    let report = compute_standings(&ch, &teams, &[odd], &cfg);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.rows.iter().all(|r| r.played == 0));
}

#[test]
fn uisp_period_points_and_bonus() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]);
    let ch = championship(CompetitionType::Uisp, &[1, 2, 3, 4]);
    let matches = vec![
        uisp(1, 1, 2, &[(20, 10), (10, 20), (15, 15), (20, 10)]),
        uisp(2, 3, 4, &[(30, 10), (10, 12), (10, 10), (22, 20)]),
    ];
    let report = compute_standings(&ch, &teams, &matches, &cfg);
    assert!(report.warnings.is_empty());

    let summary: Vec<(TeamId, u32)> = report.rows.iter().map(|r| (r.team_id, r.points)).collect();
    // A and C level on 2: C outscored A. B and D level on 1: B outscored D. No cascade.
    assert_eq!(summary, vec![(3, 3), (1, 2), (2, 2), (4, 1)]);

    let a = report.rows.iter().find(|r| r.team_id == 1).unwrap();
    assert_eq!((a.won, a.lost, a.scored, a.conceded), (1, 0, 65, 55));
}

#[test]
fn uisp_periods_that_do_not_add_up_are_rejected() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "A"), (2, "B")]);
    let ch = championship(CompetitionType::Uisp, &[1, 2]);
    let mut bad = uisp(1, 1, 2, &[(20, 10), (10, 20), (15, 15), (20, 10)]);
    bad.home_score = Some(66);
    let report = compute_standings(&ch, &teams, &[bad], &cfg);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.matches_counted, 0);
}

#[test]
fn foreign_championship_match_is_a_rule_set_mismatch() {
    let cfg = EngineConfig::default();
    let teams = teams(&[(1, "A"), (2, "B")]);
    let ch = championship(CompetitionType::Csi, &[1, 2]);
    let mut stray = played(9, 1, 2, 70, 60);
    stray.championship_id = 99;
    let report = compute_standings(&ch, &teams, &[stray], &cfg);
    assert!(matches!(
        report.warnings[0].error,
        EngineError::RuleSetMismatch { found: 99, .. }
    ));
}

#[test]
fn generated_seasons_hold_table_invariants() {
    let cfg = EngineConfig::default();
    for (id, kind) in [(1, CompetitionType::Csi), (2, CompetitionType::Uisp)] {
        let season = generate_season(
            id,
            kind,
            SeasonShape {
                team_count: 10,
                completed_rounds: 12,
                ..SeasonShape::default()
            },
        );
        let mut completed: Vec<Match> = season
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .cloned()
            .collect();

        let baseline = compute_standings(&season.championship, &season.teams, &completed, &cfg);
        assert!(baseline.warnings.is_empty());
        let played: u32 = baseline.rows.iter().map(|r| r.played).sum();
        assert_eq!(played as usize, 2 * completed.len());
        assert_eq!(baseline.rows.len(), 10);

        for pair in baseline.rows.windows(2) {
            assert_ne!(primary_cmp(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
        }

        let mut rng = StdRng::seed_from_u64(u64::from(id));
        for _ in 0..10 {
            completed.shuffle(&mut rng);
            let again = compute_standings(&season.championship, &season.teams, &completed, &cfg);
            assert_eq!(again.rows, baseline.rows);
        }
    }
}

#[test]
fn csi_points_follow_wins() {
    let cfg = EngineConfig::default();
    let season = generate_season(3, CompetitionType::Csi, SeasonShape::default());
    let completed: Vec<Match> = season
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .cloned()
        .collect();
    let report = compute_standings(&season.championship, &season.teams, &completed, &cfg);
    for a in &report.rows {
        for b in &report.rows {
            if a.won > b.won && a.drawn == b.drawn {
                assert!(a.points >= b.points);
            }
        }
    }
}
