use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use league_standings::config::ProbabilityConfig;
use league_standings::error::EngineError;
use league_standings::model::Standing;
use league_standings::win_prob::estimate_probability;

fn random_row(rng: &mut StdRng, team_id: u32) -> Standing {
    let played = rng.gen_range(0..30u32);
    let won = if played == 0 { 0 } else { rng.gen_range(0..=played) };
    Standing {
        played,
        won,
        lost: played - won,
        points: won * 2,
        scored: played * rng.gen_range(50..90u32),
        conceded: played * rng.gen_range(50..90u32),
        ..Standing::zeroed(1, team_id)
    }
}

#[test]
fn any_pair_sums_to_one_hundred_within_bounds() {
    let cfg = ProbabilityConfig::default();
    let mut rng = StdRng::seed_from_u64(2026);
    for _ in 0..2_000 {
        let home = random_row(&mut rng, 1);
        let away = random_row(&mut rng, 2);
        let (h, a) = estimate_probability(&home, &away, &[], &cfg).unwrap();
        assert_eq!(u32::from(h) + u32::from(a), 100);
        assert!((cfg.floor_pct..=cfg.ceiling_pct).contains(&h));
        assert!((cfg.floor_pct..=cfg.ceiling_pct).contains(&a));
    }
}

#[test]
fn custom_bounds_are_respected() {
    let cfg = ProbabilityConfig {
        floor_pct: 10,
        ceiling_pct: 90,
        ..ProbabilityConfig::default()
    };
    let strong = Standing {
        played: 20,
        won: 20,
        points: 40,
        scored: 2000,
        conceded: 1200,
        ..Standing::zeroed(1, 1)
    };
    let weak = Standing {
        played: 20,
        lost: 20,
        scored: 1200,
        conceded: 2000,
        ..Standing::zeroed(1, 2)
    };
    assert_eq!(estimate_probability(&strong, &weak, &[], &cfg).unwrap(), (90, 10));
    assert_eq!(estimate_probability(&weak, &strong, &[], &cfg).unwrap(), (10, 90));
}

#[test]
fn better_record_never_lowers_the_home_side() {
    let cfg = ProbabilityConfig::default();
    let away = Standing {
        played: 10,
        won: 5,
        lost: 5,
        points: 10,
        scored: 700,
        conceded: 700,
        ..Standing::zeroed(1, 2)
    };
    let mut last = 0u8;
    for won in 0..=10u32 {
        let home = Standing {
            played: 10,
            won,
            lost: 10 - won,
            points: won * 2,
            scored: 700,
            conceded: 700,
            ..Standing::zeroed(1, 1)
        };
        let (h, _) = estimate_probability(&home, &away, &[], &cfg).unwrap();
        assert!(h >= last);
        last = h;
    }
}

#[test]
fn bounds_that_would_push_away_out_of_range_are_refused() {
    let strong = Standing {
        played: 10,
        won: 10,
        points: 20,
        scored: 900,
        conceded: 500,
        ..Standing::zeroed(1, 1)
    };
    let weak = Standing {
        played: 10,
        lost: 10,
        scored: 500,
        conceded: 900,
        ..Standing::zeroed(1, 2)
    };
    for (floor_pct, ceiling_pct) in [(5, 98), (2, 150)] {
        let cfg = ProbabilityConfig {
            floor_pct,
            ceiling_pct,
            ..ProbabilityConfig::default()
        };
        let err = estimate_probability(&strong, &weak, &[], &cfg).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }
}
