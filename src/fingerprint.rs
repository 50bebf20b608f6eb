use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::config::{EngineConfig, ProbabilityConfig};
use crate::model::{Championship, CompetitionType, Match, Team};

/// Version key for a championship's input set: competition type, the scoring constants, the
/// teams and every match's content. Input order does not matter.
pub fn standings_fingerprint(
    championship: &Championship,
    teams: &[Team],
    matches: &[Match],
    cfg: &EngineConfig,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"standings/v1\n");
    hasher.update(format!(
        "championship {} {}\n",
        championship.id, championship.competition_type
    ));
    match championship.competition_type {
        CompetitionType::Csi => {
            hasher.update(format!("csi {} {}\n", cfg.csi.win, cfg.csi.loss));
        }
        CompetitionType::Uisp => {
            let u = &cfg.uisp;
            hasher.update(format!(
                "uisp {} {} {} {} {}\n",
                u.periods, u.period_win, u.period_loss, u.period_draw, u.bonus
            ));
        }
    }

    let mut team_ids = championship.team_ids.clone();
    team_ids.sort_unstable();
    team_ids.dedup();
    for id in team_ids {
        hasher.update(format!("member {id}\n"));
    }

    let mut teams: Vec<&Team> = teams.iter().collect();
    teams.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
    for t in teams {
        hasher.update(format!("team {} {}\n", t.id, t.name));
    }

    let mut lines: Vec<String> = matches.iter().map(match_line).collect();
    lines.sort_unstable();
    for line in lines {
        hasher.update(line);
        hasher.update(b"\n");
    }

    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Cache key for a probability: the standings it was derived from plus the estimator weights.
pub fn probability_fingerprint(standings_fingerprint: &str, cfg: &ProbabilityConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"probability/v1\n");
    hasher.update(standings_fingerprint.as_bytes());
    hasher.update(format!(
        "\n{} {} {} {} {} {} {} {}\n",
        cfg.win_ratio_weight,
        cfg.goal_diff_weight,
        cfg.goal_diff_scale,
        cfg.head_to_head_weight,
        cfg.logistic_scale,
        cfg.home_advantage_spread,
        cfg.floor_pct,
        cfg.ceiling_pct
    ));
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn match_line(m: &Match) -> String {
    let periods = m
        .periods
        .iter()
        .map(|p| format!("{}-{}", p.home, p.away))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "match {} {} {} {} {} {:?} {:?} [{}]",
        m.id,
        m.championship_id,
        m.home_team_id,
        m.away_team_id,
        m.status,
        m.home_score,
        m.away_score,
        periods
    )
}
