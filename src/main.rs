use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use league_standings::config::EngineConfig;
use league_standings::export::export_standings_xlsx;
use league_standings::logging;
use league_standings::model::{ChampionshipId, MatchId};
use league_standings::service::{StandingsOutcome, StandingsService};
use league_standings::store::{self, MatchSource, SqliteStore};

const USAGE: &str = "usage: league_standings [--db <path>] <command>
  table <championship_id>
  predict <match_id>
  export <championship_id> <path.xlsx>
  recompute";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let cfg = *EngineConfig::global()?;
    let (db_path, command) = parse_args(std::env::args().skip(1).collect())?;
    let db_path = db_path
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let service = StandingsService::new(SqliteStore::open(&db_path)?, cfg)?;

    match command.as_slice() {
        [cmd, id] if cmd == "table" => {
            let outcome = service.standings(parse_id(id, "championship id")?)?;
            print_table(&outcome);
        }
        [cmd, id] if cmd == "predict" => predict(&service, parse_id(id, "match id")?)?,
        [cmd, id, path] if cmd == "export" => {
            export(&service, parse_id(id, "championship id")?, Path::new(path))?
        }
        [cmd] if cmd == "recompute" => {
            let ids = service.store().list_championships()?;
            for outcome in service.recompute_all(&ids)? {
                println!(
                    "{} ({}): {} teams, {} skipped matches",
                    outcome.championship.name,
                    outcome.championship.competition_type,
                    outcome.rows.len(),
                    outcome.warnings.len()
                );
            }
        }
        _ => return Err(anyhow!("{USAGE}")),
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<(Option<PathBuf>, Vec<String>)> {
    let mut db = None;
    let mut rest = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if let Some(path) = arg.strip_prefix("--db=") {
            db = Some(PathBuf::from(path.trim()));
        } else if arg == "--db" {
            let next = iter.next().ok_or_else(|| anyhow!("--db needs a path"))?;
            db = Some(PathBuf::from(next));
        } else {
            rest.push(arg);
        }
    }
    Ok((db.filter(|p| !p.as_os_str().is_empty()), rest))
}

fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| anyhow!("invalid {what}: {raw:?}"))
}

fn print_table(outcome: &StandingsOutcome) {
    println!(
        "{} ({}){}",
        outcome.championship.name,
        outcome.championship.competition_type,
        if outcome.cached { " [cached]" } else { "" }
    );
    println!(
        "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>5} {:>6} {:>6} {:>6}",
        "#", "Team", "P", "W", "D", "L", "Pts", "For", "Agst", "Diff"
    );
    for (idx, s) in outcome.rows.iter().enumerate() {
        println!(
            "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>5} {:>6} {:>6} {:>+6}",
            idx + 1,
            outcome.team_name(s.team_id),
            s.played,
            s.won,
            s.drawn,
            s.lost,
            s.points,
            s.scored,
            s.conceded,
            s.goal_difference()
        );
    }
    if !outcome.warnings.is_empty() {
        println!("skipped {} match(es):", outcome.warnings.len());
        for w in outcome.warnings.iter().take(10) {
            println!("  - match {}: {}", w.match_id, w.message);
        }
    }
}

fn predict(service: &StandingsService<SqliteStore>, match_id: MatchId) -> Result<()> {
    let scheduled = service.store().get_scheduled_match(match_id)?;
    let probability = service.probability(match_id)?;
    let table = service.standings(scheduled.championship_id)?;
    println!(
        "{} vs {}: {}% / {}%",
        table.team_name(scheduled.home_team_id),
        table.team_name(scheduled.away_team_id),
        probability.home_win_probability,
        probability.away_win_probability
    );
    Ok(())
}

fn export(
    service: &StandingsService<SqliteStore>,
    championship_id: ChampionshipId,
    path: &Path,
) -> Result<()> {
    let table = service.standings(championship_id)?;
    let mut probabilities = Vec::new();
    for m in service.store().list_scheduled_matches(championship_id)? {
        match service.probability(m.id) {
            Ok(p) => probabilities.push((m, p)),
            Err(err) => warn!(match_id = m.id, error = %err, "no probability for export"),
        }
    }
    let report = export_standings_xlsx(
        path,
        &table.championship,
        &table.teams,
        &table.rows,
        &probabilities,
    )?;
    println!(
        "wrote {} ({} standings, {} probabilities)",
        path.display(),
        report.standings,
        report.probabilities
    );
    Ok(())
}
