use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use league_standings::fake_league::{SeasonShape, generate_season};
use league_standings::logging;
use league_standings::model::CompetitionType;
use league_standings::store::{self, SqliteStore};

const CSI_CHAMPIONSHIP: u32 = 1;
const UISP_CHAMPIONSHIP: u32 = 2;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let db_path = parse_db_path_arg()
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let seed = std::env::var("SEED_LEAGUE_SEED")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(7);
    let store = SqliteStore::open(&db_path)?;

    for (id, kind) in [
        (CSI_CHAMPIONSHIP, CompetitionType::Csi),
        (UISP_CHAMPIONSHIP, CompetitionType::Uisp),
    ] {
        let season = generate_season(
            id,
            kind,
            SeasonShape {
                seed,
                ..SeasonShape::default()
            },
        );
        for team in &season.teams {
            store.upsert_team(team)?;
        }
        store.upsert_championship(&season.championship)?;
        for m in &season.matches {
            store.upsert_match(m)?;
        }
        info!(
            championship_id = id,
            teams = season.teams.len(),
            matches = season.matches.len(),
            "seeded championship"
        );
    }

    println!("Seeded {}", db_path.display());
    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}
