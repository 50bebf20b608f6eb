use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Params, params};

use crate::error::EngineError;
use crate::model::{
    Championship, ChampionshipId, CompetitionType, Match, MatchId, MatchProbability, MatchStatus,
    PeriodScore, Standing, Team, TeamId,
};

const CACHE_DIR: &str = "league_standings";
const DB_FILE: &str = "league.sqlite";

/// Everything one standings computation needs, read at a single point in time.
#[derive(Debug, Clone)]
pub struct ChampionshipSnapshot {
    pub championship: Championship,
    pub teams: Vec<Team>,
    pub completed_matches: Vec<Match>,
}

/// Read side of the match/result store.
pub trait MatchSource {
    fn championship(&self, championship_id: ChampionshipId) -> Result<Championship>;
    fn list_teams(&self, championship_id: ChampionshipId) -> Result<Vec<Team>>;
    fn list_completed_matches(&self, championship_id: ChampionshipId) -> Result<Vec<Match>>;
    fn list_head_to_head(
        &self,
        team_a: TeamId,
        team_b: TeamId,
        championship_id: ChampionshipId,
    ) -> Result<Vec<Match>>;
    fn get_scheduled_match(&self, match_id: MatchId) -> Result<Match>;

    /// Implementations backed by a database should override this to read under one
    /// transaction.
    fn snapshot(&self, championship_id: ChampionshipId) -> Result<ChampionshipSnapshot> {
        Ok(ChampionshipSnapshot {
            championship: self.championship(championship_id)?,
            teams: self.list_teams(championship_id)?,
            completed_matches: self.list_completed_matches(championship_id)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStandings {
    pub fingerprint: String,
    pub computed_at: DateTime<Utc>,
    pub rows: Vec<Standing>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedProbability {
    pub standings_fingerprint: String,
    pub probability: MatchProbability,
}

/// Persisted projections. Always safe to lose: the engine recomputes from scratch.
pub trait ProjectionStore {
    fn load_standings(&self, championship_id: ChampionshipId) -> Result<Option<CachedStandings>>;
    fn save_standings(
        &self,
        championship_id: ChampionshipId,
        fingerprint: &str,
        rows: &[Standing],
    ) -> Result<()>;
    fn load_probability(&self, match_id: MatchId) -> Result<Option<CachedProbability>>;
    fn save_probability(
        &self,
        standings_fingerprint: &str,
        probability: &MatchProbability,
    ) -> Result<()>;
    fn invalidate_probabilities(&self, championship_id: ChampionshipId) -> Result<usize>;
}

pub struct SqliteStore {
    conn: Connection,
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(DB_FILE))
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("enable WAL")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn upsert_team(&self, team: &Team) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO teams (team_id, name) VALUES (?1, ?2)
                 ON CONFLICT(team_id) DO UPDATE SET name = excluded.name",
                params![i64::from(team.id), team.name],
            )
            .context("upsert team")?;
        Ok(())
    }

    /// Creates or renames a championship and replaces its member list. The competition type
    /// is frozen once matches exist against it.
    pub fn upsert_championship(&self, championship: &Championship) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin championship transaction")?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT competition_type FROM championships WHERE championship_id = ?1",
                params![i64::from(championship.id)],
                |row| row.get(0),
            )
            .optional()
            .context("query championship type")?;
        if let Some(existing) = existing
            && existing != championship.competition_type.as_str()
        {
            let matches: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM matches WHERE championship_id = ?1",
                    params![i64::from(championship.id)],
                    |row| row.get(0),
                )
                .context("count championship matches")?;
            if matches > 0 {
                return Err(anyhow!(
                    "championship {} already has {matches} matches under {existing} rules",
                    championship.id
                ));
            }
        }

        tx.execute(
            "INSERT INTO championships (championship_id, name, competition_type) VALUES (?1, ?2, ?3)
             ON CONFLICT(championship_id) DO UPDATE SET
                name = excluded.name,
                competition_type = excluded.competition_type",
            params![
                i64::from(championship.id),
                championship.name,
                championship.competition_type.as_str()
            ],
        )
        .context("upsert championship")?;
        tx.execute(
            "DELETE FROM championship_teams WHERE championship_id = ?1",
            params![i64::from(championship.id)],
        )
        .context("clear championship members")?;
        for team_id in &championship.team_ids {
            tx.execute(
                "INSERT OR IGNORE INTO championship_teams (championship_id, team_id)
                 VALUES (?1, ?2)",
                params![i64::from(championship.id), i64::from(*team_id)],
            )
            .context("insert championship member")?;
        }
        tx.commit().context("commit championship")?;
        Ok(())
    }

    /// Inserts a fixture or rewrites one that is still scheduled. Matches that left the
    /// scheduled state only accept an identical record; any change to an open fixture drops
    /// its stored probability.
    pub fn upsert_match(&self, m: &Match) -> Result<()> {
        if m.home_team_id == m.away_team_id {
            return Err(anyhow!(
                "match {}: team {} cannot play itself",
                m.id,
                m.home_team_id
            ));
        }
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin match transaction")?;

        let existing = query_matches(&tx, "WHERE match_id = ?1", params![m.id as i64])?
            .into_iter()
            .next();
        if let Some(existing) = &existing {
            if existing == m {
                return Ok(());
            }
            if existing.status != MatchStatus::Scheduled {
                return Err(anyhow!(
                    "match {} is {} and can no longer be rewritten",
                    m.id,
                    existing.status
                ));
            }
        }

        let changed = tx.execute(
            r#"
            INSERT INTO matches (
                match_id, championship_id, home_team_id, away_team_id, status,
                scheduled_at, home_score, away_score, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(match_id) DO UPDATE SET
                championship_id = excluded.championship_id,
                home_team_id = excluded.home_team_id,
                away_team_id = excluded.away_team_id,
                status = excluded.status,
                scheduled_at = excluded.scheduled_at,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                updated_at = excluded.updated_at
            WHERE matches.status = 'scheduled'
            "#,
            params![
                m.id as i64,
                i64::from(m.championship_id),
                i64::from(m.home_team_id),
                i64::from(m.away_team_id),
                m.status.as_str(),
                m.scheduled_at.to_rfc3339(),
                m.home_score,
                m.away_score,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert match")?;
        if changed == 0 {
            return Err(anyhow!("match {} is no longer scheduled", m.id));
        }
        if existing.is_some() {
            tx.execute(
                "DELETE FROM match_probabilities WHERE match_id = ?1",
                params![m.id as i64],
            )
            .context("drop probability of rewritten match")?;
        }
        write_periods(&tx, m.id, &m.periods)?;
        tx.commit().context("commit match")?;
        Ok(())
    }

    /// Scheduled -> Completed. A match is completed exactly once; completed scores are never
    /// revised through this path.
    pub fn complete_match(
        &self,
        match_id: MatchId,
        home_score: i32,
        away_score: i32,
        periods: &[PeriodScore],
    ) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin completion transaction")?;
        let changed = tx
            .execute(
                "UPDATE matches
                 SET status = 'completed', home_score = ?2, away_score = ?3, updated_at = ?4
                 WHERE match_id = ?1 AND status = 'scheduled'",
                params![match_id as i64, home_score, away_score, Utc::now().to_rfc3339()],
            )
            .context("complete match")?;
        if changed == 0 {
            return Err(anyhow!("match {match_id} is missing or no longer scheduled"));
        }
        write_periods(&tx, match_id, periods)?;
        tx.commit().context("commit completion")?;
        Ok(())
    }

    /// Scheduled -> Postponed or Cancelled.
    pub fn set_match_status(&self, match_id: MatchId, status: MatchStatus) -> Result<()> {
        if !matches!(status, MatchStatus::Postponed | MatchStatus::Cancelled) {
            return Err(anyhow!(
                "match {match_id}: use complete_match to record results, got {status}"
            ));
        }
        let changed = self
            .conn
            .execute(
                "UPDATE matches SET status = ?2, updated_at = ?3
                 WHERE match_id = ?1 AND status = 'scheduled'",
                params![match_id as i64, status.as_str(), Utc::now().to_rfc3339()],
            )
            .context("update match status")?;
        if changed == 0 {
            return Err(anyhow!("match {match_id} is missing or no longer scheduled"));
        }
        self.conn
            .execute(
                "DELETE FROM match_probabilities WHERE match_id = ?1",
                params![match_id as i64],
            )
            .context("drop probability of closed match")?;
        Ok(())
    }

    pub fn list_championships(&self) -> Result<Vec<ChampionshipId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT championship_id FROM championships ORDER BY championship_id")
            .context("prepare championship list")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, u32>(0))
            .context("query championship list")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode championship id")?);
        }
        Ok(out)
    }

    pub fn list_scheduled_matches(&self, championship_id: ChampionshipId) -> Result<Vec<Match>> {
        self.query_matches(
            "WHERE championship_id = ?1 AND status = 'scheduled'",
            params![i64::from(championship_id)],
        )
    }

    fn query_matches(&self, filter: &str, args: impl Params) -> Result<Vec<Match>> {
        query_matches(&self.conn, filter, args)
    }
}

impl MatchSource for SqliteStore {
    fn championship(&self, championship_id: ChampionshipId) -> Result<Championship> {
        load_championship(&self.conn, championship_id)
    }

    fn list_teams(&self, championship_id: ChampionshipId) -> Result<Vec<Team>> {
        load_teams(&self.conn, championship_id)
    }

    fn list_completed_matches(&self, championship_id: ChampionshipId) -> Result<Vec<Match>> {
        load_completed(&self.conn, championship_id)
    }

    fn list_head_to_head(
        &self,
        team_a: TeamId,
        team_b: TeamId,
        championship_id: ChampionshipId,
    ) -> Result<Vec<Match>> {
        self.query_matches(
            "WHERE championship_id = ?3 AND status = 'completed'
               AND ((home_team_id = ?1 AND away_team_id = ?2)
                 OR (home_team_id = ?2 AND away_team_id = ?1))",
            params![i64::from(team_a), i64::from(team_b), i64::from(championship_id)],
        )
    }

    fn get_scheduled_match(&self, match_id: MatchId) -> Result<Match> {
        let m = self
            .query_matches("WHERE match_id = ?1", params![match_id as i64])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("match {match_id} not found"))?;
        if m.status != MatchStatus::Scheduled {
            return Err(EngineError::NotScheduled {
                match_id,
                status: m.status,
            }
            .into());
        }
        Ok(m)
    }

    fn snapshot(&self, championship_id: ChampionshipId) -> Result<ChampionshipSnapshot> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin snapshot transaction")?;
        let snapshot = ChampionshipSnapshot {
            championship: load_championship(&tx, championship_id)?,
            teams: load_teams(&tx, championship_id)?,
            completed_matches: load_completed(&tx, championship_id)?,
        };
        tx.finish().context("finish snapshot transaction")?;
        Ok(snapshot)
    }
}

impl ProjectionStore for SqliteStore {
    fn load_standings(&self, championship_id: ChampionshipId) -> Result<Option<CachedStandings>> {
        let version: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT fingerprint, computed_at FROM standings_versions
                 WHERE championship_id = ?1",
                params![i64::from(championship_id)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("query standings version")?;
        let Some((fingerprint, computed_at)) = version else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT championship_id, team_id, played, won, drawn, lost, points, scored, conceded
                FROM standings
                WHERE championship_id = ?1
                ORDER BY position ASC
                "#,
            )
            .context("prepare load standings")?;
        let rows = stmt
            .query_map(params![i64::from(championship_id)], |row| {
                Ok(Standing {
                    championship_id: row.get(0)?,
                    team_id: row.get(1)?,
                    played: row.get(2)?,
                    won: row.get(3)?,
                    drawn: row.get(4)?,
                    lost: row.get(5)?,
                    points: row.get(6)?,
                    scored: row.get(7)?,
                    conceded: row.get(8)?,
                })
            })
            .context("query standings")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode standing row")?);
        }

        Ok(Some(CachedStandings {
            fingerprint,
            computed_at: parse_time(&computed_at)?,
            rows: out,
        }))
    }

    fn save_standings(
        &self,
        championship_id: ChampionshipId,
        fingerprint: &str,
        rows: &[Standing],
    ) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin standings transaction")?;
        tx.execute(
            "DELETE FROM standings WHERE championship_id = ?1",
            params![i64::from(championship_id)],
        )
        .context("clear standings")?;
        for (position, s) in rows.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO standings (
                    championship_id, team_id, position, played, won, drawn, lost,
                    points, scored, conceded
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    i64::from(s.championship_id),
                    i64::from(s.team_id),
                    position as i64 + 1,
                    s.played,
                    s.won,
                    s.drawn,
                    s.lost,
                    s.points,
                    s.scored,
                    s.conceded
                ],
            )
            .context("insert standing")?;
        }
        tx.execute(
            "INSERT INTO standings_versions (championship_id, fingerprint, computed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(championship_id) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                computed_at = excluded.computed_at",
            params![
                i64::from(championship_id),
                fingerprint,
                Utc::now().to_rfc3339()
            ],
        )
        .context("upsert standings version")?;
        tx.commit().context("commit standings")?;
        Ok(())
    }

    fn load_probability(&self, match_id: MatchId) -> Result<Option<CachedProbability>> {
        let row: Option<(u8, u8, String, String)> = self
            .conn
            .query_row(
                "SELECT home_win_probability, away_win_probability, calculated_at,
                        standings_fingerprint
                 FROM match_probabilities WHERE match_id = ?1",
                params![match_id as i64],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .context("query match probability")?;
        let Some((home, away, calculated_at, fingerprint)) = row else {
            return Ok(None);
        };
        Ok(Some(CachedProbability {
            standings_fingerprint: fingerprint,
            probability: MatchProbability {
                match_id,
                home_win_probability: home,
                away_win_probability: away,
                calculated_at: parse_time(&calculated_at)?,
            },
        }))
    }

    fn save_probability(
        &self,
        standings_fingerprint: &str,
        probability: &MatchProbability,
    ) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO match_probabilities (
                    match_id, home_win_probability, away_win_probability, calculated_at,
                    standings_fingerprint
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(match_id) DO UPDATE SET
                    home_win_probability = excluded.home_win_probability,
                    away_win_probability = excluded.away_win_probability,
                    calculated_at = excluded.calculated_at,
                    standings_fingerprint = excluded.standings_fingerprint
                "#,
                params![
                    probability.match_id as i64,
                    probability.home_win_probability,
                    probability.away_win_probability,
                    probability.calculated_at.to_rfc3339(),
                    standings_fingerprint
                ],
            )
            .context("upsert match probability")?;
        Ok(())
    }

    fn invalidate_probabilities(&self, championship_id: ChampionshipId) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM match_probabilities WHERE match_id IN
                    (SELECT match_id FROM matches WHERE championship_id = ?1)",
                params![i64::from(championship_id)],
            )
            .context("invalidate match probabilities")
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS championships (
            championship_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            competition_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS championship_teams (
            championship_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            PRIMARY KEY (championship_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            championship_id INTEGER NOT NULL,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            scheduled_at TEXT NOT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_championship ON matches(championship_id);
        CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status);

        CREATE TABLE IF NOT EXISTS match_periods (
            match_id INTEGER NOT NULL,
            period INTEGER NOT NULL,
            home_score INTEGER NOT NULL,
            away_score INTEGER NOT NULL,
            PRIMARY KEY (match_id, period)
        );

        CREATE TABLE IF NOT EXISTS standings (
            championship_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            played INTEGER NOT NULL,
            won INTEGER NOT NULL,
            drawn INTEGER NOT NULL,
            lost INTEGER NOT NULL,
            points INTEGER NOT NULL,
            scored INTEGER NOT NULL,
            conceded INTEGER NOT NULL,
            PRIMARY KEY (championship_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS standings_versions (
            championship_id INTEGER PRIMARY KEY,
            fingerprint TEXT NOT NULL,
            computed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS match_probabilities (
            match_id INTEGER PRIMARY KEY,
            home_win_probability INTEGER NOT NULL,
            away_win_probability INTEGER NOT NULL,
            calculated_at TEXT NOT NULL,
            standings_fingerprint TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn load_championship(conn: &Connection, championship_id: ChampionshipId) -> Result<Championship> {
    let (name, kind): (String, String) = conn
        .query_row(
            "SELECT name, competition_type FROM championships WHERE championship_id = ?1",
            params![i64::from(championship_id)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .context("query championship")?
        .ok_or_else(|| anyhow!("championship {championship_id} not found"))?;
    let competition_type = CompetitionType::parse(&kind).ok_or_else(|| {
        anyhow!("championship {championship_id}: unknown competition type {kind:?}")
    })?;

    let mut stmt = conn
        .prepare(
            "SELECT team_id FROM championship_teams WHERE championship_id = ?1 ORDER BY team_id",
        )
        .context("prepare championship members")?;
    let rows = stmt
        .query_map(params![i64::from(championship_id)], |row| row.get::<_, u32>(0))
        .context("query championship members")?;
    let mut team_ids = Vec::new();
    for row in rows {
        team_ids.push(row.context("decode member id")?);
    }

    Ok(Championship {
        id: championship_id,
        name,
        competition_type,
        team_ids,
    })
}

fn load_teams(conn: &Connection, championship_id: ChampionshipId) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT t.team_id, t.name
            FROM teams t
            JOIN championship_teams ct ON ct.team_id = t.team_id
            WHERE ct.championship_id = ?1
            ORDER BY t.team_id
            "#,
        )
        .context("prepare list teams")?;
    let rows = stmt
        .query_map(params![i64::from(championship_id)], |row| {
            Ok(Team {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("query list teams")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode team row")?);
    }
    Ok(out)
}

// Rows carrying a score under a non-completed status come along too so the calculator can
// report them instead of silently dropping them.
fn load_completed(conn: &Connection, championship_id: ChampionshipId) -> Result<Vec<Match>> {
    query_matches(
        conn,
        "WHERE championship_id = ?1
           AND (status = 'completed' OR home_score IS NOT NULL OR away_score IS NOT NULL)",
        params![i64::from(championship_id)],
    )
}

struct MatchRow {
    id: MatchId,
    championship_id: ChampionshipId,
    home_team_id: TeamId,
    away_team_id: TeamId,
    status: String,
    scheduled_at: String,
    home_score: Option<i32>,
    away_score: Option<i32>,
}

fn query_matches(conn: &Connection, filter: &str, args: impl Params) -> Result<Vec<Match>> {
    let sql = format!(
        "SELECT match_id, championship_id, home_team_id, away_team_id, status, scheduled_at,
                home_score, away_score
         FROM matches {filter}
         ORDER BY scheduled_at ASC, match_id ASC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare match query")?;
    let rows = stmt
        .query_map(args, |row| {
            Ok(MatchRow {
                id: row.get::<_, u64>(0)?,
                championship_id: row.get(1)?,
                home_team_id: row.get(2)?,
                away_team_id: row.get(3)?,
                status: row.get(4)?,
                scheduled_at: row.get(5)?,
                home_score: row.get(6)?,
                away_score: row.get(7)?,
            })
        })
        .context("query matches")?;

    let mut raw = Vec::new();
    for row in rows {
        raw.push(row.context("decode match row")?);
    }

    let mut periods_stmt = conn
        .prepare(
            "SELECT home_score, away_score FROM match_periods WHERE match_id = ?1 ORDER BY period",
        )
        .context("prepare period query")?;

    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        let status = MatchStatus::parse(&r.status)
            .ok_or_else(|| anyhow!("match {}: unknown status {:?}", r.id, r.status))?;
        let period_rows = periods_stmt
            .query_map(params![r.id as i64], |row| {
                Ok(PeriodScore {
                    home: row.get(0)?,
                    away: row.get(1)?,
                })
            })
            .context("query match periods")?;
        let mut periods = Vec::new();
        for p in period_rows {
            periods.push(p.context("decode period row")?);
        }
        out.push(Match {
            id: r.id,
            championship_id: r.championship_id,
            home_team_id: r.home_team_id,
            away_team_id: r.away_team_id,
            status,
            scheduled_at: parse_time(&r.scheduled_at)
                .with_context(|| format!("match {} scheduled_at", r.id))?,
            home_score: r.home_score,
            away_score: r.away_score,
            periods,
        });
    }
    Ok(out)
}

fn write_periods(conn: &Connection, match_id: MatchId, periods: &[PeriodScore]) -> Result<()> {
    conn.execute(
        "DELETE FROM match_periods WHERE match_id = ?1",
        params![match_id as i64],
    )
    .context("clear match periods")?;
    for (idx, p) in periods.iter().enumerate() {
        conn.execute(
            "INSERT INTO match_periods (match_id, period, home_score, away_score)
             VALUES (?1, ?2, ?3, ?4)",
            params![match_id as i64, idx as i64 + 1, p.home, p.away],
        )
        .context("insert match period")?;
    }
    Ok(())
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp {raw:?}"))
}
