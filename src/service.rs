use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::DataIntegrityWarning;
use crate::fingerprint::{probability_fingerprint, standings_fingerprint};
use crate::model::{
    Championship, ChampionshipId, MatchId, MatchProbability, Standing, Team, TeamId,
};
use crate::standings::{StandingsCalculator, StandingsReport};
use crate::store::{ChampionshipSnapshot, MatchSource, ProjectionStore};
use crate::win_prob::ProbabilityEstimator;

#[derive(Debug, Clone, Serialize)]
pub struct StandingsOutcome {
    pub championship: Championship,
    pub teams: Vec<Team>,
    pub rows: Vec<Standing>,
    /// Only populated when the table was recomputed on this call.
    pub warnings: Vec<DataIntegrityWarning>,
    pub fingerprint: String,
    pub cached: bool,
}

impl StandingsOutcome {
    pub fn row(&self, team_id: TeamId) -> Option<&Standing> {
        self.rows.iter().find(|r| r.team_id == team_id)
    }

    pub fn team_name(&self, team_id: TeamId) -> &str {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.as_str())
            .unwrap_or("?")
    }
}

/// Glue between the store and the pure engine. Persisted tables are memoized by the
/// fingerprint of their inputs, so stale caches are detected rather than trusted.
pub struct StandingsService<S> {
    store: S,
    cfg: EngineConfig,
}

impl<S: MatchSource + ProjectionStore> StandingsService<S> {
    pub fn new(store: S, cfg: EngineConfig) -> Result<Self> {
        cfg.validate().context("engine config")?;
        Ok(Self { store, cfg })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn standings(&self, championship_id: ChampionshipId) -> Result<StandingsOutcome> {
        let snapshot = self
            .store
            .snapshot(championship_id)
            .with_context(|| format!("load championship {championship_id}"))?;
        let fingerprint = standings_fingerprint(
            &snapshot.championship,
            &snapshot.teams,
            &snapshot.completed_matches,
            &self.cfg,
        );

        if let Some(cached) = self.store.load_standings(championship_id)?
            && cached.fingerprint == fingerprint
        {
            debug!(championship_id, "standings cache hit");
            return Ok(StandingsOutcome {
                championship: snapshot.championship,
                teams: snapshot.teams,
                rows: cached.rows,
                warnings: Vec::new(),
                fingerprint,
                cached: true,
            });
        }

        let report = compute_snapshot(&snapshot, &self.cfg);
        self.persist(snapshot, fingerprint, report)
    }

    /// Recomputes several championships. Reads and writes go through the store one at a
    /// time; the tables themselves are computed in parallel.
    pub fn recompute_all(
        &self,
        championship_ids: &[ChampionshipId],
    ) -> Result<Vec<StandingsOutcome>> {
        let mut snapshots = Vec::with_capacity(championship_ids.len());
        for id in championship_ids {
            let snapshot = self
                .store
                .snapshot(*id)
                .with_context(|| format!("load championship {id}"))?;
            snapshots.push(snapshot);
        }

        let cfg = self.cfg;
        let computed: Vec<(String, StandingsReport)> = snapshots
            .par_iter()
            .map(|snap| {
                let fingerprint = standings_fingerprint(
                    &snap.championship,
                    &snap.teams,
                    &snap.completed_matches,
                    &cfg,
                );
                (fingerprint, compute_snapshot(snap, &cfg))
            })
            .collect();

        let mut out = Vec::with_capacity(snapshots.len());
        for (snapshot, (fingerprint, report)) in snapshots.into_iter().zip(computed) {
            out.push(self.persist(snapshot, fingerprint, report)?);
        }
        info!(championships = out.len(), "recompute finished");
        Ok(out)
    }

    /// Win split for a scheduled match, from current standings and head-to-head history.
    pub fn probability(&self, match_id: MatchId) -> Result<MatchProbability> {
        let scheduled = self.store.get_scheduled_match(match_id)?;
        let table = self.standings(scheduled.championship_id)?;
        let key = probability_fingerprint(&table.fingerprint, &self.cfg.probability);

        if let Some(cached) = self.store.load_probability(match_id)?
            && cached.standings_fingerprint == key
        {
            debug!(match_id, "probability cache hit");
            return Ok(cached.probability);
        }

        let home = table.row(scheduled.home_team_id).ok_or_else(|| {
            anyhow!(
                "match {match_id}: home team {} has no row in championship {}",
                scheduled.home_team_id,
                scheduled.championship_id
            )
        })?;
        let away = table.row(scheduled.away_team_id).ok_or_else(|| {
            anyhow!(
                "match {match_id}: away team {} has no row in championship {}",
                scheduled.away_team_id,
                scheduled.championship_id
            )
        })?;
        let history = self.store.list_head_to_head(
            scheduled.home_team_id,
            scheduled.away_team_id,
            scheduled.championship_id,
        )?;

        let probability = ProbabilityEstimator::new(self.cfg.probability)?.estimate_match(
            &scheduled,
            home,
            away,
            &history,
            Utc::now(),
        )?;
        self.store.save_probability(&key, &probability)?;
        debug!(
            match_id,
            home = probability.home_win_probability,
            away = probability.away_win_probability,
            "probability estimated"
        );
        Ok(probability)
    }

    fn persist(
        &self,
        snapshot: ChampionshipSnapshot,
        fingerprint: String,
        report: StandingsReport,
    ) -> Result<StandingsOutcome> {
        let championship_id = snapshot.championship.id;
        let previous = self
            .store
            .load_standings(championship_id)?
            .map(|c| c.fingerprint);

        if previous.as_deref() != Some(fingerprint.as_str()) {
            self.store
                .save_standings(championship_id, &fingerprint, &report.rows)?;
            let dropped = self.store.invalidate_probabilities(championship_id)?;
            info!(
                championship_id,
                teams = report.rows.len(),
                matches = report.matches_counted,
                skipped = report.warnings.len(),
                dropped_probabilities = dropped,
                "standings recomputed"
            );
        }

        Ok(StandingsOutcome {
            championship: snapshot.championship,
            teams: snapshot.teams,
            rows: report.rows,
            warnings: report.warnings,
            fingerprint,
            cached: false,
        })
    }
}

fn compute_snapshot(snapshot: &ChampionshipSnapshot, cfg: &EngineConfig) -> StandingsReport {
    StandingsCalculator::for_championship(&snapshot.championship, cfg).compute(
        &snapshot.championship,
        &snapshot.teams,
        &snapshot.completed_matches,
    )
}
