use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

static GLOBAL: OnceCell<EngineConfig> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsiPoints {
    pub win: u32,
    pub loss: u32,
}

impl Default for CsiPoints {
    fn default() -> Self {
        Self { win: 2, loss: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UispPoints {
    pub periods: u32,
    pub period_win: u32,
    pub period_loss: u32,
    // Kept as a parameter even though the current regulation awards nothing for a drawn period.
    pub period_draw: u32,
    pub bonus: u32,
}

impl Default for UispPoints {
    fn default() -> Self {
        Self {
            periods: 4,
            period_win: 1,
            period_loss: 0,
            period_draw: 0,
            bonus: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityConfig {
    pub win_ratio_weight: f64,
    pub goal_diff_weight: f64,
    /// Average per-match differential that counts as a full unit of strength.
    pub goal_diff_scale: f64,
    pub head_to_head_weight: f64,
    pub logistic_scale: f64,
    /// Percentage points separating home and away when both sides are equally strong.
    pub home_advantage_spread: f64,
    pub floor_pct: u8,
    pub ceiling_pct: u8,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            win_ratio_weight: 1.0,
            goal_diff_weight: 1.0,
            goal_diff_scale: 10.0,
            head_to_head_weight: 0.5,
            logistic_scale: 2.0,
            home_advantage_spread: 10.0,
            floor_pct: 2,
            ceiling_pct: 98,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub csi: CsiPoints,
    #[serde(default)]
    pub uisp: UispPoints,
    #[serde(default)]
    pub probability: ProbabilityConfig,
}

impl EngineConfig {
    /// Process-wide config resolved once from `LEAGUE_CONFIG` and the env overrides.
    pub fn global() -> Result<&'static EngineConfig> {
        GLOBAL.get_or_try_init(EngineConfig::from_env)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = match opt_env("LEAGUE_CONFIG") {
            Some(path) => EngineConfig::load_json(Path::new(&path))?,
            None => EngineConfig::default(),
        };

        override_env(&mut cfg.csi.win, "CSI_POINTS_WIN")?;
        override_env(&mut cfg.csi.loss, "CSI_POINTS_LOSS")?;
        override_env(&mut cfg.uisp.periods, "UISP_PERIODS")?;
        override_env(&mut cfg.uisp.period_win, "UISP_POINTS_PERIOD_WIN")?;
        override_env(&mut cfg.uisp.period_loss, "UISP_POINTS_PERIOD_LOSS")?;
        override_env(&mut cfg.uisp.period_draw, "UISP_POINTS_PERIOD_DRAW")?;
        override_env(&mut cfg.uisp.bonus, "UISP_POINTS_BONUS")?;
        override_env(
            &mut cfg.probability.home_advantage_spread,
            "PROB_HOME_ADVANTAGE",
        )?;
        override_env(&mut cfg.probability.floor_pct, "PROB_FLOOR")?;
        override_env(&mut cfg.probability.ceiling_pct, "PROB_CEILING")?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        let cfg = serde_json::from_str::<EngineConfig>(&raw)
            .with_context(|| format!("parse engine config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize engine config")?;
        fs::write(&tmp, json).context("write engine config")?;
        fs::rename(&tmp, path).context("swap engine config")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.uisp.periods == 0 {
            return Err(anyhow!("UISP rules need at least one period"));
        }
        self.probability.validate()?;
        Ok(())
    }
}

impl ProbabilityConfig {
    /// Bounds must mirror each other around 50 so both sides of a split stay inside them.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.floor_pct >= 50
            || self.ceiling_pct <= 50
            || u16::from(self.floor_pct) + u16::from(self.ceiling_pct) != 100
        {
            return Err(EngineError::invalid_config(format!(
                "bounds must be symmetric around 50 (floor={}, ceiling={})",
                self.floor_pct, self.ceiling_pct
            )));
        }
        if !(self.goal_diff_scale > 0.0 && self.logistic_scale > 0.0) {
            return Err(EngineError::invalid_config("scales must be positive"));
        }
        if !(0.0..100.0).contains(&self.home_advantage_spread) {
            return Err(EngineError::invalid_config(format!(
                "home advantage spread {} outside [0, 100)",
                self.home_advantage_spread
            )));
        }
        let weights = [
            self.win_ratio_weight,
            self.goal_diff_weight,
            self.head_to_head_weight,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(EngineError::invalid_config("weights must be finite"));
        }
        Ok(())
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

fn override_env<T: FromStr>(slot: &mut T, key: &str) -> Result<()> {
    let Some(raw) = opt_env(key) else {
        return Ok(());
    };
    *slot = raw
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("invalid value for {key}: {raw:?}"))?;
    Ok(())
}
