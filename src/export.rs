use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::{Championship, Match, MatchProbability, Standing, Team, TeamId};

pub struct ExportReport {
    pub standings: usize,
    pub probabilities: usize,
}

enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Number(f64::from(value))
    }
}

/// Writes the ranked table and any match probabilities (paired with their scheduled
/// fixtures) to an `.xlsx` workbook.
pub fn export_standings_xlsx(
    path: &Path,
    championship: &Championship,
    teams: &[Team],
    rows: &[Standing],
    probabilities: &[(Match, MatchProbability)],
) -> Result<ExportReport> {
    let name_of = |id: TeamId| -> String {
        teams
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("team {id}"))
    };

    let mut standings_rows: Vec<Vec<Cell>> = vec![header(&[
        "Pos",
        "Team",
        "Played",
        "Won",
        "Drawn",
        "Lost",
        "Points",
        "Scored",
        "Conceded",
        "Difference",
    ])];
    for (idx, s) in rows.iter().enumerate() {
        standings_rows.push(vec![
            (idx as u32 + 1).into(),
            name_of(s.team_id).into(),
            s.played.into(),
            s.won.into(),
            s.drawn.into(),
            s.lost.into(),
            s.points.into(),
            s.scored.into(),
            s.conceded.into(),
            s.goal_difference().into(),
        ]);
    }

    let mut probability_rows: Vec<Vec<Cell>> = vec![header(&[
        "Match",
        "Scheduled",
        "Home",
        "Away",
        "Home %",
        "Away %",
        "Calculated At",
    ])];
    for (m, p) in probabilities {
        probability_rows.push(vec![
            m.id.to_string().into(),
            m.scheduled_at.format("%Y-%m-%d %H:%M").to_string().into(),
            name_of(m.home_team_id).into(),
            name_of(m.away_team_id).into(),
            p.home_win_probability.into(),
            p.away_win_probability.into(),
            p.calculated_at.to_rfc3339().into(),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Probabilities")?;
        write_rows(sheet, &probability_rows)?;
    }

    workbook.save(path).with_context(|| {
        format!(
            "failed writing {} workbook to {}",
            championship.name,
            path.display()
        )
    })?;

    Ok(ExportReport {
        standings: standings_rows.len().saturating_sub(1),
        probabilities: probability_rows.len().saturating_sub(1),
    })
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles.iter().map(|t| Cell::from(*t)).collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(text) => worksheet.write_string(r, c, text),
                Cell::Number(n) => worksheet.write_number(r, c, *n),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
