use crate::state::nationality::NationalityAggregate;
use log::info;
use premier_api::PlayerStat;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const PLAYERS_FILE: &str = "players.csv";
pub const NATIONALITIES_FILE: &str = "nationalities.csv";
pub const STATISTICS_FILE: &str = "statistics.json";
pub const WORKBOOK_FILE: &str = "statistics.xlsx";

const PLAYER_COLUMNS: [&str; 4] = ["rank", "name", "nationality", "goals"];
const NATIONALITY_COLUMNS: [&str; 7] = [
    "name",
    "bestPlayerRank",
    "worstPlayerRank",
    "totalPlayers",
    "bestPlayerGoals",
    "worstPlayerGoals",
    "totalGoals",
];

/// Sink for the two sorted reports of a run.
pub trait ReportExporter {
    fn export(
        &self,
        players: &[PlayerStat],
        nationalities: &[NationalityAggregate],
    ) -> Result<(), ExportError>;
}

impl<E: ReportExporter + ?Sized> ReportExporter for Box<E> {
    fn export(
        &self,
        players: &[PlayerStat],
        nationalities: &[NationalityAggregate],
    ) -> Result<(), ExportError> {
        (**self).export(players, nationalities)
    }
}

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error, PathBuf),
    Csv(csv::Error, PathBuf),
    Json(serde_json::Error, PathBuf),
    Xlsx(XlsxError, PathBuf),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e, path) => write!(f, "I/O error writing {}: {e}", path.display()),
            ExportError::Csv(e, path) => write!(f, "CSV error writing {}: {e}", path.display()),
            ExportError::Json(e, path) => write!(f, "JSON error writing {}: {e}", path.display()),
            ExportError::Xlsx(e, path) => write!(f, "XLSX error writing {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e, _) => Some(e),
            ExportError::Csv(e, _) => Some(e),
            ExportError::Json(e, _) => Some(e),
            ExportError::Xlsx(e, _) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV: players.csv + nationalities.csv
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_rows<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| ExportError::Csv(e, path.clone()))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| ExportError::Csv(e, path.clone()))?;
        }
        writer.flush().map_err(|e| ExportError::Io(e, path.clone()))?;
        Ok(path)
    }
}

impl ReportExporter for CsvExporter {
    fn export(
        &self,
        players: &[PlayerStat],
        nationalities: &[NationalityAggregate],
    ) -> Result<(), ExportError> {
        ensure_directory(&self.dir)?;

        info!("Exporting players stats...");
        let path = self.write_rows(PLAYERS_FILE, players)?;
        info!("Players stats exported to {}", path.display());

        info!("Exporting nationalities stats...");
        let path = self.write_rows(NATIONALITIES_FILE, nationalities)?;
        info!("Nationalities stats exported to {}", path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON: one statistics.json document
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StatisticsDocument<'a> {
    players: &'a [PlayerStat],
    nationalities: &'a [NationalityAggregate],
}

#[derive(Debug, Clone)]
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportExporter for JsonExporter {
    fn export(
        &self,
        players: &[PlayerStat],
        nationalities: &[NationalityAggregate],
    ) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            ensure_directory(parent)?;
        }

        info!("Exporting statistics...");
        let file = File::create(&self.path).map_err(|e| ExportError::Io(e, self.path.clone()))?;
        let mut writer = BufWriter::new(file);
        let document = StatisticsDocument { players, nationalities };
        serde_json::to_writer_pretty(&mut writer, &document)
            .map_err(|e| ExportError::Json(e, self.path.clone()))?;
        writer
            .flush()
            .map_err(|e| ExportError::Io(e, self.path.clone()))?;
        info!("Statistics exported to {}", self.path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// XLSX: statistics.xlsx with "Players" and "Nationalities" sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct XlsxExporter {
    path: PathBuf,
}

impl XlsxExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn build_workbook(
        players: &[PlayerStat],
        nationalities: &[NationalityAggregate],
    ) -> Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_header(sheet, &PLAYER_COLUMNS, &bold)?;
        for (i, player) in players.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_number(row, 0, player.rank)?;
            sheet.write_string(row, 1, &player.name)?;
            sheet.write_string(row, 2, &player.nationality)?;
            sheet.write_number(row, 3, player.goals)?;
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name("Nationalities")?;
        write_header(sheet, &NATIONALITY_COLUMNS, &bold)?;
        for (i, n) in nationalities.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, &n.name)?;
            sheet.write_number(row, 1, n.best_player_rank)?;
            sheet.write_number(row, 2, n.worst_player_rank)?;
            sheet.write_number(row, 3, n.total_players)?;
            sheet.write_number(row, 4, n.best_player_goals)?;
            sheet.write_number(row, 5, n.worst_player_goals)?;
            sheet.write_number(row, 6, n.total_goals as f64)?;
        }

        Ok(workbook)
    }
}

fn write_header(sheet: &mut Worksheet, columns: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

impl ReportExporter for XlsxExporter {
    fn export(
        &self,
        players: &[PlayerStat],
        nationalities: &[NationalityAggregate],
    ) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            ensure_directory(parent)?;
        }

        info!("Exporting statistics workbook...");
        let mut workbook = Self::build_workbook(players, nationalities)
            .map_err(|e| ExportError::Xlsx(e, self.path.clone()))?;
        workbook
            .save(&self.path)
            .map_err(|e| ExportError::Xlsx(e, self.path.clone()))?;
        info!("Statistics exported to {}", self.path.display());
        Ok(())
    }
}

fn ensure_directory(dir: &Path) -> Result<(), ExportError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| ExportError::Io(e, dir.to_path_buf()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
