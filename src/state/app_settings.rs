use crate::export::{
    CsvExporter, JsonExporter, ReportExporter, STATISTICS_FILE, WORKBOOK_FILE, XlsxExporter,
};
use log::warn;
use premier_api::client::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, PremierApi};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_BASE_URL: &str = "PREMIER_STATS_BASE_URL";
pub const ENV_PAGE_SIZE: &str = "PREMIER_STATS_PAGE_SIZE";
pub const ENV_OUTPUT_DIR: &str = "PREMIER_STATS_OUTPUT_DIR";
pub const ENV_FORMAT: &str = "PREMIER_STATS_FORMAT";
pub const ENV_CONCURRENT_PAGES: &str = "PREMIER_STATS_CONCURRENT_PAGES";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unknown export format {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub base_url: String,
    pub page_size: u32,
    pub output_dir: PathBuf,
    pub format: ExportFormat,
    pub concurrent_pages: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            output_dir: PathBuf::from("."),
            format: ExportFormat::default(),
            concurrent_pages: false,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from a key lookup. Blank values count as unset; values
    /// that don't parse are reported and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let page_size = get(ENV_PAGE_SIZE)
            .and_then(|raw| match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => Some(size),
                _ => {
                    warn!("{ENV_PAGE_SIZE}={raw:?} is not a positive integer, using {}", defaults.page_size);
                    None
                }
            })
            .unwrap_or(defaults.page_size);

        let format = get(ENV_FORMAT)
            .and_then(|raw| match raw.parse::<ExportFormat>() {
                Ok(format) => Some(format),
                Err(e) => {
                    warn!("{ENV_FORMAT}: {e}, using csv");
                    None
                }
            })
            .unwrap_or(defaults.format);

        let concurrent_pages = get(ENV_CONCURRENT_PAGES)
            .and_then(|raw| match parse_flag(&raw) {
                Some(flag) => Some(flag),
                None => {
                    warn!("{ENV_CONCURRENT_PAGES}={raw:?} is not a boolean, using false");
                    None
                }
            })
            .unwrap_or(defaults.concurrent_pages);

        Self {
            base_url: get(ENV_BASE_URL).unwrap_or(defaults.base_url),
            page_size,
            output_dir: get(ENV_OUTPUT_DIR).map(PathBuf::from).unwrap_or(defaults.output_dir),
            format,
            concurrent_pages,
        }
    }

    pub fn api(&self) -> PremierApi {
        PremierApi::new()
            .with_base_url(self.base_url.as_str())
            .with_page_size(self.page_size)
            .with_concurrent_pages(self.concurrent_pages)
    }

    pub fn exporter(&self) -> Box<dyn ReportExporter> {
        match self.format {
            ExportFormat::Csv => Box::new(CsvExporter::new(&self.output_dir)),
            ExportFormat::Json => Box::new(JsonExporter::new(self.output_dir.join(STATISTICS_FILE))),
            ExportFormat::Xlsx => Box::new(XlsxExporter::new(self.output_dir.join(WORKBOOK_FILE))),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
