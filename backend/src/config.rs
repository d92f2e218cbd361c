//! Report configuration.
//!
//! Values are resolved in layers: built-in defaults, then an optional JSON
//! file, then environment variables (a `.env` file is honored), then
//! whatever the caller sets explicitly (CLI flags).
//!
//! | Variable            | Field                          |
//! |---------------------|--------------------------------|
//! | `COMPS_TITLE`       | [`ReportConfig::title`]        |
//! | `COMPS_SUBDIVISION` | [`ReportConfig::subdivision`]  |
//! | `COMPS_SHEET`       | [`ReportConfig::input_sheet`]  |
//! | `COMPS_PORT`        | HTTP port, see [`port_from_env`] |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Sheet the raw MLS export is expected in.
pub const DEFAULT_INPUT_SHEET: &str = "Existing Comps Data";

/// Sheet name of the formatted output.
pub const DEFAULT_OUTPUT_SHEET: &str = "Existing Comps";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum upload size accepted by the HTTP surface (50 MB).
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Text and naming choices for the formatted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportConfig {
    /// Title in the top-left of the report.
    pub title: String,

    /// Subdivision / grouping label. A date stamp is used when unset.
    pub subdivision: Option<String>,

    /// Free-form criteria lines listed under "Criteria".
    pub criteria: Vec<String>,

    /// Sheet to read from the input workbook.
    pub input_sheet: String,

    /// Sheet name of the output workbook.
    pub output_sheet: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Existing Sold Comps".to_string(),
            subdivision: None,
            criteria: vec![
                "Sold last year".to_string(),
                "South of 7800, West of 2200, N".to_string(),
                "SFH, not manufactured".to_string(),
            ],
            input_sheet: DEFAULT_INPUT_SHEET.to_string(),
            output_sheet: DEFAULT_OUTPUT_SHEET.to_string(),
        }
    }
}

impl ReportConfig {
    /// Defaults, overlaid with `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };

        let _ = dotenvy::dotenv();
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Apply `COMPS_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(title) = non_empty("COMPS_TITLE") {
            self.title = title;
        }
        if let Some(subdivision) = non_empty("COMPS_SUBDIVISION") {
            self.subdivision = Some(subdivision);
        }
        if let Some(sheet) = non_empty("COMPS_SHEET") {
            self.input_sheet = sheet;
        }
    }

    /// Label printed under the title: the subdivision, or a date stamp.
    pub fn grouping_label(&self, today: NaiveDate) -> String {
        match self.subdivision.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => format!("As of {}", today.format("%Y-%m-%d")),
        }
    }

    fn check(&self) -> ConfigResult<()> {
        if self.input_sheet.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "inputSheet".into(),
                message: "must not be empty".into(),
            });
        }
        // Excel caps sheet names at 31 characters.
        if self.output_sheet.trim().is_empty() || self.output_sheet.chars().count() > 31 {
            return Err(ConfigError::InvalidValue {
                key: "outputSheet".into(),
                message: "must be 1 to 31 characters".into(),
            });
        }
        Ok(())
    }
}

/// HTTP port from `COMPS_PORT`, or `default` when unset.
pub fn port_from_env(default: u16) -> ConfigResult<u16> {
    let _ = dotenvy::dotenv();
    parse_port(env::var("COMPS_PORT").ok(), default)
}

fn parse_port(raw: Option<String>, default: u16) -> ConfigResult<u16> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "COMPS_PORT".into(),
            message: format!("'{}' is not a port number", v),
        }),
    }
}
