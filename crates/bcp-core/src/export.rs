//! Export artifact writer.
//!
//! Artifacts land in the configured export directory, named
//! `{category}-prediction-{timestamp}.{ext}` with `:` and `.` in the
//! timestamp replaced by `-` so the name is filesystem-safe everywhere.
//! The pdf and image formats write placeholder text files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use bcp_common::{Category, Result};
use chrono::Utc;
use clap::ValueEnum;
use rand::Rng;
use serde::Serialize;
use tracing::info;

/// Artifact format for `bcp export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values (also accepted as `excel`).
    #[value(alias = "excel")]
    Csv,
    /// Placeholder text file standing in for a PDF document.
    Pdf,
    /// Pretty-printed JSON.
    Json,
    /// Placeholder text file standing in for a chart image.
    Image,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf | ExportFormat::Image => "txt",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Pdf => write!(f, "pdf"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Image => write!(f, "image"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonArtifact {
    prediction_type: Category,
    timestamp: String,
    data: Vec<JsonArtifactRow>,
}

#[derive(Debug, Serialize)]
struct JsonArtifactRow {
    category: String,
    value: u32,
}

/// Write one export artifact and return its path.
///
/// The destination directory is created on demand. Artifact values are
/// placeholder draws, not live predictions.
pub fn write_export(
    dir: &Path,
    category: Category,
    format: ExportFormat,
    rng: &mut impl Rng,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let now = Utc::now();
    let stamp = now
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-");
    let path = dir.join(format!(
        "{category}-prediction-{stamp}.{}",
        format.extension()
    ));

    let body = match format {
        ExportFormat::Csv => format!(
            "Date,Category,Value\n{},{category},{}\n",
            now.format("%Y-%m-%d"),
            rng.random_range(0..=100u32)
        ),
        ExportFormat::Pdf => {
            format!("This would be a PDF document for {category} prediction data.")
        }
        ExportFormat::Json => {
            let artifact = JsonArtifact {
                prediction_type: category,
                timestamp: now.to_rfc3339(),
                data: (1..=3)
                    .map(|i| JsonArtifactRow {
                        category: format!("Category {i}"),
                        value: rng.random_range(0..=100u32),
                    })
                    .collect(),
            };
            serde_json::to_string_pretty(&artifact)?
        }
        ExportFormat::Image => {
            format!("This would be a PNG image of the {category} prediction chart.")
        }
    };

    fs::write(&path, body)?;
    info!(path = %path.display(), %format, "export artifact written");
    Ok(path)
}
