use crate::core::models::Metadata;
use crate::core::models::design::{
    BackboneResult, DesignResult, PredictionResult, RankedDesign, ScoredDesign,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error for '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Table '{path}' is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("Table '{path}' row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// A record that can be written as one row of a stage table.
///
/// The header is the fixed `COLUMNS` followed by the sorted union of metadata keys across
/// all rows, so a given stage always produces the same column order for the same inputs.
pub trait TableRow {
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<String>;

    fn metadata(&self) -> Option<&Metadata> {
        None
    }
}

fn format_float(value: f64) -> String {
    format!("{value}")
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

/// Writes rows to `path`, always emitting a header even when `rows` is empty.
pub fn write_table<R: TableRow>(path: &Path, rows: &[R]) -> Result<(), TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let metadata_columns: BTreeSet<&str> = rows
        .iter()
        .filter_map(|r| r.metadata())
        .flat_map(|m| m.keys().map(String::as_str))
        .filter(|k| !R::COLUMNS.contains(k))
        .collect();

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    let header = R::COLUMNS
        .iter()
        .copied()
        .chain(metadata_columns.iter().copied());
    writer.write_record(header).map_err(csv_err)?;

    for row in rows {
        let mut record = row.values();
        let metadata = row.metadata();
        record.extend(metadata_columns.iter().map(|key| {
            metadata
                .and_then(|m| m.get(*key))
                .cloned()
                .unwrap_or_default()
        }));
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;
    Ok(())
}

impl TableRow for BackboneResult {
    const COLUMNS: &'static [&'static str] = &["backbone_id", "structure_path", "chain_id", "mode"];

    fn values(&self) -> Vec<String> {
        vec![
            self.backbone_id.clone(),
            self.structure_path.display().to_string(),
            self.peptide_chain_id.to_string(),
            self.metadata.get("mode").cloned().unwrap_or_default(),
        ]
    }

    fn metadata(&self) -> Option<&Metadata> {
        Some(&self.metadata)
    }
}

impl TableRow for DesignResult {
    const COLUMNS: &'static [&'static str] = &["design_id", "backbone_id", "sequence", "score"];

    fn values(&self) -> Vec<String> {
        vec![
            self.design_id.clone(),
            self.backbone_id.clone(),
            self.sequence.clone(),
            format_optional(self.score),
        ]
    }

    fn metadata(&self) -> Option<&Metadata> {
        Some(&self.metadata)
    }
}

impl TableRow for ScoredDesign {
    const COLUMNS: &'static [&'static str] = &[
        "design_id",
        "backbone_id",
        "sequence",
        "score",
        "net_charge",
        "isoelectric_point",
        "hydrophobic_fraction",
        "aromatic_fraction",
        "positive_fraction",
        "negative_fraction",
        "polar_fraction",
        "cysteine_count",
        "aggregation_flag",
        "passes_filters",
    ];

    fn values(&self) -> Vec<String> {
        let p = &self.properties;
        let mut values = self.design.values();
        values.extend([
            format_float(p.net_charge),
            format_float(p.isoelectric_point),
            format_float(p.hydrophobic_fraction),
            format_float(p.aromatic_fraction),
            format_float(p.positive_fraction),
            format_float(p.negative_fraction),
            format_float(p.polar_fraction),
            p.cysteine_count.to_string(),
            p.aggregation_flag.to_string(),
            self.passes_filters.to_string(),
        ]);
        values
    }

    fn metadata(&self) -> Option<&Metadata> {
        Some(&self.design.metadata)
    }
}

impl TableRow for RankedDesign {
    const COLUMNS: &'static [&'static str] = &[
        "design_id",
        "backbone_id",
        "sequence",
        "score",
        "net_charge",
        "isoelectric_point",
        "hydrophobic_fraction",
        "aromatic_fraction",
        "positive_fraction",
        "negative_fraction",
        "polar_fraction",
        "cysteine_count",
        "aggregation_flag",
        "passes_filters",
        "composite_score",
        "rank",
    ];

    fn values(&self) -> Vec<String> {
        let mut values = self.scored.values();
        values.push(format_float(self.composite_score));
        values.push(self.rank.to_string());
        values
    }

    fn metadata(&self) -> Option<&Metadata> {
        Some(&self.scored.design.metadata)
    }
}

impl TableRow for PredictionResult {
    const COLUMNS: &'static [&'static str] =
        &["design_id", "predicted_structure_path", "confidence"];

    fn values(&self) -> Vec<String> {
        vec![
            self.design_id.clone(),
            self.predicted_structure_path.display().to_string(),
            format_optional(self.confidence),
        ]
    }

    fn metadata(&self) -> Option<&Metadata> {
        Some(&self.metadata)
    }
}

/// Reads a designs table (`design_id, backbone_id, sequence, score` plus metadata columns).
///
/// Unknown columns are carried into each row's metadata; an empty `score` cell reads as
/// no score.
pub fn read_design_table(path: &Path) -> Result<Vec<DesignResult>, TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let position = |column: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| TableError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })
    };
    let id_col = position("design_id")?;
    let backbone_col = position("backbone_id")?;
    let sequence_col = position("sequence")?;
    let score_col = position("score").ok();
    let fixed = [Some(id_col), Some(backbone_col), Some(sequence_col), score_col];

    let mut designs = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let score = match score_col.map(field).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| TableError::InvalidValue {
                path: path.to_path_buf(),
                row: row_idx + 1,
                column: "score",
                value: raw.clone(),
            })?),
            None => None,
        };

        let metadata: Metadata = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| !fixed.contains(&Some(*idx)))
            .map(|(idx, name)| (name.trim().to_string(), field(idx)))
            .collect();

        designs.push(DesignResult {
            design_id: field(id_col),
            backbone_id: field(backbone_col),
            sequence: field(sequence_col),
            score,
            metadata,
        });
    }
    Ok(designs)
}
