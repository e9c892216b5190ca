//! Pipeline engine.

use thiserror::Error;
use tracing::debug;

use crate::dataset::{Dataset, DatasetError};
use crate::geometry::GeometryBackend;
use crate::transforms;

use super::plan::{Operation, Plan, Step};

/// Error type for a failed pipeline run. Never escapes [`run`]; it is
/// folded into the returned [`PipelineResult`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{operation}: column not found: {column}")]
    MissingColumn {
        operation: &'static str,
        column: String,
    },

    #[error("Transliteration was requested without specifying the source language(s)")]
    MissingTransliterationLanguages,

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Outcome of one pipeline execution: the transformed dataset, or a
/// failure message. A failed run never yields a partially transformed
/// dataset.
#[derive(Debug)]
pub struct PipelineResult {
    pub dataset: Option<Dataset>,
    pub success: bool,
    pub error: Option<String>,
}

impl PipelineResult {
    fn ok(dataset: Dataset) -> Self {
        Self {
            dataset: Some(dataset),
            success: true,
            error: None,
        }
    }

    fn failed(error: EngineError) -> Self {
        Self {
            dataset: None,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Applies every plan step, in plan order, to the dataset.
///
/// The first failing step stops the run and discards the dataset. Each
/// step checks that all of its columns exist before mutating any of
/// them, so a single operation is all-or-nothing over its column set.
/// No error or panic escapes to the caller.
pub fn run(mut dataset: Dataset, plan: &Plan, geometry: &dyn GeometryBackend) -> PipelineResult {
    for step in plan.steps() {
        debug!(
            operation = step.operation.name(),
            columns = step.columns.len(),
            "applying pipeline step"
        );
        if let Err(error) = apply_step(&mut dataset, step, geometry) {
            return PipelineResult::failed(error);
        }
    }
    PipelineResult::ok(dataset)
}

fn apply_step(
    dataset: &mut Dataset,
    step: &Step,
    geometry: &dyn GeometryBackend,
) -> Result<(), EngineError> {
    // Column existence is verified up front so the operation either
    // transforms its whole column set or leaves the dataset untouched.
    for column in &step.columns {
        if !dataset.has_column(column) {
            return Err(EngineError::MissingColumn {
                operation: step.operation.name(),
                column: column.clone(),
            });
        }
    }

    match &step.operation {
        Operation::Date { target_format } => {
            for column in &step.columns {
                dataset.apply_column(column, |v| transforms::normalize_date(v, target_format))?;
            }
        }
        Operation::Phone { exit_code } => {
            for column in &step.columns {
                dataset.apply_column(column, |v| {
                    transforms::normalize_phone(v, exit_code.as_deref())
                })?;
            }
        }
        Operation::SpecialCharacters => {
            for column in &step.columns {
                dataset.apply_column(column, transforms::special_characters)?;
            }
        }
        Operation::Alphabetical => {
            for column in &step.columns {
                dataset.apply_column(column, transforms::alphabetical)?;
            }
        }
        Operation::Case => {
            for column in &step.columns {
                dataset.apply_column(column, transforms::lower_case)?;
            }
        }
        Operation::Transliteration {
            langs,
            fallback_target,
        } => {
            if langs.is_empty() {
                return Err(EngineError::MissingTransliterationLanguages);
            }
            for column in &step.columns {
                dataset.apply_column(column, |v| {
                    transforms::transliterate(v, langs, fallback_target)
                })?;
            }
        }
        Operation::ValueCleaning => {
            for column in &step.columns {
                dataset.apply_column(column, transforms::clean_value)?;
            }
        }
        Operation::WktGeometry => {
            for column in &step.columns {
                dataset.apply_column(column, |v| {
                    geometry.normalize_wkt(v).unwrap_or_else(|| v.to_string())
                })?;
            }
        }
        Operation::ColumnNames { version } => {
            let normalized = transforms::normalize_column_names(dataset.columns(), *version);
            dataset.set_columns(normalized)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WktBackend;
    use crate::pipeline::options::{NormalizeOptions, ResourceKind};

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn plan(options: &NormalizeOptions) -> Plan {
        Plan::from_options(options).unwrap()
    }

    #[test]
    fn test_single_column_transform() {
        let ds = dataset(&["name"], &[&["FaGi"], &["OTHER"]]);
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.case_normalization = vec!["name".to_string()];

        let result = run(ds, &plan(&options), &WktBackend);
        assert!(result.success);
        let ds = result.dataset.unwrap();
        assert_eq!(ds.column_values("name").unwrap(), vec!["fagi", "other"]);
    }

    #[test]
    fn test_missing_column_fails_whole_run() {
        let ds = dataset(&["name"], &[&["x"]]);
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.case_normalization = vec!["name".to_string(), "missing".to_string()];

        let result = run(ds, &plan(&options), &WktBackend);
        assert!(!result.success);
        assert!(result.dataset.is_none());
        let message = result.error.unwrap();
        assert!(message.contains("missing"), "{message}");
    }

    #[test]
    fn test_operations_run_in_fixed_order() {
        // Case runs before transliteration in the fixed order, so the
        // capital Greek sigma is lowercased first and then maps through
        // the lowercase table entry.
        let ds = dataset(&["name"], &[&["Σ"]]);
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.case_normalization = vec!["name".to_string()];
        options.transliteration = vec!["name".to_string()];
        options.transliteration_lang = Some("el".to_string());

        let result = run(ds, &plan(&options), &WktBackend);
        assert!(result.success);
        let ds = result.dataset.unwrap();
        assert_eq!(ds.column_values("name").unwrap(), vec!["s"]);
    }

    #[test]
    fn test_transliteration_end_to_end() {
        let ds = dataset(&["name"], &[&["Ελληνική Δημοκρατία"], &["plain"]]);
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.transliteration = vec!["name".to_string()];
        options.transliteration_lang = Some("el".to_string());

        let result = run(ds, &plan(&options), &WktBackend);
        assert!(result.success);
        let ds = result.dataset.unwrap();
        assert_eq!(
            ds.column_values("name").unwrap(),
            vec!["Elliniki Dimokratia", "plain"]
        );
    }

    #[test]
    fn test_wkt_step_keeps_unparseable_values() {
        let ds = dataset(
            &["geometry"],
            &[&["POLYGON((0 0,0 2,2 2,2 0))"], &["garbage"]],
        );
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.wkt_normalization = vec!["geometry".to_string()];

        let result = run(ds, &plan(&options), &WktBackend);
        assert!(result.success);
        let ds = result.dataset.unwrap();
        let values = ds.column_values("geometry").unwrap();
        assert!(values[0].starts_with("POLYGON"));
        assert_eq!(values[1], "garbage");
    }

    #[test]
    fn test_column_name_step_renames_header() {
        let ds = dataset(&["Name", "Name"], &[&["a", "b"]]);
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.column_name_normalization = true;

        let result = run(ds, &plan(&options), &WktBackend);
        assert!(result.success);
        let ds = result.dataset.unwrap();
        assert_eq!(ds.columns().len(), 2);
        assert_ne!(ds.columns()[0], ds.columns()[1]);
    }

    #[test]
    fn test_row_order_preserved() {
        let ds = dataset(&["name"], &[&["c"], &["a"], &["b"]]);
        let mut options = NormalizeOptions::new(ResourceKind::Csv);
        options.case_normalization = vec!["name".to_string()];

        let result = run(ds, &plan(&options), &WktBackend);
        let ds = result.dataset.unwrap();
        assert_eq!(ds.column_values("name").unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let ds = dataset(&["name"], &[&["Unchanged"]]);
        let options = NormalizeOptions::new(ResourceKind::Csv);
        let result = run(ds.clone(), &plan(&options), &WktBackend);
        assert!(result.success);
        assert_eq!(result.dataset.unwrap(), ds);
    }
}
