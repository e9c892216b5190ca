//! The execution plan: a fixed, explicit, ordered list of
//! (operation, column-set) pairs.
//!
//! The order is part of the contract and does not follow the request:
//! date → phone → special characters → alphabetical → case →
//! transliteration → value cleaning → WKT geometry → column names.

use super::options::{NormalizeOptions, OptionsError};

/// One normalization operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Date {
        target_format: String,
    },
    Phone {
        exit_code: Option<String>,
    },
    SpecialCharacters,
    Alphabetical,
    Case,
    Transliteration {
        langs: Vec<String>,
        fallback_target: String,
    },
    ValueCleaning,
    WktGeometry,
    ColumnNames {
        version: u8,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Date { .. } => "date_normalization",
            Operation::Phone { .. } => "phone_normalization",
            Operation::SpecialCharacters => "special_character_normalization",
            Operation::Alphabetical => "alphabetical_normalization",
            Operation::Case => "case_normalization",
            Operation::Transliteration { .. } => "transliteration",
            Operation::ValueCleaning => "value_cleaning",
            Operation::WktGeometry => "wkt_normalization",
            Operation::ColumnNames { .. } => "column_name_normalization",
        }
    }
}

/// One plan entry: an operation and the columns it applies to.
///
/// `columns` is empty only for [`Operation::ColumnNames`], which always
/// covers the whole header.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub operation: Operation,
    pub columns: Vec<String>,
}

/// The ordered list of enabled steps for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// Builds the plan from validated options. Options validation is
    /// re-run here so a plan can never exist for an invalid request.
    pub fn from_options(options: &NormalizeOptions) -> Result<Self, OptionsError> {
        options.validate()?;

        let mut steps = Vec::new();

        if !options.date_normalization.is_empty() {
            steps.push(Step {
                operation: Operation::Date {
                    target_format: options.date_target_format().to_string(),
                },
                columns: options.date_normalization.clone(),
            });
        }
        if !options.phone_normalization.is_empty() {
            steps.push(Step {
                operation: Operation::Phone {
                    exit_code: options.phone_exit_code.clone(),
                },
                columns: options.phone_normalization.clone(),
            });
        }
        if !options.special_character_normalization.is_empty() {
            steps.push(Step {
                operation: Operation::SpecialCharacters,
                columns: options.special_character_normalization.clone(),
            });
        }
        if !options.alphabetical_normalization.is_empty() {
            steps.push(Step {
                operation: Operation::Alphabetical,
                columns: options.alphabetical_normalization.clone(),
            });
        }
        if !options.case_normalization.is_empty() {
            steps.push(Step {
                operation: Operation::Case,
                columns: options.case_normalization.clone(),
            });
        }
        if !options.transliteration.is_empty() {
            steps.push(Step {
                operation: Operation::Transliteration {
                    langs: options.resolved_transliteration_langs(),
                    fallback_target: options.transliteration_fallback_target().to_string(),
                },
                columns: options.transliteration.clone(),
            });
        }
        if !options.value_cleaning.is_empty() {
            steps.push(Step {
                operation: Operation::ValueCleaning,
                columns: options.value_cleaning.clone(),
            });
        }
        if !options.wkt_normalization.is_empty() {
            steps.push(Step {
                operation: Operation::WktGeometry,
                columns: options.wkt_normalization.clone(),
            });
        }
        if options.column_name_normalization {
            steps.push(Step {
                operation: Operation::ColumnNames {
                    version: options.column_policy_version,
                },
                columns: Vec::new(),
            });
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
