//! Request options for one normalization job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transforms::{DEFAULT_DATE_TARGET_FORMAT, DEFAULT_TARGET_LANG};

/// Error type for invalid request options.
///
/// Options are validated at the boundary, before any ticket or file side
/// effect happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Unsupported resource type: {0} (supported: csv, shapefile)")]
    UnsupportedResourceKind(String),

    #[error("Unsupported response type: {0} (supported: prompt, deferred)")]
    UnsupportedResponseMode(String),

    #[error("Transliteration was requested without specifying the source language(s)")]
    MissingTransliterationLanguages,

    #[error("Unsupported column name policy version: {0} (supported: 1-3)")]
    UnsupportedPolicyVersion(u8),
}

/// Kind of uploaded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Csv,
    Shapefile,
}

impl ResourceKind {
    pub fn parse(value: &str) -> Result<Self, OptionsError> {
        match value {
            "csv" => Ok(Self::Csv),
            "shp" | "shapefile" => Ok(Self::Shapefile),
            other => Err(OptionsError::UnsupportedResourceKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Shapefile => "shapefile",
        }
    }
}

/// Synchronous or asynchronous response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    #[default]
    Prompt,
    Deferred,
}

impl ResponseMode {
    pub fn parse(value: &str) -> Result<Self, OptionsError> {
        match value {
            "prompt" => Ok(Self::Prompt),
            "deferred" => Ok(Self::Deferred),
            other => Err(OptionsError::UnsupportedResponseMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Deferred => "deferred",
        }
    }
}

/// Per-job normalization options: which transforms run, over which
/// columns, with which parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub resource_kind: ResourceKind,
    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default)]
    pub date_normalization: Vec<String>,
    #[serde(default)]
    pub date_target_format: Option<String>,

    #[serde(default)]
    pub phone_normalization: Vec<String>,
    #[serde(default)]
    pub phone_exit_code: Option<String>,

    #[serde(default)]
    pub special_character_normalization: Vec<String>,
    #[serde(default)]
    pub alphabetical_normalization: Vec<String>,
    #[serde(default)]
    pub case_normalization: Vec<String>,

    #[serde(default)]
    pub transliteration: Vec<String>,
    #[serde(default)]
    pub transliteration_langs: Vec<String>,
    #[serde(default)]
    pub transliteration_lang: Option<String>,

    #[serde(default)]
    pub value_cleaning: Vec<String>,
    #[serde(default)]
    pub wkt_normalization: Vec<String>,

    #[serde(default)]
    pub column_name_normalization: bool,
    #[serde(default = "default_policy_version")]
    pub column_policy_version: u8,

    #[serde(default)]
    pub csv_delimiter: Option<char>,
    #[serde(default)]
    pub crs: Option<String>,
}

fn default_policy_version() -> u8 {
    2
}

impl NormalizeOptions {
    pub fn new(resource_kind: ResourceKind) -> Self {
        Self {
            resource_kind,
            response_mode: ResponseMode::default(),
            date_normalization: Vec::new(),
            date_target_format: None,
            phone_normalization: Vec::new(),
            phone_exit_code: None,
            special_character_normalization: Vec::new(),
            alphabetical_normalization: Vec::new(),
            case_normalization: Vec::new(),
            transliteration: Vec::new(),
            transliteration_langs: Vec::new(),
            transliteration_lang: None,
            value_cleaning: Vec::new(),
            wkt_normalization: Vec::new(),
            column_name_normalization: false,
            column_policy_version: default_policy_version(),
            csv_delimiter: None,
            crs: None,
        }
    }

    /// Checks the cross-field invariants.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !self.transliteration.is_empty() && self.resolved_transliteration_langs().is_empty() {
            return Err(OptionsError::MissingTransliterationLanguages);
        }
        if self.column_name_normalization && !(1..=3).contains(&self.column_policy_version) {
            return Err(OptionsError::UnsupportedPolicyVersion(
                self.column_policy_version,
            ));
        }
        Ok(())
    }

    /// Source languages for transliteration: the explicit list followed
    /// by the fallback language, when one is set.
    pub fn resolved_transliteration_langs(&self) -> Vec<String> {
        let mut langs = self.transliteration_langs.clone();
        if let Some(lang) = &self.transliteration_lang {
            if !lang.is_empty() {
                langs.push(lang.clone());
            }
        }
        langs
    }

    pub fn date_target_format(&self) -> &str {
        self.date_target_format
            .as_deref()
            .unwrap_or(DEFAULT_DATE_TARGET_FORMAT)
    }

    pub fn transliteration_fallback_target(&self) -> &str {
        DEFAULT_TARGET_LANG
    }
}
