//! Pipeline configuration.
//!
//! A [`PipelineConfig`] collects every choice the analysis makes: whether
//! subjects are repeated, what to do with extreme outliers, which error term
//! the post-hoc contrasts use, and how the input columns are named. It can be
//! built in code with the `with_*` methods or loaded from JSON; any field
//! missing from the JSON falls back to its default.
//!
//! ```json
//! {
//!   "repeated_measures": true,
//!   "outlier_policy": "ExcludeExtreme",
//!   "schema": { "subject": "participant", "time_levels": ["0", "30", "60", "90"] }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use twoway_core::anova::AnovaOptions;
use twoway_core::constants::{DEFAULT_ALPHA, DEFAULT_CONFIDENCE_LEVEL};
use twoway_core::{ErrorTermSource, PostHocOptions, SphericityCorrection};

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for this schema.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field is outside its valid range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What to do with outliers before the ANOVA stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutlierPolicy {
    /// Flag outliers in the report but keep every observation.
    #[default]
    Retain,
    /// Remove extreme outliers (beyond 3·IQR) before fitting.
    ExcludeExtreme,
}

impl std::fmt::Display for OutlierPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutlierPolicy::Retain => write!(f, "retain"),
            OutlierPolicy::ExcludeExtreme => write!(f, "exclude extreme"),
        }
    }
}

/// Column names of the long-format input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    /// Subject identifier column.
    pub subject: String,
    /// Condition label column.
    pub condition: String,
    /// Time label column.
    pub time: String,
    /// Outcome column.
    pub value: String,
    /// Declared condition levels, in order.
    ///
    /// When set, any other label in the data is an error. When absent,
    /// levels are taken in order of first appearance.
    pub condition_levels: Option<Vec<String>>,
    /// Declared time levels, in order.
    ///
    /// When absent, labels are taken in order of first appearance, unless
    /// every label is numeric, in which case they are sorted by value.
    pub time_levels: Option<Vec<String>>,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            subject: "id".to_string(),
            condition: "condition".to_string(),
            time: "time".to_string(),
            value: "value".to_string(),
            condition_levels: None,
            time_levels: None,
        }
    }
}

impl ColumnSchema {
    /// Set the subject column name.
    pub fn with_subject(mut self, column: impl Into<String>) -> Self {
        self.subject = column.into();
        self
    }

    /// Set the condition column name.
    pub fn with_condition(mut self, column: impl Into<String>) -> Self {
        self.condition = column.into();
        self
    }

    /// Set the time column name.
    pub fn with_time(mut self, column: impl Into<String>) -> Self {
        self.time = column.into();
        self
    }

    /// Set the outcome column name.
    pub fn with_value(mut self, column: impl Into<String>) -> Self {
        self.value = column.into();
        self
    }

    /// Declare the condition levels and their order.
    pub fn with_condition_levels<S: Into<String>>(
        mut self,
        levels: impl IntoIterator<Item = S>,
    ) -> Self {
        self.condition_levels = Some(levels.into_iter().map(Into::into).collect());
        self
    }

    /// Declare the time levels and their order.
    pub fn with_time_levels<S: Into<String>>(mut self, levels: impl IntoIterator<Item = S>) -> Self {
        self.time_levels = Some(levels.into_iter().map(Into::into).collect());
        self
    }

    /// The four required column names.
    pub fn columns(&self) -> [&str; 4] {
        [&self.subject, &self.condition, &self.time, &self.value]
    }
}

/// Configuration of a full analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stratify the ANOVA by subject.
    ///
    /// Default: false
    pub repeated_measures: bool,

    /// Outlier handling before the ANOVA.
    ///
    /// Default: [`OutlierPolicy::Retain`]
    pub outlier_policy: OutlierPolicy,

    /// Error term for the post-hoc contrasts.
    ///
    /// Default: [`ErrorTermSource::FullModelResidual`]
    pub error_term: ErrorTermSource,

    /// Sphericity correction policy in repeated-measures mode.
    ///
    /// Default: [`SphericityCorrection::Auto`]
    pub sphericity: SphericityCorrection,

    /// Significance threshold for annotations.
    ///
    /// Default: 0.05
    pub alpha: f64,

    /// Confidence level for post-hoc intervals.
    ///
    /// Default: 0.95
    pub confidence_level: f64,

    /// Input column names and level catalogues.
    pub schema: ColumnSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repeated_measures: false,
            outlier_policy: OutlierPolicy::default(),
            error_term: ErrorTermSource::default(),
            sphericity: SphericityCorrection::default(),
            alpha: DEFAULT_ALPHA,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            schema: ColumnSchema::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed input and `Invalid` if a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Enable or disable repeated-measures mode.
    pub fn with_repeated_measures(mut self, repeated_measures: bool) -> Self {
        self.repeated_measures = repeated_measures;
        self
    }

    /// Set the outlier policy.
    pub fn with_outlier_policy(mut self, policy: OutlierPolicy) -> Self {
        self.outlier_policy = policy;
        self
    }

    /// Set the post-hoc error term.
    pub fn with_error_term(mut self, error_term: ErrorTermSource) -> Self {
        self.error_term = error_term;
        self
    }

    /// Set the sphericity correction policy.
    pub fn with_sphericity(mut self, sphericity: SphericityCorrection) -> Self {
        self.sphericity = sphericity;
        self
    }

    /// Set the significance threshold.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the post-hoc confidence level.
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Set the input column schema.
    pub fn with_schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if alpha or the confidence level is outside (0, 1),
    /// or if two schema columns share a name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        let columns = self.schema.columns();
        for (i, a) in columns.iter().enumerate() {
            if columns[i + 1..].contains(a) {
                return Err(ConfigError::Invalid(format!(
                    "column '{}' is used for more than one role",
                    a
                )));
            }
        }
        Ok(())
    }

    /// Options for the ANOVA stage.
    pub fn anova_options(&self) -> AnovaOptions {
        AnovaOptions::default()
            .with_repeated_measures(self.repeated_measures)
            .with_sphericity(self.sphericity)
            .with_alpha(self.alpha)
    }

    /// Options for the post-hoc stage.
    pub fn posthoc_options(&self) -> PostHocOptions {
        PostHocOptions::default()
            .with_error_term(self.error_term)
            .with_confidence_level(self.confidence_level)
            .with_alpha(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(!config.repeated_measures);
        assert_eq!(config.outlier_policy, OutlierPolicy::Retain);
        assert_eq!(config.error_term, ErrorTermSource::FullModelResidual);
        assert_eq!(config.sphericity, SphericityCorrection::Auto);
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.schema.columns(), ["id", "condition", "time", "value"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{"repeated_measures": true, "schema": {"subject": "participant"}}"#,
        )
        .unwrap();
        assert!(config.repeated_measures);
        assert_eq!(config.schema.subject, "participant");
        assert_eq!(config.schema.value, "value");
        assert_eq!(config.confidence_level, 0.95);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::new()
            .with_outlier_policy(OutlierPolicy::ExcludeExtreme)
            .with_error_term(ErrorTermSource::Stratified)
            .with_schema(ColumnSchema::default().with_time_levels(["0", "30"]));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            PipelineConfig::new().with_alpha(0.0).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::new().with_confidence_level(1.0).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::new()
                .with_schema(ColumnSchema::default().with_time("value"))
                .validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json_str("{\"alpha\": \"high\"}"),
            Err(ConfigError::Json(_))
        ));
    }
}
