//! Loading and validating pipeline configuration.

use std::io::Write;

use twoway::{ColumnSchema, ConfigError, Error, OutlierPolicy, PipelineConfig};

use crate::common::{diverging, to_csv};

#[test]
fn config_file_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "repeated_measures": true,
            "outlier_policy": "ExcludeExtreme",
            "error_term": "Stratified",
            "sphericity": "GreenhouseGeisser",
            "alpha": 0.01,
            "schema": {{ "subject": "participant", "time_levels": ["0", "30", "60", "90"] }}
        }}"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();
    assert!(config.repeated_measures);
    assert_eq!(config.outlier_policy, OutlierPolicy::ExcludeExtreme);
    assert_eq!(config.alpha, 0.01);
    assert_eq!(config.confidence_level, 0.95);
    assert_eq!(config.schema.subject, "participant");
    assert_eq!(config.schema.condition, "condition");
    assert_eq!(config.schema.time_levels.as_ref().map(Vec::len), Some(4));
}

#[test]
fn out_of_range_config_is_rejected() {
    let err = PipelineConfig::from_json_str(r#"{"confidence_level": 95}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("confidence_level"));

    let err = PipelineConfig::from_json_file("/nonexistent/config.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn invalid_config_stops_run_before_analysis() {
    let config = PipelineConfig::new().with_alpha(2.0);
    let err = twoway::run(&diverging(5.0, false), &config).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
}

#[test]
fn schema_renames_columns() {
    let csv = to_csv(&diverging(5.0, false)).replacen("id,condition,time,value", "pid,arm,minute,glucose", 1);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", csv).unwrap();
    file.flush().unwrap();

    let schema = ColumnSchema::default()
        .with_subject("pid")
        .with_condition("arm")
        .with_time("minute")
        .with_value("glucose");
    let config = PipelineConfig::new().with_schema(schema);
    let report = twoway::analyze_file(file.path(), &config).unwrap();
    assert_eq!(report.n_analysed(), 40);

    // The default schema cannot find its columns
    let err = twoway::analyze_file(file.path(), &PipelineConfig::default()).unwrap_err();
    assert!(err.to_string().contains("missing required column 'id'"));
}
