//! CSV ingestion through the public API.

use twoway::{read_long_csv, ColumnSchema, DataError, SchemaError};

use crate::common::{diverging, to_csv};

#[test]
fn long_table_round_trips() {
    let ds = diverging(5.0, false);
    let loaded = read_long_csv(to_csv(&ds).as_bytes(), &ColumnSchema::default()).unwrap();

    assert_eq!(loaded.observations(), ds.observations());
    assert_eq!(loaded.conditions().levels(), ds.conditions().levels());
    assert_eq!(loaded.times().levels(), ds.times().levels());
}

#[test]
fn declared_time_order_wins() {
    let ds = diverging(5.0, false);
    let schema = ColumnSchema::default().with_time_levels(["90", "60", "30", "0"]);
    let loaded = read_long_csv(to_csv(&ds).as_bytes(), &schema).unwrap();

    assert_eq!(loaded.times().levels(), ["90", "60", "30", "0"]);
    assert_eq!(loaded.group(0, 0).values(), ds.group(0, 3).values());
}

#[test]
fn numeric_times_sorted_by_value() {
    let csv = "id,condition,time,value\n\
               a,x,120,1\na,x,15,2\na,x,60,3\nb,y,120,4\nb,y,15,5\nb,y,60,6\n";
    let ds = read_long_csv(csv.as_bytes(), &ColumnSchema::default()).unwrap();
    assert_eq!(ds.times().levels(), ["15", "60", "120"]);
}

#[test]
fn schema_errors_are_fatal() {
    let cases = [
        ("id,condition,time\na,x,0\n", "missing required column 'value'"),
        ("id,condition,time,value\na,x,0,\n", "non-numeric value '' in column 'value' at row 1"),
        ("id,condition,time,value\na,x,0,1\na,x,1,2\n", "factor 'condition' needs at least 2 levels"),
        (
            "id,condition,time,value\na,x,0,1\na,x,0,2\nb,y,0,3\na,x,1,1\nb,y,1,1\n",
            "subject 'a' has more than one observation at (x, 0)",
        ),
    ];
    for (csv, message) in cases {
        let err = read_long_csv(csv.as_bytes(), &ColumnSchema::default()).unwrap_err();
        assert!(matches!(err, DataError::Schema(_)), "{:?}", err);
        assert!(err.to_string().contains(message), "{} vs {}", err, message);
    }
}

#[test]
fn ragged_rows_are_csv_errors() {
    let csv = "id,condition,time,value\na,x,0,1,extra\n";
    let err = read_long_csv(csv.as_bytes(), &ColumnSchema::default()).unwrap_err();
    assert!(matches!(err, DataError::Csv(_)));
}

#[test]
fn non_finite_outcomes_rejected() {
    let csv = "id,condition,time,value\na,x,0,NaN\nb,y,0,1\na,x,1,1\nb,y,1,1\n";
    let err = read_long_csv(csv.as_bytes(), &ColumnSchema::default()).unwrap_err();
    assert!(matches!(err, DataError::Schema(SchemaError::NonFiniteValue { index: 0 })));
}
