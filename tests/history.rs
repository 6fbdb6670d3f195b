mod common;

use std::fs;

use chrono::NaiveDate;
use column_mapper::{
    error::MapperError,
    history::HistoryLedger,
    mapping::{Mapping, MappingStore},
    replay::check_session,
};
use common::TestWorkspace;

fn at(hour: u32, minute: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[test]
fn commits_group_into_sessions_in_timestamp_order() {
    let workspace = TestWorkspace::new();
    let ledger = HistoryLedger::new(workspace.join("log/mapping_history.csv"));
    let source = workspace.join("people.csv");
    let destination = workspace.join("template.xlsx");

    ledger
        .append_at(
            &[Mapping::new("Years", "Age")],
            &source,
            &destination,
            &workspace.join("second.xlsx"),
            at(15, 0),
        )
        .unwrap();
    ledger
        .append_at(
            &[Mapping::new("Full_Name", "Name"), Mapping::new("Location", "City")],
            &source,
            &destination,
            &workspace.join("first.xlsx"),
            at(14, 30),
        )
        .unwrap();

    let sessions = ledger.load_history().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].key().timestamp, "2024-05-06 14:30:00");
    assert_eq!(sessions[0].key().source_file, "people.csv");
    assert_eq!(sessions[0].key().output_file, "first.xlsx");
    assert_eq!(
        sessions[0].mappings(),
        &[Mapping::new("Full_Name", "Name"), Mapping::new("Location", "City")]
    );
    assert_eq!(sessions[1].count(), 1);

    let raw = fs::read_to_string(ledger.path()).unwrap();
    assert_eq!(raw.lines().count(), 4);
    assert!(raw.contains("2024-05-06 14:30:00,people.csv,template.xlsx,first.xlsx,Name,Full_Name"));
}

#[test]
fn missing_or_header_only_log_is_no_history() {
    let workspace = TestWorkspace::new();
    let ledger = HistoryLedger::new(workspace.join("mapping_history.csv"));
    assert!(matches!(ledger.load_history(), Err(MapperError::NoHistory)));
    assert!(ledger.sessions().unwrap().is_empty());

    let path = workspace.write(
        "header_only.csv",
        "Timestamp,Source_File,Destination_File,Output_File,Source_Column,Destination_Column\n",
    );
    let ledger = HistoryLedger::new(path);
    assert!(matches!(ledger.load_history(), Err(MapperError::NoHistory)));
}

#[test]
fn hand_written_log_is_read() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "mapping_history.csv",
        "Timestamp,Source_File,Destination_File,Output_File,Source_Column,Destination_Column\n\
         2024-05-06 14:30:00,s.csv,d.csv,o.xlsx,Name,Full_Name\n\
         2024-05-06 14:30:00,s.csv,d.csv,o.xlsx,Age,Years\n",
    );
    let sessions = HistoryLedger::new(path).load_history().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].describe(), "• Full_Name ← Name\n• Years ← Age");
}

#[test]
fn replay_against_other_tables_lists_what_is_missing() {
    let workspace = TestWorkspace::new();
    let ledger = HistoryLedger::new(workspace.join("mapping_history.csv"));
    ledger
        .append_at(
            &[Mapping::new("Full_Name", "Name"), Mapping::new("Years", "Age")],
            &workspace.join("s.csv"),
            &workspace.join("d.csv"),
            &workspace.join("o.xlsx"),
            at(9, 0),
        )
        .unwrap();
    let session = ledger.load_history().unwrap().remove(0);

    let source_columns = vec!["Name".to_string()];
    let destination_columns = vec!["Full_Name".to_string(), "Years".to_string()];
    let err = check_session(&session, &source_columns, &destination_columns).unwrap_err();
    match err {
        MapperError::IncompatibleSession(missing) => {
            assert!(missing.missing_source.contains("Age"));
            assert!(missing.missing_destination.is_empty());
        }
        other => panic!("unexpected error {other:?}"),
    }

    let mut store = MappingStore::new(
        vec!["Name".into(), "Age".into()],
        destination_columns.clone(),
    );
    store.set("Full_Name", "Name").unwrap();
    let batch = check_session(&session, store.source_columns(), store.destination_columns()).unwrap();
    store.replace_all(batch).unwrap();
    assert_eq!(store.get("Years"), Some("Age"));
    assert_eq!(store.len(), 2);
}
