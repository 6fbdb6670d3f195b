mod common;

use column_mapper::{
    data::Value,
    frame::Table,
    loader::{LoadOptions, load_table},
    profile::{ALL_EMPTY, NO_DATA, sample_column},
};
use common::TestWorkspace;
use proptest::prelude::*;

#[test]
fn samples_loaded_csv_columns() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "people.csv",
        "Name,Age,Notes,Comment\n\
         John,25,,A remarkably long comment that keeps going\n\
         Jane,25,,short\n\
         Bob,35,,short\n\
         Ann,40,,x\n",
    );
    let table = load_table(&path, &LoadOptions::default()).unwrap();

    assert_eq!(sample_column(&table, "Name", 3), "John, Jane, Bob...");
    assert_eq!(sample_column(&table, "Age", 3), "25, 35, 40");
    assert_eq!(sample_column(&table, "Notes", 3), ALL_EMPTY);
    assert_eq!(sample_column(&table, "Missing", 3), NO_DATA);
    assert_eq!(
        sample_column(&table, "Comment", 1),
        "A remarkably long co......"
    );
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

proptest! {
    #[test]
    fn never_lists_more_than_requested(
        words in proptest::collection::vec(proptest::option::of(word()), 0..40),
        max in 1usize..6,
    ) {
        let table = Table::from_rows(
            vec!["col".to_string()],
            words.iter().cloned().map(|w| vec![w.map(Value::from)]),
        );
        let sample = sample_column(&table, "col", max);

        let mut distinct = Vec::new();
        for word in words.iter().flatten() {
            if !distinct.contains(word) {
                distinct.push(word.clone());
            }
        }

        if distinct.is_empty() {
            prop_assert_eq!(sample, ALL_EMPTY);
        } else {
            let shown = distinct.iter().take(max).cloned().collect::<Vec<_>>().join(", ");
            if distinct.len() > max {
                prop_assert_eq!(sample, format!("{shown}..."));
            } else {
                prop_assert_eq!(sample, shown);
            }
        }
    }
}
