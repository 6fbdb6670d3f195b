//! Compatibility check for replaying a historical session.
//!
//! [`check_session`] is pure: it inspects a session against the column lists
//! of the currently loaded tables and either rejects it with every missing
//! column from both sides, or returns a [`ValidatedBatch`] ready for
//! [`MappingStore::replace_all`](crate::mapping::MappingStore::replace_all).

use crate::{
    error::{IncompatibleSession, MapperError, MapperResult},
    history::Session,
    mapping::Mapping,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch(Vec<Mapping>);

impl ValidatedBatch {
    pub fn mappings(&self) -> &[Mapping] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for ValidatedBatch {
    type Item = Mapping;
    type IntoIter = std::vec::IntoIter<Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub fn check_session(
    session: &Session,
    source_columns: &[String],
    destination_columns: &[String],
) -> MapperResult<ValidatedBatch> {
    let missing = missing_columns(session.mappings(), source_columns, destination_columns);
    if missing.is_empty() {
        Ok(ValidatedBatch(session.mappings().to_vec()))
    } else {
        Err(MapperError::IncompatibleSession(missing))
    }
}

/// Every referenced column absent from the given lists, deduplicated per side.
pub fn missing_columns(
    mappings: &[Mapping],
    source_columns: &[String],
    destination_columns: &[String],
) -> IncompatibleSession {
    let mut missing = IncompatibleSession::default();
    for mapping in mappings {
        if !source_columns.contains(&mapping.source) {
            missing.missing_source.insert(mapping.source.clone());
        }
        if !destination_columns.contains(&mapping.destination) {
            missing
                .missing_destination
                .insert(mapping.destination.clone());
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SessionKey;

    fn session(pairs: &[(&str, &str)]) -> Session {
        Session::new(
            SessionKey {
                timestamp: "2024-05-06 14:30:00".into(),
                source_file: "source.csv".into(),
                destination_file: "destination.csv".into(),
                output_file: "out.xlsx".into(),
            },
            pairs.iter().map(|(d, s)| Mapping::new(*d, *s)).collect(),
        )
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn compatible_session_yields_batch_in_log_order() {
        let session = session(&[("Years", "Age"), ("Full_Name", "Name")]);
        let batch = check_session(
            &session,
            &names(&["Name", "Age"]),
            &names(&["Full_Name", "Years"]),
        )
        .unwrap();
        assert_eq!(
            batch.mappings(),
            &[Mapping::new("Years", "Age"), Mapping::new("Full_Name", "Name")]
        );
    }

    #[test]
    fn rejection_lists_all_missing_columns_on_both_sides() {
        let session = session(&[
            ("Full_Name", "Name"),
            ("Years", "Age"),
            ("Zip", "Postcode"),
            ("Zip2", "Postcode"),
        ]);
        let err = check_session(&session, &names(&["Name"]), &names(&["Full_Name", "Years"]))
            .unwrap_err();
        let MapperError::IncompatibleSession(missing) = err else {
            panic!("expected incompatible session");
        };
        assert_eq!(
            missing.missing_source.into_iter().collect::<Vec<_>>(),
            vec!["Age", "Postcode"]
        );
        assert_eq!(
            missing.missing_destination.into_iter().collect::<Vec<_>>(),
            vec!["Zip", "Zip2"]
        );
    }

    #[test]
    fn column_matching_is_case_sensitive() {
        let session = session(&[("years", "age")]);
        assert!(check_session(&session, &names(&["Age"]), &names(&["Years"])).is_err());
    }
}
