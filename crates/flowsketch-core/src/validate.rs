//! Structural completeness checks for an extracted [`DiagramModel`].
//!
//! A model is structurally valid when all five top-level sections were present
//! in the source, at least one process was found and at least one data flow was
//! found. Empty data stores or external entities are permitted.
//!
//! Validation is advisory: a failed check is reported, never raised, and the
//! caller decides whether to proceed.

use std::fmt;

use log::debug;

use crate::model::{DiagramModel, Section};

/// A single failed structural check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureIssue {
    /// The section's key was absent from the source record.
    MissingSection(Section),
    /// The model contains no processes.
    NoProcesses,
    /// The model contains no data flows.
    NoDataFlows,
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureIssue::MissingSection(section) => {
                write!(f, "missing top-level key `{section}`")
            }
            StructureIssue::NoProcesses => write!(f, "no processes were extracted"),
            StructureIssue::NoDataFlows => write!(f, "no data flows were extracted"),
        }
    }
}

/// Lists every failed structural check, missing sections first.
pub fn structure_issues(model: &DiagramModel) -> Vec<StructureIssue> {
    let mut issues: Vec<_> = model
        .present_sections()
        .missing()
        .map(StructureIssue::MissingSection)
        .collect();

    if model.processes().is_empty() {
        issues.push(StructureIssue::NoProcesses);
    }
    if model.data_flows().is_empty() {
        issues.push(StructureIssue::NoDataFlows);
    }

    issues
}

/// Returns `true` iff the model passes every structural check.
pub fn validate_structure(model: &DiagramModel) -> bool {
    let issues = structure_issues(model);
    debug!(issue_count = issues.len(); "Validated model structure");
    issues.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataFlow, Element};

    fn minimal_model() -> DiagramModel {
        DiagramModel::new()
            .with_process(Element::new("P1", "処理1"))
            .with_data_flow(DataFlow::new("F1", "E1", "P1", "入力"))
    }

    #[test]
    fn test_minimal_model_is_valid() {
        assert!(validate_structure(&minimal_model()));
        assert!(structure_issues(&minimal_model()).is_empty());
    }

    #[test]
    fn test_empty_stores_and_entities_are_permitted() {
        let model = minimal_model();
        assert!(model.data_stores().is_empty());
        assert!(model.external_entities().is_empty());
        assert!(validate_structure(&model));
    }

    #[test]
    fn test_no_processes_is_invalid() {
        let model = DiagramModel::new().with_data_flow(DataFlow::new("F1", "E1", "P1", "x"));
        assert!(!validate_structure(&model));
        assert_eq!(structure_issues(&model), vec![StructureIssue::NoProcesses]);
    }

    #[test]
    fn test_no_data_flows_is_invalid() {
        let model = DiagramModel::new().with_process(Element::new("P1", "処理1"));
        assert!(!validate_structure(&model));
        assert_eq!(structure_issues(&model), vec![StructureIssue::NoDataFlows]);
    }

    #[test]
    fn test_missing_key_is_invalid() {
        let json = r#"{
            "processes": [{"id": "P1"}],
            "data_stores": [],
            "external_entities": [],
            "data_flows": [{"from": "P1", "to": "P1"}]
        }"#;
        let model: DiagramModel = serde_json::from_str(json).unwrap();

        assert!(!validate_structure(&model));
        assert_eq!(
            structure_issues(&model),
            vec![StructureIssue::MissingSection(Section::Overview)]
        );
    }

    #[test]
    fn test_all_issues_reported_together() {
        let model: DiagramModel = serde_json::from_str("{}").unwrap();
        let issues = structure_issues(&model);

        assert_eq!(issues.len(), 7);
        assert_eq!(issues[5], StructureIssue::NoProcesses);
        assert_eq!(issues[6], StructureIssue::NoDataFlows);
    }

    #[test]
    fn test_issue_display() {
        let issue = StructureIssue::MissingSection(Section::DataFlows);
        assert_eq!(issue.to_string(), "missing top-level key `data_flows`");
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use serde_json::{Map, Value, json};

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A JSON record where each top-level key is independently kept or dropped.
    fn record_strategy() -> impl Strategy<Value = Value> {
        (
            prop::option::of(0usize..4),
            prop::option::of(0usize..3),
            prop::option::of(0usize..3),
            prop::option::of(0usize..4),
            prop::option::of("[a-z ]{0,16}"),
        )
            .prop_map(|(processes, stores, entities, flows, overview)| {
                let mut record = Map::new();
                let elements = |count: usize, prefix: &str| -> Value {
                    (1..=count)
                        .map(|i| json!({"id": format!("{prefix}{i}"), "name": format!("{prefix}{i}")}))
                        .collect()
                };
                if let Some(count) = processes {
                    record.insert("processes".into(), elements(count, "P"));
                }
                if let Some(count) = stores {
                    record.insert("data_stores".into(), elements(count, "D"));
                }
                if let Some(count) = entities {
                    record.insert("external_entities".into(), elements(count, "E"));
                }
                if let Some(count) = flows {
                    let flows: Value = (1..=count)
                        .map(|i| json!({"id": format!("F{i}"), "from": "E1", "to": "P1", "data": "x"}))
                        .collect();
                    record.insert("data_flows".into(), flows);
                }
                if let Some(overview) = overview {
                    record.insert("system_overview".into(), Value::String(overview));
                }
                Value::Object(record)
            })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every absent key yields exactly one missing-section issue.
    fn check_missing_keys_are_reported(record: &Value) -> Result<(), TestCaseError> {
        let model: DiagramModel = serde_json::from_value(record.clone())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let issues = structure_issues(&model);

        let missing = issues
            .iter()
            .filter(|issue| matches!(issue, StructureIssue::MissingSection(_)))
            .count();
        let absent = Section::ALL
            .iter()
            .filter(|section| record.get(section.key()).is_none())
            .count();
        prop_assert_eq!(missing, absent);
        Ok(())
    }

    /// The model is valid iff no issue was found.
    fn check_validity_matches_issues(record: &Value) -> Result<(), TestCaseError> {
        let model: DiagramModel = serde_json::from_value(record.clone())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(
            validate_structure(&model),
            structure_issues(&model).is_empty()
        );
        prop_assert_eq!(
            structure_issues(&model).contains(&StructureIssue::NoProcesses),
            model.processes().is_empty()
        );
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn missing_keys_are_reported(record in record_strategy()) {
            check_missing_keys_are_reported(&record)?;
        }

        #[test]
        fn validity_matches_issues(record in record_strategy()) {
            check_validity_matches_issues(&record)?;
        }
    }
}
