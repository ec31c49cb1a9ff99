//! The structured record of a data-flow diagram.
//!
//! A [`DiagramModel`] holds the processes, data stores, external entities and
//! data flows read from a diagram, plus a free-text overview. Every field of an
//! [`Element`] or [`DataFlow`] record is optional: language models routinely
//! omit fields, and consumers substitute positional defaults through
//! [`ElementKind::default_name`] and [`ElementKind::default_id`].
//!
//! # Wire format
//!
//! ```json
//! {
//!   "processes": [{"id": "P1", "name": "受付", "description": "注文を受け付ける"}],
//!   "data_stores": [{"id": "D1", "name": "注文DB", "description": ""}],
//!   "external_entities": [{"id": "E1", "name": "顧客", "description": ""}],
//!   "data_flows": [{"id": "F1", "from": "E1", "to": "P1", "data": "注文"}],
//!   "system_overview": "注文処理システム"
//! }
//! ```
//!
//! The model remembers which of the five top-level keys appeared in the JSON
//! it was read from; see [`DiagramModel::has_section`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lenient;

/// One of the five top-level sections of a [`DiagramModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Processes,
    DataStores,
    ExternalEntities,
    DataFlows,
    Overview,
}

impl Section {
    /// All sections in wire order.
    pub const ALL: [Section; 5] = [
        Section::Processes,
        Section::DataStores,
        Section::ExternalEntities,
        Section::DataFlows,
        Section::Overview,
    ];

    /// Returns the JSON key of this section.
    pub fn key(self) -> &'static str {
        match self {
            Section::Processes => "processes",
            Section::DataStores => "data_stores",
            Section::ExternalEntities => "external_entities",
            Section::DataFlows => "data_flows",
            Section::Overview => "system_overview",
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The set of sections whose keys were present in the source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentSections(u8);

impl PresentSections {
    /// A set containing every section.
    pub fn all() -> Self {
        Section::ALL
            .iter()
            .fold(Self::default(), |set, section| set.with(*section))
    }

    /// Returns a copy of this set with `section` added.
    pub fn with(self, section: Section) -> Self {
        Self(self.0 | section.bit())
    }

    /// Returns `true` if `section` is in the set.
    pub fn contains(self, section: Section) -> bool {
        self.0 & section.bit() != 0
    }

    /// Iterates over the sections that are not in the set, in wire order.
    pub fn missing(self) -> impl Iterator<Item = Section> {
        Section::ALL
            .into_iter()
            .filter(move |section| !self.contains(*section))
    }
}

/// The class of a diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Process,
    DataStore,
    ExternalEntity,
}

impl ElementKind {
    /// Returns the id prefix used in the extraction schema (`P`, `D`, `E`).
    pub fn id_prefix(self) -> &'static str {
        match self {
            ElementKind::Process => "P",
            ElementKind::DataStore => "D",
            ElementKind::ExternalEntity => "E",
        }
    }

    /// Returns the positional default name for the element at `index`.
    ///
    /// Defaults are 1-based: `Process_1`, `DataStore_1`, `Entity_1`.
    pub fn default_name(self, index: usize) -> String {
        let stem = match self {
            ElementKind::Process => "Process",
            ElementKind::DataStore => "DataStore",
            ElementKind::ExternalEntity => "Entity",
        };
        format!("{stem}_{}", index + 1)
    }

    /// Returns the positional default id for the element at `index` (`P1`, `D1`, `E1`).
    pub fn default_id(self, index: usize) -> String {
        format!("{}{}", self.id_prefix(), index + 1)
    }
}

/// A process, data store or external entity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    name: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    description: Option<String>,
}

impl Element {
    /// Creates an element with an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            description: None,
        }
    }

    /// Sets the description (builder style).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A directed data flow between two element ids.
///
/// `from` and `to` are not checked against the declared elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFlow {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    from: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    to: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    data: Option<String>,
}

impl DataFlow {
    /// Creates a flow carrying `data` from one element id to another.
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            data: Some(data.into()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// The structured description of a data-flow diagram.
///
/// Models read from JSON track which top-level keys were present; models built
/// in code through [`DiagramModel::new`] count every section as present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDiagramModel")]
pub struct DiagramModel {
    processes: Vec<Element>,
    data_stores: Vec<Element>,
    external_entities: Vec<Element>,
    data_flows: Vec<DataFlow>,
    #[serde(rename = "system_overview", skip_serializing_if = "Option::is_none")]
    overview: Option<String>,
    #[serde(skip)]
    present: PresentSections,
}

impl DiagramModel {
    /// Creates an empty model with every section marked present.
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            data_stores: Vec::new(),
            external_entities: Vec::new(),
            data_flows: Vec::new(),
            overview: None,
            present: PresentSections::all(),
        }
    }

    /// Appends a process (builder style).
    pub fn with_process(mut self, process: Element) -> Self {
        self.processes.push(process);
        self
    }

    /// Appends a data store (builder style).
    pub fn with_data_store(mut self, store: Element) -> Self {
        self.data_stores.push(store);
        self
    }

    /// Appends an external entity (builder style).
    pub fn with_external_entity(mut self, entity: Element) -> Self {
        self.external_entities.push(entity);
        self
    }

    /// Appends a data flow (builder style).
    pub fn with_data_flow(mut self, flow: DataFlow) -> Self {
        self.data_flows.push(flow);
        self
    }

    /// Sets the overview text (builder style).
    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    pub fn processes(&self) -> &[Element] {
        &self.processes
    }

    pub fn data_stores(&self) -> &[Element] {
        &self.data_stores
    }

    pub fn external_entities(&self) -> &[Element] {
        &self.external_entities
    }

    /// Returns the elements of the given kind, in input order.
    pub fn elements(&self, kind: ElementKind) -> &[Element] {
        match kind {
            ElementKind::Process => &self.processes,
            ElementKind::DataStore => &self.data_stores,
            ElementKind::ExternalEntity => &self.external_entities,
        }
    }

    pub fn data_flows(&self) -> &[DataFlow] {
        &self.data_flows
    }

    pub fn overview(&self) -> Option<&str> {
        self.overview.as_deref()
    }

    /// Total number of processes, data stores and external entities.
    pub fn element_count(&self) -> usize {
        self.processes.len() + self.data_stores.len() + self.external_entities.len()
    }

    /// Returns the set of top-level sections that were present in the source.
    pub fn present_sections(&self) -> PresentSections {
        self.present
    }

    /// Returns `true` if the section's key was present in the source.
    pub fn has_section(&self, section: Section) -> bool {
        self.present.contains(section)
    }
}

impl Default for DiagramModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialization shape recording key presence.
///
/// The outer `Option` is `Some` whenever the key appears; the inner one is
/// `None` for an explicit `null`.
#[derive(Deserialize)]
struct RawDiagramModel {
    #[serde(default, deserialize_with = "lenient::present")]
    processes: Option<Option<Vec<Element>>>,

    #[serde(default, deserialize_with = "lenient::present")]
    data_stores: Option<Option<Vec<Element>>>,

    #[serde(default, deserialize_with = "lenient::present")]
    external_entities: Option<Option<Vec<Element>>>,

    #[serde(default, deserialize_with = "lenient::present")]
    data_flows: Option<Option<Vec<DataFlow>>>,

    #[serde(default, deserialize_with = "lenient::present_string")]
    system_overview: Option<Option<String>>,

    #[serde(default, deserialize_with = "lenient::present_string")]
    overview: Option<Option<String>>,

    #[serde(default, deserialize_with = "lenient::present_string")]
    summary: Option<Option<String>>,
}

impl From<RawDiagramModel> for DiagramModel {
    fn from(raw: RawDiagramModel) -> Self {
        fn take<T>(
            field: Option<Option<T>>,
            section: Section,
            present: &mut PresentSections,
        ) -> Option<T> {
            let value = field?;
            *present = present.with(section);
            value
        }

        let mut present = PresentSections::default();
        let processes = take(raw.processes, Section::Processes, &mut present);
        let data_stores = take(raw.data_stores, Section::DataStores, &mut present);
        let external_entities = take(
            raw.external_entities,
            Section::ExternalEntities,
            &mut present,
        );
        let data_flows = take(raw.data_flows, Section::DataFlows, &mut present);
        // `system_overview` wins over the `overview` and `summary` spellings.
        let overview = [raw.system_overview, raw.overview, raw.summary]
            .into_iter()
            .map(|field| take(field, Section::Overview, &mut present))
            .fold(None, Option::or);

        Self {
            processes: processes.unwrap_or_default(),
            data_stores: data_stores.unwrap_or_default(),
            external_entities: external_entities.unwrap_or_default(),
            data_flows: data_flows.unwrap_or_default(),
            overview,
            present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "processes": [{"id": "P1", "name": "受付", "description": "注文を受け付ける"}],
            "data_stores": [{"id": "D1", "name": "注文DB", "description": ""}],
            "external_entities": [{"id": "E1", "name": "顧客", "description": ""}],
            "data_flows": [{"id": "F1", "from": "E1", "to": "P1", "data": "注文"}],
            "system_overview": "注文処理"
        }"#;

        let model: DiagramModel = serde_json::from_str(json).unwrap();

        assert_eq!(model.processes().len(), 1);
        assert_eq!(model.processes()[0].name(), Some("受付"));
        assert_eq!(model.data_flows()[0].from(), Some("E1"));
        assert_eq!(model.overview(), Some("注文処理"));
        assert_eq!(model.present_sections(), PresentSections::all());
    }

    #[test]
    fn test_missing_keys_are_tracked() {
        let model: DiagramModel =
            serde_json::from_str(r#"{"processes": [], "data_flows": []}"#).unwrap();

        assert!(model.has_section(Section::Processes));
        assert!(model.has_section(Section::DataFlows));
        let missing: Vec<_> = model.present_sections().missing().collect();
        assert_eq!(
            missing,
            vec![
                Section::DataStores,
                Section::ExternalEntities,
                Section::Overview
            ]
        );
    }

    #[test]
    fn test_null_values_count_as_present() {
        let model: DiagramModel =
            serde_json::from_str(r#"{"data_stores": null, "system_overview": null}"#).unwrap();

        assert!(model.has_section(Section::DataStores));
        assert!(model.has_section(Section::Overview));
        assert!(model.data_stores().is_empty());
        assert_eq!(model.overview(), None);
    }

    #[test]
    fn test_overview_aliases() {
        let model: DiagramModel = serde_json::from_str(r#"{"summary": "概要"}"#).unwrap();
        assert_eq!(model.overview(), Some("概要"));
        assert!(model.has_section(Section::Overview));

        let model: DiagramModel = serde_json::from_str(r#"{"overview": "x"}"#).unwrap();
        assert_eq!(model.overview(), Some("x"));
    }

    #[test]
    fn test_system_overview_wins_over_aliases() {
        let json = r#"{
            "processes": [],
            "data_stores": [],
            "external_entities": [],
            "data_flows": [],
            "system_overview": "a",
            "summary": "b"
        }"#;

        let model: DiagramModel = serde_json::from_str(json).unwrap();

        assert_eq!(model.overview(), Some("a"));
        assert_eq!(model.present_sections(), PresentSections::all());

        let model: DiagramModel =
            serde_json::from_str(r#"{"system_overview": null, "summary": "b"}"#).unwrap();
        assert_eq!(model.overview(), Some("b"));
    }

    #[test]
    fn test_scalar_fields_are_coerced_to_strings() {
        let json = r#"{"processes": [{"id": 1, "name": true, "description": null}]}"#;
        let model: DiagramModel = serde_json::from_str(json).unwrap();

        let process = &model.processes()[0];
        assert_eq!(process.id(), Some("1"));
        assert_eq!(process.name(), Some("true"));
        assert_eq!(process.description(), None);
    }

    #[test]
    fn test_structured_fields_are_kept_as_json_text() {
        let json = r#"{
            "processes": [{"id": "P1", "name": "a", "description": ["x", "y"]}],
            "data_flows": [{"from": "P1", "to": {"id": "D1"}, "data": 1.5}],
            "system_overview": {"text": "概要"}
        }"#;

        let model: DiagramModel = serde_json::from_str(json).unwrap();

        assert_eq!(model.processes()[0].description(), Some(r#"["x","y"]"#));
        assert_eq!(model.data_flows()[0].to(), Some(r#"{"id":"D1"}"#));
        assert_eq!(model.data_flows()[0].data(), Some("1.5"));
        assert_eq!(model.overview(), Some(r#"{"text":"概要"}"#));
    }

    #[test]
    fn test_missing_element_fields_are_none() {
        let model: DiagramModel =
            serde_json::from_str(r#"{"data_flows": [{"data": "x"}]}"#).unwrap();

        let flow = &model.data_flows()[0];
        assert_eq!(flow.from(), None);
        assert_eq!(flow.to(), None);
        assert_eq!(flow.data(), Some("x"));
    }

    #[test]
    fn test_serialize_uses_system_overview_key() {
        let model = DiagramModel::new()
            .with_process(Element::new("P1", "処理1"))
            .with_overview("概要");

        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["system_overview"], "概要");
        assert_eq!(json["processes"][0]["id"], "P1");
        assert!(json.get("present").is_none());
        assert!(json["processes"][0].get("description").is_none());
    }

    #[test]
    fn test_default_names_and_ids_are_one_based() {
        assert_eq!(ElementKind::Process.default_name(0), "Process_1");
        assert_eq!(ElementKind::DataStore.default_name(2), "DataStore_3");
        assert_eq!(ElementKind::ExternalEntity.default_name(1), "Entity_2");
        assert_eq!(ElementKind::Process.default_id(0), "P1");
        assert_eq!(ElementKind::ExternalEntity.default_id(4), "E5");
    }

    #[test]
    fn test_model_built_in_code_has_all_sections() {
        let model = DiagramModel::new();
        assert_eq!(model.present_sections().missing().count(), 0);
        assert_eq!(model.element_count(), 0);
    }
}
