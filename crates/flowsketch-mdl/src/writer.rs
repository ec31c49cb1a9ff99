//! Deterministic MDL text generation.
//!
//! [`MdlWriter`] renders a [`DiagramModel`] into a single `Model { System { ... } }`
//! document. Blocks are emitted category by category (processes, then data
//! stores, then external entities) followed by one `Line` per data flow; input
//! order is preserved within each category.
//!
//! Block ids (`SID`) come from a [`RenderContext`] counter shared across all
//! block kinds and incremented before use, so the first block of a fresh
//! context is `SID "1"`. Values are written literally without escaping, and
//! flow endpoints are not checked against the emitted blocks.

use std::fmt::{self, Write as _};

use chrono::{Local, NaiveDateTime};
use log::{debug, info};

use flowsketch_core::model::{DataFlow, DiagramModel, Element, ElementKind};

use crate::layout::{self, Bounds};

/// Name of the generated model and of its top-level system.
pub const MODEL_NAME: &str = "DataFlowDiagram";

/// `strftime` pattern of the `SaveTime` header field.
pub const SAVE_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Column at which parameter values start, relative to the key.
const KEY_WIDTH: usize = 23;

/// Counters threaded through a render call.
///
/// A fresh context restarts SIDs at 1. Reusing one context across several
/// [`MdlWriter::render_with`] calls keeps SIDs unique across the documents.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    blocks: u32,
    lines: u32,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks emitted so far; also the last assigned SID.
    pub fn blocks_emitted(&self) -> u32 {
        self.blocks
    }

    /// Number of lines emitted so far.
    pub fn lines_emitted(&self) -> u32 {
        self.lines
    }

    fn next_sid(&mut self) -> u32 {
        self.blocks += 1;
        self.blocks
    }

    fn record_line(&mut self) {
        self.lines += 1;
    }
}

/// Renders diagram models into MDL text.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use flowsketch_core::model::{DiagramModel, Element};
/// use flowsketch_mdl::MdlWriter;
///
/// let save_time = NaiveDate::from_ymd_opt(2024, 1, 2)
///     .and_then(|date| date.and_hms_opt(3, 4, 5))
///     .expect("valid timestamp");
///
/// let model = DiagramModel::new().with_process(Element::new("P1", "受付"));
/// let text = MdlWriter::new().with_save_time(save_time).render(&model);
///
/// assert!(text.contains(r#"SaveTime                "Tue Jan 02 03:04:05 2024""#));
/// assert!(text.contains(r#"Tag                     "P1""#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MdlWriter {
    save_time: Option<NaiveDateTime>,
}

impl MdlWriter {
    /// Create a writer that stamps documents with the local time of each render.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed `SaveTime` instead of the current local time (builder style).
    pub fn with_save_time(mut self, save_time: NaiveDateTime) -> Self {
        self.save_time = Some(save_time);
        self
    }

    /// Render `model` with a fresh [`RenderContext`].
    pub fn render(&self, model: &DiagramModel) -> String {
        let mut context = RenderContext::new();
        self.render_with(model, &mut context)
    }

    /// Render `model`, drawing SIDs from a caller-owned context.
    pub fn render_with(&self, model: &DiagramModel, context: &mut RenderContext) -> String {
        info!(
            processes = model.processes().len(),
            data_stores = model.data_stores().len(),
            external_entities = model.external_entities().len(),
            data_flows = model.data_flows().len();
            "Rendering MDL text"
        );

        let save_time = self
            .save_time
            .unwrap_or_else(|| Local::now().naive_local());

        let mut out = Emitter::default();
        write_header(&mut out, save_time);
        open_system(&mut out);

        for (index, process) in model.processes().iter().enumerate() {
            write_process(&mut out, context, index, process);
        }
        for (index, store) in model.data_stores().iter().enumerate() {
            write_data_store(&mut out, context, index, store);
        }
        for (index, entity) in model.external_entities().iter().enumerate() {
            write_entity(&mut out, context, index, entity);
        }
        for flow in model.data_flows() {
            write_line(&mut out, context, flow);
        }

        out.close();
        out.close();

        debug!(
            last_sid = context.blocks_emitted(),
            lines = context.lines_emitted();
            "MDL text rendered"
        );

        out.finish()
    }
}

/// Indentation-aware text sink for MDL sections.
#[derive(Default)]
struct Emitter {
    out: String,
    depth: usize,
}

impl Emitter {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    /// `Name {`
    fn open(&mut self, name: &str) {
        self.indent();
        let _ = writeln!(self.out, "{name} {{");
        self.depth += 1;
    }

    /// `Name{`, as used by the model browser section.
    fn open_tight(&mut self, name: &str) {
        self.indent();
        let _ = writeln!(self.out, "{name}{{");
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("}\n");
    }

    /// A line holding only the current indentation.
    fn blank(&mut self) {
        self.indent();
        self.out.push('\n');
    }

    fn bare(&mut self, key: &str, value: impl fmt::Display) {
        self.indent();
        let _ = writeln!(self.out, "{key:<KEY_WIDTH$} {value}");
    }

    fn quoted(&mut self, key: &str, value: impl fmt::Display) {
        self.indent();
        let _ = writeln!(self.out, "{key:<KEY_WIDTH$} \"{value}\"");
    }

    fn finish(self) -> String {
        self.out
    }
}

fn write_header(out: &mut Emitter, save_time: NaiveDateTime) {
    out.open("Model");
    out.quoted("Name", MODEL_NAME);
    out.bare("Version", "10.0");
    out.quoted("SaveTime", save_time.format(SAVE_TIME_FORMAT));
    out.quoted("SaveFormat", "Structure");
    out.quoted("PreLoadFcn", "");
    out.quoted("PostLoadFcn", "");
    out.open_tight("Model");
    out.bare("ModelBrowserVisibility", "on");
    out.bare("ModelBrowserWidth", 200);
    out.close();
    out.quoted("SimulationMode", "normal");
    out.quoted("StartTime", "0.0");
    out.quoted("StopTime", "10.0");
    out.quoted("Solver", "ode45");
    out.blank();
}

fn open_system(out: &mut Emitter) {
    out.open("System");
    out.quoted("Name", MODEL_NAME);
    out.bare("Location", "[100, 100, 900, 600]");
    out.bare("Open", "on");
    out.bare("ToolBar", "on");
    out.bare("StatusBar", "on");
    out.quoted("ScreenColor", "white");
    out.quoted("PaperOrientation", "landscape");
    out.quoted("PaperPositionMode", "auto");
    out.quoted("PaperType", "A4");
    out.quoted("ZoomFactor", "100");
    out.blank();
}

/// Resolved name, tag and description of an element.
struct Labels<'a> {
    name: String,
    tag: String,
    description: &'a str,
}

impl<'a> Labels<'a> {
    fn resolve(kind: ElementKind, index: usize, element: &'a Element) -> Self {
        Self {
            name: element
                .name()
                .map_or_else(|| kind.default_name(index), str::to_owned),
            tag: element
                .id()
                .map_or_else(|| kind.default_id(index), str::to_owned),
            description: element.description().unwrap_or_default(),
        }
    }
}

fn write_block_head(
    out: &mut Emitter,
    block_type: &str,
    labels: &Labels<'_>,
    sid: u32,
    bounds: Bounds,
    background: &str,
) {
    out.open("Block");
    out.quoted("BlockType", block_type);
    out.quoted("Name", &labels.name);
    out.quoted("SID", sid);
    out.quoted("Tag", &labels.tag);
    out.quoted("Description", labels.description);
    out.bare("Position", bounds);
    out.quoted("BackgroundColor", background);
    out.bare("ShowName", "on");
}

fn write_process(out: &mut Emitter, context: &mut RenderContext, index: usize, element: &Element) {
    let sid = context.next_sid();
    let labels = Labels::resolve(ElementKind::Process, index, element);

    write_block_head(
        out,
        "SubSystem",
        &labels,
        sid,
        layout::process_bounds(index),
        "lightBlue",
    );
    out.bare("TreatAsAtomicUnit", "off");
    out.bare("MinAlgLoopOccurrences", "off");
    out.open("System");
    out.quoted("Name", &labels.name);
    out.bare("Location", "[200, 200, 600, 400]");
    out.bare("Open", "off");
    out.close();
    out.close();
}

fn write_data_store(
    out: &mut Emitter,
    context: &mut RenderContext,
    index: usize,
    element: &Element,
) {
    let sid = context.next_sid();
    let labels = Labels::resolve(ElementKind::DataStore, index, element);

    write_block_head(
        out,
        "DataStoreMemory",
        &labels,
        sid,
        layout::data_store_bounds(index),
        "yellow",
    );
    out.quoted("DataStoreName", format_args!("{}_data", labels.name));
    out.quoted("InitialValue", "0");
    out.close();
}

fn write_entity(out: &mut Emitter, context: &mut RenderContext, index: usize, element: &Element) {
    let sid = context.next_sid();
    let labels = Labels::resolve(ElementKind::ExternalEntity, index, element);
    let (direction, bounds) = layout::entity_bounds(index);

    write_block_head(out, direction.block_type(), &labels, sid, bounds, "green");
    out.quoted("Port", index + 1);
    out.close();
}

fn write_line(out: &mut Emitter, context: &mut RenderContext, flow: &DataFlow) {
    context.record_line();

    out.open("Line");
    out.quoted("SrcBlock", flow.from().unwrap_or_default());
    out.bare("SrcPort", 1);
    out.quoted("DstBlock", flow.to().unwrap_or_default());
    out.bare("DstPort", 1);
    out.quoted("Name", flow.data().unwrap_or_default());
    out.close();
}
