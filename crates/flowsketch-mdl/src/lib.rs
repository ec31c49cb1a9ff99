//! Block-diagram text for Flowsketch diagrams.
//!
//! This crate turns a [`DiagramModel`](flowsketch_core::model::DiagramModel)
//! into Simulink MDL-shaped text and back into a structural tree:
//!
//! - [`writer`]: the deterministic generator ([`MdlWriter`])
//! - [`layout`]: grid placement rules for each block kind
//! - [`reader`]: a parser for rendered text ([`read`])
//! - [`validate`]: the coarse structural smoke test ([`validate_rendered_text`])
//!
//! # Example
//!
//! ```
//! use flowsketch_core::model::{DataFlow, DiagramModel, Element};
//! use flowsketch_mdl::{MdlWriter, validate_rendered_text};
//!
//! let model = DiagramModel::new()
//!     .with_process(Element::new("P1", "処理1"))
//!     .with_data_flow(DataFlow::new("F1", "P1", "P1", "データ"));
//!
//! let text = MdlWriter::new().render(&model);
//! assert!(validate_rendered_text(&text));
//! ```

pub mod layout;
pub mod reader;
pub mod validate;
pub mod writer;

mod error;

pub use error::ReadError;
pub use reader::{Section, Value, read};
pub use validate::validate_rendered_text;
pub use writer::{MdlWriter, RenderContext};
