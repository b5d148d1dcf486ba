//! mfd project model
//!
//! Loads a schema description split across several XML documents into one
//! cross-referenced model, resolves every symbolic reference, checks the
//! result, and folds freshly scanned structure into hand-edited documents
//! without losing the human annotations.
//!
//! ## Features
//!
//! - **Arena Model**: namespaces own entities; relations are index references set by the linker
//! - **Linking**: foreign keys, array relations, dotted search paths, view templates
//! - **Consistency Check**: every reference must resolve before anything renders
//! - **Merge**: per-kind reconciliation that keeps human-owned fields sticky
//! - **Byte-Stable Documents**: load then save reproduces the files exactly
//!
//! ## Layout
//!
//! ```text
//! model/
//! ├── newsportal.mfd      manifest: name, namespaces, languages, custom types
//! ├── portal.xml          entities, attributes, searches
//! ├── portal.vt.xml       view templates (optional)
//! ├── common.xml
//! ├── en.xml              translations, one per language
//! └── ru.xml
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod naming;

pub use checksum::Checksum;
pub use codegen::{CodegenContext, Packer, Renderer, SummaryPacker};
pub use config::MfdConfig;
pub use document::translation::Translation;
pub use document::{LoadOptions, TextMap, WriteOptions};
pub use error::{MfdError, Result};
pub use graph::{
    Attribute, Entity, MergePolicy, MergeReport, Namespace, Project, Search, SearchType, TmplAttribute, VtAttribute,
    VtEntity,
};
