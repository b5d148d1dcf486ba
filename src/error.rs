//! Error types for mfd project handling

use std::path::PathBuf;

use thiserror::Error;

use crate::document::xml::XmlError;

/// Result type for mfd operations
pub type Result<T> = std::result::Result<T, MfdError>;

/// mfd errors
///
/// The consistency variants carry enough context (namespace, entity, field)
/// to point a human at the offending document.
#[derive(Error, Debug)]
pub enum MfdError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: XmlError,
    },

    #[error("namespace {namespace} is listed in the manifest but not loaded")]
    MissingNamespace { namespace: String },

    #[error("entity {entity} is defined in both {first} and {second} namespaces")]
    DuplicateEntity {
        entity: String,
        first: String,
        second: String,
    },

    #[error(
        "fk entity {target} not found for {attribute} column in {entity} entity, {namespace} namespace{}",
        did_you_mean(.suggestion)
    )]
    UnresolvedForeignKey {
        namespace: String,
        entity: String,
        attribute: String,
        target: String,
        suggestion: Option<String>,
    },

    #[error("attribute {target} not found for {search} search in {entity} entity, {namespace} namespace")]
    UnresolvedSearch {
        namespace: String,
        entity: String,
        search: String,
        target: String,
    },

    #[error("entity not found for vt entity {entity} in {namespace} namespace")]
    OrphanVtEntity { namespace: String, entity: String },

    #[error("attribute {attribute} of vt entity {entity} ({namespace} namespace) names neither an attribute nor a search")]
    EmptyVtAttribute {
        namespace: String,
        entity: String,
        attribute: String,
    },

    #[error("{kind} {reference} not found for attribute {attribute} of vt entity {entity} ({namespace} namespace)")]
    UnresolvedVtAttribute {
        namespace: String,
        entity: String,
        attribute: String,
        kind: &'static str,
        reference: String,
    },

    #[error("invalid names detected ({}):\n{}", .0.len(), .0.join("\n"))]
    ReservedNames(Vec<String>),

    #[error("Template error in {name}: {message}")]
    Template { name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MfdError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the errors raised by the consistency check
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Self::MissingNamespace { .. }
                | Self::DuplicateEntity { .. }
                | Self::UnresolvedForeignKey { .. }
                | Self::UnresolvedSearch { .. }
                | Self::OrphanVtEntity { .. }
                | Self::EmptyVtAttribute { .. }
                | Self::UnresolvedVtAttribute { .. }
        )
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean {name}?)"),
        None => String::new(),
    }
}

/// A document or configuration value outside of its enumeration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
