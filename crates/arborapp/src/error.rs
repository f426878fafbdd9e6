use crate::attributes::AttrField;
use crate::model::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArborError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Invalid position {position}: must be between 0 and {max}")]
    InvalidPosition { position: usize, max: usize },

    #[error("Cannot move {node} under {target}: it would become its own ancestor")]
    CycleDetected { node: NodeId, target: NodeId },

    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("The root row cannot be {0}")]
    RootNode(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: AttrField, reason: String },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl ArborError {
    pub fn invalid(field: AttrField, reason: impl Into<String>) -> Self {
        ArborError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors that mean the stored document cannot be trusted.
    ///
    /// The loader uses this to refuse falling back to an empty tree.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ArborError::MalformedDocument(_))
    }
}

pub type Result<T> = std::result::Result<T, ArborError>;
