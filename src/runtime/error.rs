// SPDX-License-Identifier: MIT

//! Typed error handling for continuum-nodes
//!
//! Graph errors never escape the control bridge; they are logged and the
//! bridge degrades to a passthrough. Everything else surfaces as a
//! `ContinuumError` to the caller.

use thiserror::Error;

/// Top-level error type for continuum-nodes
#[derive(Debug, Error)]
pub enum ContinuumError {
    /// Node class not present in the registry
    #[error("Node '{name}' not found")]
    NodeNotFound { name: String },

    /// Node received an input it cannot work with
    #[error("Invalid input for {node}: {message}")]
    InvalidInput { node: String, message: String },

    /// Configuration errors (unreadable config, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow graph errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Errors raised while decoding or walking a serialized workflow
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// Workflow data is missing keys or has an unexpected shape
    #[error("Malformed workflow graph: {0}")]
    MalformedGraph(String),

    /// A node output references a link id the link table doesn't have
    #[error("Link {0} has no entry in the link table")]
    UnresolvedLink(i64),

    /// The requested node id is not part of the workflow
    #[error("Node '{0}' is not in the workflow")]
    UnknownNode(String),

    /// The node has no first output port
    #[error("Node '{0}' has no outputs")]
    MissingOutput(String),
}

impl ContinuumError {
    /// Create a node not found error
    pub fn node_not_found(name: impl Into<String>) -> Self {
        Self::NodeNotFound { name: name.into() }
    }

    /// Create an invalid input error
    pub fn invalid_input(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for ContinuumError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for ContinuumError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = ContinuumError::invalid_input("StepSlider", "value must be a number");
        assert_eq!(
            err.to_string(),
            "Invalid input for StepSlider: value must be a number"
        );
    }

    #[test]
    fn test_graph_error_converts() {
        let err: ContinuumError = GraphError::UnknownNode("7".to_string()).into();
        assert!(matches!(err, ContinuumError::Graph(GraphError::UnknownNode(_))));
        assert_eq!(err.to_string(), "Graph error: Node '7' is not in the workflow");
    }
}
