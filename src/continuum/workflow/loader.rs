//! Workflow loader - JSON file loading and metadata lookup
//!
//! Workflows reach the pack in three places: saved `.json` files, the
//! `extra_pnginfo` hidden input (`{"workflow": {...}}`) and the prompt
//! document (`{"extra_data": {"extra_pnginfo": {"workflow": {...}}}}`).

use serde_json::Value;
use std::fs;
use std::path::Path;

use super::types::Workflow;
use crate::runtime::ContinuumError;

/// Loads workflow documents from JSON
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow document from a JSON file without decoding it
    pub fn load_value<P: AsRef<Path>>(&self, path: P) -> Result<Value, ContinuumError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load and decode a workflow from a JSON file
    pub fn load_workflow<P: AsRef<Path>>(&self, path: P) -> Result<Workflow, ContinuumError> {
        let content = fs::read_to_string(path)?;
        Self::parse_json(&content)
    }

    /// Parse a workflow from a JSON string
    pub fn parse_json(content: &str) -> Result<Workflow, ContinuumError> {
        let def: Workflow = serde_json::from_str(content)?;
        Ok(def)
    }

    /// The workflow embedded in an `extra_pnginfo` hidden input
    pub fn from_extra_pnginfo(extra_pnginfo: &Value) -> Option<&Value> {
        extra_pnginfo.as_object()?.get("workflow").filter(|w| !w.is_null())
    }

    /// The workflow embedded in a prompt document
    pub fn from_prompt(prompt: &Value) -> Option<&Value> {
        let extra_pnginfo = prompt.get("extra_data")?.get("extra_pnginfo")?;
        Self::from_extra_pnginfo(extra_pnginfo)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const WORKFLOW: &str = r#"{
        "last_node_id": 3,
        "last_link_id": 1,
        "nodes": [
            {"id": 1, "type": "ImpactControlBridgeFix", "mode": 0,
             "outputs": [{"name": "value", "type": "*", "links": [1]}]},
            {"id": 3, "type": "KSampler", "mode": 2, "outputs": []}
        ],
        "links": [[1, 1, 0, 3, 0, "*"]],
        "version": 0.4
    }"#;

    #[test]
    fn test_parse_workflow() {
        let workflow = WorkflowLoader::parse_json(WORKFLOW).unwrap();
        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.links.len(), 1);
        assert_eq!(workflow.links[0].target_id, "3");
    }

    #[test]
    fn test_load_workflow_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(WORKFLOW.as_bytes()).unwrap();

        let loader = WorkflowLoader::new();
        let workflow = loader.load_workflow(file.path()).unwrap();
        assert_eq!(workflow.nodes[1].class_type.as_deref(), Some("KSampler"));

        let value = loader.load_value(file.path()).unwrap();
        assert_eq!(value["last_node_id"], 3);
    }

    #[test]
    fn test_missing_file() {
        let result = WorkflowLoader::new().load_workflow("/nonexistent/workflow.json");
        assert!(matches!(result, Err(ContinuumError::Io(_))));
    }

    #[test]
    fn test_invalid_json_returns_error() {
        let result = WorkflowLoader::parse_json("{ not json");
        assert!(matches!(result, Err(ContinuumError::Json(_))));
    }

    #[test]
    fn test_from_extra_pnginfo() {
        let info = json!({"workflow": {"nodes": [], "links": []}});
        assert!(WorkflowLoader::from_extra_pnginfo(&info).is_some());
        assert!(WorkflowLoader::from_extra_pnginfo(&json!({})).is_none());
        assert!(WorkflowLoader::from_extra_pnginfo(&json!("workflow")).is_none());
        assert!(WorkflowLoader::from_extra_pnginfo(&json!({"workflow": null})).is_none());
    }

    #[test]
    fn test_from_prompt() {
        let prompt = json!({
            "extra_data": {"extra_pnginfo": {"workflow": {"nodes": [], "links": []}}}
        });
        assert!(WorkflowLoader::from_prompt(&prompt).is_some());
        assert!(WorkflowLoader::from_prompt(&json!({"extra_data": {}})).is_none());
    }
}
