// SPDX-License-Identifier: MIT

use crate::continuum::bridge::ControlBridge;
use crate::continuum::config::PackConfig;
use crate::continuum::nodes::{
    BooleanToEnabled, ConditionalModelRouter, ConfigurableDrawText, ControlNetSlider,
    CustomImageGridToBatch, PassThrough, ResolutionPicker, SamplerParameterPacker, SamplerParameterUnpacker, Slider,
    TextVersions,
};
use crate::runtime::{ContinuumError, ExecutionContext, Node, NodeOutput};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Menu entry for a registered node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub class_name: String,
    pub display_name: String,
    pub category: String,
}

#[derive(Clone)]
pub struct NodeRegistry {
    nodes: Arc<RwLock<HashMap<String, Arc<dyn Node>>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry holding the whole Flux Continuum catalogue
    pub async fn with_builtin_nodes(config: &PackConfig) -> Self {
        let registry = Self::new();
        for node in builtin_nodes(config) {
            log::debug!("Registered node: {}", node.class_name());
            registry.register(node).await;
        }
        registry
    }

    pub async fn register(&self, node: Arc<dyn Node>) {
        let mut nodes = self.nodes.write().await;
        nodes.insert(node.class_name().to_string(), node);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Node>> {
        let nodes = self.nodes.read().await;
        nodes.get(name).cloned()
    }

    /// All registered nodes, sorted by class name
    pub async fn list(&self) -> Vec<NodeInfo> {
        let nodes = self.nodes.read().await;
        let mut infos: Vec<NodeInfo> = nodes
            .values()
            .map(|node| NodeInfo {
                class_name: node.class_name().to_string(),
                display_name: node.display_name().to_string(),
                category: node.category().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        infos
    }

    /// Look up a node by class name and execute it
    pub async fn execute(
        &self,
        name: &str,
        inputs: Value,
        ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let node = self
            .get(name)
            .await
            .ok_or_else(|| ContinuumError::node_not_found(name))?;
        log::info!("Executing node: {}", name);
        node.execute(inputs, ctx).await
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_nodes(config: &PackConfig) -> Vec<Arc<dyn Node>> {
    let mut nodes: Vec<Arc<dyn Node>> = Vec::new();
    for slider in Slider::all(config) {
        nodes.push(Arc::new(slider));
    }
    nodes.push(Arc::new(ControlNetSlider::new(config)));
    nodes.push(Arc::new(PassThrough::segs(config)));
    nodes.push(Arc::new(PassThrough::pipe(config)));
    nodes.push(Arc::new(PassThrough::latent(config)));
    nodes.push(Arc::new(ResolutionPicker::new(config)));
    nodes.push(Arc::new(SamplerParameterPacker::new(config)));
    nodes.push(Arc::new(SamplerParameterUnpacker::new(config)));
    nodes.push(Arc::new(TextVersions::new(config)));
    nodes.push(Arc::new(ControlBridge::new(config)));
    nodes.push(Arc::new(BooleanToEnabled::new(config)));
    nodes.push(Arc::new(CustomImageGridToBatch::new(config)));
    nodes.push(Arc::new(ConfigurableDrawText::new(config)));
    nodes.push(Arc::new(ConditionalModelRouter::new(config)));
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static MOCK_SCHEMA: Lazy<Value> = Lazy::new(|| {
        json!({
            "type": "object",
            "properties": {}
        })
    });

    /// A mock node for testing
    struct MockNode {
        name: String,
    }

    impl MockNode {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl Node for MockNode {
        fn class_name(&self) -> &str {
            &self.name
        }

        fn display_name(&self) -> &str {
            &self.name
        }

        fn category(&self) -> &str {
            "Test"
        }

        fn schema(&self) -> &Value {
            &MOCK_SCHEMA
        }

        async fn execute(
            &self,
            _inputs: Value,
            _ctx: &ExecutionContext,
        ) -> Result<NodeOutput, ContinuumError> {
            Ok(NodeOutput::single(json!({"result": "mock"})))
        }
    }

    #[tokio::test]
    async fn test_register_and_get_node() {
        let registry = NodeRegistry::new();
        registry.register(Arc::new(MockNode::new("test_node"))).await;

        let retrieved = registry.get("test_node").await;
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().class_name(), "test_node");
        assert!(registry.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_registry_is_clone() {
        let registry = NodeRegistry::new();
        registry.register(Arc::new(MockNode::new("node1"))).await;

        let cloned = registry.clone();
        assert!(cloned.get("node1").await.is_some());

        // Registering on clone should be visible through the first handle
        cloned.register(Arc::new(MockNode::new("node2"))).await;
        assert!(registry.get("node2").await.is_some());
    }

    #[tokio::test]
    async fn test_builtin_catalogue() {
        let registry = NodeRegistry::with_builtin_nodes(&PackConfig::default()).await;
        let names: Vec<String> = registry
            .list()
            .await
            .into_iter()
            .map(|info| info.class_name)
            .collect();

        assert_eq!(names.len(), 20);
        for expected in [
            "StepSlider",
            "ControlNetSlider",
            "ImpactControlBridgeFix",
            "SamplerParameterUnpacker",
            "CustomImageGridToBatch",
            "ConfigurableDrawText",
            "BooleanToEnabled",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_execute_unknown_node() {
        let registry = NodeRegistry::new();
        let result = registry
            .execute("Nope", json!({}), &ExecutionContext::default())
            .await;
        assert!(matches!(result, Err(ContinuumError::NodeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_execute_builtin() {
        let registry = NodeRegistry::with_builtin_nodes(&PackConfig::default()).await;
        let out = registry
            .execute("StepSlider", json!({"value": 12.0}), &ExecutionContext::default())
            .await
            .unwrap();
        assert_eq!(out.first(), Some(&json!(12)));
    }
}
