// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

/// Picks one of the preset Flux resolutions, e.g. `1024x1024 (1.0)`
pub struct ResolutionPicker {
    category: String,
    resolutions: Vec<String>,
    default: String,
    schema: Value,
}

impl ResolutionPicker {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
            resolutions: config.resolutions.clone(),
            default: config.default_resolution.clone(),
            schema: json!({
                "type": "object",
                "properties": {
                    "resolution": {
                        "type": "string",
                        "enum": config.resolutions,
                        "default": config.default_resolution
                    }
                },
                "outputs": ["resolution"]
            }),
        }
    }
}

/// Width and height of a `WxH (ratio)` label
pub fn parse_resolution(label: &str) -> Option<(u32, u32)> {
    let dims = label.split_whitespace().next()?;
    let (width, height) = dims.split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?))
}

#[async_trait]
impl Node for ResolutionPicker {
    fn class_name(&self) -> &str {
        "ResolutionPicker"
    }

    fn display_name(&self) -> &str {
        "Resolution Picker"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        let resolution = fields.str_or("resolution", &self.default)?;
        if !self.resolutions.iter().any(|r| r == resolution) {
            return Err(fields.invalid(format!("unknown resolution '{}'", resolution)));
        }
        Ok(NodeOutput::single(json!(resolution)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("1344x768 (1.75)"), Some((1344, 768)));
        assert_eq!(parse_resolution("704x1408"), Some((704, 1408)));
        assert_eq!(parse_resolution("square"), None);
    }

    #[test]
    fn test_every_default_resolution_parses() {
        for label in &PackConfig::default().resolutions {
            assert!(parse_resolution(label).is_some(), "{}", label);
        }
    }

    #[tokio::test]
    async fn test_picker_default_and_validation() {
        let node = ResolutionPicker::new(&PackConfig::default());
        let ctx = ExecutionContext::default();

        let out = node.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(out.first(), Some(&json!("1024x1024 (1.0)")));

        let out = node
            .execute(json!({"resolution": "1536x640 (2.4)"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.first(), Some(&json!("1536x640 (2.4)")));

        let result = node.execute(json!({"resolution": "1x1"}), &ctx).await;
        assert!(result.is_err());
    }
}
