// SPDX-License-Identifier: MIT

//! Text and boolean helpers

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

static TEXT_VERSIONS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "default": "",
                "multiline": true,
                "dynamicPrompts": true
            }
        },
        "outputs": ["text"]
    })
});

static BOOLEAN_TO_ENABLED_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "BOOLEAN": { "type": "boolean" }
        },
        "required": ["BOOLEAN"],
        "outputs": ["enabled"]
    })
});

/// Multiline prompt box; the editor keeps the version history
pub struct TextVersions {
    category: String,
}

impl TextVersions {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
        }
    }
}

#[async_trait]
impl Node for TextVersions {
    fn class_name(&self) -> &str {
        "TextVersions"
    }

    fn display_name(&self) -> &str {
        "Text Versions"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn schema(&self) -> &Value {
        &TEXT_VERSIONS_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        let text = fields.str_or("text", "")?;
        Ok(NodeOutput::single(json!(text)))
    }
}

/// Converts a boolean into the `enabled` combo value remote queue workers expect
pub struct BooleanToEnabled {
    category: String,
}

impl BooleanToEnabled {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
        }
    }
}

#[async_trait]
impl Node for BooleanToEnabled {
    fn class_name(&self) -> &str {
        "BooleanToEnabled"
    }

    fn display_name(&self) -> &str {
        "Boolean to Enabled"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        "Convert boolean value to enabled string format"
    }

    fn schema(&self) -> &Value {
        &BOOLEAN_TO_ENABLED_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        fields.required("BOOLEAN")?;
        let enabled = if fields.bool_or("BOOLEAN", false)? {
            "true"
        } else {
            "false"
        };
        Ok(NodeOutput::single(json!(enabled)))
    }
}
