// SPDX-License-Identifier: MIT

//! Pass-through nodes for host-owned types (segments, detailer pipes,
//! latents). The value is opaque to the pack and forwarded as is.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

pub struct PassThrough {
    class_name: &'static str,
    input: &'static str,
    category: String,
    schema: Value,
}

impl PassThrough {
    pub fn new(
        class_name: &'static str,
        input: &'static str,
        type_name: &str,
        config: &PackConfig,
    ) -> Self {
        let mut properties = Map::new();
        properties.insert(input.to_string(), json!({ "x-type": type_name }));
        Self {
            class_name,
            input,
            category: config.category("Utilities"),
            schema: json!({
                "type": "object",
                "properties": properties,
                "required": [input],
                "output": type_name
            }),
        }
    }

    pub fn segs(config: &PackConfig) -> Self {
        Self::new("SEGSPass", "SEGS", "SEGS", config)
    }

    pub fn pipe(config: &PackConfig) -> Self {
        Self::new("PipePass", "PIPE_LINE", "PIPE_LINE", config)
    }

    pub fn latent(config: &PackConfig) -> Self {
        Self::new("LatentPass", "latent", "LATENT", config)
    }
}

#[async_trait]
impl Node for PassThrough {
    fn class_name(&self) -> &str {
        self.class_name
    }

    fn display_name(&self) -> &str {
        self.class_name
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
        let value = Inputs::new(self.class_name, &inputs).required(self.input)?;
        Ok(NodeOutput::single(value.clone()))
    }
}
