// SPDX-License-Identifier: MIT

//! Sampler parameter packing
//!
//! Bundles a sampler and scheduler choice into one `SAMPLER_PARAMS` value so
//! a single wire can carry both through a workflow.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

/// Packed sampler settings; serialized as a 4-element array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerParams {
    pub sampler: String,
    pub sampler_name: String,
    pub scheduler: String,
    pub scheduler_name: String,
}

impl SamplerParams {
    pub fn new(sampler: &str, scheduler: &str) -> Self {
        Self {
            sampler: sampler.to_string(),
            sampler_name: sampler.to_string(),
            scheduler: scheduler.to_string(),
            scheduler_name: scheduler.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!([
            self.sampler,
            self.sampler_name,
            self.scheduler,
            self.scheduler_name
        ])
    }

    /// Accepts the array form or an object with the four named fields
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => {
                if items.len() != 4 {
                    return Err(format!("expected 4 sampler parameters, got {}", items.len()));
                }
                let field = |i: usize| {
                    items[i]
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("sampler parameter {} must be a string", i))
                };
                Ok(Self {
                    sampler: field(0)?,
                    sampler_name: field(1)?,
                    scheduler: field(2)?,
                    scheduler_name: field(3)?,
                })
            }
            Value::Object(_) => Self::deserialize(value).map_err(|e| e.to_string()),
            other => Err(format!("unexpected sampler parameters: {}", other)),
        }
    }
}

static UNPACKER_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "sampler_params": { "x-type": "SAMPLER_PARAMS" }
        },
        "required": ["sampler_params"],
        "outputs": ["sampler", "sampler_name", "scheduler", "scheduler_name"]
    })
});

pub struct SamplerParameterPacker {
    category: String,
    samplers: Vec<String>,
    schedulers: Vec<String>,
    schema: Value,
}

impl SamplerParameterPacker {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
            samplers: config.samplers.clone(),
            schedulers: config.schedulers.clone(),
            schema: json!({
                "type": "object",
                "properties": {
                    "sampler": { "type": "string", "enum": config.samplers },
                    "scheduler": { "type": "string", "enum": config.schedulers }
                },
                "required": ["sampler", "scheduler"],
                "outputs": ["sampler_params"]
            }),
        }
    }
}

#[async_trait]
impl Node for SamplerParameterPacker {
    fn class_name(&self) -> &str {
        "SamplerParameterPacker"
    }

    fn display_name(&self) -> &str {
        "Sampler Parameter Packer"
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
        let sampler = fields.required_str("sampler")?;
        let scheduler = fields.required_str("scheduler")?;

        if !self.samplers.iter().any(|s| s == sampler) {
            return Err(fields.invalid(format!("unknown sampler '{}'", sampler)));
        }
        if !self.schedulers.iter().any(|s| s == scheduler) {
            return Err(fields.invalid(format!("unknown scheduler '{}'", scheduler)));
        }

        Ok(NodeOutput::single(
            SamplerParams::new(sampler, scheduler).to_value(),
        ))
    }
}

pub struct SamplerParameterUnpacker {
    category: String,
}

impl SamplerParameterUnpacker {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
        }
    }
}

#[async_trait]
impl Node for SamplerParameterUnpacker {
    fn class_name(&self) -> &str {
        "SamplerParameterUnpacker"
    }

    fn display_name(&self) -> &str {
        "Sampler Parameter Unpacker"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn schema(&self) -> &Value {
        &UNPACKER_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        let params = SamplerParams::from_value(fields.required("sampler_params")?)
            .map_err(|e| fields.invalid(e))?;

        Ok(NodeOutput::Values(vec![
            json!(params.sampler),
            json!(params.sampler_name),
            json!(params.scheduler),
            json!(params.scheduler_name),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pack_then_unpack() {
        let config = PackConfig::default();
        let ctx = ExecutionContext::default();
        let packed = SamplerParameterPacker::new(&config)
            .execute(json!({"sampler": "euler", "scheduler": "beta"}), &ctx)
            .await
            .unwrap();
        assert_eq!(packed.first(), Some(&json!(["euler", "euler", "beta", "beta"])));

        let params = packed.first().cloned().unwrap();
        let unpacked = SamplerParameterUnpacker::new(&config)
            .execute(json!({ "sampler_params": params }), &ctx)
            .await
            .unwrap();
        assert_eq!(
            unpacked,
            NodeOutput::Values(vec![
                json!("euler"),
                json!("euler"),
                json!("beta"),
                json!("beta")
            ])
        );
    }

    #[tokio::test]
    async fn test_unknown_sampler_rejected() {
        let node = SamplerParameterPacker::new(&PackConfig::default());
        let result = node
            .execute(
                json!({"sampler": "warp_drive", "scheduler": "normal"}),
                &ExecutionContext::default(),
            )
            .await;
        assert!(matches!(result, Err(ContinuumError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_unpack_wrong_arity() {
        let node = SamplerParameterUnpacker::new(&PackConfig::default());
        let result = node
            .execute(
                json!({"sampler_params": ["euler", "euler", "normal"]}),
                &ExecutionContext::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_params_from_object() {
        let params = SamplerParams::from_value(&json!({
            "sampler": "heun",
            "sampler_name": "heun",
            "scheduler": "karras",
            "scheduler_name": "karras"
        }))
        .unwrap();
        assert_eq!(params, SamplerParams::new("heun", "karras"));
    }
}
