// SPDX-License-Identifier: MIT

//! Slider nodes
//!
//! Each slider exposes one float widget and returns it either as a float or
//! truncated to an integer. Values outside the widget range are clamped.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderOutput {
    Float,
    Int,
}

/// Widget range and output kind of a slider
#[derive(Debug, Clone, Copy)]
pub struct SliderSpec {
    pub class_name: &'static str,
    pub display_name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub output: SliderOutput,
}

impl SliderSpec {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn widget_schema(&self, default: f64) -> Value {
        json!({
            "type": "number",
            "display": "slider",
            "default": default,
            "minimum": self.min,
            "maximum": self.max,
            "step": self.step
        })
    }
}

pub const SLIDERS: &[SliderSpec] = &[
    SliderSpec {
        class_name: "DenoiseSlider",
        display_name: "Denoise Slider",
        default: 0.5,
        min: 0.0,
        max: 1.0,
        step: 0.001,
        output: SliderOutput::Float,
    },
    SliderSpec {
        class_name: "StepSlider",
        display_name: "Step Slider",
        default: 25.0,
        min: 0.0,
        max: 50.0,
        step: 1.0,
        output: SliderOutput::Int,
    },
    SliderSpec {
        class_name: "GuidanceSlider",
        display_name: "Guidance Slider",
        default: 2.5,
        min: -1.0,
        max: 9.0,
        step: 0.1,
        output: SliderOutput::Float,
    },
    SliderSpec {
        class_name: "BatchSlider",
        display_name: "Batch Slider",
        default: 1.0,
        min: 1.0,
        max: 10.0,
        step: 1.0,
        output: SliderOutput::Int,
    },
    SliderSpec {
        class_name: "MaxShiftSlider",
        display_name: "Max Shift Slider",
        default: 1.15,
        min: 0.0,
        max: 4.0,
        step: 0.05,
        output: SliderOutput::Float,
    },
    SliderSpec {
        class_name: "SelectFromBatch",
        display_name: "Select From Batch",
        default: 0.0,
        min: 0.0,
        max: 24.0,
        step: 1.0,
        output: SliderOutput::Int,
    },
    SliderSpec {
        class_name: "GPUSlider",
        display_name: "GPU Slider",
        default: 1.0,
        min: 1.0,
        max: 4.0,
        step: 1.0,
        output: SliderOutput::Int,
    },
];

/// A single-value slider
pub struct Slider {
    spec: SliderSpec,
    category: String,
    schema: Value,
}

impl Slider {
    pub fn new(spec: SliderSpec, config: &PackConfig) -> Self {
        let output = match spec.output {
            SliderOutput::Float => "FLOAT",
            SliderOutput::Int => "INT",
        };
        let schema = json!({
            "type": "object",
            "properties": { "value": spec.widget_schema(spec.default) },
            "output": output
        });
        Self {
            spec,
            category: config.category("Sliders"),
            schema,
        }
    }

    /// Every stock slider
    pub fn all(config: &PackConfig) -> Vec<Self> {
        SLIDERS.iter().map(|spec| Self::new(*spec, config)).collect()
    }

    pub fn spec(&self) -> &SliderSpec {
        &self.spec
    }
}

#[async_trait]
impl Node for Slider {
    fn class_name(&self) -> &str {
        self.spec.class_name
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
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
        let value = fields.f64_or("value", self.spec.default)?;
        if !value.is_finite() {
            return Err(fields.invalid("value must be finite"));
        }
        let value = self.spec.clamp(value);

        let out = match self.spec.output {
            SliderOutput::Float => json!(value),
            SliderOutput::Int => json!(value.trunc() as i64),
        };
        Ok(NodeOutput::single(out))
    }
}

const CONTROLNET_DEFAULTS: [(&str, f64); 3] = [("Strength", 1.0), ("Start", 0.0), ("End", 1.0)];

/// Strength, start and end percent packed into one VEC3 output
pub struct ControlNetSlider {
    category: String,
    schema: Value,
}

impl ControlNetSlider {
    const RANGE: SliderSpec = SliderSpec {
        class_name: "ControlNetSlider",
        display_name: "ControlNet Slider",
        default: 1.0,
        min: 0.0,
        max: 1.0,
        step: 0.05,
        output: SliderOutput::Float,
    };

    pub fn new(config: &PackConfig) -> Self {
        let properties: serde_json::Map<String, Value> = CONTROLNET_DEFAULTS
            .iter()
            .map(|(name, default)| (name.to_string(), Self::RANGE.widget_schema(*default)))
            .collect();
        Self {
            category: config.category("Sliders"),
            schema: json!({
                "type": "object",
                "properties": properties,
                "output": "VEC3"
            }),
        }
    }
}

#[async_trait]
impl Node for ControlNetSlider {
    fn class_name(&self) -> &str {
        Self::RANGE.class_name
    }

    fn display_name(&self) -> &str {
        Self::RANGE.display_name
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
        let mut vec3 = Vec::with_capacity(3);
        for (name, default) in CONTROLNET_DEFAULTS {
            let value = fields.f64_or(name, default)?;
            vec3.push(Self::RANGE.clamp(value));
        }
        Ok(NodeOutput::single(json!(vec3)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider(name: &str) -> Slider {
        let spec = SLIDERS
            .iter()
            .find(|s| s.class_name == name)
            .copied()
            .unwrap();
        Slider::new(spec, &PackConfig::default())
    }

    async fn run(node: &dyn Node, inputs: Value) -> Value {
        node.execute(inputs, &ExecutionContext::default())
            .await
            .unwrap()
            .first()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_step_slider_truncates() {
        let node = slider("StepSlider");
        assert_eq!(run(&node, json!({"value": 30.9})).await, json!(30));
        assert_eq!(run(&node, json!({})).await, json!(25));
    }

    #[tokio::test]
    async fn test_float_slider_passes_value() {
        let node = slider("DenoiseSlider");
        assert_eq!(run(&node, json!({"value": 0.35})).await, json!(0.35));
    }

    #[tokio::test]
    async fn test_slider_clamps_to_range() {
        assert_eq!(run(&slider("GuidanceSlider"), json!({"value": 12.0})).await, json!(9.0));
        assert_eq!(run(&slider("BatchSlider"), json!({"value": -3})).await, json!(1));
        assert_eq!(run(&slider("GPUSlider"), json!({"value": 7})).await, json!(4));
    }

    #[tokio::test]
    async fn test_slider_rejects_text() {
        let node = slider("MaxShiftSlider");
        let result = node
            .execute(json!({"value": "high"}), &ExecutionContext::default())
            .await;
        assert!(matches!(result, Err(ContinuumError::InvalidInput { .. })));
    }

    #[test]
    fn test_slider_metadata() {
        let node = slider("SelectFromBatch");
        assert_eq!(node.category(), "Flux-Continuum/Sliders");
        assert_eq!(node.schema()["properties"]["value"]["maximum"], json!(24.0));
        assert_eq!(node.schema()["output"], "INT");
        assert_eq!(Slider::all(&PackConfig::default()).len(), 7);
    }

    #[tokio::test]
    async fn test_controlnet_slider_vec3() {
        let node = ControlNetSlider::new(&PackConfig::default());
        assert_eq!(
            run(&node, json!({"Strength": 0.8, "Start": 0.1})).await,
            json!([0.8, 0.1, 1.0])
        );
        assert_eq!(run(&node, json!({"End": 2.0})).await, json!([1.0, 0.0, 1.0]));
    }
}
