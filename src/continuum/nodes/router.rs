// SPDX-License-Identifier: MIT

//! Conditional model router
//!
//! Four labelled slots; the node outputs the slot whose label matches the
//! selection string. Slot contents are opaque host references.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

pub const SLOT_COUNT: usize = 4;

static ROUTER_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let mut properties = Map::new();
    properties.insert(
        "selection".to_string(),
        json!({ "type": "string", "default": "1" }),
    );
    for slot in 1..=SLOT_COUNT {
        properties.insert(format!("model_{}", slot), json!({ "x-type": "*" }));
        properties.insert(
            format!("label_{}", slot),
            json!({ "type": "string", "default": slot.to_string() }),
        );
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["selection"],
        "output": "*"
    })
});

pub struct ConditionalModelRouter {
    category: String,
}

impl ConditionalModelRouter {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
        }
    }
}

#[async_trait]
impl Node for ConditionalModelRouter {
    fn class_name(&self) -> &str {
        "ConditionalModelRouter"
    }

    fn display_name(&self) -> &str {
        "Conditional Model Router"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        "Outputs the model whose label matches the selection."
    }

    fn schema(&self) -> &Value {
        &ROUTER_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        let selection = fields.required_str("selection")?;

        for slot in 1..=SLOT_COUNT {
            let default_label = slot.to_string();
            let label = fields.str_or(&format!("label_{}", slot), &default_label)?;
            if label != selection {
                continue;
            }
            let model = fields
                .get(&format!("model_{}", slot))
                .ok_or_else(|| fields.invalid(format!("slot {} ('{}') is empty", slot, label)))?;
            log::debug!("Routing selection '{}' to slot {}", selection, slot);
            return Ok(NodeOutput::single(model.clone()));
        }

        Err(fields.invalid(format!("no slot is labelled '{}'", selection)))
    }
}
