// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::propagation::{propagate, Behavior, Propagation, PropagationRequest};
use crate::continuum::config::PackConfig;
use crate::continuum::workflow::{WorkflowGraph, WorkflowLoader};
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

static NULL: Value = Value::Null;

static CONTROL_BRIDGE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "value": {
                "description": "Any value; forwarded unchanged"
            },
            "mode": {
                "type": "boolean",
                "default": true,
                "description": "Active, or Stop/Mute/Bypass"
            },
            "behavior": {
                "type": "string",
                "enum": ["Stop", "Mute", "Bypass"],
                "default": "Stop"
            }
        },
        "required": ["value"]
    })
});

const DESCRIPTION: &str = "When behavior is Stop and mode is active, the input value is passed directly to the output.\n\
When behavior is Mute/Bypass and mode is active, the node connected to the output is changed to active state.\n\
When behavior is Stop and mode is Stop/Mute/Bypass, the workflow execution of the current node is halted.\n\
When behavior is Mute/Bypass and mode is Stop/Mute/Bypass, the node connected to the output is changed to Mute/Bypass state.";

/// Forwards a value and switches the nodes it feeds on or off
pub struct ControlBridge {
    category: String,
    event: String,
}

impl ControlBridge {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Utilities"),
            event: config.bridge_event.clone(),
        }
    }

    fn parse_inputs<'a>(
        &self,
        inputs: &'a Value,
    ) -> Result<(&'a Value, bool, Behavior), ContinuumError> {
        let fields = Inputs::new(self.class_name(), inputs);
        let value = fields.get("value").unwrap_or(&NULL);
        let mode = fields.bool_or("mode", true)?;
        let behavior = fields
            .str_or("behavior", Behavior::Stop.as_str())?
            .parse::<Behavior>()
            .map_err(|e| ContinuumError::invalid_input(self.class_name(), e))?;
        Ok((value, mode, behavior))
    }
}

#[async_trait]
impl Node for ControlBridge {
    fn class_name(&self) -> &str {
        "ImpactControlBridgeFix"
    }

    fn display_name(&self) -> &str {
        "Control Bridge"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn schema(&self) -> &Value {
        &CONTROL_BRIDGE_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let (value, mode, behavior) = self.parse_inputs(&inputs)?;

        if behavior != Behavior::Stop && ctx.unique_id.is_none() {
            log::warn!("Control bridge executed without a unique_id, forwarding value");
            return Ok(NodeOutput::single(value.clone()));
        }

        let request = PropagationRequest::new(
            ctx.unique_id.clone().unwrap_or_default(),
            mode,
            behavior,
        );
        let workflow = ctx
            .extra_pnginfo
            .as_ref()
            .and_then(WorkflowLoader::from_extra_pnginfo);

        match propagate(&request, workflow) {
            Propagation::Forward => {}
            Propagation::Halt => return Ok(NodeOutput::Blocked),
            Propagation::Transition(change) => {
                log::info!(
                    "Control bridge {} requests {} for {:?}",
                    change.node_id,
                    change.target.payload_key(),
                    change.nodes
                );
                ctx.host.send_sync(&self.event, change.payload());
                ctx.host.interrupt_processing();
            }
        }

        Ok(NodeOutput::single(value.clone()))
    }

    /// Stop bridges change with their inputs; Mute/Bypass bridges change when
    /// the set of nodes they feed changes.
    fn fingerprint(&self, inputs: &Value, ctx: &ExecutionContext) -> Option<Value> {
        let Ok((value, mode, behavior)) = self.parse_inputs(inputs) else {
            return Some(json!(0));
        };
        if behavior == Behavior::Stop {
            return Some(json!([value, mode, behavior.as_str()]));
        }

        let downstream = ctx
            .unique_id
            .as_deref()
            .zip(ctx.prompt.as_ref().and_then(WorkflowLoader::from_prompt))
            .and_then(|(id, workflow)| {
                WorkflowGraph::from_value(workflow)
                    .and_then(|graph| graph.downstream(id))
                    .ok()
            });

        Some(match downstream {
            Some(ids) => json!(ids),
            None => json!(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ChannelHost, HostEvent};
    use std::sync::Arc;

    fn extra_pnginfo(downstream_mode: i64) -> Value {
        json!({
            "workflow": {
                "nodes": [
                    {"id": 7, "mode": 0, "outputs": [{"links": [1]}]},
                    {"id": 8, "mode": downstream_mode}
                ],
                "links": [[1, 7, 0, 8, 0, "MODEL"]]
            }
        })
    }

    #[tokio::test]
    async fn test_stop_active_forwards() {
        let bridge = ControlBridge::new(&PackConfig::default());
        let (host, mut rx) = ChannelHost::new();
        let ctx = ExecutionContext::new(Arc::new(host)).with_unique_id("7");

        let out = bridge
            .execute(json!({"value": {"any": "thing"}, "mode": true}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, NodeOutput::single(json!({"any": "thing"})));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_inactive_blocks() {
        let bridge = ControlBridge::new(&PackConfig::default());
        let out = bridge
            .execute(
                json!({"value": 1, "mode": false, "behavior": "Stop"}),
                &ExecutionContext::default(),
            )
            .await
            .unwrap();
        assert!(out.is_blocked());
    }

    #[tokio::test]
    async fn test_mute_publishes_and_interrupts() {
        let bridge = ControlBridge::new(&PackConfig::default());
        let (host, mut rx) = ChannelHost::new();
        let ctx = ExecutionContext::new(Arc::new(host))
            .with_unique_id("7")
            .with_extra_pnginfo(extra_pnginfo(0));

        let out = bridge
            .execute(json!({"value": 3, "mode": false, "behavior": "Mute"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.first(), Some(&json!(3)));
        assert_eq!(
            rx.try_recv().unwrap(),
            HostEvent::Notification {
                event: "impact-bridge-continue".to_string(),
                payload: json!({"node_id": "7", "mutes": ["8"]}),
            }
        );
        assert_eq!(rx.try_recv().unwrap(), HostEvent::InterruptProcessing);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_behavior_is_rejected() {
        let bridge = ControlBridge::new(&PackConfig::default());
        let result = bridge
            .execute(
                json!({"value": 1, "behavior": "Pause"}),
                &ExecutionContext::default(),
            )
            .await;
        assert!(matches!(result, Err(ContinuumError::InvalidInput { .. })));
    }

    #[test]
    fn test_fingerprint_stop() {
        let bridge = ControlBridge::new(&PackConfig::default());
        let fp = bridge.fingerprint(
            &json!({"value": "x", "mode": false, "behavior": "Stop"}),
            &ExecutionContext::default(),
        );
        assert_eq!(fp, Some(json!(["x", false, "Stop"])));
    }

    #[test]
    fn test_fingerprint_downstream_ids() {
        let bridge = ControlBridge::new(&PackConfig::default());
        let ctx = ExecutionContext::default()
            .with_unique_id("7")
            .with_prompt(json!({"extra_data": {"extra_pnginfo": extra_pnginfo(2)}}));
        let fp = bridge.fingerprint(&json!({"value": 1, "behavior": "Bypass"}), &ctx);
        assert_eq!(fp, Some(json!(["8"])));

        let without_prompt = ExecutionContext::default().with_unique_id("7");
        let fp = bridge.fingerprint(&json!({"value": 1, "behavior": "Bypass"}), &without_prompt);
        assert_eq!(fp, Some(json!(0)));
    }
}
