// SPDX-License-Identifier: MIT

//! Downstream node state propagation
//!
//! Given the workflow snapshot, the bridge node's id and the requested
//! mode/behavior, decide whether to forward the value, halt the branch, or
//! ask the host to flip the state of the directly connected nodes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::continuum::workflow::{DownstreamPartition, WorkflowGraph};
use crate::runtime::GraphError;

/// What the bridge does when it is switched off
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Block execution of everything fed by the bridge
    #[default]
    Stop,
    /// Mute the nodes fed by the bridge
    Mute,
    /// Bypass the nodes fed by the bridge
    Bypass,
}

impl Behavior {
    pub const ALL: [Behavior; 3] = [Behavior::Stop, Behavior::Mute, Behavior::Bypass];

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Stop => "Stop",
            Behavior::Mute => "Mute",
            Behavior::Bypass => "Bypass",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stop" => Ok(Behavior::Stop),
            "Mute" => Ok(Behavior::Mute),
            "Bypass" => Ok(Behavior::Bypass),
            other => Err(format!("unknown behavior '{}'", other)),
        }
    }
}

/// State the downstream nodes should end up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    Active,
    Muted,
    Bypassed,
}

impl TargetState {
    /// Payload key the editor listens for
    pub fn payload_key(&self) -> &'static str {
        match self {
            TargetState::Active => "actives",
            TargetState::Muted => "mutes",
            TargetState::Bypassed => "bypasses",
        }
    }

    /// Neighbours that are not yet in this state, in bucket order
    fn pending(&self, partition: DownstreamPartition) -> Vec<String> {
        let DownstreamPartition {
            active,
            muted,
            bypassed,
        } = partition;
        match self {
            TargetState::Active => [muted, bypassed].concat(),
            TargetState::Muted => [active, bypassed].concat(),
            TargetState::Bypassed => [active, muted].concat(),
        }
    }
}

/// One evaluation of the bridge
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationRequest {
    pub origin_node_id: String,
    pub desired_mode: bool,
    pub behavior: Behavior,
}

impl PropagationRequest {
    pub fn new(origin_node_id: impl Into<String>, desired_mode: bool, behavior: Behavior) -> Self {
        Self {
            origin_node_id: origin_node_id.into(),
            desired_mode,
            behavior,
        }
    }

    /// Target state for Mute/Bypass requests; `None` for Stop
    pub fn target(&self) -> Option<TargetState> {
        match (self.behavior, self.desired_mode) {
            (Behavior::Stop, _) => None,
            (_, true) => Some(TargetState::Active),
            (Behavior::Mute, false) => Some(TargetState::Muted),
            (Behavior::Bypass, false) => Some(TargetState::Bypassed),
        }
    }
}

/// Nodes that must transition, as published to the host
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub node_id: String,
    pub target: TargetState,
    pub nodes: Vec<String>,
}

impl StateChange {
    /// `{"node_id": ..., "actives"|"mutes"|"bypasses": [...]}`
    pub fn payload(&self) -> Value {
        let mut payload = json!({ "node_id": self.node_id });
        payload[self.target.payload_key()] = json!(self.nodes);
        payload
    }
}

/// Outcome of one bridge evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Propagation {
    /// Forward the value, nothing else to do
    Forward,
    /// Halt the branch fed by the bridge
    Halt,
    /// Forward the value and publish a state change
    Transition(StateChange),
}

/// Compute the state change for `target`, or `None` when every downstream
/// neighbour is already there.
pub fn plan_state_change(
    graph: &WorkflowGraph,
    origin: &str,
    target: TargetState,
) -> Result<Option<StateChange>, GraphError> {
    let pending = target.pending(graph.partition(origin)?);
    if pending.is_empty() {
        return Ok(None);
    }

    Ok(Some(StateChange {
        node_id: origin.to_string(),
        target,
        nodes: pending,
    }))
}

/// Decide what the bridge does for `request`.
///
/// Graph problems never escape: an absent or malformed workflow, an unknown
/// origin or a missing first output all degrade to `Forward`.
pub fn propagate(request: &PropagationRequest, workflow: Option<&Value>) -> Propagation {
    let Some(target) = request.target() else {
        return if request.desired_mode {
            Propagation::Forward
        } else {
            Propagation::Halt
        };
    };

    let Some(workflow) = workflow else {
        log::debug!(
            "No workflow available for bridge {}, forwarding value",
            request.origin_node_id
        );
        return Propagation::Forward;
    };

    let planned = WorkflowGraph::from_value(workflow)
        .and_then(|graph| plan_state_change(&graph, &request.origin_node_id, target));

    match planned {
        Ok(Some(change)) => Propagation::Transition(change),
        Ok(None) => Propagation::Forward,
        Err(GraphError::MissingOutput(id)) => {
            log::debug!("Bridge {} has no outputs, forwarding value", id);
            Propagation::Forward
        }
        Err(e) => {
            log::warn!("Control bridge {}: {}", request.origin_node_id, e);
            Propagation::Forward
        }
    }
}
