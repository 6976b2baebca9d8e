// SPDX-License-Identifier: MIT

//! Direct-access view over a decoded workflow
//!
//! Builds id-keyed tables for nodes and links and answers the one question
//! the control bridge needs: which nodes hang directly off a node's first
//! output, and what mode is each of them in.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::types::{Link, NodeMode, Workflow, WorkflowNode};
use crate::runtime::GraphError;

/// Workflow indexed by node id and link id
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: HashMap<String, WorkflowNode>,
    links: HashMap<i64, Link>,
}

/// Immediate downstream neighbours of a node, bucketed by current mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownstreamPartition {
    pub active: Vec<String>,
    pub muted: Vec<String>,
    pub bypassed: Vec<String>,
}

impl DownstreamPartition {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.muted.is_empty() && self.bypassed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.muted.len() + self.bypassed.len()
    }
}

impl WorkflowGraph {
    pub fn new(workflow: Workflow) -> Self {
        let links = workflow
            .links
            .into_iter()
            .map(|link| (link.id, link))
            .collect();
        let nodes = workflow
            .nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();

        Self { nodes, links }
    }

    /// Decode a workflow JSON value into lookup tables.
    ///
    /// Only a missing `nodes` or `links` array fails the whole document.
    /// Individual records that don't decode are dropped, so a broken link
    /// later shows up as unresolved and a broken node as unknown.
    pub fn from_value(value: &Value) -> Result<Self, GraphError> {
        let workflow = Workflow {
            nodes: decode_records(value, "nodes")?,
            links: decode_records(value, "links")?,
        };
        Ok(Self::new(workflow))
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: i64) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ids of nodes reached through the first output port of `origin`.
    ///
    /// Links missing from the link table and links whose target isn't a
    /// known node are skipped. Each neighbour is reported once, in link order.
    pub fn downstream(&self, origin: &str) -> Result<Vec<String>, GraphError> {
        let node = self
            .node(origin)
            .ok_or_else(|| GraphError::UnknownNode(origin.to_string()))?;
        let port = node
            .outputs
            .first()
            .ok_or_else(|| GraphError::MissingOutput(origin.to_string()))?;

        let mut seen = HashSet::new();
        let mut neighbours = Vec::new();
        for link_id in &port.links {
            let Some(link) = self.link(*link_id) else {
                log::debug!("{}", GraphError::UnresolvedLink(*link_id));
                continue;
            };
            if !self.nodes.contains_key(&link.target_id) {
                log::debug!(
                    "Link {} points at node '{}' which is not in the workflow",
                    link_id,
                    link.target_id
                );
                continue;
            }
            if seen.insert(link.target_id.as_str()) {
                neighbours.push(link.target_id.clone());
            }
        }

        Ok(neighbours)
    }

    /// Downstream neighbours of `origin` split by their current mode.
    /// Nodes in any mode other than active/muted/bypassed are left out.
    pub fn partition(&self, origin: &str) -> Result<DownstreamPartition, GraphError> {
        let mut partition = DownstreamPartition::default();
        for id in self.downstream(origin)? {
            let Some(node) = self.node(&id) else {
                continue;
            };
            match node.mode {
                NodeMode::Active => partition.active.push(id),
                NodeMode::Muted => partition.muted.push(id),
                NodeMode::Bypassed => partition.bypassed.push(id),
                NodeMode::Other(mode) => {
                    log::debug!("Ignoring node '{}' with mode {}", id, mode);
                }
            }
        }
        Ok(partition)
    }
}

fn decode_records<T: DeserializeOwned>(value: &Value, key: &str) -> Result<Vec<T>, GraphError> {
    let records = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| GraphError::MalformedGraph(format!("workflow has no '{}' array", key)))?;

    Ok(records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match T::deserialize(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::debug!("Skipping {} record {}: {}", key, index, e);
                None
            }
        })
        .collect())
}
