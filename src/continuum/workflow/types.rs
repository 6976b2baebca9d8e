//! Workflow type definitions
//!
//! Serde model of the node/link graph the editor embeds in saved images and
//! prompt metadata. Only the fields the pack reads are modelled; everything
//! else in the document is ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A serialized editor workflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Workflow {
    /// Node records
    pub nodes: Vec<WorkflowNode>,
    /// Link records
    pub links: Vec<Link>,
}

/// A node in the serialized workflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowNode {
    /// Node id, normalised to a string (integer ids are rendered in decimal)
    #[serde(deserialize_with = "de_node_id")]
    pub id: String,
    /// Node class, e.g. `KSampler`
    #[serde(rename = "type", default)]
    pub class_type: Option<String>,
    /// Execution mode; `null` or non-integer values decode as `NodeMode::Other`
    #[serde(default, deserialize_with = "de_mode")]
    pub mode: NodeMode,
    /// Output ports in slot order
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub outputs: Vec<OutputSlot>,
}

/// An output port and the links leaving it
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputSlot {
    #[serde(default)]
    pub name: Option<String>,
    /// Unconnected outputs serialize `links` as `null`
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub links: Vec<i64>,
}

/// Tri-state execution flag carried by every node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "i64", into = "i64")]
pub enum NodeMode {
    #[default]
    Active,
    Muted,
    Bypassed,
    /// Any other mode value (e.g. "on event"); ignored by state propagation.
    /// Unreadable values (`null`, strings, fractions) are kept as `Other(-1)`.
    Other(i64),
}

impl From<i64> for NodeMode {
    fn from(value: i64) -> Self {
        match value {
            0 => NodeMode::Active,
            2 => NodeMode::Muted,
            4 => NodeMode::Bypassed,
            other => NodeMode::Other(other),
        }
    }
}

impl From<NodeMode> for i64 {
    fn from(mode: NodeMode) -> Self {
        match mode {
            NodeMode::Active => 0,
            NodeMode::Muted => 2,
            NodeMode::Bypassed => 4,
            NodeMode::Other(other) => other,
        }
    }
}

/// A link between an output port and an input port
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "RawLink")]
pub struct Link {
    pub id: i64,
    pub origin_id: String,
    pub origin_slot: i64,
    pub target_id: String,
    pub target_slot: i64,
    #[serde(rename = "type")]
    pub link_type: Option<String>,
}

/// Links are stored either as positional arrays
/// `[id, origin_id, origin_slot, target_id, target_slot, type]`
/// or as objects with the same field names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLink {
    Positional(Vec<Value>),
    Keyed {
        id: Value,
        origin_id: Value,
        #[serde(default)]
        origin_slot: Value,
        target_id: Value,
        #[serde(default)]
        target_slot: Value,
        #[serde(rename = "type", default)]
        link_type: Value,
    },
}

impl TryFrom<RawLink> for Link {
    type Error = String;

    fn try_from(raw: RawLink) -> Result<Self, Self::Error> {
        let (id, origin_id, origin_slot, target_id, target_slot, link_type) = match raw {
            RawLink::Positional(fields) => {
                if fields.len() < 4 {
                    return Err(format!(
                        "link array needs at least 4 entries, got {}",
                        fields.len()
                    ));
                }
                let mut fields = fields.into_iter();
                let mut next = || fields.next().unwrap_or(Value::Null);
                (next(), next(), next(), next(), next(), next())
            }
            RawLink::Keyed {
                id,
                origin_id,
                origin_slot,
                target_id,
                target_slot,
                link_type,
            } => (id, origin_id, origin_slot, target_id, target_slot, link_type),
        };

        let id = id
            .as_i64()
            .ok_or_else(|| format!("link id must be an integer, got {}", id))?;
        let origin_id = id_to_string(&origin_id)
            .ok_or_else(|| format!("link {} has an invalid origin id", id))?;
        let target_id = id_to_string(&target_id)
            .ok_or_else(|| format!("link {} has an invalid target id", id))?;

        Ok(Link {
            id,
            origin_id,
            origin_slot: origin_slot.as_i64().unwrap_or(0),
            target_id,
            target_slot: target_slot.as_i64().unwrap_or(0),
            link_type: link_type.as_str().map(str::to_string),
        })
    }
}

/// Node ids are integers in most documents but strings in subgraph exports
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn de_node_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    id_to_string(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid node id: {}", raw)))
}

fn de_mode<'de, D>(deserializer: D) -> Result<NodeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_i64().map(NodeMode::from).unwrap_or(NodeMode::Other(-1)))
}

fn de_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
