// SPDX-License-Identifier: MIT

//! Serialized editor workflows
//!
//! Decoding of the node/link document and downstream traversal over it.

pub mod graph;
pub mod loader;
pub mod types;

pub use graph::{DownstreamPartition, WorkflowGraph};
pub use loader::WorkflowLoader;
pub use types::{Link, NodeMode, OutputSlot, Workflow, WorkflowNode};
