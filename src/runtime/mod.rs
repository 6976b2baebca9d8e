// SPDX-License-Identifier: MIT

//! Runtime surface shared by every node: errors, the node trait and the
//! host collaborator.

pub mod error;
pub mod host;
pub mod node;

pub use error::{ContinuumError, GraphError};
pub use host::{ChannelHost, Host, HostEvent, NullHost};
pub use node::{ExecutionContext, Inputs, Node, NodeOutput};
