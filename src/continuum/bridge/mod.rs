// SPDX-License-Identifier: MIT

//! Control bridge
//!
//! Forwards an arbitrary value and, depending on its mode and behavior,
//! halts the branch it feeds or asks the host to activate, mute or bypass
//! the nodes directly connected to its output.

mod node;
pub mod propagation;

pub use node::ControlBridge;
pub use propagation::{
    plan_state_change, propagate, Behavior, Propagation, PropagationRequest, StateChange,
    TargetState,
};
