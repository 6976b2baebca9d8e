// SPDX-License-Identifier: MIT

//! Flux Continuum node pack
//!
//! `runtime` holds the node trait, errors and the host collaborator;
//! `continuum` holds the nodes themselves, the workflow model the control
//! bridge walks, the registry and configuration.

pub mod continuum;
pub mod runtime;
