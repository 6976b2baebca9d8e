// SPDX-License-Identifier: MIT

pub mod bridge;
pub mod config;
pub mod nodes;
pub mod registry;
pub mod workflow;
