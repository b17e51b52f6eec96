// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability-negotiated CLAP bridge.
//!
//! Built as a `cdylib`, this crate exports `clap_entry`. On `init` it reads
//! configuration, discovers the bundle's manifest, and registers one
//! plugin. The module behind that plugin is resolved on the first
//! `create_plugin`, and every instance answers `get_extension` from the
//! capability map fixed at resolution time.
//!
//! The same pieces are usable from Rust: [`Bridge::builder`] assembles a
//! bridge over any [`ModuleLoader`](clapshim_module::ModuleLoader), which
//! is how statically linked builds and tests drive it.

pub mod bridge;
pub mod dispatch;
pub mod export;
pub mod factory;
pub mod instance;
pub mod lifecycle;
pub mod logging;
pub mod registry;

pub use bridge::{Bridge, BridgeBuilder};
pub use factory::{AuxiliaryFactory, AuxiliaryKind};
pub use instance::InstanceRecord;
pub use lifecycle::{Call, LifecycleState};
pub use registry::{PluginEntry, PluginRegistry};
