// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for clapshim integration tests.
//!
//! Provides a mock implementation module and a bridge harness for fast,
//! deterministic tests that need no shared library on disk.
//!
//! # Components
//!
//! - [`MockModule`] - export table of real `extern "C"` entry points
//! - [`MockHost`] - host pointer stand-in counting live instances
//! - [`CountingLoader`] - loader wrapper counting module resolutions
//! - [`BridgeHarness`] - a complete bridge over mock modules

pub mod counting_loader;
pub mod harness;
pub mod mock_module;

pub use counting_loader::CountingLoader;
pub use harness::{BridgeHarness, manifest_json};
pub use mock_module::{MockHost, MockInstance, MockModule};
