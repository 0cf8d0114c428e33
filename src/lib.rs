#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # sentrygate
//!
//! `sentrygate` takes "flow" as its breakthrough point, and works across **flow control**,
//! **traffic shaping**, **circuit breaking** and **system adaptive protection**,
//! to guard the reliability and resilience of microservices.
//!
//! The library adopts a Chain-of-Responsibility pattern: user-defined rules are checked
//! automatically via slots in `base::SlotChain`. Generally, there are several steps when
//! using sentrygate:
//! 1. Initialize the library's configuration.
//! 2. Define a resource to be protected and build an entry for it.
//! 3. Load the rules defined for each resource.
//! 4. Write the code at the entry and exit points.
//!
//! ## Add Dependency
//!
//! Add the dependency in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sentrygate-core = { version = "0.1.0", features = ["full"] }
//! ```
//!
//! Optional features:
//! - macro: support procedural macros that simplify resource and rule definitions.
//! - async: support asynchronous resources.
//! - exporter: export metric statistics to Prometheus.
//! - logger_env: use `env_logger` to initialize logging.
//! - logger_log4rs: use `log4rs` to initialize logging.
//! - ds_consul: use [Consul](https://www.consul.io/) to configure rules dynamically.
//! - ds_etcdv3: use [etcd](https://etcd.io/) to configure rules dynamically.
//! - ds_k8s: use k8s to configure rules dynamically.
//! - metric_log: store formatted logs on tracked resources.
//!
//! ## General Configuration and Initialization
//!
//! The library needs to be initialized before use. The `api` module provides the
//! following interfaces:
//!
//! - `init_default()`: load configuration from environment variables, falling back to
//!   defaults for anything undefined.
//! - `init_with_config_file(config_path: &mut String)`: load configuration from a YAML file.
//! - `init_with_config(config_entity: ConfigEntity)`: use a hand-crafted `ConfigEntity`.
//!
//! Example:
//!
//! ```rust
//! use sentrygate_core::{init_default, logging};
//! init_default().unwrap_or_else(|err| logging::error!("{:?}", err));
//! ```
//!
//! ## Resource Definition
//!
//! A snippet of code is regarded as a resource, protected by defining its entry.
//!
//! By constructing `EntryBuilder` and calling `build()`, we create an `Entry`.
//! If the call is blocked, `build()` returns an error.
//!
//! ```rust
//! use sentrygate_core::base;
//! use sentrygate_core::api::EntryBuilder;
//! let entry_builder = EntryBuilder::new(res_name.clone())
//!     .with_traffic_type(base::TrafficType::Inbound);
//! if let Ok(entry) = entry_builder.build() {
//!     // The request is allowed to be processed.
//!     // after finish the logic, exit the entry.
//!     entry.exit()
//! } else {
//!     // The request is blocked.
//!     // you do not need to call `exit()` on entry now.
//! }
//! ```
//!
//! ## Loading Rules
//!
//! ### Manually
//!
//! `load_rules()` overloads all of the rules previously defined for the listed
//! resources. `append_rules()` appends rules incrementally. For example:
//!
//! ```rust
//! flow::load_rules(vec![Arc::new(flow::Rule {
//!     resource: "example".into(),
//!     threshold: 10.0,
//!     calculate_strategy: flow::CalculateStrategy::Direct,
//!     control_strategy: flow::ControlStrategy::Reject,
//!     ..Default::default()
//! })]);
//! ```
//!
//! ### Via Attribute-Like Macros
//!
//! ```rust
//! #[flow(threshold=10.0, calculate_strategy=Direct)]
//! pub fn task() -> u32 {}
//! ```
//! When using the macro, the resource name is automatically generated from the method
//! name. Since there is no function overloading in Rust, the resource name is unique.
//! The macro rewrites `task`'s signature to return `Result<u32, String>`, appends a rule
//! to the rule manager, builds an entry, and checks whether the call passes. If it does,
//! it returns `Ok(u32)`; otherwise `Err(String)`. The shortcoming is that there is no way
//! to define several rules on a single resource through the macro.
//!
//! ### Via Dynamic Datasource
//!
//! Rules can also be loaded from an external, dynamically-updated source (etcd, Consul,
//! or k8s) through the `datasource` module.
// This module is not intended to be part of the public API. In general, any
// `doc(hidden)` code is not part of the library's public and stable API.
#[macro_use]
#[doc(hidden)]
pub mod macros;

/// Public entry/context/rule-loading API.
pub mod api;
/// Core implementations, including the statistic structures
/// (the sliding window and its underlying LeapArray), the rule managers,
/// and utilities for configuration and metric logs.
/// The rule managers are responsible for the flow controller and circuit
/// breaker rules.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
cfg_exporter! {
    /// Metric exporter implementations. Currently, only Prometheus is supported.
    pub mod exporter;
}
cfg_datasource! {
    /// Dynamic datasource support for rule management.
    /// Currently, k8s, etcd and consul are supported.
    pub mod datasource;
}
// Utility functions.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
