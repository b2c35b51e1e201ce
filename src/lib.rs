// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # nslabel - Namespace Label Operator for Kubernetes
//!
//! nslabel is a Kubernetes operator written in Rust that manages namespace
//! labels declaratively through a `NamespaceLabel` Custom Resource.
//!
//! ## Overview
//!
//! A `NamespaceLabel` object declares the labels its own namespace should
//! carry. The operator applies that declaration to the namespace, tracks
//! which keys it owns, and removes exactly those keys again when the
//! declaration shrinks or is deleted. Labels set by other actors are never
//! touched.
//!
//! ## Modules
//!
//! - [`crd`] - The `NamespaceLabel` Custom Resource Definition types
//! - [`reconcilers`] - The control loop: delta computation, conflict-safe
//!   application, finalizer-gated cleanup
//! - [`webhook`] - Validating admission webhook enforcing write-time policy
//! - [`labels`] - Protected-key classification and operator label constants
//! - [`errors`] - Policy violation error types
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use nslabel::crd::{NamespaceLabel, NamespaceLabelSpec};
//! use std::collections::BTreeMap;
//!
//! let spec = NamespaceLabelSpec {
//!     labels: BTreeMap::from([
//!         ("team".to_string(), "payments".to_string()),
//!         ("env".to_string(), "staging".to_string()),
//!     ]),
//! };
//!
//! let declaration = NamespaceLabel::new("team-labels", spec);
//! assert_eq!(declaration.spec.labels.len(), 2);
//! ```

pub mod constants;
pub mod crd;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod webhook;

#[cfg(test)]
mod webhook_tests;
