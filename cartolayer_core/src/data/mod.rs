// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tabular input: values, role-bound columns, point features, and limits.
//!
//! The host hands the engine a set of [`Column`]s, each bound to one or more
//! logical [`Role`]s. [`RoleMap`] answers "which column plays this role" and
//! converts rows into [`Feature`]s. Data sources summarize the bound columns
//! into [`Limits`], which the stop generator classifies.

mod limits;
mod roles;
mod value;

pub use limits::{Limits, SourceLimits};
pub use roles::{Column, Feature, Role, RoleMap};
pub use value::{Value, numbers};
