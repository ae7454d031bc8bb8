// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Third generation surface.
//!
//! Routes always take a trailing role array. Error handlers are role
//! qualified, and the older boxed-long overload is still declared ahead of
//! them.

use std::sync::Arc;

use verbench_core::surface::TargetSurface;
use verbench_core::ScenarioKind;

use super::{error_op, exception_op, path_op, ErrorShape, Generation};
use crate::engine::RouteTable;

pub(super) const GENERATION: Generation = Generation {
    version: "v3",
    surface_type: "TargetV3",
    declare,
};

fn declare(surface: TargetSurface, table: &Arc<RouteTable>) -> TargetSurface {
    surface
        .with(path_op(ScenarioKind::Get, table, true))
        .with(path_op(ScenarioKind::Before, table, false))
        .with(path_op(ScenarioKind::After, table, false))
        .with(exception_op(table))
        .with(error_op(table, ErrorShape::BoxedLong))
        .with(error_op(table, ErrorShape::IntRole))
}
