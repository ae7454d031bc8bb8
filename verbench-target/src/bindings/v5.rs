// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Fifth generation surface.
//!
//! Every slot has a plain overload, but the role-array route and the `long`
//! error overload are declared first.

use std::sync::Arc;

use verbench_core::surface::TargetSurface;
use verbench_core::ScenarioKind;

use super::{error_op, exception_op, path_op, ErrorShape, Generation};
use crate::engine::RouteTable;

pub(super) const GENERATION: Generation = Generation {
    version: "v5",
    surface_type: "TargetV5",
    declare,
};

fn declare(surface: TargetSurface, table: &Arc<RouteTable>) -> TargetSurface {
    surface
        .with(path_op(ScenarioKind::Get, table, true))
        .with(path_op(ScenarioKind::Get, table, false))
        .with(path_op(ScenarioKind::Before, table, false))
        .with(path_op(ScenarioKind::After, table, false))
        .with(exception_op(table))
        .with(error_op(table, ErrorShape::Long))
        .with(error_op(table, ErrorShape::Int))
        .with(error_op(table, ErrorShape::IntRole))
}
