// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Fourth generation surface.
//!
//! Routes gained a plain two-argument overload. Lifecycle filters exist only
//! in their role-array form.

use std::sync::Arc;

use verbench_core::surface::TargetSurface;
use verbench_core::ScenarioKind;

use super::{error_op, exception_op, path_op, ErrorShape, Generation};
use crate::engine::RouteTable;

pub(super) const GENERATION: Generation = Generation {
    version: "v4",
    surface_type: "TargetV4",
    declare,
};

fn declare(surface: TargetSurface, table: &Arc<RouteTable>) -> TargetSurface {
    surface
        .with(path_op(ScenarioKind::Get, table, false))
        .with(path_op(ScenarioKind::Get, table, true))
        .with(path_op(ScenarioKind::Before, table, true))
        .with(path_op(ScenarioKind::After, table, true))
        .with(exception_op(table))
        .with(error_op(table, ErrorShape::Int))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_shape() {
        let surface = GENERATION.surface(&Arc::new(RouteTable::new()));
        assert_eq!(surface.type_name(), "TargetV4");
        assert_eq!(surface.candidates(ScenarioKind::Get).count(), 2);
        assert!(surface
            .candidates(ScenarioKind::Before)
            .all(|(_, op)| op.params.len() == 3));
    }
}
