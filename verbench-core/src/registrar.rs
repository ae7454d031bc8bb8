// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Capability registrar.
//!
//! Registers one scenario against a [`TargetSurface`] of unknown shape by
//! walking a priority-ordered ladder of named strategies. The first strategy
//! that succeeds wins and the rest are not tried. Within a strategy, candidate
//! operations are tried in the surface's declaration order and the first
//! structurally compatible one is used, never a "best" match.
//!
//! A scenario that no strategy can register is a fatal [`RegistrationError`]:
//! skipping it would change which code path is measured for that version.

use crate::compat::{accepts, accepts_all};
use crate::error::{RegistrationError, StrategyAttempt, StrategyFailure, StrategyName};
use crate::surface::{ArgValue, CandidateOperation, Operation, ParamType, TargetSurface, TypedArray};
use crate::types::{Scenario, ScenarioBody, ScenarioKind};

/// Role literal passed by the wildcard-role error fallback.
pub const WILDCARD_ROLE: &str = "*";

/// Resolution order, most specific first.
pub const RESOLUTION_LADDER: [StrategyName; 4] = [
    StrategyName::ExactMatch,
    StrategyName::VarargArray,
    StrategyName::ErrorStatusHandler,
    StrategyName::ErrorStatusWildcardRole,
];

/// Which operation a scenario was registered through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub strategy: StrategyName,
    pub operation_index: usize,
    pub operation: CandidateOperation,
}

/// Resolves and invokes registration operations on a target surface.
#[derive(Debug, Clone)]
pub struct CapabilityRegistrar {
    ladder: Vec<StrategyName>,
}

impl CapabilityRegistrar {
    pub fn new() -> Self {
        Self {
            ladder: RESOLUTION_LADDER.to_vec(),
        }
    }

    pub fn ladder(&self) -> &[StrategyName] {
        &self.ladder
    }

    /// Register one scenario. Exactly one operation is invoked on success.
    pub fn register(
        &self,
        surface: &TargetSurface,
        scenario: &Scenario,
    ) -> Result<Resolution, RegistrationError> {
        let mut attempted = Vec::new();

        for &strategy in &self.ladder {
            if !applies(strategy, scenario.kind) || exact_already_invoked(strategy, &attempted) {
                continue;
            }

            match attempt(strategy, surface, scenario) {
                Ok(resolution) => {
                    tracing::debug!(
                        surface = surface.type_name(),
                        kind = %scenario.kind,
                        path = %scenario.path,
                        strategy = %strategy,
                        operation = %resolution.operation,
                        "Scenario registered"
                    );
                    return Ok(resolution);
                }
                Err(failure) => {
                    tracing::debug!(
                        surface = surface.type_name(),
                        kind = %scenario.kind,
                        path = %scenario.path,
                        strategy = %strategy,
                        reason = %failure,
                        "Strategy did not apply"
                    );
                    attempted.push(StrategyAttempt { strategy, failure });
                }
            }
        }

        Err(RegistrationError {
            surface_type: surface.type_name().to_string(),
            kind: scenario.kind,
            path: scenario.path.to_string(),
            attempted,
        })
    }

    /// Register a whole catalog, stopping at the first failure.
    pub fn register_all<'a>(
        &self,
        surface: &TargetSurface,
        scenarios: impl IntoIterator<Item = &'a Scenario>,
    ) -> Result<Vec<Resolution>, RegistrationError> {
        let resolutions = scenarios
            .into_iter()
            .map(|scenario| self.register(surface, scenario))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            surface = surface.type_name(),
            scenarios = resolutions.len(),
            "Catalog registered"
        );
        Ok(resolutions)
    }
}

impl Default for CapabilityRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

fn applies(strategy: StrategyName, kind: ScenarioKind) -> bool {
    match strategy {
        StrategyName::ExactMatch => true,
        StrategyName::VarargArray => kind.is_path_bound(),
        StrategyName::ErrorStatusHandler | StrategyName::ErrorStatusWildcardRole => {
            kind == ScenarioKind::Error
        }
    }
}

/// The plain status rung reuses the exact-match arguments, so it only runs
/// when exact match found no candidate. An operation that already refused
/// is never invoked twice for one scenario.
fn exact_already_invoked(strategy: StrategyName, attempted: &[StrategyAttempt]) -> bool {
    strategy == StrategyName::ErrorStatusHandler
        && attempted.iter().any(|a| {
            a.strategy == StrategyName::ExactMatch
                && !matches!(a.failure, StrategyFailure::NoCandidate { .. })
        })
}

/// Arguments for the plain `(x, handler)` shape of a scenario.
fn base_arguments(scenario: &Scenario) -> Vec<ArgValue> {
    match &scenario.body {
        ScenarioBody::Route(handler) => vec![
            ArgValue::Str(scenario.path.to_string()),
            ArgValue::Handler(handler.clone()),
        ],
        ScenarioBody::Exception { category, handler } => vec![
            ArgValue::Class(*category),
            ArgValue::ExceptionHandler(handler.clone()),
        ],
        ScenarioBody::Error { status, handler } => vec![
            ArgValue::Int(i32::from(*status)),
            ArgValue::Handler(handler.clone()),
        ],
    }
}

fn attempt(
    strategy: StrategyName,
    surface: &TargetSurface,
    scenario: &Scenario,
) -> Result<Resolution, StrategyFailure> {
    let kind = scenario.kind;
    let args = base_arguments(scenario);

    match strategy {
        StrategyName::ExactMatch | StrategyName::ErrorStatusHandler => {
            invoke_first_exact(strategy, surface, kind, args)
        }
        StrategyName::VarargArray => {
            let (index, op) = surface
                .candidates(kind)
                .find(|(_, op)| is_vararg_shape(op, &args))
                .ok_or(StrategyFailure::NoCandidate { kind })?;

            let component = match op.params.last() {
                Some(ParamType::Array(Some(component))) => (**component).clone(),
                _ => return Err(StrategyFailure::UnknownComponentType { kind, index }),
            };

            let mut full = args;
            full.push(ArgValue::Array(TypedArray::empty(component)));
            invoke(strategy, index, op, &full)
        }
        StrategyName::ErrorStatusWildcardRole => {
            let mut with_role = args;
            with_role.insert(1, ArgValue::Str(WILDCARD_ROLE.to_string()));
            invoke_first_exact(strategy, surface, kind, with_role)
        }
    }
}

fn invoke_first_exact(
    strategy: StrategyName,
    surface: &TargetSurface,
    kind: ScenarioKind,
    args: Vec<ArgValue>,
) -> Result<Resolution, StrategyFailure> {
    let (index, op) = surface
        .candidates(kind)
        .find(|(_, op)| accepts_all(&op.params, &args))
        .ok_or(StrategyFailure::NoCandidate { kind })?;
    invoke(strategy, index, op, &args)
}

/// Leading parameters accept `args` and one trailing array parameter follows.
fn is_vararg_shape(op: &Operation, args: &[ArgValue]) -> bool {
    match op.params.split_last() {
        Some((last, leading)) => {
            last.is_array()
                && leading.len() == args.len()
                && leading.iter().zip(args).all(|(p, a)| accepts(p, a))
        }
        None => false,
    }
}

fn invoke(
    strategy: StrategyName,
    index: usize,
    op: &Operation,
    args: &[ArgValue],
) -> Result<Resolution, StrategyFailure> {
    op.invoke(args)
        .map_err(|source| StrategyFailure::Invoke { index, source })?;
    Ok(Resolution {
        strategy,
        operation_index: index,
        operation: op.descriptor(),
    })
}
