// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Version bindings.
//!
//! Every generation of the engine shares the same dispatch core but exposes
//! its own registration surface: different arities, trailing role arrays,
//! role-qualified error handlers. The catalog never sees these shapes
//! directly.

mod v3;
mod v4;
mod v5;

use std::sync::Arc;

use verbench_core::context::Handler;
use verbench_core::surface::{
    ArgValue, Args, Operation, ParamType, Primitive, RefType, TargetSurface, TypedArray,
};
use verbench_core::{
    InvokeError, RunningServer, ScenarioKind, VerbenchError, VerbenchResult, VersionBinding,
};

use crate::engine::RouteTable;
use crate::server::EmbeddedServer;

/// Role name matching every caller.
pub const ANY_ROLE: &str = "*";

/// Every supported generation, oldest first.
pub const GENERATIONS: [Generation; 3] = [v3::GENERATION, v4::GENERATION, v5::GENERATION];

/// One engine generation: its label and the registration surface it lays
/// out over a route table.
#[derive(Clone, Copy)]
pub struct Generation {
    pub version: &'static str,
    pub surface_type: &'static str,
    declare: fn(TargetSurface, &Arc<RouteTable>) -> TargetSurface,
}

impl Generation {
    pub fn surface(&self, table: &Arc<RouteTable>) -> TargetSurface {
        (self.declare)(TargetSurface::new(self.surface_type), table)
    }
}

/// A generation served by its own embedded server.
pub struct GenerationBinding {
    generation: Generation,
    server: EmbeddedServer,
}

impl GenerationBinding {
    pub fn new(generation: Generation, trace_requests: bool) -> Self {
        Self {
            generation,
            server: EmbeddedServer::new(generation.version, trace_requests),
        }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }
}

impl VersionBinding for GenerationBinding {
    fn version(&self) -> &str {
        self.generation.version
    }

    fn start_server(&mut self, port: u16) -> VerbenchResult<RunningServer> {
        let local_addr = self.server.start(port)?;
        Ok(RunningServer {
            local_addr,
            surface: self.generation.surface(&self.server.table()),
        })
    }

    fn stop_server(&mut self) -> VerbenchResult<()> {
        Ok(self.server.stop()?)
    }
}

/// Labels of every supported generation, oldest first.
pub fn known_versions() -> Vec<&'static str> {
    GENERATIONS.iter().map(|g| g.version).collect()
}

/// The binding for a version label such as `v5` or `5`.
pub fn binding_for(
    version: &str,
    trace_requests: bool,
) -> VerbenchResult<Box<dyn VersionBinding>> {
    let label = version.trim().to_ascii_lowercase();
    let label = label.strip_prefix('v').unwrap_or(&label);
    let major = label.split('.').next().unwrap_or_default();

    GENERATIONS
        .iter()
        .find(|g| g.version.strip_prefix('v') == Some(major))
        .map(|g| boxed(*g, trace_requests))
        .ok_or_else(|| VerbenchError::UnknownVersion {
            version: version.to_string(),
        })
}

/// One binding per known generation.
pub fn all_bindings(trace_requests: bool) -> Vec<Box<dyn VersionBinding>> {
    GENERATIONS.iter().map(|g| boxed(*g, trace_requests)).collect()
}

fn boxed(generation: Generation, trace_requests: bool) -> Box<dyn VersionBinding> {
    Box::new(GenerationBinding::new(generation, trace_requests))
}

// Parameter shapes shared by the generations.

fn string() -> ParamType {
    ParamType::Ref(RefType::String)
}

fn handler() -> ParamType {
    ParamType::Ref(RefType::Handler)
}

fn roles() -> ParamType {
    ParamType::array_of(ParamType::Ref(RefType::Role))
}

/// `get`, `before` or `after` taking `(String, Handler)`, plus a trailing
/// `Role[]` when `with_roles` is set.
fn path_op(kind: ScenarioKind, table: &Arc<RouteTable>, with_roles: bool) -> Operation {
    let table = Arc::clone(table);
    let mut params = vec![string(), handler()];
    if with_roles {
        params.push(roles());
    }
    let arity = params.len();

    Operation::new(kind, params, move |args| {
        let args = Args(args);
        args.expect_len(arity)?;
        if with_roles {
            check_roles(args.array(2)?)?;
        }
        let path = args.str(0)?;
        let handler = args.handler(1)?;
        match kind {
            ScenarioKind::Get => add_route(&table, path, handler),
            ScenarioKind::Before => {
                table.add_before(path, handler);
                Ok(())
            }
            ScenarioKind::After => {
                table.add_after(path, handler);
                Ok(())
            }
            other => Err(InvokeError::Refused {
                reason: format!("{other} does not take a path"),
            }),
        }
    })
}

/// `exception(ExceptionClass, ExceptionHandler)`, identical in every generation.
fn exception_op(table: &Arc<RouteTable>) -> Operation {
    let table = Arc::clone(table);
    Operation::new(
        ScenarioKind::Exception,
        vec![
            ParamType::Ref(RefType::ExceptionClass),
            ParamType::Ref(RefType::ExceptionHandler),
        ],
        move |args| {
            let args = Args(args);
            args.expect_len(2)?;
            table.add_exception(args.class(0)?, args.exception_handler(1)?);
            Ok(())
        },
    )
}

/// Shapes the status-keyed error slot has taken across generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorShape {
    /// `error(int, Handler)`
    Int,
    /// `error(long, Handler)`
    Long,
    /// `error(Boxed<long>, Handler)`
    BoxedLong,
    /// `error(int, String, Handler)`, role qualified
    IntRole,
}

fn error_op(table: &Arc<RouteTable>, shape: ErrorShape) -> Operation {
    let table = Arc::clone(table);
    let params = match shape {
        ErrorShape::Int => vec![ParamType::Primitive(Primitive::Int), handler()],
        ErrorShape::Long => vec![ParamType::Primitive(Primitive::Long), handler()],
        ErrorShape::BoxedLong => {
            vec![ParamType::Ref(RefType::Boxed(Primitive::Long)), handler()]
        }
        ErrorShape::IntRole => vec![ParamType::Primitive(Primitive::Int), string(), handler()],
    };
    let arity = params.len();

    Operation::new(ScenarioKind::Error, params, move |args| {
        let args = Args(args);
        args.expect_len(arity)?;
        let status = match shape {
            ErrorShape::Int | ErrorShape::IntRole => status(i64::from(args.int(0)?))?,
            ErrorShape::Long | ErrorShape::BoxedLong => status(args.long(0)?)?,
        };
        if shape == ErrorShape::IntRole {
            let role = args.str(1)?;
            if role != ANY_ROLE {
                return Err(InvokeError::Refused {
                    reason: format!(
                        "error handlers only accept role '{ANY_ROLE}', got '{role}'"
                    ),
                });
            }
        }
        table.add_error(status, args.handler(arity - 1)?);
        Ok(())
    })
}

/// Role arrays must be typed as roles; every element must be a role name.
fn check_roles(array: &TypedArray) -> Result<(), InvokeError> {
    if array.component != ParamType::Ref(RefType::Role) {
        return Err(InvokeError::Refused {
            reason: format!("expected Role[], got {}[]", array.component),
        });
    }
    match array.elements.iter().find(|e| !matches!(e, ArgValue::Str(_))) {
        Some(other) => Err(InvokeError::Refused {
            reason: format!("role array holds {}", other.kind_name()),
        }),
        None => Ok(()),
    }
}

fn status(raw: i64) -> Result<u16, InvokeError> {
    match u16::try_from(raw) {
        Ok(status) if (100..=599).contains(&status) => Ok(status),
        _ => Err(InvokeError::Refused {
            reason: format!("invalid status code {raw}"),
        }),
    }
}

fn add_route(table: &RouteTable, path: &str, handler: Handler) -> Result<(), InvokeError> {
    if table.add_route(path, handler) {
        Ok(())
    } else {
        Err(InvokeError::Refused {
            reason: format!("route {path} already registered"),
        })
    }
}
