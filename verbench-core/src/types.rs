// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scenario data model.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! Scenarios are built once at process start and never change during a run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{ErrorCategory, ExceptionHandler, Handler};
use crate::error::HardValidationError;

/// Validated route path.
/// Must start with `/`, contain no whitespace, or be the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutePath(String);

impl RoutePath {
    /// Create a new RoutePath with validation.
    pub fn new(path: impl Into<String>) -> Result<Self, HardValidationError> {
        let path = path.into();

        if path == "*" {
            return Ok(Self(path));
        }

        if !path.starts_with('/') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "path",
                value: path,
                reason: "Route paths must start with '/'".to_string(),
            });
        }

        if path.chars().any(char::is_whitespace) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "path",
                value: path,
                reason: "Route paths cannot contain whitespace".to_string(),
            });
        }

        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoutePath {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoutePath> for String {
    fn from(path: RoutePath) -> Self {
        path.0
    }
}

/// What a scenario registers. Also the closed set of operation names a
/// target surface may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Get,
    Before,
    After,
    Exception,
    Error,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 5] = [
        ScenarioKind::Get,
        ScenarioKind::Before,
        ScenarioKind::After,
        ScenarioKind::Exception,
        ScenarioKind::Error,
    ];

    /// Operation name on a target surface.
    pub const fn operation_name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Before => "before",
            Self::After => "after",
            Self::Exception => "exception",
            Self::Error => "error",
        }
    }

    /// Routes and lifecycle hooks take `(path, handler)`.
    pub const fn is_path_bound(&self) -> bool {
        matches!(self, Self::Get | Self::Before | Self::After)
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}

/// Handler body of a scenario. The variant is fixed by the kind.
#[derive(Clone)]
pub enum ScenarioBody {
    Route(Handler),
    Exception {
        category: ErrorCategory,
        handler: ExceptionHandler,
    },
    Error {
        status: u16,
        handler: Handler,
    },
}

impl fmt::Debug for ScenarioBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(_) => f.write_str("Route(<handler>)"),
            Self::Exception { category, .. } => f
                .debug_struct("Exception")
                .field("category", category)
                .finish_non_exhaustive(),
            Self::Error { status, .. } => f
                .debug_struct("Error")
                .field("status", status)
                .finish_non_exhaustive(),
        }
    }
}

/// One fixed benchmark unit.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub path: RoutePath,
    pub kind: ScenarioKind,
    pub body: ScenarioBody,
}

impl Scenario {
    pub fn get(path: RoutePath, handler: Handler) -> Self {
        Self {
            path,
            kind: ScenarioKind::Get,
            body: ScenarioBody::Route(handler),
        }
    }

    pub fn before(path: RoutePath, handler: Handler) -> Self {
        Self {
            path,
            kind: ScenarioKind::Before,
            body: ScenarioBody::Route(handler),
        }
    }

    pub fn after(path: RoutePath, handler: Handler) -> Self {
        Self {
            path,
            kind: ScenarioKind::After,
            body: ScenarioBody::Route(handler),
        }
    }

    pub fn exception(path: RoutePath, category: ErrorCategory, handler: ExceptionHandler) -> Self {
        Self {
            path,
            kind: ScenarioKind::Exception,
            body: ScenarioBody::Exception { category, handler },
        }
    }

    pub fn error(path: RoutePath, status: u16, handler: Handler) -> Self {
        Self {
            path,
            kind: ScenarioKind::Error,
            body: ScenarioBody::Error { status, handler },
        }
    }
}

/// A group of GET routes sharing a prefix: `prefix/r0 .. prefix/r(count-1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGroup {
    pub prefix: RoutePath,
    pub count: usize,
}

impl RouteGroup {
    pub fn new(prefix: RoutePath, count: usize) -> Result<Self, HardValidationError> {
        if count == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "count",
                value: "0".to_string(),
                reason: "A route group needs at least one route".to_string(),
            });
        }
        Ok(Self { prefix, count })
    }

    /// Path of the route at `index`.
    pub fn path(&self, index: usize) -> String {
        format!("{}/r{}", self.prefix, index)
    }

    /// The only route exercised during measurement.
    pub fn last_path(&self) -> String {
        self.path(self.count - 1)
    }
}

/// A measured benchmark: one or more sequential GET cycles per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkCase {
    pub name: String,
    pub paths: Vec<String>,
}

impl BenchmarkCase {
    pub fn new(name: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_validation() {
        assert!(RoutePath::new("/hello").is_ok());
        assert!(RoutePath::new("*").is_ok());
        assert!(RoutePath::new("hello").is_err());
        assert!(RoutePath::new("/he llo").is_err());
    }

    #[test]
    fn test_route_group_paths() {
        let group = RouteGroup::new(RoutePath::new("/routes10").unwrap(), 10).unwrap();
        assert_eq!(group.path(0), "/routes10/r0");
        assert_eq!(group.last_path(), "/routes10/r9");
    }

    #[test]
    fn test_empty_route_group_rejected() {
        assert!(RouteGroup::new(RoutePath::new("/empty").unwrap(), 0).is_err());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ScenarioKind::Before).unwrap();
        assert_eq!(json, "\"before\"");
    }
}
