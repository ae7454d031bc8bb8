// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The fixed, version-independent endpoint catalog.
//!
//! Every target version registers exactly this set of scenarios, so results
//! stay comparable across versions. Handlers only serve pre-built payloads.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;

use crate::context::{Context, ErrorCategory, ExceptionHandler, Handler, HandlerError};
use crate::error::HardValidationError;
use crate::payload::PayloadBuffers;
use crate::types::{BenchmarkCase, RouteGroup, RoutePath, Scenario, ScenarioKind};

pub const HELLO_PATH: &str = "/hello";
pub const LIFECYCLE_PATH: &str = "/lifecycle";
pub const EXCEPTION_PATH: &str = "/exception";

/// Body the status-500 error handler produces.
pub const ERROR_BODY: &str = "Error";

/// Route group sizes; only the last route of each group is measured.
pub const ROUTE_GROUP_SIZES: [usize; 4] = [10, 100, 1000, 10000];

/// Scenarios and the benchmark cases that exercise them.
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    scenarios: Vec<Scenario>,
    route_groups: Vec<RouteGroup>,
    cases: Vec<BenchmarkCase>,
}

impl EndpointCatalog {
    /// Build the full catalog over shared payloads.
    pub fn build(payloads: &Arc<PayloadBuffers>) -> Result<Self, HardValidationError> {
        let mut scenarios = Vec::new();
        let mut cases = Vec::new();

        // hello
        scenarios.push(Scenario::get(path(HELLO_PATH)?, text(payloads.hello.clone())));

        // lifecycle: before -> get -> after, whatever the registration order
        let lifecycle = path(LIFECYCLE_PATH)?;
        scenarios.push(Scenario::before(lifecycle.clone(), append(b"A")));
        scenarios.push(Scenario::get(lifecycle.clone(), append(b"B")));
        scenarios.push(Scenario::after(lifecycle, append(b"C")));

        // exception: raise, map to 500, render "Error"
        let exception = path(EXCEPTION_PATH)?;
        scenarios.push(Scenario::get(exception.clone(), failing()));
        scenarios.push(Scenario::exception(
            exception.clone(),
            ErrorCategory::General,
            internal_error(),
        ));
        scenarios.push(Scenario::error(
            exception,
            500,
            text(Bytes::from_static(ERROR_BODY.as_bytes())),
        ));

        cases.push(BenchmarkCase::new(
            "hello",
            vec![
                HELLO_PATH.to_string(),
                LIFECYCLE_PATH.to_string(),
                EXCEPTION_PATH.to_string(),
            ],
        ));

        let payload_routes: [(&str, &str, Handler); 8] = [
            ("payloadEmpty", "/payload/empty", text(payloads.empty.clone())),
            ("payload100kb", "/payload/100kb", text(payloads.text_100kb.clone())),
            ("payload1mb", "/payload/1mb", text(payloads.text_1mb.clone())),
            ("jsonSmall", "/json/small", json(payloads.json_small.clone())),
            ("json100kb", "/json/100kb", json(payloads.json_100kb.clone())),
            ("json1mb", "/json/1mb", json(payloads.json_1mb.clone())),
            ("stream100kb", "/stream/100kb", stream(payloads.bytes_100kb.clone())),
            ("stream1mb", "/stream/1mb", stream(payloads.bytes_1mb.clone())),
        ];
        for (name, route, handler) in payload_routes {
            scenarios.push(Scenario::get(path(route)?, handler));
            cases.push(BenchmarkCase::new(name, vec![route.to_string()]));
        }

        let mut route_groups = Vec::with_capacity(ROUTE_GROUP_SIZES.len());
        for size in ROUTE_GROUP_SIZES {
            let group = RouteGroup::new(path(&format!("/routes{size}"))?, size)?;
            for index in 0..group.count {
                let body = Bytes::from(format!("route-{index}"));
                scenarios.push(Scenario::get(path(&group.path(index))?, text(body)));
            }
            cases.push(BenchmarkCase::new(
                format!("routes{size}"),
                vec![group.last_path()],
            ));
            route_groups.push(group);
        }

        let catalog = Self {
            scenarios,
            route_groups,
            cases,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), HardValidationError> {
        let mut seen = HashSet::new();
        for scenario in self.scenarios.iter().filter(|s| s.kind == ScenarioKind::Get) {
            if !seen.insert(scenario.path.as_str()) {
                return Err(HardValidationError::DuplicateRoute {
                    path: scenario.path.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn route_groups(&self) -> &[RouteGroup] {
        &self.route_groups
    }

    pub fn cases(&self) -> &[BenchmarkCase] {
        &self.cases
    }

    pub fn case(&self, name: &str) -> Option<&BenchmarkCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Cases whose names appear in `names`, case-insensitively; all when empty.
    pub fn select(&self, names: &[String]) -> Vec<&BenchmarkCase> {
        if names.is_empty() {
            return self.cases.iter().collect();
        }
        self.cases
            .iter()
            .filter(|c| names.iter().any(|n| n.eq_ignore_ascii_case(&c.name)))
            .collect()
    }
}

fn path(raw: &str) -> Result<RoutePath, HardValidationError> {
    RoutePath::new(raw)
}

fn text(body: Bytes) -> Handler {
    Arc::new(move |ctx: &mut Context| {
        ctx.result(body.clone());
        Ok(())
    })
}

fn json(document: Bytes) -> Handler {
    Arc::new(move |ctx: &mut Context| {
        ctx.json(document.clone());
        Ok(())
    })
}

fn stream(data: Bytes) -> Handler {
    Arc::new(move |ctx: &mut Context| {
        ctx.stream(data.clone());
        Ok(())
    })
}

fn append(marker: &'static [u8]) -> Handler {
    Arc::new(move |ctx: &mut Context| {
        ctx.write(Bytes::from_static(marker));
        Ok(())
    })
}

fn failing() -> Handler {
    Arc::new(|_ctx: &mut Context| Err(HandlerError::runtime("exception scenario")))
}

fn internal_error() -> ExceptionHandler {
    Arc::new(|_err: &HandlerError, ctx: &mut Context| {
        ctx.status(500);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScenarioBody;

    fn catalog() -> EndpointCatalog {
        EndpointCatalog::build(&PayloadBuffers::shared().unwrap()).unwrap()
    }

    fn run(scenario: &Scenario, ctx: &mut Context) -> Result<(), HandlerError> {
        match &scenario.body {
            ScenarioBody::Route(h) | ScenarioBody::Error { handler: h, .. } => h(ctx),
            ScenarioBody::Exception { .. } => Ok(()),
        }
    }

    #[test]
    fn test_route_groups_register_distinct_paths() {
        let catalog = catalog();
        let routes1000: Vec<_> = catalog
            .scenarios()
            .iter()
            .filter(|s| s.path.as_str().starts_with("/routes1000/"))
            .collect();
        assert_eq!(routes1000.len(), 1000);

        let distinct: HashSet<_> = routes1000.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(distinct.len(), 1000);

        let case = catalog.case("routes1000").unwrap();
        assert_eq!(case.paths, vec!["/routes1000/r999".to_string()]);
    }

    #[test]
    fn test_last_route_body() {
        let catalog = catalog();
        let scenario = catalog
            .scenarios()
            .iter()
            .find(|s| s.path.as_str() == "/routes1000/r999")
            .unwrap();
        let mut ctx = Context::new("/routes1000/r999");
        run(scenario, &mut ctx).unwrap();
        assert_eq!(ctx.take_body().concat(), b"route-999");
    }

    #[test]
    fn test_hello_case_runs_three_cycles() {
        let catalog = catalog();
        let hello = catalog.case("hello").unwrap();
        assert_eq!(hello.paths, vec!["/hello", "/lifecycle", "/exception"]);
    }

    #[test]
    fn test_lifecycle_kinds() {
        let catalog = catalog();
        let kinds: Vec<ScenarioKind> = catalog
            .scenarios()
            .iter()
            .filter(|s| s.path.as_str() == LIFECYCLE_PATH)
            .map(|s| s.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![ScenarioKind::Before, ScenarioKind::Get, ScenarioKind::After]
        );
    }

    #[test]
    fn test_exception_route_raises() {
        let catalog = catalog();
        let scenario = catalog
            .scenarios()
            .iter()
            .find(|s| s.path.as_str() == EXCEPTION_PATH && s.kind == ScenarioKind::Get)
            .unwrap();
        let mut ctx = Context::new(EXCEPTION_PATH);
        assert!(run(scenario, &mut ctx).is_err());
    }

    #[test]
    fn test_payload_1mb_handler() {
        let catalog = catalog();
        let scenario = catalog
            .scenarios()
            .iter()
            .find(|s| s.path.as_str() == "/payload/1mb")
            .unwrap();
        let mut ctx = Context::new("/payload/1mb");
        run(scenario, &mut ctx).unwrap();
        assert_eq!(ctx.body_len(), 1024 * 1024);
    }

    #[test]
    fn test_select_filters_cases() {
        let catalog = catalog();
        assert_eq!(catalog.select(&[]).len(), catalog.cases().len());
        let picked = catalog.select(&["ROUTES10".to_string(), "payload1mb".to_string()]);
        let names: Vec<&str> = picked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["payload1mb", "routes10"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let payloads = PayloadBuffers::shared().unwrap();
        let a = EndpointCatalog::build(&payloads).unwrap();
        let b = EndpointCatalog::build(&payloads).unwrap();
        let paths = |c: &EndpointCatalog| -> Vec<(String, ScenarioKind)> {
            c.scenarios().iter().map(|s| (s.path.to_string(), s.kind)).collect()
        };
        assert_eq!(paths(&a), paths(&b));
        assert_eq!(a.cases(), b.cases());
    }
}
