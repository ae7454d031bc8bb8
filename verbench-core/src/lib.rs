//! Verbench Core Library
//!
//! Version-independent pieces of the cross-version HTTP benchmark: the
//! endpoint catalog, the capability registrar that fits it onto any target
//! surface, configuration, and the bounded-timeout load client.

pub mod binding;
pub mod catalog;
pub mod client;
pub mod compat;
pub mod config;
pub mod context;
pub mod error;
pub mod payload;
pub mod registrar;
pub mod session;
pub mod surface;
pub mod types;

// Re-export commonly used types
pub use binding::{RunningServer, VersionBinding};
pub use catalog::EndpointCatalog;
pub use client::{BenchmarkHttpClient, DrainedResponse, FetchedResponse};
pub use config::{ClientSettings, Config, ConfigLoader, MeasurementSettings, ServerSettings};
pub use context::{Context, ErrorCategory, ExceptionHandler, Handler, HandlerError};
pub use error::{
    HardValidationError, InvokeError, LoadError, RegistrationError, StrategyName, VerbenchError,
    VerbenchResult,
};
pub use payload::PayloadBuffers;
pub use registrar::{CapabilityRegistrar, Resolution};
pub use session::BenchmarkSession;
pub use surface::{ArgValue, Args, Operation, ParamType, Primitive, RefType, TargetSurface};
pub use types::{BenchmarkCase, RoutePath, Scenario, ScenarioBody, ScenarioKind};
