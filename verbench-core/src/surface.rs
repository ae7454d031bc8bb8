// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Target surface model.
//!
//! A [`TargetSurface`] is whatever registration API one major version of the
//! library under benchmark offers. It is a closed set of named capability slots
//! (`get`, `before`, `after`, `exception`, `error`), each present zero or more
//! times with its own declared parameter shapes. Version bindings fill the
//! slots in at construction time; the registrar only ever inspects the shapes
//! and calls `invoke`.

use std::fmt;

use crate::context::{ErrorCategory, ExceptionHandler, Handler};
use crate::error::InvokeError;
use crate::types::ScenarioKind;

/// Primitive parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Long,
    Boolean,
    Double,
    Float,
    Short,
    Byte,
    Char,
    Void,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Boolean => "boolean",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Short => "short",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Void => "void",
        };
        f.write_str(name)
    }
}

/// Non-primitive parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    /// Accepts any argument.
    Object,
    String,
    /// Boxed form of a primitive (`Integer`, `Long`, ...).
    Boxed(Primitive),
    Handler,
    ExceptionHandler,
    ExceptionClass,
    Role,
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefType::Object => f.write_str("Object"),
            RefType::String => f.write_str("String"),
            RefType::Boxed(p) => write!(f, "Boxed<{p}>"),
            RefType::Handler => f.write_str("Handler"),
            RefType::ExceptionHandler => f.write_str("ExceptionHandler"),
            RefType::ExceptionClass => f.write_str("ExceptionClass"),
            RefType::Role => f.write_str("Role"),
        }
    }
}

/// Declared shape of one operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Primitive(Primitive),
    Ref(RefType),
    /// Array parameter. `None` when the component type cannot be determined.
    Array(Option<Box<ParamType>>),
}

impl ParamType {
    /// Array of the given component type.
    pub fn array_of(component: ParamType) -> Self {
        ParamType::Array(Some(Box::new(component)))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ParamType::Array(_))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Primitive(p) => write!(f, "{p}"),
            ParamType::Ref(r) => write!(f, "{r}"),
            ParamType::Array(Some(component)) => write!(f, "{component}[]"),
            ParamType::Array(None) => f.write_str("?[]"),
        }
    }
}

/// Array argument whose element type is exactly `component`.
#[derive(Debug, Clone)]
pub struct TypedArray {
    pub component: ParamType,
    pub elements: Vec<ArgValue>,
}

impl TypedArray {
    /// Zero-length array of `component`.
    pub fn empty(component: ParamType) -> Self {
        Self {
            component,
            elements: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Runtime argument passed to an operation.
#[derive(Clone)]
pub enum ArgValue {
    Int(i32),
    Long(i64),
    Bool(bool),
    Double(f64),
    Float(f32),
    Short(i16),
    Byte(i8),
    Char(char),
    Str(String),
    Handler(Handler),
    ExceptionHandler(ExceptionHandler),
    Class(ErrorCategory),
    Array(TypedArray),
}

impl ArgValue {
    /// Short name of the runtime kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::Int(_) => "int",
            ArgValue::Long(_) => "long",
            ArgValue::Bool(_) => "boolean",
            ArgValue::Double(_) => "double",
            ArgValue::Float(_) => "float",
            ArgValue::Short(_) => "short",
            ArgValue::Byte(_) => "byte",
            ArgValue::Char(_) => "char",
            ArgValue::Str(_) => "string",
            ArgValue::Handler(_) => "handler",
            ArgValue::ExceptionHandler(_) => "exception-handler",
            ArgValue::Class(_) => "exception-class",
            ArgValue::Array(_) => "array",
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "Int({v})"),
            ArgValue::Long(v) => write!(f, "Long({v})"),
            ArgValue::Bool(v) => write!(f, "Bool({v})"),
            ArgValue::Double(v) => write!(f, "Double({v})"),
            ArgValue::Float(v) => write!(f, "Float({v})"),
            ArgValue::Short(v) => write!(f, "Short({v})"),
            ArgValue::Byte(v) => write!(f, "Byte({v})"),
            ArgValue::Char(v) => write!(f, "Char({v:?})"),
            ArgValue::Str(v) => write!(f, "Str({v:?})"),
            ArgValue::Handler(_) => f.write_str("Handler(..)"),
            ArgValue::ExceptionHandler(_) => f.write_str("ExceptionHandler(..)"),
            ArgValue::Class(c) => write!(f, "Class({c})"),
            ArgValue::Array(a) => write!(f, "Array({}; {})", a.component, a.len()),
        }
    }
}

/// Argument accessors used by binding invokers.
pub struct Args<'a>(pub &'a [ArgValue]);

impl<'a> Args<'a> {
    pub fn expect_len(&self, expected: usize) -> Result<(), InvokeError> {
        if self.0.len() == expected {
            Ok(())
        } else {
            Err(InvokeError::Arity {
                expected,
                actual: self.0.len(),
            })
        }
    }

    pub fn str(&self, position: usize) -> Result<&'a str, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::Str(s)) => Ok(s),
            _ => Err(mismatch(position, "string")),
        }
    }

    pub fn int(&self, position: usize) -> Result<i32, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::Int(v)) => Ok(*v),
            _ => Err(mismatch(position, "int")),
        }
    }

    pub fn long(&self, position: usize) -> Result<i64, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::Long(v)) => Ok(*v),
            _ => Err(mismatch(position, "long")),
        }
    }

    pub fn handler(&self, position: usize) -> Result<Handler, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::Handler(h)) => Ok(h.clone()),
            _ => Err(mismatch(position, "handler")),
        }
    }

    pub fn exception_handler(&self, position: usize) -> Result<ExceptionHandler, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::ExceptionHandler(h)) => Ok(h.clone()),
            _ => Err(mismatch(position, "exception handler")),
        }
    }

    pub fn class(&self, position: usize) -> Result<ErrorCategory, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::Class(c)) => Ok(*c),
            _ => Err(mismatch(position, "exception class")),
        }
    }

    pub fn array(&self, position: usize) -> Result<&'a TypedArray, InvokeError> {
        match self.0.get(position) {
            Some(ArgValue::Array(a)) => Ok(a),
            _ => Err(mismatch(position, "array")),
        }
    }
}

fn mismatch(position: usize, expected: &'static str) -> InvokeError {
    InvokeError::ArgumentMismatch { position, expected }
}

/// Callable body of a capability slot.
pub type Invoker = Box<dyn Fn(&[ArgValue]) -> Result<(), InvokeError> + Send + Sync>;

/// One capability slot on a surface.
pub struct Operation {
    pub kind: ScenarioKind,
    pub params: Vec<ParamType>,
    invoke: Invoker,
}

impl Operation {
    pub fn new<F>(kind: ScenarioKind, params: Vec<ParamType>, invoke: F) -> Self
    where
        F: Fn(&[ArgValue]) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        Self {
            kind,
            params,
            invoke: Box::new(invoke),
        }
    }

    pub fn invoke(&self, args: &[ArgValue]) -> Result<(), InvokeError> {
        (self.invoke)(args)
    }

    pub fn descriptor(&self) -> CandidateOperation {
        CandidateOperation {
            name: self.kind.operation_name(),
            parameter_shapes: self.params.clone(),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

/// Introspected shape of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOperation {
    pub name: &'static str,
    pub parameter_shapes: Vec<ParamType>,
}

impl fmt::Display for CandidateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameter_shapes.iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// Registration surface of one running target.
#[derive(Debug)]
pub struct TargetSurface {
    type_name: String,
    operations: Vec<Operation>,
}

impl TargetSurface {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            operations: Vec::new(),
        }
    }

    /// Declare another operation. Declaration order is resolution order.
    pub fn with(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Operations named after `kind`, with their declaration index.
    pub fn candidates(&self, kind: ScenarioKind) -> impl Iterator<Item = (usize, &Operation)> {
        self.operations
            .iter()
            .enumerate()
            .filter(move |(_, op)| op.kind == kind)
    }

    pub fn describe(&self) -> Vec<CandidateOperation> {
        self.operations.iter().map(Operation::descriptor).collect()
    }
}
