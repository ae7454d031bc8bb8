// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Parameter/argument compatibility.
//!
//! Primitive parameters accept exactly one runtime kind each; there is no
//! numeric widening, so a `long` argument never satisfies an `int` parameter
//! and vice versa. Reference parameters use an assignability check.

use crate::surface::{ArgValue, ParamType, Primitive, RefType};

/// Whether a parameter declared as `param` accepts `arg`.
pub fn accepts(param: &ParamType, arg: &ArgValue) -> bool {
    match param {
        ParamType::Primitive(primitive) => primitive_accepts(*primitive, arg),
        ParamType::Ref(reference) => is_assignable(*reference, arg),
        ParamType::Array(Some(component)) => {
            matches!(arg, ArgValue::Array(array) if array.component == **component)
        }
        ParamType::Array(None) => false,
    }
}

/// Whether every parameter accepts the argument at the same position.
pub fn accepts_all(params: &[ParamType], args: &[ArgValue]) -> bool {
    params.len() == args.len() && params.iter().zip(args).all(|(p, a)| accepts(p, a))
}

fn primitive_accepts(primitive: Primitive, arg: &ArgValue) -> bool {
    matches!(
        (primitive, arg),
        (Primitive::Int, ArgValue::Int(_))
            | (Primitive::Long, ArgValue::Long(_))
            | (Primitive::Boolean, ArgValue::Bool(_))
            | (Primitive::Double, ArgValue::Double(_))
            | (Primitive::Float, ArgValue::Float(_))
            | (Primitive::Short, ArgValue::Short(_))
            | (Primitive::Byte, ArgValue::Byte(_))
            | (Primitive::Char, ArgValue::Char(_))
    )
}

fn is_assignable(reference: RefType, arg: &ArgValue) -> bool {
    match reference {
        RefType::Object => true,
        RefType::String => matches!(arg, ArgValue::Str(_)),
        // Boxed parameters take the boxed runtime value of the same primitive.
        RefType::Boxed(primitive) => primitive_accepts(primitive, arg),
        RefType::Handler => matches!(arg, ArgValue::Handler(_)),
        RefType::ExceptionHandler => matches!(arg, ArgValue::ExceptionHandler(_)),
        RefType::ExceptionClass => matches!(arg, ArgValue::Class(_)),
        // Roles only ever arrive as array elements.
        RefType::Role => false,
    }
}
