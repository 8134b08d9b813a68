// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The comparison evaluator used by container restrictions and `ContainerRefEntry` include
//! conditions.

use crate::schema::{ParamId, SpaceSystem};
use crate::value::{EngValue, ValueMap};

/// A relational operator, XTCE's `Comparison/@comparisonOperator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A single `param OP value` test against an already-decoded parameter.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub param: ParamId,
    pub op: CompareOp,
    /// The comparand, as declared in the schema (always textual in XTCE regardless of the
    /// parameter's type; parsed against the parameter's type at evaluation time).
    pub value: String,
    /// Whether `value` compares against the calibrated engineering value (`true`, the XTCE
    /// default) or the raw value (`false`).
    pub use_calibrated_value: bool,
}

/// A conjunction of [`Comparison`]s — all must hold for the list to be satisfied, XTCE's
/// `ComparisonList`.
#[derive(Clone, Debug, Default)]
pub struct ComparisonList(pub Vec<Comparison>);

impl ComparisonList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates every comparison against `scope`, the parameter values decoded so far. A
    /// comparison whose parameter has not yet been decoded is not satisfied (the container
    /// engine only ever asks this after every referenced parameter has already been read, per
    /// the ordering invariant, but decode failures upstream can still leave it absent).
    pub fn is_satisfied(&self, schema: &SpaceSystem, scope: &ValueMap) -> bool {
        self.0.iter().all(|cmp| evaluate_one(schema, scope, cmp))
    }
}

fn evaluate_one(schema: &SpaceSystem, scope: &ValueMap, cmp: &Comparison) -> bool {
    let Some(param) = schema.parameter(cmp.param) else { return false };
    let Some(decoded) = scope.get(&param.name) else { return false };

    let lhs = if cmp.use_calibrated_value {
        decoded.engineering.clone()
    }
    else {
        raw_as_eng(&decoded.raw)
    };

    compare(&lhs, cmp.op, &cmp.value)
}

fn raw_as_eng(raw: &crate::value::RawValue) -> EngValue {
    match raw {
        crate::value::RawValue::UInt(v) => EngValue::Int(*v as i64),
        crate::value::RawValue::Int(v) => EngValue::Int(*v),
        crate::value::RawValue::Float(v) => EngValue::Float(*v),
        crate::value::RawValue::Bytes(b) => EngValue::Bytes(b.clone()),
        crate::value::RawValue::Array(items) => EngValue::Array(items.iter().map(raw_as_eng).collect()),
    }
}

fn compare(lhs: &EngValue, op: CompareOp, rhs_text: &str) -> bool {
    if let (Some(a), Ok(b)) = (lhs.as_f64(), rhs_text.parse::<f64>()) {
        return apply_op(op, a.partial_cmp(&b));
    }
    if let Some(a) = lhs.as_i64() {
        if let Ok(b) = rhs_text.parse::<i64>() {
            return apply_op(op, a.partial_cmp(&b));
        }
    }
    if let EngValue::Bool(a) = lhs {
        let b = matches!(rhs_text, "true" | "1" | "True" | "TRUE");
        return apply_op(op, a.partial_cmp(&b));
    }
    if let Some(a) = lhs.as_str() {
        return apply_op(op, a.partial_cmp(rhs_text));
    }
    false
}

fn apply_op(op: CompareOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    match (op, ordering) {
        (CompareOp::Eq, Some(Equal)) => true,
        (CompareOp::Ne, Some(Less | Greater)) => true,
        (CompareOp::Lt, Some(Less)) => true,
        (CompareOp::Le, Some(Less | Equal)) => true,
        (CompareOp::Gt, Some(Greater)) => true,
        (CompareOp::Ge, Some(Greater | Equal)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_comparisons() {
        assert!(apply_op(CompareOp::Eq, Some(std::cmp::Ordering::Equal)));
        assert!(apply_op(CompareOp::Ge, Some(std::cmp::Ordering::Equal)));
        assert!(apply_op(CompareOp::Lt, Some(std::cmp::Ordering::Less)));
        assert!(!apply_op(CompareOp::Lt, Some(std::cmp::Ordering::Equal)));
    }

    #[test]
    fn numeric_string_comparand_is_parsed() {
        assert!(compare(&EngValue::Int(5), CompareOp::Eq, "5"));
        assert!(compare(&EngValue::Float(2.5), CompareOp::Gt, "2"));
        assert!(!compare(&EngValue::Int(5), CompareOp::Eq, "6"));
    }

    #[test]
    fn boolean_string_comparand() {
        assert!(compare(&EngValue::Bool(true), CompareOp::Eq, "true"));
        assert!(compare(&EngValue::Bool(false), CompareOp::Eq, "0"));
    }
}
