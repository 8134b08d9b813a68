// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded and to-be-encoded value representations.
//!
//! A packet decode produces, per parameter, both the bit-exact [`RawValue`] and the calibrated,
//! type-interpreted [`EngValue`]. An encode only needs the engineering value; the raw value is
//! recomputed from it by the type's codec.

use indexmap::IndexMap;

/// The bit-exact value decoded straight off the wire, before calibration or type
/// interpretation.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    UInt(u64),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    /// The concatenated raw values of an `Array` type's elements, in index order.
    Array(Vec<RawValue>),
}

impl RawValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RawValue::UInt(v) => Some(*v),
            RawValue::Int(v) => Some(*v as u64),
            _ => None,
        }
    }
}

/// The calibrated, type-interpreted value presented to callers.
#[derive(Clone, Debug, PartialEq)]
pub enum EngValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Bytes(Vec<u8>),
    /// An enumerated value. `label` is `None` when the raw integer did not match any declared
    /// enumeration value — the decode still succeeds but carries no label.
    Enum { raw: i64, label: Option<String> },
    Array(Vec<EngValue>),
}

impl EngValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            EngValue::Int(v) => Some(*v),
            EngValue::Enum { raw, .. } => Some(*raw),
            EngValue::Bool(b) => Some(if *b { 1 } else { 0 }),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EngValue::Float(v) => Some(*v),
            EngValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EngValue::Str(s) => Some(s),
            EngValue::Enum { label: Some(l), .. } => Some(l),
            _ => None,
        }
    }
}

/// A decoded field: the raw bits and the engineering interpretation of them.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedValue {
    pub raw: RawValue,
    pub engineering: EngValue,
}

/// An ordered mapping from qualified parameter name to its decoded value, in the order fields
/// were decoded (root-to-leaf entry order).
pub type ValueMap = IndexMap<String, DecodedValue>;

/// An ordered mapping from qualified parameter or argument name to the engineering value a
/// caller wants encoded.
pub type InputMap = IndexMap<String, EngValue>;
