// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter and argument type definitions: the calibrated, unit-bearing, range-checked view of
//! a [`crate::encoding::DataEncoding`].

use crate::calibration::Calibrator;
use crate::encoding::{DataEncoding, SizeContext};
use crate::error::{DecodeError, EncodeError, EntryPath};
use crate::io::{BitReader, BitWriter};
use crate::schema::{ArgTypeId, ParamTypeId, SpaceSystem};
use crate::value::{EngValue, RawValue};

/// An inclusive or exclusive bound on an engineering value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
    /// When `true` the range is checked against the calibrated engineering value; when `false`,
    /// against the raw value. Only meaningful for argument types, which may declare either.
    pub applies_to_calibrated: bool,
}

impl ValidRange {
    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            None => true,
            Some(min) => if self.min_inclusive { value >= min } else { value > min },
        };
        let below_max = match self.max {
            None => true,
            Some(max) => if self.max_inclusive { value <= max } else { value < max },
        };
        above_min && below_max
    }
}

/// Fields shared by every `ParameterType`/`ArgumentType` variant.
#[derive(Clone, Debug)]
pub struct BaseType {
    pub name: String,
    pub units: Vec<String>,
    pub valid_range: Option<ValidRange>,
    pub encoding: DataEncoding,
    pub calibrator: Option<Calibrator>,
}

/// One declared value of an enumeration, matching either a single raw integer or an inclusive
/// range `[value, max_value]`, mirroring XTCE's `EnumeratedValue`/range-valued enumeration
/// support.
#[derive(Clone, Debug)]
pub struct EnumLabel {
    pub value: i64,
    pub max_value: i64,
    pub label: String,
}

impl EnumLabel {
    pub fn matches(&self, raw: i64) -> bool {
        raw >= self.value && raw <= self.max_value
    }
}

/// The epoch a relative `AbsoluteTime` offset is measured from. XTCE allows a named epoch
/// (`TAI`, `J2000`, ...) or an explicit ISO-8601 instant; both are carried through as opaque
/// labels since this engine does no time-system math of its own (see `AbsoluteTimeValue` in the
/// glossary).
#[derive(Clone, Debug, PartialEq)]
pub enum Epoch {
    Tai,
    J2000,
    Unix,
    Gps,
    Custom(String),
}

/// An array type's declared dimension list. Each entry is either a fixed size or a reference to
/// an integer parameter/argument whose decoded value supplies the size at decode/encode time.
#[derive(Clone, Debug)]
pub enum ArraySize {
    Fixed(usize),
    DynamicParam(crate::schema::ParamId),
    DynamicArg(crate::schema::ArgId),
}

/// A telemetry parameter's type: how its raw bits are read and how they are interpreted as an
/// engineering value.
#[derive(Clone, Debug)]
pub enum ParameterType {
    Integer(BaseType),
    Float(BaseType),
    Enumerated { base: BaseType, labels: Vec<EnumLabel> },
    Boolean { base: BaseType, zero_string: String, one_string: String },
    String(BaseType),
    Binary(BaseType),
    AbsoluteTime { base: BaseType, epoch: Epoch },
    Array { element_type: ParamTypeId, dimensions: Vec<ArraySize> },
}

impl ParameterType {
    pub fn base(&self) -> Option<&BaseType> {
        match self {
            ParameterType::Integer(b)
            | ParameterType::Float(b)
            | ParameterType::String(b)
            | ParameterType::Binary(b) => Some(b),
            ParameterType::Enumerated { base, .. } => Some(base),
            ParameterType::Boolean { base, .. } => Some(base),
            ParameterType::AbsoluteTime { base, .. } => Some(base),
            ParameterType::Array { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        self.base().map(|b| b.name.as_str()).unwrap_or("")
    }
}

/// A command argument's type. Structurally identical to [`ParameterType`]; kept as a distinct
/// enum because XTCE declares `ArgumentType` and `ParameterType` as separate (if structurally
/// parallel) schema entities, and because an `Array` argument references other argument types
/// rather than parameter types.
#[derive(Clone, Debug)]
pub enum ArgumentType {
    Integer(BaseType),
    Float(BaseType),
    Enumerated { base: BaseType, labels: Vec<EnumLabel> },
    Boolean { base: BaseType, zero_string: String, one_string: String },
    String(BaseType),
    Binary(BaseType),
    AbsoluteTime { base: BaseType, epoch: Epoch },
    Array { element_type: ArgTypeId, dimensions: Vec<ArraySize> },
}

impl ArgumentType {
    pub fn base(&self) -> Option<&BaseType> {
        match self {
            ArgumentType::Integer(b)
            | ArgumentType::Float(b)
            | ArgumentType::String(b)
            | ArgumentType::Binary(b) => Some(b),
            ArgumentType::Enumerated { base, .. } => Some(base),
            ArgumentType::Boolean { base, .. } => Some(base),
            ArgumentType::AbsoluteTime { base, .. } => Some(base),
            ArgumentType::Array { .. } => None,
        }
    }
}

// --- Shared raw <-> engineering interpretation ----------------------------------------------
//
// `ParameterType` and `ArgumentType` are structurally parallel (XTCE declares them as separate
// schema entities but gives them identical raw/calibrated semantics); the per-kind interpretation
// below is written once against `BaseType` and the bits every variant shares, and called from both
// enums' `decode`/`encode` methods.

fn raw_as_f64(raw: &RawValue) -> f64 {
    match raw {
        RawValue::UInt(v) => *v as f64,
        RawValue::Int(v) => *v as f64,
        RawValue::Float(v) => *v,
        RawValue::Bytes(_) | RawValue::Array(_) => 0.0,
    }
}

fn raw_range_bounds(range: Option<&ValidRange>) -> Option<(f64, f64)> {
    let range = range?;
    Some((range.min.unwrap_or(f64::NEG_INFINITY), range.max.unwrap_or(f64::INFINITY)))
}

fn check_range(range: Option<&ValidRange>, raw: f64, eng: f64, path: &EntryPath) -> Result<(), EncodeError> {
    let Some(range) = range else { return Ok(()) };
    let value = if range.applies_to_calibrated { eng } else { raw };
    if !range.contains(value) {
        return Err(EncodeError::OutOfRange { path: path.clone(), value: value.to_string() });
    }
    Ok(())
}

fn decode_integer_like(base: &BaseType, raw: RawValue) -> EngValue {
    let x = raw_as_f64(&raw);
    match &base.calibrator {
        Some(cal) => EngValue::Float(cal.evaluate(x)),
        None => match raw {
            RawValue::UInt(v) => EngValue::Int(v as i64),
            RawValue::Int(v) => EngValue::Int(v),
            RawValue::Float(v) => EngValue::Float(v),
            _ => EngValue::Int(x as i64),
        },
    }
}

fn encode_integer_like(
    base: &BaseType,
    encoding_is_float: bool,
    value: &EngValue,
    path: &EntryPath,
) -> Result<RawValue, EncodeError> {
    let eng = value.as_f64().ok_or_else(|| EncodeError::OutOfRange { path: path.clone(), value: "non-numeric".into() })?;

    let raw = match &base.calibrator {
        Some(cal) => cal.invert(eng, raw_range_bounds(base.valid_range.as_ref()))?,
        None => eng,
    };

    check_range(base.valid_range.as_ref(), raw, eng, path)?;

    if encoding_is_float {
        Ok(RawValue::Float(raw))
    }
    else if matches!(base.encoding, DataEncoding::Integer { signed: crate::encoding::IntegerSigned::TwosComplement, .. }) {
        Ok(RawValue::Int(raw.round() as i64))
    }
    else {
        Ok(RawValue::UInt(raw.round() as u64))
    }
}

fn decode_enumerated(labels: &[EnumLabel], raw: RawValue) -> EngValue {
    let raw_i64 = match &raw {
        RawValue::UInt(v) => *v as i64,
        RawValue::Int(v) => *v,
        _ => 0,
    };
    let label = labels.iter().find(|l| l.matches(raw_i64)).map(|l| l.label.clone());
    EngValue::Enum { raw: raw_i64, label }
}

fn encode_enumerated(labels: &[EnumLabel], value: &EngValue, path: &EntryPath) -> Result<RawValue, EncodeError> {
    let raw_i64 = match value {
        EngValue::Enum { raw: _, label: Some(label) } => {
            if let Some(found) = labels.iter().find(|l| &l.label == label) {
                found.value
            }
            else {
                return Err(EncodeError::UnknownEnumLabel { path: path.clone(), label: label.clone() });
            }
        }
        EngValue::Enum { raw, .. } => *raw,
        EngValue::Str(label) => {
            let found = labels
                .iter()
                .find(|l| &l.label == label)
                .ok_or_else(|| EncodeError::UnknownEnumLabel { path: path.clone(), label: label.clone() })?;
            found.value
        }
        EngValue::Int(v) => *v,
        other => {
            return Err(EncodeError::UnknownEnumLabel { path: path.clone(), label: format!("{other:?}") });
        }
    };
    Ok(RawValue::Int(raw_i64))
}

fn decode_boolean(zero_string: &str, one_string: &str, raw: RawValue) -> EngValue {
    let nonzero = match raw {
        RawValue::UInt(v) => v != 0,
        RawValue::Int(v) => v != 0,
        _ => false,
    };
    EngValue::Str(if nonzero { one_string.to_string() } else { zero_string.to_string() })
}

fn encode_boolean(zero_string: &str, one_string: &str, value: &EngValue, path: &EntryPath) -> Result<RawValue, EncodeError> {
    let nonzero = match value {
        EngValue::Bool(b) => *b,
        EngValue::Str(s) if s == one_string => true,
        EngValue::Str(s) if s == zero_string => false,
        EngValue::Int(v) => *v != 0,
        other => {
            return Err(EncodeError::UnknownBooleanString { path: path.clone(), value: format!("{other:?}") });
        }
    };
    Ok(RawValue::UInt(if nonzero { 1 } else { 0 }))
}

fn decode_string(base: &BaseType, raw: RawValue, path: &EntryPath) -> Result<EngValue, DecodeError> {
    let DataEncoding::String { charset, .. } = &base.encoding else {
        unreachable!("String parameter/argument types always carry a String encoding")
    };
    let RawValue::Bytes(bytes) = raw else { unreachable!("String encodings always decode to raw bytes") };
    let decoded = crate::encoding::decode_charset(&bytes, *charset)
        .map_err(|charset| DecodeError::StringCharsetError { path: path.clone(), charset })?;
    Ok(EngValue::Str(decoded))
}

fn encode_string(base: &BaseType, value: &EngValue, path: &EntryPath) -> Result<RawValue, EncodeError> {
    let DataEncoding::String { charset, .. } = &base.encoding else {
        unreachable!("String parameter/argument types always carry a String encoding")
    };
    let text = value.as_str().ok_or_else(|| EncodeError::OutOfRange { path: path.clone(), value: "non-string".into() })?;
    let bytes = crate::encoding::encode_charset(text, *charset)
        .map_err(|_| EncodeError::OutOfRange { path: path.clone(), value: text.to_string() })?;
    Ok(RawValue::Bytes(bytes))
}

fn decode_absolute_time(base: &BaseType, raw: RawValue) -> EngValue {
    let seconds = raw_as_f64(&raw);
    match &base.calibrator {
        Some(cal) => EngValue::Float(cal.evaluate(seconds)),
        None => EngValue::Float(seconds),
    }
}

fn encode_absolute_time(base: &BaseType, value: &EngValue, path: &EntryPath) -> Result<RawValue, EncodeError> {
    let eng = value.as_f64().ok_or_else(|| EncodeError::OutOfRange { path: path.clone(), value: "non-numeric".into() })?;
    let raw = match &base.calibrator {
        Some(cal) => cal.invert(eng, raw_range_bounds(base.valid_range.as_ref()))?,
        None => eng,
    };
    if raw < 0.0 || raw > u32::MAX as f64 {
        return Err(EncodeError::OutOfRange { path: path.clone(), value: raw.to_string() });
    }
    Ok(RawValue::UInt(raw.round() as u64))
}

impl ParameterType {
    /// Decodes one value of this type off `reader`, applying calibration and enumeration/boolean
    /// interpretation as appropriate. `schema` resolves an `Array` type's element type and
    /// dynamic dimension reference; `ctx` resolves already-decoded parameter values for dynamic
    /// sizing.
    pub fn decode(
        &self,
        schema: &SpaceSystem,
        reader: &mut BitReader<'_>,
        ctx: &dyn SizeContext,
        path: &EntryPath,
    ) -> Result<(RawValue, EngValue), DecodeError> {
        match self {
            ParameterType::Integer(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_integer_like(base, raw.clone());
                Ok((raw, eng))
            }
            ParameterType::Float(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_integer_like(base, raw.clone());
                Ok((raw, eng))
            }
            ParameterType::Enumerated { base, labels } => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_enumerated(labels, raw.clone());
                Ok((raw, eng))
            }
            ParameterType::Boolean { base, zero_string, one_string } => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_boolean(zero_string, one_string, raw.clone());
                Ok((raw, eng))
            }
            ParameterType::String(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_string(base, raw.clone(), path)?;
                Ok((raw, eng))
            }
            ParameterType::Binary(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = match &raw {
                    RawValue::Bytes(b) => EngValue::Bytes(b.clone()),
                    _ => unreachable!("Binary encodings always decode to raw bytes"),
                };
                Ok((raw, eng))
            }
            ParameterType::AbsoluteTime { base, .. } => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_absolute_time(base, raw.clone());
                Ok((raw, eng))
            }
            ParameterType::Array { element_type, dimensions } => {
                let element = schema
                    .parameter_type(*element_type)
                    .expect("Array element type is validated to exist at schema build time");
                let len = array_length(dimensions, ctx);
                let mut raws = Vec::with_capacity(len);
                let mut engs = Vec::with_capacity(len);
                for _ in 0..len {
                    let (r, e) = element.decode(schema, reader, ctx, path)?;
                    raws.push(r);
                    engs.push(e);
                }
                Ok((RawValue::Array(raws), EngValue::Array(engs)))
            }
        }
    }

    /// Encodes one engineering value of this type onto `writer`, returning the raw value written
    /// so the container engine can fold it into the dynamic-sizing context for later entries.
    pub fn encode(
        &self,
        schema: &SpaceSystem,
        writer: &mut BitWriter,
        value: &EngValue,
        path: &EntryPath,
    ) -> Result<RawValue, EncodeError> {
        match self {
            ParameterType::Integer(base) => {
                let raw = encode_integer_like(base, false, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ParameterType::Float(base) => {
                let is_float = matches!(base.encoding, DataEncoding::Float { .. });
                let raw = encode_integer_like(base, is_float, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ParameterType::Enumerated { base, labels } => {
                let raw = encode_enumerated(labels, value, path)?;
                let wire = widen_to_encoding(&base.encoding, &raw);
                base.encoding.encode(writer, &wire, path)?;
                Ok(raw)
            }
            ParameterType::Boolean { base, zero_string, one_string } => {
                let raw = encode_boolean(zero_string, one_string, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ParameterType::String(base) => {
                let raw = encode_string(base, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ParameterType::Binary(base) => {
                let EngValue::Bytes(bytes) = value else {
                    return Err(EncodeError::OutOfRange { path: path.clone(), value: "non-binary".into() });
                };
                let raw = RawValue::Bytes(bytes.clone());
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ParameterType::AbsoluteTime { base, .. } => {
                let raw = encode_absolute_time(base, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ParameterType::Array { element_type, dimensions } => {
                let element = schema
                    .parameter_type(*element_type)
                    .expect("Array element type is validated to exist at schema build time");
                let EngValue::Array(items) = value else {
                    return Err(EncodeError::OutOfRange { path: path.clone(), value: "non-array".into() });
                };
                if let Some(ArraySize::Fixed(expected)) = dimensions.first().cloned() {
                    if expected != items.len() {
                        return Err(EncodeError::ArrayLengthMismatch { path: path.clone(), expected, actual: items.len() });
                    }
                }
                let mut raws = Vec::with_capacity(items.len());
                for item in items {
                    raws.push(element.encode(schema, writer, item, path)?);
                }
                Ok(RawValue::Array(raws))
            }
        }
    }
}

/// Resolves an `Array` type's element count: its one declared dimension is either a literal or a
/// reference to an already-decoded integer parameter/argument.
fn array_length(dimensions: &[ArraySize], ctx: &dyn SizeContext) -> usize {
    match dimensions.first() {
        Some(ArraySize::Fixed(n)) => *n,
        Some(ArraySize::DynamicParam(p)) => ctx.resolved_param_uint(*p).unwrap_or(0) as usize,
        Some(ArraySize::DynamicArg(a)) => ctx.resolved_arg_uint(*a).unwrap_or(0) as usize,
        None => 0,
    }
}

/// `Enumerated`/`Boolean` raw values are computed as plain integers above; re-widen them to
/// whatever raw shape (`UInt` vs `Int`) the declared `Integer` encoding expects before handing
/// them to it.
fn widen_to_encoding(encoding: &DataEncoding, raw: &RawValue) -> RawValue {
    let as_i64 = match raw {
        RawValue::Int(v) => *v,
        RawValue::UInt(v) => *v as i64,
        _ => 0,
    };
    match encoding {
        DataEncoding::Integer { signed: crate::encoding::IntegerSigned::TwosComplement, .. } => RawValue::Int(as_i64),
        _ => RawValue::UInt(as_i64 as u64),
    }
}

impl ArgumentType {
    pub fn decode(
        &self,
        schema: &SpaceSystem,
        reader: &mut BitReader<'_>,
        ctx: &dyn SizeContext,
        path: &EntryPath,
    ) -> Result<(RawValue, EngValue), DecodeError> {
        match self {
            ArgumentType::Integer(base) | ArgumentType::Float(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_integer_like(base, raw.clone());
                Ok((raw, eng))
            }
            ArgumentType::Enumerated { base, labels } => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                Ok((raw.clone(), decode_enumerated(labels, raw)))
            }
            ArgumentType::Boolean { base, zero_string, one_string } => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                Ok((raw.clone(), decode_boolean(zero_string, one_string, raw)))
            }
            ArgumentType::String(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = decode_string(base, raw.clone(), path)?;
                Ok((raw, eng))
            }
            ArgumentType::Binary(base) => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                let eng = match &raw {
                    RawValue::Bytes(b) => EngValue::Bytes(b.clone()),
                    _ => unreachable!("Binary encodings always decode to raw bytes"),
                };
                Ok((raw, eng))
            }
            ArgumentType::AbsoluteTime { base, .. } => {
                let raw = base.encoding.decode(reader, ctx, path)?;
                Ok((raw.clone(), decode_absolute_time(base, raw)))
            }
            ArgumentType::Array { element_type, dimensions } => {
                let element = schema
                    .argument_type(*element_type)
                    .expect("Array element type is validated to exist at schema build time");
                let len = array_length(dimensions, ctx);
                let mut raws = Vec::with_capacity(len);
                let mut engs = Vec::with_capacity(len);
                for _ in 0..len {
                    let (r, e) = element.decode(schema, reader, ctx, path)?;
                    raws.push(r);
                    engs.push(e);
                }
                Ok((RawValue::Array(raws), EngValue::Array(engs)))
            }
        }
    }

    pub fn encode(
        &self,
        schema: &SpaceSystem,
        writer: &mut BitWriter,
        value: &EngValue,
        path: &EntryPath,
    ) -> Result<RawValue, EncodeError> {
        match self {
            ArgumentType::Integer(base) => {
                let raw = encode_integer_like(base, false, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ArgumentType::Float(base) => {
                let is_float = matches!(base.encoding, DataEncoding::Float { .. });
                let raw = encode_integer_like(base, is_float, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ArgumentType::Enumerated { base, labels } => {
                let raw = encode_enumerated(labels, value, path)?;
                let wire = widen_to_encoding(&base.encoding, &raw);
                base.encoding.encode(writer, &wire, path)?;
                Ok(raw)
            }
            ArgumentType::Boolean { base, zero_string, one_string } => {
                let raw = encode_boolean(zero_string, one_string, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ArgumentType::String(base) => {
                let raw = encode_string(base, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ArgumentType::Binary(base) => {
                let EngValue::Bytes(bytes) = value else {
                    return Err(EncodeError::OutOfRange { path: path.clone(), value: "non-binary".into() });
                };
                let raw = RawValue::Bytes(bytes.clone());
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ArgumentType::AbsoluteTime { base, .. } => {
                let raw = encode_absolute_time(base, value, path)?;
                base.encoding.encode(writer, &raw, path)?;
                Ok(raw)
            }
            ArgumentType::Array { element_type, dimensions } => {
                let element = schema
                    .argument_type(*element_type)
                    .expect("Array element type is validated to exist at schema build time");
                let EngValue::Array(items) = value else {
                    return Err(EncodeError::OutOfRange { path: path.clone(), value: "non-array".into() });
                };
                if let Some(ArraySize::Fixed(expected)) = dimensions.first().cloned() {
                    if expected != items.len() {
                        return Err(EncodeError::ArrayLengthMismatch { path: path.clone(), expected, actual: items.len() });
                    }
                }
                let mut raws = Vec::with_capacity(items.len());
                for item in items {
                    raws.push(element.encode(schema, writer, item, path)?);
                }
                Ok(RawValue::Array(raws))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::IntegerSigned;

    fn uint_base(name: &str, bits: u32) -> BaseType {
        BaseType {
            name: name.to_string(),
            units: Vec::new(),
            valid_range: None,
            encoding: DataEncoding::Integer { size_in_bits: bits, signed: IntegerSigned::Unsigned },
            calibrator: None,
        }
    }

    #[test]
    fn boolean_decode_yields_declared_truth_strings() {
        assert_eq!(
            decode_boolean("OFF", "ON", RawValue::UInt(0)),
            EngValue::Str("OFF".to_string())
        );
        assert_eq!(
            decode_boolean("OFF", "ON", RawValue::UInt(1)),
            EngValue::Str("ON".to_string())
        );
    }

    #[test]
    fn enum_decode_unknown_raw_carries_no_label() {
        let labels = vec![EnumLabel { value: 1, max_value: 1, label: "ON".into() }];
        let eng = decode_enumerated(&labels, RawValue::UInt(9));
        assert_eq!(eng, EngValue::Enum { raw: 9, label: None });
    }

    #[test]
    fn enum_encode_accepts_label_or_raw() {
        let labels = vec![EnumLabel { value: 1, max_value: 1, label: "ON".into() }];
        let path = EntryPath::default();
        assert_eq!(encode_enumerated(&labels, &EngValue::Str("ON".into()), &path).unwrap(), RawValue::Int(1));
        assert_eq!(encode_enumerated(&labels, &EngValue::Int(1), &path).unwrap(), RawValue::Int(1));
        assert!(encode_enumerated(&labels, &EngValue::Str("OFF".into()), &path).is_err());
    }

    #[test]
    fn integer_round_trip_without_calibration() {
        let base = uint_base("counter", 16);
        let path = EntryPath::default();
        let raw = encode_integer_like(&base, false, &EngValue::Int(1234), &path).unwrap();
        assert_eq!(raw, RawValue::UInt(1234));
        assert_eq!(decode_integer_like(&base, raw), EngValue::Int(1234));
    }

    #[test]
    fn calibrated_integer_round_trip() {
        let mut base = uint_base("voltage_raw", 16);
        base.calibrator = Some(Calibrator::Polynomial(crate::calibration::PolynomialCalibrator {
            terms: vec![(1.0, 0), (2.0, 1)],
        }));
        let path = EntryPath::default();
        let raw = encode_integer_like(&base, false, &EngValue::Float(5.0), &path).unwrap();
        assert_eq!(raw, RawValue::UInt(2));
        let eng = decode_integer_like(&base, raw);
        assert_eq!(eng, EngValue::Float(5.0));
    }

    #[test]
    fn out_of_range_calibrated_value_is_rejected() {
        let mut base = uint_base("temp", 8);
        base.valid_range = Some(ValidRange {
            min: Some(0.0),
            max: Some(100.0),
            min_inclusive: true,
            max_inclusive: true,
            applies_to_calibrated: true,
        });
        let path = EntryPath::default();
        assert!(encode_integer_like(&base, false, &EngValue::Float(200.0), &path).is_err());
    }
}
