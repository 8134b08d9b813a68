// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The container engine: resolves base-container inheritance, selects concrete containers by
//! restriction during decode, and walks entry lists for both decode and encode.
//!
//! This is the one place in the crate where [`crate::types::ParameterType`]/[`crate::types::ArgumentType`]
//! codecs, the [`crate::comparison`] evaluator and the schema's precomputed entry lists meet.

use log::{debug, trace};
use smallvec::SmallVec;

use crate::error::{DecodeError, EncodeError, EntryPath, Error, Result, SchemaError};
use crate::io::{BitReader, BitWriter};
use crate::schema::{
    Container, ContainerId, Entry, MetaCommand, ReferenceLocation, SpaceSystem,
};
use crate::value::{DecodedValue, EngValue, InputMap, ValueMap};

/// Options controlling `decode_packet`.
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    /// When `true` (the default), trusts the schema's precomputed inherited entry order instead
    /// of re-deriving it on every call. There is currently no redundant re-derivation to skip —
    /// [`crate::schema::SchemaBuilder::finish`] already computes it once — but the flag exists so
    /// a future loader-side shortcut has somewhere to plug in without an API break.
    pub trust_entry_order: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { trust_entry_order: true }
    }
}

/// Options controlling `encode_packet`/`encode_command`.
#[derive(Clone, Copy, Debug)]
pub struct EncodeOptions {
    /// When `true` (the default), a trailing partial byte is right-padded with zero bits. When
    /// `false`, a non-byte-aligned result is an error instead.
    pub zero_pad_trailing: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { zero_pad_trailing: true }
    }
}

/// Read access over a [`ValueMap`] for dynamic-size resolution during decode.
struct ScopeSizeContext<'a> {
    schema: &'a SpaceSystem,
    scope: &'a ValueMap,
}

impl crate::encoding::SizeContext for ScopeSizeContext<'_> {
    fn resolved_param_uint(&self, param: crate::schema::ParamId) -> Option<u64> {
        let name = &self.schema.parameter(param)?.name;
        self.scope.get(name)?.raw.as_u64()
    }

    fn resolved_arg_uint(&self, arg: crate::schema::ArgId) -> Option<u64> {
        let name = &self.schema.argument(arg)?.name;
        self.scope.get(name)?.raw.as_u64()
    }
}

// --- decode ----------------------------------------------------------------------------------

/// Decodes `bytes` against `root_container`, selecting concrete child containers by evaluating
/// restriction criteria against already-decoded fields.
pub fn decode_packet(
    schema: &SpaceSystem,
    root_container: &str,
    bytes: &[u8],
    _options: DecodeOptions,
) -> Result<ValueMap> {
    let root_id = schema
        .container_id_by_name(root_container)
        .ok_or_else(|| Error::Decode(DecodeError::UnknownContainer { name: root_container.to_string() }))?;

    let mut reader = BitReader::new(bytes);
    let mut scope = ValueMap::new();
    decode_container(schema, root_id, &mut reader, &mut scope)?;
    Ok(scope)
}

/// Decodes one container's full inherited entry list, then resolves and decodes whichever child
/// container (if any) the scope now selects, repeating until no child matches.
fn decode_container(
    schema: &SpaceSystem,
    container_id: ContainerId,
    reader: &mut BitReader<'_>,
    scope: &mut ValueMap,
) -> Result<()> {
    let container = container_of(schema, container_id);
    let start_bits = reader.position_bits();
    decode_entries(schema, &container.name, &container.inherited_entries, 0, start_bits, reader, scope)?;

    let mut current = container_id;
    let mut already_decoded = container.inherited_entries.len();

    loop {
        let current_container = container_of(schema, current);
        let candidates: Vec<ContainerId> = current_container
            .children
            .iter()
            .copied()
            .filter(|child| {
                let child_container = container_of(schema, *child);
                match &child_container.restriction {
                    Some(restriction) => restriction.is_satisfied(schema, scope),
                    None => false,
                }
            })
            .collect();

        trace!(
            "container '{}': {} candidate children satisfy their restriction",
            current_container.name,
            candidates.len()
        );

        match candidates.as_slice() {
            [] => break,
            [only] => {
                let child_container = container_of(schema, *only);
                debug!("container '{}' selected child '{}'", current_container.name, child_container.name);

                let child_start_bits = reader.position_bits();
                decode_entries(
                    schema,
                    &child_container.name,
                    &child_container.inherited_entries[already_decoded..],
                    already_decoded,
                    child_start_bits,
                    reader,
                    scope,
                )?;
                already_decoded = child_container.inherited_entries.len();
                current = *only;
            }
            _ => {
                let candidates = candidates
                    .iter()
                    .map(|id| container_of(schema, *id).name.clone())
                    .collect();
                return Err(Error::Decode(DecodeError::AmbiguousContainer {
                    base: current_container.name.clone(),
                    candidates,
                }));
            }
        }
    }

    Ok(())
}

fn container_of(schema: &SpaceSystem, id: ContainerId) -> &Container {
    schema.container(id).expect("container ids are only ever produced by a validated SpaceSystem")
}

/// Decodes `entries` in order, seeking the reader for explicit `locationInContainerInBits`
/// overrides, recursing into `ContainerRef` entries, and verifying `FixedValue` entries.
///
/// `container_start_bits` anchors `ReferenceLocation::ContainerStart` offsets: the bit position
/// the reader was at when this particular container (or nested include) began decoding.
fn decode_entries(
    schema: &SpaceSystem,
    container_name: &str,
    entries: &[Entry],
    start_index: usize,
    container_start_bits: u64,
    reader: &mut BitReader<'_>,
    scope: &mut ValueMap,
) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        let entry_index = start_index + i;

        match entry {
            Entry::ParameterRef { param, location } => {
                let parameter = schema
                    .parameter(*param)
                    .expect("parameter ids are only ever produced by a validated SpaceSystem");
                let path = EntryPath {
                    container: container_name.to_string(),
                    entry_index,
                    name: Some(parameter.name.clone()),
                };

                if let Some(location) = location {
                    let target = match location.reference {
                        ReferenceLocation::ContainerStart => {
                            (container_start_bits as i64 + location.offset_bits) as u64
                        }
                        ReferenceLocation::PreviousEntry => {
                            (reader.position_bits() as i64 + location.offset_bits) as u64
                        }
                    };
                    trace!("seeking to bit {target} for '{}'", parameter.name);
                    reader.seek_bits(target);
                }

                trace!("decoding '{}' at bit {}", parameter.name, reader.position_bits());

                let param_type = schema
                    .parameter_type(parameter.param_type)
                    .expect("parameter type ids are only ever produced by a validated SpaceSystem");
                let ctx = ScopeSizeContext { schema, scope };
                let (raw, engineering) = param_type
                    .decode(schema, reader, &ctx, &path)
                    .map_err(Error::Decode)?;
                scope.insert(parameter.name.clone(), DecodedValue { raw, engineering });
            }

            Entry::ArgumentRef { .. } => {
                // Argument entries belong to a meta-command's entry list; a container referencing
                // one is structurally valid XTCE this engine does not give runtime behavior to.
                return Err(Error::Schema(SchemaError::UnsupportedConstruct {
                    what: "ArgumentRefEntry in a container",
                    context: container_name.to_string(),
                }));
            }

            Entry::ContainerRef { container, include_condition } => {
                if let Some(condition) = include_condition {
                    if !condition.is_satisfied(schema, scope) {
                        trace!("skipping include of container {:?}: include condition not satisfied", container);
                        continue;
                    }
                }
                decode_container(schema, *container, reader, scope)?;
            }

            Entry::FixedValue { size_in_bits, value } => {
                let path = EntryPath { container: container_name.to_string(), entry_index, name: None };
                let actual = reader
                    .read_bytes(*size_in_bits)
                    .map_err(|_| DecodeError::UnexpectedEndOfInput {
                        path: path.clone(),
                        needed_bits: *size_in_bits,
                        available_bits: reader.bits_left(),
                    })
                    .map_err(Error::Decode)?;
                if &actual != value {
                    return Err(Error::Decode(DecodeError::FixedValueMismatch {
                        path,
                        expected: value.clone(),
                        actual,
                    }));
                }
            }
        }
    }
    Ok(())
}

// --- encode ----------------------------------------------------------------------------------

/// Encodes `values` against `container_name`, auto-populating any ancestor restriction fields the
/// caller left implicit and verifying every restriction on the inheritance chain holds.
pub fn encode_packet(
    schema: &SpaceSystem,
    container_name: &str,
    values: &InputMap,
    options: EncodeOptions,
) -> Result<Vec<u8>> {
    let container_id = schema
        .container_id_by_name(container_name)
        .ok_or_else(|| Error::Encode(EncodeError::UnknownTarget { name: container_name.to_string() }))?;
    let container = container_of(schema, container_id);

    let mut merged = values.clone();
    let chain = ancestor_chain(schema, container_id);
    for &id in &chain {
        if let Some(restriction) = &container_of(schema, id).restriction {
            auto_populate_restriction(schema, restriction, &mut merged);
        }
    }
    precompute_dynamic_sizes(schema, &container.inherited_entries, &mut merged);

    let mut writer = BitWriter::new();
    let mut scope = ValueMap::new();
    encode_entries(schema, &container.name, &container.inherited_entries, 0, 0, &merged, &mut writer, &mut scope)?;

    for &id in &chain {
        let c = container_of(schema, id);
        if let Some(restriction) = &c.restriction {
            if !restriction.is_satisfied(schema, &scope) {
                return Err(Error::Encode(EncodeError::RestrictionNotSatisfiable { container: c.name.clone() }));
            }
        }
    }

    finish_buffer(writer, options)
}

/// Encodes `values` against a meta-command, whose entry list is built from `ArgumentRefEntry`s
/// (argument values standing in for parameter values) and `FixedValueEntry`s, sharing the
/// container engine's entry-walking logic.
pub fn encode_command(
    schema: &SpaceSystem,
    meta_command_name: &str,
    values: &InputMap,
    options: EncodeOptions,
) -> Result<Vec<u8>> {
    let meta_command_id = schema
        .meta_command_id_by_name(meta_command_name)
        .ok_or_else(|| Error::Encode(EncodeError::UnknownTarget { name: meta_command_name.to_string() }))?;
    let meta_command: &MetaCommand = schema
        .meta_command(meta_command_id)
        .expect("meta-command ids are only ever produced by a validated SpaceSystem");

    let mut merged = values.clone();
    precompute_dynamic_sizes(schema, &meta_command.inherited_entries, &mut merged);

    let mut writer = BitWriter::new();
    let mut scope = ValueMap::new();
    encode_entries(schema, &meta_command.name, &meta_command.inherited_entries, 0, 0, &merged, &mut writer, &mut scope)?;

    finish_buffer(writer, options)
}

fn finish_buffer(writer: BitWriter, options: EncodeOptions) -> Result<Vec<u8>> {
    let leftover = (writer.position_bits() % 8) as u32;
    if leftover != 0 && !options.zero_pad_trailing {
        return Err(Error::Encode(EncodeError::TrailingBitsNotByteAligned { leftover_bits: 8 - leftover }));
    }
    Ok(writer.finish())
}

/// Returns the containers from the root of `container_id`'s inheritance chain down to (and
/// including) `container_id` itself. Most XTCE inheritance chains are a handful of levels deep,
/// so this stays on the stack in the common case.
fn ancestor_chain(schema: &SpaceSystem, container_id: ContainerId) -> SmallVec<[ContainerId; 8]> {
    let mut chain = SmallVec::new();
    let mut current = Some(container_id);
    while let Some(id) = current {
        chain.push(id);
        current = container_of(schema, id).base;
    }
    chain.reverse();
    chain
}

/// For any `Eq` comparison in `restriction` whose parameter isn't already present in `merged`,
/// inserts the literal comparand as an engineering value so the entry walk finds it.
fn auto_populate_restriction(
    schema: &SpaceSystem,
    restriction: &crate::comparison::ComparisonList,
    merged: &mut InputMap,
) {
    for cmp in &restriction.0 {
        if cmp.op != crate::comparison::CompareOp::Eq {
            continue;
        }
        let Some(parameter) = schema.parameter(cmp.param) else { continue };
        if merged.contains_key(&parameter.name) {
            continue;
        }
        debug!("auto-populating restriction field '{}' = '{}'", parameter.name, cmp.value);
        merged.insert(parameter.name.clone(), parse_literal(&cmp.value));
    }
}

/// Parses a restriction's textual comparand the same way the comparison evaluator would compare
/// against it: integer, then float, then boolean, else a bare string/enum label.
fn parse_literal(text: &str) -> EngValue {
    if let Ok(i) = text.parse::<i64>() {
        return EngValue::Int(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return EngValue::Float(f);
    }
    if matches!(text, "true" | "True" | "TRUE") {
        return EngValue::Bool(true);
    }
    if matches!(text, "false" | "False" | "FALSE") {
        return EngValue::Bool(false);
    }
    EngValue::Str(text.to_string())
}

/// Derives any dynamic size/length field the caller left out of `merged` from the length of the
/// value it sizes: a `String`/`Binary` `Dynamic` size parameter from its sized field's byte
/// length, or an `Array`'s dynamic dimension parameter/argument from its element count.
fn precompute_dynamic_sizes(schema: &SpaceSystem, entries: &[Entry], merged: &mut InputMap) {
    for entry in entries {
        match entry {
            Entry::ParameterRef { param, .. } => {
                let parameter = schema.parameter(*param).expect("validated reference");
                let Some(value) = merged.get(&parameter.name) else { continue };
                let param_type = schema.parameter_type(parameter.param_type).expect("validated reference");
                if let Some((size_name, len)) = dynamic_size_of_parameter(schema, param_type, value) {
                    merged.entry(size_name).or_insert(EngValue::Int(len as i64));
                }
            }
            Entry::ArgumentRef { arg } => {
                let argument = schema.argument(*arg).expect("validated reference");
                let Some(value) = merged.get(&argument.name) else { continue };
                let arg_type = schema.argument_type(argument.arg_type).expect("validated reference");
                if let Some((size_name, len)) = dynamic_size_of_argument(schema, arg_type, value) {
                    merged.entry(size_name).or_insert(EngValue::Int(len as i64));
                }
            }
            Entry::ContainerRef { .. } | Entry::FixedValue { .. } => {}
        }
    }
}

fn dynamic_size_of_parameter(
    schema: &SpaceSystem,
    param_type: &crate::types::ParameterType,
    value: &EngValue,
) -> Option<(String, usize)> {
    use crate::encoding::{BinarySizing, DataEncoding, SizeIsOf, StringSizing};
    use crate::types::{ArraySize, ParameterType};

    match param_type {
        ParameterType::String(base) => {
            let DataEncoding::String { sizing: StringSizing::Dynamic { size_param, size_is_of }, .. } =
                &base.encoding
            else {
                return None;
            };
            let text = value.as_str()?;
            let len = match size_is_of {
                SizeIsOf::StringData => text.len(),
                SizeIsOf::StringLengthInCharacters => text.chars().count(),
            };
            Some((schema.parameter(*size_param)?.name.clone(), len))
        }
        ParameterType::Binary(base) => {
            let DataEncoding::Binary { sizing: BinarySizing::Dynamic { size_param } } = &base.encoding else {
                return None;
            };
            let EngValue::Bytes(bytes) = value else { return None };
            Some((schema.parameter(*size_param)?.name.clone(), bytes.len()))
        }
        ParameterType::Array { dimensions, .. } => {
            let EngValue::Array(items) = value else { return None };
            match dimensions.first() {
                Some(ArraySize::DynamicParam(p)) => Some((schema.parameter(*p)?.name.clone(), items.len())),
                _ => None,
            }
        }
        _ => None,
    }
}

fn dynamic_size_of_argument(
    schema: &SpaceSystem,
    arg_type: &crate::types::ArgumentType,
    value: &EngValue,
) -> Option<(String, usize)> {
    use crate::encoding::{BinarySizing, DataEncoding, SizeIsOf, StringSizing};
    use crate::types::{ArgumentType, ArraySize};

    match arg_type {
        ArgumentType::String(base) => {
            let DataEncoding::String { sizing: StringSizing::Dynamic { size_param, size_is_of }, .. } =
                &base.encoding
            else {
                return None;
            };
            let text = value.as_str()?;
            let len = match size_is_of {
                SizeIsOf::StringData => text.len(),
                SizeIsOf::StringLengthInCharacters => text.chars().count(),
            };
            Some((schema.parameter(*size_param)?.name.clone(), len))
        }
        ArgumentType::Binary(base) => {
            let DataEncoding::Binary { sizing: BinarySizing::Dynamic { size_param } } = &base.encoding else {
                return None;
            };
            let EngValue::Bytes(bytes) = value else { return None };
            Some((schema.parameter(*size_param)?.name.clone(), bytes.len()))
        }
        ArgumentType::Array { dimensions, .. } => {
            let EngValue::Array(items) = value else { return None };
            match dimensions.first() {
                Some(ArraySize::DynamicArg(a)) => Some((schema.argument(*a)?.name.clone(), items.len())),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Encodes `entries` in order, writing each parameter/argument's value via its type and recording
/// the raw+engineering pair into `scope` so later restriction verification and dynamic-size
/// lookups (for entries sized by an earlier one) can see it.
fn encode_entries(
    schema: &SpaceSystem,
    container_name: &str,
    entries: &[Entry],
    start_index: usize,
    container_start_bits: u64,
    merged: &InputMap,
    writer: &mut BitWriter,
    scope: &mut ValueMap,
) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        let entry_index = start_index + i;

        match entry {
            Entry::ParameterRef { param, location } => {
                let parameter = schema.parameter(*param).expect("validated reference");
                let path = EntryPath {
                    container: container_name.to_string(),
                    entry_index,
                    name: Some(parameter.name.clone()),
                };

                if let Some(location) = location {
                    seek_writer(writer, location, container_start_bits);
                }

                let value = merged
                    .get(&parameter.name)
                    .ok_or_else(|| EncodeError::MissingValue { path: path.clone() })
                    .map_err(Error::Encode)?;
                let param_type = schema.parameter_type(parameter.param_type).expect("validated reference");
                let raw = param_type.encode(schema, writer, value, &path).map_err(Error::Encode)?;
                scope.insert(parameter.name.clone(), DecodedValue { raw, engineering: value.clone() });
            }

            Entry::ArgumentRef { arg } => {
                let argument = schema.argument(*arg).expect("validated reference");
                let path = EntryPath {
                    container: container_name.to_string(),
                    entry_index,
                    name: Some(argument.name.clone()),
                };

                let value = merged
                    .get(&argument.name)
                    .ok_or_else(|| EncodeError::MissingValue { path: path.clone() })
                    .map_err(Error::Encode)?;
                let arg_type = schema.argument_type(argument.arg_type).expect("validated reference");
                let raw = arg_type.encode(schema, writer, value, &path).map_err(Error::Encode)?;
                scope.insert(argument.name.clone(), DecodedValue { raw, engineering: value.clone() });
            }

            Entry::ContainerRef { container, include_condition } => {
                if let Some(condition) = include_condition {
                    if !condition.is_satisfied(schema, scope) {
                        continue;
                    }
                }
                let referenced = container_of(schema, *container);
                let child_start_bits = writer.position_bits();
                encode_entries(
                    schema,
                    &referenced.name,
                    &referenced.inherited_entries,
                    0,
                    child_start_bits,
                    merged,
                    writer,
                    scope,
                )?;
            }

            Entry::FixedValue { value, .. } => {
                writer.write_bytes(value).expect("byte writes never exceed an 8-bit width");
            }
        }
    }
    Ok(())
}

fn seek_writer(writer: &mut BitWriter, location: &crate::schema::Location, container_start_bits: u64) {
    let target = match location.reference {
        ReferenceLocation::ContainerStart => (container_start_bits as i64 + location.offset_bits) as u64,
        ReferenceLocation::PreviousEntry => (writer.position_bits() as i64 + location.offset_bits) as u64,
    };
    writer.seek_bits(target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::{CompareOp, Comparison, ComparisonList};
    use crate::encoding::{DataEncoding, IntegerSigned};
    use crate::schema::SchemaBuilder;
    use crate::types::{BaseType, ParameterType};

    fn uint_type(bits: u32) -> ParameterType {
        ParameterType::Integer(BaseType {
            name: String::new(),
            units: Vec::new(),
            valid_range: None,
            encoding: DataEncoding::Integer { size_in_bits: bits, signed: IntegerSigned::Unsigned },
            calibrator: None,
        })
    }

    fn build_scenario_1() -> SpaceSystem {
        let mut b = SchemaBuilder::new();
        let u16_ty = b.add_parameter_type("u16", uint_type(16)).unwrap();
        let x = b.add_parameter("x", u16_ty).unwrap();
        b.add_container("Root", None, None, vec![Entry::ParameterRef { param: x, location: None }]).unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn unsigned_round_trip_scenario() {
        let schema = build_scenario_1();
        let mut values = InputMap::new();
        values.insert("x".to_string(), EngValue::Int(0x1234));
        let bytes = encode_packet(&schema, "Root", &values, EncodeOptions::default()).unwrap();
        assert_eq!(bytes, vec![0x12, 0x34]);

        let decoded = decode_packet(&schema, "Root", &bytes, DecodeOptions::default()).unwrap();
        assert_eq!(decoded.get("x").unwrap().engineering, EngValue::Int(0x1234));
    }

    fn build_scenario_4() -> (SpaceSystem, crate::schema::ParamId) {
        let mut b = SchemaBuilder::new();
        let u8_ty = b.add_parameter_type("u8", uint_type(8)).unwrap();
        let type_id = b.add_parameter("type_id", u8_ty).unwrap();
        let payload = b.add_parameter("payload", u8_ty).unwrap();

        let root = b
            .add_container("Root", None, None, vec![Entry::ParameterRef { param: type_id, location: None }])
            .unwrap();
        b.add_container(
            "C1",
            Some(root),
            Some(ComparisonList(vec![Comparison {
                param: type_id,
                op: CompareOp::Eq,
                value: "1".to_string(),
                use_calibrated_value: true,
            }])),
            vec![Entry::ParameterRef { param: payload, location: None }],
        )
        .unwrap();
        b.add_container(
            "C2",
            Some(root),
            Some(ComparisonList(vec![Comparison {
                param: type_id,
                op: CompareOp::Eq,
                value: "2".to_string(),
                use_calibrated_value: true,
            }])),
            vec![],
        )
        .unwrap();

        (b.finish().unwrap(), type_id)
    }

    #[test]
    fn enum_dispatch_via_restriction_selects_matching_child() {
        let (schema, _) = build_scenario_4();
        let decoded = decode_packet(&schema, "Root", &[0x01, 0xAA], DecodeOptions::default()).unwrap();
        assert_eq!(decoded.get("type_id").unwrap().engineering, EngValue::Int(1));
        assert_eq!(decoded.get("payload").unwrap().engineering, EngValue::Int(0xAA));
    }

    #[test]
    fn restriction_is_auto_populated_on_encode() {
        let (schema, _) = build_scenario_4();
        let mut values = InputMap::new();
        values.insert("payload".to_string(), EngValue::Int(0xAA));
        // type_id is never supplied; C1's restriction (type_id == 1) auto-populates it.
        let bytes = encode_packet(&schema, "C1", &values, EncodeOptions::default()).unwrap();
        assert_eq!(bytes, vec![0x01, 0xAA]);
    }

    #[test]
    fn fixed_value_mismatch_is_rejected() {
        let mut b = SchemaBuilder::new();
        b.add_container(
            "Root",
            None,
            None,
            vec![Entry::FixedValue { size_in_bits: 16, value: vec![0xCA, 0xFE] }],
        )
        .unwrap();
        let schema = b.finish().unwrap();

        assert!(decode_packet(&schema, "Root", &[0xCA, 0xFE], DecodeOptions::default()).is_ok());
        assert!(decode_packet(&schema, "Root", &[0xDE, 0xAD], DecodeOptions::default()).is_err());
    }

    #[test]
    fn dynamic_string_length_round_trips() {
        let mut b = SchemaBuilder::new();
        let u8_ty = b.add_parameter_type("u8", uint_type(8)).unwrap();
        let len = b.add_parameter("len", u8_ty).unwrap();

        let str_ty = b
            .add_parameter_type(
                "name_ty",
                ParameterType::String(BaseType {
                    name: String::new(),
                    units: Vec::new(),
                    valid_range: None,
                    encoding: DataEncoding::String {
                        charset: crate::encoding::CharSet::UsAscii,
                        sizing: crate::encoding::StringSizing::Dynamic {
                            size_param: len,
                            size_is_of: crate::encoding::SizeIsOf::StringData,
                        },
                    },
                    calibrator: None,
                }),
            )
            .unwrap();
        let name = b.add_parameter("name", str_ty).unwrap();

        b.add_container(
            "Root",
            None,
            None,
            vec![
                Entry::ParameterRef { param: len, location: None },
                Entry::ParameterRef { param: name, location: None },
            ],
        )
        .unwrap();
        let schema = b.finish().unwrap();

        let decoded = decode_packet(&schema, "Root", b"\x03ABC", DecodeOptions::default()).unwrap();
        assert_eq!(decoded.get("len").unwrap().engineering, EngValue::Int(3));
        assert_eq!(decoded.get("name").unwrap().engineering, EngValue::Str("ABC".to_string()));

        let mut values = InputMap::new();
        values.insert("name".to_string(), EngValue::Str("ABC".to_string()));
        let bytes = encode_packet(&schema, "Root", &values, EncodeOptions::default()).unwrap();
        assert_eq!(bytes, b"\x03ABC");
    }

    #[test]
    fn zero_pad_trailing_disabled_rejects_unaligned_packet() {
        let mut b = SchemaBuilder::new();
        let u4_ty = b.add_parameter_type("u4", uint_type(4)).unwrap();
        let x = b.add_parameter("x", u4_ty).unwrap();
        b.add_container("Root", None, None, vec![Entry::ParameterRef { param: x, location: None }]).unwrap();
        let schema = b.finish().unwrap();

        let mut values = InputMap::new();
        values.insert("x".to_string(), EngValue::Int(5));
        assert!(encode_packet(&schema, "Root", &values, EncodeOptions { zero_pad_trailing: false }).is_err());
        assert!(encode_packet(&schema, "Root", &values, EncodeOptions { zero_pad_trailing: true }).is_ok());
    }
}
