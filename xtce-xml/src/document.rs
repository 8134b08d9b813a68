// xtce-xml
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The raw wire shape of an XTCE 1.3 document, deserialized with `quick_xml::de` straight off
//! `serde::Deserialize` impls instead of a hand-written event loop.
//!
//! Attributes use quick-xml's `@name` convention, text content uses `$text`, and a set's mixed
//! children (a `ParameterTypeSet` holding `IntegerParameterType`, `FloatParameterType`, ... in
//! document order) use the `$value` convention with an externally-tagged enum whose variant
//! names match the element tag names. [`crate::build`] turns this tree into schema entities;
//! this module only mirrors the document's shape.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct XtceDocument {
    #[serde(rename = "SpaceSystem")]
    pub space_system: SpaceSystemXml,
}

#[derive(Debug, Deserialize, Default)]
pub struct SpaceSystemXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "TelemetryMetaData", default)]
    pub telemetry_meta_data: Option<TelemetryMetaDataXml>,
    #[serde(rename = "CommandMetaData", default)]
    pub command_meta_data: Option<CommandMetaDataXml>,
    /// Structurally valid, semantically inert: accepted, logged, dropped.
    #[serde(rename = "AlgorithmSet", default)]
    pub algorithm_set: Option<serde::de::IgnoredAny>,
    #[serde(rename = "StreamSet", default)]
    pub stream_set: Option<serde::de::IgnoredAny>,
    #[serde(rename = "MessageSet", default)]
    pub message_set: Option<serde::de::IgnoredAny>,
    #[serde(rename = "ServiceSet", default)]
    pub service_set: Option<serde::de::IgnoredAny>,
    #[serde(rename = "Aliases", default)]
    pub aliases: Option<serde::de::IgnoredAny>,
    #[serde(rename = "SpaceSystem", default)]
    pub children: Vec<SpaceSystemXml>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TelemetryMetaDataXml {
    #[serde(rename = "ParameterTypeSet", default)]
    pub parameter_type_set: Option<ParameterTypeSetXml>,
    #[serde(rename = "ParameterSet", default)]
    pub parameter_set: Option<ParameterSetXml>,
    #[serde(rename = "ContainerSet", default)]
    pub container_set: Option<ContainerSetXml>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CommandMetaDataXml {
    #[serde(rename = "ArgumentTypeSet", default)]
    pub argument_type_set: Option<ArgumentTypeSetXml>,
    #[serde(rename = "MetaCommandSet", default)]
    pub meta_command_set: Option<MetaCommandSetXml>,
}

// --- parameter/argument type sets --------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct ParameterTypeSetXml {
    #[serde(rename = "$value", default)]
    pub types: Vec<ParameterTypeKindXml>,
}

#[derive(Debug, Deserialize)]
pub enum ParameterTypeKindXml {
    IntegerParameterType(IntegerTypeXml),
    FloatParameterType(FloatTypeXml),
    EnumeratedParameterType(EnumeratedTypeXml),
    BooleanParameterType(BooleanTypeXml),
    StringParameterType(StringTypeXml),
    BinaryParameterType(BinaryTypeXml),
    AbsoluteTimeParameterType(AbsoluteTimeTypeXml),
    ArrayParameterType(ArrayTypeXml),
    /// Unsupported; the document is accepted and this entry is dropped with a warning.
    AggregateParameterType(serde::de::IgnoredAny),
    RelativeTimeParameterType(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize, Default)]
pub struct ArgumentTypeSetXml {
    #[serde(rename = "$value", default)]
    pub types: Vec<ArgumentTypeKindXml>,
}

#[derive(Debug, Deserialize)]
pub enum ArgumentTypeKindXml {
    IntegerArgumentType(IntegerTypeXml),
    FloatArgumentType(FloatTypeXml),
    EnumeratedArgumentType(EnumeratedTypeXml),
    BooleanArgumentType(BooleanTypeXml),
    StringArgumentType(StringTypeXml),
    BinaryArgumentType(BinaryTypeXml),
    AbsoluteTimeArgumentType(AbsoluteTimeTypeXml),
    ArrayArgumentType(ArrayTypeXml),
    AggregateArgumentType(serde::de::IgnoredAny),
    RelativeTimeArgumentType(serde::de::IgnoredAny),
}

// --- shared type bodies --------------------------------------------------------------------
//
// ParameterType and ArgumentType are structurally parallel in XTCE; these bodies are reused for
// both a `*ParameterType` and the matching `*ArgumentType` element.

#[derive(Debug, Deserialize)]
pub struct IntegerTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "IntegerDataEncoding")]
    pub encoding: IntegerEncodingXml,
    #[serde(rename = "ValidRange", default)]
    pub valid_range: Option<ValidRangeXml>,
    #[serde(rename = "ValidRangeSet", default)]
    pub valid_range_set: Option<ValidRangeSetXml>,
    #[serde(rename = "@validRangeAppliesToCalibrated", default)]
    pub valid_range_applies_to_calibrated: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FloatTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "FloatDataEncoding", default)]
    pub float_encoding: Option<FloatEncodingXml>,
    #[serde(rename = "IntegerDataEncoding", default)]
    pub integer_encoding: Option<IntegerEncodingXml>,
    #[serde(rename = "ValidRange", default)]
    pub valid_range: Option<ValidRangeXml>,
    #[serde(rename = "ValidRangeSet", default)]
    pub valid_range_set: Option<ValidRangeSetXml>,
    #[serde(rename = "@validRangeAppliesToCalibrated", default)]
    pub valid_range_applies_to_calibrated: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EnumeratedTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "IntegerDataEncoding")]
    pub encoding: IntegerEncodingXml,
    #[serde(rename = "EnumerationList")]
    pub enumeration_list: EnumerationListXml,
}

#[derive(Debug, Deserialize)]
pub struct BooleanTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@zeroStringValue", default = "default_false_string")]
    pub zero_string_value: String,
    #[serde(rename = "@oneStringValue", default = "default_true_string")]
    pub one_string_value: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "IntegerDataEncoding", default)]
    pub encoding: Option<IntegerEncodingXml>,
}

fn default_false_string() -> String {
    "False".to_string()
}

fn default_true_string() -> String {
    "True".to_string()
}

#[derive(Debug, Deserialize)]
pub struct StringTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "StringDataEncoding")]
    pub encoding: StringEncodingXml,
}

#[derive(Debug, Deserialize)]
pub struct BinaryTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "BinaryDataEncoding")]
    pub encoding: BinaryEncodingXml,
}

#[derive(Debug, Deserialize)]
pub struct AbsoluteTimeTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "UnitSet", default)]
    pub unit_set: Option<UnitSetXml>,
    #[serde(rename = "Encoding", default)]
    pub encoding: Option<AbsoluteTimeEncodingXml>,
    #[serde(rename = "ReferenceTime", default)]
    pub reference_time: Option<ReferenceTimeXml>,
}

#[derive(Debug, Deserialize)]
pub struct ArrayTypeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@arrayTypeRef")]
    pub array_type_ref: String,
    #[serde(rename = "DimensionList", default)]
    pub dimension_list: Option<DimensionListXml>,
}

// --- encoding / calibration / units / valid range -----------------------------------------

#[derive(Debug, Deserialize)]
pub struct IntegerEncodingXml {
    #[serde(rename = "@sizeInBits", default = "default_size_8")]
    pub size_in_bits: u32,
    #[serde(rename = "@encoding", default = "default_unsigned")]
    pub encoding: String,
    #[serde(rename = "DefaultCalibrator", default)]
    pub default_calibrator: Option<CalibratorXml>,
}

fn default_size_8() -> u32 {
    8
}

fn default_unsigned() -> String {
    "unsigned".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FloatEncodingXml {
    #[serde(rename = "@sizeInBits", default = "default_size_32")]
    pub size_in_bits: u32,
    #[serde(rename = "DefaultCalibrator", default)]
    pub default_calibrator: Option<CalibratorXml>,
}

fn default_size_32() -> u32 {
    32
}

#[derive(Debug, Deserialize)]
pub struct AbsoluteTimeEncodingXml {
    #[serde(rename = "IntegerDataEncoding", default)]
    pub integer_encoding: Option<IntegerEncodingXml>,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceTimeXml {
    #[serde(rename = "Epoch", default)]
    pub epoch: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalibratorXml {
    #[serde(rename = "PolynomialCalibrator")]
    pub polynomial: PolynomialCalibratorXml,
}

#[derive(Debug, Deserialize, Default)]
pub struct PolynomialCalibratorXml {
    #[serde(rename = "Term", default)]
    pub term: Vec<TermXml>,
}

#[derive(Debug, Deserialize)]
pub struct TermXml {
    #[serde(rename = "@coefficient")]
    pub coefficient: f64,
    #[serde(rename = "@exponent", default)]
    pub exponent: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UnitSetXml {
    #[serde(rename = "Unit", default)]
    pub unit: Vec<UnitXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitXml {
    #[serde(rename = "$text", default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidRangeXml {
    #[serde(rename = "@minInclusive", default)]
    pub min_inclusive: Option<f64>,
    #[serde(rename = "@maxInclusive", default)]
    pub max_inclusive: Option<f64>,
    #[serde(rename = "@minExclusive", default)]
    pub min_exclusive: Option<f64>,
    #[serde(rename = "@maxExclusive", default)]
    pub max_exclusive: Option<f64>,
    #[serde(rename = "@validRangeAppliesToCalibrated", default)]
    pub applies_to_calibrated: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ValidRangeSetXml {
    #[serde(rename = "ValidRange", default)]
    pub valid_range: Vec<ValidRangeXml>,
}

// --- string / binary encoding sizing ---------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StringEncodingXml {
    #[serde(rename = "@encoding", default = "default_utf8")]
    pub charset: String,
    #[serde(rename = "SizeInBits", default)]
    pub size_in_bits: Option<StringSizeInBitsXml>,
    #[serde(rename = "TerminationChar", default)]
    pub termination_char: Option<String>,
}

fn default_utf8() -> String {
    "UTF-8".to_string()
}

#[derive(Debug, Deserialize)]
pub struct StringSizeInBitsXml {
    #[serde(rename = "Fixed", default)]
    pub fixed: Option<FixedIntXml>,
    #[serde(rename = "Variable", default)]
    pub variable: Option<VariableStringSizeXml>,
}

#[derive(Debug, Deserialize)]
pub struct FixedIntXml {
    #[serde(rename = "FixedValue")]
    pub fixed_value: u32,
}

#[derive(Debug, Deserialize)]
pub struct VariableStringSizeXml {
    #[serde(rename = "DynamicValue")]
    pub dynamic_value: DynamicValueXml,
    #[serde(rename = "@sizeInBitsIsOf", default = "default_size_is_of")]
    pub size_in_bits_is_of: String,
}

fn default_size_is_of() -> String {
    "stringData".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DynamicValueXml {
    #[serde(rename = "ParameterInstanceRef")]
    pub parameter_instance_ref: ParameterInstanceRefXml,
}

#[derive(Debug, Deserialize)]
pub struct ParameterInstanceRefXml {
    #[serde(rename = "@parameterRef")]
    pub parameter_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct BinaryEncodingXml {
    #[serde(rename = "SizeInBits")]
    pub size_in_bits: BinarySizeInBitsXml,
}

#[derive(Debug, Deserialize)]
pub struct BinarySizeInBitsXml {
    #[serde(rename = "FixedValue", default)]
    pub fixed_value: Option<u32>,
    #[serde(rename = "DynamicValue", default)]
    pub dynamic_value: Option<DynamicValueXml>,
}

// --- enumeration / dimension list -------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct EnumerationListXml {
    #[serde(rename = "Enumeration", default)]
    pub enumeration: Vec<EnumerationXml>,
}

#[derive(Debug, Deserialize)]
pub struct EnumerationXml {
    #[serde(rename = "@value")]
    pub value: i64,
    #[serde(rename = "@maxValue", default)]
    pub max_value: Option<i64>,
    #[serde(rename = "@label")]
    pub label: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct DimensionListXml {
    #[serde(rename = "Dimension", default)]
    pub dimension: Vec<DimensionXml>,
}

#[derive(Debug, Deserialize)]
pub struct DimensionXml {
    #[serde(rename = "StartingIndex", default)]
    pub starting_index: Option<IndexValueXml>,
    #[serde(rename = "EndingIndex", default)]
    pub ending_index: Option<IndexValueXml>,
}

#[derive(Debug, Deserialize)]
pub struct IndexValueXml {
    #[serde(rename = "FixedValue", default)]
    pub fixed_value: Option<i64>,
    #[serde(rename = "DynamicValue", default)]
    pub dynamic_value: Option<DynamicValueXml>,
}

// --- parameter / container sets ---------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct ParameterSetXml {
    #[serde(rename = "Parameter", default)]
    pub parameter: Vec<ParameterXml>,
}

#[derive(Debug, Deserialize)]
pub struct ParameterXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@parameterTypeRef")]
    pub parameter_type_ref: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ContainerSetXml {
    #[serde(rename = "SequenceContainer", default)]
    pub sequence_container: Vec<SequenceContainerXml>,
}

#[derive(Debug, Deserialize)]
pub struct SequenceContainerXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "EntryList", default)]
    pub entry_list: Option<EntryListXml>,
    #[serde(rename = "BaseContainer", default)]
    pub base_container: Option<BaseContainerXml>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EntryListXml {
    #[serde(rename = "$value", default)]
    pub entries: Vec<EntryKindXml>,
}

#[derive(Debug, Deserialize)]
pub enum EntryKindXml {
    ParameterRefEntry(ParameterRefEntryXml),
    ContainerRefEntry(ContainerRefEntryXml),
    ArgumentRefEntry(ArgumentRefEntryXml),
    FixedValueEntry(FixedValueEntryXml),
}

#[derive(Debug, Deserialize)]
pub struct ParameterRefEntryXml {
    #[serde(rename = "@parameterRef")]
    pub parameter_ref: String,
    #[serde(rename = "LocationInContainerInBits", default)]
    pub location: Option<LocationXml>,
}

#[derive(Debug, Deserialize)]
pub struct LocationXml {
    #[serde(rename = "@referenceLocation", default = "default_previous_entry")]
    pub reference_location: String,
    #[serde(rename = "FixedValue")]
    pub fixed_value: i64,
}

fn default_previous_entry() -> String {
    "previousEntry".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ContainerRefEntryXml {
    #[serde(rename = "@containerRef")]
    pub container_ref: String,
    #[serde(rename = "IncludeCondition", default)]
    pub include_condition: Option<ComparisonListWrapperXml>,
}

#[derive(Debug, Deserialize)]
pub struct ArgumentRefEntryXml {
    #[serde(rename = "@argumentRef")]
    pub argument_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct FixedValueEntryXml {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@sizeInBits")]
    pub size_in_bits: u32,
    #[serde(rename = "@binaryValue")]
    pub binary_value: String,
}

#[derive(Debug, Deserialize)]
pub struct BaseContainerXml {
    #[serde(rename = "@containerRef")]
    pub container_ref: String,
    #[serde(rename = "RestrictionCriteria", default)]
    pub restriction_criteria: Option<ComparisonListWrapperXml>,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonListWrapperXml {
    #[serde(rename = "Comparison", default)]
    pub comparison: Vec<ComparisonXml>,
    #[serde(rename = "ComparisonList", default)]
    pub comparison_list: Option<ComparisonListInnerXml>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ComparisonListInnerXml {
    #[serde(rename = "Comparison", default)]
    pub comparison: Vec<ComparisonXml>,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonXml {
    #[serde(rename = "@parameterRef")]
    pub parameter_ref: String,
    #[serde(rename = "@value")]
    pub value: String,
    #[serde(rename = "@comparisonOperator", default = "default_eq")]
    pub comparison_operator: String,
    #[serde(rename = "@useCalibratedValue", default = "default_true_bool")]
    pub use_calibrated_value: bool,
}

fn default_eq() -> String {
    "==".to_string()
}

fn default_true_bool() -> bool {
    true
}

// --- command metadata ---------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct MetaCommandSetXml {
    #[serde(rename = "MetaCommand", default)]
    pub meta_command: Vec<MetaCommandXml>,
}

#[derive(Debug, Deserialize)]
pub struct MetaCommandXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "ArgumentList", default)]
    pub argument_list: Option<ArgumentListXml>,
    #[serde(rename = "BaseMetaCommand", default)]
    pub base_meta_command: Option<BaseMetaCommandXml>,
    #[serde(rename = "CommandContainer", default)]
    pub command_container: Option<CommandContainerXml>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ArgumentListXml {
    #[serde(rename = "Argument", default)]
    pub argument: Vec<ArgumentXml>,
}

#[derive(Debug, Deserialize)]
pub struct ArgumentXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@argumentTypeRef")]
    pub argument_type_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct BaseMetaCommandXml {
    #[serde(rename = "@metaCommandRef")]
    pub meta_command_ref: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CommandContainerXml {
    #[serde(rename = "EntryList", default)]
    pub entry_list: Option<EntryListXml>,
}
