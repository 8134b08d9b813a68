// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `error` module defines the common error type returned by schema construction, decode, and
//! encode operations.

use std::fmt;

/// A breadcrumb identifying where in a container's entry list an error occurred.
///
/// Attached to `Decode`/`Encode` errors so the `decode_packet`/`encode_packet` boundary can
/// report the container, the index of the entry within that container's inherited entry list,
/// and the parameter or argument name involved, per the propagation rules of this engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryPath {
    /// Qualified name of the container being walked when the error occurred.
    pub container: String,
    /// Index into the container's full inherited entry list.
    pub entry_index: usize,
    /// Qualified name of the parameter or argument the entry refers to, if any.
    pub name: Option<String>,
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.container, self.entry_index)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

/// Reasons a schema fails to build into a usable runtime model.
#[derive(Debug)]
pub enum SchemaError {
    /// A reference (type, parameter, argument, container) did not resolve within the
    /// `SpaceSystem`.
    DanglingReference { from: String, reference: String },
    /// Two containers' base-container references form an inheritance cycle.
    CyclicInheritance { container: String },
    /// A name was declared more than once within the same `SpaceSystem`.
    DuplicateName { kind: &'static str, name: String },
    /// A construct that is structurally valid XTCE but has no runtime behavior in this engine
    /// was referenced in a way that would require it to actually do something (for example, a
    /// container entry tries to use an `AggregateType` parameter).
    UnsupportedConstruct { what: &'static str, context: String },
    /// A loader rejected its source document as malformed or not well-formed XTCE 1.3, outside
    /// the dangling-reference/cycle/duplicate-name checks this crate performs itself.
    InvalidDocument(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DanglingReference { from, reference } => {
                write!(f, "dangling reference '{reference}' from '{from}'")
            }
            SchemaError::CyclicInheritance { container } => {
                write!(f, "cyclic base container inheritance involving '{container}'")
            }
            SchemaError::DuplicateName { kind, name } => {
                write!(f, "duplicate {kind} name '{name}'")
            }
            SchemaError::UnsupportedConstruct { what, context } => {
                write!(f, "unsupported construct '{what}' used by '{context}'")
            }
            SchemaError::InvalidDocument(reason) => write!(f, "invalid XTCE document: {reason}"),
        }
    }
}

/// Reasons a packet failed to decode against a container.
#[derive(Debug)]
pub enum DecodeError {
    /// The bitstream ran out of bits before an entry could be fully read.
    UnexpectedEndOfInput { path: EntryPath, needed_bits: u32, available_bits: u64 },
    /// A `FixedValueEntry`'s bits did not match the declared value.
    FixedValueMismatch { path: EntryPath, expected: Vec<u8>, actual: Vec<u8> },
    /// A string's bytes could not be decoded under the declared character set.
    StringCharsetError { path: EntryPath, charset: &'static str },
    /// More than one candidate child container's restriction was satisfied.
    AmbiguousContainer { base: String, candidates: Vec<String> },
    /// No candidate child container's restriction was satisfied and none was required.
    NoContainerMatched { base: String },
    /// `decode_packet` was called with a root container name the schema has no container for.
    UnknownContainer { name: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEndOfInput { path, needed_bits, available_bits } => {
                write!(
                    f,
                    "unexpected end of input at {path}: needed {needed_bits} bits, {available_bits} available"
                )
            }
            DecodeError::FixedValueMismatch { path, expected, actual } => {
                write!(f, "fixed value mismatch at {path}: expected {expected:02x?}, got {actual:02x?}")
            }
            DecodeError::StringCharsetError { path, charset } => {
                write!(f, "invalid {charset} bytes at {path}")
            }
            DecodeError::AmbiguousContainer { base, candidates } => {
                write!(f, "ambiguous restriction under '{base}': candidates {candidates:?}")
            }
            DecodeError::NoContainerMatched { base } => {
                write!(f, "no child container of '{base}' matched and ancestry demands one")
            }
            DecodeError::UnknownContainer { name } => {
                write!(f, "no container named '{name}' in this schema")
            }
        }
    }
}

/// Reasons a value map failed to encode into a packet.
#[derive(Debug)]
pub enum EncodeError {
    /// The value supplied for a parameter or argument falls outside its declared valid range.
    OutOfRange { path: EntryPath, value: String },
    /// An enumerated type's label (or raw integer) did not match any declared enumeration value.
    UnknownEnumLabel { path: EntryPath, label: String },
    /// A boolean type's string did not match either the zero or one string.
    UnknownBooleanString { path: EntryPath, value: String },
    /// A polynomial calibrator had no real root in range for the requested engineering value.
    Calibration(CalibrationError),
    /// A parameter or argument required by the container/meta-command's entry list was missing
    /// from the supplied value map.
    MissingValue { path: EntryPath },
    /// An array's provided element count did not match its declared dimension.
    ArrayLengthMismatch { path: EntryPath, expected: usize, actual: usize },
    /// A restriction on an ancestor container could not be satisfied by the supplied or
    /// auto-populated values.
    RestrictionNotSatisfiable { container: String },
    /// `encode_packet`/`encode_command` was called with a container or meta-command name the
    /// schema has no entry for.
    UnknownTarget { name: String },
    /// `EncodeOptions::zero_pad_trailing` was `false` and the assembled packet ended mid-byte.
    TrailingBitsNotByteAligned { leftover_bits: u32 },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::OutOfRange { path, value } => {
                write!(f, "value '{value}' out of valid range at {path}")
            }
            EncodeError::UnknownEnumLabel { path, label } => {
                write!(f, "unknown enumeration label '{label}' at {path}")
            }
            EncodeError::UnknownBooleanString { path, value } => {
                write!(f, "unrecognized boolean string '{value}' at {path}")
            }
            EncodeError::Calibration(err) => write!(f, "{err}"),
            EncodeError::MissingValue { path } => write!(f, "missing value for {path}"),
            EncodeError::ArrayLengthMismatch { path, expected, actual } => {
                write!(f, "array length mismatch at {path}: expected {expected}, got {actual}")
            }
            EncodeError::RestrictionNotSatisfiable { container } => {
                write!(f, "restriction on '{container}' is not satisfiable by the supplied values")
            }
            EncodeError::UnknownTarget { name } => {
                write!(f, "no container or meta-command named '{name}' in this schema")
            }
            EncodeError::TrailingBitsNotByteAligned { leftover_bits } => {
                write!(f, "packet ends {leftover_bits} bits short of a byte boundary and zero_pad_trailing is disabled")
            }
        }
    }
}

/// A calibration inverse could not be found.
#[derive(Debug)]
pub struct CalibrationError {
    pub engineering_value: f64,
    pub reason: &'static str,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no usable inverse root for engineering value {}: {}",
            self.engineering_value, self.reason
        )
    }
}

impl std::error::Error for CalibrationError {}

/// `Error` enumerates every way a schema build, decode, or encode operation can fail.
#[derive(Debug)]
pub enum Error {
    Schema(SchemaError),
    Decode(DecodeError),
    Encode(EncodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Schema(err) => write!(f, "schema error: {err}"),
            Error::Decode(err) => write!(f, "decode error: {err}"),
            Error::Encode(err) => write!(f, "encode error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encode(EncodeError::Calibration(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::Encode(err)
    }
}

impl From<CalibrationError> for Error {
    fn from(err: CalibrationError) -> Self {
        Error::Encode(EncodeError::Calibration(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to create a dangling-reference schema error.
pub fn dangling_reference<T>(from: impl Into<String>, reference: impl Into<String>) -> Result<T> {
    Err(SchemaError::DanglingReference { from: from.into(), reference: reference.into() }.into())
}

/// Convenience function to create a cyclic-inheritance schema error.
pub fn cyclic_inheritance<T>(container: impl Into<String>) -> Result<T> {
    Err(SchemaError::CyclicInheritance { container: container.into() }.into())
}

/// Convenience function to create a duplicate-name schema error.
pub fn duplicate_name<T>(kind: &'static str, name: impl Into<String>) -> Result<T> {
    Err(SchemaError::DuplicateName { kind, name: name.into() }.into())
}

/// Convenience function to create an unsupported-construct schema error.
pub fn unsupported_construct<T>(what: &'static str, context: impl Into<String>) -> Result<T> {
    Err(SchemaError::UnsupportedConstruct { what, context: context.into() }.into())
}
