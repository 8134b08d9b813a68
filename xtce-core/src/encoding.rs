// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data encodings: the wire-level read/write rules for a type's raw bits, independent of
//! calibration or engineering interpretation.

use crate::error::{DecodeError, EncodeError, EntryPath};
use crate::io::{BitReader, BitWriter};
use crate::schema::{ArgId, ParamId};
use crate::value::RawValue;

/// How an `Integer` encoding's bits are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegerSigned {
    Unsigned,
    TwosComplement,
}

/// Character sets this engine can decode/encode for `String` data. XTCE admits others (the
/// schema may declare e.g. `Shift_JIS`); an encoding using an unlisted charset is rejected at
/// schema build time as an unsupported construct rather than at decode time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharSet {
    Utf8,
    Utf16Be,
    UsAscii,
    Iso8859_1,
    Windows1252,
}

/// Whether a dynamically sized string's size parameter counts bytes or characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeIsOf {
    StringData,
    StringLengthInCharacters,
}

#[derive(Clone, Debug)]
pub enum StringSizing {
    Fixed { bits: u32 },
    Dynamic { size_param: ParamId, size_is_of: SizeIsOf },
    Terminated { terminator: u8 },
}

#[derive(Clone, Debug)]
pub enum BinarySizing {
    Fixed { bits: u32 },
    Dynamic { size_param: ParamId },
}

/// A data encoding: how to read/write a value's raw bits. Mirrors the five `DataEncoding`
/// variants of the data model (`Enumerated`/`Boolean` reuse `Integer`'s bit layout and are
/// distinguished only at the `ParameterType`/`ArgumentType` layer).
#[derive(Clone, Debug)]
pub enum DataEncoding {
    Integer { size_in_bits: u32, signed: IntegerSigned },
    Float { size_in_bits: u32 },
    String { charset: CharSet, sizing: StringSizing },
    Binary { sizing: BinarySizing },
}

/// Read access to already-decoded parameter values, used to resolve dynamic sizing. The
/// container engine implements this over the in-progress [`crate::value::ValueMap`].
pub trait SizeContext {
    fn resolved_param_uint(&self, param: ParamId) -> Option<u64>;
    fn resolved_arg_uint(&self, arg: ArgId) -> Option<u64>;
}

impl DataEncoding {
    pub fn decode(
        &self,
        reader: &mut BitReader<'_>,
        ctx: &dyn SizeContext,
        path: &EntryPath,
    ) -> Result<RawValue, DecodeError> {
        match self {
            DataEncoding::Integer { size_in_bits, signed } => {
                let value = match signed {
                    IntegerSigned::Unsigned => {
                        RawValue::UInt(read_unsigned(reader, *size_in_bits, path)?)
                    }
                    IntegerSigned::TwosComplement => {
                        RawValue::Int(read_signed(reader, *size_in_bits, path)?)
                    }
                };
                Ok(value)
            }
            DataEncoding::Float { size_in_bits } => {
                Ok(RawValue::Float(read_float(reader, *size_in_bits, path)?))
            }
            DataEncoding::String { charset, sizing } => {
                let bytes = read_string_bytes(reader, *charset, sizing, ctx, path)?;
                Ok(RawValue::Bytes(bytes))
            }
            DataEncoding::Binary { sizing } => {
                let bits = match sizing {
                    BinarySizing::Fixed { bits } => *bits,
                    BinarySizing::Dynamic { size_param } => {
                        let len = ctx.resolved_param_uint(*size_param).unwrap_or(0);
                        (len as u32) * 8
                    }
                };
                let bytes = read_bytes(reader, bits, path)?;
                Ok(RawValue::Bytes(bytes))
            }
        }
    }

    pub fn encode(
        &self,
        writer: &mut BitWriter,
        raw: &RawValue,
        path: &EntryPath,
    ) -> Result<(), EncodeError> {
        match (self, raw) {
            (DataEncoding::Integer { size_in_bits, signed: IntegerSigned::Unsigned }, RawValue::UInt(v)) => {
                writer.write_unsigned(*size_in_bits, *v).map_err(|_| out_of_range(path, *v))
            }
            (DataEncoding::Integer { size_in_bits, signed: IntegerSigned::TwosComplement }, RawValue::Int(v)) => {
                writer.write_signed(*size_in_bits, *v).map_err(|_| out_of_range(path, *v))
            }
            (DataEncoding::Float { size_in_bits }, RawValue::Float(v)) => {
                writer.write_float(*size_in_bits, *v).expect("float width is always 32 or 64");
                Ok(())
            }
            (DataEncoding::String { sizing, .. }, RawValue::Bytes(bytes)) => {
                write_string_bytes(writer, sizing, bytes, path)
            }
            (DataEncoding::Binary { sizing }, RawValue::Bytes(bytes)) => {
                if let BinarySizing::Fixed { bits } = sizing {
                    let declared_bytes = (*bits as usize) / 8;
                    if declared_bytes != bytes.len() {
                        return Err(EncodeError::ArrayLengthMismatch {
                            path: path.clone(),
                            expected: declared_bytes,
                            actual: bytes.len(),
                        });
                    }
                }
                writer.write_bytes(bytes).expect("byte writes never exceed an 8-bit width");
                Ok(())
            }
            _ => Err(EncodeError::MissingValue { path: path.clone() }),
        }
    }
}

fn out_of_range(path: &EntryPath, value: impl std::fmt::Display) -> EncodeError {
    EncodeError::OutOfRange { path: path.clone(), value: value.to_string() }
}

fn read_unsigned(reader: &mut BitReader<'_>, bits: u32, path: &EntryPath) -> Result<u64, DecodeError> {
    reader.read_unsigned(bits).map_err(|_| end_of_input(reader, bits, path))
}

fn read_signed(reader: &mut BitReader<'_>, bits: u32, path: &EntryPath) -> Result<i64, DecodeError> {
    reader.read_signed(bits).map_err(|_| end_of_input(reader, bits, path))
}

fn read_float(reader: &mut BitReader<'_>, bits: u32, path: &EntryPath) -> Result<f64, DecodeError> {
    reader.read_float(bits).map_err(|_| end_of_input(reader, bits, path))
}

fn read_bytes(reader: &mut BitReader<'_>, bits: u32, path: &EntryPath) -> Result<Vec<u8>, DecodeError> {
    reader.read_bytes(bits).map_err(|_| end_of_input(reader, bits, path))
}

fn end_of_input(reader: &BitReader<'_>, needed_bits: u32, path: &EntryPath) -> DecodeError {
    DecodeError::UnexpectedEndOfInput {
        path: path.clone(),
        needed_bits,
        available_bits: reader.bits_left(),
    }
}

fn read_string_bytes(
    reader: &mut BitReader<'_>,
    charset: CharSet,
    sizing: &StringSizing,
    ctx: &dyn SizeContext,
    path: &EntryPath,
) -> Result<Vec<u8>, DecodeError> {
    match sizing {
        StringSizing::Fixed { bits } => read_bytes(reader, *bits, path),
        StringSizing::Terminated { terminator } => {
            let mut bytes = Vec::new();
            loop {
                let byte = read_unsigned(reader, 8, path)? as u8;
                if byte == *terminator {
                    break;
                }
                bytes.push(byte);
            }
            Ok(bytes)
        }
        StringSizing::Dynamic { size_param, size_is_of } => {
            let count = ctx.resolved_param_uint(*size_param).unwrap_or(0) as usize;
            match size_is_of {
                SizeIsOf::StringData => read_bytes(reader, (count as u32) * 8, path),
                SizeIsOf::StringLengthInCharacters => read_n_chars(reader, charset, count, path),
            }
        }
    }
}

/// Reads exactly `count` characters under `charset`, returning the raw bytes consumed. For
/// fixed-width charsets this is a direct multiplication; UTF-8 requires inspecting each leading
/// byte to find code point boundaries.
fn read_n_chars(
    reader: &mut BitReader<'_>,
    charset: CharSet,
    count: usize,
    path: &EntryPath,
) -> Result<Vec<u8>, DecodeError> {
    match charset {
        CharSet::UsAscii | CharSet::Iso8859_1 | CharSet::Windows1252 => {
            read_bytes(reader, (count as u32) * 8, path)
        }
        CharSet::Utf16Be => read_bytes(reader, (count as u32) * 16, path),
        CharSet::Utf8 => {
            let mut bytes = Vec::new();
            for _ in 0..count {
                let lead = read_unsigned(reader, 8, path)? as u8;
                let extra = utf8_continuation_bytes(lead);
                bytes.push(lead);
                for _ in 0..extra {
                    bytes.push(read_unsigned(reader, 8, path)? as u8);
                }
            }
            Ok(bytes)
        }
    }
}

fn utf8_continuation_bytes(lead: u8) -> u32 {
    if lead & 0x80 == 0x00 {
        0
    } else if lead & 0xE0 == 0xC0 {
        1
    } else if lead & 0xF0 == 0xE0 {
        2
    } else if lead & 0xF8 == 0xF0 {
        3
    } else {
        0
    }
}

fn write_string_bytes(
    writer: &mut BitWriter,
    sizing: &StringSizing,
    bytes: &[u8],
    path: &EntryPath,
) -> Result<(), EncodeError> {
    match sizing {
        StringSizing::Fixed { bits } => {
            let declared_bytes = (*bits as usize) / 8;
            if declared_bytes != bytes.len() {
                return Err(EncodeError::ArrayLengthMismatch {
                    path: path.clone(),
                    expected: declared_bytes,
                    actual: bytes.len(),
                });
            }
            writer.write_bytes(bytes).expect("byte writes never exceed an 8-bit width");
            Ok(())
        }
        StringSizing::Terminated { terminator } => {
            writer.write_bytes(bytes).expect("byte writes never exceed an 8-bit width");
            writer.write_unsigned(8, *terminator as u64).expect("terminator fits in 8 bits");
            Ok(())
        }
        StringSizing::Dynamic { .. } => {
            // The size field itself is a sibling entry, auto-populated by the container engine
            // from this string's length before either entry is written.
            writer.write_bytes(bytes).expect("byte writes never exceed an 8-bit width");
            Ok(())
        }
    }
}

/// Decodes `bytes` into a `String` under `charset`, used once the raw bytes have been read off
/// the wire.
pub fn decode_charset(bytes: &[u8], charset: CharSet) -> Result<String, &'static str> {
    match charset {
        CharSet::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| "UTF-8"),
        CharSet::UsAscii => {
            if bytes.iter().any(|b| *b >= 0x80) {
                return Err("US-ASCII");
            }
            Ok(bytes.iter().map(|b| *b as char).collect())
        }
        CharSet::Iso8859_1 => Ok(bytes.iter().map(|b| *b as char).collect()),
        CharSet::Windows1252 => Ok(bytes.iter().map(|b| windows1252_to_char(*b)).collect()),
        CharSet::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err("UTF-16");
            }
            let units: Vec<u16> =
                bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|_| "UTF-16")
        }
    }
}

/// Encodes a `String` into bytes under `charset`.
pub fn encode_charset(value: &str, charset: CharSet) -> Result<Vec<u8>, &'static str> {
    match charset {
        CharSet::Utf8 => Ok(value.as_bytes().to_vec()),
        CharSet::UsAscii => {
            if !value.is_ascii() {
                return Err("US-ASCII");
            }
            Ok(value.bytes().collect())
        }
        CharSet::Iso8859_1 => {
            let mut out = Vec::with_capacity(value.len());
            for c in value.chars() {
                let cp = c as u32;
                if cp > 0xFF {
                    return Err("ISO-8859-1");
                }
                out.push(cp as u8);
            }
            Ok(out)
        }
        CharSet::Windows1252 => {
            let mut out = Vec::with_capacity(value.len());
            for c in value.chars() {
                out.push(char_to_windows1252(c).ok_or("windows-1252")?);
            }
            Ok(out)
        }
        CharSet::Utf16Be => {
            let mut out = Vec::with_capacity(value.len() * 2);
            for unit in value.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
            Ok(out)
        }
    }
}

/// The 32 bytes of windows-1252 that diverge from Latin-1 (0x80..=0x9F); every other byte value
/// is identical to its Latin-1/Unicode code point.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

fn windows1252_to_char(byte: u8) -> char {
    if (0x80..=0x9F).contains(&byte) {
        WINDOWS_1252_HIGH[(byte - 0x80) as usize]
    } else {
        byte as char
    }
}

fn char_to_windows1252(c: char) -> Option<u8> {
    let cp = c as u32;
    if cp < 0x80 || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    WINDOWS_1252_HIGH.iter().position(|&hc| hc == c).map(|idx| 0x80 + idx as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_round_trip_ascii_and_latin1() {
        for charset in [CharSet::UsAscii, CharSet::Iso8859_1, CharSet::Windows1252, CharSet::Utf8] {
            let bytes = encode_charset("Hi!", charset).unwrap();
            assert_eq!(decode_charset(&bytes, charset).unwrap(), "Hi!");
        }
    }

    #[test]
    fn windows1252_euro_sign() {
        let bytes = encode_charset("\u{20AC}", CharSet::Windows1252).unwrap();
        assert_eq!(bytes, vec![0x80]);
        assert_eq!(decode_charset(&bytes, CharSet::Windows1252).unwrap(), "\u{20AC}");
    }

    #[test]
    fn utf16_round_trip() {
        let bytes = encode_charset("ab", CharSet::Utf16Be).unwrap();
        assert_eq!(bytes, vec![0x00, b'a', 0x00, b'b']);
        assert_eq!(decode_charset(&bytes, CharSet::Utf16Be).unwrap(), "ab");
    }

    #[test]
    fn utf8_continuation_byte_counts() {
        assert_eq!(utf8_continuation_bytes(b'a'), 0);
        assert_eq!(utf8_continuation_bytes(0xC3), 1); // e.g. 'é'
        assert_eq!(utf8_continuation_bytes(0xE2), 2); // e.g. '€'
    }
}
