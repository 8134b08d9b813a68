// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A small repository of bit-manipulation helpers shared by the bitstream reader/writer and the
//! integer encodings built on top of them.

pub mod bits {
    //! Sign-extension helpers for two's complement integers read out of a bit cache narrower
    //! than the destination type.

    /// Sign extends an arbitrary, 8-bit or less, signed two's complement integer stored within an
    /// u8 to a full width i8.
    #[inline(always)]
    pub fn sign_extend_leq8_to_i8(value: u8, width: u32) -> i8 {
        (value.wrapping_shl(8 - width) as i8).wrapping_shr(8 - width)
    }

    /// Sign extends an arbitrary, 16-bit or less, signed two's complement integer stored within
    /// an u16 to a full width i16.
    #[inline(always)]
    pub fn sign_extend_leq16_to_i16(value: u16, width: u32) -> i16 {
        (value.wrapping_shl(16 - width) as i16).wrapping_shr(16 - width)
    }

    /// Sign extends an arbitrary, 32-bit or less, signed two's complement integer stored within
    /// an u32 to a full width i32.
    #[inline(always)]
    pub fn sign_extend_leq32_to_i32(value: u32, width: u32) -> i32 {
        (value.wrapping_shl(32 - width) as i32).wrapping_shr(32 - width)
    }

    /// Sign extends an arbitrary, 64-bit or less, signed two's complement integer stored within
    /// an u64 to a full width i64.
    #[inline(always)]
    pub fn sign_extend_leq64_to_i64(value: u64, width: u32) -> i64 {
        if width == 64 {
            value as i64
        }
        else {
            (value.wrapping_shl(64 - width) as i64).wrapping_shr(64 - width)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn verify_sign_extend_leq64_to_i64() {
            assert_eq!(sign_extend_leq64_to_i64(0xff, 8), -1);
            assert_eq!(sign_extend_leq64_to_i64(0x80, 8), -128);
            assert_eq!(sign_extend_leq64_to_i64(0x7f, 8), 127);
            assert_eq!(sign_extend_leq64_to_i64(u64::MAX, 64), -1);
            assert_eq!(sign_extend_leq64_to_i64(1, 1), -1);
            assert_eq!(sign_extend_leq64_to_i64(0, 1), 0);
        }
    }
}
