// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements the bit-granular cursor over a byte buffer that every data
//! encoding is built on: [`BitReader`] for decode, [`BitWriter`] for encode.

mod bit;

pub use bit::{BitIoError, BitIoResult, BitReader, BitWriter};
