// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bit-level codec and container resolution engine for XTCE (XML Telemetric and Command
//! Exchange) 1.3 telemetry and command schemas.
//!
//! Given an already-loaded, validated [`schema::SpaceSystem`] — built by a pluggable loader such
//! as `xtce-xml`, not by this crate — `xtce-core` can:
//!
//! - [`container::decode_packet`] a binary packet into an ordered map of qualified parameter name
//!   to raw and engineering value, selecting the concrete container by walking base-container
//!   inheritance and evaluating restriction criteria against already-decoded fields.
//! - [`container::encode_packet`] an engineering value map back into a bit-exact packet.
//! - [`container::encode_command`] an argument value map into a bit-exact command.
//!
//! This crate never parses XML and never reads a config file; see `xtce-xml` for the default
//! loader and the `xtce` facade crate for a batteries-included entry point.

pub mod calibration;
pub mod comparison;
pub mod container;
pub mod encoding;
pub mod error;
pub mod io;
pub mod loader;
pub mod schema;
pub mod types;
mod util;
pub mod value;

pub use container::{decode_packet, encode_command, encode_packet, DecodeOptions, EncodeOptions};
pub use error::{Error, Result};
pub use loader::Loader;
pub use schema::{SchemaBuilder, SpaceSystem};
pub use value::{DecodedValue, EngValue, InputMap, RawValue, ValueMap};
