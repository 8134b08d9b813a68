// xtce
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # xtce
//!
//! `xtce` is a bit-level codec and container resolution engine for XTCE (XML Telemetric and
//! Command Exchange) 1.3 telemetry and command schemas.
//!
//! # Usage
//!
//! 1.  Obtain a [`SpaceSystem`] for the mission you're decoding against. With the default `xml`
//!     feature enabled, [`default::get_loader`] parses an XTCE 1.3 XML document straight into
//!     one. Without a loader crate, a [`SchemaBuilder`] can construct one entity at a time.
//! 2.  Call [`decode_packet`] with a root [`schema::ContainerId`] and a raw byte buffer to get
//!     back a [`ValueMap`] of qualified parameter name to raw and engineering value. The
//!     container is chosen automatically by walking base-container inheritance and evaluating
//!     each candidate's restriction against already-decoded fields.
//! 3.  Call [`encode_packet`] with an [`InputMap`] of engineering values to get a bit-exact
//!     packet back, or [`encode_command`] with a `MetaCommand` to build a command.
//!
//! This crate re-exports `xtce-core`'s public API unchanged; see that crate's documentation for
//! the data model and algorithms. `xtce-xml`, wired in here behind the `xml` feature, is the only
//! part of this stack that knows XTCE documents are XML.

pub use xtce_core::*;

pub mod default {
    //! Convenience entry points that reduce boilerplate for the common case. Using this module
    //! is entirely optional; everything here is built from the public API of `xtce-core` and
    //! `xtce-xml`.

    #[cfg(feature = "xml")]
    use xtce_core::{Loader, Result, SpaceSystem};

    /// Gets the default schema [`Loader`], which parses an XTCE 1.3 XML document.
    ///
    /// Available when the `xml` feature is enabled (on by default).
    #[cfg(feature = "xml")]
    pub fn get_loader() -> xtce_xml::XmlLoader {
        xtce_xml::XmlLoader
    }

    /// Parses an XTCE 1.3 XML document straight into a [`SpaceSystem`].
    ///
    /// Shorthand for `get_loader().load(xml)`. Available when the `xml` feature is enabled (on
    /// by default).
    #[cfg(feature = "xml")]
    pub fn load_xml(xml: &str) -> Result<SpaceSystem> {
        get_loader().load(xml)
    }
}
