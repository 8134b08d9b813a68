// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The seam a pluggable schema source plugs into.
//!
//! `xtce-core` never reads a document itself — [`SchemaBuilder`] is the only way a
//! [`SpaceSystem`] comes into existence, and a [`Loader`] is whatever walks a source document and
//! drives that builder. `xtce-xml` implements this trait over an XTCE 1.3 XML document; a test
//! harness or an alternative schema dialect can implement it too without this crate knowing or
//! caring which.

use crate::error::Result;
use crate::schema::SpaceSystem;

/// Something that can build a [`SpaceSystem`] from a source document.
///
/// Implementations own their own notion of "source" (a borrowed `&str` of XML text, a path, a
/// reader) and are free to add inherent methods beyond this trait; `load` is the one entry point
/// the facade crate and generic tooling can call without naming the concrete loader type.
pub trait Loader {
    /// The source document type this loader consumes, e.g. `&str` of XML text.
    type Source<'a>;

    fn load(&self, source: Self::Source<'_>) -> Result<SpaceSystem>;
}
