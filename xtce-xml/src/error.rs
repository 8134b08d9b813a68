// xtce-xml
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// Everything that can go wrong turning an XTCE 1.3 XML document into a [`xtce_core::SpaceSystem`].
#[derive(Debug)]
pub enum XmlError {
    /// The document was not well-formed XML, or its shape did not match the subset of the XTCE
    /// schema this loader understands.
    Parse(quick_xml::de::DeError),
    /// The document parsed but failed schema construction: a dangling reference, a duplicate
    /// name, an inheritance cycle, or a construct this engine does not support.
    Schema(xtce_core::Error),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::Parse(err) => write!(f, "failed to parse XTCE XML document: {err}"),
            XmlError::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for XmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmlError::Parse(err) => Some(err),
            XmlError::Schema(err) => Some(err),
        }
    }
}

impl From<quick_xml::de::DeError> for XmlError {
    fn from(err: quick_xml::de::DeError) -> Self {
        XmlError::Parse(err)
    }
}

impl From<xtce_core::Error> for XmlError {
    fn from(err: xtce_core::Error) -> Self {
        XmlError::Schema(err)
    }
}
