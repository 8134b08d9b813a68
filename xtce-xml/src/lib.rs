// xtce-xml
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! XTCE 1.3 XML loader for [`xtce_core`].
//!
//! This crate is the only thing in the workspace that knows XTCE documents are XML. It parses an
//! XTCE 1.3 `SpaceSystem` document with [`quick_xml`]'s `serde` support and drives an
//! [`xtce_core::SchemaBuilder`] to produce a [`xtce_core::SpaceSystem`]. Everything downstream of
//! that — bit-level encoding/decoding, container resolution, calibration — lives in `xtce-core`
//! and has no idea XML was ever involved.

pub mod build;
pub mod document;
pub mod error;

pub use error::XmlError;

use xtce_core::error::SchemaError;
use xtce_core::{Loader, Result, SpaceSystem};

/// Loads an XTCE 1.3 `SpaceSystem` from an XML document string.
///
/// This is the default, and currently only, [`Loader`] this crate provides. It implements
/// `Loader` so generic tooling can depend on the trait rather than this concrete type.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlLoader;

impl Loader for XmlLoader {
    type Source<'a> = &'a str;

    fn load(&self, source: &str) -> Result<SpaceSystem> {
        load_str(source).map_err(|err| match err {
            XmlError::Parse(parse_err) => {
                SchemaError::InvalidDocument(parse_err.to_string()).into()
            }
            XmlError::Schema(schema_err) => schema_err,
        })
    }
}

/// Parses an XTCE 1.3 XML document and builds a [`SpaceSystem`] from it.
///
/// This is the same work [`XmlLoader::load`] does; it is exposed directly so callers that don't
/// want to name the `Loader` trait (or that want the more specific [`XmlError`] rather than
/// `xtce_core::Error`) can call it without going through the trait object.
pub fn load_str(xml: &str) -> std::result::Result<SpaceSystem, XmlError> {
    let document: document::XtceDocument = quick_xml::de::from_str(xml)?;
    let space_system = build::build_space_system(document.space_system)?;
    Ok(space_system)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_xml() {
        let err = load_str("<SpaceSystem name=\"Root\">").unwrap_err();
        assert!(matches!(err, XmlError::Parse(_)));
    }

    #[test]
    fn loads_minimal_space_system() {
        let xml = r#"
            <SpaceSystem name="Root">
                <TelemetryMetaData>
                    <ParameterTypeSet>
                        <IntegerParameterType name="u8_type">
                            <IntegerDataEncoding sizeInBits="8" encoding="unsigned"/>
                        </IntegerParameterType>
                    </ParameterTypeSet>
                    <ParameterSet>
                        <Parameter name="status" parameterTypeRef="u8_type"/>
                    </ParameterSet>
                    <ContainerSet>
                        <SequenceContainer name="Packet">
                            <EntryList>
                                <ParameterRefEntry parameterRef="status"/>
                            </EntryList>
                        </SequenceContainer>
                    </ContainerSet>
                </TelemetryMetaData>
            </SpaceSystem>
        "#;

        let space_system = load_str(xml).expect("minimal document should load");
        assert!(space_system.container_by_name("Packet").is_some());
    }
}
