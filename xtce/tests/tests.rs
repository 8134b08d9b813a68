//! End-to-end scenarios exercising the public `xtce` API: schema construction (both in-memory
//! and via the XML loader), packet decode/encode, container inheritance, and calibration.

use xtce::comparison::{CompareOp, Comparison, ComparisonList};
use xtce::encoding::{DataEncoding, IntegerSigned};
use xtce::schema::{Entry, SchemaBuilder};
use xtce::types::{BaseType, ParameterType};
use xtce::{decode_packet, encode_packet, DecodeOptions, EncodeOptions, EngValue, InputMap};

fn uint_type(bits: u32) -> ParameterType {
    ParameterType::Integer(BaseType {
        name: String::new(),
        units: Vec::new(),
        valid_range: None,
        encoding: DataEncoding::Integer { size_in_bits: bits, signed: IntegerSigned::Unsigned },
        calibrator: None,
    })
}

fn int_type(bits: u32, signed: IntegerSigned) -> ParameterType {
    ParameterType::Integer(BaseType {
        name: String::new(),
        units: Vec::new(),
        valid_range: None,
        encoding: DataEncoding::Integer { size_in_bits: bits, signed },
        calibrator: None,
    })
}

// Scenario 1: unsigned integer round trip.
#[test]
fn unsigned_integer_round_trip() {
    let mut b = SchemaBuilder::new();
    let u16_ty = b.add_parameter_type("u16", uint_type(16)).unwrap();
    let x = b.add_parameter("x", u16_ty).unwrap();
    b.add_container("Root", None, None, vec![Entry::ParameterRef { param: x, location: None }]).unwrap();
    let schema = b.finish().unwrap();

    let mut values = InputMap::new();
    values.insert("x".to_string(), EngValue::Int(0x1234));
    let bytes = encode_packet(&schema, "Root", &values, EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x12, 0x34]);

    let decoded = decode_packet(&schema, "Root", &bytes, DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("x").unwrap().engineering, EngValue::Int(0x1234));
}

// Scenario 2: two's-complement signed decode.
#[test]
fn twos_complement_signed_decode() {
    let mut b = SchemaBuilder::new();
    let i8_ty = b.add_parameter_type("i8", int_type(8, IntegerSigned::TwosComplement)).unwrap();
    let x = b.add_parameter("x", i8_ty).unwrap();
    b.add_container("Root", None, None, vec![Entry::ParameterRef { param: x, location: None }]).unwrap();
    let schema = b.finish().unwrap();

    let decoded = decode_packet(&schema, "Root", &[0xFF], DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("x").unwrap().engineering, EngValue::Int(-1));

    let decoded = decode_packet(&schema, "Root", &[0x80], DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("x").unwrap().engineering, EngValue::Int(-128));
}

// Scenario 3: polynomial calibration, p(x) = 1 + 2x.
#[test]
fn polynomial_calibration_round_trip() {
    use xtce::calibration::{Calibrator, PolynomialCalibrator};

    let mut b = SchemaBuilder::new();
    let calibrated = ParameterType::Integer(BaseType {
        name: String::new(),
        units: Vec::new(),
        valid_range: None,
        encoding: DataEncoding::Integer { size_in_bits: 16, signed: IntegerSigned::Unsigned },
        calibrator: Some(Calibrator::Polynomial(PolynomialCalibrator {
            terms: vec![(1.0, 0), (2.0, 1)],
        })),
    });
    let ty = b.add_parameter_type("calibrated", calibrated).unwrap();
    let x = b.add_parameter("x", ty).unwrap();
    b.add_container("Root", None, None, vec![Entry::ParameterRef { param: x, location: None }]).unwrap();
    let schema = b.finish().unwrap();

    let mut values = InputMap::new();
    values.insert("x".to_string(), EngValue::Float(5.0));
    let bytes = encode_packet(&schema, "Root", &values, EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x00, 0x02]);

    let decoded = decode_packet(&schema, "Root", &bytes, DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("x").unwrap().engineering, EngValue::Float(5.0));
}

// Scenario 4: enum-style dispatch via restriction, plus inheritance order.
#[test]
fn restriction_selects_child_and_preserves_entry_order() {
    let mut b = SchemaBuilder::new();
    let u8_ty = b.add_parameter_type("u8", uint_type(8)).unwrap();
    let type_id = b.add_parameter("type_id", u8_ty).unwrap();
    let payload = b.add_parameter("payload", u8_ty).unwrap();

    let root = b
        .add_container("Root", None, None, vec![Entry::ParameterRef { param: type_id, location: None }])
        .unwrap();
    b.add_container(
        "C1",
        Some(root),
        Some(ComparisonList(vec![Comparison {
            param: type_id,
            op: CompareOp::Eq,
            value: "1".to_string(),
            use_calibrated_value: true,
        }])),
        vec![Entry::ParameterRef { param: payload, location: None }],
    )
    .unwrap();
    b.add_container(
        "C2",
        Some(root),
        Some(ComparisonList(vec![Comparison {
            param: type_id,
            op: CompareOp::Eq,
            value: "2".to_string(),
            use_calibrated_value: true,
        }])),
        vec![],
    )
    .unwrap();
    let schema = b.finish().unwrap();

    let decoded = decode_packet(&schema, "Root", &[0x01, 0xAA], DecodeOptions::default()).unwrap();
    // root-to-leaf order: type_id (inherited from Root) before payload (owned by C1).
    let names: Vec<&str> = decoded.keys().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["type_id", "payload"]);
    assert_eq!(decoded.get("type_id").unwrap().engineering, EngValue::Int(1));
    assert_eq!(decoded.get("payload").unwrap().engineering, EngValue::Int(0xAA));

    // A type_id that matches no child's restriction selects none of them: only Root's own
    // fields are decoded, "payload" never appears.
    let decoded = decode_packet(&schema, "Root", &[0x09, 0xAA], DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("type_id").unwrap().engineering, EngValue::Int(9));
    assert!(decoded.get("payload").is_none());
}

// Scenario 5: dynamic string sized by a preceding length field.
#[test]
fn dynamic_string_length_round_trips() {
    use xtce::encoding::{CharSet, SizeIsOf, StringSizing};

    let mut b = SchemaBuilder::new();
    let u8_ty = b.add_parameter_type("u8", uint_type(8)).unwrap();
    let len = b.add_parameter("len", u8_ty).unwrap();

    let string_ty = ParameterType::String(BaseType {
        name: String::new(),
        units: Vec::new(),
        valid_range: None,
        encoding: DataEncoding::String {
            charset: CharSet::Utf8,
            sizing: StringSizing::Dynamic { size_param: len, size_is_of: SizeIsOf::StringData },
        },
        calibrator: None,
    });
    let string_ty_id = b.add_parameter_type("name_type", string_ty).unwrap();
    let name = b.add_parameter("name", string_ty_id).unwrap();

    b.add_container(
        "Root",
        None,
        None,
        vec![
            Entry::ParameterRef { param: len, location: None },
            Entry::ParameterRef { param: name, location: None },
        ],
    )
    .unwrap();
    let schema = b.finish().unwrap();

    let decoded =
        decode_packet(&schema, "Root", &[0x03, b'A', b'B', b'C'], DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("len").unwrap().engineering, EngValue::Int(3));
    assert_eq!(decoded.get("name").unwrap().engineering, EngValue::Str("ABC".to_string()));
}

// Scenario 6: fixed-value mismatch is rejected by name.
#[test]
fn fixed_value_entry_rejects_mismatched_bytes() {
    let mut b = SchemaBuilder::new();
    b.add_container(
        "Root",
        None,
        None,
        vec![Entry::FixedValue { size_in_bits: 16, value: vec![0xCA, 0xFE] }],
    )
    .unwrap();
    let schema = b.finish().unwrap();

    decode_packet(&schema, "Root", &[0xCA, 0xFE, 0x00], DecodeOptions::default())
        .expect("matching fixed value decodes");

    let err = decode_packet(&schema, "Root", &[0xDE, 0xAD, 0x00], DecodeOptions::default());
    assert!(err.is_err());
}

#[cfg(feature = "xml")]
#[test]
fn xml_loader_round_trips_through_core_codec() {
    let xml = r#"
        <SpaceSystem name="Demo">
            <TelemetryMetaData>
                <ParameterTypeSet>
                    <IntegerParameterType name="u16_type">
                        <IntegerDataEncoding sizeInBits="16" encoding="unsigned"/>
                    </IntegerParameterType>
                </ParameterTypeSet>
                <ParameterSet>
                    <Parameter name="x" parameterTypeRef="u16_type"/>
                </ParameterSet>
                <ContainerSet>
                    <SequenceContainer name="Packet">
                        <EntryList>
                            <ParameterRefEntry parameterRef="x"/>
                        </EntryList>
                    </SequenceContainer>
                </ContainerSet>
            </TelemetryMetaData>
        </SpaceSystem>
    "#;

    let schema = xtce::default::load_xml(xml).expect("document loads");

    let mut values = InputMap::new();
    values.insert("x".to_string(), EngValue::Int(0x1234));
    let bytes = encode_packet(&schema, "Packet", &values, EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x12, 0x34]);

    let decoded = decode_packet(&schema, "Packet", &bytes, DecodeOptions::default()).unwrap();
    assert_eq!(decoded.get("x").unwrap().engineering, EngValue::Int(0x1234));
}
