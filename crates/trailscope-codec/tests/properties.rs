use proptest::prelude::*;
use trailscope_codec::item::{encode, MAX_FIELD, MAX_VALUE};
use trailscope_codec::{field_index, format_uuid, is_narrow, parse_uuid, value_id, TrailUuid};

fn canonical_uuid() -> impl Strategy<Value = String> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
}

proptest! {
    #[test]
    fn field_index_is_deterministic(item in any::<u64>()) {
        prop_assert_eq!(field_index(item), field_index(item));
    }

    #[test]
    fn narrow_fields_stay_below_128(item in any::<u64>()) {
        if is_narrow(item) {
            prop_assert!(field_index(item) < 128);
        } else {
            prop_assert!(field_index(item) < 16384);
        }
    }

    #[test]
    fn encode_then_decode_recovers_pair(field in 0u32..=MAX_FIELD, value in 0u64..=MAX_VALUE) {
        let item = encode(field, value);
        prop_assert_eq!(field_index(item), field);
        prop_assert_eq!(value_id(item), value);
    }

    #[test]
    fn raw_uuid_survives_text_form(raw in any::<[u8; 16]>()) {
        prop_assert_eq!(parse_uuid(&format_uuid(&raw)).unwrap(), raw);
    }

    #[test]
    fn canonical_text_survives_raw_form(text in canonical_uuid()) {
        prop_assert_eq!(format_uuid(&parse_uuid(&text).unwrap()), text);
    }

    #[test]
    fn text_without_uuid_is_rejected(text in "[g-z -]{0,40}") {
        prop_assert!(parse_uuid(&text).is_err());
    }
}

#[test]
fn trail_uuid_serializes_as_string() {
    let uuid = TrailUuid::from_bytes([0xab; 16]);
    assert_eq!(
        serde_json::to_string(&uuid).unwrap(),
        r#""abababab-abab-abab-abab-abababababab""#
    );

    let restored: TrailUuid =
        serde_json::from_str(r#""abababab-abab-abab-abab-abababababab""#).unwrap();
    assert_eq!(restored, uuid);
}

#[test]
fn trail_uuid_rejects_garbage_on_deserialize() {
    assert!(serde_json::from_str::<TrailUuid>(r#""not-a-uuid""#).is_err());
}
