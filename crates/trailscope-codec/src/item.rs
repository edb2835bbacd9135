//! Packed item encoding.
//!
//! An item is a `u64` holding a field index and a value id. Bit 7 of the low
//! byte selects between two layouts:
//!
//! - narrow (bit 7 clear): field in bits 0-6, value id in bits 8-47
//! - wide (bit 7 set): field in bits 0-6 and 8-14, value id in bits 16-63
//!
//! Value id 0 is the empty value of every field.

/// Packed (field index, value id) pair.
pub type Item = u64;

/// Dense field index. Index 0 is the timestamp pseudo-field.
pub type FieldIndex = u32;

/// Per-field value identifier. 0 is the empty value.
pub type ValueId = u64;

const WIDE_FLAG: u64 = 0x80;
const FIELD_GROUP_MASK: u64 = 0x7F;
const NARROW_VALUE_SHIFT: u32 = 8;
const WIDE_VALUE_SHIFT: u32 = 16;

/// Largest field index representable in the narrow layout.
pub const MAX_NARROW_FIELD: FieldIndex = 0x7F;

/// Largest field index representable at all (14 bits).
pub const MAX_FIELD: FieldIndex = (1 << 14) - 1;

/// Largest value id representable in the narrow layout (40 bits).
pub const MAX_NARROW_VALUE: ValueId = (1 << 40) - 1;

/// Largest value id representable in the wide layout (48 bits).
pub const MAX_VALUE: ValueId = (1 << 48) - 1;

/// Item returned by value lookups that find nothing.
///
/// It decodes to field 0 (the timestamp pseudo-field) with value 0. Events
/// only carry items of user fields, so this item never matches one.
pub const NO_MATCH: Item = 0;

/// Returns true when `item` uses the narrow layout.
pub fn is_narrow(item: Item) -> bool {
    item & WIDE_FLAG == 0
}

/// Decodes the field index of `item`.
pub fn field_index(item: Item) -> FieldIndex {
    if is_narrow(item) {
        (item & FIELD_GROUP_MASK) as FieldIndex
    } else {
        ((item & FIELD_GROUP_MASK) | (((item >> 8) & FIELD_GROUP_MASK) << 7)) as FieldIndex
    }
}

/// Decodes the value id of `item`.
pub fn value_id(item: Item) -> ValueId {
    if is_narrow(item) {
        (item >> NARROW_VALUE_SHIFT) & MAX_NARROW_VALUE
    } else {
        item >> WIDE_VALUE_SHIFT
    }
}

/// Packs a field index and value id, choosing the narrow layout when both fit.
///
/// Inputs beyond [`MAX_FIELD`] / [`MAX_VALUE`] are truncated; stores are
/// expected to reject schemas and lexicons that large before encoding.
pub fn encode(field: FieldIndex, value: ValueId) -> Item {
    debug_assert!(field <= MAX_FIELD, "field index {field} out of range");
    debug_assert!(value <= MAX_VALUE, "value id {value} out of range");

    let field = u64::from(field);
    if field <= u64::from(MAX_NARROW_FIELD) && value <= MAX_NARROW_VALUE {
        field | (value << NARROW_VALUE_SHIFT)
    } else {
        (field & FIELD_GROUP_MASK)
            | WIDE_FLAG
            | (((field >> 7) & FIELD_GROUP_MASK) << 8)
            | ((value & MAX_VALUE) << WIDE_VALUE_SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_field_is_low_seven_bits() {
        assert!(is_narrow(0x0000_0000_0000_0305));
        assert_eq!(field_index(0x0305), 5);
        assert_eq!(value_id(0x0305), 3);
    }

    #[test]
    fn wide_field_joins_two_groups() {
        // low group 0x05, high group 0x02 -> 5 | (2 << 7) = 261
        let item = 0x0000_0000_0009_0285;
        assert!(!is_narrow(item));
        assert_eq!(field_index(item), 261);
        assert_eq!(value_id(item), 9);
    }

    #[test]
    fn wide_ignores_bit_fifteen() {
        assert_eq!(field_index(0x8085), 5);
    }

    #[test]
    fn encode_prefers_narrow() {
        let item = encode(3, 42);
        assert!(is_narrow(item));
        assert_eq!(item, 3 | (42 << 8));
    }

    #[test]
    fn encode_switches_to_wide_for_large_fields() {
        let item = encode(200, 7);
        assert!(!is_narrow(item));
        assert_eq!(field_index(item), 200);
        assert_eq!(value_id(item), 7);
    }

    #[test]
    fn encode_switches_to_wide_for_large_values() {
        let item = encode(1, MAX_NARROW_VALUE + 1);
        assert!(!is_narrow(item));
        assert_eq!(field_index(item), 1);
        assert_eq!(value_id(item), MAX_NARROW_VALUE + 1);
    }

    #[test]
    fn no_match_is_timestamp_field() {
        assert_eq!(field_index(NO_MATCH), 0);
        assert_eq!(value_id(NO_MATCH), 0);
    }
}
