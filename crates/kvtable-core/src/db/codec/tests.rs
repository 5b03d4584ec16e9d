use super::*;
use crate::{
    error::TableError,
    test_support::{Blob, blob_with_packed_size},
};
use proptest::prelude::*;
use std::cmp::Ordering;

fn assert_packed_order<K: KeyCodec>(left: &K, right: &K) {
    let expected = left.cmp(right);
    let actual = left.pack().as_slice().cmp(right.pack().as_slice());

    assert_eq!(
        actual, expected,
        "packed order diverged from Ord for {left:?} vs {right:?}"
    );
}

fn roundtrip<K: KeyCodec>(key: &K) -> K {
    K::unpack(key.pack().as_slice()).expect("key should unpack")
}

#[test]
fn signed_keys_sort_negative_first() {
    let keys = [i64::MIN, -1_000, -1, 0, 1, 1_000, i64::MAX];

    for pair in keys.windows(2) {
        assert_packed_order(&pair[0], &pair[1]);
        assert_eq!(
            pair[0].pack().as_slice().cmp(pair[1].pack().as_slice()),
            Ordering::Less
        );
    }
}

#[test]
fn fixed_width_keys_report_their_width() {
    assert_eq!(7u64.pack().len(), <u64 as FixedWidthKey>::WIDTH);
    assert_eq!((-7i32).pack().len(), <i32 as FixedWidthKey>::WIDTH);
    assert_eq!(Ulid::nil().pack().len(), <Ulid as FixedWidthKey>::WIDTH);
    assert_eq!(
        Name::try_from_str("kv").unwrap().pack().len(),
        <Name as FixedWidthKey>::WIDTH
    );
}

#[test]
fn unpack_rejects_wrong_length() {
    let err = u64::unpack(&[0u8; 7]).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidLength {
            expected: 8,
            found: 7
        }
    ));

    let err = u32::unpack(&[0u8; 5]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidLength { .. }));
}

#[test]
fn bool_rejects_non_canonical_byte() {
    assert!(!bool::unpack(&[0]).unwrap());
    assert!(bool::unpack(&[1]).unwrap());
    assert!(matches!(bool::unpack(&[2]), Err(DecodeError::InvalidBool(2))));
}

#[test]
fn string_rejects_invalid_utf8() {
    let err = String::unpack(&[0xff, 0xfe]).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidUtf8));
}

#[test]
fn composite_key_splits_on_fixed_head() {
    let key = (42u32, "tail".to_string());
    let packed = key.pack();

    assert_eq!(packed.len(), 4 + 4);
    assert_eq!(roundtrip(&key), key);

    let err = <(u64, String)>::unpack(&[0u8; 3]).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated { min: 8, found: 3 }));
}

#[test]
fn composite_key_orders_by_head_then_tail() {
    let keys = [
        (1u16, "b".to_string()),
        (1u16, "ba".to_string()),
        (2u16, String::new()),
        (2u16, "a".to_string()),
    ];

    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1]);
        assert_packed_order(&pair[0], &pair[1]);
    }
}

#[test]
fn decode_error_maps_to_table_decode_detail() {
    let err: InternalError = DecodeError::InvalidUtf8.into();

    assert!(matches!(err.table_error(), Some(TableError::Decode { .. })));
}

#[test]
fn value_roundtrip_through_packed_buffer() {
    let blob = Blob::new(3, "three");
    let packed = pack_value(&blob).expect("pack");

    assert_eq!(packed.len(), value_packed_size(&blob).expect("size"));
    assert_eq!(
        unpack_value::<Blob>(packed.as_slice(), usize::MAX).expect("unpack"),
        blob
    );
}

#[test]
fn value_unpack_rejects_truncated_payload() {
    let packed = pack_value(&Blob::new(1, "one")).expect("pack");

    let err = unpack_value::<Blob>(&packed[..packed.len() - 1], usize::MAX).unwrap_err();
    assert!(matches!(err.table_error(), Some(TableError::Decode { .. })));
}

#[test]
fn value_unpack_enforces_size_limit() {
    let packed = pack_value(&Blob::new(1, "one")).expect("pack");

    let err = unpack_value::<Blob>(packed.as_slice(), packed.len() - 1).unwrap_err();
    assert!(matches!(err.table_error(), Some(TableError::Decode { .. })));
}

#[test]
fn values_at_and_past_fast_threshold_roundtrip() {
    use crate::db::buffer::FAST_BUFFER_BYTES;

    for target in [FAST_BUFFER_BYTES, FAST_BUFFER_BYTES + 1] {
        let blob = blob_with_packed_size(1, target);
        let packed = pack_value(&blob).expect("pack");

        assert_eq!(packed.len(), target);
        assert_eq!(packed.is_inline(), target <= FAST_BUFFER_BYTES);
        assert_eq!(
            unpack_value::<Blob>(packed.as_slice(), usize::MAX).expect("unpack"),
            blob
        );
    }
}

proptest! {
    #[test]
    fn u64_order_matches_packed_order(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(a.cmp(&b), a.pack().as_slice().cmp(b.pack().as_slice()));
    }

    #[test]
    fn i64_order_matches_packed_order(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(a.cmp(&b), a.pack().as_slice().cmp(b.pack().as_slice()));
    }

    #[test]
    fn i128_roundtrips(a in any::<i128>()) {
        prop_assert_eq!(roundtrip(&a), a);
    }

    #[test]
    fn string_order_matches_packed_order(a in ".{0,24}", b in ".{0,24}") {
        prop_assert_eq!(a.cmp(&b), a.pack().as_slice().cmp(b.pack().as_slice()));
        prop_assert_eq!(roundtrip(&a), a);
    }

    #[test]
    fn composite_order_matches_packed_order(
        a in (any::<u32>(), proptest::collection::vec(any::<u8>(), 0..16)),
        b in (any::<u32>(), proptest::collection::vec(any::<u8>(), 0..16)),
    ) {
        prop_assert_eq!(a.cmp(&b), a.pack().as_slice().cmp(b.pack().as_slice()));
        prop_assert_eq!(roundtrip(&a), a);
    }

    #[test]
    fn values_roundtrip(id in any::<u64>(), body in ".{0,64}") {
        let blob = Blob::new(id, &body);
        let packed = pack_value(&blob).unwrap();

        prop_assert_eq!(unpack_value::<Blob>(packed.as_slice(), usize::MAX).unwrap(), blob);
    }
}
