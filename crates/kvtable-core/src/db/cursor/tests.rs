use crate::{
    db::IteratorStatus,
    error::{InternalError, TableError},
    test_support::{Blob, memory_host, seeded_table},
};

fn invalid_op(err: &InternalError) -> Option<&'static str> {
    match err.table_error() {
        Some(TableError::InvalidIteratorOp { op, .. }) => Some(*op),
        _ => None,
    }
}

#[test]
fn walks_forward_and_backward() {
    let host = memory_host();
    let table = seeded_table(&host, &[1, 2, 3]);

    let mut cursor = table.begin().unwrap();
    assert_eq!(cursor.key().unwrap(), 1);
    assert_eq!(cursor.next().unwrap(), IteratorStatus::Positioned);
    assert_eq!(cursor.key().unwrap(), 2);
    assert_eq!(cursor.value().unwrap(), Blob::new(2, "blob 2"));

    assert_eq!(cursor.prev().unwrap(), IteratorStatus::Positioned);
    assert_eq!(cursor.key().unwrap(), 1);
}

#[test]
fn next_on_end_is_invalid() {
    let host = memory_host();
    let table = seeded_table(&host, &[1]);

    let mut cursor = table.find(&1).unwrap();
    assert_eq!(cursor.next().unwrap(), IteratorStatus::End);
    assert!(cursor.is_end().unwrap());

    let err = cursor.next().unwrap_err();
    assert_eq!(invalid_op(&err), Some("next"));
}

#[test]
fn prev_before_first_is_invalid() {
    let host = memory_host();
    let table = seeded_table(&host, &[1, 2]);

    let mut cursor = table.begin().unwrap();
    let err = cursor.prev().unwrap_err();

    assert_eq!(invalid_op(&err), Some("prev"));
}

#[test]
fn prev_from_end_reaches_last() {
    let host = memory_host();
    let table = seeded_table(&host, &[4, 9]);

    let mut cursor = table.end().unwrap();
    cursor.prev().unwrap();

    assert_eq!(cursor.key().unwrap(), 9);
}

#[test]
fn prev_from_end_of_empty_table_is_invalid() {
    let host = memory_host();
    let table = seeded_table(&host, &[]);

    let mut cursor = table.end().unwrap();
    let err = cursor.prev().unwrap_err();

    assert_eq!(invalid_op(&err), Some("prev"));
}

#[test]
fn reads_on_end_are_invalid() {
    let host = memory_host();
    let table = seeded_table(&host, &[]);
    let cursor = table.end().unwrap();

    assert_eq!(invalid_op(&cursor.key().unwrap_err()), Some("key"));
    assert_eq!(invalid_op(&cursor.value().unwrap_err()), Some("value"));
}

#[test]
fn erased_cursor_keeps_cached_key_and_can_advance() {
    let host = memory_host();
    let table = seeded_table(&host, &[1, 2, 3]);

    let mut cursor = table.find(&2).unwrap();
    assert_eq!(cursor.key().unwrap(), 2);

    table.erase(&2).unwrap();
    assert_eq!(cursor.status().unwrap(), IteratorStatus::Erased);
    assert_eq!(cursor.key().unwrap(), 2);

    let err = cursor.value().unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(cursor.next().unwrap(), IteratorStatus::Positioned);
    assert_eq!(cursor.key().unwrap(), 3);
}

#[test]
fn equality_follows_keys_and_end() {
    let host = memory_host();
    let table = seeded_table(&host, &[1, 2]);

    let a = table.find(&2).unwrap();
    let mut b = table.begin().unwrap();
    assert!(a != b);

    b.next().unwrap();
    assert!(a == b);

    let end_a = table.end().unwrap();
    let end_b = table.find(&77).unwrap();
    assert!(end_a == end_b);
    assert!(end_a != a);
}

#[test]
fn release_returns_handle_to_pool() {
    let host = memory_host();
    let table = seeded_table(&host, &[1]);
    let index = table.primary().unwrap();

    let cursor = table.begin().unwrap();
    assert_eq!(index.pooled_handles(), 0);

    cursor.release().unwrap();
    assert_eq!(index.pooled_handles(), 1);
    assert_eq!(host.live_iterators(), 1);
}

#[test]
fn cursors_found_on_an_erased_key_stay_equal() {
    let host = memory_host();
    let table = seeded_table(&host, &[1, 2, 3]);

    let a = table.find(&2).unwrap();
    let b = table.find(&2).unwrap();
    table.erase(&2).unwrap();

    assert_eq!(a.status().unwrap(), IteratorStatus::Erased);
    assert_eq!(b.status().unwrap(), IteratorStatus::Erased);
    assert_eq!(a.key().unwrap(), 2);
    assert!(a.try_eq(&b).unwrap());
    assert!(a == b);
}

#[test]
fn unread_erased_key_comes_back_from_the_store() {
    let host = memory_host();
    let table = seeded_table(&host, &[1, 2]);

    let cursor = table.begin().unwrap();
    table.erase(&1).unwrap();

    assert_eq!(cursor.status().unwrap(), IteratorStatus::Erased);
    assert_eq!(cursor.key().unwrap(), 1);
}
