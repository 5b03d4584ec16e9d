use super::*;

fn name(s: &str) -> Name {
    Name::try_from_str(s).unwrap()
}

#[test]
fn keeps_the_text_it_was_built_from() {
    let n = name("eosio.token");

    assert_eq!(n.as_bytes(), b"eosio.token");
    assert_eq!(n.to_string(), "eosio.token");
    assert_eq!(format!("{n:?}"), "Name(eosio.token)");
    assert_eq!("eosio.token".parse::<Name>().unwrap(), n);
}

#[test]
fn invalid_text_is_rejected() {
    assert!(matches!(Name::try_from_str(""), Err(NameError::Empty)));
    assert!(matches!(
        Name::try_from_str(&"a".repeat(MAX_NAME_LEN + 1)),
        Err(NameError::TooLong(_))
    ));
    assert!(matches!(
        Name::try_from_str(&"a".repeat(300)),
        Err(NameError::TooLong(_))
    ));
    assert!(matches!(
        Name::try_from_str("caf\u{e9}"),
        Err(NameError::NonAscii)
    ));

    assert_eq!(name(&"z".repeat(MAX_NAME_LEN)).as_bytes().len(), MAX_NAME_LEN);
}

#[test]
fn stored_form_is_validated_on_the_way_back() {
    let good = name("abc").to_bytes();
    assert_eq!(Name::from_bytes(&good).unwrap(), name("abc"));

    assert!(matches!(
        Name::from_bytes(&good[..Name::STORED_LEN - 1]),
        Err(NameError::StoredSize(12))
    ));

    let mut bad = good;
    bad[0] = 0;
    assert!(matches!(Name::from_bytes(&bad), Err(NameError::StoredLength(0))));

    let mut bad = good;
    bad[Name::STORED_LEN - 1] = b'x';
    assert!(matches!(Name::from_bytes(&bad), Err(NameError::StoredPadding)));

    let mut bad = good;
    bad[1] = 0xff;
    assert!(matches!(Name::from_bytes(&bad), Err(NameError::NonAscii)));
}

#[test]
fn shorter_names_sort_first() {
    let mut names = ["b", "aa", "a", "kvram", "kvdisk"].map(name);
    names.sort();

    assert_eq!(
        names.map(|n| n.to_string()),
        ["a", "b", "aa", "kvram", "kvdisk"]
    );
}

#[test]
fn table_path_displays_owner_then_table() {
    let path = TablePath::new(name("alice"), name("notes"));

    assert_eq!(path.to_string(), "alice.notes");
}
