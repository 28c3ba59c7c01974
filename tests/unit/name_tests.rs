//! Name parsing and comparison tests

use rust_sqldiff::Name;

#[test]
fn test_same_three_part_names_are_equal() {
    assert_eq!(Name::parse("dbo.a.b"), Name::parse("dbo.a.b"));
}

#[test]
fn test_any_differing_part_breaks_equality() {
    let name = Name::parse("db.a.b").unwrap();
    assert_ne!(name, Name::parse("db.a.c").unwrap());
    assert_ne!(name, Name::parse("db.x.b").unwrap());
    assert_ne!(name, Name::parse("other.a.b").unwrap());
}

#[test]
fn test_missing_parts() {
    let without = Name::from_parts(None, Some("dbo"), Some("foo"));
    let with = Name::from_parts(Some("db"), Some("dbo"), Some("foo"));
    assert_eq!(without, Name::from_parts(None, Some("dbo"), Some("foo")));
    assert_ne!(without, with);
}

#[test]
fn test_case_is_ignored() {
    assert_eq!(
        Name::parse("[DBO].[Foo]").unwrap(),
        Name::parse("dbo.foo").unwrap()
    );
}

#[test]
fn test_default_owner() {
    let name = Name::parse("foo").unwrap();
    assert_eq!(name, Name::parse("[dbo].[foo]").unwrap());
    assert_eq!(name.to_string(), "[dbo].[foo]");
}

#[test]
fn test_empty_text_is_not_a_name() {
    assert!(Name::parse("").is_none());
}
