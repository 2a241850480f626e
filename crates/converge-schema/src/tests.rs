use super::*;
use proptest::prelude::*;

fn tagged_column(name: &str, tag_str: &str) -> Column {
    let mut col = Column::introspected(name, "TEXT");
    col.tags = parse_tag(tag_str).unwrap();
    col
}

#[test]
fn parse_tag_key_value_pairs() {
    let tags = parse_tag("name:email;width:255;default:now()").unwrap();
    assert_eq!(tags.get("name").map(String::as_str), Some("email"));
    assert_eq!(tags.get("width").map(String::as_str), Some("255"));
    assert_eq!(tags.get("default").map(String::as_str), Some("now()"));
}

#[test]
fn parse_tag_bare_keys_and_trailing_separator() {
    let tags = parse_tag("unique;primary;").unwrap();
    assert_eq!(tags.get("unique").map(String::as_str), Some(""));
    assert_eq!(tags.get("primary").map(String::as_str), Some(""));
    assert_eq!(tags.len(), 2);
}

#[test]
fn parse_tag_preserves_unknown_keys() {
    let tags = parse_tag("frobnicate:yes;unique").unwrap();
    assert_eq!(tags.get("frobnicate").map(String::as_str), Some("yes"));
}

#[test]
fn parse_tag_rejects_empty_key() {
    let err = parse_tag("unique;:oops").unwrap_err();
    assert!(matches!(err, TagError::EmptyKey { position: 1, .. }));
}

#[test]
fn parse_tag_empty_string_is_empty_map() {
    assert!(parse_tag("").unwrap().is_empty());
}

#[test]
fn bool_tag_coercion() {
    let tags = parse_tag("a;b:true;c:1;d:false;e:0;f:maybe").unwrap();
    assert_eq!(bool_tag(&tags, "a"), Some(true));
    assert_eq!(bool_tag(&tags, "b"), Some(true));
    assert_eq!(bool_tag(&tags, "c"), Some(true));
    assert_eq!(bool_tag(&tags, "d"), Some(false));
    assert_eq!(bool_tag(&tags, "e"), Some(false));
    assert_eq!(bool_tag(&tags, "f"), None);
    assert_eq!(bool_tag(&tags, "absent"), None);
}

#[test]
fn index_identity_ignores_column_order() {
    let a = Index::new("t", "", vec!["a".into(), "b".into()], false);
    let b = Index::new("t", "", vec!["b".into(), "a".into()], false);
    assert!(a.is_identical(&["b", "a"]));
    assert!(a.same_columns(&b));
    assert!(!a.is_identical(&["a"]));
    assert!(!a.is_identical(&["a", "c"]));
}

#[test]
fn index_default_name_truncates_to_64_chars() {
    let table = "a_very_long_table_name_that_keeps_going_and_going_and_going";
    let idx = Index::new(table, "", vec!["some_column_name".into()], false);
    assert_eq!(idx.name().len(), 64);
    assert!(idx.name().starts_with("idx_a_very_long_table_name"));
}

#[test]
fn index_explicit_name_wins() {
    let idx = Index::new("t", "my_idx", vec!["a".into()], true);
    assert_eq!(idx.name(), "my_idx");
    assert!(idx.is_unique());
}

#[test]
fn composite_index_orders_by_descending_priority() {
    let cols = vec![
        tagged_column("low", "index:idx1,priority:2"),
        tagged_column("high", "index:idx1,priority:5"),
    ];
    let indexes = collect_indexes("t", &cols).unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].name(), "idx1");
    assert_eq!(indexes[0].columns(), ["high", "low"]);
}

#[test]
fn composite_index_ties_break_by_declaration_order() {
    let cols = vec![
        tagged_column("first", "index:idx1,priority:1"),
        tagged_column("second", "index:idx1,priority:1"),
        tagged_column("third", "index:idx1"),
    ];
    let indexes = collect_indexes("t", &cols).unwrap();
    assert_eq!(indexes[0].columns(), ["first", "second", "third"]);
}

#[test]
fn unique_tag_creates_implicit_unique_index() {
    let cols = vec![tagged_column("email", "unique")];
    let indexes = collect_indexes("t", &cols).unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].name(), "email_unique");
    assert!(indexes[0].is_unique());
    assert_eq!(indexes[0].columns(), ["email"]);
}

#[test]
fn bare_index_tag_creates_single_column_index() {
    let cols = vec![tagged_column("age", "index")];
    let indexes = collect_indexes("t", &cols).unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].name(), "idx_t_age");
    assert!(!indexes[0].is_unique());
}

#[test]
fn bad_priority_is_rejected() {
    let cols = vec![tagged_column("a", "index:idx1,priority:soon")];
    let err = collect_indexes("t", &cols).unwrap_err();
    assert!(matches!(err, IndexTagError::BadPriority { .. }));
}

#[test]
fn table_add_index_rejects_identical_column_set() {
    let mut table = Table::new("t");
    assert!(table.add_index(false, &["a", "b"]));
    assert!(!table.add_index(true, &["b", "a"]));
    assert_eq!(table.indexes.len(), 1);
}

#[test]
fn extra_options_are_copied_on_read() {
    let mut table = Table::new("t");
    let mut opts = indexmap::IndexMap::new();
    opts.insert("engine".to_string(), "InnoDB".to_string());
    table.set_extra_options(opts);

    let mut copy = table.extra_options();
    copy.insert("engine".to_string(), "MyISAM".to_string());
    assert_eq!(
        table.extra_options().get("engine").map(String::as_str),
        Some("InnoDB")
    );
}

proptest! {
    /// Any well-formed set of key/value pairs survives a render/parse cycle.
    #[test]
    fn parse_tag_roundtrips_wellformed_input(
        pairs in proptest::collection::btree_map(
            "[a-z_]{1,12}",
            "[a-zA-Z0-9_()]{0,12}",
            0..6,
        )
    ) {
        let rendered = pairs
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{}:{}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join(";");
        let parsed = parse_tag(&rendered).unwrap();
        prop_assert_eq!(parsed.len(), pairs.len());
        for (k, v) in &pairs {
            prop_assert_eq!(parsed.get(k).map(String::as_str), Some(v.as_str()));
        }
    }
}
