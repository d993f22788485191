use std::io::Write;
use std::time::Duration;

use tempfile::{NamedTempFile, TempDir};

use crate::{
    is_date_shaped, load_seed_file, parse_seed_line, BookStore, CellValue, Column, StoreError,
    StoreErrorKind,
};

/// Helper to open an in-memory store with the table created.
fn open_store() -> BookStore {
    let store = BookStore::open_memory().unwrap();
    assert!(store.create_table().unwrap());
    store
}

/// Helper to build a full row with the given ISBN.
fn book(isbn: &str) -> [String; 9] {
    [
        isbn.to_string(),
        format!("Title {}", isbn),
        "2010".into(),
        "Knuth".into(),
        "300".into(),
        "3".into(),
        "12.50".into(),
        "7".into(),
        "2021/05/01".into(),
    ]
}

fn insert(store: &BookStore, row: &[String; 9]) -> Result<(), StoreError> {
    let values: [&str; 9] = std::array::from_fn(|i| row[i].as_str());
    store.insert(&values)
}

// -----------------------------------------------------------------------
// 1. test_create_table_is_idempotent
// -----------------------------------------------------------------------
#[test]
fn test_create_table_is_idempotent() {
    let store = open_store();
    assert!(!store.create_table().unwrap());
    assert_eq!(store.count().unwrap(), 0);
}

// -----------------------------------------------------------------------
// 2. test_select_before_create_fails
// -----------------------------------------------------------------------
#[test]
fn test_select_before_create_fails() {
    let store = BookStore::open_memory().unwrap();
    let result = store.select_all();
    assert!(matches!(result, Err(StoreError::TableNotFound(_))));
}

// -----------------------------------------------------------------------
// 3. test_insert_and_select_preserves_order
// -----------------------------------------------------------------------
#[test]
fn test_insert_and_select_preserves_order() {
    let store = open_store();
    insert(&store, &book("b")).unwrap();
    insert(&store, &book("a")).unwrap();
    insert(&store, &book("c")).unwrap();

    let rows = store.select_all().unwrap();
    assert_eq!(rows.row_count(), 3);
    assert_eq!(rows.column_count(), 9);
    let names: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
    assert_eq!(rows.columns(), names.as_slice());

    let isbns: Vec<String> = (0..3).map(|i| rows.text(i, Column::Isbn).unwrap()).collect();
    assert_eq!(isbns, vec!["b", "a", "c"]);
}

// -----------------------------------------------------------------------
// 4. test_values_are_coerced_to_column_types
// -----------------------------------------------------------------------
#[test]
fn test_values_are_coerced_to_column_types() {
    let store = open_store();
    insert(&store, &book("1")).unwrap();

    let row = store.fetch("1").unwrap().unwrap();
    assert_eq!(row[Column::YearPublished.index()], CellValue::Integer(2010));
    assert_eq!(row[Column::Price.index()], CellValue::Real(12.5));
    assert_eq!(
        row[Column::LastShipReceived.index()],
        CellValue::Text("2021/05/01".into())
    );
    assert_eq!(row[Column::Price.index()].display().as_deref(), Some("12.50"));
}

// -----------------------------------------------------------------------
// 5. test_duplicate_isbn_is_classified
// -----------------------------------------------------------------------
#[test]
fn test_duplicate_isbn_is_classified() {
    let store = open_store();
    insert(&store, &book("dup")).unwrap();
    let err = insert(&store, &book("dup")).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::DuplicateKey);
    assert_eq!(store.count().unwrap(), 1);
}

// -----------------------------------------------------------------------
// 6. test_type_mismatch_is_rejected_by_store
// -----------------------------------------------------------------------
#[test]
fn test_type_mismatch_is_rejected_by_store() {
    let store = open_store();
    let mut row = book("x");
    row[Column::Pages.index()] = "many".into();
    let err = insert(&store, &row).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::TypeMismatch);
    assert_eq!(store.count().unwrap(), 0);
}

// -----------------------------------------------------------------------
// 7. test_date_shape_check_constraint
// -----------------------------------------------------------------------
#[test]
fn test_date_shape_check_constraint() {
    let store = open_store();
    insert(&store, &book("d")).unwrap();

    let err = store
        .update_cell("d", Column::LastShipReceived, "2021-05-01")
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::CheckFailed);

    let row = store.fetch("d").unwrap().unwrap();
    assert_eq!(
        row[Column::LastShipReceived.index()],
        CellValue::Text("2021/05/01".into())
    );
}

// -----------------------------------------------------------------------
// 8. test_update_and_delete
// -----------------------------------------------------------------------
#[test]
fn test_update_and_delete() {
    let store = open_store();
    insert(&store, &book("u")).unwrap();

    assert_eq!(store.update_cell("u", Column::CurStock, "0").unwrap(), 1);
    assert_eq!(store.update_cell("missing", Column::CurStock, "0").unwrap(), 0);
    let row = store.fetch("u").unwrap().unwrap();
    assert_eq!(row[Column::CurStock.index()], CellValue::Integer(0));

    assert_eq!(store.delete("u").unwrap(), 1);
    assert_eq!(store.delete("u").unwrap(), 0);
    assert!(store.fetch("u").unwrap().is_none());
}

// -----------------------------------------------------------------------
// 9. test_bound_parameters_are_not_sql
// -----------------------------------------------------------------------
#[test]
fn test_bound_parameters_are_not_sql() {
    let store = open_store();
    insert(&store, &book("safe")).unwrap();

    let hostile = "' OR '1'='1";
    let rows = store
        .select(Some("\"ISBN\" = ?1"), &[&hostile])
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(store.delete(hostile).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
}

// -----------------------------------------------------------------------
// 10. test_rowset_lookup_helpers
// -----------------------------------------------------------------------
#[test]
fn test_rowset_lookup_helpers() {
    let store = open_store();
    insert(&store, &book("first")).unwrap();
    insert(&store, &book("second")).unwrap();

    let mut rows = store.select_all().unwrap();
    assert_eq!(rows.find_isbn("second"), Some(1));
    assert_eq!(rows.find_isbn("third"), None);
    assert_eq!(rows.position_of("author"), Some(Column::Author.index()));

    let json = rows.to_json();
    assert_eq!(json[0]["ISBN"], "first");
    assert_eq!(json[0]["PAGES"], 300);

    let replacement = store.fetch("first").unwrap().unwrap();
    assert!(rows.replace_row(1, replacement));
    assert!(!rows.replace_row(5, Vec::new()));
    assert_eq!(rows.find_isbn("first"), Some(0));
}

// -----------------------------------------------------------------------
// 11. test_open_file_store_persists
// -----------------------------------------------------------------------
#[test]
fn test_open_file_store_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.db");
    {
        let store = BookStore::open(&path, Duration::from_millis(500)).unwrap();
        assert!(store.create_table().unwrap());
        insert(&store, &book("kept")).unwrap();
    }
    let store = BookStore::open(&path, Duration::from_millis(500)).unwrap();
    assert!(!store.create_table().unwrap());
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(CellValue::Null.display(), None);
}

// -----------------------------------------------------------------------
// 12. test_date_shape
// -----------------------------------------------------------------------
#[test]
fn test_date_shape() {
    assert!(is_date_shaped("2021/05/01"));
    assert!(!is_date_shaped("2021-05-01"));
    assert!(!is_date_shaped("2021/5/01"));
    assert!(!is_date_shaped("21/05/2021"));
    assert!(!is_date_shaped(""));
}

// -----------------------------------------------------------------------
// 13. test_parse_seed_line
// -----------------------------------------------------------------------
#[test]
fn test_parse_seed_line() {
    let fields =
        parse_seed_line("1::Dune::1965::Herbert::412::2::9.99::40::2020/01/15", 1).unwrap();
    assert_eq!(fields[1], "Dune");
    assert_eq!(fields[8], "2020/01/15");

    let short = parse_seed_line("1::Dune::1965", 4).unwrap_err();
    assert!(format!("{}", short).contains("line 4"));

    let missing = parse_seed_line("1::::1965::Herbert::412::2::9.99::40::2020/01/15", 2);
    assert!(matches!(missing, Err(StoreError::Seed { line: 2, .. })));
}

// -----------------------------------------------------------------------
// 14. test_load_seed_file_skips_bad_lines
// -----------------------------------------------------------------------
#[test]
fn test_load_seed_file_skips_bad_lines() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::open(dir.path().join("books.db"), Duration::from_millis(500)).unwrap();
    assert!(store.create_table().unwrap());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "1::Dune::1965::Herbert::412::2::9.99::40::2020/01/15").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "2::Emma::1815::Austen::474::0::5.50::12::2019/11/02").unwrap();
    writeln!(file, "3::Broken::year::Nobody::10::1::1.00::1::2019/11/02").unwrap();
    writeln!(file, "4::Too::Short").unwrap();
    writeln!(file, "1::Dune again::1965::Herbert::412::2::9.99::40::2020/01/15").unwrap();
    file.flush().unwrap();

    let report = load_seed_file(&store, file.path()).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(store.count().unwrap(), 2);
}

// -----------------------------------------------------------------------
// 15. test_column_metadata
// -----------------------------------------------------------------------
#[test]
fn test_column_metadata() {
    let immutable: Vec<Column> = Column::ALL.into_iter().filter(|c| c.is_immutable()).collect();
    assert_eq!(
        immutable,
        vec![
            Column::Isbn,
            Column::BookName,
            Column::YearPublished,
            Column::Author,
            Column::Pages
        ]
    );
    assert_eq!(Column::from_name("last_ship_received"), Some(Column::LastShipReceived));
    assert_eq!(Column::from_name("nope"), None);
    for (i, col) in Column::ALL.iter().enumerate() {
        assert_eq!(col.index(), i);
    }
}

// -----------------------------------------------------------------------
// 16. test_price_is_stored_in_cents
// -----------------------------------------------------------------------
#[test]
fn test_price_is_stored_in_cents() {
    let store = open_store();
    let mut row = book("1");
    row[Column::Price.index()] = "12.345".into();
    insert(&store, &row).unwrap();

    let stored = store.fetch("1").unwrap().unwrap();
    let price = &stored[Column::Price.index()];
    assert_eq!(price, &CellValue::Real(12.35));
    assert_eq!(price.display().as_deref(), Some("12.35"));

    store.update_cell("1", Column::Price, " 9.999 ").unwrap();
    let stored = store.fetch("1").unwrap().unwrap();
    assert_eq!(stored[Column::Price.index()], CellValue::Real(10.0));

    let err = store.update_cell("1", Column::Price, "cheap").unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::TypeMismatch);

    assert_eq!(Column::Price.normalize("4"), "4.00");
    assert_eq!(Column::CurStock.normalize("4.567"), "4.567");
}
