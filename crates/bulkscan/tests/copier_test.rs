//! Tests for bulkscan copier module

mod common;

use bulkscan::prelude::*;
use common::{MemoryConnection, MemoryTable};

#[tokio::test]
async fn test_copy_every_row_in_key_order() {
    let source = MemoryConnection::new(MemoryTable::with_keys([3, 1, 2]));
    let target = MemoryConnection::empty();

    let mut ctx = IntegerKeyContext::for_table("items").unwrap();
    let mut rows = BufferedRowIterator::new(&source, &mut ctx, 2).unwrap();
    let copier = RowCopier::new(&target, "items_archive").unwrap();

    let stats = copier.copy_from(&mut rows).await.unwrap();
    assert_eq!(stats.rows_copied, 3);
    assert_eq!(stats.rows_affected, 3);

    let inserts = target.inserts();
    assert_eq!(inserts.len(), 3);
    for (i, (sql, params)) in inserts.iter().enumerate() {
        assert_eq!(sql, "INSERT INTO `items_archive` SET `id` = ?, `name` = ?");
        assert_eq!(params[0], Value::Int64(i as i64 + 1));
    }
}

#[tokio::test]
async fn test_copy_with_transform() {
    let source = MemoryConnection::new(MemoryTable::with_keys(1..=4));
    let target = MemoryConnection::empty();

    let mut ctx = IntegerKeyContext::for_table("items").unwrap();
    let mut rows = BufferedRowIterator::new(&source, &mut ctx, 3).unwrap();
    let copier = RowCopier::new(&target, "items_copy")
        .unwrap()
        .with_transform(|mut row| {
            let name = row
                .get_by_name("name")
                .and_then(Value::as_str)
                .map(str::to_uppercase);
            if let Some(name) = name {
                row.set("name", name);
            }
            row.set("migrated", true);
            row
        });

    copier.copy_from(&mut rows).await.unwrap();

    let inserts = target.inserts();
    assert_eq!(inserts.len(), 4);
    assert_eq!(
        inserts[3].0,
        "INSERT INTO `items_copy` SET `id` = ?, `name` = ?, `migrated` = ?"
    );
    assert_eq!(
        inserts[3].1,
        vec![
            Value::Int64(4),
            Value::String("ROW-4".into()),
            Value::Bool(true)
        ]
    );
}

#[tokio::test]
async fn test_copy_empty_table() {
    let source = MemoryConnection::empty();
    let target = MemoryConnection::empty();

    let mut ctx = IntegerKeyContext::for_table("items").unwrap();
    let mut rows = BufferedRowIterator::new(&source, &mut ctx, 100).unwrap();
    let copier = RowCopier::new(&target, "items_copy").unwrap();

    let stats = copier.copy_from(&mut rows).await.unwrap();
    assert_eq!(stats.rows_copied, 0);
    assert!(target.inserts().is_empty());
}

#[tokio::test]
async fn test_copy_stops_on_source_failure() {
    let source = MemoryConnection::new(MemoryTable::with_keys(1..=5));
    let target = MemoryConnection::empty();

    let mut ctx = IntegerKeyContext::for_table("items").unwrap();
    let mut rows = BufferedRowIterator::new(&source, &mut ctx, 2).unwrap();
    rows.rewind().await.unwrap();
    source.fail_next_queries(1);

    let copier = RowCopier::new(&target, "items_copy").unwrap();
    let err = copier.copy_from(&mut rows).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Query);
    assert!(target.inserts().is_empty());
}

#[tokio::test]
async fn test_copy_from_stream_with_postgres_dialect() {
    let source = MemoryConnection::new(MemoryTable::with_keys(1..=3));
    let target = MemoryConnection::empty();

    let mut ctx = IntegerKeyContext::for_table("items").unwrap();
    let rows = BufferedRowIterator::new(&source, &mut ctx, 10).unwrap();
    let copier = RowCopier::new(&target, "items_copy")
        .unwrap()
        .with_dialect(Box::new(PostgresDialect));

    let stats = copier.copy_stream(rows.into_stream()).await.unwrap();
    assert_eq!(stats.rows_copied, 3);
    assert!(target.inserts()[0].0.contains("VALUES ($1, $2)"));
}
