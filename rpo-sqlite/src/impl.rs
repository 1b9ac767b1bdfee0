//! Repository trait implementations for the SQLite warehouse.

use crate::Db;
use rpo_core::ports::Repository;
use sqlx::{Sqlite, query_builder::Separated};

mod elasticity;
mod history;
mod optimization;

impl Repository for Db {
    type Error = sqlx::Error;
}

/// Rows per insert statement. The widest table has 25 columns, which keeps
/// every statement under SQLite's limit of 32766 bound parameters.
const INSERT_CHUNK: usize = 1024;

/// Empty `table` and insert `rows` in its place, in a single transaction.
///
/// `push_row` binds one row's values, in the order of `columns`.
pub(crate) async fn replace_table<'a, T, F>(
    pool: &sqlx::Pool<Sqlite>,
    table: &'static str,
    columns: &'static str,
    rows: &'a [T],
    mut push_row: F,
) -> Result<(), sqlx::Error>
where
    T: Sync,
    F: FnMut(Separated<'_, 'a, Sqlite, &'static str>, &'a T) + Send,
{
    let mut tx = pool.begin().await?;

    let delete = format!("delete from {table}");
    sqlx::query(&delete).execute(&mut *tx).await?;

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut query_builder =
            sqlx::QueryBuilder::<'a, Sqlite>::new(format!("insert into {table} ({columns}) "));
        query_builder.push_values(chunk, |b, row| push_row(b, row));
        query_builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;
    tracing::debug!(table, rows = rows.len(), "table replaced");
    Ok(())
}
