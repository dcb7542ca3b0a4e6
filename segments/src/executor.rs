use crate::compiler::SqlValue;
use crate::evaluator::SegmentQuery;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use std::marker::PhantomData;

/// Runs a fully assembled segment query against the entity store
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    type Row: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Binds `query.parameters` positionally and returns the matching rows
    async fn execute_query(&self, query: &SegmentQuery) -> Result<Vec<Self::Row>, Self::Error>;
}

/// SQLite-backed executor mapping each row into `T`
pub struct SqliteExecutor<T> {
    pool: SqlitePool,
    _row: PhantomData<fn() -> T>,
}

impl<T> SqliteExecutor<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _row: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl<T> Clone for SqliteExecutor<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[async_trait]
impl<T> QueryExecutor for SqliteExecutor<T>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static,
{
    type Row = T;
    type Error = sqlx::Error;

    async fn execute_query(&self, query: &SegmentQuery) -> Result<Vec<T>, sqlx::Error> {
        let mut statement = sqlx::query_as::<_, T>(&query.sql);
        for param in &query.parameters {
            statement = match param {
                SqlValue::String(s) => statement.bind(s.clone()),
                SqlValue::Integer(i) => statement.bind(*i),
                SqlValue::Float(f) => statement.bind(*f),
                SqlValue::Bool(b) => statement.bind(*b),
            };
        }
        statement.fetch_all(&self.pool).await
    }
}
