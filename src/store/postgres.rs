//! PostgreSQL backend: documents live in a JSONB column, unique keys in a side table.

use super::{Collection, DocumentStore, Query, RawDocument, Result, SortOrder, StoreError, UniqueKey};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn insert_keys(
        tx: &mut Transaction<'_, Postgres>,
        collection: Collection,
        id: Uuid,
        keys: &[UniqueKey],
    ) -> Result<()> {
        for key in keys {
            sqlx::query("INSERT INTO unique_keys (collection, field, value, document_id) VALUES ($1, $2, $3, $4)")
                .bind(collection.as_str())
                .bind(key.field)
                .bind(&key.value)
                .bind(id)
                .execute(&mut **tx)
                .await
                .map_err(|e| duplicate_or(e, collection, key.field, &key.value))?;
        }
        Ok(())
    }
}

fn duplicate_or(error: sqlx::Error, collection: Collection, field: &str, value: &str) -> StoreError {
    match error.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Duplicate {
            collection,
            field: field.to_string(),
            value: value.to_string(),
        },
        _ => StoreError::Sql(error),
    }
}

/// Escape LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_conditions<'a>(qb: &mut QueryBuilder<'a, Postgres>, collection: Collection, query: &'a Query) {
    qb.push(" WHERE collection = ").push_bind(collection.as_str());
    if !query.filter.is_empty() {
        qb.push(" AND body @> ").push_bind(Value::Object(query.filter.clone()));
    }
    if let Some(search) = &query.search {
        qb.push(" AND body->>").push_bind(search.field);
        qb.push(" ILIKE ").push_bind(like_pattern(&search.term));
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: Collection, doc: RawDocument) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES ($1, $2, $3, $4, NOW())")
            .bind(collection.as_str())
            .bind(doc.id)
            .bind(&doc.body)
            .bind(doc.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| duplicate_or(e, collection, "id", &doc.id.to_string()))?;
        Self::insert_keys(&mut tx, collection, doc.id, &doc.unique_keys).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        let body = sqlx::query_scalar::<_, Value>("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body)
    }

    async fn replace(&self, collection: Collection, doc: RawDocument) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE documents SET body = $3, updated_at = NOW() WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(doc.id)
            .bind(&doc.body)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(collection));
        }
        sqlx::query("DELETE FROM unique_keys WHERE collection = $1 AND document_id = $2")
            .bind(collection.as_str())
            .bind(doc.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_keys(&mut tx, collection, doc.id, &doc.unique_keys).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0)
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents");
        push_conditions(&mut qb, collection, query);
        qb.push(match query.sort {
            SortOrder::NewestFirst => " ORDER BY created_at DESC, id DESC",
            SortOrder::OldestFirst => " ORDER BY created_at ASC, id ASC",
        });
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if query.skip > 0 {
            qb.push(" OFFSET ").push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
        }
        let rows = qb.build_query_scalar::<Value>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_conditions(&mut qb, collection, query);
        let n: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("silk"), "%silk%");
    }
}
