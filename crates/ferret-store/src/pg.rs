//! PostgreSQL implementation of [`RelationalStore`]

use crate::{map_sqlx, StoreConfig};
use async_trait::async_trait;
use ferret_domain::traits::RelationalStore;
use ferret_domain::{ArticleReference, CategoryRule, FilterPattern, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

const LIST_UNEXTRACTED: &str = "
    SELECT article_id, source_id FROM articles
    WHERE is_feature_ext = FALSE
";

const MARK_EXTRACTED: &str = "
    UPDATE articles
    SET is_feature_ext = TRUE
    WHERE article_id = $1
";

const INSERT_INDICATOR: &str = "
    INSERT INTO iocs (ioc_type, ioc_value)
    VALUES ($1, $2)
    ON CONFLICT DO NOTHING
";

const FIND_INDICATOR: &str = "
    SELECT ioc_id FROM iocs
    WHERE ioc_type = $1
    AND ioc_value = $2
";

const LINK_ARTICLE_INDICATOR: &str = "
    INSERT INTO ioc_articles (article_id, ioc_id)
    VALUES ($1, $2)
    ON CONFLICT DO NOTHING
";

const GLOBAL_FILTERS: &str = "
    SELECT ioc_type_id, ioc_pattern FROM ioc_filter_pattern
";

const SOURCE_FILTERS: &str = "
    SELECT ioc_type_id, ioc_pattern FROM ioc_source_filter_pattern
    WHERE source_id = $1
";

const CATEGORY_RULES: &str = "
    SELECT category_id, category_regex, category_rank FROM category_rule
    ORDER BY category_rank ASC
";

const INSERT_ARTICLE_CATEGORY: &str = "
    INSERT INTO article_category (category_id, article_id)
    VALUES ($1, $2)
    ON CONFLICT DO NOTHING
";

/// PostgreSQL-backed relational store
///
/// Each instance owns its own connection pool. Clone the config, not the
/// store, when another worker needs access.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a new pool
    ///
    /// Fails when no connection can be established; callers treat this as a
    /// fatal startup error.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!("Relational store connected ({} max connections)", config.max_connections);
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables the pipeline reads and writes
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        info!("Schema initialized");
        Ok(())
    }

    /// Close every connection in the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn find_indicator(&self, type_id: i32, value: &str) -> Result<Option<i64>, StoreError> {
        sqlx::query_scalar::<_, i64>(FIND_INDICATOR)
            .bind(type_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    fn compile_filters(rows: Vec<(i32, String)>) -> Result<Vec<FilterPattern>, StoreError> {
        rows.into_iter()
            .map(|(type_id, pattern)| FilterPattern::compile(type_id, &pattern))
            .collect()
    }
}

#[async_trait]
impl RelationalStore for PgStore {
    async fn list_unextracted(&self) -> Result<Vec<ArticleReference>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(LIST_UNEXTRACTED)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(rows
            .into_iter()
            .map(|(article_id, source_id)| ArticleReference::new(article_id, source_id))
            .collect())
    }

    async fn mark_extracted(&self, article_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(MARK_EXTRACTED)
            .bind(article_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_indicator_if_absent(
        &self,
        type_id: i32,
        value: &str,
    ) -> Result<i64, StoreError> {
        if let Some(id) = self.find_indicator(type_id, value).await? {
            return Ok(id);
        }

        sqlx::query(INSERT_INDICATOR)
            .bind(type_id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        self.find_indicator(type_id, value).await?.ok_or_else(|| {
            StoreError::NotFound(format!(
                "Indicator ({}, {}) missing after insert",
                type_id, value
            ))
        })
    }

    async fn link_article_indicator(
        &self,
        indicator_id: i64,
        article_id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query(LINK_ARTICLE_INDICATOR)
            .bind(article_id)
            .bind(indicator_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn global_filters(&self) -> Result<Vec<FilterPattern>, StoreError> {
        let rows = sqlx::query_as::<_, (i32, String)>(GLOBAL_FILTERS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Self::compile_filters(rows)
    }

    async fn source_filters(&self, source_id: i64) -> Result<Vec<FilterPattern>, StoreError> {
        let rows = sqlx::query_as::<_, (i32, String)>(SOURCE_FILTERS)
            .bind(source_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Self::compile_filters(rows)
    }

    async fn category_rules(&self) -> Result<Vec<CategoryRule>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String, i32)>(CATEGORY_RULES)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|(category_id, regex, rank)| CategoryRule::compile(category_id, &regex, rank))
            .collect()
    }

    async fn insert_article_category(
        &self,
        category_id: i64,
        article_id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query(INSERT_ARTICLE_CATEGORY)
            .bind(category_id)
            .bind(article_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}
