//! PostgreSQL implementation of [`ContentStore`]

use crate::{map_sqlx, StoreConfig};
use async_trait::async_trait;
use ferret_domain::traits::ContentStore;
use ferret_domain::{ArticleContent, ArticleReference, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

const GET_CONTENT: &str = "
    SELECT web_scrap FROM article_content
    WHERE article_id = $1
";

/// Store of scraped article text
///
/// A missing row means the article has not been scraped at all and yields
/// `None`. A row whose text is NULL yields empty content so that the article
/// still flows through the pipeline and gets marked as extracted.
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Connect a new pool to the content database
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(config.content_url())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!("Content store connected");
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close every connection in the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn get_content(
        &self,
        reference: &ArticleReference,
    ) -> Result<Option<ArticleContent>, StoreError> {
        let row = sqlx::query_scalar::<_, Option<String>>(GET_CONTENT)
            .bind(reference.article_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        match row {
            None => {
                debug!("No content row for article {}", reference.article_id);
                Ok(None)
            }
            Some(None) => {
                info!(
                    "Article {} has no scraped data, treating as empty",
                    reference.article_id
                );
                Ok(Some(ArticleContent::empty(reference)))
            }
            Some(Some(text)) => Ok(Some(ArticleContent::for_reference(reference, text))),
        }
    }
}
