//! In-memory store implementing both storage traits
//!
//! Every call is recorded, failures can be scripted per operation, and
//! content fetches can be slowed down. Clones share the same state, so a
//! test can hand copies to every worker and inspect the result afterwards.

use async_trait::async_trait;
use ferret_domain::traits::{ContentStore, RelationalStore};
use ferret_domain::{ArticleContent, ArticleReference, CategoryRule, FilterPattern, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

/// Storage operation, used to script failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [`ContentStore::get_content`]
    GetContent,
    /// [`RelationalStore::list_unextracted`]
    ListUnextracted,
    /// [`RelationalStore::mark_extracted`]
    MarkExtracted,
    /// [`RelationalStore::insert_indicator_if_absent`]
    InsertIndicator,
    /// [`RelationalStore::link_article_indicator`]
    LinkIndicator,
    /// [`RelationalStore::global_filters`]
    GlobalFilters,
    /// [`RelationalStore::source_filters`]
    SourceFilters,
    /// [`RelationalStore::category_rules`]
    CategoryRules,
    /// [`RelationalStore::insert_article_category`]
    InsertCategory,
}

/// A recorded call, including attempts that were scripted to fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// Content fetch for an article
    GetContent(Uuid),
    /// Backlog listing
    ListUnextracted,
    /// Article marked as extracted
    MarkExtracted(Uuid),
    /// Indicator upsert
    InsertIndicator {
        /// Type id
        type_id: i32,
        /// Value
        value: String,
    },
    /// Article/indicator link
    LinkIndicator {
        /// Indicator id
        indicator_id: i64,
        /// Article id
        article_id: Uuid,
    },
    /// Global filter load
    GlobalFilters,
    /// Source filter load
    SourceFilters(i64),
    /// Category rule load
    CategoryRules,
    /// Article/category link
    InsertCategory {
        /// Category id
        category_id: i64,
        /// Article id
        article_id: Uuid,
    },
}

impl StoreCall {
    /// Operation this call belongs to
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::GetContent(_) => StoreOp::GetContent,
            StoreCall::ListUnextracted => StoreOp::ListUnextracted,
            StoreCall::MarkExtracted(_) => StoreOp::MarkExtracted,
            StoreCall::InsertIndicator { .. } => StoreOp::InsertIndicator,
            StoreCall::LinkIndicator { .. } => StoreOp::LinkIndicator,
            StoreCall::GlobalFilters => StoreOp::GlobalFilters,
            StoreCall::SourceFilters(_) => StoreOp::SourceFilters,
            StoreCall::CategoryRules => StoreOp::CategoryRules,
            StoreCall::InsertCategory { .. } => StoreOp::InsertCategory,
        }
    }

    /// Whether this is a write touching the given article
    pub fn writes_article(&self, id: Uuid) -> bool {
        match self {
            StoreCall::MarkExtracted(article_id)
            | StoreCall::LinkIndicator { article_id, .. }
            | StoreCall::InsertCategory { article_id, .. } => *article_id == id,
            _ => false,
        }
    }
}

#[derive(Default)]
struct State {
    backlog: Vec<ArticleReference>,
    extracted: HashSet<Uuid>,
    contents: HashMap<Uuid, String>,
    indicators: HashMap<(i32, String), i64>,
    links: HashSet<(i64, Uuid)>,
    categories: HashSet<(i64, Uuid)>,
    global_filters: Vec<(i32, String)>,
    source_filters: HashMap<i64, Vec<(i32, String)>>,
    rules: Vec<(i64, String, i32)>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, usize>,
    content_latency: Option<Duration>,
}

/// Thread-safe in-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Poisoned only by a panicking test thread; the state is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an unextracted article, with or without stored content
    pub fn add_article(&self, reference: ArticleReference, content: Option<&str>) {
        let mut state = self.lock();
        state.backlog.push(reference);
        if let Some(text) = content {
            state.contents.insert(reference.article_id, text.to_string());
        }
    }

    /// Add a global filter pattern
    pub fn add_global_filter(&self, type_id: i32, pattern: &str) {
        self.lock().global_filters.push((type_id, pattern.to_string()));
    }

    /// Add a source-scoped filter pattern
    pub fn add_source_filter(&self, source_id: i64, type_id: i32, pattern: &str) {
        self.lock()
            .source_filters
            .entry(source_id)
            .or_default()
            .push((type_id, pattern.to_string()));
    }

    /// Add a category rule
    pub fn add_category_rule(&self, category_id: i64, pattern: &str, rank: i32) {
        self.lock().rules.push((category_id, pattern.to_string(), rank));
    }

    /// Make the next `count` calls of `op` fail with a connection error
    pub fn fail_next(&self, op: StoreOp, count: usize) {
        *self.lock().failures.entry(op).or_default() += count;
    }

    /// Delay every content fetch
    pub fn set_content_latency(&self, latency: Duration) {
        self.lock().content_latency = Some(latency);
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls of one operation
    pub fn count(&self, op: StoreOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Number of recorded writes touching an article
    pub fn writes_for(&self, article_id: Uuid) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.writes_article(article_id))
            .count()
    }

    /// Articles marked as extracted
    pub fn extracted(&self) -> HashSet<Uuid> {
        self.lock().extracted.clone()
    }

    /// Persisted indicators as `(type_id, value)`
    pub fn indicators(&self) -> Vec<(i32, String)> {
        let mut all: Vec<_> = self.lock().indicators.keys().cloned().collect();
        all.sort();
        all
    }

    /// Number of distinct article/indicator links
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    /// Persisted article categories as `(category_id, article_id)`
    pub fn article_categories(&self) -> Vec<(i64, Uuid)> {
        self.lock().categories.iter().copied().collect()
    }

    /// Record a call and consume a scripted failure if one is pending
    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        let mut state = self.lock();
        let op = call.op();
        state.calls.push(call);
        match state.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(StoreError::Connection(format!("scripted {:?} failure", op)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_content(
        &self,
        reference: &ArticleReference,
    ) -> Result<Option<ArticleContent>, StoreError> {
        let latency = self.lock().content_latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.record(StoreCall::GetContent(reference.article_id))?;
        let content = self.lock().contents.get(&reference.article_id).cloned();
        Ok(content.map(|text| ArticleContent::for_reference(reference, text)))
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    async fn list_unextracted(&self) -> Result<Vec<ArticleReference>, StoreError> {
        self.record(StoreCall::ListUnextracted)?;
        let state = self.lock();
        Ok(state
            .backlog
            .iter()
            .filter(|r| !state.extracted.contains(&r.article_id))
            .copied()
            .collect())
    }

    async fn mark_extracted(&self, article_id: Uuid) -> Result<(), StoreError> {
        self.record(StoreCall::MarkExtracted(article_id))?;
        self.lock().extracted.insert(article_id);
        Ok(())
    }

    async fn insert_indicator_if_absent(
        &self,
        type_id: i32,
        value: &str,
    ) -> Result<i64, StoreError> {
        self.record(StoreCall::InsertIndicator {
            type_id,
            value: value.to_string(),
        })?;
        let mut state = self.lock();
        let next_id = state.indicators.len() as i64 + 1;
        Ok(*state
            .indicators
            .entry((type_id, value.to_string()))
            .or_insert(next_id))
    }

    async fn link_article_indicator(
        &self,
        indicator_id: i64,
        article_id: Uuid,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::LinkIndicator {
            indicator_id,
            article_id,
        })?;
        self.lock().links.insert((indicator_id, article_id));
        Ok(())
    }

    async fn global_filters(&self) -> Result<Vec<FilterPattern>, StoreError> {
        self.record(StoreCall::GlobalFilters)?;
        let rows = self.lock().global_filters.clone();
        rows.iter()
            .map(|(type_id, pattern)| FilterPattern::compile(*type_id, pattern))
            .collect()
    }

    async fn source_filters(&self, source_id: i64) -> Result<Vec<FilterPattern>, StoreError> {
        self.record(StoreCall::SourceFilters(source_id))?;
        let rows = self
            .lock()
            .source_filters
            .get(&source_id)
            .cloned()
            .unwrap_or_default();
        rows.iter()
            .map(|(type_id, pattern)| FilterPattern::compile(*type_id, pattern))
            .collect()
    }

    async fn category_rules(&self) -> Result<Vec<CategoryRule>, StoreError> {
        self.record(StoreCall::CategoryRules)?;
        let mut rows = self.lock().rules.clone();
        rows.sort_by_key(|(_, _, rank)| *rank);
        rows.iter()
            .map(|(id, pattern, rank)| CategoryRule::compile(*id, pattern, *rank))
            .collect()
    }

    async fn insert_article_category(
        &self,
        category_id: i64,
        article_id: Uuid,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::InsertCategory {
            category_id,
            article_id,
        })?;
        self.lock().categories.insert((category_id, article_id));
        Ok(())
    }
}
