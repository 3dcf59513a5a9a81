//! Reactive article store.
//!
//! Holds the inputs of the derived list (raw articles, sort spec, title
//! filter) plus the selected source key, and republishes the derived list
//! whenever one of the inputs changes. Subscribers read from `watch`
//! receivers, so a late subscriber always sees the latest list first.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::article::{Article, Source};
use crate::client::{ClientError, NewsClient};
use crate::config::Config;
use crate::ordering::{derive_view, OrderingError, SortSpec, TitleFilter};

const ERROR_CHANNEL_CAPACITY: usize = 32;

pub type ArticleList = Arc<Vec<Article>>;
pub type SourceList = Arc<Vec<Source>>;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("failed to fetch articles for '{source_key}': {error}")]
    FetchArticles {
        source_key: String,
        #[source]
        error: Arc<ClientError>,
    },
    #[error("failed to fetch sources: {0}")]
    FetchSources(#[source] Arc<ClientError>),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
}

/// Initial values of the store's signals.
#[derive(Debug, Clone)]
pub struct StoreDefaults {
    pub source: String,
    pub sort: SortSpec,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            source: "reddit-r-all".to_string(),
            sort: SortSpec::default(),
        }
    }
}

struct Inputs {
    raw: ArticleList,
    sort: SortSpec,
    filter: TitleFilter,
}

struct Inner {
    client: NewsClient,
    default_source: String,
    inputs: Mutex<Inputs>,
    source_tx: watch::Sender<String>,
    articles_tx: watch::Sender<ArticleList>,
    ordered_tx: watch::Sender<ArticleList>,
    sources_tx: watch::Sender<SourceList>,
    errors_tx: broadcast::Sender<StoreError>,
    // Bumped by every update_articles call; only the latest request may publish
    generation: AtomicU64,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct ArticleStore {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ArticleStore {
    pub fn new(client: NewsClient, defaults: StoreDefaults) -> Self {
        let inputs = Inputs {
            raw: Arc::new(Vec::new()),
            sort: defaults.sort,
            filter: TitleFilter::default(),
        };
        let (errors_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                client,
                source_tx: watch::Sender::new(defaults.source.clone()),
                default_source: defaults.source,
                inputs: Mutex::new(inputs),
                articles_tx: watch::Sender::new(Arc::new(Vec::new())),
                ordered_tx: watch::Sender::new(Arc::new(Vec::new())),
                sources_tx: watch::Sender::new(Arc::new(Vec::new())),
                errors_tx,
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = NewsClient::from_config(config)?;
        let defaults = StoreDefaults {
            source: config.default_source.clone(),
            sort: config.sort_spec()?,
        };
        Ok(Self::new(client, defaults))
    }

    /// Latest raw article list, as fetched.
    pub fn articles(&self) -> watch::Receiver<ArticleList> {
        self.inner.articles_tx.subscribe()
    }

    /// Filtered and sorted article list.
    pub fn ordered_articles(&self) -> watch::Receiver<ArticleList> {
        self.inner.ordered_tx.subscribe()
    }

    /// Available sources. Only non-empty lists are ever published.
    pub fn sources(&self) -> watch::Receiver<SourceList> {
        self.inner.sources_tx.subscribe()
    }

    pub fn selected_source(&self) -> watch::Receiver<String> {
        self.inner.source_tx.subscribe()
    }

    pub fn current_source(&self) -> String {
        self.inner.source_tx.borrow().clone()
    }

    pub fn default_source(&self) -> &str {
        &self.inner.default_source
    }

    /// Fetch failures and rejected filters are reported here; the derived
    /// list keeps working after any of them.
    pub fn errors(&self) -> broadcast::Receiver<StoreError> {
        self.inner.errors_tx.subscribe()
    }

    pub fn sort_spec(&self) -> SortSpec {
        lock(&self.inner.inputs).sort
    }

    pub fn filter_text(&self) -> String {
        lock(&self.inner.inputs).filter.pattern().to_string()
    }

    /// Select a source and start fetching its articles. `None` selects the
    /// default source.
    ///
    /// An outstanding fetch from an earlier call is aborted, and its result
    /// is discarded if it already completed, so the raw list always reflects
    /// the most recent request.
    pub fn update_articles(&self, source_key: Option<&str>) {
        let source_key = source_key
            .unwrap_or(&self.inner.default_source)
            .to_string();

        // Held from the generation bump to the handle swap, so the stored
        // handle always belongs to the current generation
        let mut in_flight = lock(&self.inner.in_flight);

        self.inner.source_tx.send_replace(source_key.clone());
        let generation = self.inner.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);

        info!("Fetching articles for source '{}'", source_key);
        let handle = tokio::spawn(async move {
            match inner.client.fetch_articles(&source_key).await {
                Ok(articles) => inner.publish_articles(generation, articles),
                Err(e) => {
                    if inner.is_current(generation) {
                        inner.report(StoreError::FetchArticles {
                            source_key,
                            error: Arc::new(e),
                        });
                    }
                }
            }
        });

        if let Some(previous) = in_flight.replace(handle) {
            if !previous.is_finished() {
                warn!("Superseding in-flight article fetch");
                previous.abort();
            }
        }
    }

    /// Parse and apply a sort request. An unknown field or a direction other
    /// than `1`/`-1` is rejected and the current sort spec is kept.
    pub fn set_sort(&self, field: &str, direction: i64) -> Result<(), StoreError> {
        match SortSpec::parse(field, direction) {
            Ok(spec) => {
                self.set_sort_spec(spec);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected sort request: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn set_sort_spec(&self, spec: SortSpec) {
        self.inner.update(|inputs| inputs.sort = spec);
    }

    /// Set the title filter. A pattern that does not compile is still
    /// recorded but matches nothing until replaced; the error is returned
    /// and also published on the error stream.
    pub fn set_filter(&self, text: &str) -> Result<(), StoreError> {
        let (filter, result) = match TitleFilter::parse(text) {
            Ok(filter) => (filter, Ok(())),
            Err(e) => {
                warn!("{}", e);
                (TitleFilter::match_nothing(text), Err(StoreError::from(e)))
            }
        };
        self.inner.update(|inputs| inputs.filter = filter);

        if let Err(e) = &result {
            let _ = self.inner.errors_tx.send(e.clone());
        }
        result
    }

    /// Fetch the available sources, publishing the result only if non-empty.
    pub async fn fetch_sources(&self) -> Result<(), StoreError> {
        match self.inner.client.fetch_sources().await {
            Ok(sources) if sources.is_empty() => {
                debug!("Ignoring empty source list");
                Ok(())
            }
            Ok(sources) => {
                self.inner.sources_tx.send_replace(Arc::new(sources));
                Ok(())
            }
            Err(e) => {
                let err = StoreError::FetchSources(Arc::new(e));
                self.inner.report(err.clone());
                Err(err)
            }
        }
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(AtomicOrdering::SeqCst) == generation
    }

    fn publish_articles(&self, generation: u64, articles: Vec<Article>) {
        let raw = Arc::new(articles);
        let mut inputs = lock(&self.inputs);
        if !self.is_current(generation) {
            debug!("Discarding articles from superseded request");
            return;
        }
        inputs.raw = Arc::clone(&raw);
        self.articles_tx.send_replace(raw);
        self.recompute(&inputs);
    }

    /// Apply a change to the inputs and republish the derived list. The lock
    /// is held across publish so subscribers see changes in order.
    fn update(&self, change: impl FnOnce(&mut Inputs)) {
        let mut inputs = lock(&self.inputs);
        change(&mut inputs);
        self.recompute(&inputs);
    }

    fn recompute(&self, inputs: &Inputs) {
        let view = derive_view(&inputs.raw, &inputs.sort, &inputs.filter);
        debug!(
            "Derived {} of {} articles (sort {} x{}, filter '{}')",
            view.len(),
            inputs.raw.len(),
            inputs.sort.field,
            inputs.sort.direction.multiplier(),
            inputs.filter.pattern()
        );
        self.ordered_tx.send_replace(Arc::new(view));
    }

    fn report(&self, err: StoreError) {
        error!("{}", err);
        // No subscribers is fine
        let _ = self.errors_tx.send(err);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.in_flight).take() {
            handle.abort();
        }
    }
}
