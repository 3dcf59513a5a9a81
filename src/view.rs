use std::collections::HashMap;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::{ArticleList, ArticleStore};

/// Route parameter name carrying the selected source.
pub const SOURCE_KEY_PARAM: &str = "sourceKey";

pub type RouteParams = HashMap<String, String>;

/// Glue between the routing layer and the store: refetches whenever the
/// route's `sourceKey` changes and hands the ordered list to the renderer.
pub struct ArticleListView {
    articles: watch::Receiver<ArticleList>,
    route_task: Option<JoinHandle<()>>,
}

impl ArticleListView {
    /// Subscribe to `params`. The current value counts as the first change,
    /// so the store is asked to fetch immediately.
    pub fn init(store: ArticleStore, mut params: watch::Receiver<RouteParams>) -> Self {
        let articles = store.ordered_articles();

        let route_task = tokio::spawn(async move {
            loop {
                let source_key = params.borrow_and_update().get(SOURCE_KEY_PARAM).cloned();
                debug!("Route changed, source key {:?}", source_key);
                store.update_articles(source_key.as_deref());

                if params.changed().await.is_err() {
                    debug!("Route closed");
                    break;
                }
            }
        });

        Self {
            articles,
            route_task: Some(route_task),
        }
    }

    pub fn articles(&self) -> watch::Receiver<ArticleList> {
        self.articles.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.route_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop following the route. Called automatically on drop.
    pub fn destroy(&mut self) {
        if let Some(task) = self.route_task.take() {
            task.abort();
        }
    }
}

impl Drop for ArticleListView {
    fn drop(&mut self) {
        self.destroy();
    }
}
