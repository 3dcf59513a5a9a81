use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A single article as returned by `/v1/articles`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ArticleWire")]
pub struct Article {
    pub title: String,
    pub body: String,
    pub votes: u64,
    pub published_at: DateTime<Utc>,
    pub url: Option<String>,
}

// Sources send the text as `body`, `description`, or both; `body` wins
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleWire {
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    votes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    published_at: DateTime<Utc>,
    #[serde(default)]
    url: Option<String>,
}

impl From<ArticleWire> for Article {
    fn from(wire: ArticleWire) -> Self {
        Self {
            title: wire.title,
            body: wire.body.or(wire.description).unwrap_or_default(),
            votes: wire.votes,
            published_at: wire.published_at,
            url: wire.url,
        }
    }
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        votes: u64,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            votes,
            published_at,
            url: None,
        }
    }
}

/// An entry of `/v1/sources`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArticlesResponse {
    pub articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SourcesResponse {
    pub sources: Vec<Source>,
}

// The API sends explicit nulls for fields it has no value for
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
