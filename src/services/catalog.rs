//! Open Library catalog client and book info resolution

use std::time::Duration;

use serde::Deserialize;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::book_info::{BookInfo, CatalogSearchResult, NewBookInfo},
    repository::Repository,
};

/// Work (`/works/OL..W.json`) or edition (`/books/OL..M.json`) document.
/// Only the fields used here are mapped.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    title: Option<String>,
    #[serde(default)]
    covers: Vec<i64>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
}

/// Works nest the author key (`{"author": {"key": ..}}`), editions don't
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorRef {
    Nested { author: AuthorKey },
    Flat(AuthorKey),
}

impl AuthorRef {
    fn key(&self) -> &str {
        match self {
            AuthorRef::Nested { author } => &author.key,
            AuthorRef::Flat(author) => &author.key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorKey {
    key: String,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
    name: Option<String>,
    personal_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    key: String,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    cover_i: Option<i64>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    client: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            repository,
            client,
            config,
        })
    }

    /// Local book info for a catalog id, fetched from Open Library and stored
    /// on first use
    pub async fn resolve(&self, open_library_id: &str) -> AppResult<BookInfo> {
        if let Some(info) = self
            .repository
            .book_infos
            .find_by_open_library_id(open_library_id)
            .await?
        {
            return Ok(info);
        }

        let fetched = self.fetch(open_library_id).await?;
        let info = self.repository.book_infos.upsert(&fetched).await?;
        tracing::info!(open_library_id, book_info_id = %info.id, "Book info imported from catalog");
        Ok(info)
    }

    /// Fetch and normalize a catalog record without storing it
    pub async fn fetch(&self, open_library_id: &str) -> AppResult<NewBookInfo> {
        let url = format!(
            "{}/{}/{}.json",
            self.config.base_url,
            record_kind(open_library_id),
            open_library_id
        );
        let record: CatalogRecord = self.get_json(&url, "Book not found in catalog").await?;

        let mut author_names = Vec::with_capacity(record.authors.len());
        for author in &record.authors {
            let key = author.key();
            if !key.starts_with("/authors/") {
                tracing::warn!(open_library_id, key, "Skipping unexpected author key");
                continue;
            }
            let url = format!("{}{}.json", self.config.base_url, key);
            let author: AuthorRecord = self.get_json(&url, "Author not found in catalog").await?;
            if let Some(name) = author.name.or(author.personal_name) {
                author_names.push(name);
            }
        }

        let image_url = record
            .covers
            .iter()
            .find(|id| **id > 0)
            .map(|id| self.cover_url(*id));

        NewBookInfo::new(
            open_library_id,
            record.title.unwrap_or_default(),
            author_names,
            image_url,
        )
    }

    /// Full-text search in the catalog
    pub async fn search(&self, query: &str) -> AppResult<Vec<CatalogSearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Missing query".to_string()));
        }

        let limit = self.config.search_limit.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.config.base_url))
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let body: SearchResponse = response.json().await?;

        let results: Vec<CatalogSearchResult> = body
            .docs
            .into_iter()
            .map(|doc| CatalogSearchResult {
                id: doc.key.trim_start_matches("/works/").to_string(),
                title: doc.title.unwrap_or_default(),
                authors: doc.author_name.join(", "),
                cover_url: doc.cover_i.filter(|id| *id > 0).map(|id| self.cover_url(id)),
            })
            .collect();

        if results.is_empty() {
            return Err(AppError::NotFound("No results found".to_string()));
        }
        Ok(results)
    }

    fn cover_url(&self, cover_id: i64) -> String {
        format!("{}/b/id/{}-M.jpg", self.config.covers_url, cover_id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, not_found: &str) -> AppResult<T> {
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(not_found.to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Edition ids end in `M`, everything else is looked up as a work
fn record_kind(open_library_id: &str) -> &'static str {
    if open_library_id.ends_with('M') {
        "books"
    } else {
        "works"
    }
}
