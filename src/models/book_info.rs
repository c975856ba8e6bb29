//! Canonical catalog metadata shared by all copies of a title

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

static OPEN_LIBRARY_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^OL[0-9]+[A-Z]$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    pub id: Uuid,
    pub open_library_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub image_url: Option<String>,
}

/// Book metadata fetched from the catalog, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBookInfo {
    pub open_library_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub image_url: Option<String>,
}

impl NewBookInfo {
    /// Build from raw catalog data, dropping duplicate authors while keeping
    /// their order.
    pub fn new(
        open_library_id: &str,
        title: String,
        authors: Vec<String>,
        image_url: Option<String>,
    ) -> AppResult<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(authors.len());
        for author in authors {
            let author = author.trim().to_string();
            if !author.is_empty() && !unique.contains(&author) {
                unique.push(author);
            }
        }

        if title.trim().is_empty() {
            return Err(AppError::Upstream(format!(
                "Catalog work {} has no title",
                open_library_id
            )));
        }
        if unique.is_empty() {
            return Err(AppError::Upstream(format!(
                "Catalog work {} has no authors",
                open_library_id
            )));
        }

        Ok(Self {
            open_library_id: open_library_id.to_string(),
            title: title.trim().to_string(),
            authors: unique,
            image_url,
        })
    }
}

/// Add copy request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCopyRequest {
    #[validate(regex(path = *OPEN_LIBRARY_ID_RE, message = "Invalid Open Library id"))]
    pub open_library_id: String,
}

/// Catalog search hit
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchResult {
    /// Open Library work id, usable as `openLibraryId`
    pub id: String,
    pub title: String,
    pub authors: String,
    pub cover_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authors_are_deduplicated_in_order() {
        let info = NewBookInfo::new(
            "OL1M",
            "Dune".to_string(),
            vec!["Frank Herbert".into(), "Brian Herbert".into(), "Frank Herbert".into()],
            None,
        )
        .unwrap();

        assert_eq!(info.authors, vec!["Frank Herbert", "Brian Herbert"]);
    }

    #[test]
    fn test_works_without_authors_are_rejected() {
        let err = NewBookInfo::new("OL1M", "Dune".to_string(), vec![" ".into()], None).unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_open_library_id_format() {
        let ok = AddCopyRequest { open_library_id: "OL45883W".into() };
        assert!(ok.validate().is_ok());

        for bad in ["", "OL", "45883W", "OL45883w", "OL1M/../../admin"] {
            let request = AddCopyRequest { open_library_id: bad.into() };
            assert!(request.validate().is_err(), "{} should be rejected", bad);
        }
    }
}
