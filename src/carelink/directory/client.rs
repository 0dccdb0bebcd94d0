use super::types::{Category, Listing, SearchFilters, Suggestion};
use crate::carelink::api::{ApiClient, ApiError, RequestOptions};
use serde_json::Value;
use tracing::{debug, instrument};

pub const SUGGESTIONS: &str = "/search/suggestions";

/// Terms shorter than this do not trigger suggestions.
pub const MIN_SUGGESTION_CHARS: usize = 2;

#[derive(Clone, Debug)]
pub struct DirectoryClient {
    api: ApiClient,
}

impl DirectoryClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Lists entries of one category.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or backend refusal.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        category: Category,
        filters: &SearchFilters,
    ) -> Result<Vec<Listing>, ApiError> {
        let envelope = self
            .api
            .get(
                &format!("/{}", category.key()),
                &filters.to_query(),
                RequestOptions::default(),
            )
            .await?
            .into_result()?;

        let listings: Vec<Listing> = envelope
            .collection(category.key())
            .into_iter()
            .filter_map(Listing::from_value)
            .collect();

        debug!(count = listings.len(), "directory results");
        Ok(listings)
    }

    /// Suggestions for a partial search term. Short terms return nothing
    /// without a request.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or backend refusal.
    #[instrument(skip(self))]
    pub async fn suggestions(&self, term: &str) -> Result<Vec<Suggestion>, ApiError> {
        let term = term.trim();
        if term.chars().count() < MIN_SUGGESTION_CHARS {
            return Ok(Vec::new());
        }

        let envelope = self
            .api
            .get(SUGGESTIONS, &[("q", term.to_string())], RequestOptions::default())
            .await?
            .into_result()?;

        Ok(envelope
            .collection("suggestions")
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(Suggestion {
                    name,
                    kind: None,
                    id: None,
                }),
                other => serde_json::from_value(other).ok(),
            })
            .collect())
    }
}
