//! Paged retrieval of WAPI search results
//!
//! A [`Paginator`] walks one query from its first page until the appliance
//! signals exhaustion. Records keep server order across pages.
//!
//! The walk stops after an empty page, a short page, or a page without
//! `next_page_id`. A continuation token that was already used is a
//! protocol violation and fails the walk instead of looping.
//!
//! A failed fetch leaves the paginator where it was, so the caller can
//! retry the same page by calling [`Paginator::next_page`] again.

use crate::error::WapiError;
use crate::common::query::ObjectQuery;
use crate::wapi_trait::WapiClientTrait;
use futures::Stream;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::marker::PhantomData;
use tracing::{debug, info};

/// Sequential walk over the pages of one query
pub struct Paginator<'a, C: ?Sized, T> {
    client: &'a C,
    query: ObjectQuery,
    page_size: u32,
    next_page_id: Option<String>,
    seen_page_ids: HashSet<String>,
    pages_fetched: u32,
    exhausted: bool,
    _record: PhantomData<fn() -> T>,
}

impl<C: ?Sized, T> std::fmt::Debug for Paginator<'_, C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("query", &self.query)
            .field("page_size", &self.page_size)
            .field("next_page_id", &self.next_page_id)
            .field("pages_fetched", &self.pages_fetched)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<'a, C, T> Paginator<'a, C, T>
where
    C: WapiClientTrait + ?Sized,
    T: DeserializeOwned,
{
    /// Start a walk over `query` with `page_size` records per request
    pub fn new(client: &'a C, query: ObjectQuery, page_size: u32) -> Self {
        Self {
            client,
            query,
            page_size,
            next_page_id: None,
            seen_page_ids: HashSet::new(),
            pages_fetched: 0,
            exhausted: false,
            _record: PhantomData,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages successfully retrieved so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetch the next page of records
    ///
    /// # Returns
    /// * `Ok(Some(records))` - A non-empty page
    /// * `Ok(None)` - The result set is exhausted
    /// * `Err(WapiError)` - The fetch failed; state is unchanged
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, WapiError> {
        if self.exhausted {
            return Ok(None);
        }
        if self.page_size == 0 {
            return Err(WapiError::InvalidRequest("page size must be at least 1".to_string()));
        }

        let page_number = self.pages_fetched + 1;
        if page_number == 1 {
            info!("Retrieving {} records", self.query.object_type());
        } else {
            debug!("Getting next page");
        }

        let page = self
            .client
            .fetch_page(&self.query, self.page_size, self.next_page_id.as_deref())
            .await?;

        let count = page.result.len();
        if count > self.page_size as usize {
            return Err(WapiError::Protocol(format!(
                "page {} of {} returned {} records, more than the requested {}",
                page_number,
                self.query.object_type(),
                count,
                self.page_size
            )));
        }

        let records = page
            .result
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|e| {
                    WapiError::Protocol(format!(
                        "malformed {} record {} on page {}: {}",
                        self.query.object_type(),
                        index,
                        page_number,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<T>, WapiError>>()?;

        let next_page_id = match page.next_page_id {
            Some(token) if count == self.page_size as usize => {
                if !self.seen_page_ids.insert(token.clone()) {
                    return Err(WapiError::Protocol(format!(
                        "next_page_id repeated after page {} of {}",
                        page_number,
                        self.query.object_type()
                    )));
                }
                Some(token)
            }
            _ => None,
        };

        self.pages_fetched = page_number;
        info!("Page {} retrieved successfully ({} records)", page_number, count);
        debug!("next_page_id: {:?}", next_page_id);

        if next_page_id.is_none() {
            info!("Complete: no more data pages.");
            self.exhausted = true;
        }
        self.next_page_id = next_page_id;

        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records))
        }
    }

    /// Drain every remaining page into one vector
    pub async fn collect_all(mut self) -> Result<Vec<T>, WapiError> {
        let mut all_results = Vec::new();
        while let Some(page) = self.next_page().await? {
            all_results.extend(page);
        }
        Ok(all_results)
    }

    /// Turn the walk into a stream of pages
    ///
    /// The stream ends after the last page or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>, WapiError>> + 'a
    where
        T: 'a,
    {
        futures::stream::try_unfold(self, |mut pages| async move {
            Ok(pages.next_page().await?.map(|page| (page, pages)))
        })
    }
}
