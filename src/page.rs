//! Per-resource page state
//!
//! A [`ResourcePage`] owns the one authoritative copy of a resource's rows.
//! It is re-synchronised from every API response: a list replaces the rows,
//! insert/update/delete responses are spliced in by id. A failed response
//! leaves the rows exactly as they were.

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{list_records, ApiResponse, FailedResponse, ManyResult, Pagination, ResourceApi};
use crate::models::{ListQuery, Record};

pub struct ResourcePage<T: Record> {
    rows: Vec<T>,
    pagination: Option<Pagination>,
    query: ListQuery,
    loaded: bool,
    last_error: Option<FailedResponse>,
}

impl<T: Record> ResourcePage<T> {
    pub fn new(query: ListQuery) -> Self {
        Self {
            rows: Vec::new(),
            pagination: None,
            query,
            loaded: false,
            last_error: None,
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn set_page(&mut self, page: u32) {
        self.query = ListQuery::new(page, self.query.results_per_page);
    }

    /// True once a list response succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&FailedResponse> {
        self.last_error.as_ref()
    }

    /// Rows as JSON, for the generic table and form layers
    pub fn as_values(&self) -> Vec<Value> {
        self.rows
            .iter()
            .filter_map(|row| match serde_json::to_value(row) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Failed to serialize {} row {}: {}", T::RESOURCE.as_str(), row.id(), e);
                    None
                }
            })
            .collect()
    }

    /// Fetch the current page, replacing the rows on success
    pub async fn fetch(&mut self, api: &dyn ResourceApi) -> bool {
        let response = list_records::<T>(api, &self.query).await;
        self.apply_list(response)
    }

    pub fn apply_list(&mut self, response: ApiResponse<T>) -> bool {
        match response {
            ApiResponse::Failed(failed) => {
                self.last_error = Some(failed);
                false
            }
            ApiResponse::Many(many) => {
                debug!(
                    "Loaded {} {} row(s), page {}/{}",
                    many.results.len(),
                    T::RESOURCE.as_str(),
                    many.pagination.current_page,
                    many.pagination.total_pages
                );
                self.rows = many.results;
                self.pagination = Some(many.pagination);
                self.loaded = true;
                self.last_error = None;
                true
            }
            ApiResponse::Single(row) => {
                self.rows = vec![row];
                self.pagination = Some(Pagination::single_page(1));
                self.loaded = true;
                self.last_error = None;
                true
            }
        }
    }

    /// Add inserted rows, replacing any row already holding the same id
    pub fn apply_inserted(&mut self, response: ApiResponse<T>) -> bool {
        self.splice(response)
    }

    pub fn apply_updated(&mut self, response: ApiResponse<T>) -> bool {
        self.splice(response)
    }

    /// Remove the rows whose ids were deleted
    pub fn apply_deleted(&mut self, response: ApiResponse<T>, ids: &[i64]) -> bool {
        match response {
            ApiResponse::Failed(failed) => {
                self.last_error = Some(failed);
                false
            }
            response => {
                // echoed rows win; fall back to the requested ids
                let mut removed: Vec<i64> = response
                    .into_rows()
                    .unwrap_or_default()
                    .iter()
                    .map(Record::id)
                    .collect();
                if removed.is_empty() {
                    removed = ids.to_vec();
                }

                let before = self.rows.len();
                self.rows.retain(|row| !removed.contains(&row.id()));
                self.shift_total(before, self.rows.len());
                self.last_error = None;
                true
            }
        }
    }

    pub async fn insert(&mut self, api: &dyn ResourceApi, data: Vec<Value>) -> ApiResponse<T> {
        let response = api.insert(T::RESOURCE, data).await.decode::<T>();
        self.apply_inserted(response.clone());
        response
    }

    pub async fn update(&mut self, api: &dyn ResourceApi, data: Vec<Value>) -> ApiResponse<T> {
        let response = api.update(T::RESOURCE, data).await.decode::<T>();
        self.apply_updated(response.clone());
        response
    }

    pub async fn delete(&mut self, api: &dyn ResourceApi, ids: Vec<i64>) -> ApiResponse<T> {
        let response = match api.delete(T::RESOURCE, ids.clone()).await {
            ApiResponse::Failed(failed) => ApiResponse::Failed(failed),
            // an acknowledgement such as {"message": ...} carries no rows
            acknowledged => match acknowledged.decode::<T>() {
                ApiResponse::Failed(failed) => {
                    debug!("{} delete response holds no rows: {}", T::RESOURCE.as_str(), failed.message);
                    ApiResponse::Many(ManyResult {
                        results: Vec::new(),
                        pagination: Pagination::single_page(0),
                    })
                }
                decoded => decoded,
            },
        };
        self.apply_deleted(response.clone(), &ids);
        response
    }

    fn splice(&mut self, response: ApiResponse<T>) -> bool {
        let rows = match response {
            ApiResponse::Failed(failed) => {
                self.last_error = Some(failed);
                return false;
            }
            response => response.into_rows().unwrap_or_default(),
        };

        let before = self.rows.len();
        for row in rows {
            match self.rows.iter().position(|existing| existing.id() == row.id()) {
                Some(index) => self.rows[index] = row,
                None => self.rows.push(row),
            }
        }
        self.shift_total(before, self.rows.len());
        self.last_error = None;
        true
    }

    fn shift_total(&mut self, before: usize, after: usize) {
        if let Some(pagination) = &mut self.pagination {
            let total = pagination.total_results as i64 + after as i64 - before as i64;
            pagination.total_results = total.max(0) as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instrument, Resource};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted API returning canned responses and counting calls
    struct FakeApi {
        list: ApiResponse<Value>,
        write: ApiResponse<Value>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(list: ApiResponse<Value>, write: ApiResponse<Value>) -> Self {
            Self {
                list,
                write,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ResourceApi for FakeApi {
        async fn list(&self, _: Resource, _: &ListQuery) -> ApiResponse<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.list.clone()
        }

        async fn insert(&self, _: Resource, _: Vec<Value>) -> ApiResponse<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.write.clone()
        }

        async fn update(&self, _: Resource, _: Vec<Value>) -> ApiResponse<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.write.clone()
        }

        async fn delete(&self, _: Resource, _: Vec<i64>) -> ApiResponse<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.write.clone()
        }
    }

    fn instruments() -> ApiResponse<Value> {
        ApiResponse::Many(ManyResult {
            results: vec![
                json!({ "id": 1, "name": "Piano" }),
                json!({ "id": 2, "name": "Violin" }),
            ],
            pagination: Pagination {
                current_page: 1,
                total_pages: 1,
                total_results: 2,
            },
        })
    }

    fn names(page: &ResourcePage<Instrument>) -> Vec<String> {
        page.rows().iter().map(|i| i.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_fetch_replaces_rows() {
        let api = FakeApi::new(instruments(), ApiResponse::Single(json!({})));
        let mut page = ResourcePage::<Instrument>::new(ListQuery::default());

        assert!(page.fetch(&api).await);
        assert!(page.is_loaded());
        assert_eq!(names(&page), vec!["Piano", "Violin"]);
        assert_eq!(page.pagination().unwrap().total_results, 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_rows_unchanged() {
        let mut page = ResourcePage::<Instrument>::new(ListQuery::default());
        page.fetch(&FakeApi::new(instruments(), ApiResponse::Single(json!({}))))
            .await;

        let failing = FakeApi::new(
            ApiResponse::Failed(FailedResponse::new("Service unavailable").with_status(503)),
            ApiResponse::Single(json!({})),
        );
        assert!(!page.fetch(&failing).await);
        assert_eq!(names(&page), vec!["Piano", "Violin"]);
        assert_eq!(page.last_error().unwrap().status, Some(503));
    }

    #[tokio::test]
    async fn test_malformed_rows_leave_rows_unchanged() {
        let mut page = ResourcePage::<Instrument>::new(ListQuery::default());
        page.fetch(&FakeApi::new(instruments(), ApiResponse::Single(json!({}))))
            .await;

        let wrong_shape = FakeApi::new(
            ApiResponse::Many(ManyResult {
                results: vec![json!({ "name": 5 })],
                pagination: Pagination::single_page(1),
            }),
            ApiResponse::Single(json!({})),
        );
        assert!(!page.fetch(&wrong_shape).await);
        assert_eq!(names(&page), vec!["Piano", "Violin"]);
    }

    #[tokio::test]
    async fn test_insert_and_update_splice_by_id() {
        let mut page = ResourcePage::<Instrument>::new(ListQuery::default());
        page.fetch(&FakeApi::new(instruments(), ApiResponse::Single(json!({}))))
            .await;

        let api = FakeApi::new(
            instruments(),
            ApiResponse::Many(ManyResult {
                results: vec![json!({ "id": 3, "name": "Cello" })],
                pagination: Pagination::single_page(1),
            }),
        );
        page.insert(&api, vec![json!({ "name": "Cello" })]).await;
        assert_eq!(names(&page), vec!["Piano", "Violin", "Cello"]);
        assert_eq!(page.pagination().unwrap().total_results, 3);

        let api = FakeApi::new(
            instruments(),
            ApiResponse::Single(json!({ "id": 2, "name": "Viola" })),
        );
        page.update(&api, vec![json!({ "id": 2, "name": "Viola" })]).await;
        assert_eq!(names(&page), vec!["Piano", "Viola", "Cello"]);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_rows() {
        let mut page = ResourcePage::<Instrument>::new(ListQuery::default());
        page.fetch(&FakeApi::new(instruments(), ApiResponse::Single(json!({}))))
            .await;

        // empty body echoes nothing, the requested ids are used
        let api = FakeApi::new(
            instruments(),
            ApiResponse::Many(ManyResult {
                results: vec![],
                pagination: Pagination::single_page(0),
            }),
        );
        page.delete(&api, vec![1]).await;
        assert_eq!(names(&page), vec!["Violin"]);
        assert_eq!(page.pagination().unwrap().total_results, 1);

        let failing = FakeApi::new(
            instruments(),
            ApiResponse::Failed(FailedResponse::new("Forbidden").with_status(403)),
        );
        page.delete(&failing, vec![2]).await;
        assert_eq!(names(&page), vec!["Violin"]);
    }

    #[tokio::test]
    async fn test_delete_acknowledgement_removes_requested_ids() {
        let mut page = ResourcePage::<Instrument>::new(ListQuery::default());
        page.fetch(&FakeApi::new(instruments(), ApiResponse::Single(json!({}))))
            .await;

        let api = FakeApi::new(instruments(), ApiResponse::Single(json!({ "message": "deleted" })));
        let response = page.delete(&api, vec![2]).await;

        assert!(response.is_success());
        assert_eq!(names(&page), vec!["Piano"]);
        assert!(page.last_error().is_none());
    }
}
