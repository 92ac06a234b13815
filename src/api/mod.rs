//! Admin REST API layer
//!
//! Thin per-resource wrappers over `reqwest` whose every result is classified
//! into an [`ApiResponse`] by the response transformer.

pub mod client;
pub mod errors;
pub mod response;
pub mod routes;

pub use client::{ApiClient, ResourceApi};
pub use errors::ApiError;
pub use response::{transform, ApiResponse, FailedResponse, ManyResult, Pagination, RawResponse};
pub use routes::{AdminRoutes, Routes};

use crate::models::{ListQuery, Record};

/// List one page of `T` rows
pub async fn list_records<T: Record>(api: &dyn ResourceApi, query: &ListQuery) -> ApiResponse<T> {
    api.list(T::RESOURCE, query).await.decode()
}
