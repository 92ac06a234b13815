//! Classification of raw HTTP responses into a tagged result
//!
//! Every API call ends up here. Success bodies carrying a `results` array
//! become [`ApiResponse::Many`] with pagination counters, a `result` object
//! or any other decodable body becomes [`ApiResponse::Single`], and anything
//! else (transport errors, non-2xx statuses, bodies of the wrong shape)
//! becomes [`ApiResponse::Failed`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::errors::ApiError;
use crate::notify::NotificationQueue;

/// Status and body of an HTTP response, before classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Pagination counters of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

impl Pagination {
    /// Counters for a response that returned everything in one page
    pub fn single_page(total_results: usize) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_results: total_results as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManyResult<T> {
    pub results: Vec<T>,
    pub pagination: Pagination,
}

/// Failure marker carrying a display message
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FailedResponse {
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,
    pub message: String,
    /// Server validation messages keyed by backend field name
    pub field_errors: BTreeMap<String, String>,
}

impl FailedResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors.insert(field.into(), message.into());
        self
    }
}

impl From<ApiError> for FailedResponse {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        match err {
            ApiError::Status { status, message } => FailedResponse::new(message).with_status(status),
            other => FailedResponse {
                status,
                message: other.to_string(),
                field_errors: BTreeMap::new(),
            },
        }
    }
}

/// Outcome of an API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Many(ManyResult<T>),
    Single(T),
    Failed(FailedResponse),
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        !self.is_failure()
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ApiResponse::Failed(_))
    }

    pub fn failure(&self) -> Option<&FailedResponse> {
        match self {
            ApiResponse::Failed(failed) => Some(failed),
            _ => None,
        }
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        match self {
            ApiResponse::Many(many) => Some(&many.pagination),
            _ => None,
        }
    }

    /// Rows carried by a success, `None` on failure
    pub fn into_rows(self) -> Option<Vec<T>> {
        match self {
            ApiResponse::Many(many) => Some(many.results),
            ApiResponse::Single(row) => Some(vec![row]),
            ApiResponse::Failed(_) => None,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Many(many) => ApiResponse::Many(ManyResult {
                results: many.results.into_iter().map(&mut f).collect(),
                pagination: many.pagination,
            }),
            ApiResponse::Single(row) => ApiResponse::Single(f(row)),
            ApiResponse::Failed(failed) => ApiResponse::Failed(failed),
        }
    }
}

impl ApiResponse<Value> {
    /// Decode loosely typed rows into `T`; rows of the wrong shape turn the
    /// whole response into a failure
    pub fn decode<T: DeserializeOwned>(self) -> ApiResponse<T> {
        let decoded = match self {
            ApiResponse::Many(many) => many
                .results
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()
                .map(|results| {
                    ApiResponse::Many(ManyResult {
                        results,
                        pagination: many.pagination,
                    })
                }),
            ApiResponse::Single(row) => serde_json::from_value(row).map(ApiResponse::Single),
            ApiResponse::Failed(failed) => return ApiResponse::Failed(failed),
        };

        decoded.unwrap_or_else(|e| ApiResponse::Failed(FailedResponse::from(ApiError::from(e))))
    }
}

/// Classify a raw response; failures are pushed to `notify` when given
pub fn transform<T: DeserializeOwned>(
    raw: RawResponse,
    notify: Option<&NotificationQueue>,
) -> ApiResponse<T> {
    let response = classify(raw);
    if let ApiResponse::Failed(ref failed) = response {
        report(failed, notify);
    }
    response
}

/// Failure marker for a request that never produced a response
pub fn transport_failure<T>(err: ApiError, notify: Option<&NotificationQueue>) -> ApiResponse<T> {
    let failed = FailedResponse::from(err);
    report(&failed, notify);
    ApiResponse::Failed(failed)
}

fn report(failed: &FailedResponse, notify: Option<&NotificationQueue>) {
    warn!(status = ?failed.status, "API request failed: {}", failed.message);
    if let Some(queue) = notify {
        queue.error(failed.message.clone());
    }
}

fn classify<T: DeserializeOwned>(raw: RawResponse) -> ApiResponse<T> {
    if !raw.is_success() {
        return ApiResponse::Failed(parse_failure(raw.status, &raw.body));
    }

    if raw.body.trim().is_empty() {
        debug!("Empty success body (status {})", raw.status);
        return ApiResponse::Many(ManyResult {
            results: Vec::new(),
            pagination: Pagination::single_page(0),
        });
    }

    let body: Value = match serde_json::from_str(&raw.body) {
        Ok(value) => value,
        Err(e) => return malformed(raw.status, e),
    };

    match body {
        Value::Object(mut object) => {
            if let Some(results) = object.remove("results") {
                let results: Vec<T> = match serde_json::from_value(results) {
                    Ok(rows) => rows,
                    Err(e) => return malformed(raw.status, e),
                };
                let pagination = read_pagination(&object, results.len());
                ApiResponse::Many(ManyResult { results, pagination })
            } else if let Some(result) = object.remove("result") {
                match serde_json::from_value(result) {
                    Ok(row) => ApiResponse::Single(row),
                    Err(e) => malformed(raw.status, e),
                }
            } else {
                match serde_json::from_value(Value::Object(object)) {
                    Ok(row) => ApiResponse::Single(row),
                    Err(e) => malformed(raw.status, e),
                }
            }
        }
        Value::Array(items) => {
            let count = items.len();
            match serde_json::from_value(Value::Array(items)) {
                Ok(results) => ApiResponse::Many(ManyResult {
                    results,
                    pagination: Pagination::single_page(count),
                }),
                Err(e) => malformed(raw.status, e),
            }
        }
        other => match serde_json::from_value(other) {
            Ok(row) => ApiResponse::Single(row),
            Err(e) => malformed(raw.status, e),
        },
    }
}

fn malformed<T>(status: u16, err: serde_json::Error) -> ApiResponse<T> {
    ApiResponse::Failed(FailedResponse::from(ApiError::from(err)).with_status(status))
}

fn read_pagination(object: &serde_json::Map<String, Value>, count: usize) -> Pagination {
    let counter = |key: &str| object.get(key).and_then(Value::as_u64);
    let page_counter = |key: &str| counter(key).map_or(1, |n| u32::try_from(n).unwrap_or(u32::MAX));

    Pagination {
        current_page: page_counter("currentPage"),
        total_pages: page_counter("totalPages"),
        total_results: counter("totalResults").unwrap_or(count as u64),
    }
}

fn parse_failure(status: u16, body: &str) -> FailedResponse {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Request failed")
        .to_string();

    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body) else {
        let message = if body.trim().is_empty() || body.len() > 200 {
            reason
        } else {
            body.trim().to_string()
        };
        return FailedResponse::new(message).with_status(status);
    };

    let message = object
        .get("message")
        .or_else(|| object.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(reason);

    let mut failed = FailedResponse::new(message).with_status(status);
    if let Some(errors) = object.get("errors") {
        failed.field_errors = read_field_errors(errors);
    }
    failed
}

/// Accepts `{field: "msg"}`, `{field: ["msg", ...]}` and
/// `[{"field": .., "message": ..}]`
fn read_field_errors(errors: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match errors {
        Value::Object(map) => {
            for (field, value) in map {
                let message = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
                    _ => None,
                };
                if let Some(message) = message {
                    out.insert(field.clone(), message);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let field = item.get("field").and_then(Value::as_str);
                let message = item.get("message").and_then(Value::as_str);
                if let (Some(field), Some(message)) = (field, message) {
                    out.insert(field.to_string(), message.to_string());
                }
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Instrument;

    #[test]
    fn test_results_body_is_many_with_pagination() {
        let raw = RawResponse::new(
            200,
            r#"{"results":[{"id":1,"name":"Piano"},{"id":2,"name":"Violin"}],
                "currentPage":2,"totalPages":5,"totalResults":42}"#,
        );

        let response: ApiResponse<Instrument> = transform(raw, None);
        match response {
            ApiResponse::Many(many) => {
                assert_eq!(many.results.len(), 2);
                assert_eq!(many.results[1].name, "Violin");
                assert_eq!(
                    many.pagination,
                    Pagination { current_page: 2, total_pages: 5, total_results: 42 }
                );
            }
            other => panic!("expected Many, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_counters_default_to_single_page() {
        let raw = RawResponse::new(200, r#"{"results":[{"id":1,"name":"Piano"}]}"#);
        let response: ApiResponse<Instrument> = transform(raw, None);
        assert_eq!(response.pagination(), Some(&Pagination::single_page(1)));
    }

    #[test]
    fn test_oversized_page_counters_saturate() {
        let raw = RawResponse::new(
            200,
            r#"{"results":[],"currentPage":4294967297,"totalPages":8589934592,"totalResults":8589934592}"#,
        );
        let response: ApiResponse<Instrument> = transform(raw, None);
        let pagination = response.pagination().unwrap();
        assert_eq!(pagination.current_page, u32::MAX);
        assert_eq!(pagination.total_pages, u32::MAX);
        assert_eq!(pagination.total_results, 8589934592);
    }

    #[test]
    fn test_result_and_bare_object_are_single() {
        let wrapped: ApiResponse<Instrument> =
            transform(RawResponse::new(200, r#"{"result":{"id":4,"name":"Cello"}}"#), None);
        let bare: ApiResponse<Instrument> =
            transform(RawResponse::new(201, r#"{"id":4,"name":"Cello"}"#), None);

        for response in [wrapped, bare] {
            match response {
                ApiResponse::Single(instrument) => assert_eq!(instrument.id, 4),
                other => panic!("expected Single, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_error_status_maps_message_and_field_errors() {
        let queue = NotificationQueue::new();
        let raw = RawResponse::new(
            422,
            r#"{"message":"Validation failed","errors":{"email":["Email already used"],"name":"Too short"}}"#,
        );

        let response: ApiResponse<Instrument> = transform(raw, Some(&queue));
        let failed = response.failure().unwrap();
        assert_eq!(failed.status, Some(422));
        assert_eq!(failed.message, "Validation failed");
        assert_eq!(failed.field_errors["email"], "Email already used");
        assert_eq!(failed.field_errors["name"], "Too short");

        let notes = queue.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "Validation failed");
    }

    #[test]
    fn test_error_without_body_uses_reason_phrase() {
        let response: ApiResponse<Instrument> = transform(RawResponse::new(404, ""), None);
        assert_eq!(response.failure().unwrap().message, "Not Found");
    }

    #[test]
    fn test_error_list_form_is_read() {
        let raw = RawResponse::new(
            400,
            r#"{"errors":[{"field":"data.0.name","message":"required"}]}"#,
        );
        let response: ApiResponse<Instrument> = transform(raw, None);
        let failed = response.failure().unwrap();
        assert_eq!(failed.message, "Bad Request");
        assert_eq!(failed.field_errors["data.0.name"], "required");
    }

    #[test]
    fn test_malformed_body_is_failure_not_panic() {
        let queue = NotificationQueue::new();
        let response: ApiResponse<Instrument> =
            transform(RawResponse::new(200, r#"{"results":[{"nope":true}]}"#), Some(&queue));
        assert!(response.is_failure());
        assert!(response.failure().unwrap().message.starts_with("Malformed response"));
        assert_eq!(queue.len(), 1);

        let response: ApiResponse<Instrument> = transform(RawResponse::new(200, "<html>"), None);
        assert!(response.is_failure());
    }

    #[test]
    fn test_silent_failure_does_not_notify() {
        let queue = NotificationQueue::new();
        let _: ApiResponse<Instrument> = transform(RawResponse::new(500, "{}"), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_decode_value_rows() {
        let loose: ApiResponse<Value> = transform(
            RawResponse::new(200, r#"{"results":[{"id":1,"name":"Piano"}]}"#),
            None,
        );
        let typed: ApiResponse<Instrument> = loose.clone().decode();
        assert_eq!(typed.into_rows().unwrap()[0].name, "Piano");

        let broken: ApiResponse<Value> = ApiResponse::Single(serde_json::json!({"id": "x"}));
        assert!(broken.decode::<Instrument>().is_failure());
    }
}
