//! Dashboard summary: record counts of several resources loaded concurrently

use futures::future::join_all;
use tracing::info;

use crate::api::{ApiResponse, ResourceApi};
use crate::models::{ListQuery, Resource};

/// Resources counted on the dashboard
pub const SUMMARY_RESOURCES: [Resource; 6] = [
    Resource::Student,
    Resource::Teacher,
    Resource::Class,
    Resource::Course,
    Resource::Attendance,
    Resource::EnrollmentPayment,
];

#[derive(Debug, Clone, PartialEq)]
pub enum TileValue {
    Count(u64),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTile {
    pub resource: Resource,
    pub value: TileValue,
}

impl SummaryTile {
    pub fn display(&self) -> String {
        match &self.value {
            TileValue::Count(count) => count.to_string(),
            TileValue::Unavailable(_) => "-".to_string(),
        }
    }
}

/// Fetch every resource at once; each tile stands on its own result
pub async fn load_summary(api: &dyn ResourceApi, resources: &[Resource]) -> Vec<SummaryTile> {
    // one row per page is enough to read the total
    let query = ListQuery::new(1, 1);
    let requests = resources.iter().map(|resource| api.list(*resource, &query));
    let responses = join_all(requests).await;

    let tiles: Vec<SummaryTile> = resources
        .iter()
        .zip(responses)
        .map(|(resource, response)| SummaryTile {
            resource: *resource,
            value: match response {
                ApiResponse::Failed(failed) => TileValue::Unavailable(failed.message),
                ApiResponse::Many(many) => TileValue::Count(many.pagination.total_results),
                ApiResponse::Single(_) => TileValue::Count(1),
            },
        })
        .collect();

    let failed = tiles
        .iter()
        .filter(|t| matches!(t.value, TileValue::Unavailable(_)))
        .count();
    info!("Dashboard loaded: {} tile(s), {} unavailable", tiles.len(), failed);
    tiles
}
