//! Cursor pagination DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::dto::UserResponse;
use crate::models::User;
use crate::repositories::{MAX_PAGE_SIZE, Page, PageInfo};

/// Query parameters of the user listing.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct UserQueryParams {
    /// Case-insensitive match on the display name
    #[validate(length(max = 100, message = "Search must be at most 100 characters"))]
    pub search: Option<String>,

    /// Page size (default 10, max 50)
    #[validate(range(min = 1, max = MAX_PAGE_SIZE, message = "first must be between 1 and 50"))]
    #[param(minimum = 1, maximum = 50, example = 10)]
    pub first: Option<i64>,

    /// `end_cursor` of the previous page
    pub after: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageInfoResponse {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl From<PageInfo> for PageInfoResponse {
    fn from(info: PageInfo) -> Self {
        Self {
            start_cursor: info.start_cursor,
            end_cursor: info.end_cursor,
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEdge {
    pub node: UserResponse,
    pub cursor: String,
}

/// One page of users in keyset order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserPageResponse {
    pub edges: Vec<UserEdge>,
    pub page_info: PageInfoResponse,
    /// Number of users matching the filter, across all pages
    #[schema(example = 42)]
    pub total_count: i64,
}

impl From<Page<User>> for UserPageResponse {
    fn from(page: Page<User>) -> Self {
        let page = page.map(UserResponse::from);
        Self {
            edges: page
                .edges
                .into_iter()
                .map(|edge| UserEdge {
                    node: edge.node,
                    cursor: edge.cursor,
                })
                .collect(),
            page_info: page.page_info.into(),
            total_count: page.total_count,
        }
    }
}
