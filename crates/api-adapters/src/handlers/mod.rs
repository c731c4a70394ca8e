pub mod accounts;
pub mod comments;
pub mod moderation;
pub mod relations;
pub mod threads;

use domains::{PageRequest, DEFAULT_PAGE_LIMIT};
use serde::Deserialize;

/// `?page=&limit=`; missing values fall back to the first page of the default size.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }
}
