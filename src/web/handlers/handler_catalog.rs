// HTTP handlers, one file per resource.

pub mod alias;
pub mod comments;
pub mod pages;
pub mod posts;
pub mod profile;
pub mod reports;

use serde::Deserialize;

use crate::core::pagination::PageRequest;

/// `?page=&limit=`, kept as raw strings so bad values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref(), self.limit.as_deref())
    }
}
