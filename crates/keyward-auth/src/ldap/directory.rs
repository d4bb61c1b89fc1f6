//! Directory port
//!
//! The cache only needs search (and, for key registration, modify) from the
//! directory. Implementations enforce their own timeouts and report them as
//! ordinary errors.

use async_trait::async_trait;
use keyward_core::Result;
use std::sync::Arc;

use crate::ldap::types::{ModifyRequest, SearchEntry, SearchRequest};

#[async_trait]
pub trait Directory: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchEntry>>;

    async fn modify(&self, request: &ModifyRequest) -> Result<()>;
}

#[async_trait]
impl<T: Directory + ?Sized> Directory for Arc<T> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchEntry>> {
        (**self).search(request).await
    }

    async fn modify(&self, request: &ModifyRequest) -> Result<()> {
        (**self).modify(request).await
    }
}
