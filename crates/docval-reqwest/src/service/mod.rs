//! Object provider implementation.
//!
//! This module implements the [`ObjectProvider`] trait for [`ObjectClient`].

use bytes::Bytes;
use docval_core::provider::ObjectProvider;

use crate::connect::ObjectClient;

#[async_trait::async_trait]
impl ObjectProvider for ObjectClient {
    async fn fetch(&self, object_name: &str) -> docval_core::Result<Bytes> {
        Ok(self.get_object(object_name).await?)
    }
}
