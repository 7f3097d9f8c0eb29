//! Scripted object store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use docval_core::provider::ObjectProvider;
use docval_core::{Error, Result};

use super::CloseLog;

/// Scripted outcome for one object name.
#[derive(Debug, Clone)]
pub enum MockObject {
    /// Served with status 200.
    Body(Bytes),
    /// Answered with a non-success status.
    Status(u16),
    /// Headers arrive but the body cannot be read.
    ReadError,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, MockObject>,
    requests: Vec<String>,
}

/// Object store serving scripted responses.
///
/// Unknown names answer 404. Clones share state, so a test can keep a handle
/// after moving one into a service.
#[derive(Debug, Clone, Default)]
pub struct MockObjectProvider {
    inner: Arc<Mutex<Inner>>,
    close_log: Option<CloseLog>,
}

impl MockObjectProvider {
    /// Creates a provider with no objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `name`.
    #[must_use]
    pub fn with_object(self, name: &str, body: impl Into<Bytes>) -> Self {
        self.script(name, MockObject::Body(body.into()))
    }

    /// Answers `status` for `name`.
    #[must_use]
    pub fn with_status(self, name: &str, status: u16) -> Self {
        self.script(name, MockObject::Status(status))
    }

    /// Fails while reading the body of `name`.
    #[must_use]
    pub fn with_read_error(self, name: &str) -> Self {
        self.script(name, MockObject::ReadError)
    }

    /// Records `close` calls in `log` as `"object"`.
    #[must_use]
    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    /// Object names requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    fn script(self, name: &str, object: MockObject) -> Self {
        self.lock().objects.insert(name.to_owned(), object);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ObjectProvider for MockObjectProvider {
    async fn fetch(&self, object_name: &str) -> Result<Bytes> {
        let mut inner = self.lock();
        inner.requests.push(object_name.to_owned());

        match inner.objects.get(object_name) {
            Some(MockObject::Body(body)) => Ok(body.clone()),
            Some(MockObject::Status(status)) => Err(Error::fetch()
                .with_message(format!("object store returned {status} for '{object_name}'"))),
            Some(MockObject::ReadError) => {
                Err(Error::read().with_message("connection closed before body completed"))
            }
            None => Err(Error::fetch()
                .with_message(format!("object store returned 404 for '{object_name}'"))),
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(log) = &self.close_log {
            log.record("object");
        }
        Ok(())
    }
}
