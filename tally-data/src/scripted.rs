use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tally_core::{LogRequest, Page};

use crate::LogQuery;

/// In-memory [`LogQuery`] that replays a fixed script of responses.
///
/// Every request is recorded. Once the script runs out, an empty final page
/// is returned, which is how a drained remote log behaves. Other crates reach
/// it through the `test-util` feature.
#[derive(Default)]
pub struct ScriptedQuery {
    responses: Mutex<VecDeque<Result<Page, String>>>,
    requests: Mutex<Vec<LogRequest>>,
}

impl ScriptedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(self, page: Page) -> Self {
        self.responses.lock().push_back(Ok(page));
        self
    }

    #[must_use]
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().push_back(Err(message.into()));
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<LogRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LogQuery for ScriptedQuery {
    async fn query(&self, request: LogRequest) -> Result<Page> {
        self.requests.lock().push(request);
        match self.responses.lock().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Page::new(Vec::new())),
        }
    }
}
