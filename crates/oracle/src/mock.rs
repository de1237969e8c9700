use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use saldo_core::RawMovement;

use crate::client::{OracleError, PngImage, VisionOracle};
use crate::schema::{MovementsReply, PagesReply};

/// One observed oracle call, for asserting on prompts and attachments.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub instruction: String,
    pub pages: Vec<u32>,
}

/// Scripted stand-in for the real oracle: replies are queued up front,
/// every call is recorded. Lets pipeline and server tests run without
/// network access or credentials.
#[derive(Default)]
pub struct MockOracle {
    pages_replies: Mutex<VecDeque<Result<PagesReply, OracleError>>>,
    movements_replies: Mutex<VecDeque<Result<MovementsReply, OracleError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_pages(self, pages: Vec<i64>) -> Self {
        self.push_pages(Ok(PagesReply { pages }));
        self
    }

    pub fn script_pages_error(self, err: OracleError) -> Self {
        self.push_pages(Err(err));
        self
    }

    pub fn script_movements(self, rows: Vec<RawMovement>) -> Self {
        self.push_movements(Ok(MovementsReply { movimientos: rows }));
        self
    }

    pub fn script_movements_error(self, err: OracleError) -> Self {
        self.push_movements(Err(err));
        self
    }

    /// Everything the oracle has been asked so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    fn push_pages(&self, reply: Result<PagesReply, OracleError>) {
        lock(&self.pages_replies).push_back(reply);
    }

    fn push_movements(&self, reply: Result<MovementsReply, OracleError>) {
        lock(&self.movements_replies).push_back(reply);
    }

    fn record(&self, instruction: &str, images: &[PngImage]) {
        lock(&self.calls).push(RecordedCall {
            instruction: instruction.to_string(),
            pages: images.iter().map(|i| i.page).collect(),
        });
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn exhausted() -> OracleError {
    OracleError::Decode {
        detail: "mock oracle: no scripted reply left".to_string(),
        raw: String::new(),
    }
}

#[async_trait]
impl VisionOracle for MockOracle {
    async fn relevant_pages(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<PagesReply, OracleError> {
        self.record(instruction, images);
        lock(&self.pages_replies)
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }

    async fn extract_movements(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<MovementsReply, OracleError> {
        self.record(instruction, images);
        lock(&self.movements_replies)
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(page: u32) -> PngImage {
        PngImage::new(page, vec![1, 2, 3])
    }

    #[tokio::test]
    async fn scripted_replies_pop_in_order() {
        let oracle = MockOracle::new()
            .script_pages(vec![2])
            .script_pages(vec![7, 8]);

        let first = oracle.relevant_pages("a", &[img(1)]).await.unwrap();
        let second = oracle.relevant_pages("b", &[img(7)]).await.unwrap();
        assert_eq!(first.pages, vec![2]);
        assert_eq!(second.pages, vec![7, 8]);
    }

    #[tokio::test]
    async fn calls_are_recorded_with_page_numbers() {
        let oracle = MockOracle::new().script_pages(vec![]);
        oracle
            .relevant_pages("busca la tabla", &[img(1), img(2), img(3)])
            .await
            .unwrap();

        let calls = oracle.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].instruction, "busca la tabla");
        assert_eq!(calls[0].pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exhausted_queue_is_an_error() {
        let oracle = MockOracle::new();
        let err = oracle.extract_movements("x", &[]).await.unwrap_err();
        assert!(err.to_string().contains("no scripted reply"));
    }
}
