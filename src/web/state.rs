//! Shared application state

use crate::qna::QnaService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Query orchestration service
    pub qna: QnaService,
}

impl AppState {
    pub fn new(qna: QnaService) -> Self {
        Self { qna }
    }
}
