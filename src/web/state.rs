use crate::model::ModelManager;
use crate::progress::{CompletionBasis, ProgressEngine};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    engine: ProgressEngine,
}

impl AppState {
    pub fn new(mm: ModelManager, basis: CompletionBasis) -> Self {
        let engine = ProgressEngine::new(mm.clone(), basis);
        Self { mm, engine }
    }

    pub fn mm(&self) -> &ModelManager {
        &self.mm
    }

    pub fn engine(&self) -> &ProgressEngine {
        &self.engine
    }
}
