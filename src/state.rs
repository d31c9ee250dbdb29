use crate::errors::JourneyError;
use crate::journey::JourneyStore;
use crate::selection::Selection;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{Mutex, MutexGuard};

/// Shared handles. Lock `journey` before `selection` when both are needed.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub journey: Arc<Mutex<JourneyStore>>,
    pub selection: Arc<Mutex<Selection>>,
    replace_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, store: JourneyStore) -> Self {
        let selection = Selection::for_journey(store.journey());
        Self {
            data_path,
            journey: Arc::new(Mutex::new(store)),
            selection: Arc::new(Mutex::new(selection)),
            replace_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Admits one load or import at a time; a concurrent one is rejected.
    pub fn begin_replace(&self) -> Result<MutexGuard<'_, ()>, JourneyError> {
        self.replace_gate
            .try_lock()
            .map_err(|_| JourneyError::ImportInProgress)
    }

    /// Swaps in a loaded or imported journey and reconciles the selection.
    pub async fn replace_journey(&self, store: JourneyStore) -> usize {
        let mut journey = self.journey.lock().await;
        let mut selection = self.selection.lock().await;
        journey.replace(store);
        selection.reconcile(journey.journey());
        journey.len()
    }
}
