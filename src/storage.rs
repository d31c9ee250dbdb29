use crate::document;
use crate::errors::{AppError, JourneyError};
use crate::journey::JourneyStore;
use crate::models::JourneyDocument;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the saved journey. A missing file means nothing was saved yet.
pub async fn load_journey(path: &Path) -> Result<JourneyStore, AppError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(JourneyError::not_found("no saved journey found").into());
        }
        Err(err) => {
            error!("failed to read data file: {err}");
            return Err(err.into());
        }
    };
    let journey = document::parse_bytes(&bytes).map_err(|err| {
        error!("failed to parse data file: {err}");
        err
    })?;
    Ok(JourneyStore::from_journey(journey))
}

pub async fn persist_journey(path: &Path, doc: &JourneyDocument) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(doc).map_err(AppError::internal)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
