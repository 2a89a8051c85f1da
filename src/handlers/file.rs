//! Stored-file serving
//!
//! Public GET over the storage root; paths are the relative paths recorded on
//! records (`pengurus/{uuid}.jpg`, `surat_requests/{uuid}.pdf`, ...).

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
};

use crate::error::AppResult;
use crate::state::AppState;
use crate::storage;

/// GET /api/files/*path
pub async fn show(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let bytes = state.store.read(&path).await?;

    let basename = path.rsplit('/').next().unwrap_or(path.as_str());
    let disposition = format!("inline; filename=\"{}\"", basename);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(storage::mime_type(&path)),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, bytes))
}
