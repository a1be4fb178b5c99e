//! Item CRUD handlers.
//!
//! Input is normalized here before it reaches the store: names are trimmed
//! and must be non-empty, ids must be numeric.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::coerce::{number_from_text, number_to_text, trim_text};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::Item;

#[derive(Debug, Serialize)]
pub struct CreatedItem {
    pub id: i64,
    pub name: String,
}

/// `GET /api/items`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Item>>, AppError> {
    Ok(Json(state.store.list().await?))
}

/// `POST /api/items`
///
/// The body is parsed leniently: a missing or malformed body, or one not sent
/// as `application/json`, is treated the same as a missing `name`.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedItem>), AppError> {
    let payload: Value = if is_json_request(&headers) {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    } else {
        Value::Null
    };
    let name = normalize_name(payload.get("name")).ok_or(AppError::NameRequired)?;

    let id = state.store.create(name.clone()).await?;
    tracing::info!(id, name = %name, "Created item");

    Ok((StatusCode::CREATED, Json(CreatedItem { id, name })))
}

/// `DELETE /api/items/{id}`
///
/// A segment that cannot be decoded to UTF-8 is an invalid id like any other.
pub async fn delete(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(raw_id) = raw_id.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Undecodable item id");
        AppError::InvalidId
    })?;
    if let Some(id) = parse_item_id(&raw_id)? {
        state.store.delete(id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Whether the request declares a JSON body (`application/json`, parameters ignored).
fn is_json_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Turn the submitted `name` into trimmed text.
///
/// Strings are used as-is, numbers and `true` are rendered as text. Falsy
/// values (`null`, `false`, `0`, `""`) and structured values count as missing.
/// Returns `None` when nothing is left after trimming.
fn normalize_name(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => number_to_text(n),
        Value::Bool(true) => "true".to_string(),
        _ => return None,
    };

    let trimmed = trim_text(&text);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validate a path id.
///
/// The segment is read the way a browser converts text to a number, so blank
/// text is `0` and `0x` literals are accepted. Anything that is not a finite
/// number is rejected. A finite number that is not a whole `i64` (e.g. `1.5`)
/// is accepted but can never match a row, so `Ok(None)` is returned and the
/// delete becomes a no-op.
fn parse_item_id(raw: &str) -> Result<Option<i64>, AppError> {
    let value = number_from_text(raw);
    if !value.is_finite() {
        return Err(AppError::InvalidId);
    }

    if value.fract() != 0.0 || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Ok(None);
    }
    Ok(Some(value as i64))
}
