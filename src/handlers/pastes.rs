use axum::{
    Extension,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sonic_rs::{JsonValueTrait, Value};

use crate::{
    config::Config,
    error::{AppError, Result},
    middleware_layer::request_time::RequestTime,
    state::AppState,
    validation::paste::validate_create_fields,
};

/// The response payload for a created paste.
#[derive(Serialize, Debug)]
pub struct CreatePasteResponse {
    pub id: String,
    pub url: String,
}

/// The response payload for a fetched paste.
#[derive(Serialize, Debug)]
pub struct PasteResponse {
    pub content: String,
    pub remaining_views: Option<i32>,
    pub expires_at: Option<String>,
}

/// Builds the share link for a paste.
///
/// The request `Origin` wins, then the configured public base URL, then the
/// bind address.
fn public_url(config: &Config, headers: &HeaderMap, id: &str) -> String {
    let base = headers
        .get(header::ORIGIN)
        .and_then(|origin| origin.to_str().ok())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty() && origin != "null")
        .or_else(|| config.public_base_url.clone())
        .unwrap_or_else(|| format!("http://{}", config.bind_addr));

    format!("{}/p/{}", base, id)
}

/// Parses a request body that must be a JSON object.
///
/// Fields stay untyped so that a wrong JSON type is reported as a
/// validation error for that field.
fn parse_object(body: &[u8]) -> Result<Value> {
    sonic_rs::from_slice::<Value>(body)
        .ok()
        .filter(|value| value.is_object())
        .ok_or_else(|| AppError::Validation("Request body must be a JSON object".to_string()))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response> {
    let body = sonic_rs::to_string(body)
        .map_err(|e| AppError::Internal(format!("Failed to encode response: {}", e)))?;
    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Creates a new paste.
#[axum::debug_handler]
pub async fn create_paste(
    State(state): State<AppState>,
    Extension(RequestTime(now)): Extension<RequestTime>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let draft = {
        let request = parse_object(&body)?;
        let field = |name: &str| request.get(name).filter(|value| !value.is_null());
        validate_create_fields(field("content"), field("ttl_seconds"), field("max_views"))?
    };

    let created = state.pastes.create(draft, now).await?;
    let url = public_url(&state.config, &headers, &created.id);

    json_response(
        StatusCode::CREATED,
        &CreatePasteResponse {
            id: created.id,
            url,
        },
    )
}

/// Returns a paste, consuming one view if it is view-limited.
#[axum::debug_handler]
pub async fn get_paste(
    State(state): State<AppState>,
    Extension(RequestTime(now)): Extension<RequestTime>,
    Path(id): Path<String>,
) -> Result<Response> {
    let view = state.pastes.consume(&id, now).await?;

    json_response(
        StatusCode::OK,
        &PasteResponse {
            content: view.content,
            remaining_views: view.remaining_views,
            expires_at: view.expires_at.map(|t| t.to_rfc3339()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> Config {
        Config::in_memory("127.0.0.1:3000".parse().unwrap())
    }

    #[test]
    fn body_must_be_an_object() {
        for body in [r#"["hello", 60, 2]"#, r#""hello""#, "42", "null", "not json", ""] {
            match parse_object(body.as_bytes()) {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, "Request body must be a JSON object", "body: {}", body)
                }
                other => panic!("expected validation error for {}, got {:?}", body, other.is_ok()),
            }
        }
        assert!(parse_object(br#"{"content":"hello"}"#).is_ok());
    }

    #[test]
    fn url_prefers_origin_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://app.example.com/"));
        assert_eq!(
            public_url(&config(), &headers, "aB3dE6gH"),
            "https://app.example.com/p/aB3dE6gH"
        );
    }

    #[test]
    fn url_falls_back_to_configured_base() {
        let mut config = config();
        config.public_base_url = Some("https://paste.example.com".to_string());
        assert_eq!(
            public_url(&config, &HeaderMap::new(), "aB3dE6gH"),
            "https://paste.example.com/p/aB3dE6gH"
        );
    }

    #[test]
    fn url_falls_back_to_bind_address() {
        assert_eq!(
            public_url(&config(), &HeaderMap::new(), "aB3dE6gH"),
            "http://127.0.0.1:3000/p/aB3dE6gH"
        );
    }
}
