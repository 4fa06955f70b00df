use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::pipeline::{PublishPipeline, RawEvent};

pub const EVENT_HEADER: &str = "X-Ami-Event";
pub const CATEGORY_HEADER: &str = "X-Ami-Category";

pub struct AmiSourceState {
    pub pipeline: Arc<PublishPipeline>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub async fn handle_ami_event(
    State(state): State<Arc<AmiSourceState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    // AMI does not guarantee UTF-8, e.g. Latin-1 caller names
    let body = String::from_utf8_lossy(&body);

    let name = header(&headers, EVENT_HEADER)
        .or_else(|| RawEvent::name_from_body(&body))
        .ok_or(AppError::EventNameNotFound)?;

    let category = header(&headers, CATEGORY_HEADER)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    let event = RawEvent::new(name, &body).with_category(category);
    let outcome = state.pipeline.handle(&event);

    tracing::debug!("AMI event {}: {:?}", name, outcome);

    Ok(StatusCode::ACCEPTED)
}
