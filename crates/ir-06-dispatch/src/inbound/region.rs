//! `/region/{region_id}/{handle}/UpdateEstateInfo/`.

use super::{bad_request, InboundState};
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use ir_03_local_dispatch::Local;
use shared_types::EntityPath;
use tracing::info;

const UPDATE_ESTATE_INFO: &str = "UpdateEstateInfo";

pub(super) async fn estate(State(state): State<InboundState>, method: Method, uri: Uri) -> Response {
    let path = match EntityPath::parse(uri.path()) {
        Ok(path) => path,
        Err(e) => return bad_request(e.to_string()),
    };
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    if !path.action.eq_ignore_ascii_case(UPDATE_ESTATE_INFO) {
        return (StatusCode::NOT_FOUND, format!("unknown region action {}", path.action)).into_response();
    }

    info!(region_id = %path.id, "Estate info update requested");
    match state.local.update_estate_info(path.id).await {
        Local::Handled(Ok(())) => StatusCode::OK.into_response(),
        Local::Handled(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.reason).into_response(),
        Local::NotLocal => (StatusCode::NOT_FOUND, "region not found").into_response(),
    }
}
