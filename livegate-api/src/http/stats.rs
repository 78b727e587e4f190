// Live statistics handlers

use axum::extract::State;
use livegate_core::stats::{LiveStats, StreamStat};

use super::{form::Params, response::ApiResponse, AppError, AppResult, AppState};

const LIVESTAT_USAGE: &str = "url: /stats/livestat?room=<ROOM_NAME>";

pub async fn livestats(State(state): State<AppState>) -> AppResult<ApiResponse<LiveStats>> {
    let stats = state.stats.snapshot_all()?;
    Ok(ApiResponse::ok(stats))
}

pub async fn livestat(
    State(state): State<AppState>,
    params: Params,
) -> AppResult<ApiResponse<StreamStat>> {
    let room = params
        .required("room")
        .ok_or_else(|| AppError::bad_request(LIVESTAT_USAGE))?;

    let stat = state.stats.snapshot_one(room)?;
    Ok(ApiResponse::ok(stat))
}
