// Control handlers: relay sessions and room keys

use axum::extract::State;
use livegate_core::engine::room_stream_key;
use livegate_core::relay::{Direction, StartOutcome};

use super::{form::Params, response::ApiResponse, AppError, AppResult, AppState};

const PUSH_USAGE: &str =
    "url: /control/push?&oper=start&app=live&name=123456&url=rtmp://192.168.16.136/live/123456";
const PULL_USAGE: &str =
    "url: /control/pull?&oper=start&app=live&name=123456&url=rtmp://192.168.16.136/live/123456";
const RESET_USAGE: &str = "url: /control/reset?room=<ROOM_NAME>";
const GET_USAGE: &str = "url: /control/get?room=<ROOM_NAME>";
const DELETE_USAGE: &str = "url: /control/delete?room=<ROOM_NAME>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Oper {
    Start,
    Stop,
}

impl Oper {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

struct RelayRequest<'a> {
    oper: Oper,
    app: &'a str,
    name: &'a str,
    url: &'a str,
}

impl<'a> RelayRequest<'a> {
    fn parse(params: &'a Params) -> Option<Self> {
        Some(Self {
            oper: Oper::parse(params.get("oper"))?,
            app: params.required("app")?,
            name: params.required("name")?,
            url: params.required("url")?,
        })
    }
}

pub async fn push(State(state): State<AppState>, params: Params) -> AppResult<ApiResponse<String>> {
    relay(&state, Direction::Push, &params).await
}

pub async fn pull(State(state): State<AppState>, params: Params) -> AppResult<ApiResponse<String>> {
    relay(&state, Direction::Pull, &params).await
}

async fn relay(
    state: &AppState,
    direction: Direction,
    params: &Params,
) -> AppResult<ApiResponse<String>> {
    let usage = match direction {
        Direction::Push => PUSH_USAGE,
        Direction::Pull => PULL_USAGE,
    };
    let req = RelayRequest::parse(params).ok_or_else(|| AppError::bad_request(usage))?;

    tracing::debug!(
        %direction,
        oper = ?req.oper,
        app = req.app,
        name = req.name,
        url = req.url,
        "Control relay request"
    );

    match req.oper {
        Oper::Start => {
            let outcome = state
                .relays
                .start(direction, req.app, req.name, req.url)
                .await
                .map_err(|e| AppError::internal(format!("{direction} error={e}")))?;

            let key = outcome.key();
            let message = match &outcome {
                StartOutcome::Started(_) => direction.start_message(req.url),
                StartOutcome::AlreadyActive(_) => {
                    format!("<h1>session key[{key}] already exists</h1></br>")
                }
            };
            tracing::info!(session = %key, "Control relay start handled");
            Ok(ApiResponse::ok(message))
        }
        Oper::Stop => {
            let info = state.relays.stop(direction, req.app, req.name).await?;
            Ok(ApiResponse::ok(direction.stop_message(info.remote_url())))
        }
    }
}

/// Generate a new key for the room
pub async fn reset(State(state): State<AppState>, params: Params) -> AppResult<ApiResponse<String>> {
    let room = params
        .required("room")
        .ok_or_else(|| AppError::bad_request(RESET_USAGE))?;

    let key = state.room_keys.set_key(room).await?;
    tracing::info!(room, "Room key reset");
    Ok(ApiResponse::ok(key))
}

pub async fn get(State(state): State<AppState>, params: Params) -> AppResult<ApiResponse<String>> {
    let room = params
        .required("room")
        .ok_or_else(|| AppError::bad_request(GET_USAGE))?;

    let key = state.room_keys.get_key(room).await?;
    Ok(ApiResponse::ok(key))
}

/// Close the room's stream and drop its key
pub async fn delete(State(state): State<AppState>, params: Params) -> AppResult<ApiResponse<String>> {
    let room = params
        .required("room")
        .ok_or_else(|| AppError::bad_request(DELETE_USAGE))?;

    let provider = state
        .streams
        .as_ref()
        .ok_or_else(|| AppError::internal("Get rtmp stream information error"))?;
    let stream = provider
        .get_stream(&room_stream_key(room))
        .ok_or_else(|| AppError::not_found("No room was found"))?;

    stream.trans_stop();
    stream.close_and_complete();

    if state.room_keys.delete_channel(room).await {
        tracing::info!(room, "Room deleted");
        Ok(ApiResponse::ok("Ok".to_string()))
    } else {
        Err(AppError::not_found("room not found"))
    }
}
