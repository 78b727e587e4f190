// LiveGate API Library
//
// HTTP control surface for relay sessions, room keys and live statistics

pub mod http;

pub use http::{create_router, AppState};
