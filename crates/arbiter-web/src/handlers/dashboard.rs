//! Dashboard handler — serves the single-page gateway console.

use axum::{extract::State, response::Html};

use crate::state::SharedState;

pub async fn dashboard(State(_state): State<SharedState>) -> Html<String> {
    let html = include_str!("../../templates/dashboard.html");
    Html(html.to_string())
}
