//! HTTP handler for the bot listing endpoint.

use axum::{extract::State, response::Json};

use crate::{AppState, api::models::bots::BotNamesResponse, errors::Result};

/// List distinct bot names
#[utoipa::path(
    get,
    path = "/bots",
    tag = "bots",
    summary = "List distinct bot names",
    description = "Bot names seen on interaction or purchase events, merged with the declared \
                   catalog, for populating filter dropdowns.",
    responses(
        (status = 200, description = "Sorted bot names", body = BotNamesResponse),
        (status = 500, description = "Event store failure"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_bots(State(state): State<AppState>) -> Result<Json<BotNamesResponse>> {
    let mut bots = state.store.distinct_bot_names().await?;

    // Declared bots appear even before their first event
    for bot in &state.config.bots.bots {
        if !bots.contains(&bot.name) {
            bots.push(bot.name.clone());
        }
    }
    bots.sort();

    Ok(Json(BotNamesResponse { bots }))
}
