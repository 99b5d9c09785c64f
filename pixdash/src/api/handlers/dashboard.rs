//! HTTP handler for the dashboard reporting endpoint.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Local;

use crate::{
    AppState,
    api::models::dashboard::DashboardQuery,
    engine::{self, DashboardReport, ReportingFacade},
    errors::Result,
};

/// Assemble the full dashboard report
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    summary = "Assemble the full dashboard report",
    description = "Resolves the raw filter parameters, fans out every snapshot/rollup/series/feed \
                   computation concurrently and returns the merged report. Malformed parameters fail \
                   the whole call - nothing degrades into an empty-result query.",
    params(DashboardQuery),
    responses(
        (status = 200, description = "The assembled report", body = DashboardReport),
        (status = 400, description = "Malformed filter or pagination parameter, named in the body"),
        (status = 504, description = "The configured assembly deadline elapsed"),
        (status = 500, description = "Event store failure"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(State(state): State<AppState>, Query(query): Query<DashboardQuery>) -> Result<Json<DashboardReport>> {
    let today = Local::now().date_naive();
    let filter = engine::filter::resolve(&query.filter_params(), today)?;

    let dashboard = &state.config.dashboard;
    let page = query.page.unwrap_or(1);
    // Zero and negative sizes pass through so they are rejected as
    // InvalidPagination rather than silently clamped
    let per_page = query
        .per_page
        .unwrap_or(dashboard.default_per_page)
        .min(dashboard.max_per_page);

    let facade = ReportingFacade::new(state.store.clone(), dashboard);
    let report = facade.build_report(&filter, page, per_page, today).await?;
    Ok(Json(report))
}
