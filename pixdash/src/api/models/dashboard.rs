//! Query parameters for the dashboard endpoint.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::IntoParams;

use crate::engine::RawFilterParams;

/// Raw dashboard query parameters, exactly as the frontend sends them.
///
/// Everything arrives as strings and nothing is validated here; resolution
/// into a normalized filter (and every rejection) happens in
/// [`engine::filter`](crate::engine::filter).
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    /// `today` (default), `yesterday`, `7days` or `custom`
    #[param(example = "today")]
    pub date_range: Option<String>,

    /// Start of a custom range, ISO `YYYY-MM-DD`
    pub start_date: Option<String>,

    /// End of a custom range, ISO `YYYY-MM-DD`
    pub end_date: Option<String>,

    /// Comma-separated bot names; `All` disables the restriction
    #[param(example = "botA,botB")]
    pub bot_filter: Option<String>,

    /// `pending`, `paid` or `cancelado`
    pub mov_status: Option<String>,

    /// `all`, `main`, `not_purchased` or `purchased`
    pub purchase_filter: Option<String>,

    /// Transaction feed page, one-based (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Transaction feed page size (default and cap from configuration)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub per_page: Option<i64>,
}

impl DashboardQuery {
    /// The filter-affecting subset, handed to the resolver untouched.
    pub fn filter_params(&self) -> RawFilterParams {
        RawFilterParams {
            date_range: self.date_range.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            bot_filter: self.bot_filter.clone(),
            mov_status: self.mov_status.clone(),
            purchase_filter: self.purchase_filter.clone(),
        }
    }
}
