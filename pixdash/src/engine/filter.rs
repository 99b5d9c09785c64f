//! Resolution of raw dashboard parameters into a normalized [`SegmentFilter`].
//!
//! Resolution is clock-injected: the caller supplies `today`, so the same
//! parameters always resolve to the same filter under test. Malformed input
//! always fails the call - nothing here degrades into an empty-result query.

use chrono::NaiveDate;

use crate::errors::{Error, Result};
use crate::store::{DateRange, PurchaseStatus, PurchaseType, SegmentFilter};

/// Sentinel in `botFilter` meaning "no bot restriction".
pub const ALL_BOTS: &str = "All";

/// Raw query parameters as they arrive from the dashboard, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawFilterParams {
    /// `today`, `yesterday`, `7days` or `custom`
    pub date_range: Option<String>,
    /// Required (ISO `YYYY-MM-DD`) when `date_range` is `custom`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Comma-separated bot names, or the `All` sentinel
    pub bot_filter: Option<String>,
    /// `pending`, `paid` or `cancelado`; empty means no restriction
    pub mov_status: Option<String>,
    /// `all`, `main`, `not_purchased` or `purchased`
    pub purchase_filter: Option<String>,
}

/// Validate `params` against `today` and produce a normalized filter.
pub fn resolve(params: &RawFilterParams, today: NaiveDate) -> Result<SegmentFilter> {
    let range = resolve_range(params, today)?;

    let bot_names = match params.bot_filter.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let names: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if names.iter().any(|n| n == ALL_BOTS) || names.is_empty() {
                None
            } else {
                Some(names)
            }
        }
    };

    let status = match params.mov_status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<PurchaseStatus>().map_err(|_| Error::InvalidFilter {
            field: "movStatus",
            value: raw.to_string(),
        })?),
    };

    let purchase_type = match params.purchase_filter.as_deref() {
        None | Some("") => PurchaseType::All,
        Some(raw) => raw.parse::<PurchaseType>().map_err(|_| Error::InvalidFilter {
            field: "purchaseFilter",
            value: raw.to_string(),
        })?,
    };

    Ok(SegmentFilter {
        range,
        bot_names,
        status,
        purchase_type,
    })
}

fn resolve_range(params: &RawFilterParams, today: NaiveDate) -> Result<DateRange> {
    match params.date_range.as_deref().unwrap_or("today") {
        "today" | "" => Ok(DateRange::single_day(today)),
        "yesterday" => Ok(DateRange::single_day(today.pred_opt().ok_or_else(|| Error::InvalidRange {
            field: "dateRange",
            message: "no day precedes the current date".to_string(),
        })?)),
        "7days" => Ok(DateRange::trailing_days(today, 7)),
        "custom" => {
            let start = parse_date(params.start_date.as_deref(), "startDate")?;
            let end = parse_date(params.end_date.as_deref(), "endDate")?;
            if start > end {
                return Err(Error::InvalidRange {
                    field: "startDate",
                    message: format!("start {start} is after end {end}"),
                });
            }
            Ok(DateRange::days(start, end))
        }
        other => Err(Error::InvalidFilter {
            field: "dateRange",
            value: other.to_string(),
        }),
    }
}

fn parse_date(raw: Option<&str>, field: &'static str) -> Result<NaiveDate> {
    let raw = raw.filter(|s| !s.is_empty()).ok_or_else(|| Error::InvalidRange {
        field,
        message: format!("{field} is required for a custom range"),
    })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| Error::InvalidRange {
        field,
        message: format!("'{raw}' is not a calendar date: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        "2026-08-20".parse().unwrap()
    }

    #[test]
    fn defaults_to_today_with_no_restrictions() {
        let filter = resolve(&RawFilterParams::default(), today()).unwrap();
        assert_eq!(filter.range, DateRange::single_day(today()));
        assert_eq!(filter.bot_names, None);
        assert_eq!(filter.status, None);
        assert_eq!(filter.purchase_type, PurchaseType::All);
    }

    #[test]
    fn yesterday_resolves_to_the_preceding_day() {
        let params = RawFilterParams {
            date_range: Some("yesterday".to_string()),
            ..Default::default()
        };
        let filter = resolve(&params, today()).unwrap();
        assert_eq!(filter.range, DateRange::single_day("2026-08-19".parse().unwrap()));
    }

    #[test]
    fn custom_range_requires_both_dates() {
        let params = RawFilterParams {
            date_range: Some("custom".to_string()),
            start_date: Some("2026-08-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&params, today()),
            Err(Error::InvalidRange { field: "endDate", .. })
        ));
    }

    // Scenario: an unparsable startDate must fail the whole call, not fall
    // back to an empty-result query.
    #[test]
    fn unparsable_custom_date_is_rejected() {
        let params = RawFilterParams {
            date_range: Some("custom".to_string()),
            start_date: Some("20/08/2026".to_string()),
            end_date: Some("2026-08-20".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&params, today()),
            Err(Error::InvalidRange { field: "startDate", .. })
        ));
    }

    #[test]
    fn inverted_custom_range_is_rejected() {
        let params = RawFilterParams {
            date_range: Some("custom".to_string()),
            start_date: Some("2026-08-21".to_string()),
            end_date: Some("2026-08-20".to_string()),
            ..Default::default()
        };
        assert!(resolve(&params, today()).is_err());
    }

    #[test]
    fn all_sentinel_disables_bot_restriction() {
        let params = RawFilterParams {
            bot_filter: Some("botA, All ,botB".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve(&params, today()).unwrap().bot_names, None);
    }

    #[test]
    fn bot_list_is_split_and_trimmed() {
        let params = RawFilterParams {
            bot_filter: Some("botA, botB,,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve(&params, today()).unwrap().bot_names,
            Some(vec!["botA".to_string(), "botB".to_string()])
        );
    }

    #[test]
    fn unknown_status_is_an_error_not_ignored() {
        let params = RawFilterParams {
            mov_status: Some("refunded".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&params, today()),
            Err(Error::InvalidFilter { field: "movStatus", .. })
        ));
    }

    #[test]
    fn unknown_purchase_filter_is_an_error() {
        let params = RawFilterParams {
            purchase_filter: Some("upsell".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve(&params, today()),
            Err(Error::InvalidFilter { field: "purchaseFilter", .. })
        ));
    }

    #[test]
    fn seven_day_window_ends_today() {
        let params = RawFilterParams {
            date_range: Some("7days".to_string()),
            ..Default::default()
        };
        let filter = resolve(&params, today()).unwrap();
        assert_eq!(filter.range, DateRange::trailing_days(today(), 7));
    }
}
