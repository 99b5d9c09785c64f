//! Response shape for the bot listing endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bot names available for the dashboard's filter dropdown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BotNamesResponse {
    /// Sorted, deduplicated bot names from the event log and the declared
    /// catalog
    pub bots: Vec<String>,
}
