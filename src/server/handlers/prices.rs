use crate::server::routes::{json_response, HttpResponse};
use crate::server::AppState;

/// `GET /api/commodity-prices`. Live or mock; callers cannot tell which.
pub fn handle(state: &AppState) -> HttpResponse {
    json_response(200, &state.prices.get_prices())
}
