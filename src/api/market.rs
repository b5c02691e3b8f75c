use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::validation::validate_crop;
use super::{ApiError, AppState, MarketQuery};
use crate::services::market::{self, MarketQuote};

/// GET /api/market/prices?crop&state&market
pub async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<MarketQuote>, ApiError> {
    let crop = validate_crop(query.crop.as_deref())?;
    let region = query.state.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let mandi = query.market.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let today = (state.shared.clock)().date_naive();

    let quote = market::quote(&mut rand::rng(), crop, region, mandi, today);

    tracing::debug!(
        crop,
        state = %quote.state,
        market = %quote.market,
        modal_price = quote.prices.modal_price,
        "Market quote generated"
    );

    Ok(Json(quote))
}
