use axum::{
    extract::{Path, State},
    Json,
};

use crate::{api::error::ApiError, domain::DayForecast, state::AppState};

/// GET /api/forecast/:date
///
/// Predicted and actual consumption for one day, or 404 when the day has no
/// usable input.
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayForecast>, ApiError> {
    state
        .forecasts
        .forecast_async(&date)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no forecast data for {date}")))
}
