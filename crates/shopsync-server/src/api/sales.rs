use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const RECENT_SALES_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
pub(super) struct SaleItem {
    sku: Option<String>,
    title: Option<String>,
    /// `YYYY-MM-DD HH:MM` in UTC.
    sold_at: Option<String>,
    price: Option<Decimal>,
}

fn format_sold_at(sold_at: DateTime<Utc>) -> String {
    sold_at.format("%Y-%m-%d %H:%M").to_string()
}

pub(super) async fn list_recent_sales(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<SaleItem>>>, ApiError> {
    let rows = shopsync_db::list_recent_sales(&state.pool, RECENT_SALES_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| SaleItem {
            sku: row.sku,
            title: row.title,
            sold_at: row.sold_at.map(format_sold_at),
            price: row.price,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
