use salvo::prelude::*;
use serde_json::json;

use crate::web::app_state;
use crate::web::error::ApiError;
use crate::web::metrics::Metrics;

#[handler]
pub async fn get_quote(depot: &mut Depot, res: &mut Response) {
    let quotes = match app_state(depot).map(|state| state.quotes.clone()) {
        Ok(Some(quotes)) => quotes,
        Ok(None) => {
            res.status_code(StatusCode::NOT_FOUND);
            res.render(Json(json!({ "error": "quotes are disabled" })));
            return;
        }
        Err(err) => {
            err.render(res);
            return;
        }
    };

    match quotes.random_quote().await {
        Ok(quote) => {
            Metrics::quote_served();
            res.render(Json(json!({ "quote": quote })));
        }
        Err(err) => {
            Metrics::quote_failed();
            ApiError::from(err).render(res);
        }
    }
}
