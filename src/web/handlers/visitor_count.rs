use salvo::prelude::*;

use crate::web::app_state;
use crate::web::error::{ApiError, INCREMENT_FAILED, READ_FAILED};
use crate::web::metrics::Metrics;

#[handler]
pub async fn get_visitor_count(depot: &mut Depot, res: &mut Response) {
    let counter = match app_state(depot) {
        Ok(state) => state.counter.clone(),
        Err(err) => {
            err.render(res);
            return;
        }
    };

    match counter.current().await {
        Ok(body) => {
            Metrics::visitor_count_read(body.count);
            res.render(Json(body));
        }
        Err(err) => {
            Metrics::visitor_count_failed(err.is_unavailable());
            ApiError::storage(READ_FAILED, err).render(res);
        }
    }
}

/// Registers a visit. Any request body is ignored.
#[handler]
pub async fn increment_visitor_count(depot: &mut Depot, res: &mut Response) {
    let counter = match app_state(depot) {
        Ok(state) => state.counter.clone(),
        Err(err) => {
            err.render(res);
            return;
        }
    };

    match counter.record_visit().await {
        Ok(body) => {
            Metrics::visitor_count_incremented(body.count);
            res.render(Json(body));
        }
        Err(err) => {
            Metrics::visitor_count_failed(err.is_unavailable());
            ApiError::storage(INCREMENT_FAILED, err).render(res);
        }
    }
}
