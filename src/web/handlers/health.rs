use salvo::prelude::*;
use serde_json::json;

use crate::web::app_state;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render(Json(json!({ "status": "ok" })));
}

#[handler]
pub async fn get_status(depot: &mut Depot, res: &mut Response) {
    let state = match app_state(depot) {
        Ok(state) => state,
        Err(err) => {
            err.render(res);
            return;
        }
    };

    res.render(Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "started_at": state.started_at_utc.to_rfc3339(),
        "database": state.database,
        "quotes_enabled": state.quotes.is_some(),
    })));
}
