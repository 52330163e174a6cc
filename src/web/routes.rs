use salvo::affix_state;
use salvo::prelude::*;

use crate::web::AppState;
use crate::web::handlers::{
    health::{get_status, health_check},
    quote::get_quote,
    visitor_count::{get_visitor_count, increment_visitor_count},
};
use crate::web::metrics::metrics_endpoint;

pub fn create_router(state: AppState) -> Router {
    let api = Router::with_path("api")
        .push(
            Router::with_path("visitor-count")
                .get(get_visitor_count)
                .post(increment_visitor_count),
        )
        .push(Router::with_path("quote").get(get_quote));

    let mut router = Router::new()
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("status").get(get_status))
        .push(api);
    if state.metrics_enabled {
        router = router.push(Router::with_path("metrics").get(metrics_endpoint));
    }

    router.hoop(affix_state::inject(state))
}
