//! Bounded concurrent routing.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::router::{RouteRequest, RouteResult, Router};

/// Route every request with at most `limit` in flight.
///
/// Results come back in request order. Each route is independent; a routing
/// task that dies still yields a partial-success result.
pub async fn route_batch(
    router: Arc<Router>,
    requests: Vec<RouteRequest>,
    limit: usize,
) -> Vec<RouteResult> {
    let limit = limit.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    info!("Routing batch of {} with concurrency {}", requests.len(), limit);

    let (fallbacks, handles): (Vec<_>, Vec<_>) = requests
        .into_iter()
        .map(|request| {
            let fallback = (
                request.job_id.clone(),
                request.plan.clone(),
                request.artifacts.clone(),
            );
            let router = Arc::clone(&router);
            let semaphore = Arc::clone(&semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                router.route(request).await
            });
            (fallback, handle)
        })
        .unzip();

    let mut results = Vec::with_capacity(handles.len());
    for ((job_id, plan, artifacts), joined) in fallbacks.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(job_id = %job_id, "Routing task failed: {}", e);
                results.push(router.abandoned(
                    job_id,
                    plan,
                    artifacts,
                    format!("routing task failed: {}", e),
                ));
            }
        }
    }
    results
}
