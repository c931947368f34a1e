//! Local HTTP surface for a rendered dashboard.

use std::net::SocketAddr;

use sitepulse_core::DashboardModel;
use tracing::info;
use warp::{Filter, Rejection, Reply};

/// `GET /` serves the page, `GET /snapshot.json` the model behind it.
pub fn routes(
    html: String,
    snapshot_json: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let page = warp::get()
        .and(warp::path::end())
        .map(move || warp::reply::html(html.clone()));

    let snapshot = warp::get()
        .and(warp::path("snapshot.json"))
        .and(warp::path::end())
        .map(move || {
            warp::reply::with_header(
                snapshot_json.clone(),
                "content-type",
                "application/json",
            )
        });

    page.or(snapshot)
}

/// Serve until ctrl-c.
pub async fn serve(addr: SocketAddr, html: String, model: &DashboardModel) -> anyhow::Result<()> {
    let snapshot_json = serde_json::to_string_pretty(model)?;
    let (bound, server) = warp::serve(routes(html, snapshot_json))
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
        })?;

    info!(addr = %bound, "serving dashboard, ctrl-c to stop");
    server.await;
    info!("server stopped");
    Ok(())
}
