use axum::{routing::get, Router};
use color_eyre::{eyre::eyre, Result};
use tokio::net::TcpListener;
use tracing::info;

pub const ALIVE: &str = "Le bot est en ligne!";

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE
}

/// Claim the keep-alive port before the bot connects; the loopback probe needs it.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| eyre!("failed to bind keep-alive port {port}: {e}"))?;
    info!("Keep-alive server listening on port {port}");
    Ok(listener)
}

/// Serve the keep-alive route until the process exits.
pub async fn serve(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn root_answers_with_a_static_body() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], ALIVE.as_bytes());
    }

    #[tokio::test]
    async fn binding_a_taken_port_fails() {
        let taken = TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        assert!(bind(port).await.is_err());
    }

    #[tokio::test]
    async fn other_routes_are_not_found() {
        let response = router()
            .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
