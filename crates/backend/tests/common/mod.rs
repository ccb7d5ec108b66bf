//! Shared harness: a local stub standing in for the hosted backend's
//! `/rest/v1` table routes.

use axum::Router;

use lutspace_backend::BackendClient;
use lutspace_core::config::BackendConfig;

/// Serve a stub router on an ephemeral local port and return a client
/// pointed at it.
pub async fn client_for(app: Router) -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    BackendClient::new(&BackendConfig {
        project_url: format!("http://{addr}"),
        anon_key: "anon-test-key".into(),
    })
}
