//! Test support: a minimal in-process chain-node stub.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Version string the stub node reports.
pub(crate) const STUB_NODE_VERSION: &str = "stub-node/0";

/// Starts a loopback HTTP listener that answers every request with a
/// canned `Filecoin.Version` result, and returns its endpoint URL.
///
/// The listener task lives until the test runtime shuts down.
pub(crate) async fn spawn_stub_node() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub node listener");
    let addr = listener.local_addr().expect("stub node address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;

                let body = format!(
                    r#"{{"jsonrpc":"2.0","result":{{"Version":"{STUB_NODE_VERSION}"}},"id":1}}"#
                );
                let response = format!(
                    "HTTP/1.1 200 OK\r\n\
                     content-type: application/json\r\n\
                     content-length: {}\r\n\
                     connection: close\r\n\
                     \r\n\
                     {body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/rpc/v1")
}
