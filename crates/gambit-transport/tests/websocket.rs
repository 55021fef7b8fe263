//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and drive it with a
//! `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use gambit_transport::{Connection, Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on port 0 and returns the transport plus its real address.
    async fn bind_ephemeral() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        server_conn
            .send(b"hello from server")
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from server");

        client_ws
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_text_frames_are_received_as_bytes() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws
            .send(Message::Text("{\"type\":\"Ready\"}".into()))
            .await
            .unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, b"{\"type\":\"Ready\"}");
    }

    #[tokio::test]
    async fn test_websocket_send_is_not_blocked_by_pending_recv() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn =
            std::sync::Arc::new(server_handle.await.unwrap());

        // Park a reader; the client never sends anything.
        let reader = std::sync::Arc::clone(&server_conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        tokio::time::timeout(
            Duration::from_secs(1),
            server_conn.send(b"push"),
        )
        .await
        .expect("send must not wait for recv")
        .unwrap();

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"push");
        pending.abort();
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_connection_ids_are_unique() {
        let (mut transport, addr) = bind_ephemeral().await;
        let server_handle = tokio::spawn(async move {
            let a = transport.accept().await.expect("accept a");
            let b = transport.accept().await.expect("accept b");
            (a, b)
        });
        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;
        let (a, b) = server_handle.await.unwrap();
        assert_ne!(a.id(), b.id());
    }
}
