//! Per-connection handler: table registration, frame decoding and the
//! outbound writer.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the table → role, occupancy and position are queued
//!   2. Loop until close, `Leave` or idle timeout:
//!      - inbound frame → decode → forward to the table (or answer a heartbeat)
//!      - outbound table message → wrap in an envelope → send
//!   3. Unregister from the table, freeing the seat, then close the socket.
//!      A drop guard covers the early-return and panic paths.

use std::sync::Arc;
use std::time::Instant;

use gambit_protocol::{Codec, Envelope, Inbound, Outbound};
use gambit_table::{MoveOracle, TableHandle, TableOutbound};
use gambit_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::GambitError;

/// Drop guard that releases the connection's seat when the handler exits.
///
/// Cleanup happens even if the handler returns early with an error. `Drop`
/// is synchronous, so the async disconnect runs in a spawned task. The
/// normal exit path calls [`release`](Self::release) instead.
struct SeatGuard<O: MoveOracle> {
    conn_id: ConnectionId,
    table: TableHandle<O>,
    armed: bool,
}

impl<O: MoveOracle> SeatGuard<O> {
    /// Frees the seat and waits until the table has processed it.
    async fn release(mut self) {
        self.armed = false;
        if let Err(e) = self.table.disconnect(self.conn_id).await {
            tracing::debug!(conn_id = %self.conn_id, error = %e, "disconnect skipped");
        }
    }
}

impl<O: MoveOracle> Drop for SeatGuard<O> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let conn_id = self.conn_id;
        let table = self.table.clone();
        tokio::spawn(async move {
            if let Err(e) = table.disconnect(conn_id).await {
                tracing::debug!(%conn_id, error = %e, "disconnect skipped");
            }
        });
    }
}

/// Per-connection writer state: the outgoing sequence counter and the
/// clock for envelope timestamps.
struct Outgoing<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<C: Codec> Outgoing<'_, C> {
    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send<P, M, A>(&mut self, payload: Outbound<P, M, A>) -> Result<(), GambitError>
    where
        Outbound<P, M, A>: serde::Serialize,
    {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.elapsed_ms(),
            payload,
        };
        self.seq += 1;
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<O, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<O, C>>,
) -> Result<(), GambitError>
where
    O: MoveOracle,
    C: Codec,
{
    let conn_id = conn.id();
    let (tx, mut outbound) = mpsc::unbounded_channel::<TableOutbound<O>>();

    let role = state.table.connect(conn_id, tx).await?;
    let guard = SeatGuard {
        conn_id,
        table: state.table.clone(),
        armed: true,
    };
    tracing::info!(%conn_id, peer = %conn.peer_addr(), %role, "client connected");

    let mut out = Outgoing {
        conn: &conn,
        codec: &state.codec,
        seq: 1,
        start: Instant::now(),
    };

    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut()
                    .reset(tokio::time::Instant::now() + state.idle_timeout);

                let envelope: Envelope<Inbound<O::Move>> = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                        out.send(TableOutbound::<O>::Error {
                            code: 400,
                            message: e.to_string(),
                        })
                        .await?;
                        continue;
                    }
                };

                match envelope.payload {
                    Inbound::SubmitMove { mv } => {
                        state.table.submit_move(conn_id, mv).await?;
                    }
                    Inbound::Ready => {
                        state.table.ready(conn_id).await?;
                    }
                    Inbound::Heartbeat { client_time } => {
                        let server_time = out.elapsed_ms();
                        out.send(TableOutbound::<O>::HeartbeatAck {
                            client_time,
                            server_time,
                        })
                        .await?;
                    }
                    Inbound::Leave { reason } => {
                        tracing::info!(%conn_id, %reason, "client left");
                        break;
                    }
                }
            }

            Some(msg) = outbound.recv() => {
                out.send(msg).await?;
            }

            () = &mut idle => {
                tracing::info!(%conn_id, "connection timed out");
                break;
            }
        }
    }

    // Seat first: once the peer sees the close, a reconnect must find it free.
    guard.release().await;
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }

    Ok(())
}
