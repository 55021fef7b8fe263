//! `GambitServer` builder and accept loop.
//!
//! This is the entry point for running a table server. It ties the layers
//! together: transport → protocol → table.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gambit_protocol::{Codec, JsonCodec};
use gambit_table::{spawn_table, MoveOracle, TableConfig, TableHandle};
use gambit_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};

use crate::handler::handle_connection;
use crate::GambitError;

/// Network-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to. Port `0` picks a free port.
    pub bind_addr: String,

    /// A connection that sends nothing for this long is closed. Clients
    /// keep quiet connections alive with heartbeats.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<O: MoveOracle, C: Codec> {
    pub(crate) table: TableHandle<O>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Gambit server.
///
/// # Example
///
/// ```rust,ignore
/// use gambit::prelude::*;
///
/// let server = GambitServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .table_config(TableConfig::default())
///     .build::<MyRules>()
///     .await?;
/// server.run().await
/// ```
pub struct GambitServerBuilder {
    config: ServerConfig,
    table_config: TableConfig,
}

impl GambitServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            table_config: TableConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the inbound idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Replaces all network settings at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the table configuration (reset delay, solo moves, queue size).
    pub fn table_config(mut self, config: TableConfig) -> Self {
        self.table_config = config;
        self
    }

    /// Binds the listener and spawns the table actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<O: MoveOracle>(
        self,
    ) -> Result<GambitServer<O, JsonCodec>, GambitError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let table = spawn_table::<O>(self.table_config);

        let state = Arc::new(ServerState {
            table,
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(GambitServer { transport, state })
    }
}

impl Default for GambitServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Gambit server hosting one table.
///
/// Built with [`GambitServerBuilder`], which picks the oracle at
/// [`build`](GambitServerBuilder::build). Call [`run()`](Self::run) to start
/// accepting connections.
pub struct GambitServer<O: MoveOracle, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<O, C>>,
}

impl<O, C> GambitServer<O, C>
where
    O: MoveOracle,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, GambitError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the hosted table, for diagnostics.
    pub fn table(&self) -> TableHandle<O> {
        self.state.table.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GambitError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops the
    /// table and the listener.
    ///
    /// Each accepted connection gets its own handler task.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), GambitError>
    where
        F: Future,
    {
        tracing::info!("gambit server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        // A table that already stopped is fine here.
        let _ = self.state.table.shutdown().await;
        self.transport.shutdown().await?;
        tracing::info!("gambit server stopped");
        Ok(())
    }
}
