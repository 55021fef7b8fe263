//! Table actor: one Tokio task that owns a table, its seat registry and the
//! outbound channel of every connection watching it.
//!
//! The outside world talks to it only through [`TableHandle`]. Commands are
//! processed strictly in arrival order, which is what makes turn checks and
//! move application race-free without any locks.

use std::collections::HashMap;

use gambit_protocol::{Role, Seat};
use gambit_session::SeatRegistry;
use gambit_transport::ConnectionId;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::arbiter::{self, Ruling};
use crate::fanout::{self, ConnectionSender};
use crate::{MoveOracle, Phase, Table, TableConfig, TableError};

/// Commands sent to a table actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect an answer; the rest are
/// fire-and-forget.
pub(crate) enum TableCommand<O: MoveOracle> {
    /// Register a connection, assign it a role and greet it.
    Connect {
        conn: ConnectionId,
        sender: ConnectionSender<O>,
        reply: oneshot::Sender<Result<Role, TableError>>,
    },

    /// Forget a connection and free its seat.
    Disconnect {
        conn: ConnectionId,
        reply: oneshot::Sender<Result<Option<Seat>, TableError>>,
    },

    /// A move submission from a connection.
    SubmitMove { conn: ConnectionId, mv: O::Move },

    /// A seated client finished its pre-game countdown.
    Ready { conn: ConnectionId },

    /// The post-game delay for `generation` has elapsed.
    ScheduledReset { generation: u64 },

    GetInfo {
        reply: oneshot::Sender<TableInfo>,
    },

    GetPosition {
        reply: oneshot::Sender<O::Position>,
    },

    Shutdown,
}

/// A snapshot of table metadata (not the position itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    /// Current turn phase.
    pub phase: Phase,
    /// Current game generation.
    pub generation: u64,
    /// Number of bound seats (0..=2).
    pub occupancy: usize,
    /// Number of spectators.
    pub spectators: usize,
    /// Number of registered connections, seated or not.
    pub connections: usize,
    /// Moves accepted in the current game.
    pub plies: u32,
    /// Resets performed since the table was spawned.
    pub resets: u64,
}

/// Handle to a running table actor.
///
/// Cheap to clone: it wraps an `mpsc::Sender`. The actor stops once every
/// handle is dropped or [`shutdown`](Self::shutdown) is called.
pub struct TableHandle<O: MoveOracle> {
    sender: mpsc::Sender<TableCommand<O>>,
}

impl<O: MoveOracle> Clone for TableHandle<O> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<O: MoveOracle> TableHandle<O> {
    /// Registers a connection. Messages for it arrive on `sender`'s
    /// receiving end, starting with its role, the occupancy and the live
    /// position.
    ///
    /// # Errors
    /// [`TableError::AlreadyConnected`] if `conn` is registered already.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: ConnectionSender<O>,
    ) -> Result<Role, TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::Connect {
            conn,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| TableError::Unavailable)?
    }

    /// Unregisters a connection. Returns the seat it freed, if any.
    ///
    /// # Errors
    /// [`TableError::NotConnected`] if `conn` is unknown.
    pub async fn disconnect(
        &self,
        conn: ConnectionId,
    ) -> Result<Option<Seat>, TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::Disconnect {
            conn,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| TableError::Unavailable)?
    }

    /// Submits a move (fire-and-forget). The outcome arrives as broadcast
    /// messages, or not at all for silently ignored submissions.
    pub async fn submit_move(
        &self,
        conn: ConnectionId,
        mv: O::Move,
    ) -> Result<(), TableError> {
        self.send(TableCommand::SubmitMove { conn, mv }).await
    }

    /// Signals that a seated client is ready for a fresh game.
    pub async fn ready(&self, conn: ConnectionId) -> Result<(), TableError> {
        self.send(TableCommand::Ready { conn }).await
    }

    /// Requests a metadata snapshot.
    pub async fn info(&self) -> Result<TableInfo, TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| TableError::Unavailable)
    }

    /// Requests the current position.
    pub async fn position(&self) -> Result<O::Position, TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::GetPosition { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| TableError::Unavailable)
    }

    /// Tells the actor to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), TableError> {
        self.send(TableCommand::Shutdown).await
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: TableCommand<O>) -> Result<(), TableError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| TableError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct TableActor<O: MoveOracle> {
    config: TableConfig,
    table: Table<O>,
    seats: SeatRegistry,
    /// Per-connection outbound channels. Keys are exactly the registered
    /// connections.
    connections: HashMap<ConnectionId, ConnectionSender<O>>,
    /// Armed when the second seat fills; the next `Ready` from a seated
    /// connection starts a fresh game and disarms it.
    fresh_game_armed: bool,
    resets: u64,
    receiver: mpsc::Receiver<TableCommand<O>>,
    /// Weak so that pending reset timers never keep a dropped table alive.
    commands: mpsc::WeakSender<TableCommand<O>>,
}

impl<O: MoveOracle> TableActor<O> {
    async fn run(mut self) {
        tracing::info!(generation = self.table.generation(), "table actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                TableCommand::Connect {
                    conn,
                    sender,
                    reply,
                } => {
                    let result = self.handle_connect(conn, sender);
                    let _ = reply.send(result);
                }
                TableCommand::Disconnect { conn, reply } => {
                    let result = self.handle_disconnect(conn);
                    let _ = reply.send(result);
                }
                TableCommand::SubmitMove { conn, mv } => {
                    self.handle_submit(conn, mv);
                }
                TableCommand::Ready { conn } => {
                    self.handle_ready(conn);
                }
                TableCommand::ScheduledReset { generation } => {
                    self.handle_scheduled_reset(generation);
                }
                TableCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                TableCommand::GetPosition { reply } => {
                    let _ = reply.send(self.table.position().clone());
                }
                TableCommand::Shutdown => {
                    tracing::info!("table shutting down");
                    break;
                }
            }
        }

        tracing::info!(resets = self.resets, "table actor stopped");
    }

    fn handle_connect(
        &mut self,
        conn: ConnectionId,
        sender: ConnectionSender<O>,
    ) -> Result<Role, TableError> {
        if self.connections.contains_key(&conn) {
            return Err(TableError::AlreadyConnected(conn));
        }

        let before = self.seats.occupancy();
        let role = self.seats.bind_seat(conn);
        self.connections.insert(conn, sender);
        let seated = self.seats.occupancy();

        if before < Seat::ALL.len() && self.seats.is_full() {
            self.fresh_game_armed = true;
        }

        tracing::info!(
            %conn,
            %role,
            seated,
            connections = self.connections.len(),
            "connection joined table"
        );

        fanout::deliver(
            &self.connections,
            fanout::joined::<O>(conn, role, seated, self.table.position()),
        );

        Ok(role)
    }

    fn handle_disconnect(
        &mut self,
        conn: ConnectionId,
    ) -> Result<Option<Seat>, TableError> {
        if self.connections.remove(&conn).is_none() {
            return Err(TableError::NotConnected(conn));
        }

        let freed = self.seats.release_seat(conn);
        let seated = self.seats.occupancy();
        if !self.seats.is_full() {
            self.fresh_game_armed = false;
        }

        tracing::info!(
            %conn,
            freed = ?freed,
            seated,
            connections = self.connections.len(),
            "connection left table"
        );

        fanout::deliver(&self.connections, fanout::left::<O>(seated));

        Ok(freed)
    }

    fn handle_submit(&mut self, conn: ConnectionId, mv: O::Move) {
        let ruling = arbiter::submit_move(
            &mut self.table,
            &self.seats,
            self.config.solo_moves,
            conn,
            mv,
        );

        match ruling {
            Ruling::Ignored(reason) => {
                tracing::debug!(%conn, ?reason, "move ignored");
            }
            Ruling::Rejected { mover, mv, reason } => {
                fanout::deliver(
                    &self.connections,
                    fanout::move_rejected::<O>(mover, mv, reason),
                );
            }
            Ruling::Accepted(record) => {
                // Play has started; a late Ready must not wipe it.
                self.fresh_game_armed = false;
                fanout::deliver(&self.connections, fanout::move_accepted(&record));

                if record.terminal {
                    tracing::info!(
                        generation = self.table.generation(),
                        plies = record.number,
                        last_mover = %record.seat,
                        "game over"
                    );
                    self.schedule_reset();
                }
            }
        }
    }

    fn handle_ready(&mut self, conn: ConnectionId) {
        if self.seats.seat_of(conn) == Role::Spectator {
            tracing::debug!(%conn, "ready from spectator ignored");
            return;
        }
        if !self.fresh_game_armed {
            tracing::debug!(%conn, "ready ignored, no fresh game pending");
            return;
        }

        self.fresh_game_armed = false;
        self.reset_table();
    }

    fn handle_scheduled_reset(&mut self, generation: u64) {
        if generation != self.table.generation() {
            tracing::debug!(
                scheduled = generation,
                current = self.table.generation(),
                "superseded reset skipped"
            );
            return;
        }
        self.reset_table();
    }

    /// Starts a new generation at the initial position and tells everyone.
    fn reset_table(&mut self) {
        self.table.reset();
        self.resets += 1;
        tracing::info!(generation = self.table.generation(), "table reset");
        fanout::deliver(&self.connections, fanout::reset::<O>(self.table.position()));
    }

    /// Arms a one-shot timer that asks for a reset of the current
    /// generation once the configured delay has passed.
    fn schedule_reset(&self) {
        let generation = self.table.generation();
        let delay = self.config.reset_delay;
        let commands = self.commands.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(TableCommand::ScheduledReset { generation }).await;
            }
        });
    }

    fn info(&self) -> TableInfo {
        TableInfo {
            phase: self.table.phase(),
            generation: self.table.generation(),
            occupancy: self.seats.occupancy(),
            spectators: self.seats.spectator_count(),
            connections: self.connections.len(),
            plies: self.table.plies(),
            resets: self.resets,
        }
    }
}

/// Spawns a table actor on the current Tokio runtime and returns a handle
/// to it.
///
/// `config.channel_size` bounds the command queue; callers wait when it is
/// full.
pub fn spawn_table<O: MoveOracle>(config: TableConfig) -> TableHandle<O> {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = TableActor::<O> {
        config,
        table: Table::new(),
        seats: SeatRegistry::new(),
        connections: HashMap::new(),
        fresh_game_armed: false,
        resets: 0,
        receiver: rx,
        commands: tx.downgrade(),
    };

    tokio::spawn(actor.run());

    TableHandle { sender: tx }
}
