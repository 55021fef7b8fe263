//! Broadcast fan-out: turns table events into addressed outbound messages
//! and delivers them.
//!
//! Planning (which messages, to whom, in what order) is kept apart from
//! delivery so the ordering guarantees can be tested without any channels.

use std::collections::HashMap;

use gambit_protocol::{Outbound, Recipient, Role, SoundCue};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::{MoveOracle, MoveRecord};

/// An outbound message with the table's oracle types filled in.
pub type TableOutbound<O> = Outbound<
    <O as MoveOracle>::Position,
    <O as MoveOracle>::Move,
    <O as MoveOracle>::Annotation,
>;

/// Channel feeding one connection's writer.
pub type ConnectionSender<O> = mpsc::UnboundedSender<TableOutbound<O>>;

/// One addressed message.
pub type Delivery<O> = (Recipient, TableOutbound<O>);

/// Messages for an accepted move, in the order clients rely on:
///
/// 1. sound cue (capture or quiet move) → everyone
/// 2. move-list line → everyone
/// 3. raw move → everyone but the mover, who already applied it locally
/// 4. resulting position → everyone; the resynchronization point
/// 5. on a terminal move: game-over sound, then the game-over notice
pub fn move_accepted<O: MoveOracle>(record: &MoveRecord<O>) -> Vec<Delivery<O>> {
    let cue = if record.captured {
        SoundCue::Capture
    } else {
        SoundCue::Move
    };

    let mut out = vec![
        (Recipient::All, Outbound::Sound { cue }),
        (
            Recipient::All,
            Outbound::MoveListEntry {
                number: record.number,
                seat: record.seat,
                mv: record.mv.clone(),
                annotation: record.annotation.clone(),
            },
        ),
        (
            Recipient::AllExcept(record.mover),
            Outbound::MoveMade {
                mv: record.mv.clone(),
            },
        ),
        (
            Recipient::All,
            Outbound::Position {
                position: record.position.clone(),
            },
        ),
    ];

    if record.terminal {
        out.push((
            Recipient::All,
            Outbound::Sound {
                cue: SoundCue::GameOver,
            },
        ));
        out.push((Recipient::All, Outbound::GameOver));
    }

    out
}

/// A refused move is reported to its author only.
pub fn move_rejected<O: MoveOracle>(
    mover: ConnectionId,
    mv: O::Move,
    reason: String,
) -> Vec<Delivery<O>> {
    vec![(
        Recipient::Connection(mover),
        Outbound::MoveRejected { mv, reason },
    )]
}

/// Greeting for a new connection: its role, the new occupancy for
/// everyone, then the live position for the newcomer alone.
pub fn joined<O: MoveOracle>(
    conn: ConnectionId,
    role: Role,
    seated: usize,
    position: &O::Position,
) -> Vec<Delivery<O>> {
    vec![
        (Recipient::Connection(conn), Outbound::RoleAssigned { role }),
        (Recipient::All, Outbound::Occupancy { seated }),
        (
            Recipient::Connection(conn),
            Outbound::Position {
                position: position.clone(),
            },
        ),
    ]
}

/// Occupancy update after someone left.
pub fn left<O: MoveOracle>(seated: usize) -> Vec<Delivery<O>> {
    vec![(Recipient::All, Outbound::Occupancy { seated })]
}

/// The fresh position after a reset, for everyone.
pub fn reset<O: MoveOracle>(position: &O::Position) -> Vec<Delivery<O>> {
    vec![(
        Recipient::All,
        Outbound::Position {
            position: position.clone(),
        },
    )]
}

/// Delivers planned messages to the live connections.
///
/// Each connection sees its messages in plan order. A connection whose
/// receiver is gone is skipped; its disconnect is already on its way.
pub fn deliver<T: Clone>(
    connections: &HashMap<ConnectionId, mpsc::UnboundedSender<T>>,
    deliveries: Vec<(Recipient, T)>,
) {
    for (recipient, msg) in deliveries {
        match recipient {
            Recipient::Connection(conn) => {
                if let Some(sender) = connections.get(&conn) {
                    let _ = sender.send(msg);
                }
            }
            Recipient::All | Recipient::AllExcept(_) => {
                for (conn, sender) in connections {
                    if recipient.includes(*conn) {
                        let _ = sender.send(msg.clone());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gambit_protocol::Seat;

    use super::*;
    use crate::{Evaluation, OracleError};

    /// Oracle whose positions are move strings joined by spaces.
    struct Log;

    impl MoveOracle for Log {
        type Position = String;
        type Move = String;
        type Annotation = String;

        fn initial_position() -> String {
            String::new()
        }

        fn turn(position: &String) -> Seat {
            if position.split_whitespace().count() % 2 == 0 {
                Seat::First
            } else {
                Seat::Second
            }
        }

        fn evaluate(
            position: &String,
            mv: &String,
        ) -> Result<Evaluation<String, String>, OracleError> {
            Ok(Evaluation {
                position: format!("{position} {mv}").trim().to_string(),
                captured: mv.contains('x'),
                terminal: mv.ends_with('#'),
                annotation: mv.to_uppercase(),
            })
        }
    }

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn record(mv: &str, captured: bool, terminal: bool) -> MoveRecord<Log> {
        MoveRecord {
            mover: cid(1),
            seat: Seat::First,
            number: 1,
            mv: mv.to_string(),
            position: mv.to_string(),
            annotation: mv.to_uppercase(),
            captured,
            terminal,
        }
    }

    #[test]
    fn test_move_accepted_quiet_move_order() {
        let plan = move_accepted(&record("e4", false, false));

        assert_eq!(plan.len(), 4);
        assert_eq!(
            plan[0],
            (Recipient::All, Outbound::Sound { cue: SoundCue::Move })
        );
        assert!(matches!(
            &plan[1],
            (Recipient::All, Outbound::MoveListEntry { number: 1, annotation, .. })
                if annotation == "E4"
        ));
        assert_eq!(
            plan[2],
            (Recipient::AllExcept(cid(1)), Outbound::MoveMade { mv: "e4".into() })
        );
        assert_eq!(
            plan[3],
            (Recipient::All, Outbound::Position { position: "e4".into() })
        );
    }

    #[test]
    fn test_move_accepted_capture_uses_capture_cue() {
        let plan = move_accepted(&record("exd5", true, false));
        assert_eq!(
            plan[0],
            (Recipient::All, Outbound::Sound { cue: SoundCue::Capture })
        );
    }

    #[test]
    fn test_move_accepted_terminal_appends_game_over_after_position() {
        let plan = move_accepted(&record("Qh7#", false, true));

        assert_eq!(plan.len(), 6);
        assert!(matches!(plan[3].1, Outbound::Position { .. }));
        assert_eq!(
            plan[4],
            (Recipient::All, Outbound::Sound { cue: SoundCue::GameOver })
        );
        assert_eq!(plan[5], (Recipient::All, Outbound::GameOver));
    }

    #[test]
    fn test_move_rejected_goes_to_mover_only() {
        let plan = move_rejected::<Log>(cid(4), "e5".into(), "illegal".into());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].0, Recipient::Connection(cid(4)));
    }

    #[test]
    fn test_joined_order_role_occupancy_position() {
        let plan = joined::<Log>(cid(2), Role::Seated(Seat::Second), 2, &"e4".to_string());

        assert_eq!(
            plan[0],
            (
                Recipient::Connection(cid(2)),
                Outbound::RoleAssigned { role: Role::Seated(Seat::Second) }
            )
        );
        assert_eq!(plan[1], (Recipient::All, Outbound::Occupancy { seated: 2 }));
        assert_eq!(
            plan[2],
            (Recipient::Connection(cid(2)), Outbound::Position { position: "e4".into() })
        );
    }

    #[test]
    fn test_deliver_respects_recipients_and_order() {
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let mut connections = HashMap::new();
        connections.insert(cid(1), tx1);
        connections.insert(cid(2), tx2);

        deliver(&connections, move_accepted(&record("e4", false, false)));

        // Mover: sound, list entry, position.
        let mover: Vec<_> = std::iter::from_fn(|| rx1.try_recv().ok()).collect();
        assert_eq!(mover.len(), 3);
        assert!(matches!(mover[0], Outbound::Sound { .. }));
        assert!(matches!(mover[1], Outbound::MoveListEntry { .. }));
        assert!(matches!(mover[2], Outbound::Position { .. }));

        // Observer: sound, list entry, raw move, position.
        let other: Vec<_> = std::iter::from_fn(|| rx2.try_recv().ok()).collect();
        assert_eq!(other.len(), 4);
        assert!(matches!(other[2], Outbound::MoveMade { .. }));
        assert!(matches!(other[3], Outbound::Position { .. }));
    }

    #[test]
    fn test_deliver_skips_closed_and_unknown_connections() {
        let (tx1, rx1) = mpsc::unbounded_channel::<TableOutbound<Log>>();
        drop(rx1);
        let mut connections = HashMap::new();
        connections.insert(cid(1), tx1);

        // Neither a closed receiver nor an unknown target may panic.
        deliver(&connections, reset::<Log>(&String::new()));
        deliver(
            &connections,
            move_rejected::<Log>(cid(9), "x".into(), "nope".into()),
        );
    }

    #[test]
    fn test_replaying_broadcast_moves_reproduces_the_snapshot() {
        // A client replica that applies every MoveListEntry to its own copy
        // of the position must land on the broadcast snapshot.
        let mut authoritative = Log::initial_position();
        let mut replica = Log::initial_position();

        for (i, mv) in ["e4", "e5", "Nf3", "Nc6"].iter().enumerate() {
            let eval = Log::evaluate(&authoritative, &mv.to_string()).unwrap();
            authoritative = eval.position.clone();
            let rec = MoveRecord::<Log> {
                mover: cid(1 + (i as u64 % 2)),
                seat: Log::turn(&authoritative).other(),
                number: i as u32 + 1,
                mv: mv.to_string(),
                position: eval.position,
                annotation: eval.annotation,
                captured: eval.captured,
                terminal: eval.terminal,
            };

            let mut snapshot = None;
            for (_, msg) in move_accepted(&rec) {
                match msg {
                    Outbound::MoveListEntry { mv, .. } => {
                        replica = Log::evaluate(&replica, &mv).unwrap().position;
                    }
                    Outbound::Position { position } => snapshot = Some(position),
                    _ => {}
                }
            }
            assert_eq!(snapshot.as_deref(), Some(replica.as_str()));
        }
    }
}
