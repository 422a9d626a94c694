//! Tests for the session coordinator, host and client wired back to back.

use tictaclink::{
    ChannelLink, CoordinatorError, GameCoordinator, Inbound, Message, MessageKind, Outcome, PeerId,
    Phase, Presentation, TransportError,
};
use tictaclink_game::{DiagonalPolicy, GameResult, Mark, Player};
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shown {
    Started,
    Marked(usize, usize, Player),
    Result(Outcome),
    Restarted,
    Rejected,
    PeerLeft,
}

/// Presentation that remembers every callback.
#[derive(Debug, Default)]
struct Recorder {
    shown: Vec<Shown>,
}

impl Recorder {
    fn results(&self) -> Vec<Outcome> {
        self.shown
            .iter()
            .filter_map(|shown| match shown {
                Shown::Result(outcome) => Some(*outcome),
                _ => None,
            })
            .collect()
    }
}

impl Presentation for Recorder {
    fn on_game_started(&mut self) {
        self.shown.push(Shown::Started);
    }

    fn on_cell_marked(&mut self, row: usize, col: usize, player: Player) {
        self.shown.push(Shown::Marked(row, col, player));
    }

    fn on_result(&mut self, outcome: Outcome) {
        self.shown.push(Shown::Result(outcome));
    }

    fn on_restarted(&mut self) {
        self.shown.push(Shown::Restarted);
    }

    fn on_join_rejected(&mut self) {
        self.shown.push(Shown::Rejected);
    }

    fn on_peer_left(&mut self) {
        self.shown.push(Shown::PeerLeft);
    }
}

type Coordinator = GameCoordinator<Recorder, ChannelLink>;

const CLIENT: PeerId = PeerId::new(1);

/// Host and client with their outbound queues, pumped by hand.
struct Session {
    host: Coordinator,
    client: Coordinator,
    to_client: UnboundedReceiver<Message>,
    to_host: UnboundedReceiver<Message>,
}

impl Session {
    /// Host listening behind `host_secret`, client's join request in flight.
    fn connect(host_secret: &str, client_secret: &str) -> Self {
        let mut host = Coordinator::new(Recorder::default(), DiagonalPolicy::Always);
        host.start_host(host_secret).unwrap();
        let (host_link, to_client) = ChannelLink::new();
        host.dispatch(Inbound::Connected {
            peer: CLIENT,
            link: host_link,
        })
        .unwrap();

        let mut client = Coordinator::new(Recorder::default(), DiagonalPolicy::Always);
        let (client_link, to_host) = ChannelLink::new();
        client.start_client(client_secret, client_link).unwrap();

        Self {
            host,
            client,
            to_client,
            to_host,
        }
    }

    /// Session with the game already started on both sides.
    fn joined() -> Self {
        let mut session = Self::connect("abc123", "abc123");
        session.deliver_to_host().unwrap();
        session.deliver_to_client().unwrap();
        session
    }

    fn deliver_to_host(&mut self) -> Result<(), CoordinatorError> {
        let message = self.to_host.try_recv().expect("Client sent a message");
        self.host.dispatch(Inbound::Message {
            peer: CLIENT,
            message,
        })
    }

    fn deliver_to_client(&mut self) -> Result<(), CoordinatorError> {
        let message = self.to_client.try_recv().expect("Host sent a message");
        self.client.dispatch(Inbound::Message {
            peer: PeerId::HOST,
            message,
        })
    }

    /// Delivers everything in flight, both ways, until both queues are quiet.
    fn flush(&mut self) {
        loop {
            let mut delivered = false;
            while let Ok(message) = self.to_host.try_recv() {
                self.host
                    .dispatch(Inbound::Message {
                        peer: CLIENT,
                        message,
                    })
                    .expect("Host accepts message");
                delivered = true;
            }
            while let Ok(message) = self.to_client.try_recv() {
                self.client
                    .dispatch(Inbound::Message {
                        peer: PeerId::HOST,
                        message,
                    })
                    .expect("Client accepts message");
                delivered = true;
            }
            if !delivered {
                break;
            }
        }
    }

    fn host_plays(&mut self, row: usize, col: usize) {
        self.host.request_move(row, col).expect("Host move accepted");
        self.flush();
    }

    fn client_plays(&mut self, row: usize, col: usize) {
        self.client.request_move(row, col).expect("Client move accepted");
        self.flush();
    }
}

fn cell(coordinator: &Coordinator, row: usize, col: usize) -> Mark {
    coordinator.board().expect("Game exists").get(row, col).unwrap()
}

#[test]
fn test_matching_secret_starts_game() {
    let session = Session::joined();

    assert_eq!(session.host.phase(), Phase::InProgress);
    assert_eq!(session.client.phase(), Phase::InProgress);
    assert_eq!(session.host.peer_count(), 2);
    assert_eq!(session.client.peer_count(), 2);
    assert_eq!(session.host.current_turn(), Some(Player::Host));
    assert_eq!(session.client.current_turn(), Some(Player::Host));
    assert_eq!(session.host.presentation().shown, vec![Shown::Started]);
    assert_eq!(session.client.presentation().shown, vec![Shown::Started]);
}

#[test]
fn test_wrong_secret_is_rejected() {
    for wrong in ["wrong", "ABC123", "abc123 "] {
        let mut session = Session::connect("abc123", wrong);

        assert_eq!(session.deliver_to_host(), Err(CoordinatorError::JoinRejected));
        assert_eq!(session.host.phase(), Phase::WaitingForPeer);
        assert_eq!(session.host.peer_count(), 1);
        assert!(session.host.board().is_none());

        assert_eq!(session.deliver_to_client(), Err(CoordinatorError::JoinRejected));
        assert_eq!(session.client.phase(), Phase::Idle);
        assert_eq!(session.client.presentation().shown, vec![Shown::Rejected]);
    }
}

#[test]
fn test_end_to_end_turn_flow() {
    let mut session = Session::joined();

    session.host.request_move(1, 1).unwrap();
    assert_eq!(cell(&session.host, 1, 1), Player::Host.mark());

    // MoveApplied arrives; TurnSync is still in flight.
    session.deliver_to_client().unwrap();
    assert_eq!(cell(&session.client, 1, 1), Player::Host.mark());
    assert_eq!(
        session.client.presentation().shown.last(),
        Some(&Shown::Marked(1, 1, Player::Host))
    );

    assert_eq!(
        session.client.request_move(1, 1),
        Err(CoordinatorError::CellOccupied { row: 1, col: 1 })
    );
    assert_eq!(
        session.client.request_move(0, 0),
        Err(CoordinatorError::NotYourTurn(Player::Client))
    );
    assert!(session.to_host.try_recv().is_err());

    session.deliver_to_client().unwrap();
    assert_eq!(session.client.current_turn(), Some(Player::Client));

    session.client.request_move(0, 0).unwrap();
    assert!(session.client.is_awaiting_turn());
    session.deliver_to_host().unwrap();
    assert_eq!(cell(&session.host, 0, 0), Player::Client.mark());
    assert_eq!(session.host.current_turn(), Some(Player::Host));

    session.deliver_to_client().unwrap();
    assert_eq!(session.client.current_turn(), Some(Player::Host));
    assert!(!session.client.is_awaiting_turn());
}

#[test]
fn test_out_of_turn_move_changes_nothing() {
    let mut session = Session::joined();
    session.host.request_move(0, 0).unwrap();
    let board_before = session.host.board().cloned();

    assert_eq!(
        session.host.request_move(1, 1),
        Err(CoordinatorError::NotYourTurn(Player::Host))
    );
    assert_eq!(session.host.board().cloned(), board_before);
    assert_eq!(session.host.current_turn(), Some(Player::Client));

    assert_eq!(
        session.to_client.try_recv().unwrap(),
        Message::MoveApplied { row: 0, col: 0 }
    );
    assert_eq!(
        session.to_client.try_recv().unwrap(),
        Message::TurnSync {
            turn: Player::Client
        }
    );
    assert!(session.to_client.try_recv().is_err());
}

#[test]
fn test_client_waits_for_turn_sync_after_moving() {
    let mut session = Session::joined();
    session.host_plays(0, 0);

    session.client.request_move(1, 1).unwrap();
    assert_eq!(
        session.client.request_move(2, 2),
        Err(CoordinatorError::NotYourTurn(Player::Client))
    );
    assert_eq!(cell(&session.client, 2, 2), Mark::Empty);
}

#[test]
fn test_host_win_shows_both_halves() {
    let mut session = Session::joined();
    session.host_plays(0, 0);
    session.client_plays(1, 0);
    session.host_plays(0, 1);
    session.client_plays(1, 1);
    session.host_plays(0, 2);

    assert_eq!(session.host.phase(), Phase::Finished);
    assert_eq!(session.client.phase(), Phase::Finished);
    assert_eq!(session.host.result(), Some(GameResult::Win(Player::Host)));
    assert_eq!(session.client.result(), Some(GameResult::Win(Player::Host)));
    assert_eq!(session.host.presentation().results(), vec![Outcome::YouWon]);
    assert_eq!(session.client.presentation().results(), vec![Outcome::YouLose]);
}

#[test]
fn test_client_win_shows_both_halves() {
    let mut session = Session::joined();
    session.host_plays(0, 0);
    session.client_plays(1, 0);
    session.host_plays(2, 2);
    session.client_plays(1, 1);
    session.host_plays(0, 2);
    session.client_plays(1, 2);

    assert_eq!(session.client.result(), Some(GameResult::Win(Player::Client)));
    assert_eq!(session.client.presentation().results(), vec![Outcome::YouWon]);
    assert_eq!(session.host.presentation().results(), vec![Outcome::YouLose]);
}

#[test]
fn test_draw_shows_draw_on_both_sides() {
    let mut session = Session::joined();
    let cells = [(0, 0), (1, 1), (0, 2), (0, 1), (2, 1), (1, 0), (1, 2), (2, 2), (2, 0)];
    for (i, &(row, col)) in cells.iter().enumerate() {
        if i % 2 == 0 {
            session.host_plays(row, col);
        } else {
            session.client_plays(row, col);
        }
    }

    assert_eq!(session.host.result(), Some(GameResult::Draw));
    assert_eq!(session.host.presentation().results(), vec![Outcome::Draw]);
    assert_eq!(session.client.presentation().results(), vec![Outcome::Draw]);
}

#[test]
fn test_move_after_finish_is_refused() {
    let mut session = Session::joined();
    session.host_plays(0, 0);
    session.client_plays(1, 0);
    session.host_plays(0, 1);
    session.client_plays(1, 1);
    session.host_plays(0, 2);

    assert_eq!(
        session.client.request_move(2, 2),
        Err(CoordinatorError::NotInProgress(Phase::Finished))
    );
}

#[test]
fn test_client_restart_after_win() {
    let mut session = Session::joined();
    session.host_plays(0, 0);
    session.client_plays(1, 0);
    session.host_plays(0, 1);
    session.client_plays(1, 1);
    session.host_plays(0, 2);

    session.client.request_restart().unwrap();
    session.flush();

    for side in [&session.host, &session.client] {
        assert_eq!(side.phase(), Phase::InProgress);
        assert_eq!(side.board().expect("Game exists").filled(), 0);
        assert_eq!(side.current_turn(), Some(Player::Host));
        assert_eq!(side.result(), Some(GameResult::Ongoing));
        assert_eq!(side.presentation().shown.last(), Some(&Shown::Restarted));
    }

    session.host_plays(2, 2);
    assert_eq!(cell(&session.client, 2, 2), Player::Host.mark());
}

#[test]
fn test_host_restart_mid_game() {
    let mut session = Session::joined();
    session.host_plays(0, 0);
    session.client_plays(2, 2);

    session.host.request_restart().unwrap();
    session.flush();

    assert_eq!(session.host.board().unwrap().filled(), 0);
    assert_eq!(session.client.board().unwrap().filled(), 0);
    assert_eq!(session.client.current_turn(), Some(Player::Host));
    assert_eq!(
        session.client.request_move(1, 1),
        Err(CoordinatorError::NotYourTurn(Player::Client))
    );
}

#[test]
fn test_peer_left_resets_both_sides() {
    let mut session = Session::joined();
    session.host_plays(1, 1);

    session.host.dispatch(Inbound::Disconnected { peer: CLIENT }).unwrap();
    assert_eq!(session.host.phase(), Phase::WaitingForPeer);
    assert_eq!(session.host.peer_count(), 1);
    assert!(session.host.board().is_none());
    assert!(session.host.gate().is_armed());
    assert_eq!(session.host.presentation().shown.last(), Some(&Shown::PeerLeft));

    session
        .client
        .dispatch(Inbound::Disconnected { peer: PeerId::HOST })
        .unwrap();
    assert_eq!(session.client.phase(), Phase::Idle);
    assert_eq!(session.client.presentation().shown.last(), Some(&Shown::PeerLeft));
}

#[test]
fn test_host_accepts_new_peer_after_one_left() {
    let mut session = Session::joined();
    session.host.dispatch(Inbound::Disconnected { peer: CLIENT }).unwrap();

    let newcomer = PeerId::new(2);
    let (link, mut outbound) = ChannelLink::new();
    session
        .host
        .dispatch(Inbound::Connected {
            peer: newcomer,
            link,
        })
        .unwrap();
    session
        .host
        .dispatch(Inbound::Message {
            peer: newcomer,
            message: Message::JoinRequest {
                secret: "abc123".into(),
            },
        })
        .unwrap();

    assert_eq!(session.host.phase(), Phase::InProgress);
    assert_eq!(session.host.peer(), Some(newcomer));
    assert_eq!(outbound.try_recv().unwrap(), Message::GameStarted);
}

#[test]
fn test_third_connection_is_turned_away() {
    let mut session = Session::joined();

    let third = PeerId::new(2);
    let (link, mut outbound) = ChannelLink::new();
    session
        .host
        .dispatch(Inbound::Connected { peer: third, link })
        .unwrap();
    let joined = session.host.dispatch(Inbound::Message {
        peer: third,
        message: Message::JoinRequest {
            secret: "abc123".into(),
        },
    });

    assert_eq!(joined, Err(CoordinatorError::JoinRejected));
    assert_eq!(outbound.try_recv().unwrap(), Message::JoinRejected);
    assert_eq!(session.host.phase(), Phase::InProgress);
    assert_eq!(session.host.peer(), Some(CLIENT));
    assert_eq!(session.host.peer_count(), 2);
}

#[test]
fn test_leave_does_not_notify_locally() {
    let mut session = Session::joined();
    session.host.leave();

    assert_eq!(session.host.phase(), Phase::Idle);
    assert!(!session.host.gate().is_armed());
    assert_eq!(session.host.role(), None);
    assert!(
        !session
            .host
            .presentation()
            .shown
            .contains(&Shown::PeerLeft)
    );
    assert!(session.to_client.try_recv().is_err());
}

#[test]
fn test_message_for_the_other_role_is_refused() {
    let mut session = Session::joined();
    let refused = session.host.dispatch(Inbound::Message {
        peer: CLIENT,
        message: Message::TurnSync {
            turn: Player::Client,
        },
    });

    assert_eq!(
        refused,
        Err(CoordinatorError::UnexpectedMessage {
            kind: MessageKind::TurnSync,
            role: Some(Player::Host),
        })
    );
    assert_eq!(session.host.current_turn(), Some(Player::Host));
}

#[test]
fn test_message_from_unknown_peer_is_refused() {
    let mut session = Session::joined();
    let stranger = PeerId::new(9);
    let refused = session.host.dispatch(Inbound::Message {
        peer: stranger,
        message: Message::MoveApplied { row: 0, col: 0 },
    });

    assert_eq!(refused, Err(CoordinatorError::UnknownPeer(stranger)));
    assert_eq!(cell(&session.host, 0, 0), Mark::Empty);
}

#[cfg(debug_assertions)]
#[test]
fn test_stale_move_after_host_restart_leaves_board_clean() {
    let mut session = Session::joined();
    session.host_plays(0, 0);

    // Client moves while the host restarts; the two cross on the wire.
    session.client.request_move(2, 2).unwrap();
    session.host.request_restart().unwrap();

    assert!(matches!(
        session.deliver_to_host(),
        Err(CoordinatorError::Invariant(_))
    ));
    assert_eq!(cell(&session.host, 2, 2), Mark::Empty);
    assert_eq!(session.host.board().unwrap().filled(), 0);
    assert!(session.host.game().unwrap().history().is_empty());

    session.flush();
    session.host_plays(1, 1);
    assert_eq!(cell(&session.host, 1, 1), Player::Host.mark());
    assert_eq!(session.host.board(), session.client.board());
    assert_eq!(session.client.current_turn(), Some(Player::Client));
}

#[test]
fn test_failed_send_drops_the_peer() {
    let mut session = Session::joined();
    let Session { host, to_client, .. } = &mut session;
    to_client.close();

    assert_eq!(
        host.request_move(0, 0),
        Err(CoordinatorError::Transport(TransportError::Closed))
    );
    assert_eq!(host.phase(), Phase::WaitingForPeer);
    assert_eq!(host.peer(), None);
    assert_eq!(host.peer_count(), 1);
    assert!(host.board().is_none());
    assert!(host.gate().is_armed());
    assert_eq!(host.presentation().shown.last(), Some(&Shown::PeerLeft));
}
