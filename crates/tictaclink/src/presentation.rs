//! Presentation collaborator notified by the coordinator.

use crate::protocol::Outcome;
use tictaclink_game::{Board, Player};
use tracing::{info, warn};

/// Receives state changes; renders them however it likes.
pub trait Presentation {
    /// Two peers are connected and a fresh board is ready.
    fn on_game_started(&mut self);

    /// A cell was marked by `player`, locally or remotely.
    fn on_cell_marked(&mut self, row: usize, col: usize, player: Player);

    /// This side's half of a finished game.
    fn on_result(&mut self, outcome: Outcome);

    /// The game was restarted; the board is empty again.
    fn on_restarted(&mut self);

    /// The host refused to admit us.
    fn on_join_rejected(&mut self);

    /// The other peer went away; show any rejoin affordance.
    fn on_peer_left(&mut self);
}

/// Plain-text presentation for the terminal.
///
/// Keeps its own copy of the marks so it can redraw the board after
/// every change.
#[derive(Debug, Clone)]
pub struct ConsolePresentation {
    local: Player,
    board: Board,
}

impl ConsolePresentation {
    /// Creates a presentation for the local `player`.
    pub fn new(local: Player) -> Self {
        Self {
            local,
            board: Board::new(),
        }
    }

    /// Board as displayed.
    pub fn board(&self) -> &Board {
        &self.board
    }

    fn redraw(&self) {
        println!("\n{}\n", self.board);
    }
}

impl Presentation for ConsolePresentation {
    fn on_game_started(&mut self) {
        self.board.reset();
        info!(local = %self.local, "Game started");
        println!(
            "Game started. You are {} ({}). Host moves first.",
            self.local,
            self.local.mark()
        );
        self.redraw();
    }

    fn on_cell_marked(&mut self, row: usize, col: usize, player: Player) {
        if let Err(e) = self.board.set(row, col, player.mark()) {
            warn!(error = %e, "Display board out of step");
        }
        self.redraw();
    }

    fn on_result(&mut self, outcome: Outcome) {
        info!(%outcome, "Game over");
        println!("{outcome}. Type `restart` for another round or `leave`.");
    }

    fn on_restarted(&mut self) {
        self.board.reset();
        println!("Board cleared. Host moves first.");
        self.redraw();
    }

    fn on_join_rejected(&mut self) {
        println!("The host did not let us in.");
    }

    fn on_peer_left(&mut self) {
        self.board.reset();
        match self.local {
            Player::Host => println!("Your opponent left. Waiting for someone to join again."),
            Player::Client => println!("The host went away. Session over."),
        }
    }
}
