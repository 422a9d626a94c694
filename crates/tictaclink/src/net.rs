//! TCP transport and the process driver loop.
//!
//! Each connection gets a writer task draining its [`ChannelLink`] and a
//! reader task turning JSON lines into [`Inbound`] events. One driver
//! owns the coordinator and handles events and console commands one at a
//! time.

use crate::console::ConsoleCommand;
use crate::coordinator::{GameCoordinator, Phase};
use crate::presentation::Presentation;
use crate::protocol::{decode_line, encode_line, Message, PeerId};
use crate::transport::{ChannelLink, Inbound};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader,
};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Longest line accepted from a connection, newline excluded.
///
/// A peer that sends more without a newline is disconnected.
pub const MAX_LINE_BYTES: usize = 4096;

/// Sender side of a process's inbound event queue.
pub type EventSender = mpsc::UnboundedSender<Inbound<ChannelLink>>;

/// Receiver side of a process's inbound event queue.
pub type EventReceiver = mpsc::UnboundedReceiver<Inbound<ChannelLink>>;

/// Accepts connections forever, announcing each as [`Inbound::Connected`].
///
/// Returns once the event queue is gone.
#[instrument(skip_all)]
pub async fn accept_loop(listener: TcpListener, events: EventSender) {
    let mut next_id = 1;
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Accept failed");
                continue;
            }
        };

        let peer = PeerId::new(next_id);
        next_id += 1;
        info!(%peer, %addr, "Connection accepted");

        let (link, reader) = split(peer, stream);
        if events.send(Inbound::Connected { peer, link }).is_err() {
            return;
        }
        tokio::spawn(read_lines(peer, reader, events.clone()));
    }
}

/// Dials the host and starts the connection tasks.
///
/// Messages from the host arrive on `events` as [`PeerId::HOST`].
#[instrument(skip(events))]
pub async fn connect(address: &str, events: EventSender) -> std::io::Result<ChannelLink> {
    let stream = TcpStream::connect(address).await?;
    info!("Connected to host");
    let (link, reader) = split(PeerId::HOST, stream);
    tokio::spawn(read_lines(PeerId::HOST, reader, events));
    Ok(link)
}

fn split(peer: PeerId, stream: TcpStream) -> (ChannelLink, OwnedReadHalf) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!(%peer, error = %e, "Unable to disable buffering");
    }
    let (reader, writer) = stream.into_split();
    let (link, outbound) = ChannelLink::new();
    tokio::spawn(write_lines(peer, writer, outbound));
    (link, reader)
}

async fn write_lines(
    peer: PeerId,
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = outbound.recv().await {
        let line = match encode_line(&message) {
            Ok(line) => line,
            Err(e) => {
                warn!(%peer, error = %e, "Failed to encode message");
                continue;
            }
        };
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(%peer, error = %e, "Write failed, closing connection");
            break;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!(%peer, error = %e, "Shutdown after close");
    }
    debug!(%peer, "Writer finished");
}

#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    TooLong,
    Closed,
}

/// Reads one newline-terminated line, never buffering more than
/// [`MAX_LINE_BYTES`] plus the newline.
async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Frame> {
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(Frame::Closed);
    }
    if read > MAX_LINE_BYTES && !buf.ends_with(b"\n") {
        return Ok(Frame::TooLong);
    }
    String::from_utf8(buf)
        .map(Frame::Line)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

async fn read_lines<R: AsyncRead + Unpin>(peer: PeerId, reader: R, events: EventSender) {
    let mut reader = BufReader::new(reader);
    loop {
        match read_frame(&mut reader).await {
            Ok(Frame::Line(line)) if line.trim().is_empty() => {}
            Ok(Frame::Line(line)) => match decode_line(&line) {
                Ok(message) => {
                    if events.send(Inbound::Message { peer, message }).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(%peer, error = %e, "Malformed line skipped"),
            },
            Ok(Frame::TooLong) => {
                warn!(%peer, limit = MAX_LINE_BYTES, "Line too long, closing connection");
                break;
            }
            Ok(Frame::Closed) => break,
            Err(e) => {
                warn!(%peer, error = %e, "Read failed, closing connection");
                break;
            }
        }
    }
    debug!(%peer, "Connection closed by peer");
    if events.send(Inbound::Disconnected { peer }).is_err() {
        debug!(%peer, "Event queue already closed");
    }
}

/// Runs the session until it returns to [`Phase::Idle`] or input ends.
///
/// Refused events and commands are logged and reported; the loop carries
/// on.
#[instrument(skip_all)]
pub async fn drive<P: Presentation>(
    coordinator: &mut GameCoordinator<P, ChannelLink>,
    mut events: EventReceiver,
    mut commands: mpsc::UnboundedReceiver<ConsoleCommand>,
) {
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Err(e) = coordinator.dispatch(event) {
                    warn!(error = %e, "Inbound event refused");
                }
            }
            command = commands.recv() => {
                match command {
                    Some(ConsoleCommand::Leave) | None => {
                        coordinator.leave();
                        break;
                    }
                    Some(command) => run_command(coordinator, command),
                }
            }
            else => break,
        }

        if coordinator.phase() == Phase::Idle {
            info!("Session over");
            break;
        }
    }
}

fn run_command<P: Presentation>(
    coordinator: &mut GameCoordinator<P, ChannelLink>,
    command: ConsoleCommand,
) {
    debug!(%command, "Console command");
    let outcome = match command {
        ConsoleCommand::Move { row, col } => coordinator.request_move(row, col),
        ConsoleCommand::Restart => coordinator.request_restart(),
        ConsoleCommand::Board => {
            match coordinator.board() {
                Some(board) => println!("\n{board}\n"),
                None => println!("No game yet ({}).", coordinator.phase()),
            }
            Ok(())
        }
        ConsoleCommand::Leave => {
            coordinator.leave();
            Ok(())
        }
    };
    if let Err(e) = outcome {
        println!("{e}");
    }
}
