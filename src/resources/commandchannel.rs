//! Non-blocking TCP command channel.
//!
//! Clients connect to the configured host/port and send newline-terminated
//! messages such as `state:1`. The channel never blocks the frame loop: the
//! listener and every connection are registered with one [`mio::Poll`], and
//! [`CommandChannel::poll`] waits for readiness at most the given timeout.
//!
//! Framing
//! - One message per line; `\r\n` is accepted.
//! - Several messages in one read and messages split across reads both work.
//! - Bytes left without a newline when the peer closes are parsed as a final
//!   message, so `printf 'state:1' | nc localhost 8090` still works.
//!
//! Malformed messages are logged and dropped; the connection stays open.

use std::io::{self, Read};
use std::net::SocketAddr;
use std::time::Duration;

use bevy_ecs::prelude::Resource;
use log::{error, info, warn};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};

use crate::error::{PetError, PetResult};
use crate::events::petcommand::PetCommand;

/// Bytes read from a connection per poll.
const READ_BUFFER_SIZE: usize = 1024;
/// Unterminated bytes kept per connection before the buffer is discarded.
const MAX_PENDING_BYTES: usize = 1024;
const EVENTS_CAPACITY: usize = 128;
const LISTENER: Token = Token(0);

enum ReadOutcome {
    Idle,
    Data,
    Closed,
}

struct Connection {
    token: Token,
    peer: SocketAddr,
    stream: TcpStream,
    pending: Vec<u8>,
    /// Set by a readiness event, cleared once a read would block. Readiness
    /// is edge-triggered, so a connection that still has unread bytes keeps
    /// this set without a new event.
    readable: bool,
}

impl Connection {
    /// Perform exactly one read and parse any complete messages.
    fn read_once(&mut self, buf: &mut [u8], commands: &mut Vec<PetCommand>) -> PetResult<ReadOutcome> {
        match self.stream.read(buf) {
            Ok(0) => {
                let rest = std::mem::take(&mut self.pending);
                self.handle_message(&rest, commands);
                Ok(ReadOutcome::Closed)
            }
            Ok(n) => {
                self.pending.extend_from_slice(&buf[..n]);
                self.drain_lines(commands);
                Ok(ReadOutcome::Data)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.readable = false;
                Ok(ReadOutcome::Idle)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::Idle),
            Err(source) => Err(PetError::Connection {
                peer: self.peer,
                source,
            }),
        }
    }

    fn drain_lines(&mut self, commands: &mut Vec<PetCommand>) {
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_message(&line, commands);
        }
        if self.pending.len() > MAX_PENDING_BYTES {
            warn!(
                "{}: discarding {} bytes without a line break",
                self.peer,
                self.pending.len()
            );
            self.pending.clear();
        }
    }

    fn handle_message(&self, message: &[u8], commands: &mut Vec<PetCommand>) {
        if message.iter().all(u8::is_ascii_whitespace) {
            return;
        }
        match PetCommand::parse(message) {
            Ok(command) => commands.push(command),
            Err(e) => error!("{}: {}", self.peer, e),
        }
    }
}

/// Listening socket plus the connected clients, all registered with one poller.
#[derive(Resource)]
pub struct CommandChannel {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    connections: Vec<Connection>,
    next_token: usize,
}

impl CommandChannel {
    /// Start listening on `host:port`. Fails with [`PetError::NetworkBind`].
    pub fn bind(host: &str, port: u16) -> PetResult<Self> {
        let addr = format!("{host}:{port}");
        let bind_error = |source| PetError::NetworkBind {
            addr: addr.clone(),
            source,
        };
        // std resolves host names; mio only takes a socket address.
        let std_listener = std::net::TcpListener::bind(&addr).map_err(bind_error)?;
        std_listener.set_nonblocking(true).map_err(bind_error)?;
        let mut listener = TcpListener::from_std(std_listener);

        let poll = Poll::new().map_err(bind_error)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(bind_error)?;

        match listener.local_addr() {
            Ok(local) => info!("listening for commands on {}", local),
            Err(_) => info!("listening for commands on {}", addr),
        }
        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            listener,
            connections: Vec::new(),
            next_token: LISTENER.0 + 1,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Wait at most `timeout` for readiness, then accept new clients and do
    /// one read on every readable connection.
    ///
    /// Returns the commands parsed during this poll, possibly none.
    pub fn poll(&mut self, timeout: Duration) -> Vec<PetCommand> {
        let mut commands = Vec::new();

        // Unread bytes raise no new event, so do not wait when some are left.
        let timeout = if self.connections.iter().any(|c| c.readable) {
            Duration::ZERO
        } else {
            timeout
        };
        if let Err(e) = self.poll.poll(&mut self.events, Some(timeout)) {
            if e.kind() != io::ErrorKind::Interrupted {
                error!("waiting for network activity failed: {}", e);
            }
            return commands;
        }

        let mut listener_ready = false;
        for event in self.events.iter() {
            match event.token() {
                LISTENER => listener_ready = true,
                token => {
                    if let Some(conn) = self.connections.iter_mut().find(|c| c.token == token) {
                        conn.readable = true;
                    }
                }
            }
        }
        if listener_ready {
            self.accept_pending();
        }

        let registry = self.poll.registry();
        let mut buf = [0u8; READ_BUFFER_SIZE];
        self.connections.retain_mut(|conn| {
            if !conn.readable {
                return true;
            }
            let keep = match conn.read_once(&mut buf, &mut commands) {
                Ok(ReadOutcome::Idle | ReadOutcome::Data) => true,
                Ok(ReadOutcome::Closed) => {
                    info!("{} closed connection", conn.peer);
                    false
                }
                Err(e) => {
                    warn!("{}", e);
                    false
                }
            };
            if !keep && let Err(e) = registry.deregister(&mut conn.stream) {
                warn!("failed to deregister {}: {}", conn.peer, e);
            }
            keep
        });
        commands
    }

    /// Close every client connection.
    pub fn shutdown(&mut self) {
        let registry = self.poll.registry();
        for mut conn in self.connections.drain(..) {
            let _ = registry.deregister(&mut conn.stream);
            info!("closing connection from {}", conn.peer);
        }
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        warn!("dropping connection from {}: {}", peer, e);
                        continue;
                    }
                    info!("got connection from {}", peer);
                    // Bytes may have arrived before registration.
                    self.connections.push(Connection {
                        token,
                        peer,
                        stream,
                        pending: Vec::new(),
                        readable: true,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("accept failed: {}", e);
                    break;
                }
            }
        }
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
