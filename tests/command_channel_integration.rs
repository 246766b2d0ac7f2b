//! Command channel tests against real loopback sockets.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test command_channel_integration
//! ```

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use pngpet::error::PetError;
use pngpet::events::petcommand::PetCommand;
use pngpet::resources::commandchannel::CommandChannel;

const POLL: Duration = Duration::from_millis(10);
const MAX_POLLS: usize = 300;

fn channel() -> CommandChannel {
    CommandChannel::bind("127.0.0.1", 0).expect("bind loopback")
}

fn connect(channel: &CommandChannel) -> TcpStream {
    TcpStream::connect(channel.local_addr().unwrap()).expect("connect")
}

/// Poll until `done` holds, collecting every command seen on the way.
fn poll_until(
    channel: &mut CommandChannel,
    mut done: impl FnMut(&CommandChannel, &[PetCommand]) -> bool,
) -> Vec<PetCommand> {
    let mut commands = Vec::new();
    for _ in 0..MAX_POLLS {
        commands.extend(channel.poll(POLL));
        if done(channel, &commands) {
            return commands;
        }
    }
    panic!("condition not reached, commands so far: {commands:?}");
}

/// Poll a fixed number of times and return every command seen.
fn drain(channel: &mut CommandChannel, polls: usize) -> Vec<PetCommand> {
    (0..polls).flat_map(|_| channel.poll(POLL)).collect()
}

#[test]
fn parses_a_state_command() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(b"state:1\n").unwrap();

    let commands = poll_until(&mut channel, |_, cmds| !cmds.is_empty());
    assert_eq!(commands, vec![PetCommand::SetState(1)]);
    assert_eq!(channel.connection_count(), 1);
}

#[test]
fn malformed_input_is_dropped_and_connection_stays_open() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(b"foo:bar\n").unwrap();

    let mut seen = poll_until(&mut channel, |ch, _| ch.connection_count() == 1);
    seen.extend(drain(&mut channel, 10));
    assert!(seen.is_empty(), "{seen:?}");
    assert_eq!(channel.connection_count(), 1);

    // the same connection still delivers commands
    client.write_all(b"state:0\n").unwrap();
    let commands = poll_until(&mut channel, |_, cmds| !cmds.is_empty());
    assert_eq!(commands, vec![PetCommand::SetState(0)]);
}

#[test]
fn bad_index_is_dropped() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(b"state:one\nstate:-2\nstate:5\n").unwrap();

    let commands = poll_until(&mut channel, |_, cmds| !cmds.is_empty());
    assert_eq!(commands, vec![PetCommand::SetState(5)]);
}

#[test]
fn orderly_close_removes_the_connection() {
    let mut channel = channel();
    let client = connect(&channel);
    poll_until(&mut channel, |ch, _| ch.connection_count() == 1);

    drop(client);
    let commands = poll_until(&mut channel, |ch, _| ch.connection_count() == 0);
    assert!(commands.is_empty());
}

#[test]
fn several_commands_in_one_write() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(b"state:1\r\nstate:2\n").unwrap();

    let commands = poll_until(&mut channel, |_, cmds| cmds.len() >= 2);
    assert_eq!(
        commands,
        vec![PetCommand::SetState(1), PetCommand::SetState(2)]
    );
}

#[test]
fn command_split_across_writes() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(b"sta").unwrap();
    client.flush().unwrap();
    poll_until(&mut channel, |ch, _| ch.connection_count() == 1);
    assert!(drain(&mut channel, 5).is_empty());

    client.write_all(b"te:3\n").unwrap();
    let commands = poll_until(&mut channel, |_, cmds| !cmds.is_empty());
    assert_eq!(commands, vec![PetCommand::SetState(3)]);
}

#[test]
fn unterminated_message_is_parsed_on_close() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(b"state:4").unwrap();
    drop(client);

    let commands = poll_until(&mut channel, |ch, cmds| {
        !cmds.is_empty() && ch.connection_count() == 0
    });
    assert_eq!(commands, vec![PetCommand::SetState(4)]);
}

#[test]
fn overlong_garbage_does_not_block_later_commands() {
    let mut channel = channel();
    let mut client = connect(&channel);
    client.write_all(&[b'x'; 3000]).unwrap();
    client.write_all(b"\nstate:1\n").unwrap();

    let commands = poll_until(&mut channel, |_, cmds| !cmds.is_empty());
    assert_eq!(commands, vec![PetCommand::SetState(1)]);
    assert_eq!(channel.connection_count(), 1);
}

#[test]
fn serves_several_clients() {
    let mut channel = channel();
    let mut first = connect(&channel);
    let mut second = connect(&channel);
    first.write_all(b"state:1\n").unwrap();
    second.write_all(b"state:2\n").unwrap();

    let mut commands = poll_until(&mut channel, |_, cmds| cmds.len() >= 2);
    commands.sort_by_key(|PetCommand::SetState(i)| *i);
    assert_eq!(
        commands,
        vec![PetCommand::SetState(1), PetCommand::SetState(2)]
    );
    assert_eq!(channel.connection_count(), 2);
}

#[test]
fn poll_returns_after_timeout_when_idle() {
    let mut channel = channel();
    let start = Instant::now();
    let commands = channel.poll(Duration::from_millis(20));
    let elapsed = start.elapsed();
    assert!(commands.is_empty());
    assert!(elapsed >= Duration::from_millis(20), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
}

#[test]
fn poll_returns_early_on_activity() {
    let mut channel = channel();
    let addr = channel.local_addr().unwrap();
    let writer = thread::spawn(move || {
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"state:1\n").unwrap();
        client
    });
    let _client = writer.join().unwrap();

    let start = Instant::now();
    let commands = poll_until(&mut channel, |_, cmds| !cmds.is_empty());
    assert_eq!(commands, vec![PetCommand::SetState(1)]);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn long_poll_wakes_as_soon_as_data_arrives() {
    let mut channel = channel();
    let mut client = connect(&channel);
    poll_until(&mut channel, |ch, _| ch.connection_count() == 1);
    // leave the accepted connection with nothing buffered
    assert!(drain(&mut channel, 2).is_empty());

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        client.write_all(b"state:2\n").unwrap();
        client
    });
    let start = Instant::now();
    let commands = channel.poll(Duration::from_secs(5));
    let elapsed = start.elapsed();
    let _client = writer.join().unwrap();

    assert_eq!(commands, vec![PetCommand::SetState(2)]);
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
}

#[test]
fn bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let err = CommandChannel::bind("127.0.0.1", port).err().expect("port is taken");
    assert!(matches!(err, PetError::NetworkBind { .. }));
}

#[test]
fn shutdown_closes_clients() {
    let mut channel = channel();
    let _client = connect(&channel);
    poll_until(&mut channel, |ch, _| ch.connection_count() == 1);
    channel.shutdown();
    assert_eq!(channel.connection_count(), 0);
}
