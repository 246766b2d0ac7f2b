//! Commands sent by network clients.
//!
//! The command channel parses inbound lines into [`PetCommand`] messages;
//! the playlist systems consume them in the same frame.

use bevy_ecs::message::Message;

use crate::error::{PetError, PetResult};

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetCommand {
    /// Make the state at this playlist index the next one to play.
    SetState(usize),
}

impl PetCommand {
    /// Parse one `keyword:body` message, e.g. `state:1`.
    ///
    /// Surrounding whitespace is ignored. Unknown keywords and non-integer
    /// bodies are [`PetError::Protocol`] errors.
    pub fn parse(message: &[u8]) -> PetResult<Self> {
        let text = std::str::from_utf8(message)
            .map_err(|_| PetError::protocol("message is not valid UTF-8"))?
            .trim();
        let (cmd, body) = text
            .split_once(':')
            .ok_or_else(|| PetError::protocol(format!("missing ':' in {text:?}")))?;
        match cmd.trim() {
            "state" => {
                let body = body.trim();
                body.parse::<usize>()
                    .map(PetCommand::SetState)
                    .map_err(|e| PetError::protocol(format!("bad state index {body:?}: {e}")))
            }
            other => Err(PetError::protocol(format!("unknown command {other:?}"))),
        }
    }
}
