//=========================================================================
// Message Inbox
//=========================================================================
//
// Cross-thread entry point into the bus.
//
// Architecture:
// ```text
//   Any thread:                         Frame thread:
//   MessagePoster::post() ──bounded──►  Inbox::drain()
//                          channel        └─► MessageBus::queue_message()
// ```
//
// Posted messages join the bus at the start of the next dispatch and go
// through the normal queueing rules. Listeners and states are never
// touched off the frame thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

//=== Internal Dependencies ===============================================

use super::Message;

//=== PostError ===========================================================

/// Why a message could not be posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostError {
    /// The inbox is at capacity; the frame thread has fallen behind.
    Full,

    /// The bus that owned the inbox has been dropped.
    Disconnected,
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "message inbox is full"),
            Self::Disconnected => write!(f, "message bus has shut down"),
        }
    }
}

impl std::error::Error for PostError {}

//=== MessagePoster =======================================================

/// Cloneable, `Send` handle for posting messages from any thread.
#[derive(Debug, Clone)]
pub struct MessagePoster {
    sender: Sender<Message>,
}

impl MessagePoster {
    /// Posts without blocking.
    pub fn post(&self, msg: Message) -> Result<(), PostError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => PostError::Full,
            TrySendError::Disconnected(_) => PostError::Disconnected,
        })
    }
}

//=== Inbox ===============================================================

#[derive(Debug)]
pub(super) struct Inbox {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    pub fn poster(&self) -> MessagePoster {
        MessagePoster {
            sender: self.sender.clone(),
        }
    }

    /// Takes everything posted so far without blocking.
    pub fn drain(&self) -> Vec<Message> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

//=========================================================================
// Tests
//=========================================================================
