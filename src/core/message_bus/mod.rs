//=========================================================================
// Message Bus
//=========================================================================
//
// Typed publish/subscribe with immediate and deferred delivery.
//
// Components:
// - `message`:       immutable timestamped Message + MessageType
// - `listener`:      Listener contract and type/wildcard registry
// - `message_queue`: double-buffered FIFO used for deferred delivery
// - `inbox`:         cross-thread MessagePoster feeding the bus
// - `message_bus`:   MessageBus tying the pieces together
//
//=========================================================================

//=== Module Declarations =================================================

mod inbox;
mod listener;
mod message;
mod message_bus;
mod message_queue;

//=== Public API ==========================================================

pub use inbox::{MessagePoster, PostError};
pub use listener::{Listener, ListenerRef};
pub use message::{Message, MessageType};
pub use message_bus::{MessageBus, QueueStatus, TriggerStatus, DEFAULT_INBOX_CAPACITY};
