//=========================================================================
// Message
//=========================================================================
//
// Immutable, timestamped, typed event value carried by the bus.
//
// A message is fixed at construction. Cloning shares the payload, so the
// queue and every listener see the same data without copying it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::sync::Arc;

//=== MessageType =========================================================

/// Opcode-like identifier that listeners subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(pub u32);

impl From<u32> for MessageType {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//=== Message =============================================================

/// A typed, timestamped event.
///
/// The optional payload is read back by concrete type:
///
/// ```
/// use frame_driver::core::message_bus::Message;
///
/// struct Damage(u32);
///
/// let msg = Message::with_payload(3, 1.5, Damage(40));
/// assert_eq!(msg.kind().0, 3);
/// assert_eq!(msg.payload::<Damage>().map(|d| d.0), Some(40));
/// assert!(msg.payload::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Message {
    kind: MessageType,
    timestamp: f64,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Message {
    /// Creates a message without payload.
    pub fn new(kind: impl Into<MessageType>, timestamp: f64) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            payload: None,
        }
    }

    /// Creates a message carrying `payload`.
    pub fn with_payload<T>(kind: impl Into<MessageType>, timestamp: f64, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            kind: kind.into(),
            timestamp,
            payload: Some(Arc::new(payload)),
        }
    }

    pub fn kind(&self) -> MessageType {
        self.kind
    }

    /// Engine time (seconds) the message was stamped with.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Returns the payload if it is a `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("kind", &self.kind)
            .field("timestamp", &self.timestamp)
            .field("has_payload", &self.has_payload())
            .finish()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Spawn {
        id: u64,
    }

    #[test]
    fn fields_are_fixed_at_construction() {
        let msg = Message::new(7, 2.5);
        assert_eq!(msg.kind(), MessageType(7));
        assert_eq!(msg.timestamp(), 2.5);
        assert!(!msg.has_payload());
    }

    #[test]
    fn payload_downcasts_to_its_own_type_only() {
        let msg = Message::with_payload(1, 0.0, Spawn { id: 9 });
        assert_eq!(msg.payload::<Spawn>(), Some(&Spawn { id: 9 }));
        assert!(msg.payload::<u64>().is_none());
    }

    #[test]
    fn missing_payload_downcasts_to_none() {
        let msg = Message::new(1, 0.0);
        assert!(msg.payload::<Spawn>().is_none());
    }

    #[test]
    fn clones_share_payload() {
        let msg = Message::with_payload(1, 0.0, Spawn { id: 1 });
        let copy = msg.clone();

        let a = msg.payload::<Spawn>().unwrap() as *const Spawn;
        let b = copy.payload::<Spawn>().unwrap() as *const Spawn;
        assert_eq!(a, b, "clone must not deep-copy the payload");
    }

    #[test]
    fn message_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Message>();
    }

    #[test]
    fn message_type_display() {
        assert_eq!(MessageType(42).to_string(), "#42");
        assert_eq!(MessageType::from(3), MessageType(3));
    }
}
