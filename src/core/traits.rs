//! DI "Interfaces"

use crate::core::relay::ClientEvent;
use futures_util::stream::BoxStream;

/// Events of one reply, in the order they must reach the browser.
pub type EventStream = BoxStream<'static, ClientEvent>;

pub trait ChatService: Send + Sync {
    /// Starts a reply to a single user message.
    ///
    /// The returned stream is lazy: nothing is sent to the backend until it is polled. It always
    /// finishes with an event that has `done` set, whether the reply completed or failed.
    fn reply(&self, message: String) -> EventStream;
}
