//! In-memory state storage.
//!
//! - `SessionStore` - the running game, changed only through `SessionEvent`s

pub mod session;

pub use session::{
    reduce, LoadedSession, PendingPortrait, SessionEvent, SessionState, SessionStore, TurnDelta,
};
