mod event;
mod queue;
mod store;
mod timer;

pub use event::{ISessionObserver, SessionEvent};
pub use queue::BandQueue;
pub use store::{SessionState, SessionStore};
pub use timer::{Countdown, TickOutcome};
