//! Shared test doubles for the Lumina screenplay service.

mod clock;
mod repository;
mod transport;

pub use clock::{FixedClock, fixed_now};
pub use repository::{FailingStore, InMemoryStore};
pub use transport::{FailingTransport, ScriptedTransport, reply};
