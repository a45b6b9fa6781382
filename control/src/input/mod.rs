//! Digital inputs attached to the GPIO expander.
//!
//! Reading the expander requires a bus transaction, which must never happen
//! inside an interrupt. The expander's interrupt line only bumps an
//! [`EdgeSignal`]; a worker then talks to the expander and updates the
//! [`InputCache`]. The application reads the cache at any time, without
//! touching the bus.

pub mod cache;
pub mod expander;
pub mod pin_map;
pub mod signal;

pub use cache::InputCache;
pub use expander::ExpanderBus;
pub use pin_map::{Channel, ChannelKind, Pin, PinMap};
pub use signal::EdgeSignal;
