//! Cab-Service: envelope framing and request dispatch.
//!
//! The layer between the HTTP front and the per-game handler sets. An
//! incoming body is unwrapped ([`envelope`]), inflated when the cabinet
//! compressed it, decoded by whichever codec the payload byte selects,
//! routed by `(game, version, module, method)` ([`Dispatcher`]), and the
//! handler's reply is wrapped back up the same way.
//!
//! Everything here is a pure function over the request bytes plus two
//! startup-built immutable structures (the [`GameRegistry`] and the
//! [`HandlerTable`]), so requests run concurrently without coordination.
//! Handlers are the only place allowed to block on I/O.

pub mod dispatch;
pub mod envelope;
mod error;
pub mod registry;
mod service;

pub use dispatch::{Dispatcher, Handler, HandlerTable};
pub use error::ServiceError;
pub use registry::{GameRegistry, GameVersion, Model};
pub use service::ProtocolService;
