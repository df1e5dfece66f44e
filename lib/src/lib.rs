//! EPS Mobility Management (EMM) state machine core for a 4G/LTE MME.
//!
//! This crate implements the per-subscriber control-plane automaton that
//! drives attach, authentication, security-mode setup, tracking-area update,
//! service request, detach, paging and CS-fallback signaling over S1-MME, as
//! specified in 3GPP TS 24.301. It does not decode or encode NAS/S1AP wire
//! formats, speak Diameter/GTP-C/SGsAP itself, or own any sockets: those are
//! external collaborators reached through the [`adapters`] traits.

pub mod adapters;
pub mod context;
pub mod error;
pub mod events;
pub mod fsm;
pub mod ids;
pub mod kdf;
pub mod nas;
pub mod security;
pub mod store;
pub mod timer;

pub use context::UeContext;
pub use error::EmmError;
pub use events::{EmmEvent, EmmMessage, EmmTimerTick};
pub use fsm::{EmmState, PendingRequest};
