//! Outbound façades for the four external signaling planes this crate
//! coordinates but does not itself implement: S1AP (eNodeB), S6a/Diameter
//! (HSS), GTP-C (S/P-GW) and SGsAP (MSC/VLR). Each is an `async_trait` so a
//! real implementation can do network I/O while the FSM handler itself
//! never awaits: a handler calls these synchronously-shaped methods through
//! a bundle, and it is the caller driving the event loop, not the handler
//! itself, that owns the runtime driving them.
//!
//! [`Adapters`] is implemented both by a real client bundle wired up at
//! process start and, in tests, by an in-memory fake that records every
//! call for assertions.

use async_trait::async_trait;

use crate::context::BearerId;
use crate::ids::UeId;
use crate::nas::NasPdu;

/// S1AP transport failure cause reported back to the FSM on
/// Error-Indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S1apErrorCause {
    TransportResourceUnavailable,
}

/// SGs idle/connected mode for a CS-fallback Service-Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgsMode {
    Idle,
    Connected,
}

/// Cause reported to SGsAP UE-Unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgsUnreachableCause {
    UeUnreachable,
}

#[async_trait]
pub trait S1apAdapter: Send + Sync {
    async fn initial_context_setup_request(&self, ue_id: UeId, nas: Option<NasPdu>);
    async fn ue_context_modification_request(&self, ue_id: UeId);
    async fn paging(&self, ue_id: UeId);
    async fn downlink_nas_transport(&self, ue_id: UeId, nas: NasPdu);
    async fn error_indication(&self, ue_id: UeId, cause: S1apErrorCause);
    async fn ue_context_release(&self, ue_id: UeId);
    async fn release_access_bearer(&self, ue_id: UeId);
}

#[async_trait]
pub trait S6aAdapter: Send + Sync {
    async fn authentication_information_request(&self, ue_id: UeId, resync_auts: Option<Vec<u8>>);
    async fn update_location_request(&self, ue_id: UeId);
}

#[async_trait]
pub trait GtpAdapter: Send + Sync {
    async fn delete_all_sessions(&self, ue_id: UeId);
}

#[async_trait]
pub trait SgsapAdapter: Send + Sync {
    async fn detach_indication(&self, ue_id: UeId);
    async fn uplink_unitdata(&self, ue_id: UeId, nas_message_container: Vec<u8>);
    async fn mo_csfb_indication(&self, ue_id: UeId);
    async fn service_request(&self, ue_id: UeId, mode: SgsMode);
    async fn tmsi_reallocation_complete(&self, ue_id: UeId);
    async fn ue_unreachable(&self, ue_id: UeId, cause: SgsUnreachableCause);
}

/// Bundle trait the FSM core is generic over, so a single type parameter
/// gives a handler access to all four planes.
pub trait Adapters: Send + Sync {
    type S1ap: S1apAdapter;
    type S6a: S6aAdapter;
    type Gtp: GtpAdapter;
    type Sgsap: SgsapAdapter;

    fn s1ap(&self) -> &Self::S1ap;
    fn s6a(&self) -> &Self::S6a;
    fn gtp(&self) -> &Self::Gtp;
    fn sgsap(&self) -> &Self::Sgsap;
}

/// Unused-bearer warning suppression: `BearerId` is part of the data model
/// consumed by the ESM-facing builders; adapters re-export it so adapter
/// implementations can name bearers without an extra import path.
pub type BearerRef = BearerId;
