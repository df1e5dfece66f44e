//! Inbound events delivered to the Dispatcher: decoded NAS messages, timer
//! expiries, and (implicitly, via [`crate::fsm::dispatch`]) FSM entry/exit
//! signals. The NAS payloads here are already decoded by the external NAS
//! codec (§1) down to exactly the fields this crate's FSM branches on.

use crate::context::{S1apProcedure, ServiceType};
use crate::ids::{Imsi, UeId};
use crate::nas::{EmmCause, SecurityHeaderType};
use crate::timer::TimerId;

/// `Authentication-Failure` cause values this crate distinguishes (§4.1
/// Authentication state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureCause {
    MacFailure,
    NonEpsAuthUnacceptable,
    SynchFailure,
    Other,
}

/// The decoded body of an inbound EMM message, already stripped of its
/// wire encoding by the external NAS codec. Variants are named after the
/// 3GPP message type they represent.
#[derive(Debug, Clone)]
pub enum InboundNas {
    IdentityResponse {
        imsi: Option<Imsi>,
    },
    AttachRequest,
    TauRequest {
        /// S1AP "active flag": the UE also wants its radio bearers
        /// re-established as part of the TAU, so the accept rides on
        /// Initial-Context-Setup instead of a bare Downlink-NAS-Transport
        /// (§4.1 common register, TAU pending-action branch).
        active_flag: bool,
    },
    TauComplete,
    ExtendedServiceRequest {
        service_type: ServiceType,
    },
    EmmStatus {
        emm_cause: EmmCause,
    },
    DetachRequest,
    UplinkNasTransport {
        nas_message_container: Vec<u8>,
    },
    AuthenticationResponse {
        res: Vec<u8>,
    },
    AuthenticationFailure {
        cause: AuthFailureCause,
        auts: Option<Vec<u8>>,
    },
    SecurityModeComplete,
    SecurityModeReject {
        emm_cause: EmmCause,
    },
    AttachComplete,
    /// Service Request carried under the short "for Service Request"
    /// security header (§4.1 step 1); `body` is opaque here since this
    /// crate only needs to recognize the header, not decode the request.
    ServiceRequest,
}

/// One inbound EMM NAS message, tagged with the UE it belongs to and the
/// S1AP procedure that carried it (needed to disambiguate TAU/Extended-Service
/// handling, §4.1).
#[derive(Debug, Clone)]
pub struct EmmMessage {
    pub ue_id: UeId,
    pub security_header_type: SecurityHeaderType,
    pub nas: InboundNas,
    pub s1ap_procedure: S1apProcedure,
}

/// A timer expiry, carrying the generation it was scheduled under so the
/// Dispatcher/FSM can apply the stop-before-fire check (§4.3.1).
#[derive(Debug, Clone, Copy)]
pub struct EmmTimerTick {
    pub ue_id: UeId,
    pub timer_id: TimerId,
    pub generation: u64,
}

/// Everything the Dispatcher can hand to an FSM handler.
#[derive(Debug, Clone)]
pub enum EmmEvent {
    Message(EmmMessage),
    Timer(EmmTimerTick),
}

impl EmmEvent {
    pub fn ue_id(&self) -> UeId {
        match self {
            EmmEvent::Message(m) => m.ue_id,
            EmmEvent::Timer(t) => t.ue_id,
        }
    }
}
