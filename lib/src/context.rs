//! The mutable per-UE record owned by the [`crate::store::UeContextStore`]:
//! identity, S1AP binding, security context, bearers, timers and the
//! current FSM state cursor.

use serde::{Deserialize, Serialize};

use crate::fsm::EmmState;
use crate::ids::{EnbUeS1apBinding, Guti, Imeisv, Imsi, MTmsi, PTmsi};
use crate::security::SecurityContext;
use crate::timer::TimerSet;

/// Which initiating NAS procedure the UE's current pass through
/// Authentication/Security-Mode is serving, so the FSM knows where to land
/// once the security context is (re)established. An explicit tagged
/// variant rather than a free-form integer, so every arm can be matched
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    None,
    Attach,
    Tau {
        procedure: S1apProcedure,
        active_flag: bool,
    },
    Service,
    ExtendedService {
        procedure: S1apProcedure,
        service_type: ServiceType,
    },
}

/// The S1AP procedure code that carried the inbound NAS message, as used
/// to pick how a TAU-Accept or CSFB indication gets carried back down:
/// the TAU and Extended-Service branches both split on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S1apProcedure {
    InitialUeMessage,
    UplinkNasTransport,
}

/// CS-fallback service type carried by an Extended-Service-Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    MobileOriginatedCsfb,
    MobileOriginatedCsfbEmergency,
    MobileTerminatedCsfb,
}

bitflags::bitflags! {
    /// Pending CS-domain services, cleared on entry to De-Registered and
    /// Exception.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ServiceIndicator: u8 {
        const CS_CALL = 0b01;
        const SMS = 0b10;
    }
}

/// SGs (MME-MSC/VLR) association state for CS fallback.
#[derive(Debug, Clone, Default)]
pub struct SgsAssociation {
    pub connected: bool,
    pub vlr_name: Option<String>,
}

/// An EPS bearer reference; the ESM side owns the bearer's QoS/TFT, EMM
/// holds only the identifier needed to address it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerId(pub u8);

/// Whether a PDN/session context already exists for this UE, i.e. whether
/// there is something for GTP-C "Delete-All-Sessions" to act on. Modeled
/// as a flag rather than pulling in the ESM bearer list itself, since bearer
/// ownership belongs to the companion ESM automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionContextState {
    pub present: bool,
}

/// The full per-UE mutable record.
#[derive(Debug, Clone)]
pub struct UeContext {
    pub imsi: Option<Imsi>,
    pub guti: Option<Guti>,
    pub m_tmsi: Option<MTmsi>,
    pub p_tmsi: Option<PTmsi>,
    pub imeisv: Option<Imeisv>,

    pub s1ap: EnbUeS1apBinding,

    pub security: SecurityContext,
    pub session: SessionContextState,
    pub bearers: Vec<BearerId>,

    pub timers: TimerSet,
    pub service_indicator: ServiceIndicator,
    pub sgs: SgsAssociation,

    pub pending: PendingRequest,
    pub state: EmmState,
}

impl UeContext {
    pub fn new(s1ap: EnbUeS1apBinding) -> Self {
        Self {
            imsi: None,
            guti: None,
            m_tmsi: None,
            p_tmsi: None,
            imeisv: None,
            s1ap,
            security: SecurityContext::new(),
            session: SessionContextState::default(),
            bearers: Vec::new(),
            timers: TimerSet::default(),
            service_indicator: ServiceIndicator::default(),
            sgs: SgsAssociation::default(),
            pending: PendingRequest::None,
            state: EmmState::DeRegistered,
        }
    }

    /// `MME_UE_HAVE_IMSI(ue)`: holds iff the IMSI is known. No outbound
    /// procedure that requires an IMSI may execute while this is false.
    pub fn has_imsi(&self) -> bool {
        self.imsi.as_ref().is_some_and(|imsi| !imsi.as_str().is_empty())
    }

    pub fn has_p_tmsi(&self) -> bool {
        self.p_tmsi.is_some()
    }

    pub fn security_context_valid(&self) -> bool {
        self.security.is_valid()
    }

    pub fn session_context_available(&self) -> bool {
        self.session.present
    }

    /// Clears the service indicator and stops every timer. Invoked on entry
    /// to De-Registered and Exception.
    pub fn clear_on_terminal_entry(&mut self) {
        self.service_indicator = ServiceIndicator::default();
        self.timers.clear_all();
    }
}
