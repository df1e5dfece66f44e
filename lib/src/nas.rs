//! NAS Procedure Layer: builders for every outbound EMM/ESM message the FSM
//! core emits. Since the bit-level NAS codec is an external collaborator,
//! a [`NasPdu`] models only the fields the FSM and its tests need to reason
//! about — security header, message type, current protection state, and an
//! opaque payload placeholder a real codec would fill in.
//!
//! Every builder goes through [`wrap`], the single "security wrap" seam
//! that advances `dl_count` and stamps the current cipher/integrity
//! selection, so the DL-count-monotonicity invariant lives in one place
//! instead of at every call site.

use serde::{Deserialize, Serialize};

use crate::context::UeContext;
use crate::timer::{TimerId, TimerTable};

/// EMM security-header-type octet values (TS 24.301 §9.3.1). Type 12
/// ("for Service Request") is the short header used only by Service
/// Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityHeaderType {
    PlainNas,
    IntegrityProtected,
    IntegrityProtectedAndCiphered,
    IntegrityProtectedWithNewContext,
    ForServiceRequest,
}

/// Every outbound EMM/ESM message type this crate's NAS Procedure Layer
/// can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundMessageType {
    IdentityRequest,
    AuthenticationRequest,
    AuthenticationReject,
    SecurityModeCommand,
    AttachAccept,
    AttachReject,
    TauAccept,
    TauReject,
    ServiceReject,
    DetachAccept,
    ActivateDefaultBearerContextRequest,
    ActivateDedicatedBearerContextRequest,
    ModifyBearerContextRequest,
    DeactivateBearerContextRequest,
    CsServiceNotification,
    PdnConnectivityReject,
    EsmInformationRequest,
}

/// EMM reject causes used by this crate (TS 24.301 Annex A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmmCause {
    UeIdentityCannotBeDerivedByTheNetwork,
    SecurityModeRejectedUnspecified,
    MacFailure,
    NonEpsAuthenticationUnacceptable,
    SynchFailure,
}

/// ESM cause co-emitted alongside some EMM rejects (e.g. Attach-Reject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EsmCause {
    ProtocolErrorUnspecified,
}

/// A built, security-wrapped NAS PDU ready to hand to S1AP, either as
/// Downlink-NAS-Transport or piggy-backed on Initial-Context-Setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NasPdu {
    pub security_header_type: SecurityHeaderType,
    pub message_type: OutboundMessageType,
    pub ciphered: bool,
    pub integrity_protected: bool,
    pub dl_count: u32,
    pub emm_cause: Option<EmmCause>,
    pub esm_cause: Option<EsmCause>,
    pub payload: Vec<u8>,
}

/// Applies NAS security (cipher + integrity, using the selected algorithms
/// and current DL-count) and advances `dl_count`. This is the only place
/// `dl_count` is allowed to change.
pub(crate) fn wrap(ctx: &mut UeContext, message_type: OutboundMessageType) -> NasPdu {
    let security_header_type = if ctx.security_context_valid() {
        SecurityHeaderType::IntegrityProtectedAndCiphered
    } else {
        SecurityHeaderType::PlainNas
    };
    let integrity_protected = ctx.security.selected_eia.is_some();
    let ciphered = ctx.security.selected_eea.is_some();
    ctx.security.dl_count = ctx.security.dl_count.wrapping_add(1);
    NasPdu {
        security_header_type,
        message_type,
        ciphered,
        integrity_protected,
        dl_count: ctx.security.dl_count,
        emm_cause: None,
        esm_cause: None,
        payload: Vec::new(),
    }
}

/// Identity-Request: arms T3470 and resets its retry count.
pub fn build_identity_request(ctx: &mut UeContext, timers: &TimerTable) -> NasPdu {
    ctx.timers
        .t3470
        .start(timers.get(TimerId::T3470), tokio::time::Instant::now());
    wrap(ctx, OutboundMessageType::IdentityRequest)
}

/// Authentication-Request: arms T3460 and resets its retry count.
pub fn build_authentication_request(ctx: &mut UeContext, timers: &TimerTable) -> NasPdu {
    ctx.timers
        .t3460
        .start(timers.get(TimerId::T3460), tokio::time::Instant::now());
    wrap(ctx, OutboundMessageType::AuthenticationRequest)
}

pub fn build_authentication_reject(ctx: &mut UeContext, emm_cause: EmmCause) -> NasPdu {
    let mut pdu = wrap(ctx, OutboundMessageType::AuthenticationReject);
    pdu.emm_cause = Some(emm_cause);
    pdu
}

/// Security-Mode-Command: arms T3460 and resets its retry count.
pub fn build_security_mode_command(ctx: &mut UeContext, timers: &TimerTable) -> NasPdu {
    ctx.timers
        .t3460
        .start(timers.get(TimerId::T3460), tokio::time::Instant::now());
    wrap(ctx, OutboundMessageType::SecurityModeCommand)
}

pub fn build_attach_accept(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::AttachAccept)
}

pub fn build_attach_reject(ctx: &mut UeContext, emm_cause: EmmCause, esm_cause: EsmCause) -> NasPdu {
    let mut pdu = wrap(ctx, OutboundMessageType::AttachReject);
    pdu.emm_cause = Some(emm_cause);
    pdu.esm_cause = Some(esm_cause);
    pdu
}

pub fn build_tau_accept(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::TauAccept)
}

pub fn build_tau_reject(ctx: &mut UeContext, emm_cause: EmmCause) -> NasPdu {
    let mut pdu = wrap(ctx, OutboundMessageType::TauReject);
    pdu.emm_cause = Some(emm_cause);
    pdu
}

pub fn build_service_reject(ctx: &mut UeContext, emm_cause: EmmCause) -> NasPdu {
    let mut pdu = wrap(ctx, OutboundMessageType::ServiceReject);
    pdu.emm_cause = Some(emm_cause);
    pdu
}

pub fn build_detach_accept(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::DetachAccept)
}

pub fn build_activate_default_bearer_context_request(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::ActivateDefaultBearerContextRequest)
}

pub fn build_activate_dedicated_bearer_context_request(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::ActivateDedicatedBearerContextRequest)
}

pub fn build_modify_bearer_context_request(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::ModifyBearerContextRequest)
}

pub fn build_deactivate_bearer_context_request(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::DeactivateBearerContextRequest)
}

pub fn build_cs_service_notification(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::CsServiceNotification)
}

pub fn build_pdn_connectivity_reject(ctx: &mut UeContext, esm_cause: EsmCause) -> NasPdu {
    let mut pdu = wrap(ctx, OutboundMessageType::PdnConnectivityReject);
    pdu.esm_cause = Some(esm_cause);
    pdu
}

pub fn build_esm_information_request(ctx: &mut UeContext) -> NasPdu {
    wrap(ctx, OutboundMessageType::EsmInformationRequest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{EnbId, EnbUeS1apBinding, EnbUeS1apId, MmeUeS1apId};

    fn ctx() -> UeContext {
        UeContext::new(EnbUeS1apBinding {
            mme_ue_s1ap_id: MmeUeS1apId(1),
            enb_ue_s1ap_id: EnbUeS1apId(1),
            enb_id: EnbId(1),
        })
    }

    #[test]
    fn wrap_advances_dl_count_monotonically() {
        let mut ctx = ctx();
        let first = build_identity_request(&mut ctx, &TimerTable::default());
        let second = build_authentication_reject(&mut ctx, EmmCause::MacFailure);
        assert!(second.dl_count > first.dl_count);
    }

    #[test]
    fn identity_request_arms_t3470() {
        let mut ctx = ctx();
        assert!(!ctx.timers.t3470.running);
        build_identity_request(&mut ctx, &TimerTable::default());
        assert!(ctx.timers.t3470.running);
        assert_eq!(ctx.timers.t3470.retry_count, 0);
    }

    #[test]
    fn authentication_request_arms_t3460() {
        let mut ctx = ctx();
        build_authentication_request(&mut ctx, &TimerTable::default());
        assert!(ctx.timers.t3460.running);
    }

    #[test]
    fn plain_nas_header_without_security_context() {
        let mut ctx = ctx();
        let pdu = build_identity_request(&mut ctx, &TimerTable::default());
        assert_eq!(pdu.security_header_type, SecurityHeaderType::PlainNas);
    }

    #[test]
    fn protected_header_once_security_context_is_valid() {
        let mut ctx = ctx();
        ctx.security.k_asme = Some([1u8; 32]);
        ctx.security.selected_eea = Some(crate::security::Eea::Eea2);
        ctx.security.selected_eia = Some(crate::security::Eia::Eia2);
        let pdu = build_attach_accept(&mut ctx);
        assert_eq!(
            pdu.security_header_type,
            SecurityHeaderType::IntegrityProtectedAndCiphered
        );
        assert!(pdu.ciphered);
        assert!(pdu.integrity_protected);
    }
}
