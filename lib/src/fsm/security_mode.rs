//! Security-Mode state: awaits Security-Mode-Complete or -Reject after a
//! Security-Mode-Command. Entry always (re)sends the command, which is also
//! how [`crate::fsm::authentication`] drives the Authentication →
//! Security-Mode transition.

use crate::adapters::{Adapters, S1apAdapter, S6aAdapter};
use crate::context::{PendingRequest, UeContext};
use crate::error::EmmResult;
use crate::events::{EmmEvent, EmmMessage, EmmTimerTick, InboundNas};
use crate::fsm::{enter_state, handle_detach, EmmState};
use crate::ids::UeId;
use crate::kdf;
use crate::nas::{self, EsmCause, OutboundMessageType, SecurityHeaderType};
use crate::security::SecurityPolicy;
use crate::timer::{TimerId, TimerTable};

fn ue_id(ctx: &UeContext) -> UeId {
    UeId(ctx.s1ap.mme_ue_s1ap_id)
}

/// Security-Mode-Complete must arrive integrity-protected; a Service
/// Request's short "for Service Request" header and a plain header both
/// fail this check.
fn is_integrity_protected(header: SecurityHeaderType) -> bool {
    matches!(
        header,
        SecurityHeaderType::IntegrityProtected
            | SecurityHeaderType::IntegrityProtectedAndCiphered
            | SecurityHeaderType::IntegrityProtectedWithNewContext
    )
}

/// Entry effect: select the EPS encryption/integrity algorithms for this
/// run from the configured preference lists (so `security_context_valid()`
/// holds once K_ASME is present), stop T3460, and send
/// Security-Mode-Command, which arms T3460. Called both on the
/// Authentication → Security-Mode transition and on T3460 retransmission
/// into this same state.
pub(crate) async fn on_entry<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    policy: &SecurityPolicy,
    adapters: &A,
) {
    if ctx.security.selected_eea.is_none() {
        ctx.security.selected_eea = Some(policy.preferred_eea());
    }
    if ctx.security.selected_eia.is_none() {
        ctx.security.selected_eia = Some(policy.preferred_eia());
    }
    ctx.timers.t3460.stop();
    let pdu = nas::build_security_mode_command(ctx, timers);
    adapters
        .s1ap()
        .downlink_nas_transport(ue_id(ctx), pdu)
        .await;
}

pub(crate) async fn handle<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    event: EmmEvent,
    adapters: &A,
) -> EmmResult<()> {
    match event {
        EmmEvent::Message(msg) => handle_message(ctx, timers, msg, adapters).await,
        EmmEvent::Timer(tick) => handle_timer(ctx, timers, tick, adapters).await,
    }
}

async fn handle_message<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    msg: EmmMessage,
    adapters: &A,
) -> EmmResult<()> {
    match msg.nas {
        InboundNas::SecurityModeComplete => {
            ctx.timers.t3460.stop();
            if !is_integrity_protected(msg.security_header_type) || !ctx.security_context_valid() {
                reject_security_mode(ctx, adapters).await;
                return Ok(());
            }
            derive_as_keys(ctx)?;
            adapters
                .s6a()
                .update_location_request(ue_id(ctx))
                .await;
            match ctx.pending {
                PendingRequest::Attach => enter_state(ctx, EmmState::InitialContextSetup),
                PendingRequest::Service | PendingRequest::Tau { .. } => {
                    enter_state(ctx, EmmState::Registered)
                }
                _ => enter_state(ctx, EmmState::Registered),
            }
            Ok(())
        }
        InboundNas::SecurityModeReject { .. } => {
            ctx.timers.t3460.stop();
            enter_state(ctx, EmmState::Exception);
            Ok(())
        }
        InboundNas::AttachRequest => {
            ctx.pending = PendingRequest::Attach;
            adapters
                .s6a()
                .authentication_information_request(ue_id(ctx), None)
                .await;
            enter_state(ctx, EmmState::Authentication);
            Ok(())
        }
        InboundNas::TauRequest { .. } => {
            let pdu = nas::build_tau_reject(ctx, crate::nas::EmmCause::SecurityModeRejectedUnspecified);
            adapters
                .s1ap()
                .downlink_nas_transport(ue_id(ctx), pdu)
                .await;
            enter_state(ctx, EmmState::Exception);
            Ok(())
        }
        InboundNas::EmmStatus { emm_cause } => {
            log::warn!("EMM-Status in Security-Mode, cause {emm_cause:?}");
            enter_state(ctx, EmmState::Exception);
            Ok(())
        }
        InboundNas::DetachRequest => {
            handle_detach(ctx, adapters).await;
            Ok(())
        }
        _ => {
            log::debug!("stray NAS message ignored in Security-Mode");
            Ok(())
        }
    }
}

/// Security-Mode-Complete integrity failure: Attach-Reject, not a bare
/// Security-Mode-Reject, since the UE only ever reaches this state while
/// an Attach/TAU/Service is outstanding.
async fn reject_security_mode<A: Adapters>(ctx: &mut UeContext, adapters: &A) {
    let pdu = nas::build_attach_reject(
        ctx,
        crate::nas::EmmCause::SecurityModeRejectedUnspecified,
        EsmCause::ProtocolErrorUnspecified,
    );
    adapters
        .s1ap()
        .downlink_nas_transport(ue_id(ctx), pdu)
        .await;
    enter_state(ctx, EmmState::Exception);
}

fn derive_as_keys(ctx: &mut UeContext) -> EmmResult<()> {
    let k_enb = kdf::derive_k_enb(ctx.security.k_asme.as_ref(), ctx.security.ul_count)?;
    let nh = kdf::derive_nh(ctx.security.k_asme.as_ref(), &k_enb)?;
    ctx.security.k_enb = Some(k_enb);
    ctx.security.nh = Some(nh);
    ctx.security.ncc = 1;
    Ok(())
}

async fn handle_timer<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    tick: EmmTimerTick,
    adapters: &A,
) -> EmmResult<()> {
    if tick.timer_id != TimerId::T3460 {
        return Ok(());
    }
    if !ctx.timers.t3460.is_live_expiry(tick.generation) {
        return Ok(());
    }
    let cfg = timers.get(TimerId::T3460);
    if ctx.timers.t3460.is_exhausted(cfg) {
        ctx.timers.t3460.stop();
        // Moved to Exception before the reject is sent, the same ordering
        // used on T3460 exhaustion in the Authentication state.
        enter_state(ctx, EmmState::Exception);
        let pdu = nas::build_attach_reject(
            ctx,
            crate::nas::EmmCause::SecurityModeRejectedUnspecified,
            EsmCause::ProtocolErrorUnspecified,
        );
        adapters
            .s1ap()
            .downlink_nas_transport(ue_id(ctx), pdu)
            .await;
    } else {
        ctx.timers
            .t3460
            .retransmit(cfg, tokio::time::Instant::now());
        let pdu = nas::wrap(ctx, OutboundMessageType::SecurityModeCommand);
        adapters
            .s1ap()
            .downlink_nas_transport(ue_id(ctx), pdu)
            .await;
    }
    Ok(())
}
