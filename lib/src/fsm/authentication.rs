//! Authentication state: awaits Authentication-Response or -Failure
//! following an Authentication-Information-Request sent to the HSS and an
//! Authentication-Request sent to the UE.

use crate::adapters::{Adapters, S1apAdapter, S6aAdapter};
use crate::context::{PendingRequest, UeContext};
use crate::error::EmmResult;
use crate::events::{AuthFailureCause, EmmEvent, EmmMessage, EmmTimerTick, InboundNas};
use crate::fsm::{enter_state, handle_detach, security_mode, EmmState};
use crate::ids::UeId;
use crate::nas;
use crate::security::{constant_time_eq, SecurityPolicy};
use crate::timer::{TimerId, TimerTable};

fn ue_id(ctx: &UeContext) -> UeId {
    UeId(ctx.s1ap.mme_ue_s1ap_id)
}

pub(crate) async fn handle<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    policy: &SecurityPolicy,
    event: EmmEvent,
    adapters: &A,
) -> EmmResult<()> {
    match event {
        EmmEvent::Message(msg) => handle_message(ctx, timers, policy, msg, adapters).await,
        EmmEvent::Timer(tick) => handle_timer(ctx, timers, tick, adapters).await,
    }
}

async fn handle_message<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    policy: &SecurityPolicy,
    msg: EmmMessage,
    adapters: &A,
) -> EmmResult<()> {
    match msg.nas {
        InboundNas::AuthenticationResponse { res } => {
            ctx.timers.t3460.stop();
            let xres = ctx
                .security
                .pending_vector
                .as_ref()
                .map(|v| v.xres.clone())
                .unwrap_or_default();
            if !constant_time_eq(&res, &xres) {
                let pdu = nas::build_authentication_reject(ctx, crate::nas::EmmCause::MacFailure);
                adapters
                    .s1ap()
                    .downlink_nas_transport(ue_id(ctx), pdu)
                    .await;
                enter_state(ctx, EmmState::Exception);
                return Ok(());
            }
            if let Some(vector) = ctx.security.pending_vector.take() {
                ctx.security.k_asme = Some(vector.k_asme);
            }
            enter_state(ctx, EmmState::SecurityMode);
            security_mode::on_entry(ctx, timers, policy, adapters).await;
            Ok(())
        }
        InboundNas::AuthenticationFailure { cause, auts } => {
            match cause {
                AuthFailureCause::SynchFailure => {
                    adapters
                        .s6a()
                        .authentication_information_request(ue_id(ctx), auts)
                        .await;
                    Ok(())
                }
                AuthFailureCause::MacFailure
                | AuthFailureCause::NonEpsAuthUnacceptable
                | AuthFailureCause::Other => {
                    ctx.timers.t3460.stop();
                    let emm_cause = match cause {
                        AuthFailureCause::NonEpsAuthUnacceptable => {
                            crate::nas::EmmCause::NonEpsAuthenticationUnacceptable
                        }
                        _ => crate::nas::EmmCause::MacFailure,
                    };
                    let pdu = nas::build_authentication_reject(ctx, emm_cause);
                    adapters
                        .s1ap()
                        .downlink_nas_transport(ue_id(ctx), pdu)
                        .await;
                    enter_state(ctx, EmmState::Exception);
                    Ok(())
                }
            }
        }
        InboundNas::AttachRequest => {
            ctx.pending = PendingRequest::Attach;
            adapters
                .s6a()
                .authentication_information_request(ue_id(ctx), None)
                .await;
            Ok(())
        }
        InboundNas::DetachRequest => {
            handle_detach(ctx, adapters).await;
            Ok(())
        }
        InboundNas::EmmStatus { emm_cause } => {
            log::warn!("EMM-Status in Authentication, cause {emm_cause:?}");
            enter_state(ctx, EmmState::Exception);
            Ok(())
        }
        _ => {
            log::debug!("stray NAS message ignored in Authentication");
            Ok(())
        }
    }
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
        // The UE is moved to Exception before the reject is sent: once
        // retries are exhausted this UE is abandoned regardless of whether
        // the reject actually reaches it.
        enter_state(ctx, EmmState::Exception);
        let pdu = nas::build_authentication_reject(
            ctx,
            crate::nas::EmmCause::SecurityModeRejectedUnspecified,
        );
        adapters
            .s1ap()
            .downlink_nas_transport(ue_id(ctx), pdu)
            .await;
    } else {
        ctx.timers
            .t3460
            .retransmit(cfg, tokio::time::Instant::now());
        let pdu = nas::wrap(ctx, crate::nas::OutboundMessageType::AuthenticationRequest);
        adapters
            .s1ap()
            .downlink_nas_transport(ue_id(ctx), pdu)
            .await;
    }
    Ok(())
}
