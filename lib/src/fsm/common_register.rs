//! The shared handler invoked from both De-Registered and Registered, since
//! the two states react to inbound NAS messages identically: step 1
//! (Service-Request short header), step 2 (dispatch by NAS message type),
//! step 3 (identity recovery) and step 4 (act on the pending request) run
//! in that fixed order for every inbound `EMM-Message`; `EMM-Timer` events
//! are handled separately for T3413 paging and T3470 identity-request
//! retransmission.

use crate::adapters::{
    Adapters, GtpAdapter, S1apAdapter, S6aAdapter, SgsMode, SgsUnreachableCause, SgsapAdapter,
};
use crate::context::{PendingRequest, S1apProcedure, ServiceIndicator, ServiceType, UeContext};
use crate::error::EmmResult;
use crate::events::{EmmEvent, EmmMessage, EmmTimerTick, InboundNas};
use crate::fsm::{enter_state, handle_detach, EmmState};
use crate::ids::UeId;
use crate::nas::{self, EmmCause, OutboundMessageType};
use crate::timer::{TimerId, TimerTable};

fn ue_id(ctx: &UeContext) -> UeId {
    UeId(ctx.s1ap.mme_ue_s1ap_id)
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
    use crate::nas::SecurityHeaderType;

    if msg.security_header_type == SecurityHeaderType::ForServiceRequest {
        return handle_service_request(ctx, adapters).await;
    }

    let fully_handled = dispatch_by_type(ctx, msg.nas, msg.s1ap_procedure, adapters).await?;
    if fully_handled {
        return Ok(());
    }

    if !ctx.has_imsi() {
        ctx.timers.t3470.stop();
        let pdu = nas::build_identity_request(ctx, timers);
        adapters
            .s1ap()
            .downlink_nas_transport(ue_id(ctx), pdu)
            .await;
        return Ok(());
    }

    act_on_pending(ctx, adapters).await
}

/// Step 1: a Service-Request carried under the short "for Service Request"
/// security header.
async fn handle_service_request<A: Adapters>(ctx: &mut UeContext, adapters: &A) -> EmmResult<()> {
    if !ctx.has_imsi() || !ctx.security_context_valid() {
        let pdu = nas::build_service_reject(ctx, EmmCause::UeIdentityCannotBeDerivedByTheNetwork);
        adapters
            .s1ap()
            .downlink_nas_transport(ue_id(ctx), pdu)
            .await;
        enter_state(ctx, EmmState::Exception);
        return Ok(());
    }
    adapters
        .s1ap()
        .initial_context_setup_request(ue_id(ctx), None)
        .await;
    Ok(())
}

/// Step 2: dispatch by NAS message type. Returns `true` if the message was
/// fully handled (steps 3/4 must be skipped), `false` if control should
/// fall through to identity recovery / pending-request handling.
async fn dispatch_by_type<A: Adapters>(
    ctx: &mut UeContext,
    nas_msg: InboundNas,
    s1ap_procedure: S1apProcedure,
    adapters: &A,
) -> EmmResult<bool> {
    match nas_msg {
        InboundNas::IdentityResponse { imsi } => {
            ctx.timers.t3470.stop();
            if let Some(imsi) = imsi {
                ctx.imsi = Some(imsi);
            }
            if !ctx.has_imsi() {
                enter_state(ctx, EmmState::Exception);
                return Ok(true);
            }
            Ok(false)
        }
        InboundNas::AttachRequest => {
            ctx.pending = PendingRequest::Attach;
            Ok(false)
        }
        InboundNas::TauRequest { active_flag } => {
            if !ctx.has_imsi() {
                let pdu = nas::build_tau_reject(ctx, EmmCause::UeIdentityCannotBeDerivedByTheNetwork);
                adapters
                    .s1ap()
                    .downlink_nas_transport(ue_id(ctx), pdu)
                    .await;
                enter_state(ctx, EmmState::Exception);
                return Ok(true);
            }
            ctx.pending = PendingRequest::Tau {
                procedure: s1ap_procedure,
                active_flag,
            };
            Ok(false)
        }
        InboundNas::TauComplete => Ok(true),
        InboundNas::ExtendedServiceRequest { service_type } => {
            if !ctx.has_imsi() {
                let pdu = nas::build_service_reject(ctx, EmmCause::UeIdentityCannotBeDerivedByTheNetwork);
                adapters
                    .s1ap()
                    .downlink_nas_transport(ue_id(ctx), pdu)
                    .await;
                enter_state(ctx, EmmState::Exception);
                return Ok(true);
            }
            ctx.pending = PendingRequest::ExtendedService {
                procedure: s1ap_procedure,
                service_type,
            };
            Ok(false)
        }
        InboundNas::EmmStatus { emm_cause } => {
            log::warn!("EMM-Status received, cause {emm_cause:?}");
            enter_state(ctx, EmmState::Exception);
            Ok(true)
        }
        InboundNas::DetachRequest => {
            handle_detach(ctx, adapters).await;
            Ok(true)
        }
        InboundNas::UplinkNasTransport {
            nas_message_container,
        } => {
            if ctx.sgs.connected {
                adapters
                    .sgsap()
                    .uplink_unitdata(ue_id(ctx), nas_message_container)
                    .await;
            } else {
                adapters
                    .s1ap()
                    .error_indication(
                        ue_id(ctx),
                        crate::adapters::S1apErrorCause::TransportResourceUnavailable,
                    )
                    .await;
            }
            Ok(true)
        }
        // Authentication/Security-Mode/Attach-Complete/bare Service-Request
        // only make sense while that procedure is outstanding; outside of
        // it they are stray retransmissions of an already-resolved message.
        InboundNas::AuthenticationResponse { .. }
        | InboundNas::AuthenticationFailure { .. }
        | InboundNas::SecurityModeComplete
        | InboundNas::SecurityModeReject { .. }
        | InboundNas::AttachComplete
        | InboundNas::ServiceRequest => {
            log::debug!("stray NAS message ignored in De-Registered/Registered");
            Ok(true)
        }
    }
}

/// Step 4: act on the pending request type left behind by step 2.
async fn act_on_pending<A: Adapters>(ctx: &mut UeContext, adapters: &A) -> EmmResult<()> {
    match ctx.pending {
        PendingRequest::None => Ok(()),
        PendingRequest::Attach => {
            if ctx.security_context_valid() {
                enter_state(ctx, EmmState::InitialContextSetup);
            } else if ctx.session_context_available() {
                adapters.gtp().delete_all_sessions(ue_id(ctx)).await;
                enter_state(ctx, EmmState::Authentication);
            } else {
                adapters
                    .s6a()
                    .authentication_information_request(ue_id(ctx), None)
                    .await;
                enter_state(ctx, EmmState::Authentication);
            }
            Ok(())
        }
        PendingRequest::Tau {
            procedure,
            active_flag,
        } => {
            if !ctx.session_context_available() {
                let pdu =
                    nas::build_tau_reject(ctx, EmmCause::SecurityModeRejectedUnspecified);
                adapters
                    .s1ap()
                    .downlink_nas_transport(ue_id(ctx), pdu)
                    .await;
                enter_state(ctx, EmmState::Exception);
                return Ok(());
            }
            if !ctx.security_context_valid() {
                adapters
                    .s6a()
                    .authentication_information_request(ue_id(ctx), None)
                    .await;
                enter_state(ctx, EmmState::Authentication);
                return Ok(());
            }
            match procedure {
                S1apProcedure::InitialUeMessage => {
                    let pdu = nas::build_tau_accept(ctx);
                    if active_flag {
                        adapters
                            .s1ap()
                            .initial_context_setup_request(ue_id(ctx), Some(pdu))
                            .await;
                    } else {
                        adapters
                            .s1ap()
                            .downlink_nas_transport(ue_id(ctx), pdu)
                            .await;
                        adapters.s1ap().release_access_bearer(ue_id(ctx)).await;
                    }
                }
                S1apProcedure::UplinkNasTransport => {
                    let pdu = nas::build_tau_accept(ctx);
                    adapters
                        .s1ap()
                        .downlink_nas_transport(ue_id(ctx), pdu)
                        .await;
                }
            }
            enter_state(ctx, EmmState::Registered);
            Ok(())
        }
        PendingRequest::Service => Ok(()),
        PendingRequest::ExtendedService {
            procedure,
            service_type,
        } => {
            if !ctx.has_p_tmsi() || !ctx.session_context_available() || !ctx.security_context_valid()
            {
                let pdu = nas::build_service_reject(ctx, EmmCause::UeIdentityCannotBeDerivedByTheNetwork);
                adapters
                    .s1ap()
                    .downlink_nas_transport(ue_id(ctx), pdu)
                    .await;
                enter_state(ctx, EmmState::Exception);
                return Ok(());
            }
            match service_type {
                ServiceType::MobileOriginatedCsfb | ServiceType::MobileOriginatedCsfbEmergency => {
                    adapters.sgsap().mo_csfb_indication(ue_id(ctx)).await;
                }
                ServiceType::MobileTerminatedCsfb => {
                    let mode = if ctx.sgs.connected {
                        SgsMode::Connected
                    } else {
                        SgsMode::Idle
                    };
                    adapters.sgsap().service_request(ue_id(ctx), mode).await;
                }
            }
            match procedure {
                S1apProcedure::InitialUeMessage => {
                    adapters
                        .s1ap()
                        .initial_context_setup_request(ue_id(ctx), None)
                        .await;
                }
                S1apProcedure::UplinkNasTransport => {
                    adapters.s1ap().ue_context_modification_request(ue_id(ctx)).await;
                }
            }
            Ok(())
        }
    }
}

/// `EMM-Timer` events reachable in De-Registered/Registered: T3413 paging
/// retries and T3470 identity-request retries.
async fn handle_timer<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    tick: EmmTimerTick,
    adapters: &A,
) -> EmmResult<()> {
    match tick.timer_id {
        TimerId::T3413 => {
            if !ctx.timers.t3413.is_live_expiry(tick.generation) {
                return Ok(());
            }
            let cfg = timers.get(TimerId::T3413);
            if ctx.timers.t3413.is_exhausted(cfg) {
                ctx.timers.t3413.stop();
                if !ctx.service_indicator.is_empty() {
                    adapters
                        .sgsap()
                        .ue_unreachable(ue_id(ctx), SgsUnreachableCause::UeUnreachable)
                        .await;
                }
                ctx.service_indicator = ServiceIndicator::default();
            } else {
                ctx.timers.t3413.retransmit(cfg, tokio::time::Instant::now());
                adapters.s1ap().paging(ue_id(ctx)).await;
            }
            Ok(())
        }
        TimerId::T3470 => {
            if !ctx.timers.t3470.is_live_expiry(tick.generation) {
                return Ok(());
            }
            let cfg = timers.get(TimerId::T3470);
            if ctx.timers.t3470.is_exhausted(cfg) {
                ctx.timers.t3470.stop();
                enter_state(ctx, EmmState::Exception);
            } else {
                ctx.timers.t3470.retransmit(cfg, tokio::time::Instant::now());
                let pdu = nas::wrap(ctx, OutboundMessageType::IdentityRequest);
                adapters
                    .s1ap()
                    .downlink_nas_transport(ue_id(ctx), pdu)
                    .await;
            }
            Ok(())
        }
        TimerId::T3460 => {
            log::debug!("T3460 tick ignored outside Authentication/Security-Mode");
            Ok(())
        }
    }
}
