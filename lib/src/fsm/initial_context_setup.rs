//! Initial-Context-Setup state: awaits Attach-Complete after an S1AP
//! Initial-Context-Setup-Request was issued (either directly or
//! piggy-backing a TAU-Accept).

use crate::adapters::{Adapters, GtpAdapter, S6aAdapter, SgsapAdapter};
use crate::context::{PendingRequest, UeContext};
use crate::error::EmmResult;
use crate::events::{EmmEvent, EmmMessage, InboundNas};
use crate::fsm::{enter_state, handle_detach, EmmState};
use crate::ids::UeId;
use crate::timer::TimerTable;

fn ue_id(ctx: &UeContext) -> UeId {
    UeId(ctx.s1ap.mme_ue_s1ap_id)
}

pub(crate) async fn handle<A: Adapters>(
    ctx: &mut UeContext,
    _timers: &TimerTable,
    event: EmmEvent,
    adapters: &A,
) -> EmmResult<()> {
    match event {
        EmmEvent::Message(msg) => handle_message(ctx, msg, adapters).await,
        EmmEvent::Timer(tick) => {
            log::debug!("timer tick ignored in Initial-Context-Setup: {tick:?}");
            Ok(())
        }
    }
}

async fn handle_message<A: Adapters>(
    ctx: &mut UeContext,
    msg: EmmMessage,
    adapters: &A,
) -> EmmResult<()> {
    match msg.nas {
        InboundNas::AttachComplete => {
            if ctx.has_p_tmsi() {
                adapters
                    .sgsap()
                    .tmsi_reallocation_complete(ue_id(ctx))
                    .await;
            }
            enter_state(ctx, EmmState::Registered);
            Ok(())
        }
        InboundNas::AttachRequest => {
            adapters.gtp().delete_all_sessions(ue_id(ctx)).await;
            ctx.pending = PendingRequest::Attach;
            adapters
                .s6a()
                .authentication_information_request(ue_id(ctx), None)
                .await;
            enter_state(ctx, EmmState::Authentication);
            Ok(())
        }
        InboundNas::EmmStatus { emm_cause } => {
            log::warn!("EMM-Status in Initial-Context-Setup, cause {emm_cause:?}");
            enter_state(ctx, EmmState::Exception);
            Ok(())
        }
        InboundNas::DetachRequest => {
            handle_detach(ctx, adapters).await;
            Ok(())
        }
        _ => {
            log::debug!("stray NAS message ignored in Initial-Context-Setup");
            Ok(())
        }
    }
}
