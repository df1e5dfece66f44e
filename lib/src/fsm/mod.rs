//! EMM FSM Core: the six-state automaton and its shared "common register"
//! handler.
//!
//! The state is a plain tagged enum dispatched by an explicit match rather
//! than a trait-object-per-state hierarchy — each per-state handler lives
//! in its own submodule and is called from [`dispatch`], the single entry
//! point the dispatcher invokes.

mod authentication;
mod common_register;
mod exception;
mod initial_context_setup;
mod security_mode;

pub use crate::context::PendingRequest;

use crate::adapters::{Adapters, GtpAdapter, S1apAdapter, SgsapAdapter};
use crate::context::UeContext;
use crate::error::EmmResult;
use crate::events::EmmEvent;
use crate::ids::UeId;
use crate::security::SecurityPolicy;
use crate::timer::TimerTable;

/// The six EMM states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmmState {
    DeRegistered,
    Registered,
    Authentication,
    SecurityMode,
    InitialContextSetup,
    Exception,
}

fn ue_id(ctx: &UeContext) -> UeId {
    UeId(ctx.s1ap.mme_ue_s1ap_id)
}

/// Moves `ctx` into `state`, running the entry effects common to every
/// state that needs one. De-Registered and Exception both clear the
/// service indicator and stop every timer on entry.
pub(crate) fn enter_state(ctx: &mut UeContext, state: EmmState) {
    ctx.state = state;
    if matches!(state, EmmState::DeRegistered | EmmState::Exception) {
        ctx.clear_on_terminal_entry();
    }
}

/// Shared Detach-Request handling reachable from every non-terminal state:
/// releases the SGs association if one exists, otherwise tears down the
/// PDN session and sends Detach-Accept back to the UE, then moves to
/// De-Registered. A UE that attached over SGs is told to detach through the
/// MSC/VLR rather than over NAS, so no Detach-Accept is sent on that path.
pub(crate) async fn handle_detach<A: Adapters>(ctx: &mut UeContext, adapters: &A) {
    if ctx.has_p_tmsi() {
        adapters.sgsap().detach_indication(ue_id(ctx)).await;
    } else {
        adapters.gtp().delete_all_sessions(ue_id(ctx)).await;
        let pdu = crate::nas::build_detach_accept(ctx);
        adapters.s1ap().downlink_nas_transport(ue_id(ctx), pdu).await;
    }
    enter_state(ctx, EmmState::DeRegistered);
}

/// The single entry point the dispatcher calls for every event: routes to
/// the handler for `ctx.state`. A handler runs to completion without
/// awaiting a reply — the `.await`s inside are for enqueueing outbound
/// calls, never for a response, which arrives later as its own event.
pub async fn dispatch<A: Adapters>(
    ctx: &mut UeContext,
    timers: &TimerTable,
    policy: &SecurityPolicy,
    event: EmmEvent,
    adapters: &A,
) -> EmmResult<()> {
    match ctx.state {
        EmmState::DeRegistered | EmmState::Registered => {
            common_register::handle(ctx, timers, event, adapters).await
        }
        EmmState::Authentication => {
            authentication::handle(ctx, timers, policy, event, adapters).await
        }
        EmmState::SecurityMode => security_mode::handle(ctx, timers, event, adapters).await,
        EmmState::InitialContextSetup => {
            initial_context_setup::handle(ctx, timers, event, adapters).await
        }
        EmmState::Exception => exception::handle(ctx, event),
    }
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
    fn entering_de_registered_clears_timers_and_indicator() {
        let mut ctx = ctx();
        ctx.service_indicator = crate::context::ServiceIndicator::SMS;
        ctx.timers.t3413.start(
            &crate::timer::TimerConfig { duration_ms: 1, max_count: 1 },
            tokio::time::Instant::now(),
        );
        enter_state(&mut ctx, EmmState::DeRegistered);
        assert_eq!(ctx.state, EmmState::DeRegistered);
        assert!(ctx.service_indicator.is_empty());
        assert!(!ctx.timers.any_running());
    }

    #[test]
    fn entering_registered_does_not_clear_timers() {
        let mut ctx = ctx();
        ctx.timers.t3413.start(
            &crate::timer::TimerConfig { duration_ms: 1, max_count: 1 },
            tokio::time::Instant::now(),
        );
        enter_state(&mut ctx, EmmState::Registered);
        assert!(ctx.timers.any_running());
    }
}
