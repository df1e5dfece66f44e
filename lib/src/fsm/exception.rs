//! Exception state: terminal sink entered on any protocol or internal
//! failure. Entry already cleared the service indicator and every timer
//! (see [`crate::fsm::enter_state`]); from here on, events are logged and
//! dropped until the eNB releases the S1 context and the UE context is
//! reaped by the store.

use crate::context::UeContext;
use crate::error::EmmResult;
use crate::events::EmmEvent;

pub(crate) fn handle(ctx: &mut UeContext, event: EmmEvent) -> EmmResult<()> {
    log::debug!(
        "event dropped in Exception state for ue {:?}: {:?}",
        ctx.s1ap,
        event
    );
    Ok(())
}
