use thiserror::Error;

use crate::ids::UeId;
use crate::timer::TimerId;

/// Internal-assertion failures: impossible states and adapter-transport
/// faults that must be surfaced rather than handled as a protocol outcome.
///
/// Ordinary protocol rejections (Attach-Reject, Authentication-Reject, ...)
/// are not represented here: they are legitimate FSM outcomes and are
/// expressed as NAS sends plus a transition to [`crate::fsm::EmmState::Exception`],
/// not as an `Err` return, since a protocol reject is normal control flow
/// rather than a fault in the MME itself.
#[derive(Error, Debug)]
pub enum EmmError {
    #[error("no UE context for {0:?}")]
    UnknownUe(UeId),

    #[error("timer {0:?} fired for a UE with no such timer armed")]
    UnknownTimer(TimerId),

    #[error("adapter call failed: {0}")]
    AdapterFailed(String),

    #[error("key derivation requested without a valid K_ASME")]
    NoSecurityContext,

    #[error("internal invariant violated: {0}")]
    InvariantViolation(&'static str),
}

pub type EmmResult<T> = Result<T, EmmError>;
