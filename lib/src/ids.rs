//! Subscriber and S1AP identifiers, wrapped so that predicates like
//! "does this UE have a known IMSI" are total functions on well-typed values
//! instead of ad hoc string/length checks scattered through the FSM.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IMSI, up to 15 decimal digits, stored BCD-as-ASCII the way the reference
/// implementation's `imsi_bcd` does for logging and indexing purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Imsi(String);

impl Imsi {
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Imsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally Unique Temporary Identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guti {
    pub mme_group_id: u16,
    pub mme_code: u8,
    pub m_tmsi: u32,
}

/// M-TMSI, the EPS-local part of the GUTI, also usable standalone as an
/// index key while a UE is paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MTmsi(pub u32);

/// P-TMSI, carried over from 2G/3G CS-fallback registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PTmsi(pub u32);

/// IMEI or IMEISV, reported by Identity-Response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imeisv(String);

impl Imeisv {
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }
}

/// MME-UE-S1AP-ID, a 32-bit identifier the MME itself allocates per UE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MmeUeS1apId(pub u32);

/// ENB-UE-S1AP-ID, a 24-bit identifier the eNodeB allocates per UE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnbUeS1apId(pub u32);

/// Back-reference to the eNodeB's S1AP association, opaque to the EMM core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnbId(pub u32);

/// The S1AP binding for one UE: its MME/eNB-allocated IDs and the
/// association they ride on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnbUeS1apBinding {
    pub mme_ue_s1ap_id: MmeUeS1apId,
    pub enb_ue_s1ap_id: EnbUeS1apId,
    pub enb_id: EnbId,
}

/// The key the Dispatcher and UE Context Store use to address a UE before
/// it necessarily has an IMSI on file: the S1AP binding is known on the
/// very first Initial-UE-Message, before anything else is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UeId(pub MmeUeS1apId);
