//! The per-UE cryptographic context: the authentication vector received
//! from the HSS, the derived AS key hierarchy, and the NAS sequence
//! counters that key derivation and ciphering/integrity depend on.

use serde::{Deserialize, Serialize};

/// EPS Encryption Algorithm identifiers (TS 33.401 §5.1.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eea {
    Eea0,
    Eea1,
    Eea2,
    Eea3,
}

/// EPS Integrity Algorithm identifiers (TS 33.401 §5.1.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eia {
    Eia0,
    Eia1,
    Eia2,
    Eia3,
}

/// The authentication vector returned by an S6a Authentication-Information-Answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVector {
    pub rand: [u8; 16],
    pub autn: [u8; 16],
    pub xres: Vec<u8>,
    pub k_asme: [u8; 32],
}

/// The mutable security state carried by a [`crate::context::UeContext`].
///
/// `valid()` holds iff `k_asme` is present, an EEA/EIA pair has been
/// selected during Security-Mode, and the DL/UL counters are synchronized
/// (tracked here simply by both being present and non-stale, since counter
/// desynchronization is surfaced as an Authentication-Failure event rather
/// than as crate-internal state).
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    pub k_asme: Option<[u8; 32]>,
    pub k_enb: Option<[u8; 32]>,
    pub nh: Option<[u8; 32]>,
    pub ncc: u8,
    pub ul_count: u32,
    pub dl_count: u32,
    pub selected_eea: Option<Eea>,
    pub selected_eia: Option<Eia>,
    pub pending_vector: Option<AuthVector>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds iff K_ASME is present and algorithms have been selected during
    /// Security-Mode-Command negotiation.
    pub fn is_valid(&self) -> bool {
        self.k_asme.is_some() && self.selected_eea.is_some() && self.selected_eia.is_some()
    }

    /// Clears everything derived from a completed AKA run, forcing a
    /// re-run of authentication on the next attach/TAU. Used when evicting
    /// a stale security context, e.g. a TAU Request arriving with no
    /// security context established.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

/// Configured EEA/EIA preference lists a carrier loads at process start.
/// `preferred_eea`/`preferred_eia` pick the highest-priority algorithm from
/// each list; an empty list falls back to the weakest defined algorithm
/// rather than panicking, since a misconfigured preference list should
/// degrade gracefully rather than take the MME down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub eea_preference: Vec<Eea>,
    pub eia_preference: Vec<Eia>,
}

impl SecurityPolicy {
    pub fn preferred_eea(&self) -> Eea {
        self.eea_preference.first().copied().unwrap_or(Eea::Eea0)
    }

    pub fn preferred_eia(&self) -> Eia {
        self.eia_preference.first().copied().unwrap_or(Eia::Eia2)
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            eea_preference: vec![Eea::Eea2, Eea::Eea1, Eea::Eea0],
            eia_preference: vec![Eia::Eia2, Eia::Eia1],
        }
    }
}

/// Constant-time comparison of the UE-returned RES against the stored
/// XRES, over the length of the received RES. A timing side channel here
/// would let an attacker recover XRES bit by bit, so the comparison must
/// not short-circuit on the first mismatching byte.
pub fn constant_time_eq(res: &[u8], xres: &[u8]) -> bool {
    if res.len() != xres.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (a, b) in res.iter().zip(xres.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equal_slices() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn constant_time_eq_rejects_mismatch_anywhere() {
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[0, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn constant_time_eq_rejects_length_mismatch() {
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
    }

    #[test]
    fn security_context_invalid_without_k_asme() {
        let ctx = SecurityContext::new();
        assert!(!ctx.is_valid());
    }

    #[test]
    fn security_context_invalid_without_algorithms() {
        let mut ctx = SecurityContext::new();
        ctx.k_asme = Some([0u8; 32]);
        assert!(!ctx.is_valid());
    }

    #[test]
    fn default_policy_prefers_eea2_and_eia2() {
        let policy = SecurityPolicy::default();
        assert_eq!(policy.preferred_eea(), Eea::Eea2);
        assert_eq!(policy.preferred_eia(), Eia::Eia2);
    }

    #[test]
    fn empty_preference_list_falls_back_to_weakest_algorithm() {
        let policy = SecurityPolicy {
            eea_preference: vec![],
            eia_preference: vec![],
        };
        assert_eq!(policy.preferred_eea(), Eea::Eea0);
        assert_eq!(policy.preferred_eia(), Eia::Eia2);
    }

    #[test]
    fn security_context_valid_with_key_and_algorithms() {
        let mut ctx = SecurityContext::new();
        ctx.k_asme = Some([0u8; 32]);
        ctx.selected_eea = Some(Eea::Eea2);
        ctx.selected_eia = Some(Eia::Eia2);
        assert!(ctx.is_valid());
    }
}
