//! UE Context Store: the single owner of every [`UeContext`], indexed by
//! every key a UE can be addressed by before its full identity is known.
//! Each context has exactly one strong owner (the `UeId -> UeContext` map);
//! the secondary indexes are lookup keys only and are kept consistent on
//! insert/destroy/re-index.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::context::UeContext;
use crate::error::{EmmError, EmmResult};
use crate::ids::{Guti, Imsi, MTmsi, PTmsi, UeId};

#[derive(Default)]
struct Indexes {
    contexts: HashMap<UeId, UeContext>,
    by_imsi: HashMap<Imsi, UeId>,
    by_guti: HashMap<Guti, UeId>,
    by_m_tmsi: HashMap<MTmsi, UeId>,
    by_p_tmsi: HashMap<PTmsi, UeId>,
}

/// Thread-safe mapping from IMSI/GUTI/M-TMSI/P-TMSI/S1AP-derived `UeId` to
/// the single owning [`UeContext`]. A plain `Mutex` rather than a
/// reader-writer lock: every operation here already implies "the handler
/// for this UE is the sole writer", so contention is across UEs, not within
/// one.
#[derive(Default)]
pub struct UeContextStore {
    inner: Mutex<Indexes>,
}

impl UeContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh context for a UE first seen on an Initial-UE-Message,
    /// addressed only by its S1AP binding until an IMSI/GUTI is learned.
    pub fn create(&self, ue_id: UeId, ctx: UeContext) {
        let mut guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.contexts.insert(ue_id, ctx);
    }

    /// Re-indexes a context under its current IMSI/GUTI/M-TMSI/P-TMSI,
    /// called whenever one of those identifiers is learned or changes.
    pub fn reindex(&self, ue_id: UeId) -> EmmResult<()> {
        let mut guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        let ctx = guard
            .contexts
            .get(&ue_id)
            .ok_or(EmmError::UnknownUe(ue_id))?;
        let imsi = ctx.imsi.clone();
        let guti = ctx.guti.clone();
        let m_tmsi = ctx.m_tmsi;
        let p_tmsi = ctx.p_tmsi;
        if let Some(imsi) = imsi {
            guard.by_imsi.insert(imsi, ue_id);
        }
        if let Some(guti) = guti {
            guard.by_guti.insert(guti, ue_id);
        }
        if let Some(m_tmsi) = m_tmsi {
            guard.by_m_tmsi.insert(m_tmsi, ue_id);
        }
        if let Some(p_tmsi) = p_tmsi {
            guard.by_p_tmsi.insert(p_tmsi, ue_id);
        }
        Ok(())
    }

    pub fn lookup_by_ue_id(&self, ue_id: UeId) -> Option<UeContext> {
        let guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.contexts.get(&ue_id).cloned()
    }

    pub fn lookup_by_imsi(&self, imsi: &Imsi) -> Option<UeId> {
        let guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.by_imsi.get(imsi).copied()
    }

    pub fn lookup_by_guti(&self, guti: &Guti) -> Option<UeId> {
        let guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.by_guti.get(guti).copied()
    }

    pub fn lookup_by_m_tmsi(&self, m_tmsi: MTmsi) -> Option<UeId> {
        let guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.by_m_tmsi.get(&m_tmsi).copied()
    }

    pub fn lookup_by_p_tmsi(&self, p_tmsi: PTmsi) -> Option<UeId> {
        let guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.by_p_tmsi.get(&p_tmsi).copied()
    }

    /// Runs `f` against the owned context for `ue_id`, persisting whatever
    /// mutation it makes. This is the single seam every FSM dispatch call
    /// goes through, so the store never hands out a reference that outlives
    /// the lock.
    pub fn with_context_mut<F, R>(&self, ue_id: UeId, f: F) -> EmmResult<R>
    where
        F: FnOnce(&mut UeContext) -> R,
    {
        let mut guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        let ctx = guard
            .contexts
            .get_mut(&ue_id)
            .ok_or(EmmError::UnknownUe(ue_id))?;
        Ok(f(ctx))
    }

    /// Removes every index entry for `ue_id` without dropping the context
    /// itself, e.g. while a UE is mid-reindex under a new GUTI.
    pub fn detach_indexes(&self, ue_id: UeId) {
        let mut guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.by_imsi.retain(|_, v| *v != ue_id);
        guard.by_guti.retain(|_, v| *v != ue_id);
        guard.by_m_tmsi.retain(|_, v| *v != ue_id);
        guard.by_p_tmsi.retain(|_, v| *v != ue_id);
    }

    /// Destroys a context and every index entry pointing at it: successful
    /// Detach-Accept, an Attach-Reject that does not require retention, or
    /// administrative eviction.
    pub fn destroy(&self, ue_id: UeId) {
        let mut guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        guard.contexts.remove(&ue_id);
        guard.by_imsi.retain(|_, v| *v != ue_id);
        guard.by_guti.retain(|_, v| *v != ue_id);
        guard.by_m_tmsi.retain(|_, v| *v != ue_id);
        guard.by_p_tmsi.retain(|_, v| *v != ue_id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("UeContextStore mutex poisoned").contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of how many UEs currently sit in each FSM state, for the
    /// daemon's status endpoint.
    pub fn state_counts(&self) -> HashMap<crate::fsm::EmmState, usize> {
        let guard = self.inner.lock().expect("UeContextStore mutex poisoned");
        let mut counts = HashMap::new();
        for ctx in guard.contexts.values() {
            *counts.entry(ctx.state).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{EnbId, EnbUeS1apBinding, EnbUeS1apId, MmeUeS1apId};

    fn binding(id: u32) -> EnbUeS1apBinding {
        EnbUeS1apBinding {
            mme_ue_s1ap_id: MmeUeS1apId(id),
            enb_ue_s1ap_id: EnbUeS1apId(id),
            enb_id: EnbId(1),
        }
    }

    #[test]
    fn create_and_lookup_round_trips() {
        let store = UeContextStore::new();
        let ue_id = UeId(MmeUeS1apId(1));
        store.create(ue_id, UeContext::new(binding(1)));
        assert!(store.lookup_by_ue_id(ue_id).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reindex_makes_ue_findable_by_imsi() {
        let store = UeContextStore::new();
        let ue_id = UeId(MmeUeS1apId(2));
        store.create(ue_id, UeContext::new(binding(2)));
        store
            .with_context_mut(ue_id, |ctx| ctx.imsi = Some(Imsi::new("001010000000001")))
            .unwrap();
        store.reindex(ue_id).unwrap();
        assert_eq!(
            store.lookup_by_imsi(&Imsi::new("001010000000001")),
            Some(ue_id)
        );
    }

    #[test]
    fn destroy_removes_context_and_indexes() {
        let store = UeContextStore::new();
        let ue_id = UeId(MmeUeS1apId(3));
        store.create(ue_id, UeContext::new(binding(3)));
        store
            .with_context_mut(ue_id, |ctx| ctx.imsi = Some(Imsi::new("001010000000002")))
            .unwrap();
        store.reindex(ue_id).unwrap();
        store.destroy(ue_id);
        assert!(store.lookup_by_ue_id(ue_id).is_none());
        assert!(store
            .lookup_by_imsi(&Imsi::new("001010000000002"))
            .is_none());
    }

    #[test]
    fn operating_on_unknown_ue_is_an_error() {
        let store = UeContextStore::new();
        let result = store.with_context_mut(UeId(MmeUeS1apId(99)), |_| ());
        assert!(matches!(result, Err(EmmError::UnknownUe(_))));
    }
}
