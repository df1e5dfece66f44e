//! Process-level realization of "single-threaded per UE, parallel across
//! UEs": a fixed bank of shards, each an owned `mpsc::Receiver<EmmEvent>`
//! drained by its own spawned task. A UE's events always land on the same
//! shard (hashed by its `UeId`), so FSM transitions for one UE are strictly
//! ordered while different UEs' handlers run concurrently.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use emm_core::adapters::Adapters;
use emm_core::error::EmmError;
use emm_core::events::EmmEvent;
use emm_core::fsm;
use emm_core::ids::UeId;
use emm_core::security::SecurityPolicy;
use emm_core::store::UeContextStore;
use emm_core::timer::TimerTable;
use log::{error, warn};
use tokio::sync::mpsc;

/// A handle to one shard's inbound channel, used by the Dispatcher to
/// route an incoming event to the task that owns the UE it belongs to.
#[derive(Clone)]
pub struct ShardHandle {
    sender: mpsc::Sender<EmmEvent>,
}

impl ShardHandle {
    pub async fn send(&self, event: EmmEvent) {
        if self.sender.send(event).await.is_err() {
            error!("shard task gone, event dropped");
        }
    }
}

/// Picks the shard index for a UE: a plain hash of its `UeId` modulo the
/// shard count. `UeId` is the MME-UE-S1AP-ID-derived key that is known
/// from the very first Initial-UE-Message, so a UE can be routed to a
/// stable shard before its IMSI is learned.
fn shard_for(ue_id: UeId, shard_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    ue_id.hash(&mut hasher);
    (hasher.finish() as usize) % shard_count.max(1)
}

/// Spawns `shard_count` worker tasks and returns the handles events are
/// hashed across, plus the shared [`UeContextStore`] every shard draws its
/// contexts from.
pub fn spawn_shards<A: Adapters + 'static>(
    shard_count: usize,
    store: Arc<UeContextStore>,
    timers: Arc<TimerTable>,
    policy: Arc<SecurityPolicy>,
    adapters: Arc<A>,
) -> Vec<ShardHandle> {
    let mut handles = Vec::with_capacity(shard_count);
    for shard_id in 0..shard_count {
        let (tx, rx) = mpsc::channel(256);
        let store = store.clone();
        let timers = timers.clone();
        let policy = policy.clone();
        let adapters = adapters.clone();
        tokio::spawn(run_shard(shard_id, rx, store, timers, policy, adapters));
        handles.push(ShardHandle { sender: tx });
    }
    handles
}

/// Routes `event` to the shard owning its UE.
pub async fn route(shards: &[ShardHandle], event: EmmEvent) {
    let idx = shard_for(event.ue_id(), shards.len());
    shards[idx].send(event).await;
}

async fn run_shard<A: Adapters>(
    shard_id: usize,
    mut rx: mpsc::Receiver<EmmEvent>,
    store: Arc<UeContextStore>,
    timers: Arc<TimerTable>,
    policy: Arc<SecurityPolicy>,
    adapters: Arc<A>,
) {
    while let Some(event) = rx.recv().await {
        let ue_id = event.ue_id();
        let mut ctx = match store.lookup_by_ue_id(ue_id) {
            Some(ctx) => ctx,
            None => {
                warn!("shard {shard_id}: event for unknown UE {ue_id:?}");
                continue;
            }
        };
        if let Err(err) =
            fsm::dispatch(&mut ctx, &timers, &policy, event, adapters.as_ref()).await
        {
            match err {
                EmmError::UnknownUe(_) | EmmError::UnknownTimer(_) => {
                    warn!("shard {shard_id}: {err}")
                }
                _ => error!("shard {shard_id}: {err}"),
            }
        }
        store.create(ue_id, ctx);
        if let Err(err) = store.reindex(ue_id) {
            warn!("shard {shard_id}: reindex failed: {err}");
        }
    }
}
