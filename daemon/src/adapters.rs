//! Logging-only default implementation of the four adapter traits: until a
//! real S1AP/Diameter/GTP-C/SGsAP client is wired in, the daemon just logs
//! every outbound call it would have made.

use async_trait::async_trait;
use log::info;

use emm_core::adapters::{
    Adapters, GtpAdapter, S1apAdapter, S1apErrorCause, S6aAdapter, SgsMode, SgsUnreachableCause,
    SgsapAdapter,
};
use emm_core::ids::UeId;
use emm_core::nas::NasPdu;

#[derive(Debug, Default)]
pub struct LoggingS1ap;

#[async_trait]
impl S1apAdapter for LoggingS1ap {
    async fn initial_context_setup_request(&self, ue_id: UeId, nas: Option<NasPdu>) {
        info!("S1AP Initial-Context-Setup-Request ue={ue_id:?} nas={nas:?}");
    }

    async fn ue_context_modification_request(&self, ue_id: UeId) {
        info!("S1AP UE-Context-Modification-Request ue={ue_id:?}");
    }

    async fn paging(&self, ue_id: UeId) {
        info!("S1AP Paging ue={ue_id:?}");
    }

    async fn downlink_nas_transport(&self, ue_id: UeId, nas: NasPdu) {
        info!("S1AP Downlink-NAS-Transport ue={ue_id:?} nas={nas:?}");
    }

    async fn error_indication(&self, ue_id: UeId, cause: S1apErrorCause) {
        info!("S1AP Error-Indication ue={ue_id:?} cause={cause:?}");
    }

    async fn ue_context_release(&self, ue_id: UeId) {
        info!("S1AP UE-Context-Release ue={ue_id:?}");
    }

    async fn release_access_bearer(&self, ue_id: UeId) {
        info!("S1AP Release-Access-Bearer ue={ue_id:?}");
    }
}

#[derive(Debug, Default)]
pub struct LoggingS6a;

#[async_trait]
impl S6aAdapter for LoggingS6a {
    async fn authentication_information_request(&self, ue_id: UeId, resync_auts: Option<Vec<u8>>) {
        info!("S6a Authentication-Information-Request ue={ue_id:?} resync={}", resync_auts.is_some());
    }

    async fn update_location_request(&self, ue_id: UeId) {
        info!("S6a Update-Location-Request ue={ue_id:?}");
    }
}

#[derive(Debug, Default)]
pub struct LoggingGtp;

#[async_trait]
impl GtpAdapter for LoggingGtp {
    async fn delete_all_sessions(&self, ue_id: UeId) {
        info!("GTP-C Delete-All-Sessions ue={ue_id:?}");
    }
}

#[derive(Debug, Default)]
pub struct LoggingSgsap;

#[async_trait]
impl SgsapAdapter for LoggingSgsap {
    async fn detach_indication(&self, ue_id: UeId) {
        info!("SGsAP Detach-Indication ue={ue_id:?}");
    }

    async fn uplink_unitdata(&self, ue_id: UeId, nas_message_container: Vec<u8>) {
        info!(
            "SGsAP Uplink-Unitdata ue={ue_id:?} len={}",
            nas_message_container.len()
        );
    }

    async fn mo_csfb_indication(&self, ue_id: UeId) {
        info!("SGsAP MO-CSFB-Indication ue={ue_id:?}");
    }

    async fn service_request(&self, ue_id: UeId, mode: SgsMode) {
        info!("SGsAP Service-Request ue={ue_id:?} mode={mode:?}");
    }

    async fn tmsi_reallocation_complete(&self, ue_id: UeId) {
        info!("SGsAP TMSI-Reallocation-Complete ue={ue_id:?}");
    }

    async fn ue_unreachable(&self, ue_id: UeId, cause: SgsUnreachableCause) {
        info!("SGsAP UE-Unreachable ue={ue_id:?} cause={cause:?}");
    }
}

#[derive(Debug, Default)]
pub struct LoggingAdapters {
    pub s1ap: LoggingS1ap,
    pub s6a: LoggingS6a,
    pub gtp: LoggingGtp,
    pub sgsap: LoggingSgsap,
}

impl Adapters for LoggingAdapters {
    type S1ap = LoggingS1ap;
    type S6a = LoggingS6a;
    type Gtp = LoggingGtp;
    type Sgsap = LoggingSgsap;

    fn s1ap(&self) -> &Self::S1ap {
        &self.s1ap
    }

    fn s6a(&self) -> &Self::S6a {
        &self.s6a
    }

    fn gtp(&self) -> &Self::Gtp {
        &self.gtp
    }

    fn sgsap(&self) -> &Self::Sgsap {
        &self.sgsap
    }
}
