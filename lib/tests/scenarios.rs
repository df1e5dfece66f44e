//! End-to-end scenario tests: each scenario pushes a sequence of events
//! through [`fsm::dispatch`] against an in-memory `FakeAdapters` that
//! records every outbound call, then asserts both the final FSM state and
//! the recorded call sequence.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use emm_core::adapters::{
    Adapters, GtpAdapter, S1apAdapter, S1apErrorCause, S6aAdapter, SgsMode, SgsUnreachableCause,
    SgsapAdapter,
};
use emm_core::context::{S1apProcedure, UeContext};
use emm_core::events::{AuthFailureCause, EmmEvent, EmmMessage, EmmTimerTick, InboundNas};
use emm_core::fsm::{self, EmmState};
use emm_core::ids::{EnbId, EnbUeS1apBinding, EnbUeS1apId, Imsi, MmeUeS1apId, UeId};
use emm_core::nas::{NasPdu, OutboundMessageType, SecurityHeaderType};
use emm_core::security::{AuthVector, SecurityPolicy};
use emm_core::timer::TimerTable;

#[derive(Debug, Clone, PartialEq)]
enum RecordedCall {
    InitialContextSetupRequest,
    DownlinkNasTransport(OutboundMessageType),
    ErrorIndication(S1apErrorCause),
    Paging,
    ReleaseAccessBearer,
    UeContextModificationRequest,
    UeContextRelease,
    AuthenticationInformationRequest { resync: bool },
    UpdateLocationRequest,
    DeleteAllSessions,
    DetachIndication,
    UplinkUnitdata,
    MoCsfbIndication,
    ServiceRequest(SgsMode),
    TmsiReallocationComplete,
    UeUnreachable(SgsUnreachableCause),
}

#[derive(Default)]
struct FakeAdapters {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeAdapters {
    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl S1apAdapter for FakeAdapters {
    async fn initial_context_setup_request(&self, _ue_id: UeId, _nas: Option<NasPdu>) {
        self.push(RecordedCall::InitialContextSetupRequest);
    }

    async fn ue_context_modification_request(&self, _ue_id: UeId) {
        self.push(RecordedCall::UeContextModificationRequest);
    }

    async fn paging(&self, _ue_id: UeId) {
        self.push(RecordedCall::Paging);
    }

    async fn downlink_nas_transport(&self, _ue_id: UeId, nas: NasPdu) {
        self.push(RecordedCall::DownlinkNasTransport(nas.message_type));
    }

    async fn error_indication(&self, _ue_id: UeId, cause: S1apErrorCause) {
        self.push(RecordedCall::ErrorIndication(cause));
    }

    async fn ue_context_release(&self, _ue_id: UeId) {
        self.push(RecordedCall::UeContextRelease);
    }

    async fn release_access_bearer(&self, _ue_id: UeId) {
        self.push(RecordedCall::ReleaseAccessBearer);
    }
}

#[async_trait]
impl S6aAdapter for FakeAdapters {
    async fn authentication_information_request(&self, _ue_id: UeId, resync_auts: Option<Vec<u8>>) {
        self.push(RecordedCall::AuthenticationInformationRequest {
            resync: resync_auts.is_some(),
        });
    }

    async fn update_location_request(&self, _ue_id: UeId) {
        self.push(RecordedCall::UpdateLocationRequest);
    }
}

#[async_trait]
impl GtpAdapter for FakeAdapters {
    async fn delete_all_sessions(&self, _ue_id: UeId) {
        self.push(RecordedCall::DeleteAllSessions);
    }
}

#[async_trait]
impl SgsapAdapter for FakeAdapters {
    async fn detach_indication(&self, _ue_id: UeId) {
        self.push(RecordedCall::DetachIndication);
    }

    async fn uplink_unitdata(&self, _ue_id: UeId, _nas_message_container: Vec<u8>) {
        self.push(RecordedCall::UplinkUnitdata);
    }

    async fn mo_csfb_indication(&self, _ue_id: UeId) {
        self.push(RecordedCall::MoCsfbIndication);
    }

    async fn service_request(&self, _ue_id: UeId, mode: SgsMode) {
        self.push(RecordedCall::ServiceRequest(mode));
    }

    async fn tmsi_reallocation_complete(&self, _ue_id: UeId) {
        self.push(RecordedCall::TmsiReallocationComplete);
    }

    async fn ue_unreachable(&self, _ue_id: UeId, cause: SgsUnreachableCause) {
        self.push(RecordedCall::UeUnreachable(cause));
    }
}

impl Adapters for FakeAdapters {
    type S1ap = Self;
    type S6a = Self;
    type Gtp = Self;
    type Sgsap = Self;

    fn s1ap(&self) -> &Self::S1ap {
        self
    }

    fn s6a(&self) -> &Self::S6a {
        self
    }

    fn gtp(&self) -> &Self::Gtp {
        self
    }

    fn sgsap(&self) -> &Self::Sgsap {
        self
    }
}

fn binding() -> EnbUeS1apBinding {
    EnbUeS1apBinding {
        mme_ue_s1ap_id: MmeUeS1apId(1),
        enb_ue_s1ap_id: EnbUeS1apId(1),
        enb_id: EnbId(1),
    }
}

fn attach_message() -> EmmMessage {
    EmmMessage {
        ue_id: UeId(MmeUeS1apId(1)),
        security_header_type: SecurityHeaderType::PlainNas,
        nas: InboundNas::AttachRequest,
        s1ap_procedure: S1apProcedure::InitialUeMessage,
    }
}

async fn dispatch(ctx: &mut UeContext, timers: &TimerTable, event: EmmEvent, adapters: &FakeAdapters) {
    let policy = SecurityPolicy::default();
    fsm::dispatch(ctx, timers, &policy, event, adapters)
        .await
        .expect("dispatch should not hit an internal-assertion failure");
}

#[tokio::test]
async fn scenario_1_cold_attach_fresh_ue() {
    let mut ctx = UeContext::new(binding());
    ctx.imsi = Some(Imsi::new("001010000000001"));
    let timers = TimerTable::default();
    let adapters = FakeAdapters::default();

    dispatch(&mut ctx, &timers, EmmEvent::Message(attach_message()), &adapters).await;
    assert_eq!(ctx.state, EmmState::Authentication);
    assert_eq!(
        adapters.calls(),
        vec![RecordedCall::AuthenticationInformationRequest { resync: false }]
    );

    let vector = AuthVector {
        rand: [0u8; 16],
        autn: [0u8; 16],
        xres: vec![1, 2, 3, 4],
        k_asme: [9u8; 32],
    };
    ctx.security.pending_vector = Some(vector.clone());

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::PlainNas,
            nas: InboundNas::AuthenticationResponse { res: vec![1, 2, 3, 4] },
            s1ap_procedure: S1apProcedure::UplinkNasTransport,
        }),
        &adapters,
    )
    .await;
    assert_eq!(ctx.state, EmmState::SecurityMode);
    assert_eq!(ctx.security.k_asme, Some(vector.k_asme));
    assert!(ctx.timers.t3460.running);

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::IntegrityProtected,
            nas: InboundNas::SecurityModeComplete,
            s1ap_procedure: S1apProcedure::UplinkNasTransport,
        }),
        &adapters,
    )
    .await;
    assert_eq!(ctx.state, EmmState::InitialContextSetup);
    assert!(ctx.security.k_enb.is_some());
    assert!(ctx.security.nh.is_some());
    assert_eq!(ctx.security.ncc, 1);
    assert!(!ctx.timers.t3460.running);

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::IntegrityProtectedAndCiphered,
            nas: InboundNas::AttachComplete,
            s1ap_procedure: S1apProcedure::UplinkNasTransport,
        }),
        &adapters,
    )
    .await;
    assert_eq!(ctx.state, EmmState::Registered);
}

#[tokio::test]
async fn scenario_2_authentication_mac_failure() {
    let mut ctx = UeContext::new(binding());
    ctx.imsi = Some(Imsi::new("001010000000001"));
    ctx.state = EmmState::Authentication;
    ctx.timers.t3460.start(
        &emm_core::timer::TimerConfig { duration_ms: 6000, max_count: 4 },
        tokio::time::Instant::now(),
    );
    let timers = TimerTable::default();
    let adapters = FakeAdapters::default();

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::PlainNas,
            nas: InboundNas::AuthenticationFailure {
                cause: AuthFailureCause::MacFailure,
                auts: None,
            },
            s1ap_procedure: S1apProcedure::UplinkNasTransport,
        }),
        &adapters,
    )
    .await;

    assert_eq!(ctx.state, EmmState::Exception);
    assert!(!ctx.timers.t3460.running);
    assert_eq!(
        adapters.calls(),
        vec![RecordedCall::DownlinkNasTransport(
            OutboundMessageType::AuthenticationReject
        )]
    );
}

#[tokio::test]
async fn scenario_3_auth_resync() {
    let mut ctx = UeContext::new(binding());
    ctx.imsi = Some(Imsi::new("001010000000001"));
    ctx.state = EmmState::Authentication;
    let timers = TimerTable::default();
    let adapters = FakeAdapters::default();

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::PlainNas,
            nas: InboundNas::AuthenticationFailure {
                cause: AuthFailureCause::SynchFailure,
                auts: Some(vec![0xAA; 14]),
            },
            s1ap_procedure: S1apProcedure::UplinkNasTransport,
        }),
        &adapters,
    )
    .await;

    assert_eq!(ctx.state, EmmState::Authentication);
    assert_eq!(
        adapters.calls(),
        vec![RecordedCall::AuthenticationInformationRequest { resync: true }]
    );
}

#[tokio::test]
async fn scenario_4_tau_without_security_context() {
    let mut ctx = UeContext::new(binding());
    ctx.imsi = Some(Imsi::new("001010000000001"));
    ctx.state = EmmState::Registered;
    ctx.session.present = true;
    ctx.security.invalidate();
    let timers = TimerTable::default();
    let adapters = FakeAdapters::default();

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::PlainNas,
            nas: InboundNas::TauRequest { active_flag: false },
            s1ap_procedure: S1apProcedure::InitialUeMessage,
        }),
        &adapters,
    )
    .await;

    assert_eq!(ctx.state, EmmState::Authentication);
    assert_eq!(
        adapters.calls(),
        vec![RecordedCall::AuthenticationInformationRequest { resync: false }]
    );
}

#[tokio::test]
async fn scenario_5_paging_exhaustion() {
    let mut ctx = UeContext::new(binding());
    ctx.state = EmmState::DeRegistered;
    ctx.service_indicator = emm_core::context::ServiceIndicator::CS_CALL;
    let cfg = emm_core::timer::TimerConfig { duration_ms: 1, max_count: 2 };
    ctx.timers.t3413.retransmit(&cfg, tokio::time::Instant::now());
    let gen = ctx.timers.t3413.retransmit(&cfg, tokio::time::Instant::now());

    let mut timers = TimerTable::default();
    timers.t3413 = cfg;
    let adapters = FakeAdapters::default();

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Timer(EmmTimerTick {
            ue_id: UeId(MmeUeS1apId(1)),
            timer_id: emm_core::timer::TimerId::T3413,
            generation: gen,
        }),
        &adapters,
    )
    .await;

    assert_eq!(ctx.state, EmmState::DeRegistered);
    assert!(!ctx.timers.t3413.running);
    assert!(ctx.service_indicator.is_empty());
    assert_eq!(
        adapters.calls(),
        vec![RecordedCall::UeUnreachable(SgsUnreachableCause::UeUnreachable)]
    );
}

#[tokio::test]
async fn scenario_6_detach_during_security_mode() {
    let mut ctx = UeContext::new(binding());
    ctx.imsi = Some(Imsi::new("001010000000001"));
    ctx.state = EmmState::SecurityMode;
    ctx.timers.t3460.start(
        &emm_core::timer::TimerConfig { duration_ms: 6000, max_count: 4 },
        tokio::time::Instant::now(),
    );
    let timers = TimerTable::default();
    let adapters = FakeAdapters::default();

    dispatch(
        &mut ctx,
        &timers,
        EmmEvent::Message(EmmMessage {
            ue_id: UeId(MmeUeS1apId(1)),
            security_header_type: SecurityHeaderType::PlainNas,
            nas: InboundNas::DetachRequest,
            s1ap_procedure: S1apProcedure::UplinkNasTransport,
        }),
        &adapters,
    )
    .await;

    assert_eq!(ctx.state, EmmState::DeRegistered);
    assert!(!ctx.timers.any_running());
    assert_eq!(
        adapters.calls(),
        vec![
            RecordedCall::DeleteAllSessions,
            RecordedCall::DownlinkNasTransport(OutboundMessageType::DetachAccept),
        ]
    );
}
