use std::net::SocketAddr;
use std::sync::Arc;

use emm_core::security::SecurityPolicy;
use emm_core::store::UeContextStore;
use emm_mme_daemon::adapters::LoggingAdapters;
use emm_mme_daemon::config::{parse_args, parse_config};
use emm_mme_daemon::dispatcher::spawn_shards;
use emm_mme_daemon::error::DaemonError;
use emm_mme_daemon::status::{StatusState, router};
use log::info;
use tokio::net::TcpListener;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), DaemonError> {
    emm_mme_daemon::init_logging(log::LevelFilter::Info);

    let args = parse_args();
    let config = parse_config(&args.config_path).await?;

    info!(
        "starting EMM MME daemon: plmn={}/{} gummei group={} code={} shards={}",
        config.plmn.mcc,
        config.plmn.mnc,
        config.gummei.mme_group_id,
        config.gummei.mme_code,
        config.shard_count
    );

    let store = Arc::new(UeContextStore::new());
    let timers = Arc::new(config.timers);
    let policy = Arc::new(SecurityPolicy {
        eea_preference: config.eea_preference,
        eia_preference: config.eia_preference,
    });
    let adapters = Arc::new(LoggingAdapters::default());

    let _shards = spawn_shards(config.shard_count, store.clone(), timers, policy, adapters);

    let status_state = Arc::new(StatusState {
        store: store.clone(),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.status_port));
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(DaemonError::ServerBindError)?;
    info!("status endpoint listening on {addr}");

    let app = router(status_state);
    let server = axum::serve(listener, app);

    tokio::select! {
        res = server => {
            if let Err(err) = res {
                log::error!("status server error: {err}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
