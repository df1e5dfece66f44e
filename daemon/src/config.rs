use log::warn;
use serde::{Deserialize, Serialize};

use emm_core::security::{Eea, Eia};
use emm_core::timer::TimerTable;

use crate::error::DaemonError;

/// Served PLMN identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Plmn {
    pub mcc: String,
    pub mnc: String,
}

impl Default for Plmn {
    fn default() -> Self {
        Self {
            mcc: "001".to_string(),
            mnc: "01".to_string(),
        }
    }
}

/// Served GUMMEI (Globally Unique MME Identifier): the PLMN plus the
/// MME group ID and MME code carried in every GUTI this MME allocates.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Gummei {
    pub mme_group_id: u16,
    pub mme_code: u8,
}

impl Default for Gummei {
    fn default() -> Self {
        Self {
            mme_group_id: 1,
            mme_code: 1,
        }
    }
}

/// Opaque adapter endpoints: a real S6a/GTP-C/SGsAP client is not wired in
/// yet, so configuration only records where a future client would connect.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdapterEndpoints {
    pub hss_diameter_endpoint: String,
    pub sgw_gtpc_endpoint: String,
    pub msc_vlr_sgsap_endpoint: String,
}

impl Default for AdapterEndpoints {
    fn default() -> Self {
        Self {
            hss_diameter_endpoint: "127.0.0.1:3868".to_string(),
            sgw_gtpc_endpoint: "127.0.0.1:2123".to_string(),
            msc_vlr_sgsap_endpoint: "127.0.0.1:29118".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub status_port: u16,
    pub shard_count: usize,
    pub plmn: Plmn,
    pub gummei: Gummei,
    pub timers: TimerTable,
    pub eea_preference: Vec<Eea>,
    pub eia_preference: Vec<Eia>,
    pub adapters: AdapterEndpoints,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            status_port: 8080,
            shard_count: 8,
            plmn: Plmn::default(),
            gummei: Gummei::default(),
            timers: TimerTable::default(),
            eea_preference: vec![Eea::Eea2, Eea::Eea1, Eea::Eea0],
            eia_preference: vec![Eia::Eia2, Eia::Eia1],
            adapters: AdapterEndpoints::default(),
        }
    }
}

pub async fn parse_config<P>(path: P) -> Result<Config, DaemonError>
where
    P: AsRef<std::path::Path>,
{
    if let Ok(config_file) = tokio::fs::read_to_string(&path).await {
        Ok(toml::from_str(&config_file).map_err(DaemonError::ConfigFileParsingError)?)
    } else {
        warn!("unable to read config file, using default config");
        Ok(Config::default())
    }
}

pub struct Args {
    pub config_path: String,
}

pub fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Usage: {} /path/to/config/file", args[0]);
        std::process::exit(1);
    }
    Args {
        config_path: args[1].clone(),
    }
}
