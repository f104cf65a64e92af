use fpl_api::client::{FPL_UPSTREAM, Transport};
use log::LevelFilter;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// League loaded on startup, if any.
    pub league_id: Option<String>,
    /// Gateways first, then the direct upstream unless disabled.
    pub transports: Vec<Transport>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            league_id: None,
            transports: vec![Transport::Direct(FPL_UPSTREAM.to_string())],
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut transports: Vec<Transport> = value("FPLTUI_GATEWAY")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|base| Transport::Gateway(base.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        if value("FPLTUI_NO_DIRECT").as_deref() != Some("1") {
            let upstream = value("FPLTUI_UPSTREAM").unwrap_or_else(|| FPL_UPSTREAM.to_string());
            transports.push(Transport::Direct(upstream));
        }

        Self {
            full_screen: false,
            log_level: value("FPLTUI_LOG").and_then(|l| LevelFilter::from_str(&l).ok()),
            league_id: value("FPLTUI_LEAGUE"),
            transports,
        }
    }
}
