//! Server configuration surface.
//!
//! Only the network-binding and TLS-material *paths* are modeled here; this
//! crate never reads a certificate or opens a socket itself — an embedding binary is expected to load
//! `SSL_key_file`/`SSL_cert_file`/`client_ca_file` and hand the engine an
//! already-established, already-authenticated stream.

#![allow(missing_docs, reason = "OrthoConfig and clap derive macros generate items that cannot be documented")]

use clap::Args;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Network and TLS configuration for an EPP server process.
#[derive(Args, OrthoConfig, Serialize, Deserialize, Debug, Clone)]
#[ortho_config(prefix = "EPP_")]
pub struct EppConfig {
    /// Interface or hostname to bind to.
    #[ortho_config(default = "localhost".to_owned())]
    #[arg(long, default_value_t = String::from("localhost"))]
    pub host: String,
    /// TCP port to listen on.
    #[ortho_config(default = 7000)]
    #[arg(long, default_value_t = 7000)]
    pub port: u16,
    /// Transport protocol identifier, as advertised out-of-band.
    #[ortho_config(default = "ssl".to_owned())]
    #[arg(long, default_value_t = String::from("ssl"))]
    pub proto: String,
    /// Path to the server's TLS private key.
    #[arg(long)]
    pub ssl_key_file: Option<String>,
    /// Path to the server's TLS certificate chain.
    #[arg(long)]
    pub ssl_cert_file: Option<String>,
    /// Path to a CA bundle used to validate client certificates. Absent
    /// means client certificates are not required.
    #[arg(long)]
    pub client_ca_file: Option<String>,
}

impl Default for EppConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 7000,
            proto: "ssl".to_owned(),
            ssl_key_file: None,
            ssl_cert_file: None,
            client_ca_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_apply_with_no_environment_or_flags() {
        Jail::expect_with(|_j| {
            let cfg = EppConfig::load_from_iter(["eppd"]).expect("load");
            assert_eq!(cfg.host, "localhost");
            assert_eq!(cfg.port, 7000);
            assert_eq!(cfg.proto, "ssl");
            assert!(cfg.ssl_cert_file.is_none());
            Ok(())
        });
    }

    #[rstest]
    fn env_config_loading() {
        Jail::expect_with(|j| {
            j.set_env("EPP_HOST", "0.0.0.0");
            j.set_env("EPP_PORT", "7001");
            let cfg = EppConfig::load_from_iter(["eppd"]).expect("load");
            assert_eq!(cfg.host, "0.0.0.0");
            assert_eq!(cfg.port, 7001);
            Ok(())
        });
    }

    #[rstest]
    fn cli_overrides_env() {
        Jail::expect_with(|j| {
            j.set_env("EPP_PORT", "7001");
            let cfg = EppConfig::load_from_iter(["eppd", "--port", "7002"]).expect("load");
            assert_eq!(cfg.port, 7002);
            Ok(())
        });
    }

    #[rstest]
    fn loads_from_dotfile() {
        Jail::expect_with(|j| {
            j.create_file(".eppd.toml", "host = \"epp.example.com\"\nport = 700")?;
            let cfg = EppConfig::load_from_iter(["eppd"]).expect("load");
            assert_eq!(cfg.host, "epp.example.com");
            assert_eq!(cfg.port, 700);
            Ok(())
        });
    }
}
