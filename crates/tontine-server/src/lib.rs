//! Configuration and wiring for the `tontine-server` binary.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tontine_core::{
  BootstrapAdmin, Ledger, LedgerConfig, activity::DEFAULT_RETENTION,
  store::BlobStore,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TONTINE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  pub admin_email:         String,
  /// Argon2 PHC string. Without it no bootstrap administrator exists.
  pub admin_password_hash: Option<String>,
  pub activity_retention:  usize,
  pub visitor_retention:   usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".into(),
      port:                8080,
      store_path:          PathBuf::from("~/.local/share/tontine/tontine.db"),
      admin_username:      "superadmin".into(),
      admin_email:         "admin@tontine.local".into(),
      admin_password_hash: None,
      activity_retention:  DEFAULT_RETENTION,
      visitor_retention:   DEFAULT_RETENTION,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn ledger_config(&self) -> LedgerConfig {
    LedgerConfig {
      admin: self.admin_password_hash.as_ref().map(|hash| BootstrapAdmin {
        username:      self.admin_username.clone(),
        email:         self.admin_email.clone(),
        password_hash: hash.clone(),
      }),
      activity_retention: self.activity_retention,
      visitor_retention: self.visitor_retention,
      ..LedgerConfig::default()
    }
  }
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full application: the JSON API mounted under `/api`.
pub fn app<S>(ledger: Arc<Ledger<S>>) -> Router
where
  S: BlobStore + 'static,
{
  Router::new().nest("/api", tontine_api::api_router(ledger))
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.activity_retention, 100);
    assert!(cfg.ledger_config().admin.is_none());
  }

  #[test]
  fn admin_hash_enables_bootstrap_admin() {
    let cfg = parse(
      r#"
        port = 9000
        admin_username = "root"
        admin_password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
        visitor_retention = 10
      "#,
    );
    let ledger = cfg.ledger_config();
    let admin = ledger.admin.unwrap();
    assert_eq!(admin.username, "root");
    assert_eq!(admin.email, "admin@tontine.local");
    assert_eq!(ledger.visitor_retention, 10);
    assert_eq!(ledger.activity_retention, 100);
    assert_eq!(cfg.address(), "127.0.0.1:9000");
  }
}
