//! Configuração do roomsync carregada de `roomsync.toml` e do ambiente.
//!
//! A struct [`SyncConfig`] contém todos os parâmetros configuráveis.
//! Valores ausentes no arquivo usam defaults. Variáveis de ambiente
//! (inclusive as de um `.env`) têm precedência sobre o arquivo, e as flags
//! da CLI têm precedência sobre ambas.

use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::FailurePolicy;
use crate::error::SyncError;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "roomsync.toml";

/// Configuração de nível superior.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// URL base do projeto Supabase.
    #[serde(default)]
    pub supabase_url: String,

    /// Chave service role usada em `apikey` e `Authorization`.
    #[serde(default)]
    pub supabase_service_role: String,

    /// Endpoint do serviço de scrape (POST `{"room_id": ...}`).
    #[serde(default)]
    pub scrape_url: String,

    /// Número máximo de rooms processadas ao mesmo tempo (tamanho da onda).
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// `true`: falhas de scrape são gravadas com `failed = true`.
    /// `false`: falhas não geram escrita alguma.
    #[serde(default = "default_mark_failed")]
    pub mark_failed: bool,

    /// Timeout total de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// View que lista as rooms ainda ausentes da tabela de destino.
    #[serde(default = "default_backlog_view")]
    pub backlog_view: String,

    /// Coluna da view com o identificador da room.
    #[serde(default = "default_backlog_column")]
    pub backlog_column: String,

    /// Tabela que recebe os upserts.
    #[serde(default = "default_target_table")]
    pub target_table: String,
}

fn default_concurrency_limit() -> usize {
    1
}

fn default_mark_failed() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_backlog_view() -> String {
    "view_except_rooms".to_string()
}

fn default_backlog_column() -> String {
    "room".to_string()
}

fn default_target_table() -> String {
    "rooms".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_role: String::new(),
            scrape_url: String::new(),
            concurrency_limit: default_concurrency_limit(),
            mark_failed: default_mark_failed(),
            request_timeout_secs: default_request_timeout_secs(),
            backlog_view: default_backlog_view(),
            backlog_column: default_backlog_column(),
            target_table: default_target_table(),
        }
    }
}

impl SyncConfig {
    /// Carrega a configuração de `path` (defaults se o arquivo não existir)
    /// e aplica as variáveis devolvidas por `env`.
    pub fn load_from(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SyncError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<SyncConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(env)?;
        Ok(config)
    }

    /// Sobrescreve campos com variáveis de ambiente não vazias.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), SyncError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("SUPABASE_URL") {
            self.supabase_url = v;
        }
        if let Some(v) = var("SUPABASE_SERVICE_ROLE") {
            self.supabase_service_role = v;
        }
        if let Some(v) = var("SCRAPE_URL") {
            self.scrape_url = v;
        }
        if let Some(v) = var("CONCURRENCY_LIMIT") {
            self.concurrency_limit = parse_env("CONCURRENCY_LIMIT", &v)?;
        }
        if let Some(v) = var("MARK_FAILED") {
            self.mark_failed = parse_bool("MARK_FAILED", &v)?;
        }
        if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("BACKLOG_VIEW") {
            self.backlog_view = v;
        }
        if let Some(v) = var("BACKLOG_COLUMN") {
            self.backlog_column = v;
        }
        if let Some(v) = var("TARGET_TABLE") {
            self.target_table = v;
        }
        Ok(())
    }

    /// Valida os campos exigidos. `needs_scrape` é falso para comandos que
    /// apenas leem o backlog.
    pub fn validate(&self, needs_scrape: bool) -> Result<(), SyncError> {
        if self.supabase_url.trim().is_empty() {
            return Err(SyncError::Config("SUPABASE_URL is not set".into()));
        }
        if self.supabase_service_role.trim().is_empty() {
            return Err(SyncError::Config("SUPABASE_SERVICE_ROLE is not set".into()));
        }
        if needs_scrape && self.scrape_url.trim().is_empty() {
            return Err(SyncError::Config("SCRAPE_URL is not set".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        self.concurrency().map(|_| ())
    }

    pub fn concurrency(&self) -> Result<NonZeroUsize, SyncError> {
        NonZeroUsize::new(self.concurrency_limit)
            .ok_or_else(|| SyncError::Config("concurrency_limit must be at least 1".into()))
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::from_mark_failed(self.mark_failed)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, SyncError> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncError::Config(format!("{key} has an invalid value: {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SyncError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SyncError::Config(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}
