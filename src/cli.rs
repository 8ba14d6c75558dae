//! Interface de linha de comando do roomsync baseada em clap.
//!
//! Define a struct [`Cli`] com os subcomandos [`Command`] (run, pending)
//! e flags globais que sobrescrevem a configuração carregada.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{CONFIG_FILE, SyncConfig};

/// roomsync: enriquece as rooms pendentes via serviço de scrape e grava no Supabase.
#[derive(Debug, Parser)]
#[command(name = "roomsync", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração TOML.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Número de rooms processadas em paralelo (tamanho da onda).
    #[arg(long, global = true)]
    pub concurrency: Option<NonZeroUsize>,

    /// O que fazer com rooms cujo scrape falhou.
    #[arg(long, global = true)]
    pub failure_policy: Option<PolicyArg>,

    /// Habilita saída detalhada (payloads e relatório JSON).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Política de falha aceita pela CLI, mapeada para o campo `mark_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Grava `{id, failed: true}` para cada room que falhou.
    MarkFailed,
    /// Não grava nada para rooms que falharam.
    SkipFailed,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Processa todo o backlog: scrape e upsert de cada room pendente.
    Run,

    /// Mostra quantas rooms estão pendentes, sem processá-las.
    Pending,
}

impl Cli {
    /// Aplica as flags globais sobre a configuração carregada.
    pub fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(concurrency) = self.concurrency {
            config.concurrency_limit = concurrency.get();
        }
        if let Some(policy) = self.failure_policy {
            config.mark_failed = policy == PolicyArg::MarkFailed;
        }
    }
}
