//! Interface de terminal do roomsync: barra de progresso e saída colorida.
//!
//! Usa `indicatif` para a barra de progresso da execução e `console` para
//! as cores. O [`SyncProgress`] recebe os eventos do motor de sincronização
//! (onda iniciada, room persistida, falha de scrape, ...) e imprime uma
//! linha por evento sem quebrar a barra.

use std::fmt::Display;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::{ItemOutcome, RunReport};
use crate::store::{RoomId, RoomRecord};

/// Relatório visual de uma execução.
///
/// Cores: azul para payloads, verde para sucesso, amarelo para rooms
/// gravadas como falha e vermelho para erros.
pub struct SyncProgress {
    // Barra de progresso do indicatif; começa sem tamanho até o backlog ser lido.
    pb: ProgressBar,
    // Suprime toda a saída (usado em testes).
    quiet: bool,
    // Imprime tentativas, payloads e o relatório JSON.
    verbose: bool,
    green: Style,
    red: Style,
    yellow: Style,
    blue: Style,
    dim: Style,
}

impl SyncProgress {
    pub fn new(verbose: bool) -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self::with_bar(pb, false, verbose)
    }

    /// Um reporter silencioso.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden(), true, false)
    }

    fn with_bar(pb: ProgressBar, quiet: bool, verbose: bool) -> Self {
        Self {
            pb,
            quiet,
            verbose,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            blue: Style::new().blue(),
            dim: Style::new().dim(),
        }
    }

    // Sem terminal a barra fica oculta e `println` não imprime nada;
    // nesse caso as linhas vão direto para stdout.
    fn line(&self, message: impl Display) {
        if self.quiet {
            return;
        }
        if self.pb.is_hidden() {
            println!("{message}");
        } else {
            self.pb.println(message.to_string());
        }
    }

    pub fn backlog_loaded(&self, total: usize, waves: usize) {
        if total == 0 {
            self.line("No new rooms found in the backlog view.");
            return;
        }
        self.pb.set_length(total as u64);
        self.pb.enable_steady_tick(std::time::Duration::from_millis(100));
        self.line(format!(
            "{total} new rooms to process in {waves} wave(s) (from the backlog view)."
        ));
    }

    pub fn wave_started(&self, index: usize, waves: usize, size: usize) {
        self.pb.set_message(format!("wave {index}/{waves}"));
        self.line(format!("\nProcessing wave {index} of {waves} ({size} rooms)..."));
    }

    pub fn attempt(&self, room_id: &RoomId) {
        if self.verbose {
            self.line(self.dim.apply_to(format!("  Scraping room {room_id}")));
        }
    }

    pub fn payload(&self, record: &RoomRecord) {
        if self.verbose {
            let payload = serde_json::to_string(record).unwrap_or_default();
            self.line(self.blue.apply_to(format!(
                "  Room {} - upsert payload: {payload}",
                record.id
            )));
        }
    }

    pub fn scrape_failed(&self, room_id: &RoomId, error: &impl Display) {
        self.line(self.red.apply_to(format!(
            "  ✗ Scrape failed for room {room_id}: {error}"
        )));
    }

    pub fn skipped(&self, room_id: &RoomId) {
        self.pb.inc(1);
        self.line(self.dim.apply_to(format!(
            "  Room {room_id} left in the backlog (nothing written)."
        )));
    }

    pub fn persisted(&self, room_id: &RoomId, marked_failed: bool) {
        self.pb.inc(1);
        if marked_failed {
            self.line(self.yellow.apply_to(format!(
                "  ! Room {room_id} marked as failed in the store."
            )));
        } else {
            self.line(format!(
                "  {} Room {room_id} processed successfully.",
                self.green.apply_to("✓")
            ));
        }
    }

    pub fn store_failed(&self, room_id: &RoomId, error: &impl Display) {
        self.pb.inc(1);
        self.line(self.red.apply_to(format!(
            "  ✗ Upsert failed for room {room_id}: {error}"
        )));
    }

    /// Finaliza a barra e imprime o resumo da execução.
    pub fn finish(&self, report: &RunReport) {
        self.pb.finish_and_clear();
        if report.total == 0 {
            return;
        }
        let summary_style = if report.rejected.is_empty() {
            &self.green
        } else {
            &self.yellow
        };
        self.line(summary_style.apply_to(format!(
            "\nDone. Rooms processed: {} of {} ({} marked as failed, {} rejected).",
            report.processed,
            report.total,
            report.marked_failed,
            report.rejected.len()
        )));
        for outcome in &report.rejected {
            if let ItemOutcome::Rejected { reason, .. } = outcome {
                self.line(self.red.apply_to(format!(
                    "  ✗ {}: {reason}",
                    outcome.room_id()
                )));
            }
        }
        self.line(format!("Total time: {:.2} seconds.", report.elapsed_secs()));

        if self.verbose {
            self.line(self.dim.apply_to("─── Run Report ───"));
            self.line(serde_json::to_string_pretty(report).unwrap_or_default());
        }
    }

    /// Lista o backlog sem processá-lo (comando `pending`).
    pub fn pending(&self, rooms: &[RoomId]) {
        self.line(format!("{} rooms pending in the backlog view.", rooms.len()));
        if self.verbose {
            for room_id in rooms {
                self.line(format!("  {room_id}"));
            }
        }
    }
}

/// Imprime um erro fatal em vermelho no stderr.
pub fn fatal(error: &anyhow::Error) {
    let red = Style::new().red().bold();
    eprintln!("{}", red.apply_to(format!("Fatal error: {error:#}")));
}
