//! Tipos de erro para o cliente do serviço de scrape.
//!
//! Define [`ScrapeError`] com variantes para respostas não-2xx, falhas de rede
//! e corpos de resposta inválidos. Todos os erros são de escopo do item:
//! o motor de sincronização os converte em resultados e nunca os propaga.

use thiserror::Error;

/// Erros que podem ocorrer ao pedir o enriquecimento de uma room.
///
/// - [`Status`](ScrapeError::Status) — o serviço respondeu com status fora de 2xx
/// - [`Network`](ScrapeError::Network) — falha ao montar ou enviar a requisição
/// - [`InvalidBody`](ScrapeError::InvalidBody) — resposta 2xx que não é um objeto JSON
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Resposta não-2xx. `body` é o JSON compacto da resposta quando ela
    /// pode ser interpretada, ou o texto bruto caso contrário.
    #[error("scrape service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// O corpo da resposta de sucesso não pôde ser interpretado.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}
