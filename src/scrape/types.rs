//! Tipos de dados trocados com o serviço de scrape.
//!
//! A requisição é fixa (`{"room_id": "..."}`), mas o esquema da resposta
//! pertence ao serviço remoto: [`Enrichment`] guarda os campos como um mapa
//! aberto de nome para valor, sem esquema fixo.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Corpo da requisição enviada ao endpoint de scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Identificador da room a ser enriquecida.
    pub room_id: String,
}

impl ScrapeRequest {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
        }
    }
}

/// Campos de enriquecimento devolvidos pelo serviço para uma única room.
///
/// Só existe durante o processamento de um item; os campos são copiados
/// literalmente para o registro persistido.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Enrichment(Map<String, Value>);

impl Enrichment {
    /// Consome o enriquecimento devolvendo os campos do serviço.
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Enrichment {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Enrichment {
    type Error = String;

    /// Aceita apenas objetos JSON; qualquer outro valor não tem campos para mesclar.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(format!("expected a JSON object, got {}", kind_of(&other))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
