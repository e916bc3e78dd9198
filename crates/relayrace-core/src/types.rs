/*!
 * Relayrace Types
 *
 * Tipos comuns usados em toda a workspace Relayrace
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias para hash de transação (hex maiúsculo, como reportado pelo node)
pub type TxHash = String;

/// Evento emitido por uma transação, com atributos em ordem de emissão
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEvent {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl TxEvent {
    /// Retorna o valor do primeiro atributo com a chave dada
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Resultado de submissão ou consulta de uma transação.
///
/// `events` vem das entradas de log por mensagem; `extra_events` é a lista
/// de eventos de nível superior da resposta (versões mais novas do node
/// colocam os eventos ali). Uma transação com `code != 0` não carrega
/// eventos válidos e não deve ser usada para correlação.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub hash: TxHash,
    pub code: u32,
    pub height: Option<u64>,
    pub events: Vec<TxEvent>,
    pub extra_events: Vec<TxEvent>,
    pub raw_log: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TxRecord {
    /// Indica se a transação foi aceita pelo node
    pub fn accepted(&self) -> bool {
        self.code == 0
    }
}

/// Identidade de um pacote IBC em trânsito: (porta, canal, sequência).
///
/// Sequências são monotônicas por (porta, canal) no lado emissor; uma
/// identidade designa no máximo um envio e um recebimento na rede.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketIdentity {
    pub port: String,
    pub channel: String,
    pub sequence: u64,
}

impl fmt::Display for PacketIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.port, self.channel, self.sequence)
    }
}

/// Posição de sequenciamento de uma transação: altura de bloco e,
/// quando disponível, índice dentro do bloco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub height: u64,
    pub index: Option<usize>,
}

impl Placement {
    pub fn new(height: u64) -> Self {
        Self { height, index: None }
    }

    pub fn with_index(height: u64, index: usize) -> Self {
        Self { height, index: Some(index) }
    }
}

/// Bloco consultado: altura e bytes crus de cada transação incluída
#[derive(Debug, Clone)]
pub struct BlockRecord {
    pub height: u64,
    pub txs: Vec<Vec<u8>>,
}

/// Condição de igualdade exata sobre um atributo de evento
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCondition {
    pub event: String,
    pub attribute: String,
    pub value: String,
}

/// Filtro de busca por eventos: conjunção de condições exatas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub conditions: Vec<EventCondition>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, event: &str, attribute: &str, value: impl Into<String>) -> Self {
        self.conditions.push(EventCondition {
            event: event.to_string(),
            attribute: attribute.to_string(),
            value: value.into(),
        });
        self
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|c| format!("{}.{}='{}'", c.event, c.attribute, c.value))
            .collect();
        write!(f, "{}", parts.join(" AND "))
    }
}

/// Pedido de submissão de transação assinada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TxRequest {
    /// Transferência IBC da cadeia de origem para a de destino
    IbcTransfer {
        from_key: String,
        to_address: String,
        src_port: String,
        src_channel: String,
        amount: u128,
        denom: String,
    },
    /// Envio bancário local na mesma cadeia
    BankSend {
        from_key: String,
        to_address: String,
        amount: u128,
        denom: String,
    },
}

/// Resultado estruturado de um pedido de relay.
///
/// `AlreadyRelayed` e `NothingToRelay` são desfechos tolerados: o pacote
/// pode ter sido entregue por outro relayer em execução.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayOutcome {
    Relayed,
    AlreadyRelayed,
    NothingToRelay,
}

impl fmt::Display for RelayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayOutcome::Relayed => write!(f, "relayed"),
            RelayOutcome::AlreadyRelayed => write!(f, "already_relayed"),
            RelayOutcome::NothingToRelay => write!(f, "nothing_to_relay"),
        }
    }
}

/// Disciplina de entrega de um canal IBC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelOrder {
    Ordered,
    Unordered,
}

/// Severidade de um desfecho observado
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}
