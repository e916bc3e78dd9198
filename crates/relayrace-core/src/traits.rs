/*!
 * Relayrace Traits
 *
 * Capacidades externas consumidas pela workspace: consulta/submissão em um
 * node de blockchain e disparo de relay de pacotes IBC
 */

use crate::error::Result;
use crate::types::{BlockRecord, EventFilter, RelayOutcome, TxRecord, TxRequest};
use async_trait::async_trait;

/// Gateway de consulta e submissão contra um node de uma cadeia.
///
/// Todas as operações de consulta são puras: não alteram estado on-chain e
/// podem ser repetidas pelo chamador. Retry e backoff são responsabilidade
/// de quem chama.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Submete uma transação assinada; retorna assim que o node a aceita ou
    /// rejeita na admissão, com pelo menos {hash, code, height?, eventos}
    async fn submit(&self, request: TxRequest) -> Result<TxRecord>;

    /// Consulta uma transação pelo hash; `NotFound` enquanto não indexada
    async fn query_tx(&self, hash: &str) -> Result<TxRecord>;

    /// Busca transações por filtro de eventos (igualdade exata, conjunção)
    async fn query_txs_by_event(&self, filter: &EventFilter) -> Result<Vec<TxRecord>>;

    /// Obtém um bloco pela altura, com os bytes crus de cada transação
    async fn query_block(&self, height: u64) -> Result<BlockRecord>;

    /// Saldo de um endereço para um denom; denom ausente vale 0, não erro
    async fn query_balance(&self, address: &str, denom: &str) -> Result<u128>;
}

/// Disparo de relay de um pacote pendente para a cadeia de destino.
///
/// Idempotente do ponto de vista do chamador: pedir relay de um pacote já
/// entregue não é falha dura, é `AlreadyRelayed` ou `NothingToRelay`.
#[async_trait]
pub trait RelayTrigger: Send + Sync {
    async fn relay_packet(&self, path: &str, src_channel: &str, sequence: u64)
        -> Result<RelayOutcome>;
}
