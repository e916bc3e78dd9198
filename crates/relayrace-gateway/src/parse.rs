//! Estruturas serde para as respostas JSON do cliente do node e conversão
//! para os tipos de `relayrace-core`. As alturas chegam como strings
//! decimais e as transações de bloco como base64.

use base64::Engine;
use chrono::{DateTime, Utc};
use relayrace_core::types::{BlockRecord, TxEvent, TxRecord};
use relayrace_core::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RawAttribute {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
pub struct RawLogEntry {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
pub struct RawTxResponse {
    #[serde(default)]
    pub height: String,
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub logs: Vec<RawLogEntry>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub txs: Vec<RawTxResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RawCoin {
    pub denom: String,
    #[serde(default)]
    pub amount: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawBalances {
    #[serde(default)]
    pub balances: Vec<RawCoin>,
}

#[derive(Debug, Deserialize)]
pub struct RawBlockHeader {
    pub height: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawBlockData {
    #[serde(default)]
    pub txs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawBlock {
    pub header: RawBlockHeader,
    #[serde(default)]
    pub data: RawBlockData,
}

#[derive(Debug, Deserialize)]
pub struct RawBlockResponse {
    pub block: RawBlock,
}

fn convert_events(raw: Vec<RawEvent>) -> Vec<TxEvent> {
    raw.into_iter()
        .map(|e| TxEvent {
            kind: e.kind,
            attributes: e.attributes.into_iter().map(|a| (a.key, a.value)).collect(),
        })
        .collect()
}

/// Converte uma resposta de transação em `TxRecord`. Altura vazia ou igual
/// a "0" é tratada como ainda não indexada.
pub fn tx_record(raw: RawTxResponse) -> Result<TxRecord> {
    let height = match raw.height.trim() {
        "" | "0" => None,
        h => Some(h.parse::<u64>().map_err(|e| {
            Error::DecodeError(format!("altura inválida '{}': {}", raw.height, e))
        })?),
    };

    let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
        .ok()
        .map(|t| t.with_timezone(&Utc));

    let events: Vec<TxEvent> = raw
        .logs
        .into_iter()
        .flat_map(|entry| convert_events(entry.events))
        .collect();

    Ok(TxRecord {
        hash: raw.txhash,
        code: raw.code,
        height,
        events,
        extra_events: convert_events(raw.events),
        raw_log: raw.raw_log,
        timestamp,
    })
}

pub fn parse_tx_response(json: &str) -> Result<TxRecord> {
    let raw: RawTxResponse = serde_json::from_str(json)
        .map_err(|e| Error::DecodeError(format!("resposta de transação inválida: {}", e)))?;
    if raw.txhash.is_empty() {
        return Err(Error::NotFound("transação sem hash na resposta".to_string()));
    }
    tx_record(raw)
}

pub fn parse_search_result(json: &str) -> Result<Vec<TxRecord>> {
    let raw: RawSearchResult = serde_json::from_str(json)
        .map_err(|e| Error::DecodeError(format!("resultado de busca inválido: {}", e)))?;
    raw.txs.into_iter().map(tx_record).collect()
}

/// Converte a resposta de bloco, decodificando cada transação de base64
/// para bytes crus.
pub fn parse_block_response(json: &str) -> Result<BlockRecord> {
    let raw: RawBlockResponse = serde_json::from_str(json)
        .map_err(|e| Error::DecodeError(format!("resposta de bloco inválida: {}", e)))?;

    let height = raw.block.header.height.parse::<u64>().map_err(|e| {
        Error::DecodeError(format!(
            "altura de bloco inválida '{}': {}",
            raw.block.header.height, e
        ))
    })?;

    let engine = base64::engine::general_purpose::STANDARD;
    let txs = raw
        .block
        .data
        .txs
        .into_iter()
        .map(|b64| {
            engine
                .decode(&b64)
                .map_err(|e| Error::DecodeError(format!("transação base64 inválida no bloco: {}", e)))
        })
        .collect::<Result<Vec<Vec<u8>>>>()?;

    Ok(BlockRecord { height, txs })
}

/// Extrai o saldo de um denom da resposta de `query bank balances`.
/// Denom ausente ou montante vazio valem 0.
pub fn parse_balance(json: &str, denom: &str) -> Result<u128> {
    if json.trim().is_empty() || json.trim() == "{}" {
        return Ok(0);
    }
    let raw: RawBalances = serde_json::from_str(json)
        .map_err(|e| Error::DecodeError(format!("resposta de saldo inválida: {}", e)))?;

    for coin in raw.balances {
        if coin.denom == denom {
            if coin.amount.is_empty() {
                return Ok(0);
            }
            return coin.amount.parse::<u128>().map_err(|e| {
                Error::DecodeError(format!("montante inválido '{}': {}", coin.amount, e))
            });
        }
    }
    Ok(0)
}
