//! Gateway de cadeia sobre o binário do cliente do node.

use crate::cli::{run_command, CliError};
use crate::config::ChainCliConfig;
use crate::parse;
use async_trait::async_trait;
use relayrace_core::traits::ChainGateway;
use relayrace_core::types::{BlockRecord, EventFilter, TxRecord, TxRequest};
use relayrace_core::{Error, Result};
use tracing::debug;

/// Implementação de `ChainGateway` que invoca o cliente do node via CLI
/// com saída JSON.
pub struct NodeCli {
    cfg: ChainCliConfig,
}

impl NodeCli {
    pub fn new(cfg: ChainCliConfig) -> Self {
        Self { cfg }
    }

    pub fn chain_id(&self) -> &str {
        &self.cfg.chain_id
    }

    /// Resolve o endereço de uma chave do keyring local.
    /// `keys show` opera sobre o keystore local; não recebe node/chain-id.
    pub async fn key_address(&self, key_name: &str) -> Result<String> {
        let args = vec![
            "keys".to_string(),
            "show".to_string(),
            key_name.to_string(),
            "-a".to_string(),
            "--keyring-backend".to_string(),
            self.cfg.keyring_backend.clone(),
            "--home".to_string(),
            self.cfg.home.clone(),
        ];
        let out = run_command(false, &self.cfg.binary, &args)
            .await
            .map_err(|e| {
                Error::GatewayError(format!("resolução de endereço da chave '{}': {}", key_name, e))
            })?;
        Ok(out.stdout.trim().to_string())
    }

    fn tx_flags(&self, from_key: &str) -> Vec<String> {
        let mut flags = vec![
            "--from".to_string(),
            from_key.to_string(),
            "--chain-id".to_string(),
            self.cfg.chain_id.clone(),
            "--node".to_string(),
            self.cfg.rpc_endpoint.clone(),
            "--home".to_string(),
            self.cfg.home.clone(),
            "--keyring-backend".to_string(),
            self.cfg.keyring_backend.clone(),
            "--fees".to_string(),
            self.cfg.fees.clone(),
            "-y".to_string(),
            "-o".to_string(),
            "json".to_string(),
        ];
        flags.extend(self.cfg.gas_flags.iter().cloned());
        flags
    }

    fn query_flags(&self) -> Vec<String> {
        vec![
            "--chain-id".to_string(),
            self.cfg.chain_id.clone(),
            "--node".to_string(),
            self.cfg.rpc_endpoint.clone(),
            "-o".to_string(),
            "json".to_string(),
        ]
    }
}

#[async_trait]
impl ChainGateway for NodeCli {
    async fn submit(&self, request: TxRequest) -> Result<TxRecord> {
        let (mut args, from_key) = match &request {
            TxRequest::IbcTransfer {
                from_key,
                to_address,
                src_port,
                src_channel,
                amount,
                denom,
            } => (
                vec![
                    "tx".to_string(),
                    "ibc-transfer".to_string(),
                    "transfer".to_string(),
                    src_port.clone(),
                    src_channel.clone(),
                    to_address.clone(),
                    format!("{}{}", amount, denom),
                ],
                from_key.clone(),
            ),
            TxRequest::BankSend {
                from_key,
                to_address,
                amount,
                denom,
            } => (
                vec![
                    "tx".to_string(),
                    "bank".to_string(),
                    "send".to_string(),
                    from_key.clone(),
                    to_address.clone(),
                    format!("{}{}", amount, denom),
                ],
                from_key.clone(),
            ),
        };
        args.extend(self.tx_flags(&from_key));

        let out = run_command(true, &self.cfg.binary, &args)
            .await
            .map_err(|e| {
                Error::GatewayError(format!("submissão em {}: {}", self.cfg.chain_id, e))
            })?;

        let record = parse::parse_tx_response(&out.stdout)?;
        debug!(chain = %self.cfg.chain_id, hash = %record.hash, code = record.code, "transação submetida");
        Ok(record)
    }

    async fn query_tx(&self, hash: &str) -> Result<TxRecord> {
        let mut args = vec!["query".to_string(), "tx".to_string(), hash.to_string()];
        args.extend(self.query_flags());

        let out = match run_command(false, &self.cfg.binary, &args).await {
            Ok(out) => out,
            // O node responde com status != 0 enquanto a tx não está indexada
            Err(CliError::NonZero { stderr, .. }) if stderr.contains("not found") => {
                return Err(Error::NotFound(format!(
                    "transação {} ainda não indexada em {}",
                    hash, self.cfg.chain_id
                )));
            }
            Err(e) => {
                return Err(Error::GatewayError(format!(
                    "consulta da transação {} em {}: {}",
                    hash, self.cfg.chain_id, e
                )));
            }
        };

        parse::parse_tx_response(&out.stdout)
    }

    async fn query_txs_by_event(&self, filter: &EventFilter) -> Result<Vec<TxRecord>> {
        let mut args = vec![
            "query".to_string(),
            "txs".to_string(),
            "--query".to_string(),
            filter.to_string(),
            "--limit".to_string(),
            "1".to_string(),
            "--order_by".to_string(),
            "asc".to_string(),
        ];
        args.extend(self.query_flags());

        let out = run_command(false, &self.cfg.binary, &args)
            .await
            .map_err(|e| {
                Error::GatewayError(format!(
                    "busca por eventos [{}] em {}: {}",
                    filter, self.cfg.chain_id, e
                ))
            })?;

        parse::parse_search_result(&out.stdout)
    }

    async fn query_block(&self, height: u64) -> Result<BlockRecord> {
        let mut args = vec![
            "query".to_string(),
            "block".to_string(),
            height.to_string(),
        ];
        args.extend(self.query_flags());

        let out = run_command(false, &self.cfg.binary, &args)
            .await
            .map_err(|e| {
                Error::GatewayError(format!(
                    "consulta do bloco {} em {}: {}",
                    height, self.cfg.chain_id, e
                ))
            })?;

        parse::parse_block_response(&out.stdout)
    }

    async fn query_balance(&self, address: &str, denom: &str) -> Result<u128> {
        let mut args = vec![
            "query".to_string(),
            "bank".to_string(),
            "balances".to_string(),
            address.to_string(),
        ];
        args.extend(self.query_flags());

        match run_command(false, &self.cfg.binary, &args).await {
            Ok(out) => parse::parse_balance(&out.stdout, denom),
            // Conta inexistente equivale a saldo zero, não a erro
            Err(CliError::NonZero { stderr, stdout, .. })
                if stderr.contains("not found") || stderr.contains("no balance") =>
            {
                debug!(address, denom, %stdout, "conta sem saldo para o denom");
                Ok(0)
            }
            Err(e) => Err(Error::GatewayError(format!(
                "consulta de saldo de {} ({}) em {}: {}",
                address, denom, self.cfg.chain_id, e
            ))),
        }
    }
}
