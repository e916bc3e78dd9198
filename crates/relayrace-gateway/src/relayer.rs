//! Disparo de relay sobre o binário do relayer.
//!
//! O relayer reporta desfechos não-fatais como texto livre no stderr. O
//! conhecimento desses diagnósticos vive aqui, atrás da enumeração fechada
//! `RelayOutcome`; nenhum outro componente da workspace casa substrings.

use crate::cli::{run_command, CliError};
use crate::config::RelayerCliConfig;
use async_trait::async_trait;
use relayrace_core::traits::RelayTrigger;
use relayrace_core::types::RelayOutcome;
use relayrace_core::{Error, Result};
use tracing::{debug, warn};

/// Marcadores conhecidos de stderr e o desfecho estruturado de cada um
const STDERR_OUTCOMES: &[(&str, RelayOutcome)] = &[
    ("already relayed", RelayOutcome::AlreadyRelayed),
    ("result does not exist", RelayOutcome::AlreadyRelayed),
    ("no packets to relay found", RelayOutcome::NothingToRelay),
    ("0/0 packets relayed", RelayOutcome::NothingToRelay),
    // Cliente de luz expirado: o relay não produziu efeito nesta chamada
    (
        "light client state is not within trust period",
        RelayOutcome::NothingToRelay,
    ),
];

/// Classifica o stderr do relayer em um desfecho estruturado, quando o
/// texto corresponde a um marcador conhecido.
pub fn classify_relayer_stderr(stderr: &str) -> Option<RelayOutcome> {
    let lower = stderr.to_lowercase();
    STDERR_OUTCOMES
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, outcome)| *outcome)
}

/// Implementação de `RelayTrigger` que invoca o relayer via CLI.
pub struct RelayerCli {
    cfg: RelayerCliConfig,
}

impl RelayerCli {
    pub fn new(cfg: RelayerCliConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl RelayTrigger for RelayerCli {
    async fn relay_packet(
        &self,
        path: &str,
        src_channel: &str,
        sequence: u64,
    ) -> Result<RelayOutcome> {
        let args = vec![
            "tx".to_string(),
            "flush".to_string(),
            path.to_string(),
            src_channel.to_string(),
            "--home".to_string(),
            self.cfg.config_home.clone(),
        ];

        match run_command(true, &self.cfg.binary, &args).await {
            Ok(out) => {
                if let Some(outcome) = classify_relayer_stderr(&out.stderr) {
                    debug!(path, src_channel, sequence, %outcome, "relay sem efeito");
                    return Ok(outcome);
                }
                debug!(path, src_channel, sequence, "comando de relay executado");
                Ok(RelayOutcome::Relayed)
            }
            Err(CliError::NonZero { stderr, .. }) => {
                if let Some(outcome) = classify_relayer_stderr(&stderr) {
                    warn!(path, src_channel, sequence, %outcome, %stderr,
                        "relayer terminou com erro não-crítico");
                    return Ok(outcome);
                }
                Err(Error::GatewayError(format!(
                    "relay do pacote (path {}, canal {}, seq {}): {}",
                    path, src_channel, sequence, stderr
                )))
            }
            Err(e) => Err(Error::GatewayError(format!(
                "relay do pacote (path {}, canal {}, seq {}): {}",
                path, src_channel, sequence, e
            ))),
        }
    }
}
