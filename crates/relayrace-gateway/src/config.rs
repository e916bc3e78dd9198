//! Configuração imutável dos adaptadores CLI, construída uma única vez no
//! início do processo e passada por referência. Nenhum estado global.

use relayrace_core::{Error, Result};
use std::env;

/// Parâmetros de invocação do cliente do node para uma cadeia
#[derive(Debug, Clone)]
pub struct ChainCliConfig {
    pub chain_id: String,
    pub rpc_endpoint: String,
    pub home: String,
    pub keyring_backend: String,
    pub fees: String,
    pub gas_flags: Vec<String>,
    pub binary: String,
}

impl ChainCliConfig {
    pub fn new(chain_id: impl Into<String>, rpc_endpoint: impl Into<String>, home: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            rpc_endpoint: rpc_endpoint.into(),
            home: home.into(),
            keyring_backend: "test".to_string(),
            fees: "1000stake".to_string(),
            gas_flags: vec!["--gas=auto".to_string(), "--gas-adjustment=1.2".to_string()],
            binary: "simd".to_string(),
        }
    }
}

/// Parâmetros de invocação do relayer
#[derive(Debug, Clone)]
pub struct RelayerCliConfig {
    pub binary: String,
    pub config_home: String,
}

impl RelayerCliConfig {
    pub fn new(config_home: impl Into<String>) -> Self {
        Self {
            binary: "rly".to_string(),
            config_home: config_home.into(),
        }
    }
}

/// Configuração completa do processo: duas cadeias e um relayer.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub chain_a: ChainCliConfig,
    pub chain_b: ChainCliConfig,
    pub relayer: RelayerCliConfig,
}

impl ProbeConfig {
    /// Carrega a configuração das variáveis de ambiente definidas pelo
    /// Makefile do ambiente de testes. Identificadores obrigatórios
    /// ausentes são erro fatal de configuração, validado eagerly aqui.
    pub fn from_env() -> Result<Self> {
        let required = [
            "CHAIN_A_ID_ENV",
            "CHAIN_A_RPC_ENV",
            "CHAIN_A_HOME_ENV",
            "CHAIN_B_ID_ENV",
            "CHAIN_B_RPC_ENV",
            "CHAIN_B_HOME_ENV",
            "RLY_CONFIG_FILE_ENV",
        ];

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| env::var(key).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(Error::ConfigError(format!(
                "variáveis de ambiente obrigatórias ausentes: {}",
                missing.join(", ")
            )));
        }

        let var = |key: &str| env::var(key).unwrap_or_default();

        let mut chain_a = ChainCliConfig::new(
            var("CHAIN_A_ID_ENV"),
            var("CHAIN_A_RPC_ENV"),
            var("CHAIN_A_HOME_ENV"),
        );
        let mut chain_b = ChainCliConfig::new(
            var("CHAIN_B_ID_ENV"),
            var("CHAIN_B_RPC_ENV"),
            var("CHAIN_B_HOME_ENV"),
        );
        let mut relayer = RelayerCliConfig::new(expand_home(&var("RLY_CONFIG_FILE_ENV")));

        // Binários podem ser sobrescritos; os padrões valem se ausentes
        if let Ok(simd) = env::var("SIMD_BINARY_ENV") {
            if !simd.is_empty() {
                chain_a.binary = simd.clone();
                chain_b.binary = simd;
            }
        }
        if let Ok(rly) = env::var("RLY_BINARY_ENV") {
            if !rly.is_empty() {
                relayer.binary = rly;
            }
        }

        Ok(Self { chain_a, chain_b, relayer })
    }
}

/// Expande um prefixo `~/` para o diretório home do usuário
fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), rest);
        }
    }
    path.to_string()
}
