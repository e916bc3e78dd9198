/*!
 * Relayrace Gateway
 *
 * Implementações dos colaboradores externos sobre os binários de linha de
 * comando: o cliente do node (`simd`) e o relayer (`rly`). A saída JSON dos
 * comandos é convertida para os tipos de `relayrace-core`; diagnósticos de
 * texto livre do relayer são mapeados para a enumeração fechada
 * `RelayOutcome` em um único lugar.
 */

pub mod cli;
pub mod config;
pub mod node;
pub mod parse;
pub mod relayer;

pub use config::{ChainCliConfig, ProbeConfig, RelayerCliConfig};
pub use node::NodeCli;
pub use relayer::RelayerCli;
