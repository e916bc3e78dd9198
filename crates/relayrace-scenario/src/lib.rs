/*!
 * Relayrace Scenario
 *
 * Núcleo da sondagem de front-running entre cadeias: correlação de pacotes
 * IBC (envio em A, recebimento em B), verificação de ordenação de
 * transações e simulação de mercado por produto constante, orquestradas
 * por uma máquina de estados única parametrizada por descritor de cenário.
 */

pub mod correlator;
pub mod ordering;
pub mod orchestrator;
pub mod pool;
pub mod scenario;
pub mod verdict;

pub use correlator::{extract_sent_packet, find_received_packet};
pub use ordering::{check_sequence_preserved, compare, resolve_intra_block_index, RelativeOrder, SequenceCheck, TxOrdering};
pub use orchestrator::Orchestrator;
pub use pool::{price_impact, quote_swap, Pool, SwapDirection};
pub use scenario::{AmmLeg, ChannelVariant, PollBudget, Roles, ScenarioDescriptor};
pub use verdict::{OrderingVerdict, ScenarioVerdict};
