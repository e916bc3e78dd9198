//! Veredito agregado de uma execução de cenário.

use crate::ordering::{RelativeOrder, TxOrdering};
use relayrace_core::types::{RelayOutcome, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classificação final da ordem entre a transação do atacante e o
/// recebimento da mensagem da vítima.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingVerdict {
    /// Atacante sequenciado em bloco anterior
    Before,
    /// Atacante sequenciado em bloco posterior
    After,
    /// Mesmo bloco, ordem intra-bloco resolvida pelos índices
    SameBlockOrdered(RelativeOrder),
    /// Mesmo bloco, ordem intra-bloco irresolvível
    SameBlockInconclusive,
    /// Alguma das duas posições não pôde ser observada
    Unknown,
}

impl From<TxOrdering> for OrderingVerdict {
    fn from(ordering: TxOrdering) -> Self {
        match ordering {
            TxOrdering::Before => OrderingVerdict::Before,
            TxOrdering::After => OrderingVerdict::After,
            TxOrdering::SameBlockOrdered(rel) => OrderingVerdict::SameBlockOrdered(rel),
            TxOrdering::SameBlockInconclusive => OrderingVerdict::SameBlockInconclusive,
        }
    }
}

impl fmt::Display for OrderingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingVerdict::Before => write!(f, "before"),
            OrderingVerdict::After => write!(f, "after"),
            OrderingVerdict::SameBlockOrdered(RelativeOrder::Before) => {
                write!(f, "same_block_ordered(before)")
            }
            OrderingVerdict::SameBlockOrdered(RelativeOrder::After) => {
                write!(f, "same_block_ordered(after)")
            }
            OrderingVerdict::SameBlockInconclusive => write!(f, "same_block_inconclusive"),
            OrderingVerdict::Unknown => write!(f, "unknown"),
        }
    }
}

impl OrderingVerdict {
    /// Indica se o veredito mostra o atacante efetivado antes da vítima
    pub fn attacker_first(&self) -> bool {
        matches!(
            self,
            OrderingVerdict::Before | OrderingVerdict::SameBlockOrdered(RelativeOrder::Before)
        )
    }
}

/// Desfecho agregado de uma execução; criado uma vez ao final, imutável.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioVerdict {
    pub scenario: String,
    pub ordering: OrderingVerdict,
    /// Lucro/prejuízo simulado no denom negociado, quando a perna AMM roda
    pub profit: Option<i128>,
    /// Preservação da ordem de entrega nos cenários multi-pacote
    pub sequence_respected: Option<bool>,
    pub severity: Severity,
    /// Desfecho do pedido de relay, quando observado dentro da janela
    pub relay: Option<RelayOutcome>,
}
