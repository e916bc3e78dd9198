//! Verificador de ordenação: compara posições de sequenciamento de duas
//! transações e checa preservação de ordem de entrega em canais ordenados.

use relayrace_core::types::{BlockRecord, Placement};
use relayrace_core::utils::tx_content_hash;
use relayrace_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ordem relativa dentro de um mesmo bloco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativeOrder {
    Before,
    After,
}

/// Classificação da ordem relativa de duas transações
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOrdering {
    /// `a` em bloco estritamente anterior ao de `b`
    Before,
    /// `a` em bloco estritamente posterior ao de `b`
    After,
    /// Mesmo bloco, com índices intra-bloco conhecidos dos dois lados
    SameBlockOrdered(RelativeOrder),
    /// Mesmo bloco e pelo menos um índice desconhecido. Nunca é forçado
    /// para antes/depois: ordem desconhecida não é sucesso de front-run.
    SameBlockInconclusive,
}

/// Compara duas posições de sequenciamento.
///
/// Comparar uma posição com ela mesma é entrada degenerada e é rejeitada;
/// para posições distintas o resultado é antissimétrico.
pub fn compare(a: &Placement, b: &Placement) -> Result<TxOrdering> {
    if a == b {
        return Err(Error::ValidationError(
            "comparação exige posições de sequenciamento distintas".to_string(),
        ));
    }

    if a.height < b.height {
        return Ok(TxOrdering::Before);
    }
    if a.height > b.height {
        return Ok(TxOrdering::After);
    }

    match (a.index, b.index) {
        (Some(ia), Some(ib)) if ia < ib => Ok(TxOrdering::SameBlockOrdered(RelativeOrder::Before)),
        (Some(_), Some(_)) => Ok(TxOrdering::SameBlockOrdered(RelativeOrder::After)),
        _ => Ok(TxOrdering::SameBlockInconclusive),
    }
}

/// Localiza a posição de uma transação dentro de um bloco recomputando o
/// hash canônico de conteúdo de cada transação crua. É o único desempate
/// possível para transações no mesmo bloco.
pub fn resolve_intra_block_index(block: &BlockRecord, tx_hash: &str) -> Option<usize> {
    let wanted = tx_hash.to_uppercase();
    block
        .txs
        .iter()
        .position(|bytes| tx_content_hash(bytes) == wanted)
}

/// Par adjacente que violou a ordem de entrega
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceViolation {
    /// Índice (em ordem de envio) do primeiro pacote do par
    pub position: usize,
    pub earlier: Placement,
    pub later: Placement,
}

/// Resultado da checagem de preservação de sequência
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCheck {
    pub preserved: bool,
    pub violations: Vec<SequenceViolation>,
}

/// Verifica que as posições de recebimento, tomadas em ordem de envio, são
/// não-decrescentes par a par. Um decréscimo em canal ordenado é sinal de
/// violação de protocolo, reportado com severidade própria pelo chamador.
pub fn check_sequence_preserved(recv_placements: &[Placement]) -> SequenceCheck {
    let mut violations = Vec::new();

    for (i, pair) in recv_placements.windows(2).enumerate() {
        let (earlier, later) = (pair[0], pair[1]);
        let violated = if later.height < earlier.height {
            true
        } else if later.height == earlier.height {
            // Mesmo bloco: só é violação com os dois índices conhecidos
            matches!((earlier.index, later.index), (Some(a), Some(b)) if b < a)
        } else {
            false
        };
        if violated {
            violations.push(SequenceViolation { position: i, earlier, later });
        }
    }

    SequenceCheck {
        preserved: violations.is_empty(),
        violations,
    }
}
