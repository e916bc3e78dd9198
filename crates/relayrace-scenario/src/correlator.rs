//! Correlação de pacotes entre cadeias a partir de atributos de eventos:
//! extrai a identidade de um pacote do evento `send_packet` da transação
//! de envio e localiza a transação `recv_packet` correspondente no destino.
//!
//! As duas operações são consultas puras e cada chamada é uma única
//! tentativa; retry e backoff ficam com o chamador.

use relayrace_core::traits::ChainGateway;
use relayrace_core::types::{EventFilter, PacketIdentity, TxEvent, TxRecord};
use relayrace_core::{Error, Result};
use tracing::{debug, warn};

const SEND_EVENT: &str = "send_packet";
const RECV_EVENT: &str = "recv_packet";

const ATTR_SRC_PORT: &str = "packet_src_port";
const ATTR_SRC_CHANNEL: &str = "packet_src_channel";
const ATTR_DST_PORT: &str = "packet_dst_port";
const ATTR_DST_CHANNEL: &str = "packet_dst_channel";
const ATTR_SEQUENCE: &str = "packet_sequence";

/// Procura em uma lista de eventos um `send_packet` cujos atributos de
/// porta e canal casem exatamente com os esperados.
fn match_send_event(events: &[TxEvent], port: &str, channel: &str) -> Option<u64> {
    for event in events.iter().filter(|e| e.kind == SEND_EVENT) {
        let src_port = event.attr(ATTR_SRC_PORT).unwrap_or_default();
        let src_channel = event.attr(ATTR_SRC_CHANNEL).unwrap_or_default();
        let sequence = event.attr(ATTR_SEQUENCE).unwrap_or_default();

        // Nunca casar sequência coincidente de outro canal
        if src_port == port && src_channel == channel && !sequence.is_empty() {
            if let Ok(seq) = sequence.parse::<u64>() {
                return Some(seq);
            }
        }
    }
    None
}

/// Extrai a identidade do pacote enviado por uma transação aceita.
///
/// Varre os eventos das entradas de log e, quando essa lista está vazia,
/// recorre aos eventos de nível superior (clientes mais novos os expõem
/// ali). Falha com `NotFound` quando a transação foi rejeitada
/// (`code != 0`), quando nenhum evento casa com porta e canal esperados ou
/// quando o atributo de sequência está vazio.
pub fn extract_sent_packet(
    tx: &TxRecord,
    expected_port: &str,
    expected_channel: &str,
) -> Result<PacketIdentity> {
    if !tx.accepted() {
        return Err(Error::NotFound(format!(
            "transação {} rejeitada (code {}); sem eventos válidos para correlação",
            tx.hash, tx.code
        )));
    }

    let sequence = match_send_event(&tx.events, expected_port, expected_channel).or_else(|| {
        if tx.events.is_empty() {
            match_send_event(&tx.extra_events, expected_port, expected_channel)
        } else {
            None
        }
    });

    match sequence {
        Some(sequence) => {
            let identity = PacketIdentity {
                port: expected_port.to_string(),
                channel: expected_channel.to_string(),
                sequence,
            };
            debug!(tx = %tx.hash, packet = %identity, "pacote enviado observado");
            Ok(identity)
        }
        None => Err(Error::NotFound(format!(
            "nenhum evento send_packet para porta {} e canal {} na transação {}",
            expected_port, expected_channel, tx.hash
        ))),
    }
}

/// Verifica que os próprios eventos do candidato contêm o tripleto exato
fn recv_events_match(tx: &TxRecord, port: &str, channel: &str, sequence: &str) -> bool {
    let check = |events: &[TxEvent]| {
        events.iter().filter(|e| e.kind == RECV_EVENT).any(|event| {
            event.attr(ATTR_DST_PORT) == Some(port)
                && event.attr(ATTR_DST_CHANNEL) == Some(channel)
                && event.attr(ATTR_SEQUENCE) == Some(sequence)
        })
    };
    check(&tx.events) || check(&tx.extra_events)
}

/// Localiza a transação de recebimento de um pacote no destino.
///
/// A busca indexada casa o tripleto (porta destino, canal destino,
/// sequência); como o índice pode casar apenas um subconjunto dos campos,
/// todo candidato é revalidado contra seus próprios eventos antes de ser
/// retornado. `NotFound` quando não há candidato ou quando a revalidação
/// falha para todos.
pub async fn find_received_packet(
    gateway: &dyn ChainGateway,
    dst_port: &str,
    dst_channel: &str,
    sequence: u64,
) -> Result<TxRecord> {
    let sequence_str = sequence.to_string();
    let filter = EventFilter::new()
        .matching(RECV_EVENT, ATTR_DST_PORT, dst_port)
        .matching(RECV_EVENT, ATTR_DST_CHANNEL, dst_channel)
        .matching(RECV_EVENT, ATTR_SEQUENCE, sequence_str.clone());

    let candidates = gateway.query_txs_by_event(&filter).await?;
    if candidates.len() > 1 {
        // Uma identidade designa no máximo um recebimento; mais de um
        // candidato indica índice impreciso
        warn!(dst_port, dst_channel, sequence, n = candidates.len(),
            "busca retornou múltiplos candidatos a recv_packet");
    }

    for candidate in candidates {
        if candidate.accepted()
            && recv_events_match(&candidate, dst_port, dst_channel, &sequence_str)
        {
            debug!(tx = %candidate.hash, dst_port, dst_channel, sequence,
                "recv_packet validado");
            return Ok(candidate);
        }
        warn!(tx = %candidate.hash, dst_port, dst_channel, sequence,
            "candidato descartado na revalidação de atributos");
    }

    Err(Error::NotFound(format!(
        "nenhuma transação recv_packet validada para porta {}, canal {}, sequência {}",
        dst_port, dst_channel, sequence
    )))
}
