//! Orquestrador de cenários: máquina de estados linear que sequencia a
//! ação da vítima, a ação do atacante, o disparo de relay e a verificação
//! de ordenação, produzindo um `ScenarioVerdict`.
//!
//! Falhas que deixam a identidade do pacote ou a transação da vítima
//! desconhecidas abortam a execução; falhas puramente de observação viram
//! vereditos inconclusivos, nunca sucesso ou fracasso silencioso.

use crate::correlator::{extract_sent_packet, find_received_packet};
use crate::ordering::{compare, resolve_intra_block_index};
use crate::pool::{price_impact, Pool, SwapDirection};
use crate::scenario::{AmmLeg, PollBudget, ScenarioDescriptor};
use crate::verdict::{OrderingVerdict, ScenarioVerdict};
use crate::{check_sequence_preserved, ordering::TxOrdering};
use relayrace_core::traits::{ChainGateway, RelayTrigger};
use relayrace_core::types::{ChannelOrder, PacketIdentity, Placement, RelayOutcome, Severity, TxRecord, TxRequest};
use relayrace_core::{Error, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Estados da execução de um cenário
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    VictimSubmitted,
    PacketObserved,
    AttackerAction,
    RelayTriggered,
    OutcomeObserved,
    Verdict,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Init => "init",
            State::VictimSubmitted => "victim_submitted",
            State::PacketObserved => "packet_observed",
            State::AttackerAction => "attacker_action",
            State::RelayTriggered => "relay_triggered",
            State::OutcomeObserved => "outcome_observed",
            State::Verdict => "verdict",
        };
        write!(f, "{}", name)
    }
}

/// Polling limitado: repete a operação enquanto ela responder `NotFound`,
/// até esgotar o orçamento de tentativas. Outros erros propagam direto.
async fn poll_until<T, F, Fut>(budget: &PollBudget, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last = Error::NotFound(format!("{}: orçamento de tentativas vazio", what));
    for attempt in 1..=budget.attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(Error::NotFound(msg)) => {
                debug!(what, attempt, max = budget.attempts, "ainda não disponível");
                last = Error::NotFound(msg);
            }
            Err(e) => return Err(e),
        }
        if attempt < budget.attempts {
            tokio::time::sleep(budget.backoff).await;
        }
    }
    Err(last)
}

/// Pernas simuladas do sanduíche na pool de produto constante.
/// X é o denom transferido pela vítima; Y é a contrapartida.
struct AmmRun {
    pool: Pool,
    buy_input: u128,
    sell_input: u128,
    sold: Option<u128>,
}

impl AmmRun {
    fn new(leg: &AmmLeg) -> Result<Self> {
        let pool = Pool::new(leg.reserve_x, leg.reserve_y)?;
        info!(
            reserve_x = leg.reserve_x,
            reserve_y = leg.reserve_y,
            k = pool.k(),
            "pool de liquidez inicializada"
        );
        Ok(Self {
            pool,
            buy_input: leg.preemptive_buy,
            sell_input: leg.post_sell,
            sold: None,
        })
    }

    fn preemptive_buy(&mut self) -> Result<u128> {
        let impact = price_impact(self.buy_input, self.pool.reserve_x(), self.pool.reserve_y())?;
        let output = self.pool.apply_swap(SwapDirection::XForY, self.buy_input)?;
        info!(input = self.buy_input, output, impact, "compra preventiva simulada");
        Ok(output)
    }

    /// A vítima recebe a transferência e troca metade dela na pool,
    /// o trade que o atacante tenta antecipar.
    fn victim_swap(&mut self, transfer_amount: u128) -> Result<u128> {
        let amount = transfer_amount / 2;
        if amount == 0 {
            return Ok(0);
        }
        let output = self.pool.apply_swap(SwapDirection::XForY, amount)?;
        info!(input = amount, output, "trade da vítima simulado");
        Ok(output)
    }

    fn post_sell(&mut self) -> Result<u128> {
        let impact = price_impact(self.sell_input, self.pool.reserve_y(), self.pool.reserve_x())?;
        let output = self.pool.apply_swap(SwapDirection::YForX, self.sell_input)?;
        info!(input = self.sell_input, output, impact, "venda posterior simulada");
        self.sold = Some(output);
        Ok(output)
    }

    /// Lucro do ciclo X -> Y -> X: saída final menos entrada inicial
    fn profit(&self) -> Option<i128> {
        self.sold.map(|sold| sold as i128 - self.buy_input as i128)
    }
}

/// Orquestrador de uma execução de cenário sobre duas cadeias.
///
/// Execuções distintas devem rodar sequencialmente, nunca intercaladas,
/// para não contaminar estado de cadeia e índices de eventos.
pub struct Orchestrator {
    gateway_a: Arc<dyn ChainGateway>,
    gateway_b: Arc<dyn ChainGateway>,
    relayer: Arc<dyn RelayTrigger>,
    descriptor: ScenarioDescriptor,
}

impl Orchestrator {
    pub fn new(
        gateway_a: Arc<dyn ChainGateway>,
        gateway_b: Arc<dyn ChainGateway>,
        relayer: Arc<dyn RelayTrigger>,
        descriptor: ScenarioDescriptor,
    ) -> Self {
        Self {
            gateway_a,
            gateway_b,
            relayer,
            descriptor,
        }
    }

    fn transition(&self, from: State, to: State) {
        debug!(scenario = %self.descriptor.name, %from, %to, "transição de estado");
    }

    /// Executa o cenário do início ao fim e monta o veredito.
    pub async fn run(&self) -> Result<ScenarioVerdict> {
        let d = &self.descriptor;
        if d.packet_count == 0 {
            return Err(Error::ConfigError(
                "cenário exige pelo menos um pacote da vítima".to_string(),
            ));
        }
        info!(scenario = %d.name, packets = d.packet_count, race = d.race_relay, "iniciando cenário");

        let mut amm = d.amm.as_ref().map(AmmRun::new).transpose()?;

        // Saldo inicial do atacante no denom transferido, para reconciliação
        let balance_before = self
            .query_attacker_balance()
            .await
            .map_err(|e| {
                warn!(error = %e, "saldo inicial do atacante indisponível");
                e
            })
            .ok();

        // INIT -> VICTIM_SUBMITTED
        self.transition(State::Init, State::VictimSubmitted);
        let victim_txs = self.submit_victim_transfers().await?;

        // VICTIM_SUBMITTED -> PACKET_OBSERVED
        self.transition(State::VictimSubmitted, State::PacketObserved);
        let packets = self.observe_packets(&victim_txs).await?;
        let last = packets.len() - 1;

        // PACKET_OBSERVED -> ATTACKER_ACTION
        self.transition(State::PacketObserved, State::AttackerAction);
        // Na sonda multi-pacote os anteriores são entregues antes do ataque
        for packet in &packets[..last] {
            self.trigger_relay_tolerant(packet).await;
        }
        if let Some(run) = amm.as_mut() {
            run.preemptive_buy()?;
        }
        let (attacker_tx, mut last_relay, relay_issued) = self.attacker_action(&packets[last]).await?;

        // ATTACKER_ACTION -> RELAY_TRIGGERED
        self.transition(State::AttackerAction, State::RelayTriggered);
        if !relay_issued {
            last_relay = self.trigger_relay_tolerant(&packets[last]).await;
        }

        // RELAY_TRIGGERED -> OUTCOME_OBSERVED
        self.transition(State::RelayTriggered, State::OutcomeObserved);
        let recv_txs = self.observe_receives(&packets).await?;
        let attacker_final = self.observe_final_placement(&attacker_tx).await;

        // OUTCOME_OBSERVED -> VERDICT
        self.transition(State::OutcomeObserved, State::Verdict);
        let ordering = self
            .classify_ordering(attacker_final.as_ref(), recv_txs[last].as_ref())
            .await?;

        let mut severity = if ordering.attacker_first() {
            Severity::High
        } else {
            Severity::Low
        };

        let sequence_respected = if packets.len() > 1 {
            self.check_delivery_order(&recv_txs, &mut severity)
        } else {
            None
        };

        let mut profit = None;
        if let Some(run) = amm.as_mut() {
            if recv_txs[last].is_some() {
                run.victim_swap(d.transfer_amount)?;
                run.post_sell()?;
                profit = run.profit();
            } else {
                warn!("recebimento não observado; perna AMM não concluída");
            }
        }

        self.reconcile_balances(balance_before, profit).await;

        let verdict = ScenarioVerdict {
            scenario: d.name.clone(),
            ordering,
            profit,
            sequence_respected,
            severity,
            relay: last_relay,
        };
        info!(
            scenario = %d.name,
            ordering = %verdict.ordering,
            profit = ?verdict.profit,
            sequence_respected = ?verdict.sequence_respected,
            severity = ?verdict.severity,
            "cenário concluído"
        );
        Ok(verdict)
    }

    async fn submit_victim_transfers(&self) -> Result<Vec<TxRecord>> {
        let d = &self.descriptor;
        let mut records = Vec::with_capacity(d.packet_count);
        for i in 0..d.packet_count {
            let record = self
                .gateway_a
                .submit(TxRequest::IbcTransfer {
                    from_key: d.roles.victim_key.clone(),
                    to_address: d.roles.recipient_address.clone(),
                    src_port: d.channel.src_port.clone(),
                    src_channel: d.channel.src_channel.clone(),
                    amount: d.transfer_amount,
                    denom: d.transfer_denom.clone(),
                })
                .await?;
            if !record.accepted() {
                // Sem a transação da vítima o experimento não faz sentido
                return Err(Error::GatewayError(format!(
                    "transferência da vítima rejeitada (code {}): {}",
                    record.code, record.raw_log
                )));
            }
            info!(packet = i + 1, hash = %record.hash, "transferência da vítima submetida");
            records.push(record);
        }
        Ok(records)
    }

    async fn observe_packets(&self, victim_txs: &[TxRecord]) -> Result<Vec<PacketIdentity>> {
        let d = &self.descriptor;
        let mut packets = Vec::with_capacity(victim_txs.len());
        for record in victim_txs {
            let indexed = poll_until(&d.poll, "indexação da transação da vítima", || {
                self.gateway_a.query_tx(&record.hash)
            })
            .await?;
            // Identidade inextraível de uma transação aceita é fatal
            let packet =
                extract_sent_packet(&indexed, &d.channel.src_port, &d.channel.src_channel)?;
            info!(packet = %packet, tx = %record.hash, "pacote observado");
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Dispara o relay tolerando os desfechos não-fatais e falhas do
    /// próprio comando: o pacote pode já ter sido entregue por terceiros.
    async fn trigger_relay_tolerant(&self, packet: &PacketIdentity) -> Option<RelayOutcome> {
        let d = &self.descriptor;
        match self
            .relayer
            .relay_packet(&d.channel.path, &d.channel.src_channel, packet.sequence)
            .await
        {
            Ok(outcome) => {
                info!(packet = %packet, %outcome, "relay disparado");
                Some(outcome)
            }
            Err(e) => {
                warn!(packet = %packet, error = %e, "disparo de relay falhou; seguindo mesmo assim");
                None
            }
        }
    }

    /// Submete a transação concorrente do atacante; na variante de corrida
    /// o relay roda como tarefa concorrente independente, juntada com
    /// janela limitada. Expirada a janela, o desfecho fica desconhecido.
    async fn attacker_action(
        &self,
        packet: &PacketIdentity,
    ) -> Result<(TxRecord, Option<RelayOutcome>, bool)> {
        let d = &self.descriptor;
        let request = TxRequest::BankSend {
            from_key: d.roles.attacker_key.clone(),
            to_address: d.roles.attacker_receiver_address.clone(),
            amount: d.attacker_amount,
            denom: d.attacker_denom.clone(),
        };

        if !d.race_relay {
            let record = self.gateway_b.submit(request).await?;
            if !record.accepted() {
                return Err(Error::GatewayError(format!(
                    "transação do atacante rejeitada (code {}): {}",
                    record.code, record.raw_log
                )));
            }
            info!(hash = %record.hash, "transação do atacante submetida");
            return Ok((record, None, false));
        }

        let relayer = Arc::clone(&self.relayer);
        let path = d.channel.path.clone();
        let channel = d.channel.src_channel.clone();
        let sequence = packet.sequence;
        let relay_task =
            tokio::spawn(async move { relayer.relay_packet(&path, &channel, sequence).await });

        let record = self.gateway_b.submit(request).await?;
        if !record.accepted() {
            relay_task.abort();
            return Err(Error::GatewayError(format!(
                "transação do atacante rejeitada (code {}): {}",
                record.code, record.raw_log
            )));
        }
        info!(hash = %record.hash, "transação do atacante submetida em corrida com o relay");

        let relay_outcome = match tokio::time::timeout(d.relay_join_timeout, relay_task).await {
            Ok(Ok(Ok(outcome))) => {
                info!(%outcome, "relay concorrente concluído");
                Some(outcome)
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "relay concorrente falhou");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "tarefa de relay concorrente abortada");
                None
            }
            Err(_) => {
                warn!("janela de espera pelo relay concorrente expirou; desfecho desconhecido");
                None
            }
        };

        Ok((record, relay_outcome, true))
    }

    async fn observe_receives(&self, packets: &[PacketIdentity]) -> Result<Vec<Option<TxRecord>>> {
        let d = &self.descriptor;
        let mut recv_txs = Vec::with_capacity(packets.len());
        for packet in packets {
            let found = poll_until(&d.poll, "transação recv_packet", || {
                find_received_packet(
                    self.gateway_b.as_ref(),
                    &d.channel.dst_port,
                    &d.channel.dst_channel,
                    packet.sequence,
                )
            })
            .await;
            match found {
                Ok(tx) => {
                    info!(packet = %packet, tx = %tx.hash, height = ?tx.height, "recebimento observado");
                    recv_txs.push(Some(tx));
                }
                // Observação que falha vira veredito inconclusivo, não erro
                Err(Error::NotFound(msg)) => {
                    warn!(packet = %packet, %msg, "recebimento não observado dentro do orçamento");
                    recv_txs.push(None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(recv_txs)
    }

    async fn observe_final_placement(&self, attacker_tx: &TxRecord) -> Option<TxRecord> {
        let d = &self.descriptor;
        match poll_until(&d.poll, "posição final da transação do atacante", || {
            self.gateway_b.query_tx(&attacker_tx.hash)
        })
        .await
        {
            Ok(tx) if tx.height.is_some() => Some(tx),
            Ok(_) => {
                warn!(hash = %attacker_tx.hash, "transação do atacante sem altura indexada");
                None
            }
            Err(e) => {
                warn!(hash = %attacker_tx.hash, error = %e, "posição do atacante não observada");
                None
            }
        }
    }

    /// Classifica a ordem atacante vs. recebimento. Empate de altura só é
    /// resolvido pelo índice intra-bloco; índice irresolvível é
    /// inconclusivo em todas as variantes de cenário, nunca um "antes"
    /// fraco.
    async fn classify_ordering(
        &self,
        attacker: Option<&TxRecord>,
        recv: Option<&TxRecord>,
    ) -> Result<OrderingVerdict> {
        let (attacker, recv) = match (attacker, recv) {
            (Some(a), Some(r)) => (a, r),
            _ => return Ok(OrderingVerdict::Unknown),
        };
        let (attacker_height, recv_height) = match (attacker.height, recv.height) {
            (Some(a), Some(r)) => (a, r),
            _ => return Ok(OrderingVerdict::Unknown),
        };

        if attacker_height != recv_height {
            let ordering = compare(
                &Placement::new(attacker_height),
                &Placement::new(recv_height),
            )?;
            return Ok(ordering.into());
        }

        // Mesmo bloco: recomputar hashes das transações cruas do bloco
        let block = match self.gateway_b.query_block(attacker_height).await {
            Ok(block) => block,
            Err(e) => {
                warn!(height = attacker_height, error = %e, "bloco indisponível para desempate");
                return Ok(OrderingVerdict::SameBlockInconclusive);
            }
        };
        let attacker_index = resolve_intra_block_index(&block, &attacker.hash);
        let recv_index = resolve_intra_block_index(&block, &recv.hash);
        match (attacker_index, recv_index) {
            (Some(ia), Some(ir)) => {
                let ordering = compare(
                    &Placement::with_index(attacker_height, ia),
                    &Placement::with_index(recv_height, ir),
                )?;
                debug_assert!(matches!(ordering, TxOrdering::SameBlockOrdered(_)));
                Ok(ordering.into())
            }
            _ => {
                warn!(
                    height = attacker_height,
                    attacker_found = attacker_index.is_some(),
                    recv_found = recv_index.is_some(),
                    "índice intra-bloco irresolvível"
                );
                Ok(OrderingVerdict::SameBlockInconclusive)
            }
        }
    }

    /// Checa preservação da ordem de entrega nos cenários multi-pacote.
    /// Violação em canal ordenado é protocolo quebrado: severidade máxima.
    fn check_delivery_order(
        &self,
        recv_txs: &[Option<TxRecord>],
        severity: &mut Severity,
    ) -> Option<bool> {
        let placements: Option<Vec<Placement>> = recv_txs
            .iter()
            .map(|tx| {
                tx.as_ref()
                    .and_then(|t| t.height)
                    .map(Placement::new)
            })
            .collect();

        let placements = match placements {
            Some(p) => p,
            None => {
                warn!("recebimentos incompletos; preservação de sequência não verificável");
                return None;
            }
        };

        let check = check_sequence_preserved(&placements);
        if !check.preserved {
            if self.descriptor.channel.order == ChannelOrder::Ordered {
                *severity = Severity::Critical;
                error!(
                    violations = check.violations.len(),
                    "violação de ordem de entrega em canal ordenado"
                );
            } else {
                info!("pacotes entregues fora de ordem em canal não ordenado (permitido)");
            }
        }
        Some(check.preserved)
    }

    async fn query_attacker_balance(&self) -> Result<u128> {
        self.gateway_b
            .query_balance(
                &self.descriptor.roles.attacker_receiver_address,
                &self.descriptor.transfer_denom,
            )
            .await
    }

    /// Reconciliação entre simulação e transferências reais: divergência
    /// é aviso, nunca erro fatal.
    async fn reconcile_balances(&self, balance_before: Option<u128>, profit: Option<i128>) {
        let (before, profit) = match (balance_before, profit) {
            (Some(b), Some(p)) => (b, p),
            _ => return,
        };
        match self.query_attacker_balance().await {
            Ok(after) => {
                let delta = after as i128 - before as i128;
                if delta != profit {
                    warn!(
                        simulated = profit,
                        observed = delta,
                        "saldo on-chain diverge do lucro simulado"
                    );
                }
            }
            Err(e) => warn!(error = %e, "saldo final do atacante indisponível"),
        }
    }
}
