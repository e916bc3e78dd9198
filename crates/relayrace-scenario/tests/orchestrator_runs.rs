use async_trait::async_trait;
use relayrace_core::traits::{ChainGateway, RelayTrigger};
use relayrace_core::types::{
    BlockRecord, ChannelOrder, EventFilter, RelayOutcome, Severity, TxEvent, TxRecord, TxRequest,
};
use relayrace_core::utils::tx_content_hash;
use relayrace_core::{Error, Result};
use relayrace_scenario::{
    AmmLeg, ChannelVariant, Orchestrator, OrderingVerdict, PollBudget, RelativeOrder, Roles,
    ScenarioDescriptor,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn event(kind: &str, attrs: &[(&str, &str)]) -> TxEvent {
    TxEvent {
        kind: kind.to_string(),
        attributes: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn tx(hash: &str, code: u32, height: Option<u64>, events: Vec<TxEvent>) -> TxRecord {
    TxRecord {
        hash: hash.to_string(),
        code,
        height,
        events,
        extra_events: Vec::new(),
        raw_log: String::new(),
        timestamp: None,
    }
}

fn send_tx(hash: &str, height: u64, sequence: u64) -> TxRecord {
    tx(
        hash,
        0,
        Some(height),
        vec![event(
            "send_packet",
            &[
                ("packet_src_port", "transfer"),
                ("packet_src_channel", "channel-0"),
                ("packet_sequence", &sequence.to_string()),
            ],
        )],
    )
}

fn recv_tx(hash: &str, height: u64, sequence: u64) -> TxRecord {
    tx(
        hash,
        0,
        Some(height),
        vec![event(
            "recv_packet",
            &[
                ("packet_dst_port", "transfer"),
                ("packet_dst_channel", "channel-1"),
                ("packet_sequence", &sequence.to_string()),
            ],
        )],
    )
}

/// Gateway roteirizado: respostas pré-carregadas por hash, sequência e
/// altura.
#[derive(Default)]
struct MockChain {
    submit_results: Mutex<VecDeque<TxRecord>>,
    txs: Mutex<HashMap<String, TxRecord>>,
    recv_by_sequence: Mutex<HashMap<u64, Vec<TxRecord>>>,
    blocks: Mutex<HashMap<u64, BlockRecord>>,
    balances: Mutex<HashMap<(String, String), u128>>,
}

impl MockChain {
    fn push_submit(&self, record: TxRecord) {
        self.submit_results.lock().unwrap().push_back(record);
    }

    fn index_tx(&self, record: TxRecord) {
        self.txs.lock().unwrap().insert(record.hash.clone(), record);
    }

    fn index_recv(&self, sequence: u64, record: TxRecord) {
        self.recv_by_sequence
            .lock()
            .unwrap()
            .entry(sequence)
            .or_default()
            .push(record);
    }

    fn index_block(&self, block: BlockRecord) {
        self.blocks.lock().unwrap().insert(block.height, block);
    }
}

#[async_trait]
impl ChainGateway for MockChain {
    async fn submit(&self, _request: TxRequest) -> Result<TxRecord> {
        self.submit_results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Other("sem submissão roteirizada".into()))
    }

    async fn query_tx(&self, hash: &str) -> Result<TxRecord> {
        self.txs
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| Error::NotFound(hash.to_string()))
    }

    async fn query_txs_by_event(&self, filter: &EventFilter) -> Result<Vec<TxRecord>> {
        let sequence = filter
            .conditions
            .iter()
            .find(|c| c.attribute == "packet_sequence")
            .and_then(|c| c.value.parse::<u64>().ok())
            .ok_or_else(|| Error::ValidationError("filtro sem sequência".into()))?;
        Ok(self
            .recv_by_sequence
            .lock()
            .unwrap()
            .get(&sequence)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_block(&self, height: u64) -> Result<BlockRecord> {
        self.blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .ok_or_else(|| Error::NotFound(height.to_string()))
    }

    async fn query_balance(&self, address: &str, denom: &str) -> Result<u128> {
        Ok(*self
            .balances
            .lock()
            .unwrap()
            .get(&(address.to_string(), denom.to_string()))
            .unwrap_or(&0))
    }
}

struct MockRelay {
    outcomes: Mutex<VecDeque<Result<RelayOutcome>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockRelay {
    fn new(outcomes: Vec<Result<RelayOutcome>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl RelayTrigger for MockRelay {
    async fn relay_packet(
        &self,
        _path: &str,
        _src_channel: &str,
        _sequence: u64,
    ) -> Result<RelayOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RelayOutcome::Relayed))
    }
}

fn channel(order: ChannelOrder) -> ChannelVariant {
    ChannelVariant {
        path: "demo-path".to_string(),
        src_port: "transfer".to_string(),
        src_channel: "channel-0".to_string(),
        dst_port: "transfer".to_string(),
        dst_channel: "channel-1".to_string(),
        order,
    }
}

fn roles() -> Roles {
    Roles {
        victim_key: "victim".to_string(),
        recipient_address: "cosmos1recipient".to_string(),
        attacker_key: "attacker".to_string(),
        attacker_receiver_address: "cosmos1shadow".to_string(),
    }
}

fn fast_poll(mut descriptor: ScenarioDescriptor) -> ScenarioDescriptor {
    descriptor.poll = PollBudget {
        attempts: 2,
        backoff: Duration::from_millis(1),
    };
    descriptor.relay_join_timeout = Duration::from_millis(50);
    descriptor
}

fn orchestrator(
    a: MockChain,
    b: MockChain,
    relay: MockRelay,
    descriptor: ScenarioDescriptor,
) -> (Orchestrator, Arc<MockRelay>) {
    let relay = Arc::new(relay);
    let orch = Orchestrator::new(
        Arc::new(a),
        Arc::new(b),
        Arc::clone(&relay) as Arc<dyn RelayTrigger>,
        descriptor,
    );
    (orch, relay)
}

#[tokio::test]
async fn attacker_in_earlier_block_is_front_run() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_recv(1, recv_tx("R1", 10, 1));

    let relay = MockRelay::new(vec![Ok(RelayOutcome::Relayed)]);
    let descriptor = fast_poll(ScenarioDescriptor::relayer_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, relay) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    assert_eq!(verdict.ordering, OrderingVerdict::Before);
    assert!(verdict.ordering.attacker_first());
    assert_eq!(verdict.severity, Severity::High);
    assert_eq!(verdict.relay, Some(RelayOutcome::Relayed));
    assert_eq!(verdict.sequence_respected, None);
    assert_eq!(verdict.profit, None);
    assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn same_block_tie_resolved_by_block_contents() {
    let atk_bytes = b"raw-attacker".to_vec();
    let recv_bytes = b"raw-recv".to_vec();
    let atk_hash = tx_content_hash(&atk_bytes);
    let recv_hash = tx_content_hash(&recv_bytes);

    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    let chain_b = MockChain::default();
    chain_b.push_submit(tx(&atk_hash, 0, Some(10), Vec::new()));
    chain_b.index_tx(tx(&atk_hash, 0, Some(10), Vec::new()));
    chain_b.index_recv(1, recv_tx(&recv_hash, 10, 1));
    chain_b.index_block(BlockRecord {
        height: 10,
        txs: vec![atk_bytes, recv_bytes],
    });

    let relay = MockRelay::new(vec![Ok(RelayOutcome::Relayed)]);
    let descriptor = fast_poll(ScenarioDescriptor::relayer_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, _) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    assert_eq!(
        verdict.ordering,
        OrderingVerdict::SameBlockOrdered(RelativeOrder::Before)
    );
    assert_eq!(verdict.severity, Severity::High);
}

#[tokio::test]
async fn same_block_without_index_stays_inconclusive() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    // o bloco roteirizado não contém a transação do atacante, então o
    // empate de altura não tem desempate possível
    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(10), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(10), Vec::new()));
    let recv_bytes = b"raw-recv".to_vec();
    chain_b.index_recv(1, recv_tx(&tx_content_hash(&recv_bytes), 10, 1));
    chain_b.index_block(BlockRecord {
        height: 10,
        txs: vec![recv_bytes],
    });

    let relay = MockRelay::new(vec![Ok(RelayOutcome::Relayed)]);
    let descriptor = fast_poll(ScenarioDescriptor::relayer_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, _) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    assert_eq!(verdict.ordering, OrderingVerdict::SameBlockInconclusive);
    assert!(!verdict.ordering.attacker_first());
    assert_eq!(verdict.severity, Severity::Low);
}

#[tokio::test]
async fn missing_receive_yields_unknown_not_error() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    // nenhum recv_packet roteirizado: o polling esgota o orçamento
    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(9), Vec::new()));

    let relay = MockRelay::new(vec![Ok(RelayOutcome::NothingToRelay)]);
    let descriptor = fast_poll(ScenarioDescriptor::relayer_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, _) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    assert_eq!(verdict.ordering, OrderingVerdict::Unknown);
    assert_eq!(verdict.relay, Some(RelayOutcome::NothingToRelay));
}

#[tokio::test]
async fn rejected_victim_transfer_aborts_the_run() {
    let chain_a = MockChain::default();
    chain_a.push_submit(tx("S1", 4, None, Vec::new()));

    let chain_b = MockChain::default();
    let relay = MockRelay::new(Vec::new());
    let descriptor = fast_poll(ScenarioDescriptor::relayer_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, relay) = orchestrator(chain_a, chain_b, relay, descriptor);

    let res = orch.run().await;
    assert!(matches!(res, Err(Error::GatewayError(_))));
    assert_eq!(relay.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ordered_channel_inversion_is_critical() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.push_submit(send_tx("S2", 5, 2));
    chain_a.index_tx(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S2", 5, 2));

    // segundo pacote recebido em bloco anterior ao do primeiro
    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(18), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(18), Vec::new()));
    chain_b.index_recv(1, recv_tx("R1", 20, 1));
    chain_b.index_recv(2, recv_tx("R2", 19, 2));

    let relay = MockRelay::new(vec![
        Ok(RelayOutcome::Relayed),
        Ok(RelayOutcome::Relayed),
    ]);
    let descriptor = fast_poll(ScenarioDescriptor::channel_ordering(
        channel(ChannelOrder::Ordered),
        roles(),
    ));
    let (orch, relay) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    assert_eq!(verdict.sequence_respected, Some(false));
    assert_eq!(verdict.severity, Severity::Critical);
    // um relay por pacote
    assert_eq!(relay.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unordered_channel_inversion_is_tolerated() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.push_submit(send_tx("S2", 5, 2));
    chain_a.index_tx(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S2", 5, 2));

    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(18), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(18), Vec::new()));
    chain_b.index_recv(1, recv_tx("R1", 20, 1));
    chain_b.index_recv(2, recv_tx("R2", 19, 2));

    let relay = MockRelay::new(vec![
        Ok(RelayOutcome::Relayed),
        Ok(RelayOutcome::Relayed),
    ]);
    let descriptor = fast_poll(ScenarioDescriptor::channel_ordering(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, _) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    // a inversão é registrada, mas em canal não ordenado não escala
    assert_eq!(verdict.sequence_respected, Some(false));
    assert_ne!(verdict.severity, Severity::Critical);
}

#[tokio::test]
async fn dex_sandwich_reports_simulated_profit() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_recv(1, recv_tx("R1", 10, 1));

    let relay = MockRelay::new(vec![Ok(RelayOutcome::Relayed)]);
    let amm = AmmLeg {
        reserve_x: 10_000,
        reserve_y: 10_000,
        preemptive_buy: 1_000,
        post_sell: 909,
    };
    let descriptor = fast_poll(ScenarioDescriptor::dex_mev(
        channel(ChannelOrder::Unordered),
        roles(),
        amm,
    ));
    let (orch, _) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    // compra 1000 -> 909; vítima troca 2500; venda 909 -> 1475
    assert_eq!(verdict.profit, Some(475));
    assert_eq!(verdict.ordering, OrderingVerdict::Before);
    assert_eq!(verdict.severity, Severity::High);
}

#[tokio::test]
async fn concurrent_relay_outcome_is_joined() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_recv(1, recv_tx("R1", 10, 1));

    let relay = MockRelay::new(vec![Ok(RelayOutcome::AlreadyRelayed)]);
    let descriptor = fast_poll(ScenarioDescriptor::fee_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, relay) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    assert_eq!(verdict.relay, Some(RelayOutcome::AlreadyRelayed));
    // a corrida dispara o relay uma única vez
    assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_relay_past_the_window_is_unknown() {
    let chain_a = MockChain::default();
    chain_a.push_submit(send_tx("S1", 5, 1));
    chain_a.index_tx(send_tx("S1", 5, 1));

    let chain_b = MockChain::default();
    chain_b.push_submit(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_tx(tx("ATK", 0, Some(9), Vec::new()));
    chain_b.index_recv(1, recv_tx("R1", 10, 1));

    let relay =
        MockRelay::new(vec![Ok(RelayOutcome::Relayed)]).with_delay(Duration::from_millis(500));
    let descriptor = fast_poll(ScenarioDescriptor::fee_race(
        channel(ChannelOrder::Unordered),
        roles(),
    ));
    let (orch, _) = orchestrator(chain_a, chain_b, relay, descriptor);

    let verdict = orch.run().await.unwrap();
    // o desfecho do relay fica desconhecido, mas o veredito sai
    assert_eq!(verdict.relay, None);
    assert_eq!(verdict.ordering, OrderingVerdict::Before);
}
