//! Descritor de cenário: uma única parametrização cobre as quatro
//! variantes da sonda (corrida contra o relayer, corrida por taxa, MEV
//! com DEX simulada, canal ordenado vs. não ordenado), todas executadas
//! pelo mesmo orquestrador.

use relayrace_core::types::ChannelOrder;
use std::time::Duration;

/// Ponta de canal usada pelo cenário, com os identificadores das duas
/// cadeias e a disciplina de entrega.
#[derive(Debug, Clone)]
pub struct ChannelVariant {
    pub path: String,
    pub src_port: String,
    pub src_channel: String,
    pub dst_port: String,
    pub dst_channel: String,
    pub order: ChannelOrder,
}

/// Papéis envolvidos em uma execução
#[derive(Debug, Clone)]
pub struct Roles {
    /// Chave da vítima na cadeia A
    pub victim_key: String,
    /// Endereço do destinatário da vítima na cadeia B
    pub recipient_address: String,
    /// Chave do atacante na cadeia B
    pub attacker_key: String,
    /// Endereço que recebe a transação concorrente do atacante
    pub attacker_receiver_address: String,
}

/// Perna AMM opcional do cenário (sanduíche em DEX simulada)
#[derive(Debug, Clone)]
pub struct AmmLeg {
    pub reserve_x: u128,
    pub reserve_y: u128,
    /// Compra preventiva do atacante, no denom transferido (X)
    pub preemptive_buy: u128,
    /// Venda posterior do atacante, no denom contrapartida (Y)
    pub post_sell: u128,
}

/// Orçamento de polling: tentativas limitadas com intervalo fixo.
/// Toda espera por indexação tem um teto explícito; esgotar o orçamento
/// é um desfecho observável, nunca um bloqueio indefinido.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Descrição completa de um cenário de front-running
#[derive(Debug, Clone)]
pub struct ScenarioDescriptor {
    pub name: String,
    pub channel: ChannelVariant,
    pub roles: Roles,
    /// Montante de cada transferência IBC da vítima
    pub transfer_amount: u128,
    /// Denom transferido pela vítima
    pub transfer_denom: String,
    /// Montante da transação concorrente do atacante
    pub attacker_amount: u128,
    /// Denom da transação do atacante
    pub attacker_denom: String,
    /// Quantos pacotes a vítima envia (2 para a sonda de canal ordenado)
    pub packet_count: usize,
    /// Dispara o relay concorrentemente com a submissão do atacante
    pub race_relay: bool,
    /// Perna AMM; `None` desliga a simulação de mercado
    pub amm: Option<AmmLeg>,
    pub poll: PollBudget,
    /// Janela máxima de espera pelo relay disparado em concorrência
    pub relay_join_timeout: Duration,
}

impl ScenarioDescriptor {
    fn base(name: &str, channel: ChannelVariant, roles: Roles) -> Self {
        Self {
            name: name.to_string(),
            channel,
            roles,
            transfer_amount: 100,
            transfer_denom: "token".to_string(),
            attacker_amount: 1,
            attacker_denom: "token".to_string(),
            packet_count: 1,
            race_relay: false,
            amm: None,
            poll: PollBudget::default(),
            relay_join_timeout: Duration::from_secs(20),
        }
    }

    /// Corrida simples contra o relayer: atacante age entre a observação
    /// do pacote e o relay controlado.
    pub fn relayer_race(channel: ChannelVariant, roles: Roles) -> Self {
        Self::base("relayer_race", channel, roles)
    }

    /// Corrida por taxa: relay e submissão do atacante disparados em
    /// concorrência, disputando a mesma janela de bloco.
    pub fn fee_race(channel: ChannelVariant, roles: Roles) -> Self {
        let mut descriptor = Self::base("fee_race", channel, roles);
        descriptor.race_relay = true;
        descriptor
    }

    /// Sanduíche com DEX simulada em torno da transferência da vítima.
    pub fn dex_mev(channel: ChannelVariant, roles: Roles, amm: AmmLeg) -> Self {
        let mut descriptor = Self::base("dex_mev", channel, roles);
        descriptor.transfer_amount = 5000;
        descriptor.amm = Some(amm);
        descriptor
    }

    /// Sonda de preservação de ordem: dois pacotes, atacante entre os
    /// relays do primeiro e do segundo.
    pub fn channel_ordering(channel: ChannelVariant, roles: Roles) -> Self {
        let mut descriptor = Self::base("channel_ordering", channel, roles);
        descriptor.transfer_amount = 10;
        descriptor.packet_count = 2;
        descriptor
    }
}
