//! Executa um cenário de sondagem contra duas cadeias locais já
//! configuradas (binários `simd` e `rly` no PATH, ambiente do Makefile
//! carregado).
//!
//! ```bash
//! cargo run -p relayrace-scenario --example run_probe -- <relayer_race|fee_race|dex_mev|channel_ordering> [path] [src-channel] [dst-channel]
//! ```

use std::env;
use std::sync::Arc;

use anyhow::{bail, Result};
use relayrace_core::types::ChannelOrder;
use relayrace_gateway::{NodeCli, ProbeConfig, RelayerCli};
use relayrace_scenario::{
    AmmLeg, ChannelVariant, Orchestrator, Roles, ScenarioDescriptor,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Uso: {} <cenário> [path] [src-channel] [dst-channel]", args[0]);
        eprintln!("Cenários: relayer_race, fee_race, dex_mev, channel_ordering");
        std::process::exit(1);
    }
    let scenario = args[1].as_str();
    let path = args.get(2).cloned().unwrap_or_else(|| "demo".to_string());
    let src_channel = args.get(3).cloned().unwrap_or_else(|| "channel-0".to_string());
    let dst_channel = args.get(4).cloned().unwrap_or_else(|| "channel-1".to_string());

    let cfg = ProbeConfig::from_env()?;
    let node_a = NodeCli::new(cfg.chain_a.clone());
    let node_b = NodeCli::new(cfg.chain_b.clone());

    let roles = Roles {
        victim_key: "victim".to_string(),
        recipient_address: node_b.key_address("victim-recipient").await?,
        attacker_key: "attacker".to_string(),
        attacker_receiver_address: node_b.key_address("attacker-shadow").await?,
    };

    let order = if scenario == "channel_ordering" {
        ChannelOrder::Ordered
    } else {
        ChannelOrder::Unordered
    };
    let channel = ChannelVariant {
        path,
        src_port: "transfer".to_string(),
        src_channel,
        dst_port: "transfer".to_string(),
        dst_channel,
        order,
    };

    let descriptor = match scenario {
        "relayer_race" => ScenarioDescriptor::relayer_race(channel, roles),
        "fee_race" => ScenarioDescriptor::fee_race(channel, roles),
        "dex_mev" => ScenarioDescriptor::dex_mev(
            channel,
            roles,
            AmmLeg {
                reserve_x: 1_000_000,
                reserve_y: 1_000_000,
                preemptive_buy: 50_000,
                post_sell: 47_619,
            },
        ),
        "channel_ordering" => ScenarioDescriptor::channel_ordering(channel, roles),
        other => bail!("cenário desconhecido: {}", other),
    };

    let orchestrator = Orchestrator::new(
        Arc::new(node_a),
        Arc::new(node_b),
        Arc::new(RelayerCli::new(cfg.relayer.clone())),
        descriptor,
    );

    let verdict = orchestrator.run().await?;
    println!("Cenário:             {}", verdict.scenario);
    println!("Ordenação:           {}", verdict.ordering);
    println!("Atacante primeiro:   {}", verdict.ordering.attacker_first());
    if let Some(profit) = verdict.profit {
        println!("Lucro simulado:      {}", profit);
    }
    if let Some(respected) = verdict.sequence_respected {
        println!("Sequência preservada: {}", respected);
    }
    if let Some(relay) = verdict.relay {
        println!("Desfecho do relay:   {}", relay);
    }
    println!("Severidade:          {:?}", verdict.severity);
    Ok(())
}
