// Tiny example wiring: constructs a packet for a circuit and walks it
// hop by hop. Real peer discovery and network transport are out of
// scope for the core; this binary stands in for both with a minimal
// in-process transport that does nothing but carry an opaque blob from
// one relay to the next.
use clap::Parser;
use std::collections::HashMap;

use sphinx_core::cli::Cli;
use sphinx_core::config::CircuitConfig;
use sphinx_core::constants::PAYLOAD;
use sphinx_core::crypto::{point_from_bytes, random_scalar, scalar_mul_base, Point};
use sphinx_core::logging::LoggingManager;
use sphinx_core::{new_packet, process_packet, Packet, ProcessedHop, RelayContext};

/// One blocking call per hop, carrying an opaque packet. Stands in for
/// a real peer-to-peer transport, which is out of scope for the core.
trait Transport {
    fn deliver(&self, addr: &str, packet: Packet) -> Option<ProcessedHop>;
}

struct InProcessNetwork {
    relays: HashMap<String, RelayContext>,
}

impl Transport for InProcessNetwork {
    fn deliver(&self, addr: &str, packet: Packet) -> Option<ProcessedHop> {
        let ctx = self.relays.get(addr)?;
        process_packet(ctx, &packet).ok()
    }
}

fn main() {
    let cli = Cli::parse();
    let config = CircuitConfig::load_or_default(&cli.config);

    let _ = LoggingManager::new(config.logging.clone()).initialize();

    let relay_addrs_cfg: Vec<String> = if config.relays.is_empty() {
        vec!["relay-0".to_string(), "relay-1".to_string(), "relay-2".to_string()]
    } else {
        config.relays.iter().map(|r| r.address.clone()).collect()
    };
    let final_addr = if config.final_address.is_empty() {
        "exit-destination".to_string()
    } else {
        config.final_address.clone()
    };

    // Relays named in the config with a real long-term public key are
    // addressed with that key, the way a sender talking to actual relays
    // would have to. We never hold those relays' private keys, so we can
    // only build the packet for them, not simulate their processing
    // in-process; network delivery is out of scope. Any relay without a
    // configured key gets a freshly generated in-process keypair so the
    // full hop-by-hop walk below can still be simulated locally.
    let configured_pubs: Vec<Option<Point>> = config
        .relays
        .iter()
        .map(|r| {
            if r.public_key_hex.is_empty() {
                return None;
            }
            let bytes = match hex::decode(&r.public_key_hex) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("relay {}: invalid public_key_hex: {e}", r.address);
                    std::process::exit(1);
                }
            };
            match point_from_bytes(&bytes) {
                Ok(p) => Some(p),
                Err(e) => {
                    eprintln!("relay {}: invalid public key: {e}", r.address);
                    std::process::exit(1);
                }
            }
        })
        .collect();
    let has_configured_keys = configured_pubs.iter().any(Option::is_some);

    let privs: Vec<_> = relay_addrs_cfg.iter().map(|_| random_scalar()).collect();
    let pubs: Vec<Point> = privs
        .iter()
        .enumerate()
        .map(|(i, priv_key)| configured_pubs.get(i).copied().flatten().unwrap_or_else(|| scalar_mul_base(priv_key)))
        .collect();

    // relay_addrs[i] is where hop i forwards to: the next relay, or the
    // final destination for the last hop.
    let mut hop_addrs: Vec<Vec<u8>> = relay_addrs_cfg[1..].iter().map(|a| a.as_bytes().to_vec()).collect();
    hop_addrs.push(final_addr.as_bytes().to_vec());

    let session = random_scalar();
    let mut payload = [0u8; PAYLOAD];
    let msg = cli.message.as_bytes();
    payload[..msg.len().min(PAYLOAD)].copy_from_slice(&msg[..msg.len().min(PAYLOAD)]);

    let packet = match new_packet(&session, &pubs, final_addr.as_bytes(), &hop_addrs, payload) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("failed to construct packet: {e}");
            return;
        }
    };

    println!("circuit: {relay_addrs_cfg:?} -> {final_addr}");

    if has_configured_keys {
        println!(
            "packet built for {} configured relay key(s) ({} bytes); \
             local delivery simulation is skipped since we don't hold their private keys \
             -- network transport is out of scope here",
            configured_pubs.iter().filter(|p| p.is_some()).count(),
            packet.to_bytes().len()
        );
        return;
    }

    let mut network = InProcessNetwork { relays: HashMap::new() };
    for (addr, priv_key) in relay_addrs_cfg.iter().zip(privs.iter()) {
        network.relays.insert(addr.clone(), RelayContext::new(*priv_key));
    }

    let mut packet = packet;
    let mut current_addr = relay_addrs_cfg[0].clone();
    loop {
        match network.deliver(&current_addr, packet) {
            Some(ProcessedHop::Forward { next_addr, packet: next_packet }) => {
                current_addr = String::from_utf8_lossy(trim_zero(&next_addr)).into_owned();
                println!("relay {current_addr}: forwarding");
                packet = next_packet;
            }
            Some(ProcessedHop::Exit { next_addr, payload }) => {
                let dest = String::from_utf8_lossy(trim_zero(&next_addr)).into_owned();
                let delivered = String::from_utf8_lossy(trim_zero(&payload)).into_owned();
                println!("delivered to {dest}: {delivered}");
                break;
            }
            None => {
                eprintln!("delivery to {current_addr} failed");
                break;
            }
        }
    }
}

fn trim_zero(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}
