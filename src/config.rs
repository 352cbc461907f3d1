// Service configuration, read from the environment (and .env when present)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::warn;

/// How a drawn match is paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawPolicy {
    /// Each player gets their stake back, no platform fee
    RefundStake,
    /// Platform fee is taken from the pot, the remainder is split evenly
    SplitPot,
}

impl DrawPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refund_stake" | "refund" => Some(DrawPolicy::RefundStake),
            "split_pot" | "split" => Some(DrawPolicy::SplitPot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub fee_rate: Decimal,            // 0.03 = 3% of the pot
    pub network_fee_usd: Decimal,     // charged per player when a match is started
    pub draw_policy: DrawPolicy,
    pub simulated_latency: Duration,  // wallet handshake / settlement tx delay
    pub queue_ttl: Duration,          // waiting entries older than this are swept
    pub sweep_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            fee_rate: dec!(0.03),
            network_fee_usd: dec!(0.25),
            draw_policy: DrawPolicy::RefundStake,
            simulated_latency: Duration::ZERO,
            queue_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let draw_policy = match env::var("SKILLBLITZ_DRAW_POLICY") {
            Ok(raw) => DrawPolicy::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown SKILLBLITZ_DRAW_POLICY '{}', using {:?}", raw, defaults.draw_policy);
                defaults.draw_policy
            }),
            Err(_) => defaults.draw_policy,
        };

        let fee_rate = parse_var("SKILLBLITZ_FEE_RATE", defaults.fee_rate);
        let fee_rate = if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
            warn!("SKILLBLITZ_FEE_RATE {} out of range [0, 1), using {}", fee_rate, defaults.fee_rate);
            defaults.fee_rate
        } else {
            fee_rate
        };

        Self {
            bind_addr: env::var("SKILLBLITZ_BIND_ADDR").unwrap_or(defaults.bind_addr),
            fee_rate,
            network_fee_usd: parse_var("SKILLBLITZ_NETWORK_FEE_USD", defaults.network_fee_usd),
            draw_policy,
            simulated_latency: Duration::from_millis(parse_var("SKILLBLITZ_LATENCY_MS", 0u64)),
            queue_ttl: Duration::from_secs(parse_var("SKILLBLITZ_QUEUE_TTL_SECS", defaults.queue_ttl.as_secs())),
            sweep_interval: Duration::from_secs(
                parse_var("SKILLBLITZ_SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs()).max(1),
            ),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using {}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}
