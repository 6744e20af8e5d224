//! Identifiers.
//!
//! - `OrderId`, `FillId`, `TradeId`: sequential counters assigned at
//!   construction, never reused.
//! - `PendingToken`: a monotonic token assigned to a queued limit/stop order
//!   when it is pushed onto the processor's pending queues. Rust value types
//!   have no object identity, so removal-by-identity (the Python engine's
//!   `id()`-based purge of a mid-iteration snapshot) is modeled as
//!   removal-by-token instead.
//! - `ConfigHash`, `RunId`: BLAKE3 content hashes for run/configuration
//!   identity (see `fingerprint`).

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Sequential ID types ──────────────────────────────────────────────

macro_rules! seq_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

seq_id!(OrderId);
seq_id!(FillId);
seq_id!(TradeId);
seq_id!(PendingToken);

/// Monotonically increasing ID generator. One per backtest run; reset along
/// with the rest of the processor's state between runs.
#[derive(Debug, Default, Clone)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn next_order_id(&mut self) -> OrderId {
        OrderId(self.advance())
    }

    pub fn next_fill_id(&mut self) -> FillId {
        FillId(self.advance())
    }

    pub fn next_trade_id(&mut self) -> TradeId {
        TradeId(self.advance())
    }

    pub fn next_token(&mut self) -> PendingToken {
        PendingToken(self.advance())
    }

    fn advance(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

// ── BLAKE3-based hash types ──────────────────────────────────────────

/// 32-byte BLAKE3 hash wrapper with hex display and serde-as-hex-string.
macro_rules! hash_id {
    ($name:ident) => {
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn from_bytes(data: &[u8]) -> Self {
                Self(*blake3::hash(data).as_bytes())
            }

            pub fn as_hex(&self) -> String {
                self.0.iter().map(|b| format!("{b:02x}")).collect()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.as_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.as_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.as_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let hex = String::deserialize(d)?;
                let bytes: Vec<u8> = (0..hex.len())
                    .step_by(2)
                    .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
                    .collect::<Result<_, _>>()
                    .map_err(serde::de::Error::custom)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("expected 32 bytes"))?;
                Ok(Self(arr))
            }
        }
    };
}

hash_id!(ConfigHash);
hash_id!(RunId);
