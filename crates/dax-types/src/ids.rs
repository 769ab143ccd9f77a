//! Identifiers used throughout the DAX core.
//!
//! Token symbols are fixed-width 32-byte keys, token references are opaque
//! 20-byte addresses, users are UUIDv7 and orders carry a monotonically
//! increasing `u64` assigned by the matching engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DaxError, Result};

/// Width of an encoded token symbol in bytes.
pub const SYMBOL_WIDTH: usize = 32;

/// Width of an encoded token address in bytes.
pub const ADDRESS_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A token symbol (e.g. `TOKEN`, `HYDRO`) stored as a fixed 32-byte key.
///
/// Unused trailing bytes are zero. Trailing blanks (`0x00` or `0x20`) are
/// padding, so a space-padded and a zero-padded encoding of the same text
/// decode to the same key. Symbols are case-sensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol([u8; SYMBOL_WIDTH]);

impl Symbol {
    /// Encode a textual symbol.
    pub fn new(text: &str) -> Result<Self> {
        let bytes = trim_padding(text.as_bytes());
        if bytes.is_empty() {
            return Err(DaxError::InvalidSymbol {
                reason: "symbol is empty".into(),
            });
        }
        if bytes.len() > SYMBOL_WIDTH {
            return Err(DaxError::InvalidSymbol {
                reason: format!("{} bytes exceeds the {SYMBOL_WIDTH}-byte width", bytes.len()),
            });
        }
        let mut key = [0u8; SYMBOL_WIDTH];
        key[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Decode a raw fixed-width key, normalizing its blank padding.
    ///
    /// The unpadded bytes must be UTF-8 so that the key survives a round
    /// trip through its text form.
    pub fn from_padded(raw: [u8; SYMBOL_WIDTH]) -> Result<Self> {
        let bytes = trim_padding(&raw);
        if bytes.is_empty() {
            return Err(DaxError::InvalidSymbol {
                reason: "symbol is blank".into(),
            });
        }
        let text = std::str::from_utf8(bytes).map_err(|_| DaxError::InvalidSymbol {
            reason: format!("0x{} is not valid UTF-8", hex::encode(bytes)),
        })?;
        Self::new(text)
    }

    /// The zero-padded 32-byte encoding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SYMBOL_WIDTH] {
        &self.0
    }

    /// The symbol text without padding.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Both constructors only accept UTF-8.
        std::str::from_utf8(trim_padding(&self.0)).unwrap_or_default()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.as_str().to_owned()
    }
}

fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0 && *b != b' ')
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = DaxError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.text()
    }
}

impl std::str::FromStr for Symbol {
    type Err = DaxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// TokenAddress
// ---------------------------------------------------------------------------

/// Opaque external reference backing a whitelisted symbol (the token's
/// contract address on the host ledger).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAddress(pub [u8; ADDRESS_WIDTH]);

impl TokenAddress {
    #[must_use]
    pub fn from_bytes(bytes: [u8; ADDRESS_WIDTH]) -> Self {
        Self(bytes)
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        let decoded = hex::decode(digits).map_err(|e| DaxError::Serialization(e.to_string()))?;
        let bytes: [u8; ADDRESS_WIDTH] =
            decoded
                .try_into()
                .map_err(|v: Vec<u8>| {
                    DaxError::Serialization(format!(
                        "token address must be {ADDRESS_WIDTH} bytes, got {}",
                        v.len()
                    ))
                })?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_WIDTH] {
        &self.0
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAddress({self})")
    }
}

impl TryFrom<String> for TokenAddress {
    type Error = DaxError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<TokenAddress> for String {
    fn from(address: TokenAddress) -> Self {
        address.to_string()
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Unique identifier for a user / trading account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Order identifier. Assigned from a single counter owned by the matching
/// engine: never reused, never decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// FillId
// ---------------------------------------------------------------------------

/// Identifier of a single fill between a market order and a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FillId(pub Uuid);

impl FillId {
    /// Deterministic `FillId` from the taker order and fill sequence.
    ///
    /// Replaying the same market order against the same book yields the
    /// same ids.
    #[must_use]
    pub fn deterministic(taker_order: OrderId, fill_sequence: u32) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"dax:fill_id:v1:");
        hasher.update(taker_order.0.to_le_bytes());
        hasher.update(fill_sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TradingPair
// ---------------------------------------------------------------------------

/// An ordered trading pair: `first` is the asset bought or sold, `second`
/// is the quote asset the price is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TradingPair {
    pub first: Symbol,
    pub second: Symbol,
}

impl TradingPair {
    #[must_use]
    pub fn new(first: Symbol, second: Symbol) -> Self {
        Self { first, second }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}
