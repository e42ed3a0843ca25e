//! Canonical byte encodings for leaf records.
//!
//! The encoding is a byte-exact contract with whatever verifier rebuilds leaf
//! hashes from claim submissions, so every implementation here is fixed.

use crate::error::{MerkleTreeError, Result, validate_input};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A record that can be serialized into the bytes hashed as a leaf.
pub trait ToLeafBytes {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]>;
}

impl ToLeafBytes for str {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl ToLeafBytes for String {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl ToLeafBytes for [u8] {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl ToLeafBytes for Vec<u8> {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl<const N: usize> ToLeafBytes for [u8; N] {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl<T: ToLeafBytes + ?Sized> ToLeafBytes for &T {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        (**self).to_leaf_bytes()
    }
}

/// One airdrop recipient and the amount allotted to it.
///
/// Encodes as `abi.encodePacked(address, uint256)`: the 20 address bytes
/// followed by the amount as a 32-byte big-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAllocation", into = "RawAllocation")]
pub struct Allocation {
    pub account: Address,
    pub amount: U256,
}

pub const ALLOCATION_ENCODED_LEN: usize = 20 + 32;

impl Allocation {
    pub fn new(account: Address, amount: U256) -> Self {
        Self { account, amount }
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        (self.account, self.amount).abi_encode_packed()
    }
}

impl ToLeafBytes for Allocation {
    fn to_leaf_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.encode())
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{},{}", hex::encode(self.account.as_slice()), self.amount)
    }
}

/// Parses `0x<address>,<amount>` (`:` is accepted as separator too). The
/// amount is decimal, or hex with a `0x` prefix.
impl FromStr for Allocation {
    type Err = MerkleTreeError;

    fn from_str(s: &str) -> Result<Self> {
        let (account, amount) = s
            .trim()
            .split_once([',', ':'])
            .ok_or_else(|| {
                MerkleTreeError::InvalidInput(format!("Expected address,amount: '{s}'"))
            })?;
        Ok(Self {
            account: parse_address(account)?,
            amount: parse_amount(amount)?,
        })
    }
}

pub fn parse_address(s: &str) -> Result<Address> {
    let s = s.trim();
    let address: Address = s
        .parse()
        .map_err(|e| MerkleTreeError::InvalidInput(format!("Invalid address '{s}': {e}")))?;
    validate_input(address != Address::ZERO, "Zero address not allowed")?;
    Ok(address)
}

pub fn parse_amount(s: &str) -> Result<U256> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x") {
        Some(hex_str) => (hex_str, 16),
        None => (s, 10),
    };
    validate_input(!digits.is_empty(), format!("Missing amount: '{s}'"))?;
    // ruint silently skips `_` separators
    validate_input(!digits.contains('_'), format!("Invalid amount '{s}'"))?;
    U256::from_str_radix(digits, radix)
        .map_err(|e| MerkleTreeError::InvalidInput(format!("Invalid amount '{s}': {e}")))
}

/// Reads one allocation per line. Blank lines and lines starting with `#`
/// are skipped; the first malformed line aborts with its line number.
pub fn parse_allocations(text: &str) -> Result<Vec<Allocation>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(line_num, line)| {
            line.parse::<Allocation>().map_err(|e| match e {
                MerkleTreeError::InvalidInput(msg) => {
                    MerkleTreeError::InvalidInput(format!("line {}: {msg}", line_num + 1))
                }
                other => other,
            })
        })
        .collect()
}

#[derive(Serialize, Deserialize)]
struct RawAllocation {
    account: String,
    amount: serde_json::Value,
}

impl TryFrom<RawAllocation> for Allocation {
    type Error = MerkleTreeError;

    fn try_from(raw: RawAllocation) -> Result<Self> {
        let amount = match &raw.amount {
            serde_json::Value::String(s) => parse_amount(s)?,
            serde_json::Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(|| {
                MerkleTreeError::InvalidInput(
                    "Amount does not fit in u64, use a string".to_string(),
                )
            })?,
            _ => {
                return Err(MerkleTreeError::InvalidInput(
                    "Expected number or string for amount".to_string(),
                ));
            }
        };
        Ok(Self {
            account: parse_address(&raw.account)?,
            amount,
        })
    }
}

impl From<Allocation> for RawAllocation {
    fn from(allocation: Allocation) -> Self {
        Self {
            account: format!("0x{}", hex::encode(allocation.account.as_slice())),
            amount: serde_json::Value::String(allocation.amount.to_string()),
        }
    }
}
