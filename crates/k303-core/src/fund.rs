//! # Funds and the Reference Registry
//!
//! The registry is the exchange's mutual-fund list. It is loaded once per
//! run and is read-only thereafter; checks borrow entries but never mutate
//! them.
//!
//! Disclosure rows join to the registry on [`FundId`] (the fund's exchange
//! number). A duplicate exchange number makes that join ambiguous, so
//! [`FundRegistry::new`] refuses to build and the run aborts.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, ValidationError};
use crate::text::{integral_digits, normalize_spaces};

/// A fund's exchange number, the join key between report and registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FundId(u64);

impl FundId {
    /// Wrap a known exchange number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw exchange number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FundId {
    type Err = ValidationError;

    /// Parse an exchange number, tolerating surrounding whitespace and a
    /// spreadsheet `.0` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        integral_digits(s)
            .and_then(|digits| digits.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidFundId(s.to_string()))
    }
}

/// One fund in the reference registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRegistryEntry {
    /// Exchange number; joins to [`DisclosureRow::fund_id`](crate::DisclosureRow).
    pub exchange_id: FundId,
    /// Hebrew fund name as listed by the exchange.
    pub fund_name: String,
    /// Trustee company responsible for the fund.
    pub trustee_name: String,
    /// Management company.
    pub manager_name: String,
    /// Encoded exposure profile (e.g. `3B`), decoded through the profile legend.
    pub exposure_profile_token: Option<String>,
    /// 1-based line in the source file, header included.
    pub source_row: usize,
}

impl FundRegistryEntry {
    /// True when this fund is held by `trustee`, comparing names with
    /// whitespace runs collapsed.
    pub fn has_trustee(&self, trustee: &str) -> bool {
        normalize_spaces(&self.trustee_name) == normalize_spaces(trustee)
    }
}

/// The loaded registry, indexed by exchange id.
#[derive(Debug, Clone, Default)]
pub struct FundRegistry {
    entries: Vec<FundRegistryEntry>,
    index: HashMap<FundId, usize>,
}

impl FundRegistry {
    /// Build the registry, rejecting duplicate exchange ids.
    pub fn new(entries: Vec<FundRegistryEntry>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if let Some(&first) = index.get(&entry.exchange_id) {
                let first: &FundRegistryEntry = &entries[first];
                return Err(RegistryError::JoinAmbiguity {
                    exchange_id: entry.exchange_id.get(),
                    first_row: first.source_row,
                    second_row: entry.source_row,
                });
            }
            index.insert(entry.exchange_id, pos);
        }
        Ok(Self { entries, index })
    }

    /// Look up a fund by exchange id.
    pub fn get(&self, id: FundId) -> Option<&FundRegistryEntry> {
        self.index.get(&id).map(|&pos| &self.entries[pos])
    }

    /// True when the exchange id is listed, under any trustee.
    pub fn contains(&self, id: FundId) -> bool {
        self.index.contains_key(&id)
    }

    /// All entries in source order.
    pub fn entries(&self) -> &[FundRegistryEntry] {
        &self.entries
    }

    /// Entries held by `trustee`, in source order.
    pub fn trustee_funds<'a>(
        &'a self,
        trustee: &str,
    ) -> impl Iterator<Item = &'a FundRegistryEntry> + 'a {
        let wanted = normalize_spaces(trustee);
        self.entries
            .iter()
            .filter(move |e| normalize_spaces(&e.trustee_name) == wanted)
    }

    /// Number of listed funds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no funds are listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
