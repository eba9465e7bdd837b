//! Protocol identity for supported dApp connection protocols.
//!
//! [`DappProtocolType`] is a closed set: it doubles as the registration key
//! in the manager and as the wire prefix of scoped method names
//! (`"<protocol>_<method>"`). Adding a protocol means adding a variant here
//! and an adapter crate implementing the contract.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one supported dApp connection protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DappProtocolType {
    /// TonConnect-style protocol (TON ecosystem dApps).
    TonConnect,
    /// WalletConnect-style protocol (relay-based multi-chain dApps).
    WalletConnect,
}

impl DappProtocolType {
    /// All supported protocols, in primary-first order.
    pub const ALL: [Self; 2] = [Self::TonConnect, Self::WalletConnect];

    /// The protocol assumed for stored records that predate protocol tagging.
    pub const PRIMARY: Self = Self::TonConnect;

    /// The wire prefix used in scoped method names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TonConnect => "tonConnect",
            Self::WalletConnect => "walletConnect",
        }
    }

    /// Resolves a method-name prefix to a protocol.
    ///
    /// This is the membership check on the hot path of every inbound call,
    /// so it stays a plain match with no allocation.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "tonConnect" => Some(Self::TonConnect),
            "walletConnect" => Some(Self::WalletConnect),
            _ => None,
        }
    }
}

impl fmt::Display for DappProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_round_trip() {
        for protocol in DappProtocolType::ALL {
            assert_eq!(DappProtocolType::from_prefix(protocol.as_str()), Some(protocol));
        }
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        assert_eq!(DappProtocolType::from_prefix("tonconnect"), None);
        assert_eq!(DappProtocolType::from_prefix("flush"), None);
        assert_eq!(DappProtocolType::from_prefix(""), None);
    }
}
