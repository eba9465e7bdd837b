//! Method name routing.
//!
//! Every inbound call carries a method name that is either a bare generic
//! name or `"<protocolType>_<methodName>"`. [`route_method`] classifies the
//! name once per call, before any dispatch decision. It sits on the hot path
//! of the whole RPC surface: O(1), allocation-free, and total — unknown
//! prefixes fall back to the generic branch so underscore-bearing generic
//! names are never misrouted.

use std::fmt;

use crate::protocol::DappProtocolType;

/// The closed set of RPC-shaped methods every adapter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterMethod {
    /// Establish a new connection (handshake approval).
    Connect,
    /// Restore an existing connection from storage.
    Reconnect,
    /// Tear down a connection and delete its record.
    Disconnect,
    /// Sign and submit a transaction.
    SendTransaction,
    /// Sign arbitrary data.
    SignData,
    /// Drop the live transport while keeping the stored record.
    Deactivate,
}

impl AdapterMethod {
    /// Wire name of the method (the part after the protocol prefix).
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Reconnect => "reconnect",
            Self::Disconnect => "disconnect",
            Self::SendTransaction => "sendTransaction",
            Self::SignData => "signData",
            Self::Deactivate => "deactivate",
        }
    }

    /// Parses a wire method name.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "connect" => Some(Self::Connect),
            "reconnect" => Some(Self::Reconnect),
            "disconnect" => Some(Self::Disconnect),
            "sendTransaction" => Some(Self::SendTransaction),
            "signData" => Some(Self::SignData),
            "deactivate" => Some(Self::Deactivate),
            _ => None,
        }
    }
}

impl fmt::Display for AdapterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Routing decision for one method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRoute<'a> {
    /// A protocol-scoped call to a known adapter method.
    Adapter {
        /// The protocol named by the prefix.
        protocol: DappProtocolType,
        /// The adapter method named by the suffix.
        method: AdapterMethod,
    },

    /// The prefix named a protocol but the suffix is not an adapter method.
    /// Surfaces as an unknown-method error at the call surface.
    AdapterUnknown {
        /// The protocol named by the prefix.
        protocol: DappProtocolType,
        /// The unrecognized method suffix.
        method: &'a str,
    },

    /// A generic call; the whole string is the method name.
    Generic {
        /// The generic method name.
        name: &'a str,
    },
}

/// Classifies a method name.
///
/// The prefixed interpretation applies only when the first `_`-delimited
/// segment is a member of the closed [`DappProtocolType`] set. Generic
/// method names and protocol prefixes are kept mutually exclusive by
/// construction; the prefix namespace is reserved.
pub fn route_method(name: &str) -> MethodRoute<'_> {
    if let Some((prefix, rest)) = name.split_once('_')
        && let Some(protocol) = DappProtocolType::from_prefix(prefix)
    {
        return match AdapterMethod::from_wire(rest) {
            Some(method) => MethodRoute::Adapter { protocol, method },
            None => MethodRoute::AdapterUnknown { protocol, method: rest },
        };
    }

    MethodRoute::Generic { name }
}
