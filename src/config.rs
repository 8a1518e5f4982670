//! Configuration for the log view and the network it reads from.

use url::Url;

use ledger_client::MAX_KEYS_PER_REQUEST;

use crate::error::LogViewError;

/// Default number of keys per ledger lookup.
pub const DEFAULT_PAGE_SIZE: usize = 200;

pub const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";
pub const TESTNET_CONTRACT_ID: &str = "CCJQZEFEVYNROQZPGTJJOSCDRVWITFOTEDZQZT5YRWIDBLSKPJ3B3PDJ";
pub const TESTNET_NETWORK_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Tuning of a [`MessageLogView`](crate::view::MessageLogView).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogViewConfig {
    /// Maximum number of keys sent in a single lookup, at most
    /// [`MAX_KEYS_PER_REQUEST`].
    pub page_size: usize,
}

impl Default for LogViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LogViewConfig {
    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size }
    }

    pub fn validate(&self) -> Result<(), LogViewError> {
        if self.page_size == 0 {
            return Err(LogViewError::InvalidConfig(
                "page_size must be greater than zero".to_string(),
            ));
        }
        if self.page_size > MAX_KEYS_PER_REQUEST {
            return Err(LogViewError::InvalidConfig(format!(
                "page_size {} exceeds the ledger limit of {MAX_KEYS_PER_REQUEST} keys per request",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Where the chat contract lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub rpc_url: Url,
    pub contract_id: String,
    pub network_passphrase: String,
}

impl NetworkConfig {
    /// The public testnet deployment.
    pub fn testnet() -> Self {
        Self {
            rpc_url: Url::parse(TESTNET_RPC_URL).expect("valid testnet url"),
            contract_id: TESTNET_CONTRACT_ID.to_string(),
            network_passphrase: TESTNET_NETWORK_PASSPHRASE.to_string(),
        }
    }

    /// Testnet defaults overridden by `SNAPCHAIN_RPC_URL`,
    /// `SNAPCHAIN_CONTRACT_ID` and `SNAPCHAIN_NETWORK_PASSPHRASE`.
    pub fn from_env() -> Result<Self, LogViewError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LogViewError> {
        let mut config = Self::testnet();
        if let Some(raw) = lookup("SNAPCHAIN_RPC_URL") {
            config.rpc_url = Url::parse(&raw).map_err(|e| {
                LogViewError::InvalidConfig(format!("SNAPCHAIN_RPC_URL '{raw}': {e}"))
            })?;
        }
        if let Some(contract_id) = lookup("SNAPCHAIN_CONTRACT_ID") {
            if contract_id.is_empty() {
                return Err(LogViewError::InvalidConfig(
                    "SNAPCHAIN_CONTRACT_ID is empty".to_string(),
                ));
            }
            config.contract_id = contract_id;
        }
        if let Some(passphrase) = lookup("SNAPCHAIN_NETWORK_PASSPHRASE") {
            config.network_passphrase = passphrase;
        }
        Ok(config)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}
