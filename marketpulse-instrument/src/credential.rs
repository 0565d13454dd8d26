use crate::exchange::ExchangeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential used by an account adapter to authenticate with an exchange.
///
/// `passphrase` is required for [`ExchangeId::Kucoin`] and [`ExchangeId::Okx`], unused for
/// [`ExchangeId::Binance`]. Immutable once constructed; equality is field-wise so the scheduler
/// (§4.D) can find a running adapter by matching credential on `remove`.
///
/// ### Notes
/// [`Debug`] is hand-implemented to redact secret material - credentials must never be logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredential {
    pub user_id: String,
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: Option<String>,
}

impl AccountCredential {
    pub fn new(
        user_id: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase,
        }
    }

    /// `true` if this credential carries the `passphrase` mandated for the given exchange.
    pub fn satisfies(&self, exchange: ExchangeId) -> bool {
        match exchange {
            ExchangeId::Kucoin | ExchangeId::Okx => self.passphrase.is_some(),
            ExchangeId::Binance => true,
            ExchangeId::Total => false,
        }
    }
}

impl fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredential")
            .field("user_id", &self.user_id)
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
