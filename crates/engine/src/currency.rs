use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency code carried by an account.
///
/// Amounts everywhere in the engine are an `i64` number of minor units;
/// the currency is descriptive and never converted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Clp,
    Usd,
    Uf,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Clp => "CLP",
            Currency::Usd => "USD",
            Currency::Uf => "UF",
        }
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CLP" => Ok(Currency::Clp),
            "USD" => Ok(Currency::Usd),
            "UF" => Ok(Currency::Uf),
            other => Err(EngineError::InvalidKind(format!(
                "invalid currency: {other}"
            ))),
        }
    }
}
