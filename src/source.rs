use crate::error::{Result, StatementChatError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which family of statement a source produces. Selects the record schema,
/// filler cost and instructions used for that source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    BankStatement,
    MobileMoney,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankProvider {
    EcoBank,
    StanbicBank,
    CentenaryBank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobileMoneyProvider {
    MtnMobileMoney,
    AirtelMoney,
}

/// The account or provider a statement was uploaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider")]
pub enum DataSource {
    Bank(BankProvider),
    MobileMoney(MobileMoneyProvider),
}

/// User-facing label scoping one cache lifecycle, e.g. `"Eco Bank"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataSourceIdentity(String);

impl DataSourceIdentity {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the cache handle for this identity is persisted.
    pub fn cache_key(&self) -> String {
        format!("{}_cache", self.0)
    }
}

impl fmt::Display for DataSourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DataSource> for DataSourceIdentity {
    fn from(source: DataSource) -> Self {
        source.identity()
    }
}

impl BankProvider {
    pub const ALL: [BankProvider; 3] = [Self::EcoBank, Self::StanbicBank, Self::CentenaryBank];

    pub fn label(self) -> &'static str {
        match self {
            Self::EcoBank => "Eco Bank",
            Self::StanbicBank => "Stanbic Bank",
            Self::CentenaryBank => "Centenary Bank",
        }
    }
}

impl MobileMoneyProvider {
    pub const ALL: [MobileMoneyProvider; 2] = [Self::MtnMobileMoney, Self::AirtelMoney];

    pub fn label(self) -> &'static str {
        match self {
            Self::MtnMobileMoney => "MTN Mobile Money",
            Self::AirtelMoney => "Airtel Money",
        }
    }
}

impl DataSource {
    pub fn all() -> impl Iterator<Item = DataSource> {
        BankProvider::ALL
            .into_iter()
            .map(DataSource::Bank)
            .chain(MobileMoneyProvider::ALL.into_iter().map(DataSource::MobileMoney))
    }

    pub fn kind(self) -> SourceKind {
        match self {
            Self::Bank(_) => SourceKind::BankStatement,
            Self::MobileMoney(_) => SourceKind::MobileMoney,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bank(bank) => bank.label(),
            Self::MobileMoney(provider) => provider.label(),
        }
    }

    pub fn identity(self) -> DataSourceIdentity {
        DataSourceIdentity::new(self.label())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DataSource {
    type Err = StatementChatError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        // "Airtel Mobile Money" is how the provider picker labels Airtel.
        if wanted.eq_ignore_ascii_case("Airtel Mobile Money") {
            return Ok(Self::MobileMoney(MobileMoneyProvider::AirtelMoney));
        }
        Self::all()
            .find(|source| source.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StatementChatError::UnknownSource(s.to_string()))
    }
}
