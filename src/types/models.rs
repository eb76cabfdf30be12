use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

/// Currencies a project treasury can denominate in. Anything outside
/// FLOW/USDC is carried by symbol and contributes nothing to USD totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Currency {
    Flow,
    Usdc,
    Other(String),
}

impl Currency {
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "FLOW" => Currency::Flow,
            "USDC" => Currency::Usdc,
            other => Currency::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Currency::Flow => "FLOW",
            Currency::Usdc => "USDC",
            Currency::Other(symbol) => symbol,
        }
    }
}

/// A project as registered in the database. Token-less projects have no
/// contract address or symbol.
#[derive(Debug, Clone)]
pub struct Project {
    pub project_id: String,
    pub contract_address: Option<String>,
    pub token_symbol: Option<String>,
    pub owner: String,
}

#[derive(Debug, Clone)]
pub struct FundEventData {
    pub token_symbol: String,
    pub amount: f64,
    pub by: String,
}

/// One funding contribution, as recorded by the event log.
#[derive(Debug, Clone)]
pub struct FundEvent {
    pub project_id: String,
    pub timestamp: OffsetDateTime,
    pub data: FundEventData,
}

#[derive(Debug, Clone)]
pub struct ProposalEvent {
    pub project_id: String,
    #[allow(dead_code)]
    pub timestamp: OffsetDateTime,
}

/// DEX pair reserves for a project token against its payment currency.
#[derive(Debug, Clone)]
pub struct PairInfo {
    pub token0_key: String,
    pub token0_reserve: f64,
    pub token1_key: String,
    pub token1_reserve: f64,
}

/// Per-project on-chain state returned by the chunked trending query.
#[derive(Debug, Clone)]
pub struct ChainProjectSnapshot {
    pub payment_currency: Currency,
    pub max_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub holders: Vec<String>,
    pub funders: Vec<String>,
    pub num_proposals: u32,
    pub pair_info: Option<PairInfo>,
    pub treasury_balances: HashMap<String, f64>,
    #[allow(dead_code)]
    pub total_funding: f64,
}

/// Volume/TVL pair from the external token-info lookup. The upstream
/// response is positional; it is decoded into this struct once at the
/// adapter boundary and nothing downstream sees indices.
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub tvl: Option<f64>,
    pub volume_24h: Option<f64>,
}

/// The denormalized leaderboard row, fully recomputed every cycle and
/// upserted keyed by project_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingRecord {
    pub project_id: String,
    pub week_funding: f64,
    pub total_supply: Option<f64>,
    pub payment_currency: String,
    pub num_holders: u32,
    pub max_supply: Option<f64>,
    pub num_proposals: u32,
    pub num_participants: u32,
    pub price: Option<f64>,
    pub treasury_value: Option<f64>,
    pub volume_24h: Option<f64>,
    pub tvl: Option<f64>,
}

impl RankingRecord {
    /// A fresh record with everything zeroed/nulled except the token info
    /// already looked up for the project.
    pub fn initial(project_id: &str, token_info: Option<TokenInfo>) -> Self {
        RankingRecord {
            project_id: project_id.to_string(),
            week_funding: 0.0,
            total_supply: None,
            payment_currency: String::new(),
            num_holders: 0,
            max_supply: None,
            num_proposals: 0,
            num_participants: 0,
            price: None,
            treasury_value: None,
            volume_24h: token_info.and_then(|info| info.volume_24h),
            tvl: token_info.and_then(|info| info.tvl),
        }
    }
}
