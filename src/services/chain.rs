use anyhow::{Context, Result};
use governor::{RateLimiter, state::{NotKeyed, InMemoryState}, clock::DefaultClock};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::services::cadence;
use crate::types::models::{ChainProjectSnapshot, Currency, PairInfo};

pub type RpcLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Hard cap of the on-chain trending query: at most this many projects per
/// round-trip.
pub const TRENDING_CHUNK_SIZE: usize = 5;

const TRENDING_DATA_SCRIPT: &str = r#"
import Toucans from 0xToucans
import ToucansTokens from 0xToucans
import FungibleToken from 0xFungibleToken
import FlowToken from 0xFlowToken
import FiatToken from 0xFiatToken

pub struct TrendingData {
  pub let paymentCurrency: String
  pub let totalSupply: UFix64?
  pub let maxSupply: UFix64?
  pub let holders: [Address]
  pub let funders: [Address]
  pub let numProposals: UInt64
  pub let pairInfo: Toucans.PairData?
  pub let treasuryBalances: {String: UFix64}
  pub let totalFunding: UFix64

  init(_ info: Toucans.ProjectInfo) {
    self.paymentCurrency = info.paymentCurrency
    self.totalSupply = info.totalSupply
    self.maxSupply = info.maxSupply
    self.holders = info.holders
    self.funders = info.funders
    self.numProposals = info.numProposals
    self.pairInfo = info.pairInfo
    self.treasuryBalances = info.treasuryBalances
    self.totalFunding = info.totalFunding
  }
}

pub fun main(projectIds: [String], contractAddresses: [Address?], owners: [Address]): {String: TrendingData} {
  let res: {String: TrendingData} = {}
  var i = 0
  while i < projectIds.length {
    let info: Toucans.ProjectInfo? = Toucans.getProjectInfo(
      projectId: projectIds[i],
      contractAddress: contractAddresses[i],
      owner: owners[i]
    )
    if let unwrapped = info {
      res[projectIds[i]] = TrendingData(unwrapped)
    }
    i = i + 1
  }
  return res
}
"#;

/// Cadence script execution against a Flow access node's HTTP API.
pub struct FlowClient {
    http: reqwest::Client,
    access_node: String,
    limiter: Arc<RpcLimiter>,
    trending_script: String,
}

impl FlowClient {
    pub fn new(http: reqwest::Client, limiter: Arc<RpcLimiter>, config: &Config) -> Self {
        let trending_script = TRENDING_DATA_SCRIPT
            .replace("0xToucans", &config.contracts.toucans)
            .replace("0xFungibleToken", &config.contracts.fungible_token)
            .replace("0xFlowToken", &config.contracts.flow_token)
            .replace("0xFiatToken", &config.contracts.fiat_token);

        FlowClient {
            http,
            access_node: config.access_node.trim_end_matches('/').to_string(),
            limiter,
            trending_script,
        }
    }

    /// Latest sealed block height; used as a startup connectivity probe.
    pub async fn latest_block_height(&self) -> Result<u64> {
        let url = format!("{}/v1/blocks?height=sealed", self.access_node);
        let blocks: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let height = blocks
            .get(0)
            .and_then(|block| block.pointer("/header/height"))
            .and_then(Value::as_str)
            .context("malformed block response")?;

        Ok(height.parse()?)
    }

    /// Executes a Cadence script. Both the script and its JSON-CDC arguments
    /// travel base64-encoded, and so does the result.
    async fn execute_script(&self, script: &str, arguments: &[Value]) -> Result<Value> {
        self.limiter.until_ready().await;

        let body = json!({
            "script": base64::encode(script),
            "arguments": arguments
                .iter()
                .map(|arg| base64::encode(arg.to_string()))
                .collect::<Vec<_>>(),
        });

        let url = format!("{}/v1/scripts", self.access_node);
        let encoded: String = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let raw = base64::decode(encoded.trim_end())?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// One chunk of the trending query. All three argument lists run in
    /// parallel positions and are capped at TRENDING_CHUNK_SIZE entries.
    pub async fn get_trending_data(
        &self,
        project_ids: &[String],
        contract_addresses: &[Option<String>],
        owners: &[String],
    ) -> Result<HashMap<String, ChainProjectSnapshot>> {
        anyhow::ensure!(
            project_ids.len() <= TRENDING_CHUNK_SIZE,
            "trending query is capped at {} projects per request",
            TRENDING_CHUNK_SIZE
        );
        anyhow::ensure!(
            project_ids.len() == contract_addresses.len() && project_ids.len() == owners.len(),
            "trending query argument lists must have equal length"
        );

        let arguments = [
            json!({
                "type": "Array",
                "value": project_ids
                    .iter()
                    .map(|id| json!({"type": "String", "value": id}))
                    .collect::<Vec<_>>(),
            }),
            json!({
                "type": "Array",
                "value": contract_addresses
                    .iter()
                    .map(|address| match address {
                        Some(address) => {
                            json!({"type": "Optional", "value": {"type": "Address", "value": address}})
                        }
                        None => json!({"type": "Optional", "value": null}),
                    })
                    .collect::<Vec<_>>(),
            }),
            json!({
                "type": "Array",
                "value": owners
                    .iter()
                    .map(|owner| json!({"type": "Address", "value": owner}))
                    .collect::<Vec<_>>(),
            }),
        ];

        let result = self.execute_script(&self.trending_script, &arguments).await?;
        decode_trending_result(&result)
    }
}

fn decode_trending_result(value: &Value) -> Result<HashMap<String, ChainProjectSnapshot>> {
    let mut snapshots = HashMap::new();
    for (key, entry) in cadence::dictionary_entries(value)? {
        let project_id = cadence::as_str(key)?.to_string();
        snapshots.insert(project_id, decode_snapshot(entry)?);
    }
    Ok(snapshots)
}

fn decode_snapshot(value: &Value) -> Result<ChainProjectSnapshot> {
    let payment_currency = Currency::from_symbol(cadence::as_str(cadence::composite_field(
        value,
        "paymentCurrency",
    )?)?);

    let total_supply = cadence::unwrap_optional(cadence::composite_field(value, "totalSupply")?)?
        .map(cadence::as_f64)
        .transpose()?;
    let max_supply = cadence::unwrap_optional(cadence::composite_field(value, "maxSupply")?)?
        .map(cadence::as_f64)
        .transpose()?;

    let holders = address_list(cadence::composite_field(value, "holders")?)?;
    let funders = address_list(cadence::composite_field(value, "funders")?)?;

    let num_proposals =
        cadence::as_u64(cadence::composite_field(value, "numProposals")?)? as u32;

    let pair_info = cadence::unwrap_optional(cadence::composite_field(value, "pairInfo")?)?
        .map(decode_pair_info)
        .transpose()?;

    let mut treasury_balances = HashMap::new();
    for (symbol, balance) in
        cadence::dictionary_entries(cadence::composite_field(value, "treasuryBalances")?)?
    {
        treasury_balances.insert(cadence::as_str(symbol)?.to_string(), cadence::as_f64(balance)?);
    }

    let total_funding = cadence::as_f64(cadence::composite_field(value, "totalFunding")?)?;

    Ok(ChainProjectSnapshot {
        payment_currency,
        max_supply,
        total_supply,
        holders,
        funders,
        num_proposals,
        pair_info,
        treasury_balances,
        total_funding,
    })
}

fn decode_pair_info(value: &Value) -> Result<PairInfo> {
    Ok(PairInfo {
        token0_key: cadence::as_str(cadence::composite_field(value, "token0Key")?)?.to_string(),
        token0_reserve: cadence::as_f64(cadence::composite_field(value, "token0Reserve")?)?,
        token1_key: cadence::as_str(cadence::composite_field(value, "token1Key")?)?.to_string(),
        token1_reserve: cadence::as_f64(cadence::composite_field(value, "token1Reserve")?)?,
    })
}

fn address_list(value: &Value) -> Result<Vec<String>> {
    cadence::as_array(value)?
        .iter()
        .map(|entry| Ok(cadence::as_str(entry)?.to_string()))
        .collect()
}

/// Project-token price denominated in the payment currency, from DEX pair
/// reserves. The payment side of the pair is identified by its contract
/// name; a drained token side yields no quote.
pub fn quote_token_price(currency: &Currency, pair: &PairInfo) -> Option<f64> {
    let payment_contract = match currency {
        Currency::Flow => "FlowToken",
        Currency::Usdc => "FiatToken",
        Currency::Other(_) => return None,
    };

    let (payment_reserve, token_reserve) = if pair.token0_key.ends_with(payment_contract) {
        (pair.token0_reserve, pair.token1_reserve)
    } else {
        (pair.token1_reserve, pair.token0_reserve)
    };

    if token_reserve > 0.0 {
        Some(payment_reserve / token_reserve)
    } else {
        None
    }
}

/// The store's USD rounding rule: 2 decimals, half away from zero.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
