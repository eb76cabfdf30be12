use serde_json::Value;

use crate::config::Config;
use crate::types::models::TokenInfo;

/// Spot FLOW/USD price. Any transport or parse failure maps to `None`,
/// which the aggregator treats as an abort signal.
pub async fn fetch_flow_price(http: &reqwest::Client, config: &Config) -> Option<f64> {
    let response = match http.get(&config.flow_price_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch FLOW price: {}", e);
            return None;
        }
    };

    let json: Value = match response.json().await {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to parse FLOW price response: {}", e);
            return None;
        }
    };

    parse_flow_price(&json)
}

fn parse_flow_price(json: &Value) -> Option<f64> {
    json.pointer("/data/amount")?
        .as_str()?
        .parse::<f64>()
        .ok()
        .filter(|price| *price > 0.0)
}

/// Volume/TVL lookup for a listed project token. A missing listing and a
/// failed lookup are indistinguishable here; both yield `None` and the
/// ranking fields stay null.
pub async fn fetch_token_info(
    http: &reqwest::Client,
    config: &Config,
    project_id: &str,
    contract_address: &str,
) -> Option<TokenInfo> {
    let url = format!(
        "{}?project={}&address={}",
        config.token_info_url, project_id, contract_address
    );

    let response = match http.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch token info for {}: {}", project_id, e);
            return None;
        }
    };

    let json: Value = match response.json().await {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to parse token info for {}: {}", project_id, e);
            return None;
        }
    };

    parse_token_info(&json)
}

// The upstream payload is positional: index 1 is TVL, index 2 is 24h
// volume. Decoded here once so nothing downstream sees indices. Zero
// values coerce to null, as they did upstream.
fn parse_token_info(json: &Value) -> Option<TokenInfo> {
    let token_info = json.get("tokenInfo")?.as_array()?;
    let pluck = |index: usize| {
        token_info
            .get(index)
            .and_then(number)
            .filter(|value| *value != 0.0)
    };

    Some(TokenInfo {
        tvl: pluck(1),
        volume_24h: pluck(2),
    })
}

fn number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse::<f64>().ok()))
}
