use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{operations, queries};
use crate::services::chain::{quote_token_price, round_usd, FlowClient, TRENDING_CHUNK_SIZE};
use crate::services::oracle;
use crate::types::models::{
    ChainProjectSnapshot, Currency, FundEvent, FundEventData, ProposalEvent, RankingRecord,
};

/// Everything a job run needs, passed explicitly instead of living in
/// process-wide state.
pub struct JobContext {
    pub db: clickhouse::Client,
    pub chain: FlowClient,
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

/// One full ranking cycle: pull the registry, the event logs, the chunked
/// on-chain snapshots and the FLOW price, derive one RankingRecord per
/// project, and upsert the batch. Returns None without writing when the
/// chain data or the price is unusable.
pub async fn gather_trending_projects(ctx: &JobContext) -> Option<Vec<RankingRecord>> {
    let week_ago = Utc::now() - chrono::Duration::days(7);

    // shows activity on the platform
    let fund_events = match queries::fetch_fund_events_since(&ctx.db, week_ago).await {
        Ok(events) => events,
        Err(e) => {
            tracing::error!("Failed to fetch fund events: {:?}", e);
            return None;
        }
    };
    let proposal_events = match queries::fetch_all_proposals(&ctx.db).await {
        Ok(events) => events,
        Err(e) => {
            tracing::error!("Failed to fetch proposals: {:?}", e);
            return None;
        }
    };
    let all_projects = match queries::fetch_all_projects(&ctx.db).await {
        Ok(projects) => projects,
        Err(e) => {
            tracing::error!("Failed to fetch projects: {:?}", e);
            return None;
        }
    };

    let mut records: HashMap<String, RankingRecord> = HashMap::new();
    let mut token_symbols: HashMap<String, String> = HashMap::new();
    for project in &all_projects {
        let token_info = match (&project.contract_address, &project.token_symbol) {
            (Some(address), Some(symbol)) => {
                token_symbols.insert(project.project_id.clone(), symbol.clone());
                oracle::fetch_token_info(&ctx.http, &ctx.config, &project.project_id, address)
                    .await
            }
            _ => None,
        };
        records.insert(
            project.project_id.clone(),
            RankingRecord::initial(&project.project_id, token_info),
        );
    }

    // Chunked on-chain reads, merged by project id. Chunks are independent,
    // so they go out together; the per-request cap still holds.
    let chunk_futures: Vec<_> = all_projects
        .chunks(TRENDING_CHUNK_SIZE)
        .map(|chunk| {
            let project_ids: Vec<String> =
                chunk.iter().map(|p| p.project_id.clone()).collect();
            let addresses: Vec<Option<String>> =
                chunk.iter().map(|p| p.contract_address.clone()).collect();
            let owners: Vec<String> = chunk.iter().map(|p| p.owner.clone()).collect();
            let chain = &ctx.chain;
            async move { chain.get_trending_data(&project_ids, &addresses, &owners).await }
        })
        .collect();

    let mut chain_data: HashMap<String, ChainProjectSnapshot> = HashMap::new();
    for result in futures::future::join_all(chunk_futures).await {
        match result {
            Ok(chunk_data) => chain_data.extend(chunk_data),
            Err(e) => tracing::error!("Trending data chunk failed: {:?}", e),
        }
    }

    let flow_price = oracle::fetch_flow_price(&ctx.http, &ctx.config).await;

    let records = build_rankings(
        records,
        &token_symbols,
        &fund_events,
        &proposal_events,
        chain_data,
        flow_price,
        week_ago,
    )?;

    if let Err(e) = operations::upsert_rankings(&ctx.db, &records).await {
        tracing::error!("Error upserting rankings: {:?}", e);
    }

    Some(records)
}

/// The merge/derivation core, separated from I/O. Aborts (None) when the
/// merged chain data is empty or no usable price is available.
fn build_rankings(
    mut records: HashMap<String, RankingRecord>,
    token_symbols: &HashMap<String, String>,
    fund_events: &[FundEvent],
    proposal_events: &[ProposalEvent],
    chain_data: HashMap<String, ChainProjectSnapshot>,
    flow_price: Option<f64>,
    week_ago: DateTime<Utc>,
) -> Option<Vec<RankingRecord>> {
    if chain_data.is_empty() {
        tracing::warn!("Invalid blockchain data.");
        return None;
    }
    let flow_price = match flow_price {
        Some(price) => price,
        None => {
            tracing::warn!("Invalid flow price.");
            return None;
        }
    };

    // last week's funding; the source already filtered to the window, the
    // timestamp is re-checked anyway
    for event in fund_events {
        let usd = usd_amount(&event.data, flow_price);
        if usd > 0.0 && event.timestamp.unix_timestamp() > week_ago.timestamp() {
            if let Some(record) = records.get_mut(&event.project_id) {
                record.week_funding += usd;
            }
        }
    }

    for event in proposal_events {
        if let Some(record) = records.get_mut(&event.project_id) {
            record.num_proposals += 1;
        }
    }

    for (project_id, snapshot) in &chain_data {
        if let Some(record) = records.get_mut(project_id) {
            merge_snapshot(
                record,
                snapshot,
                token_symbols.get(project_id).map(String::as_str),
                flow_price,
            );
        }
    }

    Some(records.into_values().collect())
}

/// USD value of one funding contribution. Events in currencies other than
/// FLOW/USDC contribute nothing to the funding total.
fn usd_amount(data: &FundEventData, flow_price: f64) -> f64 {
    match Currency::from_symbol(&data.token_symbol) {
        Currency::Usdc => data.amount,
        Currency::Flow => data.amount * flow_price,
        Currency::Other(_) => 0.0,
    }
}

fn merge_snapshot(
    record: &mut RankingRecord,
    snapshot: &ChainProjectSnapshot,
    token_symbol: Option<&str>,
    flow_price: f64,
) {
    record.total_supply = snapshot.total_supply;
    record.max_supply = snapshot.max_supply;
    record.payment_currency = snapshot.payment_currency.as_str().to_string();
    record.num_holders = snapshot.holders.len() as u32;

    // holders plus any funders not already holding; a membership scan is
    // fine at these list sizes
    let funders_only = snapshot
        .funders
        .iter()
        .filter(|funder| !snapshot.holders.contains(funder))
        .count();
    record.num_participants = (snapshot.holders.len() + funders_only) as u32;

    // the on-chain count adds to the event-log tally
    record.num_proposals += snapshot.num_proposals;

    if let Some(pair_info) = &snapshot.pair_info {
        record.price = quote_token_price(&snapshot.payment_currency, pair_info)
            .map(round_usd)
            .filter(|price| *price > 0.0);
    }

    record.week_funding = round_usd(record.week_funding);

    // a FLOW-denominated quote still has to land in USD
    if snapshot.payment_currency == Currency::Flow {
        if let Some(price) = record.price {
            record.price = Some(round_usd(price * flow_price));
        }
    }

    let usdc = snapshot.treasury_balances.get("USDC").copied().unwrap_or(0.0);
    let flow = snapshot.treasury_balances.get("FLOW").copied().unwrap_or(0.0);
    let mut balance = usdc + flow * flow_price;
    if let Some(price) = record.price {
        let token_balance = token_symbol
            .and_then(|symbol| snapshot.treasury_balances.get(symbol))
            .copied()
            .unwrap_or(0.0);
        balance += token_balance * price;
    }
    record.treasury_value = Some(round_usd(balance));
}

/// Dormant batch utility: re-credits every funder's running USD total from
/// the full fund-event history. Every event is converted at one current
/// price, regardless of when it happened.
pub async fn refill_user_funding(ctx: &JobContext) -> Result<usize> {
    let fund_events = queries::fetch_all_fund_events(&ctx.db).await?;
    let flow_price = oracle::fetch_flow_price(&ctx.http, &ctx.config)
        .await
        .ok_or_else(|| anyhow::anyhow!("flow price unavailable"))?;

    for event in &fund_events {
        let amount = match Currency::from_symbol(&event.data.token_symbol) {
            Currency::Flow => round_usd(event.data.amount * flow_price),
            Currency::Usdc => round_usd(event.data.amount),
            Currency::Other(_) => 0.0,
        };
        if let Err(e) =
            operations::save_fund_without_event(&ctx.db, &event.project_id, &event.data.by, amount)
                .await
        {
            tracing::error!(
                "Failed to credit {} on {}: {:?}",
                event.data.by,
                event.project_id,
                e
            );
        }
    }

    Ok(fund_events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::models::{PairInfo, TokenInfo};
    use time::OffsetDateTime;

    fn fund_event(project_id: &str, symbol: &str, amount: f64, days_ago: i64) -> FundEvent {
        FundEvent {
            project_id: project_id.to_string(),
            timestamp: OffsetDateTime::now_utc() - time::Duration::days(days_ago),
            data: FundEventData {
                token_symbol: symbol.to_string(),
                amount,
                by: "0xfunder".to_string(),
            },
        }
    }

    fn proposal_event(project_id: &str) -> ProposalEvent {
        ProposalEvent {
            project_id: project_id.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    fn snapshot(currency: Currency) -> ChainProjectSnapshot {
        ChainProjectSnapshot {
            payment_currency: currency,
            max_supply: None,
            total_supply: None,
            holders: Vec::new(),
            funders: Vec::new(),
            num_proposals: 0,
            pair_info: None,
            treasury_balances: HashMap::new(),
            total_funding: 0.0,
        }
    }

    fn week_ago() -> DateTime<Utc> {
        Utc::now() - chrono::Duration::days(7)
    }

    fn records_for(ids: &[&str]) -> HashMap<String, RankingRecord> {
        ids.iter()
            .map(|id| (id.to_string(), RankingRecord::initial(id, None)))
            .collect()
    }

    #[test]
    fn aborts_on_empty_chain_data() {
        let result = build_rankings(
            records_for(&["alpha"]),
            &HashMap::new(),
            &[],
            &[],
            HashMap::new(),
            Some(1.0),
            week_ago(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn aborts_on_missing_price() {
        let mut chain_data = HashMap::new();
        chain_data.insert("alpha".to_string(), snapshot(Currency::Usdc));

        let result = build_rankings(
            records_for(&["alpha"]),
            &HashMap::new(),
            &[],
            &[],
            chain_data,
            None,
            week_ago(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn converts_fund_events_per_currency() {
        let flow_price = 0.5;
        assert_eq!(
            usd_amount(&fund_event("p", "FLOW", 10.0, 0).data, flow_price),
            5.0
        );
        assert_eq!(
            usd_amount(&fund_event("p", "USDC", 2.5, 0).data, flow_price),
            2.5
        );
        assert_eq!(
            usd_amount(&fund_event("p", "BLP", 100.0, 0).data, flow_price),
            0.0
        );
    }

    #[test]
    fn stale_events_fail_the_window_recheck() {
        let mut chain_data = HashMap::new();
        chain_data.insert("alpha".to_string(), snapshot(Currency::Usdc));

        let events = vec![
            fund_event("alpha", "USDC", 3.0, 0),
            fund_event("alpha", "USDC", 99.0, 8),
        ];
        let records = build_rankings(
            records_for(&["alpha"]),
            &HashMap::new(),
            &events,
            &[],
            chain_data,
            Some(1.0),
            week_ago(),
        )
        .unwrap();

        assert_eq!(records[0].week_funding, 3.0);
    }

    #[test]
    fn participants_count_unions_holders_and_funders() {
        let mut snap = snapshot(Currency::Usdc);
        snap.holders = vec!["0x01".into(), "0x02".into()];
        snap.funders = vec!["0x02".into(), "0x03".into()];

        let mut record = RankingRecord::initial("alpha", None);
        merge_snapshot(&mut record, &snap, None, 1.0);
        assert_eq!(record.num_holders, 2);
        assert_eq!(record.num_participants, 3);

        // funders already holding add nothing
        snap.funders = vec!["0x01".into()];
        let mut record = RankingRecord::initial("alpha", None);
        merge_snapshot(&mut record, &snap, None, 1.0);
        assert_eq!(record.num_participants, record.num_holders);
    }

    #[test]
    fn proposal_counts_are_summed_not_replaced() {
        let mut snap = snapshot(Currency::Usdc);
        snap.num_proposals = 2;
        let mut chain_data = HashMap::new();
        chain_data.insert("alpha".to_string(), snap);

        let proposals = vec![proposal_event("alpha"), proposal_event("alpha")];
        let records = build_rankings(
            records_for(&["alpha"]),
            &HashMap::new(),
            &[],
            &proposals,
            chain_data,
            Some(1.0),
            week_ago(),
        )
        .unwrap();

        assert_eq!(records[0].num_proposals, 4);
    }

    #[test]
    fn usd_fields_are_rounded_to_cents() {
        let mut snap = snapshot(Currency::Flow);
        snap.treasury_balances.insert("FLOW".to_string(), 1.0);

        let mut chain_data = HashMap::new();
        chain_data.insert("alpha".to_string(), snap);

        // 1/3 FLOW at 1.0 = 0.333..., rounds to 0.33
        let events = vec![fund_event("alpha", "FLOW", 1.0 / 3.0, 0)];
        let records = build_rankings(
            records_for(&["alpha"]),
            &HashMap::new(),
            &events,
            &[],
            chain_data,
            Some(1.0),
            week_ago(),
        )
        .unwrap();

        assert_eq!(records[0].week_funding, 0.33);
        assert_eq!(records[0].treasury_value, Some(1.0));
    }

    // The end-to-end scenario: two projects, one with a listed token and a
    // USDC pair, one with neither; three fund events across FLOW, USDC and
    // an unsupported currency; one proposal event plus an on-chain count.
    #[test]
    fn end_to_end_two_project_cycle() {
        let flow_price = 0.5;

        let mut records = HashMap::new();
        records.insert(
            "alpha".to_string(),
            RankingRecord::initial(
                "alpha",
                Some(TokenInfo {
                    tvl: Some(500.0),
                    volume_24h: Some(100.0),
                }),
            ),
        );
        records.insert("beta".to_string(), RankingRecord::initial("beta", None));

        let mut token_symbols = HashMap::new();
        token_symbols.insert("alpha".to_string(), "EMLD".to_string());

        let events = vec![
            fund_event("alpha", "FLOW", 10.0, 1),
            fund_event("alpha", "USDC", 2.5, 2),
            fund_event("alpha", "BLP", 100.0, 3),
        ];
        let proposals = vec![proposal_event("alpha")];

        let mut alpha = snapshot(Currency::Usdc);
        alpha.total_supply = Some(1000.0);
        alpha.max_supply = Some(2000.0);
        alpha.holders = vec!["0x01".into(), "0x02".into()];
        alpha.funders = vec!["0x02".into(), "0x03".into()];
        alpha.num_proposals = 2;
        alpha.pair_info = Some(PairInfo {
            token0_key: "A.b19436aae4d94622.FiatToken".to_string(),
            token0_reserve: 100.0,
            token1_key: "A.abc.EmeraldToken".to_string(),
            token1_reserve: 400.0,
        });
        alpha.treasury_balances.insert("USDC".to_string(), 100.0);
        alpha.treasury_balances.insert("FLOW".to_string(), 10.0);
        alpha.treasury_balances.insert("EMLD".to_string(), 40.0);

        let mut beta = snapshot(Currency::Flow);
        beta.funders = vec!["0x05".into()];
        beta.treasury_balances.insert("FLOW".to_string(), 20.0);

        let mut chain_data = HashMap::new();
        chain_data.insert("alpha".to_string(), alpha);
        chain_data.insert("beta".to_string(), beta);

        let results = build_rankings(
            records,
            &token_symbols,
            &events,
            &proposals,
            chain_data,
            Some(flow_price),
            week_ago(),
        )
        .unwrap();

        let alpha = results.iter().find(|r| r.project_id == "alpha").unwrap();
        let beta = results.iter().find(|r| r.project_id == "beta").unwrap();

        // 10 FLOW at 0.5 plus 2.5 USDC; the BLP event contributes nothing
        assert_eq!(alpha.week_funding, 7.5);
        // one event-log proposal plus two on-chain
        assert_eq!(alpha.num_proposals, 3);
        assert_eq!(alpha.num_holders, 2);
        assert_eq!(alpha.num_participants, 3);
        // 100 USDC in the pair against 400 tokens
        assert_eq!(alpha.price, Some(0.25));
        // 100 USDC + 10 FLOW * 0.5 + 40 EMLD * 0.25
        assert_eq!(alpha.treasury_value, Some(115.0));
        assert_eq!(alpha.tvl, Some(500.0));
        assert_eq!(alpha.volume_24h, Some(100.0));
        assert_eq!(alpha.payment_currency, "USDC");

        assert_eq!(beta.week_funding, 0.0);
        assert_eq!(beta.price, None);
        assert_eq!(beta.tvl, None);
        assert_eq!(beta.volume_24h, None);
        assert_eq!(beta.num_participants, 1);
        // 20 FLOW at 0.5
        assert_eq!(beta.treasury_value, Some(10.0));
    }
}
