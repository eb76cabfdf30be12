use anyhow::Result;
use chrono::{DateTime, Utc};
use clickhouse::Client;

use crate::db::models::{FundEventRow, ProjectRow, ProposalEventRow, RankingRow};
use crate::types::models::{FundEvent, FundEventData, Project, ProposalEvent, RankingRecord};

fn fund_event_from_row(row: FundEventRow) -> FundEvent {
    FundEvent {
        project_id: row.project_id,
        timestamp: row.timestamp,
        data: FundEventData {
            token_symbol: row.token_symbol,
            amount: row.amount,
            by: row.funder,
        },
    }
}

pub async fn fetch_fund_events_since(
    client: &Client,
    since: DateTime<Utc>,
) -> Result<Vec<FundEvent>> {
    let rows = client
        .query(
            "SELECT project_id, timestamp, token_symbol, amount, funder
             FROM fund_events
             WHERE timestamp >= toDateTime(?)",
        )
        .bind(since.timestamp())
        .fetch_all::<FundEventRow>()
        .await?;

    Ok(rows.into_iter().map(fund_event_from_row).collect())
}

pub async fn fetch_all_fund_events(client: &Client) -> Result<Vec<FundEvent>> {
    let rows = client
        .query(
            "SELECT project_id, timestamp, token_symbol, amount, funder
             FROM fund_events",
        )
        .fetch_all::<FundEventRow>()
        .await?;

    Ok(rows.into_iter().map(fund_event_from_row).collect())
}

// Unfiltered; the aggregator only counts these.
pub async fn fetch_all_proposals(client: &Client) -> Result<Vec<ProposalEvent>> {
    let rows = client
        .query("SELECT project_id, timestamp FROM proposal_events")
        .fetch_all::<ProposalEventRow>()
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProposalEvent {
            project_id: row.project_id,
            timestamp: row.timestamp,
        })
        .collect())
}

pub async fn fetch_all_projects(client: &Client) -> Result<Vec<Project>> {
    let rows = client
        .query(
            "SELECT project_id, contract_address, token_symbol, owner
             FROM projects FINAL",
        )
        .fetch_all::<ProjectRow>()
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Project {
            project_id: row.project_id,
            contract_address: row.contract_address,
            token_symbol: row.token_symbol,
            owner: row.owner,
        })
        .collect())
}

pub async fn fetch_all_rankings(client: &Client) -> Result<Vec<RankingRecord>> {
    let rows = client
        .query(
            "SELECT project_id, week_funding, total_supply, payment_currency,
                    num_holders, max_supply, num_proposals, num_participants,
                    price, treasury_value, volume_24h, tvl
             FROM rankings FINAL
             ORDER BY week_funding DESC",
        )
        .fetch_all::<RankingRow>()
        .await?;

    Ok(rows.into_iter().map(RankingRecord::from).collect())
}
