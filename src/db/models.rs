use clickhouse::Row;
use time::OffsetDateTime;

use crate::types::models::RankingRecord;

#[allow(dead_code)]
#[derive(Debug, Row, serde::Deserialize)]
pub struct ProjectRow {
    pub project_id: String,
    pub contract_address: Option<String>,
    pub token_symbol: Option<String>,
    pub owner: String,
}

#[allow(dead_code)]
#[derive(Debug, Row, serde::Deserialize)]
pub struct FundEventRow {
    pub project_id: String,
    #[serde(with = "clickhouse::serde::time::datetime")]
    pub timestamp: OffsetDateTime,
    pub token_symbol: String,
    pub amount: f64,
    pub funder: String,
}

#[allow(dead_code)]
#[derive(Debug, Row, serde::Deserialize)]
pub struct ProposalEventRow {
    pub project_id: String,
    #[serde(with = "clickhouse::serde::time::datetime")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Row, serde::Serialize, serde::Deserialize)]
pub struct RankingRow {
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

impl From<&RankingRecord> for RankingRow {
    fn from(record: &RankingRecord) -> Self {
        RankingRow {
            project_id: record.project_id.clone(),
            week_funding: record.week_funding,
            total_supply: record.total_supply,
            payment_currency: record.payment_currency.clone(),
            num_holders: record.num_holders,
            max_supply: record.max_supply,
            num_proposals: record.num_proposals,
            num_participants: record.num_participants,
            price: record.price,
            treasury_value: record.treasury_value,
            volume_24h: record.volume_24h,
            tvl: record.tvl,
        }
    }
}

impl From<RankingRow> for RankingRecord {
    fn from(row: RankingRow) -> Self {
        RankingRecord {
            project_id: row.project_id,
            week_funding: row.week_funding,
            total_supply: row.total_supply,
            payment_currency: row.payment_currency,
            num_holders: row.num_holders,
            max_supply: row.max_supply,
            num_proposals: row.num_proposals,
            num_participants: row.num_participants,
            price: row.price,
            treasury_value: row.treasury_value,
            volume_24h: row.volume_24h,
            tvl: row.tvl,
        }
    }
}
