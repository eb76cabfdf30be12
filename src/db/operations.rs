use anyhow::Result;
use clickhouse::Client;

use crate::db::models::RankingRow;
use crate::types::models::RankingRecord;

/// One batch write per aggregation cycle. The rankings table is a
/// ReplacingMergeTree keyed by project_id, so re-inserting a project's row
/// overwrites it on conflict.
pub async fn upsert_rankings(client: &Client, records: &[RankingRecord]) -> Result<()> {
    let mut insert = client.insert("rankings")?;
    for record in records {
        insert.write(&RankingRow::from(record)).await?;
    }
    insert.end().await?;

    Ok(())
}

/// Credits a funder's running USD total for a project. The user_funding
/// table is a SummingMergeTree over (project_id, funder), so each credit
/// is a plain insert folded into the total.
pub async fn save_fund_without_event(
    client: &Client,
    project_id: &str,
    funder: &str,
    usd_amount: f64,
) -> Result<()> {
    client
        .query(
            "INSERT INTO user_funding (project_id, funder, usd_amount)
             VALUES (?, ?, ?)",
        )
        .bind(project_id)
        .bind(funder)
        .bind(usd_amount)
        .execute()
        .await?;

    Ok(())
}
