use anyhow::Result;
use clickhouse::Client;
use crate::db::schema::{
    PROJECTS_SQL,
    FUND_EVENTS_SQL,
    PROPOSAL_EVENTS_SQL,
    RANKINGS_SQL,
    USER_FUNDING_SQL,
};

pub async fn init_database(client: &Client) -> Result<()> {
    tracing::info!("Initializing database tables...");

    // Create tables if they don't exist (won't drop existing data)
    client.query(PROJECTS_SQL).execute().await?;
    client.query(FUND_EVENTS_SQL).execute().await?;
    client.query(PROPOSAL_EVENTS_SQL).execute().await?;
    client.query(RANKINGS_SQL).execute().await?;
    client.query(USER_FUNDING_SQL).execute().await?;

    Ok(())
}
