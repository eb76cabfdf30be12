pub const PROJECTS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    project_id String,
    contract_address Nullable(String),
    token_symbol Nullable(String),
    owner String,
    created_at DateTime('UTC') DEFAULT now('UTC'),
    PRIMARY KEY (project_id)
) ENGINE = ReplacingMergeTree
"#;

pub const FUND_EVENTS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS fund_events (
    project_id String,
    timestamp DateTime('UTC') DEFAULT now('UTC'),
    token_symbol String,
    amount Float64,
    funder String,
    transaction_id String,
    PRIMARY KEY (project_id, timestamp)
) ENGINE = MergeTree()
"#;

pub const PROPOSAL_EVENTS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS proposal_events (
    project_id String,
    timestamp DateTime('UTC') DEFAULT now('UTC'),
    PRIMARY KEY (project_id, timestamp)
) ENGINE = MergeTree()
"#;

// One row per project, newest run wins at merge time. Reads go through
// FINAL so the API always sees the latest cycle.
pub const RANKINGS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS rankings (
    project_id String,
    week_funding Float64,
    total_supply Nullable(Float64),
    payment_currency String,
    num_holders UInt32,
    max_supply Nullable(Float64),
    num_proposals UInt32,
    num_participants UInt32,
    price Nullable(Float64),
    treasury_value Nullable(Float64),
    volume_24h Nullable(Float64),
    tvl Nullable(Float64),
    updated_at DateTime('UTC') DEFAULT now('UTC'),
    PRIMARY KEY (project_id)
) ENGINE = ReplacingMergeTree(updated_at)
"#;

// Running USD total per (project, funder). Credits are plain inserts,
// the engine folds them into the total.
pub const USER_FUNDING_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user_funding (
    project_id String,
    funder String,
    usd_amount Float64,
    PRIMARY KEY (project_id, funder)
) ENGINE = SummingMergeTree(usd_amount)
"#;
