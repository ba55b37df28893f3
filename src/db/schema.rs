//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `api_configurations` (one (user_id, provider) per row; secrets are vault ciphertext)
/// - `campaigns` (cache, one (api_config_id, campaign_id) per row)
/// - `campaign_metrics` (cache, one (campaign_row_id, date) per row)
/// - `api_activities` (append-only audit trail)
pub const SQLITE_INIT: &str = r"
-- ---------------------------------------------------------------------------
-- Provider configurations
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS api_configurations (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    user_email TEXT NULL,
    provider TEXT NOT NULL,
    client_id TEXT NOT NULL,
    client_secret TEXT NOT NULL,
    developer_token TEXT NOT NULL,
    refresh_token TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    login_customer_id TEXT NULL,
    status TEXT NOT NULL DEFAULT 'INACTIVE',
    token_expiry TEXT NULL, -- RFC3339
    last_tested_at TEXT NULL, -- RFC3339
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(user_id, provider)
);

CREATE INDEX IF NOT EXISTS idx_api_configurations_provider ON api_configurations(provider);

-- ---------------------------------------------------------------------------
-- Campaign cache (one (api_config_id, campaign_id) per row)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY NOT NULL,
    api_config_id INTEGER NOT NULL REFERENCES api_configurations(id) ON DELETE CASCADE,
    campaign_id TEXT NOT NULL,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    channel_type TEXT NULL,
    budget_micros INTEGER NULL,
    start_date TEXT NULL, -- YYYY-MM-DD
    end_date TEXT NULL, -- YYYY-MM-DD
    last_sync_at TEXT NOT NULL, -- RFC3339
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(api_config_id, campaign_id)
);

CREATE INDEX IF NOT EXISTS idx_campaigns_last_sync ON campaigns(api_config_id, last_sync_at);

-- ---------------------------------------------------------------------------
-- Daily metrics cache (one (campaign_row_id, date) per row)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS campaign_metrics (
    id INTEGER PRIMARY KEY NOT NULL,
    campaign_row_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
    date TEXT NOT NULL, -- YYYY-MM-DD
    impressions INTEGER NOT NULL DEFAULT 0,
    clicks INTEGER NOT NULL DEFAULT 0,
    cost_micros INTEGER NOT NULL DEFAULT 0,
    conversions REAL NOT NULL DEFAULT 0,
    conversions_value REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(campaign_row_id, date)
);

CREATE INDEX IF NOT EXISTS idx_campaign_metrics_date ON campaign_metrics(date);

-- ---------------------------------------------------------------------------
-- Activity log (append-only, survives configuration deletion)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS api_activities (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    api_config_id INTEGER NULL REFERENCES api_configurations(id) ON DELETE SET NULL,
    provider TEXT NOT NULL,
    activity_type TEXT NOT NULL,
    status TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}', -- JSON
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_api_activities_user ON api_activities(user_id, id);
CREATE INDEX IF NOT EXISTS idx_api_activities_config ON api_activities(api_config_id);
";

/// Split DDL into executable statements, dropping `--` comments first so punctuation inside
/// them never splits a statement.
pub fn schema_statements(sql: &str) -> Vec<String> {
    let stripped: String = sql
        .lines()
        .map(|line| line.find("--").map_or(line, |at| &line[..at]))
        .collect::<Vec<_>>()
        .join("\n");

    stripped
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
