use crate::db::models::{
    ApiProvider, DbApiActivity, DbApiConfiguration, DbCampaign, DbCampaignMetrics,
};
use crate::db::patch::{
    ActivityCreate, CampaignUpsert, ConfigurationPatchEnvelope, ConfigurationUpsert, DbPatchable,
    MetricsUpsert,
};
use crate::db::schema::{SQLITE_INIT, schema_statements};
use crate::error::AdpulseError;
use chrono::{DateTime, NaiveDate, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::types::Json;
use std::{str::FromStr, time::Duration};
use tracing::info;

type Reply<T> = RpcReplyPort<Result<T, AdpulseError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Create (or upsert by (user_id, provider)) a configuration and return its id.
    UpsertConfiguration(ConfigurationUpsert, Reply<i64>),

    /// Patch status/expiry/test timestamp of a configuration.
    PatchConfiguration(ConfigurationPatchEnvelope, Reply<()>),

    GetConfiguration(i64, Reply<Option<DbApiConfiguration>>),

    GetUserConfiguration(String, ApiProvider, Reply<Option<DbApiConfiguration>>),

    /// Every stored configuration, system-wide.
    ListConfigurations(Reply<Vec<DbApiConfiguration>>),

    ListUserConfigurations(String, Reply<Vec<DbApiConfiguration>>),

    /// Delete a configuration owned by the given user; returns whether a row was removed.
    DeleteConfiguration(i64, String, Reply<bool>),

    /// Upsert a campaign by (api_config_id, campaign_id) and return its row id.
    UpsertCampaign(CampaignUpsert, Reply<i64>),

    ListCampaigns(i64, Reply<Vec<DbCampaign>>),

    /// Most recent `last_sync_at` across a configuration's cached campaigns.
    LatestCampaignSync(i64, Reply<Option<DateTime<Utc>>>),

    UpsertMetrics(MetricsUpsert, Reply<()>),

    /// Cached metrics for a configuration within an inclusive date range.
    ListMetrics(i64, NaiveDate, NaiveDate, Reply<Vec<DbCampaignMetrics>>),

    InsertActivity(ActivityCreate, Reply<i64>),

    /// Newest-first activity log for a user.
    ListUserActivities(String, u32, Reply<Vec<DbApiActivity>>),

    /// Oldest-first activity log for a configuration.
    ListConfigActivities(i64, Reply<Vec<DbApiActivity>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

fn rpc_err(op: &str, e: impl std::fmt::Display) -> AdpulseError {
    AdpulseError::RactorError(format!("DbActor {op} RPC failed: {e}"))
}

impl DbActorHandle {
    pub async fn upsert_configuration(
        &self,
        upsert: ConfigurationUpsert,
    ) -> Result<i64, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::UpsertConfiguration, upsert)
            .map_err(|e| rpc_err("UpsertConfiguration", e))?
    }

    pub async fn patch_configuration(
        &self,
        patch: ConfigurationPatchEnvelope,
    ) -> Result<(), AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::PatchConfiguration, patch)
            .map_err(|e| rpc_err("PatchConfiguration", e))?
    }

    pub async fn get_configuration(
        &self,
        id: i64,
    ) -> Result<Option<DbApiConfiguration>, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::GetConfiguration, id)
            .map_err(|e| rpc_err("GetConfiguration", e))?
    }

    pub async fn get_user_configuration(
        &self,
        user_id: &str,
        provider: ApiProvider,
    ) -> Result<Option<DbApiConfiguration>, AdpulseError> {
        ractor::call!(
            self.actor,
            DbActorMessage::GetUserConfiguration,
            user_id.to_string(),
            provider
        )
        .map_err(|e| rpc_err("GetUserConfiguration", e))?
    }

    pub async fn list_configurations(&self) -> Result<Vec<DbApiConfiguration>, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::ListConfigurations)
            .map_err(|e| rpc_err("ListConfigurations", e))?
    }

    pub async fn list_user_configurations(
        &self,
        user_id: &str,
    ) -> Result<Vec<DbApiConfiguration>, AdpulseError> {
        ractor::call!(
            self.actor,
            DbActorMessage::ListUserConfigurations,
            user_id.to_string()
        )
        .map_err(|e| rpc_err("ListUserConfigurations", e))?
    }

    pub async fn delete_configuration(
        &self,
        id: i64,
        user_id: &str,
    ) -> Result<bool, AdpulseError> {
        ractor::call!(
            self.actor,
            DbActorMessage::DeleteConfiguration,
            id,
            user_id.to_string()
        )
        .map_err(|e| rpc_err("DeleteConfiguration", e))?
    }

    pub async fn upsert_campaign(&self, upsert: CampaignUpsert) -> Result<i64, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::UpsertCampaign, upsert)
            .map_err(|e| rpc_err("UpsertCampaign", e))?
    }

    pub async fn list_campaigns(
        &self,
        api_config_id: i64,
    ) -> Result<Vec<DbCampaign>, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::ListCampaigns, api_config_id)
            .map_err(|e| rpc_err("ListCampaigns", e))?
    }

    pub async fn latest_campaign_sync(
        &self,
        api_config_id: i64,
    ) -> Result<Option<DateTime<Utc>>, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::LatestCampaignSync, api_config_id)
            .map_err(|e| rpc_err("LatestCampaignSync", e))?
    }

    pub async fn upsert_metrics(&self, upsert: MetricsUpsert) -> Result<(), AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::UpsertMetrics, upsert)
            .map_err(|e| rpc_err("UpsertMetrics", e))?
    }

    pub async fn list_metrics(
        &self,
        api_config_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DbCampaignMetrics>, AdpulseError> {
        ractor::call!(
            self.actor,
            DbActorMessage::ListMetrics,
            api_config_id,
            start,
            end
        )
        .map_err(|e| rpc_err("ListMetrics", e))?
    }

    pub async fn insert_activity(&self, create: ActivityCreate) -> Result<i64, AdpulseError> {
        ractor::call!(self.actor, DbActorMessage::InsertActivity, create)
            .map_err(|e| rpc_err("InsertActivity", e))?
    }

    pub async fn list_user_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<DbApiActivity>, AdpulseError> {
        ractor::call!(
            self.actor,
            DbActorMessage::ListUserActivities,
            user_id.to_string(),
            limit
        )
        .map_err(|e| rpc_err("ListUserActivities", e))?
    }

    pub async fn list_config_activities(
        &self,
        api_config_id: i64,
    ) -> Result<Vec<DbApiActivity>, AdpulseError> {
        ractor::call!(
            self.actor,
            DbActorMessage::ListConfigActivities,
            api_config_id
        )
        .map_err(|e| rpc_err("ListConfigActivities", e))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::UpsertConfiguration(upsert, reply) => {
                let _ = reply.send(upsert_configuration(pool, upsert).await);
            }
            DbActorMessage::PatchConfiguration(patch, reply) => {
                let _ = reply.send(patch.apply_patch(pool).await);
            }
            DbActorMessage::GetConfiguration(id, reply) => {
                let _ = reply.send(get_configuration(pool, id).await);
            }
            DbActorMessage::GetUserConfiguration(user_id, provider, reply) => {
                let _ = reply.send(get_user_configuration(pool, &user_id, provider).await);
            }
            DbActorMessage::ListConfigurations(reply) => {
                let _ = reply.send(list_configurations(pool, None).await);
            }
            DbActorMessage::ListUserConfigurations(user_id, reply) => {
                let _ = reply.send(list_configurations(pool, Some(&user_id)).await);
            }
            DbActorMessage::DeleteConfiguration(id, user_id, reply) => {
                let _ = reply.send(delete_configuration(pool, id, &user_id).await);
            }
            DbActorMessage::UpsertCampaign(upsert, reply) => {
                let _ = reply.send(upsert_campaign(pool, upsert).await);
            }
            DbActorMessage::ListCampaigns(api_config_id, reply) => {
                let _ = reply.send(list_campaigns(pool, api_config_id).await);
            }
            DbActorMessage::LatestCampaignSync(api_config_id, reply) => {
                let _ = reply.send(latest_campaign_sync(pool, api_config_id).await);
            }
            DbActorMessage::UpsertMetrics(upsert, reply) => {
                let _ = reply.send(upsert_metrics(pool, upsert).await);
            }
            DbActorMessage::ListMetrics(api_config_id, start, end, reply) => {
                let _ = reply.send(list_metrics(pool, api_config_id, start, end).await);
            }
            DbActorMessage::InsertActivity(create, reply) => {
                let _ = reply.send(insert_activity(pool, create).await);
            }
            DbActorMessage::ListUserActivities(user_id, limit, reply) => {
                let _ = reply.send(list_user_activities(pool, &user_id, limit).await);
            }
            DbActorMessage::ListConfigActivities(api_config_id, reply) => {
                let _ = reply.send(list_config_activities(pool, api_config_id).await);
            }
        }
        Ok(())
    }
}

const CONFIGURATION_COLUMNS: &str = "id, user_id, user_email, provider, client_id, client_secret, \
     developer_token, refresh_token, customer_id, login_customer_id, status, token_expiry, \
     last_tested_at, created_at, updated_at";

const ACTIVITY_COLUMNS: &str = "id, user_id, api_config_id, provider, activity_type, status, \
     title, description, metadata, created_at";

async fn upsert_configuration(
    pool: &SqlitePool,
    c: ConfigurationUpsert,
) -> Result<i64, AdpulseError> {
    let now = Utc::now();
    // Fresh credentials are untested: status goes back to INACTIVE until a connection test.
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO api_configurations (
            user_id, user_email, provider, client_id, client_secret, developer_token,
            refresh_token, customer_id, login_customer_id, status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'INACTIVE', ?, ?)
        ON CONFLICT(user_id, provider) DO UPDATE SET
            user_email = COALESCE(excluded.user_email, user_email),
            client_id = excluded.client_id,
            client_secret = excluded.client_secret,
            developer_token = excluded.developer_token,
            refresh_token = excluded.refresh_token,
            customer_id = excluded.customer_id,
            login_customer_id = excluded.login_customer_id,
            status = 'INACTIVE',
            token_expiry = NULL,
            updated_at = excluded.updated_at
        RETURNING id
        ",
    )
    .bind(c.user_id)
    .bind(c.user_email)
    .bind(c.provider)
    .bind(c.client_id)
    .bind(c.client_secret)
    .bind(c.developer_token)
    .bind(c.refresh_token)
    .bind(c.customer_id)
    .bind(c.login_customer_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn get_configuration(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<DbApiConfiguration>, AdpulseError> {
    let row = sqlx::query_as::<_, DbApiConfiguration>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM api_configurations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn get_user_configuration(
    pool: &SqlitePool,
    user_id: &str,
    provider: ApiProvider,
) -> Result<Option<DbApiConfiguration>, AdpulseError> {
    let row = sqlx::query_as::<_, DbApiConfiguration>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM api_configurations WHERE user_id = ? AND provider = ?"
    ))
    .bind(user_id)
    .bind(provider)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn list_configurations(
    pool: &SqlitePool,
    user_id: Option<&str>,
) -> Result<Vec<DbApiConfiguration>, AdpulseError> {
    let rows = match user_id {
        Some(user_id) => {
            sqlx::query_as::<_, DbApiConfiguration>(&format!(
                "SELECT {CONFIGURATION_COLUMNS} FROM api_configurations WHERE user_id = ? ORDER BY id"
            ))
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbApiConfiguration>(&format!(
                "SELECT {CONFIGURATION_COLUMNS} FROM api_configurations ORDER BY id"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

async fn delete_configuration(
    pool: &SqlitePool,
    id: i64,
    user_id: &str,
) -> Result<bool, AdpulseError> {
    let res = sqlx::query("DELETE FROM api_configurations WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected() > 0)
}

async fn upsert_campaign(pool: &SqlitePool, c: CampaignUpsert) -> Result<i64, AdpulseError> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO campaigns (
            api_config_id, campaign_id, name, status, channel_type, budget_micros,
            start_date, end_date, last_sync_at, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(api_config_id, campaign_id) DO UPDATE SET
            name = excluded.name,
            status = excluded.status,
            channel_type = excluded.channel_type,
            budget_micros = excluded.budget_micros,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            last_sync_at = excluded.last_sync_at,
            updated_at = excluded.updated_at
        RETURNING id
        ",
    )
    .bind(c.api_config_id)
    .bind(c.campaign_id)
    .bind(c.name)
    .bind(c.status)
    .bind(c.channel_type)
    .bind(c.budget_micros)
    .bind(c.start_date)
    .bind(c.end_date)
    .bind(c.synced_at)
    .bind(c.synced_at)
    .bind(c.synced_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn list_campaigns(
    pool: &SqlitePool,
    api_config_id: i64,
) -> Result<Vec<DbCampaign>, AdpulseError> {
    let rows = sqlx::query_as::<_, DbCampaign>(
        r"
        SELECT id, api_config_id, campaign_id, name, status, channel_type, budget_micros,
               start_date, end_date, last_sync_at, created_at, updated_at
        FROM campaigns
        WHERE api_config_id = ?
        ORDER BY name, campaign_id
        ",
    )
    .bind(api_config_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn latest_campaign_sync(
    pool: &SqlitePool,
    api_config_id: i64,
) -> Result<Option<DateTime<Utc>>, AdpulseError> {
    let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
        r"
        SELECT last_sync_at
        FROM campaigns
        WHERE api_config_id = ?
        ORDER BY last_sync_at DESC
        LIMIT 1
        ",
    )
    .bind(api_config_id)
    .fetch_optional(pool)
    .await?;

    Ok(latest)
}

async fn upsert_metrics(pool: &SqlitePool, m: MetricsUpsert) -> Result<(), AdpulseError> {
    let now = Utc::now();
    sqlx::query(
        r"
        INSERT INTO campaign_metrics (
            campaign_row_id, date, impressions, clicks, cost_micros, conversions,
            conversions_value, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(campaign_row_id, date) DO UPDATE SET
            impressions = excluded.impressions,
            clicks = excluded.clicks,
            cost_micros = excluded.cost_micros,
            conversions = excluded.conversions,
            conversions_value = excluded.conversions_value,
            updated_at = excluded.updated_at
        ",
    )
    .bind(m.campaign_row_id)
    .bind(m.date)
    .bind(m.impressions)
    .bind(m.clicks)
    .bind(m.cost_micros)
    .bind(m.conversions)
    .bind(m.conversions_value)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

async fn list_metrics(
    pool: &SqlitePool,
    api_config_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DbCampaignMetrics>, AdpulseError> {
    let rows = sqlx::query_as::<_, DbCampaignMetrics>(
        r"
        SELECT m.id, m.campaign_row_id, c.campaign_id, c.name AS campaign_name, m.date,
               m.impressions, m.clicks, m.cost_micros, m.conversions, m.conversions_value,
               m.updated_at
        FROM campaign_metrics m
        JOIN campaigns c ON c.id = m.campaign_row_id
        WHERE c.api_config_id = ? AND m.date >= ? AND m.date <= ?
        ORDER BY m.date, c.campaign_id
        ",
    )
    .bind(api_config_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn insert_activity(pool: &SqlitePool, a: ActivityCreate) -> Result<i64, AdpulseError> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO api_activities (
            user_id, api_config_id, provider, activity_type, status, title, description,
            metadata, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(a.user_id)
    .bind(a.api_config_id)
    .bind(a.provider)
    .bind(a.activity_type)
    .bind(a.status)
    .bind(a.title)
    .bind(a.description)
    .bind(Json(a.metadata))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn list_user_activities(
    pool: &SqlitePool,
    user_id: &str,
    limit: u32,
) -> Result<Vec<DbApiActivity>, AdpulseError> {
    let rows = sqlx::query_as::<_, DbApiActivity>(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM api_activities WHERE user_id = ? ORDER BY id DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn list_config_activities(
    pool: &SqlitePool,
    api_config_id: i64,
) -> Result<Vec<DbApiActivity>, AdpulseError> {
    let rows = sqlx::query_as::<_, DbApiActivity>(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM api_activities WHERE api_config_id = ? ORDER BY id"
    ))
    .bind(api_config_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> DbActorHandle {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .expect("failed to spawn DbActor");

    DbActorHandle { actor }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), AdpulseError> {
    for stmt in schema_statements(SQLITE_INIT) {
        sqlx::query(&stmt).execute(pool).await?;
    }
    Ok(())
}
