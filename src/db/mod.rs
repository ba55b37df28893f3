//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: the single owner of the pool; everything else talks to it via [`DbActorHandle`]

pub mod actor;
pub mod models;
pub mod patch;
pub mod schema;

mod patch_impl;

pub use models::{
    ActivityStatus, ActivityType, ApiProvider, ConfigStatus, DbApiActivity, DbApiConfiguration,
    DbCampaign, DbCampaignMetrics,
};
pub use patch::{
    ActivityCreate, CampaignUpsert, ConfigurationPatch, ConfigurationPatchEnvelope,
    ConfigurationUpsert, DbPatchable, MetricsUpsert,
};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};
