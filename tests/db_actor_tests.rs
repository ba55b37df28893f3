mod common;

use adpulse::db::{
    ActivityStatus, ActivityType, ApiProvider, CampaignUpsert, ConfigStatus, ConfigurationPatch,
    ConfigurationPatchEnvelope, MetricsUpsert,
};
use adpulse::sync::google_ads_activity;
use chrono::{Duration, Utc};
use common::{day, seed_configuration, temp_db, vault};
use serde_json::json;

fn campaign_upsert(config_id: i64, campaign_id: &str, name: &str) -> CampaignUpsert {
    CampaignUpsert {
        api_config_id: config_id,
        campaign_id: campaign_id.to_string(),
        name: name.to_string(),
        status: "ENABLED".to_string(),
        channel_type: Some("SEARCH".to_string()),
        budget_micros: Some(5_000_000),
        start_date: Some(day("2024-01-01")),
        end_date: None,
        synced_at: Utc::now(),
    }
}

fn metrics_upsert(campaign_row_id: i64, date: &str, clicks: i64) -> MetricsUpsert {
    MetricsUpsert {
        campaign_row_id,
        date: day(date),
        impressions: clicks * 10,
        clicks,
        cost_micros: clicks * 250_000,
        conversions: 0.5,
        conversions_value: 12.5,
    }
}

#[tokio::test]
async fn configuration_resave_replaces_in_place_and_resets_status() {
    let tmp = temp_db("db-config").await;
    let vault = vault();
    let db = &tmp.db;

    assert!(db.list_configurations().await.unwrap().is_empty());
    assert!(
        db.get_user_configuration("u1", ApiProvider::GoogleAds)
            .await
            .unwrap()
            .is_none()
    );

    let id = seed_configuration(db, &vault, "u1", "1234567890").await;
    let stored = db.get_configuration(id).await.unwrap().unwrap();
    assert_eq!(stored.status, ConfigStatus::Active);
    assert_eq!(stored.customer_id, "1234567890");
    assert_ne!(stored.refresh_token, "1//refresh", "secrets are stored encrypted");
    assert_eq!(vault.decrypt(&stored.refresh_token).unwrap(), "1//refresh");

    let expiry = Utc::now() + Duration::hours(1);
    let tested_at = Utc::now();
    db.patch_configuration(ConfigurationPatchEnvelope {
        id,
        patch: ConfigurationPatch {
            status: None,
            token_expiry: Some(expiry),
            last_tested_at: Some(tested_at),
        },
    })
    .await
    .unwrap();
    let patched = db.get_configuration(id).await.unwrap().unwrap();
    assert_eq!(patched.status, ConfigStatus::Active, "unset fields are untouched");
    assert!(patched.token_expiry.is_some());
    assert!(patched.last_tested_at.is_some());

    // Saving again for the same user and provider updates the same row.
    let again = seed_configuration(db, &vault, "u1", "9999999999").await;
    assert_eq!(again, id);
    let all = db.list_configurations().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].customer_id, "9999999999");

    seed_configuration(db, &vault, "u2", "1111111111").await;
    assert_eq!(db.list_configurations().await.unwrap().len(), 2);
    assert_eq!(db.list_user_configurations("u2").await.unwrap().len(), 1);

    // Only the owner can delete.
    assert!(!db.delete_configuration(id, "u2").await.unwrap());
    assert!(db.delete_configuration(id, "u1").await.unwrap());
    assert!(db.get_configuration(id).await.unwrap().is_none());

    tmp.cleanup().await;
}

#[tokio::test]
async fn campaign_and_metrics_upserts_are_idempotent() {
    let tmp = temp_db("db-cache").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;

    assert!(db.latest_campaign_sync(config_id).await.unwrap().is_none());

    let first = db
        .upsert_campaign(campaign_upsert(config_id, "111", "Brand"))
        .await
        .unwrap();
    let second = db
        .upsert_campaign(campaign_upsert(config_id, "111", "Brand (renamed)"))
        .await
        .unwrap();
    assert_eq!(first, second, "same upstream campaign maps to the same row");
    db.upsert_campaign(campaign_upsert(config_id, "222", "Aardvark"))
        .await
        .unwrap();

    let campaigns = db.list_campaigns(config_id).await.unwrap();
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0].name, "Aardvark", "ordered by name");
    assert_eq!(campaigns[1].name, "Brand (renamed)");
    assert!(db.latest_campaign_sync(config_id).await.unwrap().is_some());

    db.upsert_metrics(metrics_upsert(first, "2024-03-01", 4))
        .await
        .unwrap();
    db.upsert_metrics(metrics_upsert(first, "2024-03-01", 9))
        .await
        .unwrap();
    db.upsert_metrics(metrics_upsert(first, "2024-03-05", 1))
        .await
        .unwrap();

    let rows = db
        .list_metrics(config_id, day("2024-03-01"), day("2024-03-31"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2, "one row per campaign and day");
    let march_first = rows.iter().find(|r| r.date == day("2024-03-01")).unwrap();
    assert_eq!(march_first.clicks, 9, "later upsert wins");
    assert_eq!(march_first.campaign_id, "111");
    assert_eq!(march_first.campaign_name, "Brand (renamed)");

    let narrow = db
        .list_metrics(config_id, day("2024-03-02"), day("2024-03-04"))
        .await
        .unwrap();
    assert!(narrow.is_empty());

    // Deleting the configuration drops its cache.
    assert!(db.delete_configuration(config_id, "u1").await.unwrap());
    assert!(db.list_campaigns(config_id).await.unwrap().is_empty());
    assert!(
        db.list_metrics(config_id, day("2024-01-01"), day("2024-12-31"))
            .await
            .unwrap()
            .is_empty()
    );

    tmp.cleanup().await;
}

#[tokio::test]
async fn activities_are_listed_newest_first_and_survive_deletion() {
    let tmp = temp_db("db-activity").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;

    for (kind, status) in [
        (ActivityType::ConfigurationSaved, ActivityStatus::Success),
        (ActivityType::CampaignSync, ActivityStatus::Warning),
        (ActivityType::MetricsSync, ActivityStatus::Error),
    ] {
        db.insert_activity(google_ads_activity(
            "u1",
            Some(config_id),
            kind,
            status,
            "title",
            "description",
            json!({ "kind": format!("{kind:?}") }),
        ))
        .await
        .unwrap();
    }
    db.insert_activity(google_ads_activity(
        "u2",
        None,
        ActivityType::ConnectionTest,
        ActivityStatus::Success,
        "other user",
        "",
        json!({}),
    ))
    .await
    .unwrap();

    let recent = db.list_user_activities("u1", 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].activity_type, ActivityType::MetricsSync);
    assert_eq!(recent[1].activity_type, ActivityType::CampaignSync);
    assert_eq!(recent[1].metadata.0["kind"], "CampaignSync");

    let for_config = db.list_config_activities(config_id).await.unwrap();
    assert_eq!(for_config.len(), 3);
    assert_eq!(for_config[0].activity_type, ActivityType::ConfigurationSaved);

    assert!(db.delete_configuration(config_id, "u1").await.unwrap());
    let kept = db.list_user_activities("u1", 50).await.unwrap();
    assert_eq!(kept.len(), 3, "audit trail outlives the configuration");
    assert!(kept.iter().all(|a| a.api_config_id.is_none()));

    tmp.cleanup().await;
}

#[tokio::test]
async fn store_schema_applies_on_fresh_and_existing_files() {
    let tmp = temp_db("db-reopen").await;
    let vault = vault();
    let config_id = seed_configuration(&tmp.db, &vault, "u1", "1234567890").await;

    // A second actor on the same file re-runs the idempotent DDL.
    let reopened = adpulse::db::spawn(&format!("sqlite:{}", tmp.path.display())).await;
    let stored = reopened.get_configuration(config_id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, "u1");

    reopened
        .insert_activity(google_ads_activity(
            "u1",
            Some(config_id),
            ActivityType::CampaignSync,
            ActivityStatus::Success,
            "after reopen",
            "",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(tmp.db.list_config_activities(config_id).await.unwrap().len(), 1);

    tmp.cleanup().await;
}
