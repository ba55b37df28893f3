mod common;

use adpulse::db::{
    ActivityStatus, ActivityType, ApiProvider, CampaignUpsert, ConfigStatus, ConfigurationUpsert,
};
use adpulse::sync::{DateRange, SyncOptions, is_stale};
use axum::http::StatusCode;
use chrono::{Days, Duration, Utc};
use common::{
    FakeConnector, FakePlatform, Scripted, campaign, engine, metrics_row, seed_configuration,
    temp_db, vault,
};

fn forced() -> SyncOptions {
    SyncOptions {
        force_sync: true,
        ..SyncOptions::default()
    }
}

#[tokio::test]
async fn staleness_uses_newest_campaign_sync() {
    let tmp = temp_db("sync-stale").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;
    let engine = engine(db, vault, FakeConnector::new(FakePlatform::new(vec![])));

    assert!(engine.should_sync(config_id).await, "never synced");

    let upsert = |synced_at| CampaignUpsert {
        api_config_id: config_id,
        campaign_id: "111".to_string(),
        name: "Brand".to_string(),
        status: "ENABLED".to_string(),
        channel_type: None,
        budget_micros: None,
        start_date: None,
        end_date: None,
        synced_at,
    };

    db.upsert_campaign(upsert(Utc::now() - Duration::hours(25)))
        .await
        .unwrap();
    assert!(engine.should_sync_with_max_age(config_id, 24).await);
    assert!(!engine.should_sync_with_max_age(config_id, 48).await);

    db.upsert_campaign(upsert(Utc::now() - Duration::hours(23)))
        .await
        .unwrap();
    assert!(!engine.should_sync(config_id).await);
    assert!(engine.should_sync_with_max_age(config_id, 12).await);

    tmp.cleanup().await;
}

#[test]
fn staleness_boundary_is_strict() {
    let now = Utc::now();
    let synced = now - Duration::hours(24);
    assert!(!is_stale(synced, now, 24), "exactly max age is still fresh");
    assert!(is_stale(synced - Duration::seconds(1), now, 24));
    assert!(!is_stale(synced + Duration::seconds(1), now, 24));
    assert!(is_stale(now - Duration::seconds(1), now, 0));
    assert!(!is_stale(now, now, 0));
}

#[tokio::test]
async fn sync_fills_cache_and_skips_when_fresh() {
    let tmp = temp_db("sync-fill").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;
    let config = db.get_configuration(config_id).await.unwrap().unwrap();

    let today = Utc::now().date_naive();
    let yesterday = today - Days::new(1);
    let platform = FakePlatform::new(vec![campaign("111", "Brand"), campaign("222", "Generic")]);
    platform.set_metrics(
        "111",
        Scripted::Ok(vec![
            metrics_row("111", yesterday, 100, 10),
            metrics_row("111", today, 50, 5),
        ]),
    );
    platform.set_metrics("222", Scripted::Ok(vec![metrics_row("222", today, 7, 1)]));
    let engine = engine(db, vault, FakeConnector::new(platform.clone()));

    let result = engine
        .sync_configuration(&config, &SyncOptions::default())
        .await;
    assert!(result.success, "errors: {:?}", result.errors);
    assert!(!result.skipped);
    assert_eq!(result.campaigns_synced, 2);
    assert_eq!(result.metrics_records_synced, 3);
    assert_eq!(platform.metrics_calls(), 2, "one upstream call per campaign");

    let activities = db.list_config_activities(config_id).await.unwrap();
    let kinds: Vec<_> = activities.iter().map(|a| a.activity_type).collect();
    assert_eq!(kinds, vec![ActivityType::CampaignSync, ActivityType::MetricsSync]);
    assert!(activities.iter().all(|a| a.status == ActivityStatus::Success));
    assert_eq!(activities[1].metadata.0["recordsSynced"], 3);

    // Fresh cache, not forced: nothing happens and nothing is recorded.
    let again = engine
        .sync_configuration(&config, &SyncOptions::default())
        .await;
    assert!(again.success);
    assert!(again.skipped);
    assert_eq!(platform.campaign_calls(), 1);
    assert_eq!(db.list_config_activities(config_id).await.unwrap().len(), 2);

    tmp.cleanup().await;
}

#[tokio::test]
async fn resync_overwrites_and_never_deletes() {
    let tmp = temp_db("sync-overwrite").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;
    let config = db.get_configuration(config_id).await.unwrap().unwrap();

    let today = Utc::now().date_naive();
    let platform = FakePlatform::new(vec![campaign("111", "Brand"), campaign("222", "Generic")]);
    platform.set_metrics("111", Scripted::Ok(vec![metrics_row("111", today, 100, 10)]));
    let engine = engine(db, vault, FakeConnector::new(platform.clone()));

    engine.sync_configuration(&config, &forced()).await;
    let first = db.list_campaigns(config_id).await.unwrap();
    let first_sync = db.latest_campaign_sync(config_id).await.unwrap().unwrap();

    // Identical data re-synced still moves the sync timestamp.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    engine.sync_configuration(&config, &forced()).await;
    let unchanged = db.list_campaigns(config_id).await.unwrap();
    assert_eq!(unchanged.len(), first.len());
    for (before, after) in first.iter().zip(&unchanged) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.name, after.name);
        assert!(after.last_sync_at > before.last_sync_at);
    }
    let second_sync = db.latest_campaign_sync(config_id).await.unwrap().unwrap();
    assert!(second_sync > first_sync);

    // Upstream drops a campaign and reports new numbers for the same day.
    platform.set_campaigns(Scripted::Ok(vec![campaign("111", "Brand 2025")]));
    platform.set_metrics("111", Scripted::Ok(vec![metrics_row("111", today, 300, 30)]));
    let result = engine.sync_configuration(&config, &forced()).await;
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.campaigns_synced, 1);

    let second = db.list_campaigns(config_id).await.unwrap();
    assert_eq!(second.len(), 2, "campaigns missing upstream stay cached");
    let brand = second.iter().find(|c| c.campaign_id == "111").unwrap();
    let brand_before = first.iter().find(|c| c.campaign_id == "111").unwrap();
    assert_eq!(brand.id, brand_before.id);
    assert_eq!(brand.name, "Brand 2025");

    let rows = db.list_metrics(config_id, today, today).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].clicks, 30);
    assert_eq!(rows[0].impressions, 300);

    tmp.cleanup().await;
}

#[tokio::test]
async fn one_failing_campaign_does_not_sink_the_others() {
    let tmp = temp_db("sync-isolation").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;
    let config = db.get_configuration(config_id).await.unwrap().unwrap();

    let today = Utc::now().date_naive();
    let platform = FakePlatform::new(vec![campaign("111", "Brand"), campaign("222", "Generic")]);
    platform.set_metrics("111", Scripted::Ok(vec![metrics_row("111", today, 100, 10)]));
    platform.set_metrics("222", Scripted::Fail(StatusCode::BAD_REQUEST));
    let engine = engine(db, vault, FakeConnector::new(platform));

    let result = engine.sync_configuration(&config, &forced()).await;
    assert!(!result.success);
    assert_eq!(result.campaigns_synced, 2);
    assert_eq!(result.metrics_records_synced, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("222"));

    let rows = db.list_metrics(config_id, today, today).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].campaign_id, "111");

    let activities = db.list_config_activities(config_id).await.unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[1].activity_type, ActivityType::MetricsSync);
    assert_eq!(activities[1].status, ActivityStatus::Warning);

    tmp.cleanup().await;
}

#[tokio::test]
async fn batch_sync_isolates_failing_configurations() {
    let tmp = temp_db("sync-batch").await;
    let vault = vault();
    let db = &tmp.db;
    let first = seed_configuration(db, &vault, "u1", "1000000001").await;
    let second = seed_configuration(db, &vault, "u2", "1000000002").await;
    let third = seed_configuration(db, &vault, "u3", "1000000003").await;

    let healthy = FakePlatform::new(vec![campaign("111", "Brand")]);
    let broken = FakePlatform::scripted(vec![Scripted::Fail(StatusCode::SERVICE_UNAVAILABLE)]);
    let connector =
        FakeConnector::with_customers(healthy, vec![("1000000002", broken.clone())]);
    let engine = engine(db, vault, connector);

    let results = engine.sync_all_configurations(&forced()).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|r| r.config_id).collect::<Vec<_>>(),
        vec![first, second, third]
    );
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].errors[0].contains("Failed to fetch campaigns"));
    assert!(results[2].success);
    assert_eq!(results[2].campaigns_synced, 1);

    // A non-auth failure leaves the status alone.
    let status = db.get_configuration(second).await.unwrap().unwrap().status;
    assert_eq!(status, ConfigStatus::Active);

    // One row per session call: the failed campaign fetch and the (empty) metrics pass.
    let trail = db.list_config_activities(second).await.unwrap();
    assert_eq!(trail.len(), 2);
    let campaign_rows: Vec<_> = trail
        .iter()
        .filter(|a| a.activity_type == ActivityType::CampaignSync)
        .collect();
    assert_eq!(campaign_rows.len(), 1);
    assert_eq!(campaign_rows[0].status, ActivityStatus::Error);
    assert!(
        campaign_rows[0].description.contains("Could not fetch campaigns"),
        "{}",
        campaign_rows[0].description
    );
    assert_eq!(
        trail
            .iter()
            .filter(|a| a.activity_type == ActivityType::MetricsSync)
            .count(),
        1
    );

    let user_results = engine
        .sync_user_configurations("u3", &forced())
        .await
        .unwrap();
    assert_eq!(user_results.len(), 1);
    assert_eq!(user_results[0].config_id, third);
    assert!(
        engine
            .sync_user_configurations("nobody", &forced())
            .await
            .unwrap()
            .is_empty()
    );

    tmp.cleanup().await;
}

#[tokio::test]
async fn auth_failure_marks_error_and_recovery_reactivates() {
    let tmp = temp_db("sync-auth").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;

    let platform = FakePlatform::scripted(vec![
        Scripted::Fail(StatusCode::UNAUTHORIZED),
        Scripted::Ok(vec![campaign("111", "Brand")]),
    ]);
    let engine = engine(db, vault, FakeConnector::new(platform));

    let config = db.get_configuration(config_id).await.unwrap().unwrap();
    let failed = engine.sync_configuration(&config, &forced()).await;
    assert!(!failed.success);
    let config = db.get_configuration(config_id).await.unwrap().unwrap();
    assert_eq!(config.status, ConfigStatus::Error);

    // ERROR configurations are still synced; a good fetch clears the flag.
    let recovered = engine.sync_configuration(&config, &forced()).await;
    assert!(recovered.success, "errors: {:?}", recovered.errors);
    let config = db.get_configuration(config_id).await.unwrap().unwrap();
    assert_eq!(config.status, ConfigStatus::Active);

    tmp.cleanup().await;
}

#[tokio::test]
async fn unusable_configurations_yield_no_session() {
    let tmp = temp_db("sync-unusable").await;
    let vault = vault();
    let db = &tmp.db;
    let connector = FakeConnector::new(FakePlatform::new(vec![campaign("111", "Brand")]));
    let engine = engine(db, vault.clone(), connector);

    assert!(engine.create_from_api_config(4242).await.unwrap().is_none());

    // Saved but never activated.
    let inactive = db
        .upsert_configuration(ConfigurationUpsert {
            user_id: "u1".to_string(),
            user_email: None,
            provider: ApiProvider::GoogleAds,
            client_id: "cid".to_string(),
            client_secret: vault.encrypt("client-secret").unwrap(),
            developer_token: vault.encrypt("dev-token").unwrap(),
            refresh_token: vault.encrypt("1//refresh").unwrap(),
            customer_id: "1234567890".to_string(),
            login_customer_id: None,
        })
        .await
        .unwrap();
    assert!(engine.create_from_api_config(inactive).await.unwrap().is_none());

    let config = db.get_configuration(inactive).await.unwrap().unwrap();
    let result = engine.sync_configuration(&config, &forced()).await;
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    let trail = db.list_config_activities(inactive).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].activity_type, ActivityType::CampaignSync);
    assert_eq!(trail[0].status, ActivityStatus::Error);
    assert_eq!(trail[0].description, "Configuration is inactive");

    // Secrets encrypted under another key cannot be decrypted.
    let other_vault = adpulse::vault::CredentialVault::new(&[9u8; 32]);
    let foreign = seed_configuration(db, &other_vault, "u2", "2222222222").await;
    assert!(engine.create_from_api_config(foreign).await.unwrap().is_none());

    let foreign_config = db.get_configuration(foreign).await.unwrap().unwrap();
    let result = engine.sync_configuration(&foreign_config, &forced()).await;
    assert!(!result.success);
    assert!(result.errors[0].contains("could not be decrypted"));
    let trail = db.list_config_activities(foreign).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].status, ActivityStatus::Error);
    assert!(trail[0].description.contains("could not be decrypted"));
    assert_eq!(trail[0].metadata.0["configId"], foreign);
    assert_eq!(
        db.get_configuration(foreign).await.unwrap().unwrap().status,
        ConfigStatus::Active,
        "sync never flips status on decryption failure"
    );

    // A configuration deleted between listing and syncing.
    let doomed = seed_configuration(db, &vault, "u4", "4444444444").await;
    let doomed_config = db.get_configuration(doomed).await.unwrap().unwrap();
    assert!(db.delete_configuration(doomed, "u4").await.unwrap());
    let metrics_only = SyncOptions {
        sync_campaigns: false,
        ..forced()
    };
    let result = engine.sync_configuration(&doomed_config, &metrics_only).await;
    assert!(!result.success);
    let trail = db.list_user_activities("u4", 50).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].activity_type, ActivityType::MetricsSync);
    assert_eq!(trail[0].status, ActivityStatus::Error);
    assert!(trail[0].api_config_id.is_none());
    assert_eq!(trail[0].metadata.0["configId"], doomed);

    let active = seed_configuration(db, &vault, "u3", "3333333333").await;
    let session = engine.create_from_api_config(active).await.unwrap().unwrap();
    assert_eq!(session.config_id(), active);
    assert_eq!(session.user_id(), "u3");

    tmp.cleanup().await;
}

#[tokio::test]
async fn explicit_range_and_historical_backfill() {
    let tmp = temp_db("sync-history").await;
    let vault = vault();
    let db = &tmp.db;
    let config_id = seed_configuration(db, &vault, "u1", "1234567890").await;
    let config = db.get_configuration(config_id).await.unwrap().unwrap();

    let today = Utc::now().date_naive();
    let long_ago = today - Days::new(400);
    let platform = FakePlatform::new(vec![campaign("111", "Brand")]);
    platform.set_metrics(
        "111",
        Scripted::Ok(vec![
            metrics_row("111", long_ago, 10, 1),
            metrics_row("111", today, 20, 2),
        ]),
    );
    let engine = engine(db, vault, FakeConnector::new(platform.clone()));

    // Default window only sees today's row.
    let recent = engine.sync_configuration(&config, &forced()).await;
    assert_eq!(recent.metrics_records_synced, 1);

    let range = DateRange::new(long_ago, long_ago).unwrap();
    let ranged = engine
        .sync_configuration(
            &config,
            &SyncOptions {
                force_sync: true,
                sync_campaigns: false,
                date_range: Some(range),
                ..SyncOptions::default()
            },
        )
        .await;
    assert_eq!(ranged.campaigns_synced, 0);
    assert_eq!(ranged.metrics_records_synced, 1);

    let calls_before = platform.metrics_calls();
    let historical = engine
        .sync_configuration(
            &config,
            &SyncOptions {
                force_sync: true,
                sync_campaigns: false,
                historical_years: Some(10),
                ..SyncOptions::default()
            },
        )
        .await;
    assert!(historical.success, "errors: {:?}", historical.errors);
    assert_eq!(historical.metrics_records_synced, 2);

    let activities = db.list_config_activities(config_id).await.unwrap();
    let backfill = activities.last().unwrap();
    assert_eq!(backfill.activity_type, ActivityType::HistoricalSync);
    assert_eq!(backfill.metadata.0["yearsBack"], 5, "clamped to five years");
    let windows = backfill.metadata.0["windows"].as_u64().unwrap();
    assert!(windows > 1, "long ranges are split into windows");
    assert_eq!(
        u64::try_from(platform.metrics_calls() - calls_before).unwrap(),
        windows
    );

    tmp.cleanup().await;
}
