use std::sync::Arc;

use chrono::{TimeZone, Utc};
use volwatch_domain::forecast::ForecastResult;
use volwatch_domain::shared::{DomainError, UserId};
use volwatch_domain::user::UserRepository;

mod test_helpers;

fn uid(s: &str) -> UserId {
    UserId::parse(s).expect("valid uid")
}

async fn get_or_create_is_idempotent(repo: Arc<dyn UserRepository>) {
    let first = repo.get_or_create(&uid("100")).await.expect("Create user");
    assert!(first.threshold().is_none());

    let mut updated = first.clone();
    updated.set_threshold(Some(900));
    repo.save(&updated).await.expect("Save user");

    // A second registration must not reset stored settings
    let second = repo.get_or_create(&uid("100")).await.expect("Get user");
    assert_eq!(second.threshold(), Some(900));
}

async fn save_and_find_round_trip(repo: Arc<dyn UserRepository>) {
    let now = Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap();
    let mut user = repo.get_or_create(&uid("200")).await.expect("Create user");
    user.set_threshold(Some(900));
    user.set_interval(30).expect("Set interval");
    user.record_forecast(&ForecastResult {
        observed_at: now,
        forecast: 999,
        current_value: 500,
    });
    assert_eq!(user.evaluate_thresholds(now).len(), 1);

    repo.save(&user).await.expect("Save user");
    let found = repo.find_by_id(&uid("200")).await.expect("Find user");

    assert_eq!(found, user);
    assert_eq!(found.forecast_exceeded_notified_at(), Some(now));
    assert!(found.volume_exceeded_notified_at().is_none());
}

async fn missing_user_is_not_found(repo: Arc<dyn UserRepository>) {
    let err = repo.find_by_id(&uid("404")).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

async fn list_ids_returns_registered_users(repo: Arc<dyn UserRepository>) {
    assert!(repo.list_ids().await.expect("List users").is_empty());

    for id in ["3", "1", "2"] {
        repo.get_or_create(&uid(id)).await.expect("Create user");
    }

    let ids = repo.list_ids().await.expect("List users");
    assert_eq!(ids, vec![uid("1"), uid("2"), uid("3")]);
}

async fn concurrent_registration_creates_one_record(repo: Arc<dyn UserRepository>) {
    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move { repo.get_or_create(&uid("77")).await }));
    }
    for handle in handles {
        let record = handle.await.expect("Join").expect("Register");
        assert_eq!(record.uid().as_str(), "77");
    }

    assert_eq!(repo.list_ids().await.expect("List users"), vec![uid("77")]);
}

#[tokio::test]
async fn sqlite_get_or_create_is_idempotent() {
    get_or_create_is_idempotent(test_helpers::setup_sqlite_repo().await).await;
}

#[tokio::test]
async fn json_get_or_create_is_idempotent() {
    let (repo, _dir) = test_helpers::setup_json_repo();
    get_or_create_is_idempotent(repo).await;
}

#[tokio::test]
async fn sqlite_save_and_find_round_trip() {
    save_and_find_round_trip(test_helpers::setup_sqlite_repo().await).await;
}

#[tokio::test]
async fn json_save_and_find_round_trip() {
    let (repo, _dir) = test_helpers::setup_json_repo();
    save_and_find_round_trip(repo).await;
}

#[tokio::test]
async fn sqlite_missing_user_is_not_found() {
    missing_user_is_not_found(test_helpers::setup_sqlite_repo().await).await;
}

#[tokio::test]
async fn json_missing_user_is_not_found() {
    let (repo, _dir) = test_helpers::setup_json_repo();
    missing_user_is_not_found(repo).await;
}

#[tokio::test]
async fn sqlite_list_ids_returns_registered_users() {
    list_ids_returns_registered_users(test_helpers::setup_sqlite_repo().await).await;
}

#[tokio::test]
async fn json_list_ids_returns_registered_users() {
    let (repo, _dir) = test_helpers::setup_json_repo();
    list_ids_returns_registered_users(repo).await;
}

#[tokio::test]
async fn sqlite_concurrent_registration_creates_one_record() {
    concurrent_registration_creates_one_record(test_helpers::setup_sqlite_repo().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn json_concurrent_registration_creates_one_record() {
    let (repo, _dir) = test_helpers::setup_json_repo();
    concurrent_registration_creates_one_record(repo).await;
}
