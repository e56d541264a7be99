mod auth_support;

use std::fs;

use chrono::{Duration, Utc};
use gauth::auth::{AuthError, FileTokenStore, TokenStore, TokenStoreConfig};
use gauth::error::GauthError;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

use auth_support::credential;

fn file_store() -> (TempDir, FileTokenStore) {
    let dir = TempDir::new().unwrap();
    let store = FileTokenStore::new(TokenStoreConfig::new(dir.path().to_path_buf()));
    (dir, store)
}

#[test]
fn saved_file_uses_flat_json_layout() {
    let (dir, store) = file_store();
    store
        .save("work", &credential("access-1", Some("refresh-1"), Duration::hours(1)))
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("tokens").join("work.json")).unwrap();
    let json: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["access_token"], "access-1");
    assert_eq!(json["refresh_token"], "refresh-1");
    assert_eq!(json["scopes"], serde_json::json!(["openid", "profile"]));
    let expires_at = json["expires_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(expires_at).is_ok());
}

#[test]
fn empty_refresh_token_and_scopes_are_omitted() {
    let (_dir, store) = file_store();
    let mut record = credential("access-1", None, Duration::hours(1));
    record.scopes.clear();
    store.save("default", &record).unwrap();

    let raw = fs::read_to_string(store.path_for("default")).unwrap();
    let json: Value = serde_json::from_str(&raw).unwrap();
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2, "unexpected keys: {keys:?}");
    assert!(json.get("refresh_token").is_none());
    assert!(json.get("scopes").is_none());
}

#[test]
fn file_written_by_hand_loads() {
    let (dir, store) = file_store();
    let tokens = dir.path().join("tokens");
    fs::create_dir_all(&tokens).unwrap();
    let expires_at = (Utc::now() + Duration::hours(2)).to_rfc3339();
    fs::write(
        tokens.join("legacy.json"),
        format!(
            r#"{{"access_token":"hand-written","refresh_token":"","expires_at":"{expires_at}"}}"#
        ),
    )
    .unwrap();

    let loaded = store.load("legacy").unwrap();
    assert_eq!(loaded.access_token, "hand-written");
    assert_eq!(loaded.refresh_token, None);
    assert!(loaded.scopes.is_empty());
}

#[test]
fn missing_and_corrupt_records_are_distinguished() {
    let (dir, store) = file_store();
    assert!(matches!(store.load("work"), Err(AuthError::NotLoggedIn)));

    fs::create_dir_all(dir.path().join("tokens")).unwrap();
    fs::write(store.path_for("work"), "{ not json").unwrap();
    let err = store.load("work").unwrap_err();
    assert!(matches!(err, AuthError::CorruptCredential(_)), "got {err:?}");
    assert!(err.requires_login());
}

#[test]
fn write_failure_is_not_reported_as_logged_out() {
    let (_dir, store) = file_store();
    // A non-empty directory where the record belongs makes the rename fail.
    let blocker = store.path_for("default");
    fs::create_dir_all(blocker.join("occupied")).unwrap();

    let err = store
        .save("default", &credential("access", None, Duration::hours(1)))
        .unwrap_err();
    assert!(matches!(err, AuthError::Storage(_)), "got {err:?}");
    assert!(!err.requires_login());

    let err = GauthError::from(err);
    assert_eq!(err.exit_code(), 1);
    assert_eq!(err.hint(), None);
    assert!(err.to_string().contains("default.json"));

    let err = store.delete("default").unwrap_err();
    assert!(matches!(err, AuthError::Storage(_)), "got {err:?}");
}

#[test]
fn overwrite_leaves_no_temp_files_behind() {
    let (dir, store) = file_store();
    for round in 0..3 {
        store
            .save(
                "work",
                &credential(&format!("access-{round}"), None, Duration::hours(1)),
            )
            .unwrap();
    }

    let names: Vec<String> = fs::read_dir(dir.path().join("tokens"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["work.json".to_string()]);
    assert_eq!(store.load("work").unwrap().access_token, "access-2");
}

#[test]
fn profiles_are_isolated() {
    let (_dir, store) = file_store();
    store
        .save("default", &credential("default-access", None, Duration::hours(1)))
        .unwrap();
    store
        .save("work", &credential("work-access", None, Duration::hours(1)))
        .unwrap();

    store.delete("work").unwrap();
    store.delete("work").unwrap();

    assert!(matches!(store.load("work"), Err(AuthError::NotLoggedIn)));
    assert_eq!(store.load("default").unwrap().access_token, "default-access");
    assert_eq!(store.profiles().unwrap(), vec!["default".to_string()]);
}

#[cfg(unix)]
#[test]
fn tokens_directory_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, store) = file_store();
    store
        .save("work", &credential("access", None, Duration::hours(1)))
        .unwrap();
    let mode = fs::metadata(dir.path().join("tokens"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o700);
}
