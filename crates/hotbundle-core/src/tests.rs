use std::path::Path;

use super::*;

#[test]
fn generated_version_ids_use_token_alphabet() {
    let id = VersionId::generate();
    assert_eq!(id.as_str().len(), VERSION_ID_LEN);
    assert!(id.as_str().chars().all(|ch| ch.is_ascii_alphanumeric()));
    VersionId::parse(id.as_str()).expect("generated id must parse");
}

#[test]
fn generated_version_ids_differ() {
    let first = VersionId::generate();
    let second = VersionId::generate();
    assert_ne!(first, second);
}

#[test]
fn version_id_rejects_path_like_input() {
    for value in ["", "..", "a/b", "abc\\def", "abc def", "abc.zip"] {
        assert!(
            VersionId::parse(value).is_err(),
            "'{value}' must be rejected as a version id"
        );
    }
}

#[test]
fn version_id_from_str_round_trips_display() {
    let id: VersionId = "Ab3dE6gH9k".parse().expect("must parse");
    assert_eq!(id.to_string(), "Ab3dE6gH9k");
}

#[test]
fn descriptor_parses_version_and_url() {
    let body = br#"{"version":"1.2.0","url":"https://example.test/bundle.zip"}"#;
    let parsed = RemoteVersionDescriptor::from_json_slice(body)
        .expect("must parse")
        .expect("must contain descriptor");
    assert_eq!(parsed.version, "1.2.0");
    assert_eq!(parsed.url, "https://example.test/bundle.zip");
}

#[test]
fn descriptor_missing_field_is_no_update() {
    let missing_url = br#"{"version":"1.2.0"}"#;
    let missing_version = br#"{"url":"https://example.test/bundle.zip"}"#;
    let blank_url = br#"{"version":"1.2.0","url":""}"#;
    for body in [&missing_url[..], &missing_version[..], &blank_url[..]] {
        let parsed = RemoteVersionDescriptor::from_json_slice(body).expect("must parse json");
        assert!(parsed.is_none());
    }
}

#[test]
fn descriptor_ignores_extra_fields() {
    let body = br#"{"version":"2.0.0","url":"https://example.test/b.zip","checksum":"abc"}"#;
    let parsed = RemoteVersionDescriptor::from_json_slice(body).expect("must parse");
    assert!(parsed.is_some());
}

#[test]
fn descriptor_rejects_non_json_body() {
    let err = RemoteVersionDescriptor::from_json_slice(b"<html>502</html>")
        .expect_err("html must not parse");
    assert!(err.to_string().contains("failed to parse version metadata"));
}

#[test]
fn pointer_serializes_with_persisted_key_names() {
    let pointer = ActivationPointer::new(
        Path::new("/data/versions/abc"),
        Path::new("/persist/NoCloud/ionic_built_snapshots/abc"),
        "1.0.0",
    );
    let value = serde_json::to_value(&pointer).expect("must serialize");
    assert_eq!(value["lastPathHot"], "/data/versions/abc");
    assert_eq!(
        value["lastPathPersist"],
        "/persist/NoCloud/ionic_built_snapshots/abc"
    );
    assert_eq!(value["versionName"], "1.0.0");
}

#[test]
fn pointer_missing_keys_default_to_empty() {
    let pointer: ActivationPointer =
        serde_json::from_str(r#"{"versionName":"x"}"#).expect("must parse");
    assert_eq!(pointer.hot_path, "");
    assert_eq!(pointer.persist_path, "");
    assert!(!pointer.is_active());
    assert!(!ActivationPointer::default().is_active());
}

#[test]
fn stats_payload_uses_wire_field_names() {
    let identity = DeviceIdentity {
        platform: "ios".to_string(),
        device_id: "dev-1".to_string(),
        version_build: "42".to_string(),
        app_id: "com.example.app".to_string(),
    };
    let payload = identity.payload(StatsAction::SetFail, "1.0.0");
    let value = serde_json::to_value(&payload).expect("must serialize");
    assert_eq!(value["platform"], "ios");
    assert_eq!(value["action"], "set_fail");
    assert_eq!(value["device_id"], "dev-1");
    assert_eq!(value["version_name"], "1.0.0");
    assert_eq!(value["version_build"], "42");
    assert_eq!(value["app_id"], "com.example.app");
}

#[test]
fn stats_action_tokens() {
    assert_eq!(StatsAction::Set.as_str(), "set");
    assert_eq!(StatsAction::SetFail.as_str(), "set_fail");
    assert_eq!(StatsAction::Delete.as_str(), "delete");
    assert_eq!(StatsAction::Reset.as_str(), "reset");
}

#[test]
fn stats_action_serializes_as_its_token() {
    for action in [
        StatsAction::Set,
        StatsAction::SetFail,
        StatsAction::Delete,
        StatsAction::Reset,
    ] {
        let value = serde_json::to_value(action).expect("must serialize");
        assert_eq!(value, serde_json::Value::from(action.as_str()));
    }
}

#[test]
fn noop_reporter_accepts_every_action() {
    let reporter: &dyn StatsReporter = &NoopStatsReporter;
    for action in [
        StatsAction::Set,
        StatsAction::SetFail,
        StatsAction::Delete,
        StatsAction::Reset,
    ] {
        reporter.report(action, "1.0.0");
    }
    assert!(reporter.flush(std::time::Duration::ZERO));
}
