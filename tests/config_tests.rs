// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pennywise::cli;
use pennywise::commands::{self, App};
use pennywise::config::{Settings, StoreConfig};
use std::path::PathBuf;

fn settings(args: &[&str]) -> anyhow::Result<Settings> {
    let mut argv = vec!["pennywise"];
    argv.extend_from_slice(args);
    argv.push("doctor");
    let m = cli::build_cli().get_matches_from(argv);
    Settings::from_matches(&m)
}

#[test]
fn absent_descriptors_mean_fixture_mode() {
    assert_eq!(StoreConfig::parse(None).unwrap(), StoreConfig::Absent);
    assert_eq!(StoreConfig::parse(Some("  ")).unwrap(), StoreConfig::Absent);
    assert_eq!(StoreConfig::parse(Some("{}")).unwrap(), StoreConfig::Absent);
}

#[test]
fn descriptor_variants() {
    assert_eq!(
        StoreConfig::parse(Some(r#"{"path":"ledger.sqlite"}"#)).unwrap(),
        StoreConfig::File(PathBuf::from("ledger.sqlite"))
    );
    assert_eq!(
        StoreConfig::parse(Some(r#"{"path":":memory:"}"#)).unwrap(),
        StoreConfig::InMemory
    );
    assert_eq!(
        StoreConfig::parse(Some(r#"{"dataDir":true}"#)).unwrap(),
        StoreConfig::DataDir
    );
}

#[test]
fn malformed_descriptors_are_errors() {
    let err = StoreConfig::parse(Some("{path")).unwrap_err();
    assert!(err.to_string().contains("Invalid store descriptor"));
    assert!(StoreConfig::parse(Some(r#"{"path":""}"#)).is_err());
    assert!(StoreConfig::parse(Some(r#"{"path":"a","dataDir":true}"#)).is_err());
    assert!(StoreConfig::parse(Some(r#"{"apiKey":"x"}"#)).is_err());
    assert!(StoreConfig::parse(Some(r#"{"dataDir":false}"#)).is_err());
    assert!(StoreConfig::parse(Some(r#"{"path":null}"#)).is_err());
    let err = StoreConfig::parse(Some(r#"{"path":null,"dataDir":false}"#)).unwrap_err();
    assert!(err.to_string().contains("names neither"));
}

#[test]
fn fixture_mode_needs_no_sign_in() {
    let s = settings(&["--store", "{}"]).unwrap();
    let gw = s.gateway().unwrap();
    assert!(gw.is_fixture());
    assert_eq!(s.session().unwrap().user_id, "demo");
}

#[test]
fn store_without_user_requires_sign_in() {
    let s = settings(&["--store", r#"{"path":":memory:"}"#]).unwrap();
    assert!(!s.gateway().unwrap().is_fixture());
    let err = s.session().unwrap_err();
    assert!(err.to_string().contains("Sign-in required"));

    let s = settings(&["--store", r#"{"path":":memory:"}"#, "--user", "u1", "--email", "a@b.c"])
        .unwrap();
    let session = s.session().unwrap();
    assert_eq!(session.user_id, "u1");
    assert_eq!(session.email.as_deref(), Some("a@b.c"));
}

#[test]
fn advisor_settings() {
    let s = settings(&["--store", "{}", "--api-key", "k", "--ai-model", "m"]).unwrap();
    assert_eq!(s.ai_model, "m");
    assert!(s.advisor().is_configured());
    let s = settings(&["--store", "{}", "--api-key", ""]).unwrap();
    assert!(!s.advisor().is_configured());
}

#[test]
fn rejected_sign_in_creates_no_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let desc = format!(r#"{{"path":"{}"}}"#, path.display());
    let s = settings(&["--store", &desc]).unwrap();
    let err = App::from_settings(&s).err().unwrap();
    assert!(err.to_string().contains("Sign-in required"));
    assert!(!path.exists());
}

#[test]
fn category_list_ignores_a_broken_store_descriptor() {
    let m = cli::build_cli().get_matches_from(["pennywise", "--store", "{broken", "category", "list"]);
    assert!(commands::dispatch(&m).unwrap());

    let m = cli::build_cli().get_matches_from(["pennywise", "--store", "{broken", "doctor"]);
    assert!(commands::dispatch(&m).is_err());

    let m = cli::build_cli().get_matches_from(["pennywise"]);
    assert!(!commands::dispatch(&m).unwrap());
}
