// tests/config_properties.rs

mod common;

use std::io::Write;

use minerlaunch::config::{load_and_validate, load_or_default, ConfigFile, MinerSection};
use minerlaunch::errors::LaunchError;
use minerlaunch::types::FetcherKind;
use proptest::prelude::*;

use common::ConfigFileBuilder;

fn write_toml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

proptest! {
    #[test]
    fn donate_level_accepted_only_up_to_100(level in any::<u8>()) {
        let mut raw = ConfigFileBuilder::new("work").build_raw();
        raw.miner.donate_level = level;

        let result = ConfigFile::try_from(raw);
        if level <= 100 {
            prop_assert!(result.is_ok(), "{result:?}");
        } else {
            prop_assert!(matches!(result, Err(LaunchError::ConfigError(_))));
        }
    }

    #[test]
    fn miner_args_keep_fixed_shape(
        url in "[a-z0-9.]{1,20}:[0-9]{2,5}",
        user in "[A-Za-z0-9]{1,40}",
        pass in "[ -~]{0,12}",
        donate in 0u8..=100,
        tls in any::<bool>(),
        extra in proptest::collection::vec("--[a-z-]{1,10}", 0..4),
    ) {
        let miner = MinerSection {
            url: url.clone(),
            user: user.clone(),
            pass: pass.clone(),
            donate_level: donate,
            tls,
            tls_fingerprint: None,
            extra_args: extra.clone(),
        };

        let args = miner.to_args();

        prop_assert_eq!(&args[..8], &[
            "--url".to_string(), url,
            "--user".to_string(), user,
            "--pass".to_string(), pass,
            "--donate-level".to_string(), donate.to_string(),
        ]);
        let tls_flags = usize::from(tls);
        prop_assert_eq!(args.len(), 8 + tls_flags + extra.len());
        prop_assert_eq!(&args[8 + tls_flags..], &extra[..]);
    }
}

#[test]
fn tls_fingerprint_follows_tls_flag() {
    let fp = "a".repeat(64);
    let cfg = ConfigFileBuilder::new("work").tls(Some(&fp)).build();

    let args = cfg.miner.to_args();
    let tls_at = args.iter().position(|a| a == "--tls").unwrap();
    assert_eq!(args[tls_at + 1], "--tls-fingerprint");
    assert_eq!(args[tls_at + 2], fp);
}

#[test]
fn partial_file_fills_in_defaults() {
    let file = write_toml(
        r#"
[fetch]
preferred = "builtin"

[miner]
pass = "rig-01"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.fetch.preferred, FetcherKind::Builtin);
    assert_eq!(cfg.miner.pass, "rig-01");
    assert_eq!(cfg.miner.url, MinerSection::default().url);
    assert!(cfg.miner.tls);
    assert!(cfg.miner.fingerprint().is_some());
    assert_eq!(cfg.artifact.executable, "xmrig");
}

#[test]
fn builder_toml_round_trips_through_the_loader() {
    let builder = ConfigFileBuilder::new("/srv/miner")
        .fetcher(FetcherKind::External)
        .extra_arg("--threads=2");
    let file = write_toml(&builder.to_toml());

    let loaded = load_and_validate(file.path()).unwrap();
    let expected = builder.build();

    assert_eq!(loaded.artifact.work_dir, expected.artifact.work_dir);
    assert_eq!(loaded.artifact.archive_url, expected.artifact.archive_url);
    assert_eq!(loaded.fetch.preferred, FetcherKind::External);
    assert_eq!(loaded.miner.fingerprint(), None);
    assert_eq!(loaded.miner.to_args(), expected.miner.to_args());
}

#[test]
fn unknown_fetcher_is_a_toml_error() {
    let file = write_toml("[fetch]\npreferred = \"carrier-pigeon\"\n");

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, LaunchError::TomlError(_)), "{err:?}");
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_toml("[miner\nurl = ");

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, LaunchError::TomlError(_)), "{err:?}");
}

#[test]
fn explicit_missing_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_or_default(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, LaunchError::IoError(_)), "{err:?}");
}
