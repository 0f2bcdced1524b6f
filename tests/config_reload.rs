//! Configuration Loading and Reload Tests
//!
//! Exercises the YAML fixtures under `tests/testdata` through the public
//! loading and hot-reload API.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use sonde::config::{Config, ConfigError, LdapScope, ProberKind, SafeConfig};

// =============================================================================
// Test Helpers
// =============================================================================

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

fn load_err(name: &str) -> String {
    let err = Config::load(fixture(name)).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)), "{name}: {err}");
    err.to_string()
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_good_config() {
    let config = Config::load(fixture("good.yml")).unwrap();
    assert_eq!(config.modules.len(), 6);

    let search = config.module("ldap_search").unwrap();
    assert_eq!(search.prober, Some(ProberKind::Ldap));
    assert_eq!(search.ldap.query.scope(), LdapScope::Sub);
    assert_eq!(search.ldap.bind_simple.password.expose(), "mysecret");

    // No query block: the probe stops after bind.
    let bind = config.module("ldap_bind").unwrap();
    assert!(bind.ldap.query.dn.is_empty());

    let http = config.module("http_2xx").unwrap();
    assert_eq!(http.http.valid_status_codes, vec![200, 204]);
    assert!(http.http.client.basic_auth.is_some());

    let dns = config.module("dns_udp").unwrap();
    assert_eq!(dns.dns.query_name, "example.com");
}

#[test]
fn test_load_errors_name_the_violation() {
    let cases = [
        (
            "bad_unknown_field.yml",
            "unknown fields in dns probe: invalid_extra_field",
        ),
        (
            "invalid_dns_module.yml",
            "Query name must be set for DNS module",
        ),
        ("invalid_ldap_no_dn.yml", "DN is required to query LDAP"),
        ("invalid_ldap_bad_dn.yml", "Invalid DN detected: uid,dc=bar"),
        ("invalid_ldap_bad_scope.yml", "Unknown scope type: foo"),
        (
            "invalid_ldap_bad_filter.yml",
            "Invalid filter detected: not=working)",
        ),
        ("invalid_ldap_bad_bind.yml", "Invalid DN detected: uid,dc=bar"),
        ("invalid_top_level.yml", "unknown fields in config: global"),
    ];

    for (name, expected) in cases {
        let message = load_err(name);
        assert!(
            message.starts_with("Error parsing config file: "),
            "{name}: {message}"
        );
        assert!(message.contains(expected), "{name}: {message}");
    }
}

#[test]
fn test_load_missing_file() {
    let err = Config::load(fixture("does_not_exist.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
    assert!(err.to_string().starts_with("Error reading config file: "));
}

#[test]
fn test_dump_redacts_passwords() {
    let config = Config::load(fixture("good.yml")).unwrap();
    let yaml = config.to_yaml().unwrap();
    assert!(!yaml.contains("mysecret"), "{yaml}");
    assert!(yaml.contains("<secret>"));

    let debug = format!("{config:?}");
    assert!(!debug.contains("mysecret"), "{debug}");
}

// =============================================================================
// Reload
// =============================================================================

#[test]
fn test_reload_keeps_previous_config_on_error() {
    let safe = SafeConfig::default();
    safe.reload(fixture("good.yml")).unwrap();
    let before = safe.current();

    for name in [
        "bad_unknown_field.yml",
        "invalid_dns_module.yml",
        "invalid_ldap_bad_scope.yml",
        "does_not_exist.yml",
    ] {
        assert!(safe.reload(fixture(name)).is_err(), "{name} should fail");
        assert!(Arc::ptr_eq(&before, &safe.current()), "{name} replaced config");
    }
}

#[test]
fn test_reload_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sonde.yml");

    std::fs::write(&path, "modules:\n  icmp:\n    prober: icmp\n").unwrap();
    let safe = SafeConfig::default();
    safe.reload(&path).unwrap();
    assert!(safe.current().module("icmp").is_some());

    std::fs::write(&path, "modules:\n  tcp:\n    prober: tcp\n").unwrap();
    safe.reload(&path).unwrap();
    let current = safe.current();
    assert!(current.module("icmp").is_none());
    assert_eq!(current.module("tcp").unwrap().prober, Some(ProberKind::Tcp));
}

/// Two valid documents whose module names and timeouts change together.
const GENERATION_A: &str = r#"
modules:
  alpha_bind:
    prober: ldap
    timeout: 1s
  alpha_icmp:
    prober: icmp
    timeout: 1s
"#;

const GENERATION_B: &str = r#"
modules:
  beta_bind:
    prober: ldap
    timeout: 2s
  beta_tcp:
    prober: tcp
    timeout: 2s
  beta_dns:
    prober: dns
    timeout: 2s
    dns:
      query_name: example.com
"#;

/// Panics unless `config` is entirely generation A or entirely generation B.
fn assert_single_generation(config: &Config) {
    let names: Vec<&str> = config.modules.keys().map(String::as_str).collect();
    let timeouts: Vec<_> = config.modules.values().map(|m| m.timeout).collect();

    if names == ["alpha_bind", "alpha_icmp"] {
        assert!(timeouts.iter().all(|t| *t == Some(Duration::from_secs(1))));
    } else if names == ["beta_bind", "beta_dns", "beta_tcp"] {
        assert!(timeouts.iter().all(|t| *t == Some(Duration::from_secs(2))));
    } else {
        panic!("mixed configuration snapshot: {names:?} {timeouts:?}");
    }
}

#[test]
fn test_concurrent_reload_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.yml");
    let path_b = dir.path().join("b.yml");
    std::fs::write(&path_a, GENERATION_A).unwrap();
    std::fs::write(&path_b, GENERATION_B).unwrap();

    let safe = Arc::new(SafeConfig::default());
    safe.reload(&path_a).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let safe = Arc::clone(&safe);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    assert_single_generation(&safe.current());
                }
            })
        })
        .collect();

    let writer = {
        let safe = Arc::clone(&safe);
        thread::spawn(move || {
            for i in 0..200 {
                let path = if i % 2 == 0 { &path_b } else { &path_a };
                safe.reload(path).unwrap();
                // A failing reload in between must not disturb readers.
                assert!(safe.reload(fixture("bad_unknown_field.yml")).is_err());
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    // The last successful reload installed generation A.
    let last = safe.current();
    assert_single_generation(&last);
    assert!(last.module("alpha_bind").is_some());
}
