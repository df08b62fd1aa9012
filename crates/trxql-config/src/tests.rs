use super::*;
use secrecy::ExposeSecret;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn test_defaults_match_generation_contract() {
    let cfg = Config::default();
    assert_eq!(cfg.llm.model, "gpt-3.5-turbo");
    assert!((cfg.llm.temperature - 0.3).abs() < f32::EPSILON);
    assert!(cfg.llm.analysis_temperature > cfg.llm.temperature);
    assert!(cfg.llm.request_timeout_secs.is_none());
    assert!(!cfg.has_api_key());
}

#[test]
fn test_default_web_binds_localhost_8000() {
    let cfg = Config::default();
    assert_eq!(cfg.web.bind_addr(), "127.0.0.1:8000");
    assert_eq!(cfg.web.request_timeout_secs, 30);
}

#[test]
fn test_default_loader_batches() {
    let cfg = Config::default();
    assert_eq!(cfg.loader.read_batch_size, 1_000);
    assert_eq!(cfg.loader.insert_batch_size, 5_000);
    assert_eq!(cfg.analysis.max_rows, 100);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let cfg = Config::from_toml_str(
        r#"
        [llm]
        model = "gpt-4o-mini"

        [web]
        port = 9090
        "#,
    )
    .unwrap();
    assert_eq!(cfg.llm.model, "gpt-4o-mini");
    assert_eq!(cfg.llm.base_url, "https://api.openai.com");
    assert_eq!(cfg.web.port, 9090);
    assert_eq!(cfg.web.host, "127.0.0.1");
    assert_eq!(cfg.database.max_connections, 10);
}

#[test]
fn test_invalid_toml_is_rejected() {
    let err = Config::from_toml_str("[web]\nport = \"not a number\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_env_overrides_file_values() {
    let mut cfg = Config::from_toml_str("[llm]\nmodel = \"from-file\"").unwrap();
    cfg.apply_env(env(&[
        (ENV_API_KEY, "sk-test"),
        (ENV_MODEL, "from-env"),
        (ENV_DATABASE_URL, "postgres://u:p@db/trx"),
        (ENV_PORT, "8123"),
    ]))
    .unwrap();

    assert_eq!(cfg.llm.model, "from-env");
    assert_eq!(cfg.database.url, "postgres://u:p@db/trx");
    assert_eq!(cfg.web.port, 8123);
    assert_eq!(cfg.llm.api_key.as_ref().unwrap().expose_secret(), "sk-test");
}

#[test]
fn test_blank_api_key_counts_as_missing() {
    let mut cfg = Config::default();
    cfg.apply_env(env(&[(ENV_API_KEY, "   ")])).unwrap();
    assert!(!cfg.has_api_key());
}

#[test]
fn test_bad_port_env_is_an_error() {
    let mut cfg = Config::default();
    let err = cfg.apply_env(env(&[(ENV_PORT, "eighty")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_PORT, .. }));
}

#[test]
fn test_api_key_is_redacted_in_debug_output() {
    let mut cfg = Config::default();
    cfg.apply_env(env(&[(ENV_API_KEY, "sk-very-secret")])).unwrap();
    let debug = format!("{:?}", cfg.llm);
    assert!(!debug.contains("sk-very-secret"));
}
