//! Integration tests for sitehub-config

use sitehub_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_requires_secret() {
    let config = SitehubConfig::default();
    assert!(config.validate_all().is_err());

    let mut config = SitehubConfig::default();
    config.auth.jwt_secret = "secret".to_string();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("SITEHUB_JWT_SECRET", Some("env-secret")),
        ("SITEHUB_SERVER_PORT", Some("8080")),
        ("SITEHUB_DB_HOST", Some("10.0.0.5")),
        ("SITEHUB_BASE_DOMAIN", Some("Sites.Example.COM")),
        ("SITEHUB_HOST_BINDING", Some("advisory")),
        ("SITEHUB_LOG_LEVEL", Some("debug")),
        ("SITEHUB_ENVIRONMENT", Some("development")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.auth.jwt_secret, "env-secret");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.provisioning.db_host, "10.0.0.5");
        assert_eq!(config.provisioning.base_domain, "sites.example.com");
        assert_eq!(config.auth.host_binding, HostBindingPolicy::Advisory);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.server.environment, Environment::Development);
    });
}

#[test]
fn test_invalid_env_value_is_reported() {
    let vars = vec![
        ("SITEHUB_JWT_SECRET", Some("env-secret")),
        ("SITEHUB_HOST_BINDING", Some("sometimes")),
    ];

    with_vars(vars, || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
    });
}

#[test]
fn test_yaml_config_file() {
    let yaml = r#"
server:
  port: 4000
  environment: development
registry_database:
  url: "sqlite::memory:"
  max_connections: 4
  min_connections: 1
  connection_timeout: 5
  idle_timeout: 60
provisioning:
  db_host: "172.16.0.10"
  base_domain: "tenants.example.org"
  password_length: 32
pool:
  max_connections: 8
  max_idle: 120
  prune_interval: 15
auth:
  jwt_secret: "file-secret"
  token_expiry: 600
  host_binding: strict
logging:
  level: warn
  format: json
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("SITEHUB_JWT_SECRET", None::<&str>)], || {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.registry_database.max_connections, 4);
        assert_eq!(config.provisioning.password_length, 32);
        assert_eq!(config.pool.max_idle, Duration::from_secs(120));
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.auth.token_expiry, Duration::from_secs(600));
        assert_eq!(config.logging.format, LogFormat::Json);
        // Untouched domains keep their defaults
        assert_eq!(config.admin_database.max_connections, 1);
    });
}

#[test]
fn test_provisioning_validation() {
    let mut config = SitehubConfig::default();
    config.auth.jwt_secret = "secret".to_string();

    config.provisioning.db_host = "%".to_string();
    assert!(config.validate_all().is_err());

    config.provisioning.db_host = "127.0.0.1".to_string();
    config.provisioning.password_length = 8;
    assert!(config.validate_all().is_err());

    config.provisioning.password_length = 24;
    config.provisioning.base_domain = "localhost".to_string();
    assert!(config.validate_all().is_err());
}

#[test]
fn test_pool_validation() {
    let mut config = SitehubConfig::default();
    config.auth.jwt_secret = "secret".to_string();
    config.pool.min_connections = 10;
    config.pool.max_connections = 2;

    let err = config.validate_all().unwrap_err();
    assert!(matches!(err, ConfigError::DomainError { ref domain, .. } if domain == "pool"));
}

#[test]
fn test_yaml_roundtrip_of_sample() {
    let sample = SitehubConfig::generate_sample();
    let parsed: SitehubConfig = serde_yaml::from_str(&sample).unwrap();
    assert!(parsed.validate_all().is_ok());
}
