use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_sift_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("SIFT_PORT");
        env::remove_var("SIFT_BIND_ADDR");
        env::remove_var("SIFT_STAGING_ROOT");
        env::remove_var("SIFT_MAX_FILE_SIZE_BYTES");
        env::remove_var("SIFT_MAX_CANDIDATE_FILES");
        env::remove_var("SIFT_ALLOWED_EXTENSIONS");
        env::remove_var("SIFT_PROVIDER_TIMEOUT_SECS");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 5000);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert!(config.staging_root.is_none());
    assert_eq!(config.max_file_size_bytes, DEFAULT_MAX_FILE_SIZE_BYTES);
    assert_eq!(config.max_candidate_files, DEFAULT_MAX_CANDIDATE_FILES);
    assert!(config.allowed_extensions.contains("pdf"));
    assert_eq!(config.allowed_extensions.len(), 1);
    assert_eq!(config.provider_timeout_secs, DEFAULT_PROVIDER_TIMEOUT_SECS);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:5000");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_sift_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 5000);
    assert_eq!(config.max_candidate_files, DEFAULT_MAX_CANDIDATE_FILES);
}

#[test]
#[serial]
fn test_from_env_custom_port() {
    clear_sift_env();

    with_env_vars(&[("SIFT_PORT", "3000")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 3000);
    });
}

#[test]
#[serial]
fn test_from_env_rejects_port_zero() {
    clear_sift_env();

    with_env_vars(&[("SIFT_PORT", "0")], || {
        let err = Config::from_env().expect_err("port 0 should be rejected");
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    });
}

#[test]
#[serial]
fn test_from_env_rejects_garbage_port() {
    clear_sift_env();

    with_env_vars(&[("SIFT_PORT", "not-a-port")], || {
        let err = Config::from_env().expect_err("garbage port should be rejected");
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_from_env_custom_bind_addr() {
    clear_sift_env();

    with_env_vars(&[("SIFT_BIND_ADDR", "0.0.0.0")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(
            config.bind_addr,
            IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
        );
    });
}

#[test]
#[serial]
fn test_from_env_custom_limits() {
    clear_sift_env();

    with_env_vars(
        &[
            ("SIFT_MAX_FILE_SIZE_BYTES", "1024"),
            ("SIFT_MAX_CANDIDATE_FILES", "5"),
            ("SIFT_PROVIDER_TIMEOUT_SECS", "30"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.max_file_size_bytes, 1024);
            assert_eq!(config.max_candidate_files, 5);
            assert_eq!(config.provider_timeout_secs, 30);
        },
    );
}

#[test]
#[serial]
fn test_from_env_rejects_garbage_limit() {
    clear_sift_env();

    with_env_vars(&[("SIFT_MAX_CANDIDATE_FILES", "many")], || {
        let err = Config::from_env().expect_err("garbage limit should be rejected");
        assert!(matches!(err, ConfigError::InvalidLimit { .. }));
    });
}

#[test]
#[serial]
fn test_from_env_extension_list() {
    clear_sift_env();

    with_env_vars(&[("SIFT_ALLOWED_EXTENSIONS", "pdf, .DOCX ,txt")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.allowed_extensions.contains("pdf"));
        assert!(config.allowed_extensions.contains("docx"));
        assert!(config.allowed_extensions.contains("txt"));
        assert_eq!(config.allowed_extensions.len(), 3);
    });
}

#[test]
#[serial]
fn test_from_env_blank_extension_list_keeps_default() {
    clear_sift_env();

    with_env_vars(&[("SIFT_ALLOWED_EXTENSIONS", " , ,")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.allowed_extensions.contains("pdf"));
        assert_eq!(config.allowed_extensions.len(), 1);
    });
}

#[test]
fn test_validate_accepts_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_rejects_missing_staging_root() {
    let config = Config {
        staging_root: Some("/definitely/not/a/real/path".into()),
        ..Default::default()
    };
    let err = config.validate().expect_err("missing path should fail");
    assert!(matches!(err, ConfigError::PathNotFound { .. }));
}

#[test]
fn test_validate_rejects_file_staging_root() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        staging_root: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let err = config.validate().expect_err("file path should fail");
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_rejects_zero_limits() {
    let config = Config {
        max_candidate_files: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidLimit { .. })
    ));

    let config = Config {
        max_file_size_bytes: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidLimit { .. })
    ));
}

#[test]
fn test_validate_rejects_empty_extension_set() {
    let config = Config {
        allowed_extensions: std::collections::HashSet::new(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyExtensionList)
    ));
}

#[test]
fn test_upload_limits_mirror_config() {
    let config = Config {
        max_file_size_bytes: 2048,
        max_candidate_files: 3,
        ..Default::default()
    };
    let limits = config.upload_limits();
    assert_eq!(limits.max_file_size_bytes, 2048);
    assert_eq!(limits.max_candidate_files, 3);
    assert!(limits.allowed_extensions.contains("pdf"));
    assert!(limits.staging_root.is_none());
}
