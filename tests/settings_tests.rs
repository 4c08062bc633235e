#[cfg(test)]
mod settings_tests {
    use std::time::Duration;

    use awsresq::app::config::{ClientConfig, ConfigError, Overrides, Settings};
    use awsresq::app::query::FailurePolicy;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_values_used_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "region = \"eu-west-1,eu-central-1\"\ntimeout_secs = 12\nfailure_policy = \"wait-for-deadline\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        let config = ClientConfig::resolve("cloudformation", &Overrides::default(), &settings);

        assert_eq!(config.region_spec, "eu-west-1,eu-central-1");
        assert_eq!(config.engine.timeout_override, Some(Duration::from_secs(12)));
        assert_eq!(config.engine.failure_policy, FailurePolicy::WaitForDeadline);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "region = \"eu-west-1\"\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        let overrides = Overrides {
            region: Some("all".to_string()),
            ..Default::default()
        };
        let config = ClientConfig::resolve("ec2", &overrides, &settings);

        assert_eq!(config.region_spec, "all");
        assert_eq!(config.engine.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        assert_eq!(Settings::load(Some(path.as_path())).unwrap(), Settings::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "regions = \"us-east-1\"\n").unwrap();

        let err = Settings::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_default_path_names_the_tool() {
        if let Some(path) = Settings::default_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains("awsresq"));
        }
    }
}
