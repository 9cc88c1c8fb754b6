#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};
    use taskboard::api::Backend;
    use taskboard::db::tasks::Tasks;
    use taskboard::libs::config::{Config, ServerConfig, StoreConfig, CONFIG_FILE_NAME};
    use taskboard::libs::data_storage::DataStorage;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    // Every test here repoints HOME; one at a time.
    static HOME_LOCK: Mutex<()> = Mutex::new(());

    struct ConfigTestContext {
        _temp_dir: TempDir,
        _guard: MutexGuard<'static, ()>,
        api_url: String,
        auth_token: String,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let guard = HOME_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            ConfigTestContext {
                _temp_dir: temp_dir,
                _guard: guard,
                api_url: "https://tasks.example.com/api".to_string(),
                auth_token: "token123".to_string(),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.server.is_none());
        assert!(config.store.is_none());
        assert_eq!(StoreConfig::default(), StoreConfig { latency_ms: 0, seed: false });
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_read_nonexistent_config(_ctx: &mut ConfigTestContext) {
        let config = Config::read().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_and_read_config(ctx: &mut ConfigTestContext) {
        let config = Config {
            server: Some(ServerConfig {
                api_url: ctx.api_url.clone(),
                auth_token: Some(ctx.auth_token.clone()),
            }),
            store: Some(StoreConfig {
                latency_ms: 250,
                seed: true,
            }),
        };
        config.save().unwrap();

        let path = DataStorage::new().get_path(CONFIG_FILE_NAME).unwrap();
        assert!(path.exists());
        assert_eq!(Config::read().unwrap(), config);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_read_partial_config(_ctx: &mut ConfigTestContext) {
        let path = DataStorage::new().get_path(CONFIG_FILE_NAME).unwrap();
        std::fs::write(&path, r#"{"server": {"api_url": "http://localhost:3000"}}"#).unwrap();

        let config = Config::read().unwrap();
        let server = config.server.unwrap();
        assert_eq!(server.api_url, "http://localhost:3000");
        assert!(server.auth_token.is_none());
        assert!(config.store.is_none());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_read_invalid_config(_ctx: &mut ConfigTestContext) {
        let path = DataStorage::new().get_path(CONFIG_FILE_NAME).unwrap();
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::read().is_err());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_backend_selection(ctx: &mut ConfigTestContext) {
        let local = Backend::from_config(&Config::default()).unwrap();
        assert!(matches!(local, Backend::Local(_)));

        let remote = Backend::from_config(&Config {
            server: Some(ServerConfig {
                api_url: ctx.api_url.clone(),
                auth_token: None,
            }),
            store: None,
        })
        .unwrap();
        assert!(matches!(remote, Backend::Http(_)));
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_backend_seeds_local_store(_ctx: &mut ConfigTestContext) {
        let config = Config {
            server: None,
            store: Some(StoreConfig {
                latency_ms: 0,
                seed: true,
            }),
        };
        Backend::from_config(&config).unwrap();
        assert_eq!(Tasks::new().unwrap().count().unwrap(), 2);

        // Seeding again leaves the existing tasks alone.
        Backend::from_config(&config).unwrap();
        assert_eq!(Tasks::new().unwrap().count().unwrap(), 2);
    }
}
