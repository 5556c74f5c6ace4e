use pluginwatch::Settings;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_env_override_with_nested_keys() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        r#"
[plugins]
plugin_dir = "/from/file"
base_url = "/file"

[server]
bind = "127.0.0.1:1111"
"#,
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("PLUGINWATCH_PLUGINS__PLUGIN_DIR", "/from/env");
        env::set_var("PLUGINWATCH_PLUGINS__IN_CLUSTER", "true");
        env::set_var("PLUGINWATCH_SERVER__BIND", "0.0.0.0:2222");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("PLUGINWATCH_PLUGINS__PLUGIN_DIR");
        env::remove_var("PLUGINWATCH_PLUGINS__IN_CLUSTER");
        env::remove_var("PLUGINWATCH_SERVER__BIND");
    }

    // Environment wins over the file
    assert_eq!(settings.plugins.plugin_dir, PathBuf::from("/from/env"));
    assert!(settings.plugins.in_cluster);
    assert_eq!(settings.server.bind, "0.0.0.0:2222");
    // File value kept where env is silent
    assert_eq!(settings.plugins.base_url, "/file");
    // Default kept where both are silent
    assert_eq!(settings.plugins.watch_interval_secs, 5);
}
