use herald::{BotConfig, ConfigError, CustomAlias};
use herald_core::PermissionOverride;

mod common;
use common::{GUILD, OWNER, config, harness_with};

#[test]
fn test_missing_file_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let loaded = BotConfig::load(&path).unwrap();

    assert!(path.exists());
    assert_eq!(loaded, BotConfig::default());
    assert!(matches!(loaded.validate(), Err(ConfigError::MissingToken)));
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut saved = config();
    saved.command_prefix = "?".into();
    saved.custom_aliases.push(CustomAlias {
        guild_id: GUILD,
        alias: "pong".into(),
        command_id: "status".into(),
    });

    saved.save(&path).unwrap();

    assert_eq!(BotConfig::load(&path).unwrap(), saved);
    assert!(!path.with_extension("toml.tmp").exists());
}

#[test]
fn test_broken_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "token = [").unwrap();

    assert!(matches!(BotConfig::load(&path), Err(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_runtime_changes_are_exported() {
    let h = harness_with(config(), |builder| builder).await;

    h.send(OWNER, "!alias create pong ping").await;
    h.replies(1).await;
    h.send(OWNER, "!permissions say Everyone").await;
    h.replies(2).await;

    let exported = h.client.export_config();
    assert_eq!(exported.token, "test");
    assert_eq!(
        exported.custom_aliases,
        vec![CustomAlias {
            guild_id: GUILD,
            alias: "pong".into(),
            command_id: "status".into(),
        }]
    );
    let say = exported
        .command_options
        .iter()
        .find(|options| options.command_id == "say")
        .expect("say options exported");
    assert_eq!(say.guild_id, GUILD);
    assert_eq!(say.permission_override, PermissionOverride::Everyone);
}
