//! Integration tests for loading, populating and dumping YAML files.

mod common;

use std::fs;

use pretty_assertions::assert_eq;
use serde_yaml::Value;
use tempfile::TempDir;

use common::init_test_setup;
use yaml_config::{ConfigFile, Error, LoadOptions, YamlConfigFile};

fn raw(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

#[test]
fn missing_file_is_created_then_populated() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new.yml");

    let mut cfg = YamlConfigFile::open(&path).unwrap();
    assert!(path.exists());
    assert!(!cfg.config().parsed());
    assert!(cfg.config().as_mapping().unwrap().is_empty());

    let defaults = raw("name: demo\nports: [80, 443]");
    assert!(cfg.initial_populate(defaults.clone()).unwrap());
    cfg.dump().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "name: demo\nports:\n- 80\n- 443\n");
    assert!(cfg.config().parsed());
    assert_eq!(cfg.config().dump(), defaults);

    // Second run: the file now has data, defaults are not applied again
    let mut cfg = YamlConfigFile::open(&path).unwrap();
    assert!(!cfg.initial_populate(raw("name: other")).unwrap());
    assert_eq!(cfg.config()["name"].as_str(), Some("demo"));
}

#[test]
fn no_create() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.yml");

    let res = YamlConfigFile::open_with(&path, LoadOptions::new().create(false));
    assert!(matches!(res, Err(Error::Io { .. })));
    assert!(!path.exists());
}

#[test]
fn load_modify_dump() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.yml");
    fs::write(&path, r#"
server:
    host: localhost
    port: 80
features: [a, b]
"#).unwrap();

    let mut cfg = YamlConfigFile::open(&path).unwrap();
    assert_eq!(cfg.config().lookup("server.port").and_then(|n| n.as_i64()), Some(80));

    *cfg.config_mut().lookup_mut("server.port").unwrap() = 8080i64.into();
    cfg.config_mut().as_mapping_mut().unwrap().insert("debug", false);
    cfg.dump().unwrap();

    let expected = "server:\n  host: localhost\n  port: 8080\nfeatures:\n- a\n- b\ndebug: false\n";
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    assert_eq!(cfg.config()["server"]["port"].as_i64(), Some(8080));
}

#[test]
fn dump_reproduces_loaded_data() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.yml");
    let text = r#"
title: "sample"
count: 3
ratio: 0.5
enabled: true
nothing: null
items:
  - plain
  - {nested: [1, 2]}
  - [x, y]
"#;
    fs::write(&path, text).unwrap();

    let mut cfg = YamlConfigFile::open(&path).unwrap();
    cfg.dump().unwrap();

    let reloaded: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reloaded, raw(text));
}

#[test]
fn top_level_sequence_file() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("list.yml");
    fs::write(&path, "[1, \"two\", 3.0, null, true]").unwrap();

    let mut cfg = YamlConfigFile::open(&path).unwrap();
    assert!(cfg.config().parsed());
    assert_eq!(cfg.config().as_sequence().map(Vec::len), Some(5));
    cfg.dump().unwrap();
    assert_eq!(cfg.config().dump(), raw("[1, two, 3.0, null, true]"));
}

#[test]
fn failed_reload_keeps_tree() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.yml");
    fs::write(&path, "a: 1\n").unwrap();
    let mut cfg = YamlConfigFile::open(&path).unwrap();

    fs::write(&path, "a: [1, 2\nb: }").unwrap();
    assert!(matches!(cfg.reload(), Err(Error::Loader(_))));
    assert_eq!(cfg.config()["a"].as_i64(), Some(1));

    fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
    assert!(matches!(cfg.load(), Err(Error::Loader(_))));
    assert_eq!(cfg.config()["a"].as_i64(), Some(1));
}

#[test]
fn dotted_keys_on_load() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dotted.yml");
    fs::write(&path, "compiler.command: cargo build\nlog.level: debug\n").unwrap();

    let options = LoadOptions::new()
        .expand_dotted_keys(true)
        .ignore_dotted(vec!["log.level".into()]);
    let cfg = YamlConfigFile::open_with(&path, options).unwrap();

    assert_eq!(cfg.config().lookup("compiler.command").and_then(|n| n.as_str()),
               Some("cargo build"));
    assert_eq!(cfg.config().get("log.level").and_then(|n| n.as_str()), Some("debug"));
    assert!(cfg.options().is_safe());
    assert_eq!(cfg.path(), path.as_path());
}

#[test]
fn tags_depend_on_safe_mode() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.yml");
    fs::write(&path, "value: !Celsius 21\n").unwrap();

    let res = YamlConfigFile::open(&path);
    assert!(matches!(res, Err(Error::Unsupported(_))));

    let mut cfg = YamlConfigFile::open_with(&path, LoadOptions::new().safe(false)).unwrap();
    assert_eq!(cfg.config()["value"].as_i64(), Some(21));
    cfg.dump().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "value: 21\n");
}

#[cfg(unix)]
#[test]
fn dump_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mode.yml");
    fs::write(&path, "a: 1\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let mut cfg = YamlConfigFile::open(&path).unwrap();
    cfg.config_mut().as_mapping_mut().unwrap().insert("b", 2i64);
    cfg.dump().unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
    assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\nb: 2\n");
}

#[cfg(unix)]
#[test]
fn dump_writes_through_symlink() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let real = dir.path().join("real.yml");
    let link = dir.path().join("link.yml");
    fs::write(&real, "a: 1\n").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let mut cfg = YamlConfigFile::open(&link).unwrap();
    cfg.config_mut().as_mapping_mut().unwrap().insert("b", 2i64);
    cfg.dump().unwrap();

    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&real).unwrap(), "a: 1\nb: 2\n");
    assert_eq!(cfg.config()["b"].as_i64(), Some(2));
}

fn bump_version(cfg: &mut dyn ConfigFile) -> yaml_config::Result<()> {
    let next = cfg.config()["version"].as_i64().unwrap_or(0) + 1;
    cfg.config_mut().as_mapping_mut().unwrap().insert("version", next);
    cfg.dump()
}

#[test]
fn through_the_trait_object() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("versioned.yml");
    fs::write(&path, "version: 1\n").unwrap();

    let mut cfg = YamlConfigFile::open(&path).unwrap();
    bump_version(&mut cfg).unwrap();
    bump_version(&mut cfg).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "version: 3\n");
    assert_eq!(cfg.path(), path.as_path());
}
