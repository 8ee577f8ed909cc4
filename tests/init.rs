use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_basket"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "basket init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".basket.toml");
    assert!(config_path.exists(), ".basket.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[analysis]"));
    assert!(content.contains("[ingest]"));
    assert!(content.contains("[output]"));

    // The template is all comments, so it parses to the defaults.
    let config = basket_core::BasketConfig::from_toml(&content).unwrap();
    assert_eq!(config.analysis.min_support, 0.1);
    let _raw: toml::Value = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".basket.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_basket"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let existing = std::fs::read_to_string(dir.path().join(".basket.toml")).unwrap();
    assert_eq!(existing, "# existing");
}
