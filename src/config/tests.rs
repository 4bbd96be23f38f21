use super::*;
use std::fs;

#[test]
fn defaults() {
    let config = OptConfig::default();
    assert_eq!(config.level, 2);
    assert_eq!(config.max_passes, 16);
    assert_eq!(config.max_loop_iterations, 64);
    assert!(config.assume_zeroed_tape);
    assert!(config.final_tape_live);
    assert_eq!(EmitConfig::default().tape_size, 30000);
}

#[test]
fn partial_file_keeps_defaults() {
    let config = ConfigFile::parse(
        "[optimizer]\nlevel = 3\nfinal_tape_live = false\n",
        Path::new("tapeopt.toml"),
    )
    .unwrap();
    assert_eq!(config.optimizer.level, 3);
    assert!(!config.optimizer.final_tape_live);
    assert_eq!(config.optimizer.max_passes, 16);
    assert_eq!(config.emit, EmitConfig::default());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = ConfigFile::parse("[optimizer]\nlevl = 3\n", Path::new("x.toml")).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("x.toml"));
}

#[test]
fn find_walks_up() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    fs::write(dir.path().join(FILE_NAME), "[emit]\ntape_size = 100\n").unwrap();

    let found = ConfigFile::find(&nested).unwrap();
    assert_eq!(found, dir.path().join(FILE_NAME));
    let config = ConfigFile::discover(&nested).unwrap();
    assert_eq!(config.emit.tape_size, 100);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigFile::load(&dir.path().join(FILE_NAME)).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
