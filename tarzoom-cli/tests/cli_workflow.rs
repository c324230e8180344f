//! End-to-end tests for the tarzoom binary.
//!
//! Each test gets its own config file whose log file lives in a temp
//! directory, and HOME points there too, so nothing is written under the
//! user's home.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Workspace {
    dir: tempfile::TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.ini");
        fs::write(
            &config,
            format!(
                "[logging]\nfile = {}\n",
                dir.path().join("logs/tarzoom.log").display()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tarzoom"))
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("RUST_LOG")
            .env("HOME", self.path())
            .output()
            .unwrap()
    }

    /// Write a one-level pyramid whose tiles have the given lengths.
    fn write_plane(&self, plane: u32, sizes: &[usize]) {
        fs::write(
            self.path().join(format!("plane_{}.dzi", plane)),
            r#"<Image TileSize="256" Overlap="0" Format="jpg"><Size Width="512" Height="512"/></Image>"#,
        )
        .unwrap();
        let level = self.path().join(format!("plane_{}_files/9", plane));
        fs::create_dir_all(&level).unwrap();
        for (i, size) in sizes.iter().enumerate() {
            let name = format!("{}_{}.jpg", i % 2, i / 2);
            fs::write(level.join(name), vec![plane as u8; *size]).unwrap();
        }
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn offsets(index: &Path) -> Vec<u64> {
    let json: serde_json::Value = serde_json::from_slice(&fs::read(index).unwrap()).unwrap();
    json["offsets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect()
}

#[test]
fn test_pack_interleave_verify_inspect() {
    let ws = Workspace::new();
    ws.write_plane(0, &[100, 150, 120, 130]);
    ws.write_plane(1, &[90, 95, 80, 85]);

    for plane in ["plane_0", "plane_1"] {
        let basename = ws.path().join(plane);
        let out = ws.run(&["pack", basename.to_str().unwrap()]);
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        assert!(stdout(&out).contains("Packed 4 tiles in 1 levels"));
    }
    assert_eq!(offsets(&ws.path().join("plane_0.tzi")), vec![0, 100, 250, 370, 500]);

    let planes = ws.path().join("planes");
    let out = ws.run(&[
        "interleave",
        ws.path().join("plane_0.tzi").to_str().unwrap(),
        ws.path().join("plane_1.tzi").to_str().unwrap(),
        "--output",
        planes.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        offsets(&ws.path().join("planes.tzi")),
        vec![0, 100, 190, 340, 435, 555, 635, 765, 850]
    );
    // Explicit interleave keeps its inputs.
    assert!(ws.path().join("plane_0.tzb").exists());

    let out = ws.run(&["verify", planes.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("OK: 8 ranges"));

    let out = ws.run(&["inspect", planes.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("interleaved, 2 planes"));

    assert!(ws.path().join("logs/tarzoom.log").exists());
}

#[test]
fn test_verify_reports_truncated_blob() {
    let ws = Workspace::new();
    ws.write_plane(0, &[10, 20, 30, 40]);
    let basename = ws.path().join("plane_0");
    assert!(ws.run(&["pack", basename.to_str().unwrap()]).status.success());

    let blob = ws.path().join("plane_0.tzb");
    let bytes = fs::read(&blob).unwrap();
    fs::write(&blob, &bytes[..bytes.len() - 1]).unwrap();

    let out = ws.run(&["verify", basename.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("index expects 100"));
}

#[test]
fn test_missing_tile_fails_without_output() {
    let ws = Workspace::new();
    ws.write_plane(0, &[10, 20, 30]);
    let basename = ws.path().join("plane_0");

    let out = ws.run(&["pack", basename.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!ws.path().join("plane_0.tzi").exists());

    let out = ws.run(&["pack", basename.to_str().unwrap(), "--missing-tiles", "empty"]);
    assert!(out.status.success());
    assert_eq!(offsets(&ws.path().join("plane_0.tzi")), vec![0, 10, 30, 60, 60]);
}

#[test]
fn test_folder_commands() {
    let ws = Workspace::new();
    ws.write_plane(0, &[1, 2, 3, 4]);
    ws.write_plane(1, &[5, 6, 7, 8]);
    let input = ws.path().to_str().unwrap();

    assert!(ws.run(&["pack-folder", input, "--parallel"]).status.success());
    let out = ws.run(&["interleave-folder", input, "--delete-sources"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(
        offsets(&ws.path().join("planes.tzi")),
        vec![0, 1, 6, 8, 14, 17, 24, 28, 36]
    );
    assert!(!ws.path().join("plane_1.tzb").exists());
}

#[test]
fn test_config_path_and_init() {
    let ws = Workspace::new();

    let out = ws.run(&["config", "path"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), ws.config.display().to_string());

    // Refuses to overwrite an existing file.
    let out = ws.run(&["config", "init"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_config_init_replaces_malformed_file() {
    let ws = Workspace::new();
    fs::write(&ws.config, "[interleave]\nmax_open_planes = lots\n").unwrap();

    // Other commands refuse to run with a config that does not parse.
    let out = ws.run(&["config", "show"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("max_open_planes"));

    let out = ws.run(&["config", "init", "--force"]);
    assert!(out.status.success());

    let out = ws.run(&["config", "show"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("max_open_planes = 256"));
}
