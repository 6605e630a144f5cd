#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use chantag::auth::TokenAuth;
use chantag::cache::{CacheStore, ManualClock, MemoryBackend};
use chantag::config::SheetNames;
use chantag::notify::RecordingNotifier;
use chantag::remote::{Grid, MemorySheet};
use chantag::session::Session;

pub const MAIN: &str = "Channels";
pub const TAGS: &str = "Tags";

fn row(cells: &[&str]) -> Vec<Value> {
    cells.iter().map(|c| json!(c)).collect()
}

/// Main sheet with tags in column D.
pub fn channels_grid() -> Grid {
    vec![
        row(&["Name", "Type", "Members", "Tags"]),
        row(&["general", "public", "ana, bo", ""]),
        row(&["random", "", "", "eng"]),
        row(&["eng-backend", "private", "cy", "Eng, ops"]),
        row(&["", "public", "", "orphan"]),
        row(&["sales-west", "public", "", "sales"]),
    ]
}

pub fn tags_grid() -> Grid {
    vec![
        row(&["prefix", "label", "agents"]),
        row(&["eng", "Engineering", "eng-bot"]),
        row(&["sales", "", ""]),
    ]
}

pub fn sample_sheet() -> Arc<MemorySheet> {
    Arc::new(
        MemorySheet::new()
            .with_sheet(MAIN, channels_grid())
            .with_sheet(TAGS, tags_grid()),
    )
}

/// A session over an in-memory sheet with a controllable clock.
pub struct TestSession {
    pub session: Session,
    pub sheet: Arc<MemorySheet>,
    pub notifier: Arc<RecordingNotifier>,
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<ManualClock>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_sheet(sample_sheet())
    }

    pub fn with_sheet(sheet: Arc<MemorySheet>) -> Self {
        Self::build(sheet, TokenAuth::signed_in("test-token"))
    }

    pub fn signed_out() -> Self {
        Self::build(sample_sheet(), TokenAuth::signed_out())
    }

    fn build(sheet: Arc<MemorySheet>, auth: TokenAuth) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let cache = CacheStore::new(backend.clone(), clock.clone(), Duration::from_secs(300));
        let session = Session::new(
            sheet.clone(),
            Arc::new(auth),
            cache,
            notifier.clone(),
            &SheetNames::default(),
        );
        Self {
            session,
            sheet,
            notifier,
            backend,
            clock,
        }
    }

    pub async fn loaded() -> Self {
        let mut t = Self::new();
        t.session.load().await.expect("load should succeed");
        t
    }
}

/// Runs the chantag binary in an isolated temp directory
pub struct ChantagTest {
    pub temp_dir: TempDir,
    binary_path: String,
}

impl ChantagTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        ChantagTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_chantag").to_string(),
        }
    }

    /// A test directory with the sample sheets written as a fixture file.
    pub fn with_fixture() -> Self {
        let test = Self::new();
        test.write_fixture(&json!({
            "sheets": {
                (MAIN): channels_grid(),
                (TAGS): tags_grid(),
            }
        }));
        test
    }

    pub fn fixture_path(&self) -> PathBuf {
        self.temp_dir.path().join("sheet.json")
    }

    pub fn write_fixture(&self, fixture: &Value) {
        fs::write(
            self.fixture_path(),
            serde_json::to_string_pretty(fixture).expect("fixture serializes"),
        )
        .expect("Failed to write fixture");
    }

    pub fn read_fixture(&self) -> Value {
        let content = fs::read_to_string(self.fixture_path()).expect("Failed to read fixture");
        serde_json::from_str(&content).expect("fixture is JSON")
    }

    /// Text of one cell in the fixture, `""` when absent.
    pub fn fixture_cell(&self, sheet: &str, row: usize, col: usize) -> String {
        self.read_fixture()["sheets"][sheet][row - 1][col]
            .as_str()
            .unwrap_or("")
            .to_string()
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.binary_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("CHANTAG_ROOT")
            .env_remove("CHANTAG_ACCESS_TOKEN")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute chantag command")
    }

    /// Run with `--offline <fixture>` appended.
    pub fn run_offline(&self, args: &[&str]) -> Output {
        let fixture = self.fixture_path();
        let mut full: Vec<&str> = args.to_vec();
        full.push("--offline");
        full.push(fixture.to_str().expect("utf-8 temp path"));
        self.run(&full)
    }

    pub fn offline_success(&self, args: &[&str]) -> String {
        Self::expect_success(args, self.run_offline(args))
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        Self::expect_success(args, self.run(args))
    }

    fn expect_success(args: &[&str], output: Output) -> String {
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        Self::expect_failure(args, self.run(args))
    }

    pub fn offline_failure(&self, args: &[&str]) -> String {
        Self::expect_failure(args, self.run_offline(args))
    }

    fn expect_failure(args: &[&str], output: Output) -> String {
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".chantag").join("config.yaml")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.temp_dir.path().join(".chantag").join("cache.json")
    }
}
