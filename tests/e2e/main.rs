use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tempfile::TempDir;

mod edge_cases;
mod happy_path;
mod smoke;

/// A test context that provides an isolated temporary directory.
/// Tests can run in parallel because each has its own temp directory.
pub struct TestContext {
    pub temp_dir: TempDir,
}

pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Run artman in this temp directory
    pub fn run_artman(&self, args: &[&str]) -> CommandResult {
        let mut cmd = Command::cargo_bin("artman").expect("Failed to find artman binary");
        cmd.args(args);
        cmd.current_dir(self.path());

        let output = cmd.output().expect("Failed to execute artman command");

        CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }

    /// Get full path to a file in the temp directory
    pub fn file_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.path().join(path)
    }

    /// Read file from temp directory
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.file_path(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Failed to read file: {}", full_path.display()))
    }

    /// Write file to temp directory (creates parent directories)
    pub fn write_file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.file_path(&path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|_| panic!("Failed to create directory: {}", parent.display()));
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|_| panic!("Failed to write file: {}", full_path.display()));
    }

    /// Assert file exists
    pub fn assert_file_exists(&self, path: impl AsRef<Path>) {
        let full_path = self.file_path(&path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert file contains pattern
    pub fn assert_file_contains(&self, path: impl AsRef<Path>, pattern: &str) {
        let content = self.read_file(path);
        assert!(
            content.contains(pattern),
            "Expected file to contain '{}', but it didn't.\n\nContent:\n{}",
            pattern,
            content
        );
    }

    /// Set up a project with a cache kept inside the temp directory and
    /// two artifact definitions: A uses tool X, B uses X and url-less Y.
    pub fn init_fixture_project(&self) {
        self.write_file(
            "artman.toml",
            concat!(
                "[project]\n",
                "name = \"fixture\"\n",
                "artifact_dir = \"artifacts\"\n",
                "\n",
                "[fetch]\n",
                "cache_dir = \"cache\"\n",
            ),
        );
        self.write_file(
            "artifacts/A.yaml",
            "name: A\ntools:\n  - name: X\n    url: http://e/x.bin\n",
        );
        self.write_file(
            "artifacts/B.yaml",
            "name: B\ntools:\n  - name: X\n    url: http://e/x.bin\n  - name: Y\n",
        );
    }

    /// Place tool X's binary at its deterministic cache path.
    pub fn seed_cache_for_x(&self) {
        self.write_file("cache/X/latest/x.bin", "fake tool binary");
    }
}

pub fn assert_success(result: &CommandResult) {
    assert!(
        result.success(),
        "Command failed.\n\nstdout:\n{}\n\nstderr:\n{}",
        result.stdout,
        result.stderr
    );
}
