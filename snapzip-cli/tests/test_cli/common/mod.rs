use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

mod data;

pub use data::{generate_random_data, BINARY_DATA, REPETITIVE_DATA, SAMPLE_TEXT, STREAM_IDENTIFIER};

/// Type of binary to execute
#[derive(Debug, Clone)]
pub enum BinaryType {
    /// The snapzip binary built by cargo
    Snapzip,
    /// System binary available in PATH
    System(String),
}

impl BinaryType {
    /// Create a new system binary type
    pub fn system(name: impl Into<String>) -> Self {
        Self::System(name.into())
    }

    /// Returns the path to the binary for this variant.
    ///
    /// # Panics
    ///
    /// Panics if a system binary cannot be found.
    fn get_path(&self) -> String {
        match self {
            BinaryType::Snapzip => env!("CARGO_BIN_EXE_snapzip").to_string(),
            BinaryType::System(name) => find_system_binary(name)
                .unwrap_or_else(|| panic!("Binary {name} not found in PATH")),
        }
    }
}

/// Find a system binary in PATH
fn find_system_binary(name: &str) -> Option<String> {
    if let Ok(path) = which::which(name) {
        return Some(path.to_string_lossy().to_string());
    }

    // If not found in PATH, try common locations
    let common_paths = ["/usr/bin", "/usr/local/bin", "/bin"];

    for base_path in &common_paths {
        let full_path = Path::new(base_path).join(name);
        if full_path.is_file() {
            return Some(full_path.to_string_lossy().to_string());
        }
    }

    None
}

/// Output from running a binary command
#[derive(Eq, PartialEq)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout_raw: Vec<u8>,
    pub stdout: String,
    pub stderr: String,
}

/// Shared test fixture utilities to keep filesystem interactions isolated
///
/// Commands run with the fixture root as their working directory, so inputs
/// can be given relative to it.
pub struct Fixture {
    root_dir: tempfile::TempDir,
}

impl Fixture {
    /// Create an empty fixture
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            root_dir: tempfile::TempDir::new().unwrap(),
        }
    }

    /// Create fixture with multiple files
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or if any fixture file
    /// cannot be written.
    pub fn with_files(names: &[&str], contents: &[&[u8]]) -> Self {
        let fixture = Self::new();
        for (name, contents) in names.iter().zip(contents) {
            fixture.write(name, contents);
        }
        fixture
    }

    /// Create fixture with single file
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or if the fixture file
    /// cannot be written.
    pub fn with_file(name: &str, contents: &[u8]) -> Self {
        Self::with_files(&[name], &[contents])
    }

    /// Write a file, creating parent directories as needed
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, contents: &[u8]) {
        let path = self.root_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    /// Create a directory, including its parents
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn mkdir(&self, name: &str) {
        fs::create_dir_all(self.root_dir.path().join(name)).unwrap();
    }

    /// Get full path for a file in the fixture
    pub fn path(&self, name: &str) -> String {
        format!("{}/{}", self.root_dir.path().display(), name)
    }

    /// Read a file from the fixture
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.root_dir.path().join(name)).unwrap()
    }

    /// Remove a file from the fixture
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be removed.
    pub fn remove_file(&self, name: &str) {
        fs::remove_file(self.root_dir.path().join(name)).unwrap();
    }

    /// Remove a directory tree from the fixture
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be removed.
    pub fn remove_dir(&self, name: &str) {
        fs::remove_dir_all(self.root_dir.path().join(name)).unwrap();
    }

    /// Check if a file exists in the fixture
    pub fn file_exists(&self, name: &str) -> bool {
        self.root_dir.path().join(name).exists()
    }

    /// Check if a directory exists in the fixture
    pub fn dir_exists(&self, name: &str) -> bool {
        self.root_dir.path().join(name).is_dir()
    }

    /// Sorted names of the entries directly below `dir`
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be read.
    pub fn list(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.root_dir.path().join(dir))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Run snapzip with the specified arguments
    pub async fn run_snapzip(&mut self, args: &[&str]) -> Output {
        self.run(BinaryType::Snapzip, args).await
    }

    /// Run a system binary with the specified arguments if available
    pub async fn run_system(&mut self, name: &str, args: &[&str]) -> Option<Output> {
        if find_system_binary(name).is_some() {
            Some(self.run(BinaryType::system(name), args).await)
        } else {
            None
        }
    }

    /// Assert that files have expected contents
    ///
    /// # Panics
    ///
    /// Panics if any file cannot be read or if its contents don't match the
    /// expected bytes.
    pub fn assert_files(&self, names: &[&str], contents: &[&[u8]]) {
        for (name, expected_contents) in names.iter().zip(contents) {
            let path = self.root_dir.path().join(name);
            let actual_contents = fs::read(path).unwrap_or_default();
            assert!(
                actual_contents == *expected_contents,
                "unexpected contents in {name}"
            );
        }
    }

    pub fn root_dir_path(&self) -> &Path {
        self.root_dir.path()
    }

    /// Run a binary with the specified arguments
    ///
    /// # Panics
    ///
    /// Panics if the process cannot be spawned or awaiting its output fails.
    async fn run(&mut self, binary_type: BinaryType, args: &[&str]) -> Output {
        let bin_path = PathBuf::from(binary_type.get_path());
        let raw_output = tokio::process::Command::new(&bin_path)
            .args(args)
            .current_dir(self.root_dir.path())
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .unwrap();

        Output {
            status: raw_output.status,
            stdout_raw: raw_output.stdout.clone(),
            stdout: String::from_utf8_lossy(&raw_output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw_output.stderr).into_owned(),
        }
    }
}
