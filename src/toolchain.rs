//! The Toolchain seam (spec §4.5, §6.2): locating, downloading, and
//! enumerating modules. `HttpToolchain` downloads a module archive over
//! HTTP and unpacks it with `flate2`/`tar`, grounded in the teacher's
//! self-updater pattern of fetching and extracting a `.tar.gz` release —
//! the same two crates, applied to module archives instead of binaries.
//! `LocalToolchain` is a test double over a pre-populated directory map,
//! used by integration tests and by embedders who already have modules on
//! disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};
use crate::filesystem::{Filesystem, RealFilesystem};

/// A cooperative cancellation flag threaded through long-running Toolchain
/// calls (spec §5 "Cancellation and timeouts": "accept a cancellation
/// token... that must be propagated").
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once [`CancellationToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Maximum download retry attempts (spec §4.5 step 2).
const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;
/// Base backoff delay per attempt, multiplied by the attempt number
/// (spec §4.5 step 2: "base delay 500 ms × attempt").
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// The module ecosystem toolchain seam (spec §6.2).
pub trait Toolchain: Send + Sync {
    /// Resolve `(path, version)` to a local directory, consulting the
    /// module cache. Returns `Err(Error::ModuleNotFound)` if not cached.
    fn find_module(&self, path: &str, version: &str) -> Result<PathBuf>;

    /// Populate the cache for `(path, version)`.
    fn download_module(&self, path: &str, version: &str, token: &CancellationToken) -> Result<()>;

    /// The "go-list" analogue: resolve a bare import path to its concrete
    /// `(path, resolved_version)`.
    fn get_module_info(&self, path: &str) -> Result<(String, String)>;

    /// Run an ecosystem subcommand (`get`, `get @none`) and return its
    /// stdout.
    fn run_command(&self, subcmd: &str, args: &[&str]) -> Result<String>;
}

/// Locate `(path, version)` with bounded exponential backoff retry,
/// downloading via `toolchain` if `download_missing` and the module isn't
/// already cached (spec §4.5 step 2).
pub fn locate_with_retry(
    toolchain: &dyn Toolchain,
    path: &str,
    version: &str,
    download_missing: bool,
    token: &CancellationToken,
) -> Result<PathBuf> {
    if let Ok(dir) = toolchain.find_module(path, version) {
        return Ok(dir);
    }
    if !download_missing {
        return Err(Error::ModuleNotFound {
            path: path.to_owned(),
            version: version.to_owned(),
        });
    }

    let mut last_err = None;
    for attempt in 1..=MAX_DOWNLOAD_ATTEMPTS {
        if token.is_cancelled() {
            return Err(Error::DownloadFailed {
                path: path.to_owned(),
                version: version.to_owned(),
                cause: "cancelled".into(),
            });
        }
        match toolchain.download_module(path, version, token) {
            Ok(()) => return toolchain.find_module(path, version),
            Err(e) => {
                last_err = Some(e);
                if attempt < MAX_DOWNLOAD_ATTEMPTS {
                    std::thread::sleep(BACKOFF_BASE * attempt);
                }
            }
        }
    }

    Err(Error::DownloadFailed {
        path: path.to_owned(),
        version: version.to_owned(),
        cause: last_err.map(|e| e.to_string()).unwrap_or_else(|| "could not locate".into()),
    })
}

/// An HTTP-backed [`Toolchain`]: downloads `<base_url>/<path>@<version>.tar.gz`
/// and unpacks it into `<cache_root>/<path>@<version>` (spec §6.4 module
/// cache layout).
pub struct HttpToolchain {
    base_url: String,
    cache_root: PathBuf,
    client: reqwest::blocking::Client,
    filesystem: Arc<dyn Filesystem>,
}

impl HttpToolchain {
    /// Construct a toolchain fetching archives from `base_url` into
    /// `cache_root`, creating cache directories through the default
    /// `std::fs`-backed [`RealFilesystem`]. See
    /// [`HttpToolchain::with_filesystem`] to swap in a test double.
    pub fn new(base_url: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_root: cache_root.into(),
            client: reqwest::blocking::Client::new(),
            filesystem: Arc::new(RealFilesystem),
        }
    }

    /// Swap in a [`Filesystem`] other than the default [`RealFilesystem`]
    /// (spec §6.3).
    pub fn with_filesystem(mut self, filesystem: Arc<dyn Filesystem>) -> Self {
        self.filesystem = filesystem;
        self
    }

    fn module_dir(&self, path: &str, version: &str) -> PathBuf {
        self.cache_root.join(format!("{path}@{version}"))
    }
}

impl Toolchain for HttpToolchain {
    fn find_module(&self, path: &str, version: &str) -> Result<PathBuf> {
        let dir = self.module_dir(path, version);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::ModuleNotFound {
                path: path.to_owned(),
                version: version.to_owned(),
            })
        }
    }

    fn download_module(&self, path: &str, version: &str, _token: &CancellationToken) -> Result<()> {
        let url = format!("{}/{path}@{version}.tar.gz", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Toolchain(anyhow::anyhow!(e)))?
            .error_for_status()
            .map_err(|e| Error::Toolchain(anyhow::anyhow!(e)))?;

        let dest = self.module_dir(path, version);
        self.filesystem.mkdir_all(&dest)?;

        let bytes = response.bytes().map_err(|e| Error::Toolchain(anyhow::anyhow!(e)))?;
        let decoder = GzDecoder::new(&bytes[..]);
        let mut archive = tar::Archive::new(decoder);
        archive
            .unpack(&dest)
            .map_err(|e| Error::Toolchain(anyhow::anyhow!(e)))?;

        Ok(())
    }

    fn get_module_info(&self, path: &str) -> Result<(String, String)> {
        let url = format!("{}/{path}/@latest", self.base_url);
        let text = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Toolchain(anyhow::anyhow!(e)))?
            .text()
            .map_err(|e| Error::Toolchain(anyhow::anyhow!(e)))?;
        Ok((path.to_owned(), text.trim().to_owned()))
    }

    fn run_command(&self, subcmd: &str, args: &[&str]) -> Result<String> {
        Err(Error::Toolchain(anyhow::anyhow!(
            "run_command({subcmd}, {args:?}) has no remote-HTTP equivalent; use LocalToolchain in tests"
        )))
    }
}

/// A test double backed by a pre-populated `(path, version) -> directory`
/// map. Never touches the network.
#[derive(Debug, Clone, Default)]
pub struct LocalToolchain {
    modules: HashMap<(String, String), PathBuf>,
    latest: HashMap<String, String>,
}

impl LocalToolchain {
    /// An empty toolchain with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `(path, version)` as already present at `dir`.
    pub fn register(&mut self, path: impl Into<String>, version: impl Into<String>, dir: impl Into<PathBuf>) {
        self.modules.insert((path.into(), version.into()), dir.into());
    }

    /// Register the "latest" version string for a bare import path.
    pub fn set_latest(&mut self, path: impl Into<String>, version: impl Into<String>) {
        self.latest.insert(path.into(), version.into());
    }
}

impl Toolchain for LocalToolchain {
    fn find_module(&self, path: &str, version: &str) -> Result<PathBuf> {
        self.modules
            .get(&(path.to_owned(), version.to_owned()))
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound {
                path: path.to_owned(),
                version: version.to_owned(),
            })
    }

    fn download_module(&self, path: &str, version: &str, _token: &CancellationToken) -> Result<()> {
        Err(Error::DownloadFailed {
            path: path.to_owned(),
            version: version.to_owned(),
            cause: "LocalToolchain has no network access; register() the module instead".into(),
        })
    }

    fn get_module_info(&self, path: &str) -> Result<(String, String)> {
        let version = self
            .latest
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound {
                path: path.to_owned(),
                version: "latest".to_owned(),
            })?;
        Ok((path.to_owned(), version))
    }

    fn run_command(&self, subcmd: &str, args: &[&str]) -> Result<String> {
        Ok(format!("{subcmd} {}", args.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_toolchain_finds_registered_module() {
        let mut tc = LocalToolchain::new();
        tc.register("example.com/foo", "v1.0.0", "/cache/foo@v1.0.0");
        assert_eq!(
            tc.find_module("example.com/foo", "v1.0.0").unwrap(),
            PathBuf::from("/cache/foo@v1.0.0")
        );
        assert!(tc.find_module("example.com/bar", "v1.0.0").is_err());
    }

    #[test]
    fn locate_with_retry_fails_fast_without_download_missing() {
        let tc = LocalToolchain::new();
        let err = locate_with_retry(&tc, "example.com/bar", "v1.0.0", false, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }

    #[test]
    fn locate_with_retry_surfaces_download_failure_after_retries() {
        let tc = LocalToolchain::new();
        let err = locate_with_retry(&tc, "example.com/bar", "v1.0.0", true, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::DownloadFailed { .. }));
    }

    #[test]
    fn cancellation_token_is_cancelled_reflects_cancel_call() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
