//! Locating the `claude` executable.
//!
//! Resolution order, first usable candidate wins:
//!
//! 1. the user-configured path, when set and non-blank
//! 2. `~/.claude/local/claude`
//! 3. the platform install location (`/usr/local/bin/claude`, or
//!    `%LOCALAPPDATA%\Programs\claude\claude.exe` on Windows)
//! 4. a PATH lookup through `which` / `where`, bounded to five seconds
//!
//! The outcome, including "not found", is cached until
//! [`ClaudeCliDiscovery::invalidate_cache`] is called. The cache is keyed on
//! nothing: a later call with a different configured path still gets the
//! cached answer.

use marginalia_runner::{CommandSpec, NativeRunner, ProcessRunner, RunnerError};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const CLAUDE_BINARY_NAME: &str = "claude";
const LOCATE_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(windows)]
const LOCATE_COMMAND: &str = "where";
#[cfg(not(windows))]
const LOCATE_COMMAND: &str = "which";

/// Candidate locations consulted after the user-configured path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryLocations {
    /// Per-user install, `~/.claude/local/claude`
    pub user_local: Option<PathBuf>,
    /// System-wide install for this platform
    pub system: Option<PathBuf>,
    /// Name handed to the PATH lookup
    pub binary_name: String,
    /// `which` / `where`; `None` disables the PATH lookup entirely
    pub locate_command: Option<String>,
}

impl DiscoveryLocations {
    /// The standard locations for the current platform and user.
    #[must_use]
    pub fn platform_defaults() -> Self {
        let user_local =
            dirs::home_dir().map(|home| home.join(".claude").join("local").join("claude"));

        #[cfg(windows)]
        let system = std::env::var_os("LOCALAPPDATA").map(|base| {
            PathBuf::from(base)
                .join("Programs")
                .join("claude")
                .join("claude.exe")
        });
        #[cfg(not(windows))]
        let system = Some(PathBuf::from("/usr/local/bin/claude"));

        Self {
            user_local,
            system,
            binary_name: CLAUDE_BINARY_NAME.to_string(),
            locate_command: Some(LOCATE_COMMAND.to_string()),
        }
    }
}

/// Resolves the claude binary and remembers the answer.
#[derive(Debug)]
pub struct ClaudeCliDiscovery {
    locations: DiscoveryLocations,
    // Outer None: nothing cached. Inner None: cached "not found".
    cache: RwLock<Option<Option<PathBuf>>>,
}

impl Default for ClaudeCliDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeCliDiscovery {
    #[must_use]
    pub fn new() -> Self {
        Self::with_locations(DiscoveryLocations::platform_defaults())
    }

    #[must_use]
    pub fn with_locations(locations: DiscoveryLocations) -> Self {
        Self {
            locations,
            cache: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn locations(&self) -> &DiscoveryLocations {
        &self.locations
    }

    /// Cached resolution; see the module docs for the search order.
    pub fn discover(&self, user_configured: Option<&str>) -> Option<PathBuf> {
        if let Ok(guard) = self.cache.read()
            && let Some(cached) = guard.as_ref()
        {
            return cached.clone();
        }

        let resolved = self.resolve(user_configured);
        match self.cache.write() {
            Ok(mut guard) => *guard = Some(resolved.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(resolved.clone()),
        }
        resolved
    }

    /// Forget the cached answer so the next [`discover`](Self::discover)
    /// searches again.
    pub fn invalidate_cache(&self) {
        match self.cache.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        debug!("claude binary discovery cache invalidated");
    }

    /// Uncached resolution.
    #[must_use]
    pub fn resolve(&self, user_configured: Option<&str>) -> Option<PathBuf> {
        if let Some(configured) = user_configured.map(str::trim).filter(|p| !p.is_empty()) {
            let path = PathBuf::from(configured);
            if is_usable(&path) {
                debug!(path = %path.display(), "using configured claude binary");
                return Some(path);
            }
            warn!(
                path = %path.display(),
                "configured claude binary is missing or not executable; searching defaults"
            );
        }

        let fixed = [&self.locations.user_local, &self.locations.system];
        if let Some(path) = fixed
            .into_iter()
            .flatten()
            .find(|candidate| is_usable(candidate))
        {
            debug!(path = %path.display(), "found claude binary at well-known location");
            return Some(path.clone());
        }

        self.find_on_path()
    }

    fn find_on_path(&self) -> Option<PathBuf> {
        let locate = self.locations.locate_command.as_deref()?;
        let name = &self.locations.binary_name;
        let cmd = CommandSpec::new(locate).arg(name);

        match NativeRunner::new().run(&cmd, LOCATE_TIMEOUT) {
            Ok(output) if output.success() => {
                let stdout = output.stdout_string();
                let first = stdout.lines().next().map(str::trim).unwrap_or_default();
                let path = PathBuf::from(first);
                (!first.is_empty() && is_usable(&path)).then(|| {
                    debug!(path = %path.display(), "found claude binary on PATH");
                    path
                })
            }
            Ok(_) => None,
            Err(RunnerError::SpawnFailed { reason, .. }) => {
                // No `which` on this system; fall back to an in-process lookup.
                debug!(locate, %reason, "locate command unavailable; searching PATH directly");
                which::which(name).ok().filter(|p| is_usable(p))
            }
            Err(err) => {
                debug!(locate, %err, "PATH lookup failed");
                None
            }
        }
    }
}

/// True when `path` exists, is a regular file and may be executed by the
/// current user.
#[must_use]
pub fn is_usable(path: &Path) -> bool {
    path.is_file() && is_executable(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ["exe", "cmd", "bat", "com"]
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

static GLOBAL: Lazy<ClaudeCliDiscovery> = Lazy::new(ClaudeCliDiscovery::new);

/// The process-wide discovery instance.
#[must_use]
pub fn global() -> &'static ClaudeCliDiscovery {
    &GLOBAL
}

/// [`ClaudeCliDiscovery::discover`] on the process-wide instance.
pub fn discover(user_configured: Option<&str>) -> Option<PathBuf> {
    GLOBAL.discover(user_configured)
}

/// [`ClaudeCliDiscovery::invalidate_cache`] on the process-wide instance.
pub fn invalidate_cache() {
    GLOBAL.invalidate_cache();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn isolated(user_local: Option<PathBuf>, system: Option<PathBuf>) -> ClaudeCliDiscovery {
        ClaudeCliDiscovery::with_locations(DiscoveryLocations {
            user_local,
            system,
            binary_name: "marginalia-no-such-binary".to_string(),
            locate_command: None,
        })
    }

    #[test]
    fn configured_path_wins_when_usable() {
        let temp = TempDir::new().unwrap();
        let configured = executable(temp.path(), "my-claude");
        let local = executable(temp.path(), "local-claude");
        let discovery = isolated(Some(local), None);

        let found = discovery.resolve(configured.to_str());

        assert_eq!(found, Some(configured));
    }

    #[test]
    fn unusable_configured_path_falls_through() {
        let temp = TempDir::new().unwrap();
        let not_exec = temp.path().join("plain-file");
        fs::write(&not_exec, "data").unwrap();
        fs::set_permissions(&not_exec, fs::Permissions::from_mode(0o644)).unwrap();
        let system = executable(temp.path(), "system-claude");
        let discovery = isolated(Some(temp.path().join("missing")), Some(system.clone()));

        assert_eq!(discovery.resolve(not_exec.to_str()), Some(system.clone()));
        assert_eq!(discovery.resolve(Some("   ")), Some(system));
    }

    #[test]
    fn user_local_precedes_system() {
        let temp = TempDir::new().unwrap();
        let local = executable(temp.path(), "local-claude");
        let system = executable(temp.path(), "system-claude");
        let discovery = isolated(Some(local.clone()), Some(system));

        assert_eq!(discovery.resolve(None), Some(local));
    }

    #[test]
    fn directories_are_not_usable() {
        let temp = TempDir::new().unwrap();
        assert!(!is_usable(temp.path()));
    }

    #[test]
    fn nothing_found_is_none() {
        let temp = TempDir::new().unwrap();
        let discovery = isolated(Some(temp.path().join("a")), Some(temp.path().join("b")));
        assert_eq!(discovery.resolve(None), None);
    }

    #[test]
    fn path_lookup_finds_a_real_program() {
        let discovery = ClaudeCliDiscovery::with_locations(DiscoveryLocations {
            user_local: None,
            system: None,
            binary_name: "sh".to_string(),
            locate_command: Some(LOCATE_COMMAND.to_string()),
        });

        let found = discovery.resolve(None).expect("sh should be on PATH");

        assert!(found.ends_with("sh"), "{found:?}");
        assert!(is_usable(&found));
    }

    #[test]
    fn missing_locate_tool_falls_back_to_in_process_lookup() {
        let discovery = ClaudeCliDiscovery::with_locations(DiscoveryLocations {
            user_local: None,
            system: None,
            binary_name: "sh".to_string(),
            locate_command: Some("/nonexistent/which".to_string()),
        });

        assert!(discovery.resolve(None).is_some());
    }

    #[test]
    fn result_is_cached_until_invalidated() {
        let temp = TempDir::new().unwrap();
        let local = executable(temp.path(), "local-claude");
        let discovery = isolated(Some(local.clone()), None);

        assert_eq!(discovery.discover(None), Some(local.clone()));

        fs::remove_file(&local).unwrap();
        assert_eq!(
            discovery.discover(None),
            Some(local.clone()),
            "cached answer must survive the file disappearing"
        );

        discovery.invalidate_cache();
        assert_eq!(discovery.discover(None), None);
    }

    #[test]
    fn cached_not_found_is_also_sticky() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("local-claude");
        let discovery = isolated(Some(local.clone()), None);

        assert_eq!(discovery.discover(None), None);
        executable(temp.path(), "local-claude");
        assert_eq!(discovery.discover(None), None);

        discovery.invalidate_cache();
        assert_eq!(discovery.discover(None), Some(local));
    }

    #[test]
    fn cache_ignores_a_different_configured_path() {
        let temp = TempDir::new().unwrap();
        let first = executable(temp.path(), "first");
        let second = executable(temp.path(), "second");
        let discovery = isolated(None, None);

        assert_eq!(discovery.discover(first.to_str()), Some(first.clone()));
        assert_eq!(discovery.discover(second.to_str()), Some(first));
    }
}
