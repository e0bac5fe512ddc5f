//! Platform adapters: per-OS environment workarounds and drop path resolution.
//!
//! One adapter is selected at startup with [`detect`]. The controller never
//! branches on the operating system itself.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once, OnceLock};

use percent_encoding::percent_decode_str;

/// Variables that make the Hugging Face cache copy files instead of creating
/// symlinks, which need admin rights or Developer Mode on Windows.
const WINDOWS_CACHE_OVERRIDES: &[(&str, &str)] = &[
    ("HF_HUB_DISABLE_SYMLINKS", "1"),
    ("HF_HUB_DISABLE_SYMLINKS_WARNING", "1"),
];

/// Per-OS behaviour needed around conversions
pub trait PlatformAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Environment variables to set once before the first conversion
    fn environment_overrides(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Turn a dropped reference (path or `file://` URL) into a filesystem path.
    /// Falls back to the reference itself when it cannot be resolved.
    fn resolve_dropped(&self, reference: &str) -> PathBuf {
        file_url_to_path(reference).unwrap_or_else(|| PathBuf::from(reference))
    }
}

/// Linux and other platforms without workarounds
#[derive(Debug, Default)]
pub struct DefaultPlatform;

impl PlatformAdapter for DefaultPlatform {
    fn name(&self) -> &'static str {
        "default"
    }
}

#[derive(Debug, Default)]
pub struct WindowsPlatform;

impl PlatformAdapter for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn environment_overrides(&self) -> &'static [(&'static str, &'static str)] {
        WINDOWS_CACHE_OVERRIDES
    }
}

/// Resolves Finder file-reference URLs (`file:///.file/id=…`) into real paths
#[derive(Debug, Default)]
pub struct MacosPlatform;

impl PlatformAdapter for MacosPlatform {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn resolve_dropped(&self, reference: &str) -> PathBuf {
        let Some(path) = file_url_to_path(reference) else {
            return PathBuf::from(reference);
        };

        if !is_file_reference(&path) {
            return path;
        }

        match resolve_file_reference(&path) {
            Ok(resolved) => {
                tracing::debug!(reference, resolved = %resolved.display(), "Resolved file reference");
                resolved
            }
            Err(e) => {
                tracing::warn!(reference, "Could not resolve file reference: {}", e);
                PathBuf::from(reference)
            }
        }
    }
}

/// Select the adapter for the platform this binary was built for
pub fn detect() -> Arc<dyn PlatformAdapter> {
    if cfg!(target_os = "windows") {
        Arc::new(WindowsPlatform)
    } else if cfg!(target_os = "macos") {
        Arc::new(MacosPlatform)
    } else {
        Arc::new(DefaultPlatform)
    }
}

/// True for URLs with a scheme other than `file`
pub fn is_remote_reference(reference: &str) -> bool {
    match reference.trim().split_once("://") {
        Some((scheme, _)) => {
            !scheme.eq_ignore_ascii_case("file")
                && !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Decode a `file://` URL. Plain paths are returned unchanged.
/// Returns `None` for other URL schemes or undecodable input.
pub fn file_url_to_path(reference: &str) -> Option<PathBuf> {
    let reference = reference.trim();
    if is_remote_reference(reference) {
        return None;
    }

    let Some(rest) = strip_file_scheme(reference) else {
        return Some(PathBuf::from(reference));
    };

    // file://localhost/path and file:///path both name a local path
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    let decoded = percent_decode_str(rest).decode_utf8().ok()?;

    // file:///C:/Users/... -> C:/Users/...
    let bytes = decoded.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':'
    {
        return Some(PathBuf::from(&decoded[1..]));
    }

    Some(PathBuf::from(decoded.as_ref()))
}

fn strip_file_scheme(reference: &str) -> Option<&str> {
    let prefix = reference.get(..7)?;
    prefix
        .eq_ignore_ascii_case("file://")
        .then(|| &reference[7..])
}

fn is_file_reference(path: &Path) -> bool {
    path.to_string_lossy().starts_with("/.file/id=")
}

#[cfg(target_os = "macos")]
fn resolve_file_reference(path: &Path) -> std::io::Result<PathBuf> {
    use std::ffi::{CStr, OsStr};
    use std::os::fd::AsRawFd;
    use std::os::unix::ffi::OsStrExt;

    let file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; libc::PATH_MAX as usize];

    // SAFETY: buf holds PATH_MAX bytes as F_GETPATH requires, and the fd is open for the call
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_GETPATH, buf.as_mut_ptr()) };
    if rc == -1 {
        return Err(std::io::Error::last_os_error());
    }

    let resolved = CStr::from_bytes_until_nul(&buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(PathBuf::from(OsStr::from_bytes(resolved.to_bytes())))
}

#[cfg(not(target_os = "macos"))]
fn resolve_file_reference(_path: &Path) -> std::io::Result<PathBuf> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "file reference URLs can only be resolved on macOS",
    ))
}

/// Read/write access to environment variables
pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// The real process environment
#[derive(Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// Applies a platform's environment overrides exactly once.
#[derive(Debug)]
pub struct EnvironmentSetup {
    once: Once,
}

impl EnvironmentSetup {
    pub const fn new() -> Self {
        Self { once: Once::new() }
    }

    /// Apply the adapter's overrides on the first call; later calls do nothing.
    /// Variables already present in the environment keep their value.
    pub fn ensure(&self, adapter: &dyn PlatformAdapter, env: &dyn Environment) {
        self.once.call_once(|| {
            for (key, value) in adapter.environment_overrides() {
                if let Some(existing) = env.get(key) {
                    tracing::debug!(key, existing = %existing, "Environment variable already set, keeping it");
                    continue;
                }
                tracing::info!(platform = adapter.name(), key, value, "Applying environment workaround");
                env.set(key, value);
            }
        });
    }

    pub fn is_applied(&self) -> bool {
        self.once.is_completed()
    }
}

impl Default for EnvironmentSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide setup guard shared by every controller
pub fn process_environment_setup() -> Arc<EnvironmentSetup> {
    static SETUP: OnceLock<Arc<EnvironmentSetup>> = OnceLock::new();
    SETUP
        .get_or_init(|| Arc::new(EnvironmentSetup::new()))
        .clone()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Environment that records every write
    #[derive(Default)]
    pub(crate) struct RecordingEnvironment {
        pub vars: Mutex<HashMap<String, String>>,
        pub writes: Mutex<Vec<(String, String)>>,
    }

    impl Environment for RecordingEnvironment {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.vars
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
        }
    }

    #[test]
    fn test_windows_overrides_applied_once() {
        let setup = EnvironmentSetup::new();
        let env = RecordingEnvironment::default();

        setup.ensure(&WindowsPlatform, &env);
        setup.ensure(&WindowsPlatform, &env);
        setup.ensure(&WindowsPlatform, &env);

        let writes = env.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(env.get("HF_HUB_DISABLE_SYMLINKS").as_deref(), Some("1"));
        assert_eq!(
            env.get("HF_HUB_DISABLE_SYMLINKS_WARNING").as_deref(),
            Some("1")
        );
        assert!(setup.is_applied());
    }

    #[test]
    fn test_existing_variable_is_not_overwritten() {
        let setup = EnvironmentSetup::new();
        let env = RecordingEnvironment::default();
        env.vars
            .lock()
            .unwrap()
            .insert("HF_HUB_DISABLE_SYMLINKS".to_string(), "0".to_string());

        setup.ensure(&WindowsPlatform, &env);

        assert_eq!(env.get("HF_HUB_DISABLE_SYMLINKS").as_deref(), Some("0"));
        assert_eq!(env.writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_default_platform_sets_nothing() {
        let setup = EnvironmentSetup::new();
        let env = RecordingEnvironment::default();

        setup.ensure(&DefaultPlatform, &env);

        assert!(env.writes.lock().unwrap().is_empty());
        assert!(setup.is_applied());
    }

    #[test]
    fn test_plain_paths_pass_through() {
        assert_eq!(
            DefaultPlatform.resolve_dropped("/home/me/report.pdf"),
            PathBuf::from("/home/me/report.pdf")
        );
    }

    #[test]
    fn test_file_urls_are_decoded() {
        assert_eq!(
            file_url_to_path("file:///home/me/My%20Report.pdf"),
            Some(PathBuf::from("/home/me/My Report.pdf"))
        );
        assert_eq!(
            file_url_to_path("FILE://localhost/tmp/a.html"),
            Some(PathBuf::from("/tmp/a.html"))
        );
        assert_eq!(
            file_url_to_path("file:///C:/Users/me/deck.pptx"),
            Some(PathBuf::from("C:/Users/me/deck.pptx"))
        );
    }

    #[test]
    fn test_remote_urls_are_not_paths() {
        assert!(is_remote_reference("https://example.com/a.pdf"));
        assert!(!is_remote_reference("file:///tmp/a.pdf"));
        assert!(!is_remote_reference("/tmp/a.pdf"));
        assert!(!is_remote_reference("C:\\docs\\a.pdf"));
        assert_eq!(file_url_to_path("https://example.com/a.pdf"), None);
    }

    #[test]
    fn test_unresolvable_file_reference_falls_back_to_original() {
        let reference = "file:///.file/id=6571367.2773272/";

        // No such volume id exists (and on other platforms it cannot be resolved at all)
        assert_eq!(
            MacosPlatform.resolve_dropped(reference),
            PathBuf::from(reference)
        );
    }

    #[test]
    fn test_macos_decodes_regular_file_urls() {
        assert_eq!(
            MacosPlatform.resolve_dropped("file:///Users/me/Notes%202024.docx"),
            PathBuf::from("/Users/me/Notes 2024.docx")
        );
    }
}
