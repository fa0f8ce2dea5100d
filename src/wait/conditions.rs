// Canned wait probes
//
// Probes the harness reaches for most often: a file appearing, a file
// growing content, a log line matching, a flag flipped by another thread.
// Each returns an `FnMut() -> bool` closure suitable for
// `ConditionWaiter::wait_until`.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fmt::Display;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Probe that is satisfied once `path` exists.
pub fn file_exists(path: impl AsRef<Utf8Path>) -> impl FnMut() -> bool {
    let path: Utf8PathBuf = path.as_ref().to_path_buf();
    move || path.exists()
}

/// Probe that is satisfied once `path` exists and is non-empty.
///
/// Useful for output files that are created empty and written
/// asynchronously by the application under test.
pub fn file_has_content(path: impl AsRef<Utf8Path>) -> impl FnMut() -> bool {
    let path: Utf8PathBuf = path.as_ref().to_path_buf();
    move || fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Probe that is satisfied once the contents of `path` match `pattern`.
///
/// A missing or unreadable file counts as "not satisfied", not an error:
/// the typical target is a log file that the application has not created
/// yet.
pub fn file_contains(path: impl AsRef<Utf8Path>, pattern: Regex) -> impl FnMut() -> bool {
    let path: Utf8PathBuf = path.as_ref().to_path_buf();
    move || match fs::read_to_string(&path) {
        Ok(contents) => pattern.is_match(&contents),
        Err(e) => {
            tracing::trace!("probe: cannot read {}: {}", path, e);
            false
        }
    }
}

/// Probe that is satisfied once `flag` is raised.
pub fn flag_raised(flag: Arc<AtomicBool>) -> impl FnMut() -> bool {
    move || flag.load(Ordering::SeqCst)
}

/// Wrap a fallible probe so transient errors count as "not satisfied".
///
/// Mirrors the widget-lookup pattern: probing state that does not exist
/// yet raises a lookup error rather than returning false. Such errors are
/// trace-logged and treated as an unsatisfied poll; only the enclosing
/// wait's timeout is terminal.
pub fn retryable<F, E>(mut probe: F) -> impl FnMut() -> bool
where
    F: FnMut() -> Result<bool, E>,
    E: Display,
{
    move || match probe() {
        Ok(satisfied) => satisfied,
        Err(e) => {
            tracing::trace!("probe not ready yet: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::ConditionWaiter;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_file_exists_probe() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("out.pdf");

        let mut probe = file_exists(&path);
        assert!(!probe());

        fs::write(&path, b"%PDF").unwrap();
        assert!(probe());
    }

    #[test]
    fn test_file_has_content_probe() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("out.pdf");

        let mut probe = file_has_content(&path);
        assert!(!probe());

        // Empty file is not enough
        fs::File::create(&path).unwrap();
        assert!(!probe());

        let mut f = fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"%PDF-1.7").unwrap();
        f.flush().unwrap();
        assert!(probe());
    }

    #[test]
    fn test_file_contains_probe() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("app.log");
        let pattern = Regex::new(r"signature (complete|applied)").unwrap();

        let mut probe = file_contains(&path, pattern);

        // Missing file: pending, not fatal
        assert!(!probe());

        fs::write(&path, "starting up\n").unwrap();
        assert!(!probe());

        fs::write(&path, "starting up\nsignature complete\n").unwrap();
        assert!(probe());
    }

    #[test]
    fn test_flag_raised_probe() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut probe = flag_raised(flag.clone());

        assert!(!probe());
        flag.store(true, Ordering::SeqCst);
        assert!(probe());
    }

    #[test]
    fn test_retryable_maps_errors_to_unsatisfied() {
        let mut calls = 0;
        let mut probe = retryable(move || -> Result<bool, String> {
            calls += 1;
            match calls {
                1 => Err("widget not rendered yet".to_string()),
                2 => Ok(false),
                _ => Ok(true),
            }
        });

        assert!(!probe()); // error -> pending
        assert!(!probe()); // explicit false
        assert!(probe());
    }

    #[test]
    fn test_retryable_under_waiter() {
        let waiter = ConditionWaiter::with_poll_interval(Duration::from_millis(5));
        let mut calls = 0;

        waiter
            .wait_until(
                retryable(move || -> Result<bool, &'static str> {
                    calls += 1;
                    if calls < 3 { Err("not found") } else { Ok(true) }
                }),
                "probe recovers",
                Duration::from_secs(5),
            )
            .unwrap();
    }
}
