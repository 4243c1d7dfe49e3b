//! Executable resolution.

use solr_common::{ProcessError, ProcessResult};
use std::path::{Path, PathBuf};

/// Locate `executable` the way a shell would.
///
/// Bare names are looked up on `PATH`. Anything containing a path separator
/// is taken as a path and must point at an existing file.
pub fn resolve_executable(executable: &str) -> ProcessResult<PathBuf> {
    if executable.is_empty() {
        return Err(ProcessError::executable_not_found(
            executable,
            "executable name cannot be empty",
        ));
    }

    let candidate = Path::new(executable);
    if candidate.components().count() > 1 {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(ProcessError::executable_not_found(
                executable,
                "no such file",
            ))
        };
    }

    which::which(executable)
        .map_err(|e| ProcessError::executable_not_found(executable, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(matches!(
            resolve_executable(""),
            Err(ProcessError::ExecutableNotFound { .. })
        ));
    }

    #[test]
    fn test_absent_executable_is_not_found() {
        let err = resolve_executable("solr-supervisor-no-such-jvm-7f3a").unwrap_err();
        assert!(matches!(err, ProcessError::ExecutableNotFound { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_resolves_on_path() {
        let path = resolve_executable("sh").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("sh"));
    }

    #[test]
    #[cfg(unix)]
    fn test_explicit_path_must_exist() {
        assert_eq!(resolve_executable("/bin/sh").unwrap(), PathBuf::from("/bin/sh"));
        assert!(resolve_executable("/no/such/dir/java").is_err());
    }
}
