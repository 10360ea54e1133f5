//! Utility functions used throughout the library.

use anyhow::{Error, Result};
use log::{error, warn};
use std::ffi::OsStr;
use std::io;
use std::path::Path;

/// Returns `true` if the error originated from a broken pipe.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    err.root_cause()
        .downcast_ref::<io::Error>()
        .map(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
        .unwrap_or(false)
}

/// Validate and normalize a requested CPU count.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    if desired == 0 {
        error!("Must select > 0 threads");
        Err(Error::msg("Too few threads selected"))
    } else if desired > num_cpus::get() {
        warn!(
            "Specified more threads than are available, using {}",
            desired
        );
        Ok(desired)
    } else {
        Ok(desired)
    }
}

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_bgzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgzf"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_extensions_are_detected() {
        assert!(is_bgzipped("regions.txt.gz"));
        assert!(is_bgzipped("regions.bgzf"));
        assert!(!is_bgzipped("regions.txt"));
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(determine_allowed_cpus(0).is_err());
        assert_eq!(determine_allowed_cpus(1).unwrap(), 1);
    }
}
