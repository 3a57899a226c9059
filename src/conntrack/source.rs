use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::CtError;

/// Places the kernel may expose the conntrack table, probed in order.
pub const DEFAULT_TABLE_PATHS: [&str; 2] = [
    "/proc/net/ip_conntrack", // old kernels
    "/proc/net/nf_conntrack", // new kernels
];

/// First candidate path that exists, if any.
pub fn find_table(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Locate the conntrack table exposed by this kernel.
pub fn discover_table() -> Result<PathBuf, CtError> {
    find_table(&DEFAULT_TABLE_PATHS).ok_or_else(|| CtError::TableNotFound {
        tried: DEFAULT_TABLE_PATHS.join(", "),
    })
}

pub fn open_table(path: &Path) -> Result<File, CtError> {
    File::open(path).map_err(|source| CtError::OpenTable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_table_returns_first_existing_candidate() {
        let file = std::env::temp_dir().join(format!("ctstat-source-test-{}", std::process::id()));
        std::fs::write(&file, "").unwrap();

        let present = file.to_str().unwrap();
        assert_eq!(
            find_table(&["/proc/net/ctstat-does-not-exist", present]),
            Some(file.clone())
        );

        std::fs::remove_file(&file).unwrap();
    }

    #[test]
    fn find_table_is_none_when_nothing_exists() {
        let candidates = [
            "/proc/net/ctstat-missing-a",
            "/proc/net/ctstat-missing-b",
        ];
        assert_eq!(find_table(&candidates), None);
    }

    #[test]
    fn open_table_names_the_path_in_its_error() {
        let err = open_table(Path::new("/proc/net/ctstat-missing")).unwrap_err();
        assert!(matches!(err, CtError::OpenTable { .. }));
        assert!(err.to_string().contains("/proc/net/ctstat-missing"));
    }
}
