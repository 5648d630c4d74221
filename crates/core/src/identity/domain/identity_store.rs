use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityStoreError {
    #[error("identity store {0} is not ready")]
    NotReady(PathBuf),
    #[error("failed to read identity store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse identity store {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Maps recognizer identity tags to display names.
///
/// The store may not exist yet when the monitor starts; implementations
/// report that as [`IdentityStoreError::NotReady`] and keep retrying on
/// later calls.
pub trait IdentityStore: Send {
    /// `Ok(None)` when the tag has no record.
    fn lookup(&mut self, face_id: i64) -> Result<Option<String>, IdentityStoreError>;

    fn count(&mut self) -> Result<usize, IdentityStoreError>;
}

/// Outcome of the start-up readiness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreStatus {
    Ready(usize),
    /// Present but without records; recognition cannot name anyone.
    Empty,
    NotReady,
}

pub fn check_identity_store(store: &mut dyn IdentityStore) -> StoreStatus {
    match store.count() {
        Ok(0) => StoreStatus::Empty,
        Ok(n) => StoreStatus::Ready(n),
        Err(e) => {
            log::warn!("Identity store unavailable: {e}");
            StoreStatus::NotReady
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct FixedStore {
        count: Option<usize>,
    }

    impl IdentityStore for FixedStore {
        fn lookup(&mut self, _face_id: i64) -> Result<Option<String>, IdentityStoreError> {
            Ok(None)
        }

        fn count(&mut self) -> Result<usize, IdentityStoreError> {
            self.count
                .ok_or_else(|| IdentityStoreError::NotReady(PathBuf::from("faces.json")))
        }
    }

    #[rstest]
    #[case::ready(Some(3), StoreStatus::Ready(3))]
    #[case::empty(Some(0), StoreStatus::Empty)]
    #[case::missing(None, StoreStatus::NotReady)]
    fn test_check_identity_store(#[case] count: Option<usize>, #[case] expected: StoreStatus) {
        let mut store = FixedStore { count };
        assert_eq!(check_identity_store(&mut store), expected);
    }
}
