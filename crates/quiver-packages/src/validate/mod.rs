//! Structural and semantic validation of manifests and test cases.
//!
//! Validators never short-circuit: every problem is collected into one
//! [`ValidationResult`](crate::ValidationResult) so a caller sees the complete
//! error set in a single pass.

mod manifest;
mod test_case;

use std::path::{Component, Path};

pub use manifest::ManifestValidator;
pub use test_case::TestCaseValidator;

/// `true` when `path` is relative and stays inside the package root.
pub(crate) fn is_package_relative(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    let mut has_normal = false;
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => has_normal = true,
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    has_normal
}
