//! Canonicalization of user-entered repository paths.
//!
//! Everything here is lexical: no filesystem access, no error cases. Input
//! that cannot be made sense of resolves best-effort instead of failing.

use std::path::{Component, Path, PathBuf};

/// Resolve a user-entered path to its canonical absolute form.
///
/// A leading `~` or `~/` expands to the current user's home directory, a
/// relative remainder is resolved against `/`, and `.`/`..` segments are
/// folded lexically. Idempotent: feeding the output back in returns the
/// same path.
#[must_use]
pub fn normalize(raw: &str) -> PathBuf {
    let expanded = expand_home(raw);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        Path::new("/").join(expanded)
    };
    simplify(&absolute)
}

/// Expand a leading home-directory shorthand.
///
/// Only `~` on its own and the `~/` prefix are recognized; `~user` forms
/// pass through untouched. When no home directory can be determined the
/// shorthand also passes through.
#[must_use]
pub fn expand_home(raw: &str) -> PathBuf {
    match dirs::home_dir() {
        Some(home) if raw == "~" => home,
        Some(home) => raw
            .strip_prefix("~/")
            .map_or_else(|| PathBuf::from(raw), |rest| home.join(rest)),
        None => PathBuf::from(raw),
    }
}

/// Fold `.` and `..` segments without touching the filesystem.
///
/// `..` at the root stays at the root, matching lexical resolution rather
/// than symlink-aware canonicalization.
#[must_use]
pub fn simplify(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn home() -> PathBuf {
        dirs::home_dir().expect("home dir available in tests")
    }

    #[test]
    fn absolute_paths_pass_through() {
        assert_eq!(normalize("/srv/repos/app"), PathBuf::from("/srv/repos/app"));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        assert_eq!(normalize("repos/app"), PathBuf::from("/repos/app"));
    }

    #[test]
    fn bare_tilde_expands_to_home() {
        assert_eq!(normalize("~"), home());
    }

    #[test]
    fn tilde_prefix_expands_to_home() {
        assert_eq!(normalize("~/src/app"), home().join("src/app"));
    }

    #[test]
    fn tilde_user_form_is_not_expanded() {
        assert_eq!(normalize("~alice/src"), PathBuf::from("/~alice/src"));
    }

    #[test]
    fn dot_segments_fold_away() {
        assert_eq!(normalize("/a/./b/../c"), PathBuf::from("/a/c"));
    }

    #[test]
    fn parent_segments_stop_at_root() {
        assert_eq!(normalize("/../../etc"), PathBuf::from("/etc"));
    }

    #[test]
    fn trailing_separator_is_dropped() {
        assert_eq!(normalize("/srv/repos/"), PathBuf::from("/srv/repos"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in ".{0,64}") {
            let once = normalize(&raw);
            let twice = normalize(&once.to_string_lossy());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_output_is_absolute(raw in ".{1,64}") {
            prop_assert!(normalize(&raw).is_absolute());
        }

        #[test]
        fn normalized_output_has_no_dot_segments(raw in ".{1,64}") {
            let out = normalize(&raw);
            prop_assert!(out
                .components()
                .all(|c| !matches!(c, Component::CurDir | Component::ParentDir)));
        }
    }
}
