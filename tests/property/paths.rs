//! Property-based tests for path normalization

use nbcontents::path::{join, normalize, split, split_extension};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_ -]{1,12}(\\.[a-z]{1,4})?"
}

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 0..5)
}

proptest! {
    /// Leading and trailing slashes never change the normalized path
    #[test]
    fn test_normalize_ignores_outer_slashes(parts in segments(), lead in 0usize..3, trail in 0usize..3) {
        let plain = parts.join("/");
        let padded = format!("{}{}{}", "/".repeat(lead), plain, "/".repeat(trail));
        prop_assert_eq!(normalize(&padded).unwrap(), normalize(&plain).unwrap());
    }

    /// Normalization is idempotent
    #[test]
    fn test_normalize_idempotent(parts in segments()) {
        let once = normalize(&parts.join("/")).unwrap();
        let twice = normalize(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Rejoining the split segments reproduces the path
    #[test]
    fn test_split_then_join(parts in segments()) {
        let path = normalize(&parts.join("/")).unwrap();
        let (dir, name) = split(&path);
        if path.is_root() {
            prop_assert!(name.is_empty());
        } else {
            prop_assert_eq!(join(&dir, &name).unwrap(), path.clone());
            prop_assert_eq!(dir, path.parent());
        }
    }

    /// Base and extension always concatenate back to the name
    #[test]
    fn test_split_extension_concatenates(name in segment()) {
        let (base, ext) = split_extension(&name);
        prop_assert_eq!(format!("{}{}", base, ext), name.clone());
        prop_assert!(ext.is_empty() || ext.starts_with('.'));
        prop_assert!(!base.is_empty());
    }

    /// Dot segments are always rejected wherever they appear
    #[test]
    fn test_dot_segments_rejected(parts in segments(), at in 0usize..5, dots in prop::sample::select(vec![".", ".."])) {
        let mut parts = parts;
        let at = at.min(parts.len());
        parts.insert(at, dots.to_string());
        prop_assert!(normalize(&parts.join("/")).is_err());
    }
}
