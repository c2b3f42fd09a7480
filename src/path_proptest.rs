//! Property-based tests for repository path escaping.
//!
//! These tests use proptest to generate random repository paths and verify
//! that destination names stay flat, and that a lock file is only accepted
//! when every repository of a profile gets its own destination.

#[cfg(test)]
mod proptest_tests {
    use crate::lockjson::LockJson;
    use crate::path::encode_repos_path;
    use proptest::prelude::*;

    fn lock_json_with(a: &str, b: &str) -> String {
        serde_json::json!({
            "current_profile_name": "default",
            "repos": [
                { "type": "static", "path": a },
                { "type": "static", "path": b },
            ],
            "profiles": [ { "name": "default", "repos_path": [a, b] } ],
        })
        .to_string()
    }

    proptest! {
        /// Property: destination names never contain a path separator
        #[test]
        fn encode_repos_path_is_flat(input in "[a-z_/.-]{0,40}") {
            let result = encode_repos_path(&input);
            prop_assert!(!result.contains('/'));
        }

        /// Property: a profile is accepted exactly when its destinations differ
        #[test]
        fn lock_json_rejects_shared_destinations(
            a in "[ab_/]{1,8}",
            b in "[ab_/]{1,8}",
        ) {
            prop_assume!(a != b);
            let parsed = LockJson::parse(&lock_json_with(&a, &b));
            if encode_repos_path(&a) == encode_repos_path(&b) {
                let err = parsed.unwrap_err();
                prop_assert!(err.to_string().contains("share destination"));
            } else {
                prop_assert!(parsed.is_ok());
            }
        }

        /// Property: paths without `_` or `/` are left untouched
        #[test]
        fn encode_repos_path_preserves_plain_names(input in "[a-zA-Z0-9.-]+") {
            prop_assert_eq!(encode_repos_path(&input), input);
        }
    }
}
