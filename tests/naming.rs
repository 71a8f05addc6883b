// ABOUTME: Integration tests for project identity and stack naming.
// ABOUTME: Property tests for canonicalization plus discovery from package.json and git HEAD.

use hoist::types::*;
use proptest::prelude::*;
use std::fs;

mod canonical {
    use super::*;

    proptest! {
        /// Test: canonical names only hold alphanumerics and single inner separators.
        #[test]
        fn output_is_alphanumeric_with_single_separators(input in ".{0,64}") {
            let out = canonicalize(&input);
            prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
            prop_assert!(!out.starts_with('-'));
            prop_assert!(!out.ends_with('-'));
            prop_assert!(!out.contains("--"));
        }

        /// Test: canonicalizing twice changes nothing.
        #[test]
        fn idempotent(input in ".{0,64}") {
            let once = canonicalize(&input);
            prop_assert_eq!(canonicalize(&once), once);
        }

        /// Test: every alphanumeric of the input survives, in order.
        #[test]
        fn keeps_alphanumerics(input in "[a-zA-Z0-9/_@. -]{0,40}") {
            let kept: String = input.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            let out: String = canonicalize(&input).chars().filter(|c| *c != '-').collect();
            prop_assert_eq!(out, kept);
        }
    }

    #[test]
    fn scoped_package_and_branch_paths() {
        assert_eq!(canonicalize("@scope/my_pkg"), "scope-my-pkg");
        assert_eq!(canonicalize("feature/JIRA-12__fix"), "feature-JIRA-12-fix");
        assert_eq!(canonicalize("///"), "");
    }
}

mod stack_names {
    use super::*;

    fn naming(project: &str, branch: Option<&str>) -> StackNaming {
        StackNaming::new("hoist", ProjectIdentity::new(project, branch).unwrap()).unwrap()
    }

    #[test]
    fn per_kind_names() {
        let naming = naming("@acme/site", Some("feature/login"));
        assert_eq!(
            naming.stack_name(StackKind::Web).unwrap().as_str(),
            "hoist-web-acme-site-feature-login"
        );
        assert_eq!(
            naming.stack_name(StackKind::Domain).unwrap().as_str(),
            "hoist-domain-acme-site-feature-login"
        );
        assert_eq!(
            naming.stack_name(StackKind::Alias).unwrap().as_str(),
            "hoist-alias-acme-site-feature-login"
        );
    }

    /// Test: the support stack is shared by every project and branch.
    #[test]
    fn support_stack_is_shared() {
        let a = naming("one", Some("main")).stack_name(StackKind::Support).unwrap();
        let b = naming("two", Some("dev")).stack_name(StackKind::Support).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hoist-support");
    }

    #[test]
    fn missing_branch_defaults_to_main() {
        let identity = ProjectIdentity::new("site", None).unwrap();
        assert_eq!(identity.branch(), DEFAULT_BRANCH);
        let identity = ProjectIdentity::new("site", Some("///")).unwrap();
        assert_eq!(identity.branch(), DEFAULT_BRANCH);
    }

    #[test]
    fn empty_project_is_rejected() {
        assert!(matches!(
            ProjectIdentity::new("@/", Some("main")),
            Err(StackNameError::EmptyProject(_))
        ));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let long = "a".repeat(130);
        let naming = naming(&long, Some("main"));
        assert!(matches!(
            naming.stack_name(StackKind::Web),
            Err(StackNameError::TooLong(_))
        ));
    }

    #[test]
    fn prefix_validation() {
        assert!(validate_prefix("hoist").is_ok());
        assert!(validate_prefix("my-org2").is_ok());
        assert!(matches!(validate_prefix(""), Err(StackNameError::EmptyPrefix)));
        assert!(matches!(
            validate_prefix("1st"),
            Err(StackNameError::PrefixStartsWithNonLetter(_))
        ));
        assert!(matches!(
            validate_prefix("my_org"),
            Err(StackNameError::InvalidPrefixChar('_'))
        ));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn reads_package_name_and_git_branch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "@acme/blog"}"#).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/feature/dark-mode\n").unwrap();

        let identity = ProjectIdentity::discover(dir.path()).unwrap();

        assert_eq!(identity.project(), "acme-blog");
        assert_eq!(identity.branch(), "feature-dark-mode");
    }

    #[test]
    fn falls_back_to_directory_name_and_main() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("my_site");
        fs::create_dir(&dir).unwrap();

        let identity = ProjectIdentity::discover(&dir).unwrap();

        assert_eq!(identity.project(), "my-site");
        assert_eq!(identity.branch(), "main");
    }

    /// Test: a detached HEAD has no branch name, so the default is used.
    #[test]
    fn detached_head_uses_default_branch() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(".git/HEAD"),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904\n",
        )
        .unwrap();

        assert_eq!(current_branch(dir.path()), None);
    }
}
