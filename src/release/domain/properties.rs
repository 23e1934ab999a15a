//! Free-form release request properties.

use std::collections::HashMap;

/// Typed view over the free-form properties attached to a release request.
///
/// Only the recognised keys are kept; anything else is ignored. Boolean
/// properties are `true` only for a case-insensitive `"true"`; surrounding
/// whitespace makes a value false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseProperties {
    /// `scm-tag`: explicit tag label for the release.
    pub scm_tag: Option<String>,
    /// `scm-tagbase`: base location for tags on branch-based SCMs.
    pub scm_tag_base: Option<String>,
    /// `preparation-goals`: goals run between the release rewrite and commit.
    pub preparation_goals: Option<String>,
    /// `arguments`: extra command-line arguments for the build tool.
    pub arguments: Option<String>,
    /// `add-schema`: whether rewritten manifests get a schema declaration.
    pub add_schema: bool,
    /// `auto-version-submodules`: whether submodules inherit the root version.
    pub auto_version_submodules: bool,
    /// `use-edit-mode`: whether the SCM needs an explicit edit before writes.
    pub use_edit_mode: bool,
    /// `scm-username`: SCM credential override.
    pub scm_username: Option<String>,
    /// `scm-password`: SCM credential override.
    pub scm_password: Option<String>,
    /// `scm-comment-prefix`: prefix for release commit messages.
    pub scm_comment_prefix: Option<String>,
    /// `use-release-profile`: present only when the request set it.
    pub use_release_profile: Option<bool>,
    /// `release-by`: the user requesting the release.
    pub release_by: Option<String>,
}

impl ReleaseProperties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the recognised keys from a free-form property map.
    #[must_use]
    pub fn from_map<S: std::hash::BuildHasher>(properties: &HashMap<String, String, S>) -> Self {
        let text = |key: &str| properties.get(key).cloned();
        let flag = |key: &str| properties.get(key).is_some_and(|value| parse_flag(value));

        Self {
            scm_tag: text("scm-tag"),
            scm_tag_base: text("scm-tagbase"),
            preparation_goals: text("preparation-goals"),
            arguments: text("arguments"),
            add_schema: flag("add-schema"),
            auto_version_submodules: flag("auto-version-submodules"),
            use_edit_mode: flag("use-edit-mode"),
            scm_username: text("scm-username"),
            scm_password: text("scm-password"),
            scm_comment_prefix: text("scm-comment-prefix"),
            use_release_profile: properties
                .get("use-release-profile")
                .map(|value| parse_flag(value)),
            release_by: text("release-by"),
        }
    }

    /// Sets the explicit tag label.
    #[must_use]
    pub fn with_scm_tag(mut self, tag: impl Into<String>) -> Self {
        self.scm_tag = Some(tag.into());
        self
    }

    /// Sets extra build-tool arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Sets the preparation goals.
    #[must_use]
    pub fn with_preparation_goals(mut self, goals: impl Into<String>) -> Self {
        self.preparation_goals = Some(goals.into());
        self
    }

    /// Sets the release-profile flag.
    #[must_use]
    pub const fn with_release_profile(mut self, enabled: bool) -> Self {
        self.use_release_profile = Some(enabled);
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
