//! Which sources a session may see.
//!
//! Sessions with the admin role see every source. Everyone else only sees
//! sources whose extension package is on the allow-list served by the SaaS
//! config endpoint. Until that list has been fetched nothing is visible.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Source;

/// Value the admin flag holds in local storage for admins
pub const ADMIN_FLAG: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    /// Reads the persisted admin flag, anything but `"true"` is a member
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(ADMIN_FLAG) => Role::Admin,
            _ => Role::Member,
        }
    }

    /// Maps the `role` column of the `profiles` table
    pub fn from_profile(role: Option<&str>) -> Self {
        match role {
            Some("admin") => Role::Admin,
            _ => Role::Member,
        }
    }

    pub fn as_flag(&self) -> &'static str {
        match self {
            Role::Admin => ADMIN_FLAG,
            Role::Member => "false",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Who is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub role: Role,
}

impl Subject {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

pub trait Policy {
    fn is_authorized(&self, subject: &Subject, source: &Source) -> Decision;
}

/// Package names non-admins may browse. `None` until the config arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(Option<HashSet<String>>);

impl AllowList {
    pub fn pending() -> Self {
        Self(None)
    }

    pub fn loaded<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Some(packages.into_iter().map(Into::into).collect()))
    }

    pub fn is_loaded(&self) -> bool {
        self.0.is_some()
    }

    pub fn contains(&self, pkg_name: &str) -> bool {
        self.0
            .as_ref()
            .map(|packages| packages.contains(pkg_name))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntitlementPolicy {
    allow_list: AllowList,
}

impl EntitlementPolicy {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

impl Policy for EntitlementPolicy {
    fn is_authorized(&self, subject: &Subject, source: &Source) -> Decision {
        if subject.role.is_admin() {
            return Decision::Allow;
        }

        // sources without an extension package (local source) are never listed for members
        match source.pkg_name() {
            Some(pkg_name) if self.allow_list.contains(pkg_name) => Decision::Allow,
            _ => Decision::Deny,
        }
    }
}

pub fn filter_entitled<P: Policy>(subject: &Subject, policy: &P, sources: &[Source]) -> Vec<Source> {
    sources
        .iter()
        .filter(|source| policy.is_authorized(subject, source).is_allowed())
        .cloned()
        .collect()
}

/// Body of `/api/saas/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaasConfig {
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl SaasConfig {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn into_allow_list(self) -> AllowList {
        AllowList::loaded(self.allowed_extensions)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::ExtensionRef;

    fn source(id: &str, pkg_name: Option<&str>) -> Source {
        Source {
            id: id.to_string(),
            name: id.to_string(),
            extension: Some(ExtensionRef {
                pkg_name: pkg_name.map(str::to_string),
                repo: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_admin_sees_everything() {
        let subject = Subject::new(Role::from_flag(Some("true")));
        let policy = EntitlementPolicy::new(AllowList::loaded(["a.b.c"]));
        let sources = vec![source("1", Some("x.y.z")), source("2", None)];

        assert_eq!(filter_entitled(&subject, &policy, &sources), sources);
    }

    #[test]
    fn test_member_without_match_sees_nothing() {
        let subject = Subject::new(Role::from_flag(None));
        let policy = EntitlementPolicy::new(AllowList::loaded(["a.b.c"]));
        let sources = vec![source("1", Some("x.y.z")), source("2", None)];

        assert!(filter_entitled(&subject, &policy, &sources).is_empty());
    }

    #[test]
    fn test_member_fails_closed_until_loaded() {
        let subject = Subject::new(Role::Member);
        let policy = EntitlementPolicy::new(AllowList::pending());
        let sources = vec![source("1", Some("a.b.c"))];

        assert!(filter_entitled(&subject, &policy, &sources).is_empty());
    }

    #[test]
    fn test_member_sees_allowed_packages_only() {
        let subject = Subject::new(Role::Member);
        let policy = EntitlementPolicy::new(AllowList::loaded(["a.b.c", "d.e.f"]));
        let mut local = source("0", None);
        local.extension = None;
        let sources = vec![
            source("1", Some("a.b.c")),
            source("2", Some("x.y.z")),
            source("3", Some("d.e.f")),
            local,
        ];

        let ids: Vec<String> = filter_entitled(&subject, &policy, &sources)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(Role::from_flag(Some("false")), Role::Member);
        assert_eq!(Role::from_flag(Some("TRUE")), Role::Member);
        assert_eq!(Role::from_profile(Some("admin")), Role::Admin);
        assert_eq!(Role::from_profile(Some("user")), Role::Member);
        assert_eq!(Role::from_flag(Some(Role::Admin.as_flag())), Role::Admin);
    }

    #[test]
    fn test_parse_config() {
        let config = SaasConfig::from_json(r#"{"allowedExtensions":["a.b.c"],"other":1}"#).unwrap();
        let allow_list = config.into_allow_list();
        assert!(allow_list.is_loaded());
        assert!(allow_list.contains("a.b.c"));

        let empty = SaasConfig::from_json("{}").unwrap();
        assert!(empty.allowed_extensions.is_empty());

        assert!(SaasConfig::from_json("not json").is_err());
    }
}
