use serde::{Deserialize, Serialize};

/// Id the backend assigns to the source serving local files
pub const LOCAL_SOURCE_ID: &str = "0";

/// Extension a source was installed from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRef {
    pub pkg_name: Option<String>,
    pub repo: Option<String>,
}

/// A type represent source, as listed by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub lang: String,
    pub icon_url: String,
    pub is_nsfw: bool,
    pub is_configurable: bool,
    pub supports_latest: bool,
    pub extension: Option<ExtensionRef>,
}

impl Source {
    pub fn is_local(&self) -> bool {
        self.id == LOCAL_SOURCE_ID
    }

    pub fn pkg_name(&self) -> Option<&str> {
        self.extension.as_ref().and_then(|ext| ext.pkg_name.as_deref())
    }

    pub fn repo(&self) -> Option<&str> {
        self.extension.as_ref().and_then(|ext| ext.repo.as_deref())
    }
}

/// An installable extension package
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub pkg_name: String,
    pub name: String,
    pub lang: String,
    pub version_name: String,
    pub icon_url: String,
    pub repo: Option<String>,
    pub is_installed: bool,
    pub is_nsfw: bool,
    pub is_obsolete: bool,
    pub has_update: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_extension() {
        let extension: Extension = serde_json::from_str(
            r#"{"pkgName":"eu.kanade.tachiyomi.extension.en.mangadex","name":"MangaDex","lang":"en","versionName":"1.4.2","iconUrl":"/icon.png","repo":null,"isInstalled":true,"isNsfw":false,"isObsolete":false,"hasUpdate":true}"#,
        )
        .unwrap();
        assert_eq!(extension.name, "MangaDex");
        assert_eq!(extension.repo, None);
        assert!(extension.is_installed && extension.has_update);
    }
}
