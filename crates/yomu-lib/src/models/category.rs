use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub order: i64,
    pub default: bool,
    pub include_in_update: bool,
    pub include_in_download: bool,
    pub manga_count: i64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_category() {
        let category: Category = serde_json::from_str(
            r#"{"id":1,"name":"Reading","order":2,"default":false,"includeInUpdate":true,"includeInDownload":false,"mangaCount":12}"#,
        )
        .unwrap();
        assert_eq!(category.name, "Reading");
        assert!(category.include_in_update);
        assert_eq!(category.manga_count, 12);
    }
}
