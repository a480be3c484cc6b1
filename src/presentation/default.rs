//! Fallback presentation matching every record.

use hordebrowse_common::Criteria;
use hordebrowse_db::Record;

use super::{display_name, Presentation, PresentationKind, ViewItem};

/// Attribute keys never shown as tags.
const KEY_BLACKLIST: &[&str] = &["xt", "path", "filetype"];

pub fn presentation() -> Presentation {
    Presentation {
        kind: PresentationKind::Default,
        criteria: Criteria::new(),
        build,
    }
}

pub fn build(record: &Record) -> ViewItem {
    ViewItem {
        asset: record.id.clone(),
        kind: PresentationKind::Default,
        title: display_name(record),
        category_icon: "default".to_string(),
        tags: record
            .keys()
            .filter(|key| !KEY_BLACKLIST.contains(key))
            .map(str::to_string)
            .collect(),
        image_uri: record.first("image").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_tags_skip_blacklisted_keys() {
        let record = Record::new("tree:tiger:D", Utc::now())
            .with_attr("name", "notes.txt")
            .with_attr("path", "/docs/notes.txt")
            .with_attr("filetype", "text")
            .with_attr("xt", "tree:tiger:D")
            .with_attr("language", "en");

        let item = build(&record);
        assert_eq!(item.title, "notes.txt");
        assert_eq!(item.tags, vec!["language", "name"]);
        assert_eq!(item.category_icon, "default");
    }

    #[test]
    fn test_default_is_catch_all() {
        assert!(presentation().is_catch_all());
    }
}
