//! Feature films.

use hordebrowse_common::{Criteria, CriterionValue};
use hordebrowse_db::Record;

use super::{collect_tags, display_name, Presentation, PresentationKind, ViewItem};

pub fn presentation() -> Presentation {
    Presentation {
        kind: PresentationKind::Movie,
        criteria: Criteria::new().with("category", CriterionValue::Exact("movie".into())),
        build,
    }
}

pub fn build(record: &Record) -> ViewItem {
    let name = display_name(record);
    let title = match record.first("year") {
        Some(year) => format!("{name} ({year})"),
        None => name,
    };

    ViewItem {
        asset: record.id.clone(),
        kind: PresentationKind::Movie,
        title,
        category_icon: "movie".to_string(),
        tags: collect_tags(record, &["genre", "director"]),
        image_uri: record.first("image").map(str::to_string),
    }
}
