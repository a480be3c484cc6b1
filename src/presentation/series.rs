//! Episodes of a series.

use hordebrowse_common::{Criteria, CriterionValue};
use hordebrowse_db::Record;

use super::{collect_tags, display_name, Presentation, PresentationKind, ViewItem};

pub fn presentation() -> Presentation {
    Presentation {
        kind: PresentationKind::Series,
        criteria: Criteria::new().with("series", CriterionValue::Any),
        build,
    }
}

/// `<series> S<season>E<episode> - <title>`, omitting whatever is unknown.
pub fn build(record: &Record) -> ViewItem {
    let mut title = record.first("series").unwrap_or_default().to_string();

    let season = record.first("season").and_then(|s| s.parse::<u32>().ok());
    let episode = record.first("episode").and_then(|e| e.parse::<u32>().ok());
    match (season, episode) {
        (Some(s), Some(e)) => title.push_str(&format!(" S{s:02}E{e:02}")),
        (Some(s), None) => title.push_str(&format!(" S{s:02}")),
        (None, Some(e)) => title.push_str(&format!(" E{e:02}")),
        (None, None) => {}
    }

    if let Some(episode_title) = record.first("title") {
        title.push_str(" - ");
        title.push_str(episode_title);
    }

    if title.trim().is_empty() {
        title = display_name(record);
    }

    ViewItem {
        asset: record.id.clone(),
        kind: PresentationKind::Series,
        title,
        category_icon: "series".to_string(),
        tags: collect_tags(record, &["genre"]),
        image_uri: record.first("image").map(str::to_string),
    }
}
