//! Template family detection. Runs once per page; the resulting tag picks the
//! extractor for the whole page.

use crate::dom::css;
use crate::model::EntityKind;
use anyhow::Result;
use scraper::Html;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// Current site builder, `s-*` class names, card based.
    Nextgen,
    /// Older site builder, `sidearm-*` class names.
    Classic,
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Nextgen => f.write_str("nextgen"),
            FormatTag::Classic => f.write_str("classic"),
        }
    }
}

/// Marker selectors per entity kind, in detection priority order.
pub fn markers(kind: EntityKind) -> &'static [(FormatTag, &'static str)] {
    match kind {
        EntityKind::Roster => &[
            (FormatTag::Nextgen, ".s-person-card"),
            (FormatTag::Classic, ".sidearm-roster-player"),
        ],
        EntityKind::Schedule => &[
            (FormatTag::Nextgen, ".s-game-card"),
            (FormatTag::Classic, ".sidearm-schedule-game"),
        ],
        EntityKind::Stats => &[
            (FormatTag::Nextgen, "table.s-table"),
            (FormatTag::Classic, "table.sidearm-table"),
        ],
        EntityKind::News => &[
            (FormatTag::Nextgen, ".s-story-card"),
            (FormatTag::Classic, ".sidearm-archives a[href*='/news/']"),
        ],
    }
}

/// First family whose marker is present wins. `None` means the page carries
/// neither template and should be read as "no records".
pub fn detect(document: &Html, kind: EntityKind) -> Result<Option<FormatTag>> {
    for (tag, marker) in markers(kind) {
        let selector = css(marker)?;
        if document.select(&selector).next().is_some() {
            return Ok(Some(*tag));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn detects_each_family_per_entity() {
        let nextgen = doc(r#"<div class="s-person-card">x</div>"#);
        let classic = doc(r#"<li class="sidearm-roster-player">x</li>"#);
        assert_eq!(detect(&nextgen, EntityKind::Roster).unwrap(), Some(FormatTag::Nextgen));
        assert_eq!(detect(&classic, EntityKind::Roster).unwrap(), Some(FormatTag::Classic));

        let schedule = doc(r#"<li class="sidearm-schedule-game">x</li>"#);
        assert_eq!(detect(&schedule, EntityKind::Schedule).unwrap(), Some(FormatTag::Classic));
    }

    #[test]
    fn nextgen_wins_when_both_are_present() {
        let both = doc(r#"<div class="s-game-card"></div><li class="sidearm-schedule-game"></li>"#);
        assert_eq!(detect(&both, EntityKind::Schedule).unwrap(), Some(FormatTag::Nextgen));
    }

    #[test]
    fn unknown_markup_yields_none() {
        let page = doc(r#"<div class="roster-table"><p>Jane Doe</p></div>"#);
        for kind in EntityKind::ALL {
            assert_eq!(detect(&page, kind).unwrap(), None);
        }
    }

    #[test]
    fn classic_archive_needs_news_links() {
        let empty = doc(r#"<div class="sidearm-archives"><a href="/sports/softball">Softball</a></div>"#);
        assert_eq!(detect(&empty, EntityKind::News).unwrap(), None);

        let with_news = doc(r#"<div class="sidearm-archives"><a href="/news/2025/5/28/x.aspx">X</a></div>"#);
        assert_eq!(detect(&with_news, EntityKind::News).unwrap(), Some(FormatTag::Classic));
    }
}
