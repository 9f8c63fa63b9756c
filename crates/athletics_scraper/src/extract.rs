//! Field extractors, one per (template family, entity kind).
//!
//! Extractors only read the DOM. They return raw, family-shaped records with
//! `None` for anything missing; `normalize` turns those into canonical
//! entities.

use crate::detect::FormatTag;
use crate::dom::{css, select_attr, select_text, select_text_collapsed, text_content};
use crate::labels::{collapse_whitespace, extract_labeled, PersonField, PERSON_CARD_RULES};
use crate::model::EntityKind;
use anyhow::Result;
use scraper::{ElementRef, Html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPlayer {
    pub name: Option<String>,
    pub jersey_number: Option<String>,
    pub position: Option<String>,
    pub year: Option<String>,
    pub hometown: Option<String>,
    pub height: Option<String>,
    pub high_school: Option<String>,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGame {
    pub date: Option<String>,
    pub opponent: Option<String>,
    pub location: Option<String>,
    pub result: Option<String>,
    pub score: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStatTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStory {
    pub title: Option<String>,
    pub href: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Roster(Vec<RawPlayer>),
    Schedule(Vec<RawGame>),
    Stats(RawStatTable),
    News(Vec<RawStory>),
    /// No known template on the page.
    Unrecognized,
}

impl Extraction {
    pub fn len(&self) -> usize {
        match self {
            Extraction::Roster(v) => v.len(),
            Extraction::Schedule(v) => v.len(),
            Extraction::Stats(t) => t.rows.len(),
            Extraction::News(v) => v.len(),
            Extraction::Unrecognized => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs the extractor registered for `(tag, kind)`.
pub fn extract(document: &Html, kind: EntityKind, tag: Option<FormatTag>) -> Result<Extraction> {
    let Some(tag) = tag else {
        return Ok(Extraction::Unrecognized);
    };

    let extraction = match (kind, tag) {
        (EntityKind::Roster, FormatTag::Classic) => Extraction::Roster(classic_roster(document)?),
        (EntityKind::Roster, FormatTag::Nextgen) => Extraction::Roster(person_cards(document)?),
        (EntityKind::Schedule, FormatTag::Classic) => Extraction::Schedule(classic_schedule(document)?),
        (EntityKind::Schedule, FormatTag::Nextgen) => Extraction::Schedule(game_cards(document)?),
        (EntityKind::Stats, FormatTag::Classic) => Extraction::Stats(stat_table(document, "table.sidearm-table")?),
        (EntityKind::Stats, FormatTag::Nextgen) => Extraction::Stats(stat_table(document, "table.s-table")?),
        (EntityKind::News, FormatTag::Classic) => Extraction::News(archive_links(document)?),
        (EntityKind::News, FormatTag::Nextgen) => Extraction::News(story_cards(document)?),
    };

    Ok(extraction)
}

// ── roster ───────────────────────────────────────────────────────────────────

fn classic_roster(document: &Html) -> Result<Vec<RawPlayer>> {
    let player_sel = css(".sidearm-roster-player")?;
    let name_link_sel = css(".sidearm-roster-player-name a")?;
    let name_sel = css(".sidearm-roster-player-name")?;
    let jersey_sel = css(".sidearm-roster-player-jersey-number")?;
    let position_sel = css(".sidearm-roster-player-position")?;
    let year_sel = css(".sidearm-roster-player-academic-year")?;
    let hometown_sel = css(".sidearm-roster-player-hometown")?;
    let height_sel = css(".sidearm-roster-player-height")?;
    let school_sel = css(".sidearm-roster-player-highschool")?;

    let players = document
        .select(&player_sel)
        .map(|player| RawPlayer {
            name: select_text_collapsed(&player, &name_link_sel)
                .or_else(|| select_text_collapsed(&player, &name_sel)),
            jersey_number: select_text(&player, &jersey_sel),
            // The position cell also carries height/weight on later lines.
            position: select_text(&player, &position_sel)
                .and_then(|p| p.lines().next().map(|l| l.trim().to_string()))
                .filter(|p| !p.is_empty()),
            year: select_text(&player, &year_sel),
            hometown: select_text_collapsed(&player, &hometown_sel),
            height: select_text(&player, &height_sel),
            high_school: select_text_collapsed(&player, &school_sel),
            href: select_attr(&player, &name_link_sel, "href"),
        })
        .collect();

    Ok(players)
}

fn person_cards(document: &Html) -> Result<Vec<RawPlayer>> {
    let card_sel = css(".s-person-card")?;
    let heading_sel = css("h3")?;
    let heading_link_sel = css("h3 a")?;
    let link_sel = css("a[href]")?;

    let players = document
        .select(&card_sel)
        .map(|card| {
            let text = collapse_whitespace(&text_content(&card));
            let mut fields = extract_labeled(&text, PERSON_CARD_RULES);

            RawPlayer {
                name: select_text_collapsed(&card, &heading_sel)
                    .or_else(|| select_text_collapsed(&card, &link_sel)),
                jersey_number: fields.remove(&PersonField::JerseyNumber),
                position: fields.remove(&PersonField::Position),
                year: fields.remove(&PersonField::Year),
                hometown: fields.remove(&PersonField::Hometown),
                height: fields.remove(&PersonField::Height),
                high_school: fields.remove(&PersonField::HighSchool),
                href: select_attr(&card, &heading_link_sel, "href")
                    .or_else(|| select_attr(&card, &link_sel, "href")),
            }
        })
        .collect();

    Ok(players)
}

// ── schedule ─────────────────────────────────────────────────────────────────

struct GameSelectors {
    item: &'static str,
    date: &'static str,
    opponent: &'static str,
    location: &'static str,
    result: &'static str,
    score: &'static str,
}

const CLASSIC_GAME: GameSelectors = GameSelectors {
    item: ".sidearm-schedule-game",
    date: ".sidearm-schedule-game-date",
    opponent: ".sidearm-schedule-game-opponent-name",
    location: ".sidearm-schedule-game-location",
    result: ".sidearm-schedule-game-result",
    score: ".sidearm-schedule-game-result-score",
};

const NEXTGEN_GAME: GameSelectors = GameSelectors {
    item: ".s-game-card",
    date: ".s-game-card__date",
    opponent: ".s-game-card__opponent-name",
    location: ".s-game-card__location",
    result: ".s-game-card__result-status",
    score: ".s-game-card__result-score",
};

fn classic_schedule(document: &Html) -> Result<Vec<RawGame>> {
    games_with(document, &CLASSIC_GAME)
}

fn game_cards(document: &Html) -> Result<Vec<RawGame>> {
    games_with(document, &NEXTGEN_GAME)
}

fn games_with(document: &Html, s: &GameSelectors) -> Result<Vec<RawGame>> {
    let item_sel = css(s.item)?;
    let date_sel = css(s.date)?;
    let opponent_sel = css(s.opponent)?;
    let location_sel = css(s.location)?;
    let result_sel = css(s.result)?;
    let score_sel = css(s.score)?;

    let games = document
        .select(&item_sel)
        .map(|game| RawGame {
            date: select_text_collapsed(&game, &date_sel),
            opponent: select_text_collapsed(&game, &opponent_sel),
            location: select_text_collapsed(&game, &location_sel),
            result: select_text_collapsed(&game, &result_sel),
            score: select_text_collapsed(&game, &score_sel),
        })
        .collect();

    Ok(games)
}

// ── stats ────────────────────────────────────────────────────────────────────

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&text_content(&cell))
}

/// First table matching `table_selector`; other tables on the page
/// (team totals, game logs) are ignored. Only the last header row names
/// columns, earlier ones are group captions.
fn stat_table(document: &Html, table_selector: &str) -> Result<RawStatTable> {
    let table_sel = css(table_selector)?;
    let header_row_sel = css("thead tr")?;
    let header_cell_sel = css("th")?;
    let row_sel = css("tbody tr")?;
    let cell_sel = css("th, td")?;

    let Some(table) = document.select(&table_sel).next() else {
        return Ok(RawStatTable::default());
    };

    let header = table
        .select(&header_row_sel)
        .last()
        .map(|tr| tr.select(&header_cell_sel).map(cell_text).collect())
        .unwrap_or_default();
    let rows = table
        .select(&row_sel)
        .map(|tr| tr.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    Ok(RawStatTable { header, rows })
}

// ── news ─────────────────────────────────────────────────────────────────────

fn story_cards(document: &Html) -> Result<Vec<RawStory>> {
    let card_sel = css(".s-story-card")?;
    let title_sel = css(".s-story-card__title")?;
    let title_link_sel = css(".s-story-card__title a[href]")?;
    let link_sel = css("a[href]")?;
    let teaser_sel = css(".s-story-card__teaser")?;

    let stories = document
        .select(&card_sel)
        .map(|card| RawStory {
            title: select_text_collapsed(&card, &title_sel)
                .or_else(|| select_text_collapsed(&card, &link_sel)),
            href: select_attr(&card, &title_link_sel, "href")
                .or_else(|| select_attr(&card, &link_sel, "href")),
            summary: select_text_collapsed(&card, &teaser_sel),
        })
        .collect();

    Ok(stories)
}

fn archive_links(document: &Html) -> Result<Vec<RawStory>> {
    let link_sel = css(".sidearm-archives a[href*='/news/']")?;

    let stories = document
        .select(&link_sel)
        .map(|a| RawStory {
            title: Some(cell_text(a)).filter(|t| !t.is_empty()),
            href: a.value().attr("href").map(|h| h.trim().to_string()),
            summary: None,
        })
        .collect();

    Ok(stories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect;

    fn run(kind: EntityKind, body: &str) -> Extraction {
        let document = Html::parse_document(&format!("<html><body>{body}</body></html>"));
        let tag = detect(&document, kind).unwrap();
        extract(&document, kind, tag).unwrap()
    }

    #[test]
    fn classic_roster_reads_structural_fields() {
        let body = r#"
            <ul>
              <li class="sidearm-roster-player">
                <div class="sidearm-roster-player-jersey-number"> 12 </div>
                <div class="sidearm-roster-player-name"><h3><a href="/sports/softball/roster/jane-doe/101">Jane Doe</a></h3></div>
                <div class="sidearm-roster-player-position">INF
                    5' 6''</div>
                <div class="sidearm-roster-player-academic-year">Jr.</div>
                <div class="sidearm-roster-player-hometown">Albuquerque, N.M.</div>
              </li>
            </ul>"#;

        let Extraction::Roster(players) = run(EntityKind::Roster, body) else {
            panic!("expected roster");
        };
        assert_eq!(players.len(), 1);
        let p = &players[0];
        assert_eq!(p.name.as_deref(), Some("Jane Doe"));
        assert_eq!(p.jersey_number.as_deref(), Some("12"));
        assert_eq!(p.position.as_deref(), Some("INF"));
        assert_eq!(p.year.as_deref(), Some("Jr."));
        assert_eq!(p.hometown.as_deref(), Some("Albuquerque, N.M."));
        assert_eq!(p.height, None);
        assert_eq!(p.high_school, None);
        assert_eq!(p.href.as_deref(), Some("/sports/softball/roster/jane-doe/101"));
    }

    #[test]
    fn person_cards_use_label_anchored_text() {
        let body = r#"
            <div class="s-person-card">
              <span>Jersey Number</span><span>23</span>
              <h3><a href="/sports/softball/roster/jane-doe/7">Jane Doe</a></h3>
              <span>Position</span><span>OF</span>
              <span>Academic Year</span><span>So.</span>
              <span>Height</span><span>5' 8''</span>
              <span>Hometown</span><span>Reno, Nev.</span>
              <span>Last School</span><span>Reno HS</span>
              <a href="/sports/softball/roster/jane-doe/7">Full Bio</a>
            </div>"#;

        let Extraction::Roster(players) = run(EntityKind::Roster, body) else {
            panic!("expected roster");
        };
        let p = &players[0];
        assert_eq!(p.name.as_deref(), Some("Jane Doe"));
        assert_eq!(p.jersey_number.as_deref(), Some("23"));
        assert_eq!(p.position.as_deref(), Some("OF"));
        assert_eq!(p.year.as_deref(), Some("So."));
        assert_eq!(p.height.as_deref(), Some("5' 8''"));
        assert_eq!(p.hometown.as_deref(), Some("Reno, Nev."));
        assert_eq!(p.high_school.as_deref(), Some("Reno HS"));
        assert_eq!(p.href.as_deref(), Some("/sports/softball/roster/jane-doe/7"));
    }

    #[test]
    fn schedule_fields_missing_stay_none() {
        let body = r#"
            <ul>
              <li class="sidearm-schedule-game">
                <div class="sidearm-schedule-game-date">Feb 7
                   (Sat)</div>
                <div class="sidearm-schedule-game-opponent-name">at Adams State</div>
                <div class="sidearm-schedule-game-result">W</div>
                <div class="sidearm-schedule-game-result-score">5-3</div>
              </li>
              <li class="sidearm-schedule-game">
                <div class="sidearm-schedule-game-opponent-name">Western Colorado</div>
              </li>
            </ul>"#;

        let Extraction::Schedule(games) = run(EntityKind::Schedule, body) else {
            panic!("expected schedule");
        };
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].date.as_deref(), Some("Feb 7 (Sat)"));
        assert_eq!(games[0].location, None);
        assert_eq!(games[0].score.as_deref(), Some("5-3"));
        assert_eq!(games[1].date, None);
        assert_eq!(games[1].result, None);
    }

    #[test]
    fn stats_table_keeps_header_and_rows() {
        let body = r#"
            <table class="sidearm-table">
              <thead><tr><th>#</th><th>Player</th><th>AVG</th><th>H</th></tr></thead>
              <tbody>
                <tr><td>12</td><th>Doe, Jane</th><td>.412</td><td>21</td></tr>
                <tr><td>4</td><th>Roe, Kim</th><td>.250</td><td>9</td></tr>
              </tbody>
            </table>
            <table class="sidearm-table"><tbody><tr><td>ignored</td></tr></tbody></table>"#;

        let Extraction::Stats(table) = run(EntityKind::Stats, body) else {
            panic!("expected stats");
        };
        assert_eq!(table.header, vec!["#", "Player", "AVG", "H"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["12", "Doe, Jane", ".412", "21"]);
    }

    #[test]
    fn grouped_header_rows_take_column_names_from_the_last_row() {
        let body = r#"
            <table class="sidearm-table">
              <thead>
                <tr><th colspan="2">Player</th><th colspan="2">Hitting</th></tr>
                <tr><th>#</th><th>Player</th><th>AVG</th><th>H</th></tr>
              </thead>
              <tbody><tr><td>12</td><th>Doe, Jane</th><td>.412</td><td>21</td></tr></tbody>
            </table>"#;

        let Extraction::Stats(table) = run(EntityKind::Stats, body) else {
            panic!("expected stats");
        };
        assert_eq!(table.header, vec!["#", "Player", "AVG", "H"]);
        assert_eq!(table.rows[0], vec!["12", "Doe, Jane", ".412", "21"]);
    }

    #[test]
    fn nextgen_game_cards() {
        let body = r#"
            <div class="s-game-card">
              <span class="s-game-card__date">Mar 14 (Sat)</span>
              <span class="s-game-card__opponent-name">Colorado Mesa</span>
              <span class="s-game-card__location">Grand Junction, Colo.</span>
              <span class="s-game-card__result-status">L</span>
              <span class="s-game-card__result-score">2-6</span>
            </div>
            <div class="s-game-card">
              <span class="s-game-card__date">Mar 21</span>
              <span class="s-game-card__opponent-name">Western Colorado</span>
            </div>"#;

        let document = Html::parse_document(&format!("<html><body>{body}</body></html>"));
        assert_eq!(detect(&document, EntityKind::Schedule).unwrap(), Some(FormatTag::Nextgen));

        let Extraction::Schedule(games) = run(EntityKind::Schedule, body) else {
            panic!("expected schedule");
        };
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].date.as_deref(), Some("Mar 14 (Sat)"));
        assert_eq!(games[0].opponent.as_deref(), Some("Colorado Mesa"));
        assert_eq!(games[0].location.as_deref(), Some("Grand Junction, Colo."));
        assert_eq!(games[0].result.as_deref(), Some("L"));
        assert_eq!(games[0].score.as_deref(), Some("2-6"));
        assert_eq!(games[1].result, None);
        assert_eq!(games[1].score, None);
    }

    #[test]
    fn nextgen_stats_table() {
        let body = r#"
            <table class="s-table">
              <thead><tr><th>Player</th><th>GP</th><th>PTS</th></tr></thead>
              <tbody>
                <tr><td>Kim Roe</td><td>18</td><td>244</td></tr>
                <tr><td>Ann Poe</td><td>17</td><td>190</td></tr>
              </tbody>
            </table>"#;

        let document = Html::parse_document(&format!("<html><body>{body}</body></html>"));
        assert_eq!(detect(&document, EntityKind::Stats).unwrap(), Some(FormatTag::Nextgen));

        let Extraction::Stats(table) = run(EntityKind::Stats, body) else {
            panic!("expected stats");
        };
        assert_eq!(table.header, vec!["Player", "GP", "PTS"]);
        assert_eq!(table.rows, vec![vec!["Kim Roe", "18", "244"], vec!["Ann Poe", "17", "190"]]);
    }

    #[test]
    fn archive_links_and_story_cards() {
        let archive = r#"
            <div class="sidearm-archives">
              <ul><li><a href="/news/2025/5/28/kali-pugh-named-coach.aspx"> Kali Pugh Named Coach </a></li></ul>
            </div>"#;
        let Extraction::News(stories) = run(EntityKind::News, archive) else {
            panic!("expected news");
        };
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title.as_deref(), Some("Kali Pugh Named Coach"));
        assert_eq!(stories[0].summary, None);

        let cards = r#"
            <div class="s-story-card">
              <h3 class="s-story-card__title"><a href="/news/2026/1/22/poll.aspx">Preseason Poll</a></h3>
              <p class="s-story-card__teaser">Picked third.</p>
            </div>"#;
        let Extraction::News(stories) = run(EntityKind::News, cards) else {
            panic!("expected news");
        };
        assert_eq!(stories[0].title.as_deref(), Some("Preseason Poll"));
        assert_eq!(stories[0].href.as_deref(), Some("/news/2026/1/22/poll.aspx"));
        assert_eq!(stories[0].summary.as_deref(), Some("Picked third."));
    }

    #[test]
    fn unknown_template_extracts_nothing() {
        let extraction = run(EntityKind::Roster, "<p>Coming soon</p>");
        assert_eq!(extraction, Extraction::Unrecognized);
        assert!(extraction.is_empty());
    }
}
