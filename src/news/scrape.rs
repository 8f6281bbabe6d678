// Front page extraction.
// Walks the story rows of the Hacker News listing and builds story records.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::error::{Result, SmallTalkError};

use super::types::{Story, UNKNOWN_AUTHOR};

/// Origin used to resolve relative story links.
pub const SITE_ORIGIN: &str = "https://news.ycombinator.com/";

struct Selectors {
    story_row: Selector,
    title_link: Selector,
    author: Selector,
    score: Selector,
    link: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| SmallTalkError::Parse(format!("selector {css}: {e}")))
        };

        Ok(Self {
            story_row: parse(".athing")?,
            title_link: parse(".titleline a")?,
            author: parse(".hnuser")?,
            score: parse(".score")?,
            link: parse("a")?,
        })
    }
}

/// Extract up to `limit` stories from the front page HTML.
///
/// Only the first `limit` story rows are looked at. A malformed row is logged
/// and skipped, so the result may hold fewer than `limit` stories.
pub fn parse_front_page(html: &str, limit: usize) -> Result<Vec<Story>> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);

    let stories = document
        .select(&selectors.story_row)
        .take(limit)
        .enumerate()
        .filter_map(|(index, row)| match parse_story(row, &selectors) {
            Ok(story) => Some(story),
            Err(e) => {
                warn!(row = index, "Error processing story: {e}");
                None
            }
        })
        .collect();

    Ok(stories)
}

fn parse_story(row: ElementRef<'_>, selectors: &Selectors) -> Result<Story> {
    let title_link = row
        .select(&selectors.title_link)
        .next()
        .ok_or_else(|| SmallTalkError::Parse("story row has no title link".into()))?;

    let title = text_of(title_link);
    let href = title_link
        .value()
        .attr("href")
        .ok_or_else(|| SmallTalkError::Parse(format!("story {title:?} has no href")))?;
    let link = absolute_link(href)?;

    // Metadata lives in the row right after the story row.
    let subtext = row.next_siblings().find_map(ElementRef::wrap);

    let (author, points, comments) = match subtext {
        Some(subtext) => (
            subtext
                .select(&selectors.author)
                .next()
                .map(text_of)
                .filter(|author| !author.is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            subtext
                .select(&selectors.score)
                .next()
                .map(|score| parse_count(&text_of(score), "point"))
                .unwrap_or(0),
            subtext
                .select(&selectors.link)
                .last()
                .map(|link| parse_count(&text_of(link), "comment"))
                .unwrap_or(0),
        ),
        None => (UNKNOWN_AUTHOR.to_string(), 0, 0),
    };

    Ok(Story {
        title,
        link,
        author,
        points,
        comments,
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolve a story href against the site origin. Absolute links pass through untouched.
pub fn absolute_link(href: &str) -> Result<String> {
    if Url::parse(href).is_ok() {
        return Ok(href.to_string());
    }

    let origin = Url::parse(SITE_ORIGIN).map_err(|e| SmallTalkError::Parse(e.to_string()))?;
    origin
        .join(href)
        .map(String::from)
        .map_err(|e| SmallTalkError::Parse(format!("bad link {href:?}: {e}")))
}

/// Parse counts like "123 points" or "45\u{a0}comments".
///
/// Anything that is not a number followed by `unit` ("discuss", "2 hours ago") counts as 0.
fn parse_count(text: &str, unit: &str) -> u32 {
    let mut words = text.split_whitespace();
    match (words.next(), words.next()) {
        (Some(number), Some(word)) if word.starts_with(unit) => number.parse().unwrap_or(0),
        _ => 0,
    }
}
