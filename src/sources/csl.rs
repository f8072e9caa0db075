//! CSL-JSON record schema shared by the doi.org and CrossRef backends.
//!
//! CrossRef's `message` object and doi.org's CSL output use the same field
//! names, with a few shape differences (`title` is a list in one and a
//! string in the other, `event` a string or an object). The types below
//! accept both and reject anything else.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::ResolutionError;
use crate::models::PaperMetadata;

/// Record types whose publisher doubles as the venue (preprint servers)
const PREPRINT_TYPES: [&str; 2] = ["article", "posted-content"];

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    /// First non-blank value
    fn first(&self) -> Option<&str> {
        let value = match self {
            TextOrList::Text(s) => Some(s.as_str()),
            TextOrList::List(items) => items.iter().map(|s| s.as_str()).find(|s| !s.trim().is_empty()),
        };
        value.filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum EventField {
    Name(String),
    Object { name: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum DatePart {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CslDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<DatePart>>>,
}

impl CslDate {
    fn year(&self) -> Option<i32> {
        match self.date_parts.first()?.first()?.as_ref()? {
            DatePart::Number(n) => i32::try_from(*n).ok(),
            DatePart::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CslName {
    given: Option<String>,
    family: Option<String>,
    literal: Option<String>,
    name: Option<String>,
}

impl CslName {
    fn display(&self) -> Option<String> {
        if let Some(family) = self.family.as_deref().filter(|f| !f.trim().is_empty()) {
            let given = self.given.as_deref().unwrap_or("");
            return Some(format!("{} {}", given.trim(), family.trim()).trim().to_string());
        }
        self.literal
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// One work record
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CslItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    title: Option<TextOrList>,

    #[serde(default)]
    author: Option<Vec<CslName>>,

    #[serde(default)]
    issued: Option<CslDate>,

    #[serde(rename = "published-print", default)]
    published_print: Option<CslDate>,

    #[serde(rename = "published-online", default)]
    published_online: Option<CslDate>,

    #[serde(rename = "container-title", default)]
    container_title: Option<TextOrList>,

    #[serde(rename = "event-title", default)]
    event_title: Option<String>,

    #[serde(default)]
    event: Option<EventField>,

    #[serde(default)]
    publisher: Option<String>,
}

fn markup() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"))
}

/// Remove inline markup (`<i>`, `<sub>`, JATS tags) and collapse whitespace
fn clean_text(s: &str) -> String {
    let stripped = markup().replace_all(s, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CslItem {
    /// Map the record into [`PaperMetadata`], failing on missing required fields.
    pub(crate) fn into_metadata(self) -> Result<PaperMetadata, ResolutionError> {
        let title = self
            .title
            .as_ref()
            .and_then(TextOrList::first)
            .map(clean_text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ResolutionError::MalformedResponse("record has no title".into()))?;

        let authors: Vec<String> = self
            .author
            .iter()
            .flatten()
            .filter_map(CslName::display)
            .collect();
        if authors.is_empty() {
            return Err(ResolutionError::MalformedResponse(
                "record has no authors (proceedings volume?)".into(),
            ));
        }

        let year = [&self.issued, &self.published_print, &self.published_online]
            .into_iter()
            .flatten()
            .find_map(CslDate::year);

        let is_preprint = self
            .kind
            .as_deref()
            .is_some_and(|k| PREPRINT_TYPES.contains(&k));

        let venue = self
            .container_title
            .as_ref()
            .and_then(TextOrList::first)
            .map(String::from)
            .or_else(|| self.event_title.clone())
            .or_else(|| match &self.event {
                Some(EventField::Name(name)) => Some(name.clone()),
                Some(EventField::Object { name }) => name.clone(),
                None => None,
            })
            .or_else(|| {
                if is_preprint {
                    self.publisher.clone()
                } else {
                    None
                }
            })
            .map(|v| clean_text(&v))
            .filter(|v| !v.is_empty());

        Ok(PaperMetadata {
            title,
            authors,
            year,
            venue_full_name: venue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<PaperMetadata, ResolutionError> {
        serde_json::from_str::<CslItem>(json)?.into_metadata()
    }

    #[test]
    fn test_csl_record() {
        let meta = parse(
            r#"{
                "type": "paper-conference",
                "title": "Visualising Developer Interactions in Code Reviews",
                "author": [{"given": "Ada", "family": "Lovelace"}, {"literal": "The Team"}],
                "issued": {"date-parts": [[2025, 4, 27]]},
                "container-title": "45th International Conference on Software Engineering"
            }"#,
        )
        .unwrap();

        assert_eq!(meta.title, "Visualising Developer Interactions in Code Reviews");
        assert_eq!(meta.authors, vec!["Ada Lovelace", "The Team"]);
        assert_eq!(meta.year, Some(2025));
        assert_eq!(
            meta.venue_full_name.as_deref(),
            Some("45th International Conference on Software Engineering")
        );
    }

    #[test]
    fn test_crossref_shaped_record() {
        let meta = parse(
            r#"{
                "title": ["Human-level control through <i>deep</i> reinforcement learning"],
                "author": [{"given": "Volodymyr", "family": "Mnih"}],
                "published-print": {"date-parts": [[2015, 2, 26]]},
                "container-title": [],
                "event": {"name": "Some Workshop"}
            }"#,
        )
        .unwrap();

        assert_eq!(
            meta.title,
            "Human-level control through deep reinforcement learning"
        );
        assert_eq!(meta.year, Some(2015));
        assert_eq!(meta.venue_full_name.as_deref(), Some("Some Workshop"));
    }

    #[test]
    fn test_preprint_uses_publisher() {
        let meta = parse(
            r#"{
                "type": "article",
                "title": "LoRA: Low-Rank Adaptation of Large Language Models",
                "author": [{"given": "Edward", "family": "Hu"}],
                "issued": {"date-parts": [["2021"]]},
                "publisher": "arXiv"
            }"#,
        )
        .unwrap();
        assert_eq!(meta.year, Some(2021));
        assert_eq!(meta.venue_full_name.as_deref(), Some("arXiv"));
    }

    #[test]
    fn test_missing_title_is_malformed() {
        let err = parse(r#"{"author": [{"family": "X"}]}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedResponse(_)));
    }

    #[test]
    fn test_no_authors_is_malformed() {
        let err = parse(r#"{"title": "Proceedings of Something", "author": []}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedResponse(_)));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let err = parse(r#"{"title": 42, "author": [{"family": "X"}]}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_year_and_venue_allowed() {
        let meta = parse(r#"{"title": "T", "author": [{"family": "X"}], "issued": {"date-parts": [[null]]}}"#)
            .unwrap();
        assert_eq!(meta.year, None);
        assert_eq!(meta.venue_full_name, None);
    }
}
