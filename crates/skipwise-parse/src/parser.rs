mod episode;

use std::sync::LazyLock;

use regex::Regex;

use crate::elements::ParsedMedia;

/// Trailing file extension, e.g. ".mkv".
static RE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]{2,4}$").unwrap());

/// Parse a filename, path or URL into show / season / episode.
///
/// Only the last path segment is considered. For episodic names the show is
/// everything before the season/episode marker; otherwise the whole cleaned
/// filename becomes the title.
pub fn parse(input: &str) -> ParsedMedia {
    let name = last_segment(input);
    if name.is_empty() {
        return ParsedMedia::default();
    }

    match episode::try_extract(name) {
        Some(m) => {
            let show = clean(&name[..m.start]);
            tracing::debug!(
                input = %name,
                season = m.season,
                episode = m.episode,
                pattern = ?m.pattern,
                "Parsed episode marker"
            );
            ParsedMedia {
                title: (!show.is_empty()).then_some(show),
                season: Some(m.season),
                episode: Some(m.episode),
                pattern: Some(m.pattern),
            }
        }
        None => {
            let title = clean(&RE_EXTENSION.replace(name, ""));
            ParsedMedia {
                title: (!title.is_empty()).then_some(title),
                ..Default::default()
            }
        }
    }
}

/// Strip query/fragment and return the final path segment.
fn last_segment(input: &str) -> &str {
    let without_query = input
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches(['/', '\\']);
    without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query)
        .trim()
}

/// Turn separators into spaces and collapse runs of whitespace.
fn clean(text: &str) -> String {
    text.replace(['.', '_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
