use regex::Regex;
use std::sync::LazyLock;

use crate::elements::EpisodePattern;

/// A season/episode pair located inside a filename.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeMatch {
    pub season: u32,
    pub episode: u32,
    /// Byte offset where the match starts; everything before it is the show name.
    pub start: usize,
    pub pattern: EpisodePattern,
}

// ── Regex patterns ──────────────────────────────────────────────

/// "S01E01", "s1e1".
static RE_SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)S(\d{1,2})E(\d{1,3})").unwrap());

/// "1x01".
static RE_CROSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2})x(\d{1,3})").unwrap());

/// "Season 1 Episode 1".
static RE_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Season\s*(\d{1,2})\s*Episode\s*(\d{1,3})").unwrap());

/// Try every pattern in order; the first that matches wins.
pub fn try_extract(text: &str) -> Option<EpisodeMatch> {
    [
        (&*RE_SEASON_EPISODE, EpisodePattern::SeasonEpisode),
        (&*RE_CROSS, EpisodePattern::Cross),
        (&*RE_WORDS, EpisodePattern::Words),
    ]
    .into_iter()
    .find_map(|(re, pattern)| capture(re, text, pattern))
}

fn capture(re: &Regex, text: &str, pattern: EpisodePattern) -> Option<EpisodeMatch> {
    let caps = re.captures(text)?;
    let whole = caps.get(0)?;
    Some(EpisodeMatch {
        season: caps[1].parse().ok()?,
        episode: caps[2].parse().ok()?,
        start: whole.start(),
        pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_episode() {
        let m = try_extract("Show.S02E07.1080p.mkv").unwrap();
        assert_eq!((m.season, m.episode), (2, 7));
        assert_eq!(m.start, 5);
        assert_eq!(m.pattern, EpisodePattern::SeasonEpisode);
    }

    #[test]
    fn test_cross() {
        let m = try_extract("Show - 3x04 - Title.mp4").unwrap();
        assert_eq!((m.season, m.episode), (3, 4));
        assert_eq!(m.pattern, EpisodePattern::Cross);
    }

    #[test]
    fn test_words() {
        let m = try_extract("Show Season 1 Episode 12.avi").unwrap();
        assert_eq!((m.season, m.episode), (1, 12));
        assert_eq!(m.pattern, EpisodePattern::Words);
    }

    #[test]
    fn test_no_match() {
        assert!(try_extract("Some.Movie.2019.mkv").is_none());
    }
}
