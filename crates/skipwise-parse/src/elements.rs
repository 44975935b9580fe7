use serde::{Deserialize, Serialize};

/// Elements extracted from a video filename or URL path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMedia {
    /// Show name for episodic content, or the cleaned filename otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Season number, when an episode pattern matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number, when an episode pattern matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Which pattern produced the season/episode pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<EpisodePattern>,
}

impl ParsedMedia {
    /// Both season and episode were found.
    pub fn is_episode(&self) -> bool {
        self.season.is_some() && self.episode.is_some()
    }
}

/// The naming convention an episode number was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodePattern {
    /// `S01E02`
    SeasonEpisode,
    /// `1x02`
    Cross,
    /// `Season 1 Episode 2`
    Words,
}
