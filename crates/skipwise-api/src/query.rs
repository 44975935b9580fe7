/// External ids and episode coordinates for a provider lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeQuery {
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub trakt_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl EpisodeQuery {
    /// Season and episode, if both are known.
    pub fn coordinates(&self) -> Option<(u32, u32)> {
        Some((self.season?, self.episode?))
    }
}

/// Treat empty strings as absent ids.
pub(crate) fn id(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
