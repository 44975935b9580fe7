use serde::{Deserialize, Serialize};
use skipwise_api::EpisodeQuery;
use skipwise_parse::ParsedMedia;

/// External catalog identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub imdb: Option<String>,
    pub tmdb: Option<String>,
    pub trakt: Option<String>,
    pub tvdb: Option<String>,
}

/// Immutable description of the asset being played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIdentity {
    title: Option<String>,
    show: Option<String>,
    season: Option<u32>,
    episode: Option<u32>,
    runtime_secs: i64,
    ids: ExternalIds,
}

impl ContentIdentity {
    pub fn builder() -> ContentIdentityBuilder {
        ContentIdentityBuilder::default()
    }

    /// Build an identity from a filename or URL. Episodic names fill show,
    /// season and episode; anything else becomes the title.
    pub fn from_filename(name: &str, runtime_secs: i64) -> Self {
        let parsed = skipwise_parse::parse(name);
        Self::from_parsed(&parsed, runtime_secs)
    }

    pub fn from_parsed(parsed: &ParsedMedia, runtime_secs: i64) -> Self {
        let mut builder = Self::builder().runtime_secs(runtime_secs);
        if parsed.is_episode() {
            if let Some(show) = &parsed.title {
                builder = builder.show(show.clone()).title(show.clone());
            }
            if let (Some(s), Some(e)) = (parsed.season, parsed.episode) {
                builder = builder.episode(s, e);
            }
        } else if let Some(title) = &parsed.title {
            builder = builder.title(title.clone());
        }
        builder.build()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn show(&self) -> Option<&str> {
        self.show.as_deref()
    }

    pub fn season(&self) -> Option<u32> {
        self.season
    }

    pub fn episode(&self) -> Option<u32> {
        self.episode
    }

    pub fn runtime_secs(&self) -> i64 {
        self.runtime_secs
    }

    pub fn ids(&self) -> &ExternalIds {
        &self.ids
    }

    /// Both season and episode are known.
    pub fn is_series(&self) -> bool {
        self.season.is_some() && self.episode.is_some()
    }

    /// Deterministic key for the result cache.
    pub fn cache_key(&self) -> String {
        match (&self.show, self.season, self.episode) {
            (Some(show), Some(season), Some(episode)) => format!("{show}_S{season}E{episode}"),
            _ => self
                .title
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// Provider lookup parameters.
    pub fn episode_query(&self) -> EpisodeQuery {
        EpisodeQuery {
            imdb_id: self.ids.imdb.clone(),
            tmdb_id: self.ids.tmdb.clone(),
            trakt_id: self.ids.trakt.clone(),
            season: self.season,
            episode: self.episode,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentIdentityBuilder {
    inner: ContentIdentity,
}

impl ContentIdentityBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.inner.title = non_empty(title.into());
        self
    }

    pub fn show(mut self, show: impl Into<String>) -> Self {
        self.inner.show = non_empty(show.into());
        self
    }

    pub fn season(mut self, season: u32) -> Self {
        self.inner.season = Some(season);
        self
    }

    pub fn episode(mut self, season: u32, episode: u32) -> Self {
        self.inner.season = Some(season);
        self.inner.episode = Some(episode);
        self
    }

    pub fn runtime_secs(mut self, runtime_secs: i64) -> Self {
        self.inner.runtime_secs = runtime_secs;
        self
    }

    pub fn imdb(mut self, id: impl Into<String>) -> Self {
        self.inner.ids.imdb = non_empty(id.into());
        self
    }

    pub fn tmdb(mut self, id: impl Into<String>) -> Self {
        self.inner.ids.tmdb = non_empty(id.into());
        self
    }

    pub fn trakt(mut self, id: impl Into<String>) -> Self {
        self.inner.ids.trakt = non_empty(id.into());
        self
    }

    pub fn tvdb(mut self, id: impl Into<String>) -> Self {
        self.inner.ids.tvdb = non_empty(id.into());
        self
    }

    pub fn build(self) -> ContentIdentity {
        self.inner
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
