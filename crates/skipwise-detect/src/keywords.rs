use serde::{Deserialize, Serialize};

/// Embedded marker keyword database.
const EMBEDDED_DB: &str = include_str!("../data/markers.toml");

/// What a chapter or segment label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Intro,
    Recap,
    Credits,
    NextEpisode,
}

/// Keywords that identify one marker kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindDef {
    pub name: MarkerKind,
    pub keywords: Vec<String>,
}

/// Wrapper for TOML deserialization.
#[derive(Debug, Deserialize)]
struct KeywordDbFile {
    #[serde(rename = "kind")]
    kinds: Vec<KindDef>,
}

/// Ordered keyword sets for classifying marker labels.
#[derive(Debug, Clone)]
pub struct KeywordDatabase {
    kinds: Vec<KindDef>,
}

impl Default for KeywordDatabase {
    fn default() -> Self {
        Self::embedded()
    }
}

impl KeywordDatabase {
    /// Load the embedded keyword database.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_DB).expect("embedded markers.toml should be valid")
    }

    /// Load a keyword database from a TOML string. Keywords are stored lowercase.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let db: KeywordDbFile = toml::from_str(toml_str)?;
        Ok(Self::from_kinds(db.kinds))
    }

    pub fn from_kinds(kinds: Vec<KindDef>) -> Self {
        let kinds = kinds
            .into_iter()
            .map(|k| KindDef {
                name: k.name,
                keywords: k.keywords.iter().map(|w| w.to_lowercase()).collect(),
            })
            .collect();
        Self { kinds }
    }

    /// Merge a user database into this one.
    /// Kinds already present get their keyword lists replaced; new kinds are appended.
    pub fn merge_user(&mut self, user_db: &KeywordDatabase) {
        for user_kind in &user_db.kinds {
            if let Some(pos) = self.kinds.iter().position(|k| k.name == user_kind.name) {
                self.kinds[pos] = user_kind.clone();
            } else {
                self.kinds.push(user_kind.clone());
            }
        }
    }

    /// Classify a label by the first kind with a keyword contained in it.
    pub fn classify(&self, label: &str) -> Option<MarkerKind> {
        let label = label.to_lowercase();
        self.kinds
            .iter()
            .find(|k| k.keywords.iter().any(|w| label.contains(w.as_str())))
            .map(|k| k.name)
    }

    /// Number of kinds defined.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
