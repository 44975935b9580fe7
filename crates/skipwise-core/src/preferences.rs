use std::sync::RwLock;

pub const INTRO_START: &str = "intro_start";
pub const INTRO_END: &str = "intro_end";
pub const RECAP_START: &str = "recap_start";
pub const RECAP_END: &str = "recap_end";
/// Seconds before the end of the asset at which credits begin.
pub const CREDITS_OFFSET: &str = "credits_offset";
pub const NEXT_EPISODE_START: &str = "next_episode_start";
pub const AUTO_SKIP_INTRO: &str = "auto_skip_intro";
pub const AUTO_SKIP_RECAP: &str = "auto_skip_recap";
pub const AUTO_SKIP_CREDITS: &str = "auto_skip_credits";

/// Read access to user-configured skip settings.
pub trait PreferenceStore: Send + Sync {
    /// Integer value, or `None` if unset or unparsable.
    fn int(&self, key: &str) -> Option<i64>;

    /// Boolean value, or `None` if unset or unparsable.
    fn flag(&self, key: &str) -> Option<bool>;
}

impl PreferenceStore for toml::Table {
    fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            toml::Value::Integer(i) => Some(*i),
            toml::Value::Float(f) if f.is_finite() => Some(*f as i64),
            toml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            toml::Value::Boolean(b) => Some(*b),
            toml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl PreferenceStore for RwLock<toml::Table> {
    fn int(&self, key: &str) -> Option<i64> {
        self.read().unwrap_or_else(|e| e.into_inner()).int(key)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.read().unwrap_or_else(|e| e.into_inner()).flag(key)
    }
}

/// Which segment kinds the player should jump over without asking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoSkip {
    pub intro: bool,
    pub recap: bool,
    pub credits: bool,
}

impl AutoSkip {
    pub fn read(store: &dyn PreferenceStore) -> Self {
        Self {
            intro: store.flag(AUTO_SKIP_INTRO).unwrap_or(false),
            recap: store.flag(AUTO_SKIP_RECAP).unwrap_or(false),
            credits: store.flag(AUTO_SKIP_CREDITS).unwrap_or(false),
        }
    }
}

/// Typed view of the manual skip settings. Absent and unparsable keys read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualPreferences {
    pub intro_start: i64,
    pub intro_end: i64,
    pub recap_start: i64,
    pub recap_end: i64,
    pub credits_offset: i64,
    pub next_episode_start: i64,
    pub auto_skip: AutoSkip,
}

impl ManualPreferences {
    pub fn read(store: &dyn PreferenceStore) -> Self {
        let int = |key: &str| store.int(key).unwrap_or(0);
        Self {
            intro_start: int(INTRO_START),
            intro_end: int(INTRO_END),
            recap_start: int(RECAP_START),
            recap_end: int(RECAP_END),
            credits_offset: int(CREDITS_OFFSET),
            next_episode_start: int(NEXT_EPISODE_START),
            auto_skip: AutoSkip::read(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_table_values() {
        let t = table(
            r#"
            intro_end = 90
            recap_end = "45"
            credits_offset = "soon"
            next_episode_start = 1290.7
            auto_skip_intro = true
            auto_skip_recap = "false"
            auto_skip_credits = 1
            "#,
        );
        assert_eq!(t.int(INTRO_END), Some(90));
        assert_eq!(t.int(RECAP_END), Some(45));
        assert_eq!(t.int(CREDITS_OFFSET), None);
        assert_eq!(t.int(NEXT_EPISODE_START), Some(1290));
        assert_eq!(t.int(INTRO_START), None);
        assert_eq!(t.flag(AUTO_SKIP_INTRO), Some(true));
        assert_eq!(t.flag(AUTO_SKIP_RECAP), Some(false));
        assert_eq!(t.flag(AUTO_SKIP_CREDITS), None);
    }

    #[test]
    fn test_manual_preferences_read() {
        let t = table(
            "intro_start = 0\nintro_end = 90\ncredits_offset = 180\nauto_skip_credits = true",
        );
        let prefs = ManualPreferences::read(&t);
        assert_eq!(prefs.intro_end, 90);
        assert_eq!(prefs.credits_offset, 180);
        assert_eq!(prefs.recap_end, 0);
        assert!(prefs.auto_skip.credits);
        assert!(!prefs.auto_skip.intro);
    }

    #[test]
    fn test_rwlock_sees_updates() {
        let store = RwLock::new(toml::Table::new());
        assert_eq!(store.int(INTRO_END), None);
        store
            .write()
            .unwrap()
            .insert(INTRO_END.into(), toml::Value::Integer(75));
        assert_eq!(store.int(INTRO_END), Some(75));
    }
}
