use serde::{Deserialize, Serialize};

use crate::Error;

/// Engine-wide limits, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-root cap on comments and on activities when a feed of several
    /// roots is assembled.
    pub max_comments: usize,
    /// Per-root cap when a single thread is displayed.
    pub max_display_comments: usize,
    /// Actors listed inline in a reaction phrase before "and N other people".
    pub max_likers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_comments: 100,
            max_display_comments: 1000,
            max_likers: 75,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_likers < 2 {
            return Err(Error::InvalidConfig {
                field: "max_likers",
                reason: format!("must be at least 2, got {}", self.max_likers),
            });
        }
        Ok(())
    }

    /// Zero means no cap.
    pub fn cap_for(&self, root_count: usize) -> usize {
        if root_count > 1 {
            self.max_comments
        } else {
            self.max_display_comments
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerPrefs {
    pub smart_flatten: bool,
    pub hide_dislike: bool,
    pub display_resharer: bool,
}

impl Default for ViewerPrefs {
    fn default() -> Self {
        Self {
            smart_flatten: true,
            hide_dislike: false,
            display_resharer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "max_likers": 10 }"#).unwrap();
        assert_eq!(config.max_likers, 10);
        assert_eq!(config.max_comments, 100);
        assert_eq!(config.max_display_comments, 1000);
    }

    #[test]
    fn test_cap_depends_on_root_count() {
        let config = EngineConfig::default();
        assert_eq!(config.cap_for(1), 1000);
        assert_eq!(config.cap_for(0), 1000);
        assert_eq!(config.cap_for(2), 100);
    }

    #[test]
    fn test_validate_max_likers() {
        let config = EngineConfig {
            max_likers: 1,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig {
                field: "max_likers",
                ..
            })
        ));
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_prefs_default_to_flattening() {
        let prefs: ViewerPrefs = serde_json::from_str("{}").unwrap();
        assert!(prefs.smart_flatten);
        assert!(!prefs.hide_dislike);
    }
}
