use std::path::PathBuf;
use std::str::FromStr;

use frameproof_core::config::{
    ReviewConfig, DEFAULT_MAX_NOTE_LENGTH, DEFAULT_MIN_SHAPE_SIZE_PX,
    DEFAULT_VISIBILITY_TOLERANCE_SECS,
};

use crate::error::ReplayError;

/// Replay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Session tunables handed to the controller and coordinator.
    pub review: ReviewConfig,
    /// Postgres connection string. `None` replays against an in-memory store.
    pub database_url: Option<String>,
    /// Path to the JSON replay script.
    pub script_path: PathBuf,
}

impl ReplayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default     |
    /// |--------------------------|-------------|
    /// | `REVIEW_TOLERANCE_SECS`  | `0.5`       |
    /// | `REVIEW_MIN_SHAPE_PX`    | `10`        |
    /// | `REVIEW_MAX_NOTE_LENGTH` | `2000`      |
    /// | `DATABASE_URL`           | (in-memory) |
    /// | `REPLAY_SCRIPT`          | required    |
    pub fn from_env() -> Result<Self, ReplayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReplayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let visibility_tolerance_secs: f64 = parse_or(
            &lookup,
            "REVIEW_TOLERANCE_SECS",
            DEFAULT_VISIBILITY_TOLERANCE_SECS,
        )?;
        if !visibility_tolerance_secs.is_finite() || visibility_tolerance_secs < 0.0 {
            return Err(ReplayError::Config(
                "REVIEW_TOLERANCE_SECS must be a non-negative number".into(),
            ));
        }

        let min_shape_size_px: f64 =
            parse_or(&lookup, "REVIEW_MIN_SHAPE_PX", DEFAULT_MIN_SHAPE_SIZE_PX)?;
        if !min_shape_size_px.is_finite() || min_shape_size_px < 0.0 {
            return Err(ReplayError::Config(
                "REVIEW_MIN_SHAPE_PX must be a non-negative number".into(),
            ));
        }

        let max_note_length: usize =
            parse_or(&lookup, "REVIEW_MAX_NOTE_LENGTH", DEFAULT_MAX_NOTE_LENGTH)?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let script_path = lookup("REPLAY_SCRIPT")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ReplayError::Config("REPLAY_SCRIPT environment variable is required".into())
            })?;

        Ok(Self {
            review: ReviewConfig {
                visibility_tolerance_secs,
                min_shape_size_px,
                max_note_length,
                ..ReviewConfig::default()
            },
            database_url,
            script_path,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ReplayError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ReplayError::Config(format!("{key} must be a valid number, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ReplayConfig, ReplayError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReplayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[("REPLAY_SCRIPT", "session.json")]).unwrap();
        assert_eq!(config.review, ReviewConfig::default());
        assert!(config.database_url.is_none());
        assert_eq!(config.script_path, PathBuf::from("session.json"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("REPLAY_SCRIPT", "s.json"),
            ("REVIEW_TOLERANCE_SECS", "1.25"),
            ("REVIEW_MIN_SHAPE_PX", "4"),
            ("REVIEW_MAX_NOTE_LENGTH", "80"),
            ("DATABASE_URL", "postgres://localhost/frameproof"),
        ])
        .unwrap();
        assert_eq!(config.review.visibility_tolerance_secs, 1.25);
        assert_eq!(config.review.min_shape_size_px, 4.0);
        assert_eq!(config.review.max_note_length, 80);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/frameproof")
        );
    }

    #[test]
    fn script_is_required() {
        assert_matches!(load(&[]), Err(ReplayError::Config(_)));
        assert_matches!(load(&[("REPLAY_SCRIPT", "  ")]), Err(ReplayError::Config(_)));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert_matches!(
            load(&[("REPLAY_SCRIPT", "s.json"), ("REVIEW_MAX_NOTE_LENGTH", "lots")]),
            Err(ReplayError::Config(_))
        );
        assert_matches!(
            load(&[("REPLAY_SCRIPT", "s.json"), ("REVIEW_TOLERANCE_SECS", "-1")]),
            Err(ReplayError::Config(_))
        );
    }
}
