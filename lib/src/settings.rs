// Copyright 2024 The Codediff Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Options for folding and expanding diffs, read from the `diff.*` config
//! table.

#![allow(missing_docs)]

/// Options controlling how a diff is folded and expanded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DiffSettings {
    /// Number of unchanged lines shown around each change.
    pub context_size: usize,
    /// Runs of hidden lines shorter than this are shown instead.
    pub min_jump_size: usize,
    /// Number of lines revealed by one "show more" step.
    pub expand_lines: usize,
}

impl Default for DiffSettings {
    fn default() -> Self {
        DiffSettings {
            context_size: 3,
            min_jump_size: 10,
            expand_lines: 10,
        }
    }
}

impl DiffSettings {
    /// Reads the `diff.*` keys of `config`. Missing keys take their default
    /// values.
    pub fn from_config(config: &config::Config) -> Result<Self, config::ConfigError> {
        let defaults = DiffSettings::default();
        Ok(DiffSettings {
            context_size: config
                .get::<usize>("diff.context-size")
                .optional()?
                .unwrap_or(defaults.context_size),
            min_jump_size: config
                .get::<usize>("diff.min-jump-size")
                .optional()?
                .unwrap_or(defaults.min_jump_size),
            expand_lines: config
                .get::<usize>("diff.expand-lines")
                .optional()?
                .unwrap_or(defaults.expand_lines),
        })
    }
}

/// Turns `config::ConfigError::NotFound` into `None`.
pub trait ConfigResultExt<T> {
    fn optional(self) -> Result<Option<T>, config::ConfigError>;
}

impl<T> ConfigResultExt<T> for Result<T, config::ConfigError> {
    fn optional(self) -> Result<Option<T>, config::ConfigError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from_toml(text: &str) -> config::Config {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = DiffSettings::from_config(&config_from_toml("")).unwrap();
        assert_eq!(settings, DiffSettings::default());
        assert_eq!(settings.context_size, 3);
        assert_eq!(settings.min_jump_size, 10);
        assert_eq!(settings.expand_lines, 10);
    }

    #[test]
    fn test_overrides() {
        let config = config_from_toml(
            r#"
            [diff]
            context-size = 5
            expand-lines = 20
            "#,
        );
        let settings = DiffSettings::from_config(&config).unwrap();
        assert_eq!(
            settings,
            DiffSettings {
                context_size: 5,
                min_jump_size: 10,
                expand_lines: 20,
            }
        );
    }

    #[test]
    fn test_invalid_value() {
        let config = config_from_toml(
            r#"
            diff.min-jump-size = "many"
            "#,
        );
        assert!(DiffSettings::from_config(&config).is_err());
    }
}
