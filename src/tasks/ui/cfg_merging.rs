/* ********************************************************************** **
**  This file is part of hgauss.                                          **
**                                                                        **
**  hgauss is free software: you can redistribute it and/or modify it     **
**  under the terms of the GNU General Public License as published by the **
**  Free Software Foundation, either version 3 of the License, or (at     **
**  your option) any later version.                                       **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of hgauss is licensed under the GPL,     **
** many parts of it are licensed under more permissive terms.             **
** ********************************************************************** */

//! Combining the `--config` arguments into one set of settings.

use crate::FailResult;

use ::failure::ResultExt;
use ::hgauss_tasks_config::{YamlRead, Settings, ValidatedSettings};
use ::serde_yaml::{Value, Mapping};
use ::std::path::{Path, PathBuf};

/// The config yamls given on the command line, in order.
///
/// Later sources take precedence over earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources(Vec<Config>);

#[derive(Debug, Clone)]
struct Config {
    source: ConfigSource,
    yaml: Value,
}

#[derive(Debug, Clone, PartialEq)]
enum ConfigSource {
    File(PathBuf),
    Argument,
}

impl Config {
    /// Either reads a file, or parses a literal of the form `[NESTED.KEY]:YAML`.
    ///
    /// A colon anywhere in the argument makes it a literal; there is no way to escape one
    /// in a path.
    fn resolve_from_arg(arg: &str) -> FailResult<Config> {
        match arg.find(':') {
            Some(colon) => Config::from_literal(&arg[..colon], &arg[colon + 1..]),
            None => Config::from_file(arg.as_ref()),
        }
    }

    fn from_literal(keys: &str, yaml: &str) -> FailResult<Config>
    {Ok({
        let value: Value = YamlRead::from_reader(yaml.as_bytes())
            .with_context(|_| format!("in config literal {:?}", yaml))?;

        let keys = match keys {
            "" => vec![],
            keys => keys.split('.').collect(),
        };
        let yaml = keys.into_iter().rev().fold(value, |inner, key| {
            let mut mapping = Mapping::new();
            mapping.insert(Value::String(key.into()), inner);
            Value::Mapping(mapping)
        });
        Config { source: ConfigSource::Argument, yaml }
    })}

    fn from_file(path: &Path) -> FailResult<Config>
    {Ok({
        let path = path.canonicalize()
            .with_context(|_| format!("could not resolve config path {}", path.display()))?;
        let file = ::std::fs::File::open(&path)
            .with_context(|_| format!("could not open {}", path.display()))?;
        let yaml: Value = YamlRead::from_reader(file)
            .with_context(|_| format!("while reading {}", path.display()))?;

        Config { source: ConfigSource::File(path), yaml }
    })}
}

impl ConfigSources {
    /// Construct from values given to --config.
    ///
    /// # Notice
    /// Relative paths are resolved against the current directory immediately,
    /// and the files are read and parsed right away.
    pub fn resolve_from_args<As>(args: As) -> FailResult<Self>
    where
        As: IntoIterator,
        As::Item: AsRef<str>,
    {
        args.into_iter()
            .map(|arg| Config::resolve_from_arg(arg.as_ref()))
            .collect::<FailResult<Vec<_>>>()
            .map(ConfigSources)
    }

    pub fn files(&self) -> impl Iterator<Item=&Path> {
        self.0.iter().filter_map(|config| match &config.source {
            ConfigSource::File(path) => Some(path.as_path()),
            ConfigSource::Argument => None,
        })
    }

    pub fn into_effective_yaml(self) -> Value {
        self.0.into_iter()
            .map(|config| config.yaml)
            .fold(Value::Mapping(Mapping::new()), merge_yaml)
    }

    /// Merge, deserialize, and check the settings.
    pub fn into_settings(self) -> FailResult<ValidatedSettings>
    {Ok({
        let settings = Settings::from_value(self.into_effective_yaml())?;
        settings.validate()?
    })}
}

/// Recursively merge two yaml values, with `b` taking precedence.
///
/// Mappings are merged key by key; anything else in `b` simply replaces what is in `a`.
/// This knows nothing about the types being deserialized, so e.g. a sequence can only be
/// replaced as a whole, never extended.
fn merge_yaml(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Mapping(mut merged), Value::Mapping(b)) => {
            for (key, b_value) in b {
                let value = match merged.remove(&key) {
                    Some(a_value) => merge_yaml(a_value, b_value),
                    None => b_value,
                };
                merged.insert(key, value);
            }
            Value::Mapping(merged)
        },
        (_, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::hgauss_tasks_config::Pivoting;

    fn yaml(s: &str) -> Value { Value::from_reader(s.as_bytes()).unwrap() }

    #[test]
    fn literal_args() {
        let expected = yaml("random-system: {dim: [42]}");
        for arg in &[
            ":{random-system: {dim: [42]}}",
            ": {random-system: {dim: [42]}}",
            "random-system:{dim: [42]}",
            "random-system: {dim: [42]}",
            "random-system.dim: [42]",
        ] {
            let config = Config::resolve_from_arg(arg).unwrap();
            assert_eq!(config.yaml, expected, "{:?}", arg);
            assert_eq!(config.source, ConfigSource::Argument);
        }
    }

    #[test]
    fn later_sources_win() {
        let sources = ConfigSources::resolve_from_args(vec![
            "random-system: {dim: 3, seed: 1}",
            "pivoting: partial",
            "random-system.dim: 5",
        ]).unwrap();
        assert_eq!(sources.files().count(), 0);
        assert_eq!(
            sources.clone().into_effective_yaml(),
            // (an overridden key moves to the end)
            yaml("{pivoting: partial, random-system: {seed: 1, dim: 5}}"),
        );

        let settings = sources.into_settings().unwrap();
        assert_eq!(settings.pivoting, Pivoting::Partial);
        assert_eq!(settings.random_system.dim, 5);
        assert_eq!(settings.random_system.seed, Some(1));
    }

    #[test]
    fn no_sources_means_defaults() {
        let settings = ConfigSources::default().into_settings().unwrap();
        assert_eq!(*settings, Settings::default());
    }

    #[test]
    fn invalid_settings_are_caught() {
        let sources = ConfigSources::resolve_from_args(&["workers: 0"]).unwrap();
        assert!(sources.into_settings().is_err());
    }

    #[test]
    fn missing_file() {
        assert!(ConfigSources::resolve_from_args(&["surely/this/does/not/exist.yaml"]).is_err());
    }

    #[test]
    fn scalars_replace_mappings() {
        assert_eq!(merge_yaml(yaml("{a: {b: 1}}"), yaml("{a: 2}")), yaml("{a: 2}"));
        assert_eq!(merge_yaml(yaml("{a: [1, 2]}"), yaml("{a: [3]}")), yaml("{a: [3]}"));
        assert_eq!(merge_yaml(yaml("{a: 1}"), yaml("{b: 2}")), yaml("{a: 1, b: 2}"));
    }
}
