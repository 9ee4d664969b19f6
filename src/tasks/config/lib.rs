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

// Crate where serde_yaml code for the 'tasks' crate is monomorphized.
//
// The functions here also make use of serde_ignored to catch typos in the config.

// NOTE: Please make sure to use the YamlRead trait!
//       DO NOT USE serde_yaml::from_{reader,value,etc.} OUTSIDE THIS CRATE.

#[macro_use]
extern crate serde_derive;
extern crate serde_yaml;

extern crate serde;
extern crate serde_ignored;

#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;

use ::std::io::Read;

pub use crate::config::*;
mod config;

pub use crate::validation::ValidatedSettings;
mod validation;

/// Provides an alternative to serde_yaml::from_reader where all of the
/// expensive codegen has already been performed in this crate.
pub trait YamlRead: for <'de> ::serde::Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self, ::serde_yaml::Error>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self, ::serde_yaml::Error> {
        // serde_ignored needs a Deserializer.
        // serde_yaml doesn't expose one that is directly constructable from a Read,
        // but it does impl Deserializer for Value.
        Self::from_value(value_from_dyn_reader(r)?)
    }

    fn from_value(value: ::serde_yaml::Value) -> Result<Self, ::serde_yaml::Error>;
}

macro_rules! derive_yaml_read {
    ($Type:ty) => {
        impl YamlRead for $Type {
            // NOTE: These bodies are generated per type rather than written once as a
            //       default fn on the trait, so that codegen happens in this crate.
            fn from_value(value: ::serde_yaml::Value) -> Result<$Type, ::serde_yaml::Error> {
                ::serde_ignored::deserialize(
                    value,
                    |path| warn!("Unused config item (possible typo?): {}", path),
                )
            }
        }
    };
}

derive_yaml_read!{::serde_yaml::Value}
derive_yaml_read!{Settings}

// (this also exists solely for codegen reasons)
fn value_from_dyn_reader(r: &mut dyn Read) -> Result<::serde_yaml::Value, ::serde_yaml::Error>
{ ::serde_yaml::from_reader(r) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let settings = Settings::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.pivoting, Pivoting::Natural);
        assert_eq!(settings.workers, None);
        assert_eq!(settings.random_system.dim, 10);
        assert_eq!(settings.random_system.range, (-100.0, 100.0));
        assert!(settings.verify.enabled);
        assert_eq!(settings.verify.tolerance, 1e-10);
    }

    #[test]
    fn kebab_case_keys() {
        let settings = Settings::from_reader("
pivoting: partial
workers: 3
random-system:
  dim: 4
  seed: 12
  range: [-1.0, 2.0]
verify:
  enabled: false
".as_bytes()).unwrap();

        assert_eq!(settings.pivoting, Pivoting::Partial);
        assert_eq!(settings.workers, Some(3));
        assert_eq!(settings.random_system, RandomSystem { dim: 4, seed: Some(12), range: (-1.0, 2.0) });
        assert_eq!(settings.verify.enabled, false);
        assert_eq!(settings.verify.tolerance, 1e-10);
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let settings = Settings::from_reader("pivotting: partial".as_bytes()).unwrap();
        assert_eq!(settings.pivoting, Pivoting::Natural);
    }

    #[test]
    fn bad_pivoting_is_rejected() {
        assert!(Settings::from_reader("pivoting: complete".as_bytes()).is_err());
    }
}
