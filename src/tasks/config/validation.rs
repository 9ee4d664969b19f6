/* ************************************************************************ **
** This file is part of hgauss, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of hgauss is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! All of the checking that occurs after config merging is written here.
//!
//! Serde can only tell us that a value has the right shape; this catches the
//! values that have the right shape and are still nonsense.

use crate::config::*;
use ::failure::Error;

/// Settings that have passed `Settings::validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSettings(pub Settings);

impl ::std::ops::Deref for ValidatedSettings {
    type Target = Settings;

    fn deref(&self) -> &Settings { &self.0 }
}

impl Settings {
    pub fn validate(self) -> Result<ValidatedSettings, Error> {
        if let Some(workers) = self.workers {
            ensure!(workers > 0, "workers: a worker group needs at least one member");
        }
        self.random_system.check()?;
        self.verify.check()?;

        Ok(ValidatedSettings(self))
    }
}

impl RandomSystem {
    fn check(&self) -> Result<(), Error> {
        let (lo, hi) = self.range;
        ensure!(self.dim > 0, "random-system.dim: must be positive");
        ensure!(
            lo.is_finite() && hi.is_finite() && lo < hi,
            "random-system.range: expected finite [lo, hi] with lo < hi, got [{}, {}]", lo, hi,
        );
        Ok(())
    }
}

impl Verify {
    fn check(&self) -> Result<(), Error> {
        ensure!(
            self.tolerance >= 0.0,
            "verify.tolerance: must be non-negative, got {}", self.tolerance,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn nonsense_is_rejected() {
        let check = |f: &dyn Fn(&mut Settings)| {
            let mut settings = Settings::default();
            f(&mut settings);
            settings.validate().is_err()
        };
        assert!(check(&|s| s.workers = Some(0)));
        assert!(check(&|s| s.random_system.dim = 0));
        assert!(check(&|s| s.random_system.range = (1.0, 1.0)));
        assert!(check(&|s| s.random_system.range = (0.0, ::std::f64::INFINITY)));
        assert!(check(&|s| s.verify.tolerance = -1.0));
        assert!(check(&|s| s.verify.tolerance = ::std::f64::NAN));
        assert!(!check(&|s| s.workers = Some(1)));
    }
}
