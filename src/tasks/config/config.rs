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

#![allow(non_snake_case)]

//! Types describing the config file.
//!
//! Every field has a default, so an empty mapping is a valid config.

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default)]
    pub pivoting: Pivoting,

    /// Size of the in-process worker group.
    ///
    /// `None` leaves the choice to the environment (`HGAUSS_WORKERS`, else the CPU count).
    /// Ignored under MPI, where the group is whatever `mpirun` started.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Used when no system file is given.
    #[serde(default)]
    pub random_system: RandomSystem,

    #[serde(default)]
    pub verify: Verify,
}

/// Row exchange policy during forward elimination.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Pivoting {
    /// Always use the diagonal element of the current row, in the given row order.
    Natural,
    /// Swap in the row with the largest magnitude in the pivot column.
    Partial,
}

impl Default for Pivoting {
    fn default() -> Self { Pivoting::Natural }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RandomSystem {
    #[serde(default="_random_system__dim")]
    pub dim: usize,

    /// `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Entries (of both the matrix and the right-hand side) are uniform in `[lo, hi)`.
    #[serde(default="_random_system__range")]
    pub range: (f64, f64),
}
fn _random_system__dim() -> usize { 10 }
fn _random_system__range() -> (f64, f64) { (-100.0, 100.0) }

impl Default for RandomSystem {
    fn default() -> Self {
        RandomSystem {
            dim: _random_system__dim(),
            seed: None,
            range: _random_system__range(),
        }
    }
}

/// Re-solve the system sequentially and compare.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Verify {
    #[serde(default="_verify__enabled")]
    pub enabled: bool,

    /// Maximum absolute difference allowed between any two solution components.
    #[serde(default="_verify__tolerance")]
    pub tolerance: f64,
}
fn _verify__enabled() -> bool { true }
fn _verify__tolerance() -> f64 { 1e-10 }

impl Default for Verify {
    fn default() -> Self {
        Verify {
            enabled: _verify__enabled(),
            tolerance: _verify__tolerance(),
        }
    }
}
