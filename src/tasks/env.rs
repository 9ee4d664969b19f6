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

use crate::FailResult;
use ::std::env;

const WORKERS_VAR: &str = "HGAUSS_WORKERS";

fn var(key: &str) -> FailResult<Option<String>>
{ match env::var(key) {
    Ok(s) => Ok(Some(s)),
    Err(env::VarError::NotPresent) => Ok(None),
    Err(env::VarError::NotUnicode(s)) => bail!("env var not unicode: {}={:?}", key, s),
}}

fn nonempty_var(key: &str) -> FailResult<Option<String>>
{ match var(key) {
    Ok(Some(ref s)) if s == "" => Ok(None),
    r => r,
}}

/// Size of the in-process worker group when the config doesn't say.
///
/// `HGAUSS_WORKERS` if set, else the number of logical CPUs.
pub fn default_workers() -> FailResult<usize>
{Ok({
    match nonempty_var(WORKERS_VAR)? {
        Some(s) => parse_workers(&s)?,
        None => ::num_cpus::get(),
    }
})}

fn parse_workers(s: &str) -> FailResult<usize>
{Ok({
    match s.trim().parse::<usize>() {
        Ok(0) | Err(_) => bail!("Invalid setting for {}: {:?} (expected a positive integer)", WORKERS_VAR, s),
        Ok(n) => n,
    }
})}

#[cfg(test)]
mod tests {
    use super::*;

    // (the env var itself is process-global, so only the parsing is tested here)
    #[test]
    fn worker_counts() {
        assert_eq!(parse_workers("4").unwrap(), 4);
        assert_eq!(parse_workers(" 12\n").unwrap(), 12);
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("-1").is_err());
        assert!(parse_workers("many").is_err());
    }
}
