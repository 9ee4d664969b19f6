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

//! Helpers for running a compiled binary from an integration test.

#[macro_use]
extern crate failure;

use ::failure::{Error, ResultExt};
use ::std::ffi::{OsStr, OsString};
use ::std::fs::File;
use ::std::path::{Path, PathBuf};
use ::std::process::Command;
use ::tempdir::TempDir;

pub type Result<T> = ::std::result::Result<T, Error>;

pub type DirChecker = Box<dyn Fn(&Path) -> Result<()>>;

/// Runs a binary inside a fresh temporary directory, then inspects what it left there.
///
/// Relative paths given as arguments are thus relative to the tempdir; use absolute
/// paths for inputs.
#[must_use]
pub struct CliTest {
    bin: PathBuf,
    args: Vec<OsString>,
    expect_success: bool,
    checkers: Vec<DirChecker>,
}

impl CliTest {
    /// Usually `env!("CARGO_BIN_EXE_<name>")`.
    pub fn binary(bin: impl AsRef<Path>) -> Self {
        CliTest {
            bin: bin.as_ref().to_owned(),
            args: vec![],
            expect_success: true,
            checkers: vec![],
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<S: AsRef<OsStr>>(mut self, args: &[S]) -> Self {
        self.args.extend(args.iter().map(|s| s.as_ref().to_owned()));
        self
    }

    /// Require a nonzero exit status instead.
    pub fn expect_failure(mut self) -> Self {
        self.expect_success = false;
        self
    }

    /// Called with the tempdir after the binary exits, in the order they were added.
    pub fn check<F>(mut self, checker: F) -> Self
    where F: Fn(&Path) -> Result<()> + 'static,
    {
        self.checkers.push(Box::new(checker));
        self
    }

    pub fn run(self) -> Result<()> {
        let CliTest { bin, args, expect_success, checkers } = self;

        let tmp = TempDir::new("hgauss")?;
        let dir = tmp.path();

        let stdout_path = dir.join("__captured_stdout");
        let stderr_path = dir.join("__captured_stderr");
        let status = {
            Command::new(&bin)
                .args(&args)
                .current_dir(dir)
                .stdout(File::create(&stdout_path)?)
                .stderr(File::create(&stderr_path)?)
                .status()
                .with_context(|_| format!("could not run {}", bin.display()))?
        };
        // hand the output to the test harness, which shows it on failure
        print!("{}", ::std::fs::read_to_string(&stdout_path)?);
        eprint!("{}", ::std::fs::read_to_string(&stderr_path)?);

        ensure!(
            status.success() == expect_success,
            "expected {}, but {} exited with {}",
            if expect_success { "success" } else { "failure" }, bin.display(), status,
        );

        for checker in checkers {
            checker(dir)?;
        }
        Ok(())
    }
}

/// Read the captured standard output of a finished run.
pub fn captured_stdout(dir: &Path) -> Result<String>
{ Ok(::std::fs::read_to_string(dir.join("__captured_stdout"))?) }
