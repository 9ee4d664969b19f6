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

//! JSON files read and written by the `hgauss` binary.

use crate::FailResult;

use ::failure::ResultExt;
use ::hgauss_tasks_config::Pivoting;
use ::std::fs::File;
use ::std::io::{BufReader, BufWriter, Write};
use ::std::path::Path;

/// A linear system `matrix * x = rhs`, with the matrix given as a list of rows.
#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct SystemFile {
    pub matrix: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
}

impl SystemFile {
    pub fn load(path: impl AsRef<Path>) -> FailResult<Self>
    {Ok({
        let path = path.as_ref();
        let file = File::open(path).with_context(|_| format!("could not open {}", path.display()))?;
        ::serde_json::from_reader(BufReader::new(file))
            .with_context(|_| format!("could not parse {}", path.display()))?
    })}

    /// Check that the system is square and flatten the matrix in row-major order.
    pub fn into_flat(self) -> FailResult<(Vec<f64>, Vec<f64>)>
    {Ok({
        let SystemFile { matrix, rhs } = self;
        let n = rhs.len();
        ensure!(matrix.len() == n, "matrix has {} rows, but rhs has {} elements", matrix.len(), n);
        for (i, row) in matrix.iter().enumerate() {
            ensure!(row.len() == n, "row {} of the matrix has {} elements, expected {}", i, row.len(), n);
        }
        (matrix.concat(), rhs)
    })}
}

/// The result of a solve.
#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct SolutionFile {
    pub solution: Vec<f64>,
    pub dim: usize,
    /// Number of ranks that took part.
    pub workers: usize,
    pub pivoting: Pivoting,
    /// Largest absolute difference from the sequential solution, if it was checked.
    pub max_deviation: Option<f64>,
}

impl SolutionFile {
    pub fn load(path: impl AsRef<Path>) -> FailResult<Self>
    {Ok({
        let path = path.as_ref();
        let file = File::open(path).with_context(|_| format!("could not open {}", path.display()))?;
        ::serde_json::from_reader(BufReader::new(file))?
    })}

    pub fn save(&self, path: impl AsRef<Path>) -> FailResult<()>
    {Ok({
        let path = path.as_ref();
        let file = File::create(path).with_context(|_| format!("could not create {}", path.display()))?;
        let mut w = BufWriter::new(file);
        ::serde_json::to_writer_pretty(&mut w, self)?;
        writeln!(w)?;
        w.flush()?;
    })}
}
