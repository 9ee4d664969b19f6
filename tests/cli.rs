#[macro_use] extern crate hgauss_assert_close;
extern crate hgauss_integration_test;
extern crate hgauss_tasks;
extern crate hgauss_tasks_config;
extern crate serde_json;

use ::hgauss_integration_test::{CliTest, captured_stdout};
use ::hgauss_tasks::filetypes::SolutionFile;
use ::hgauss_tasks_config::Pivoting;
use ::std::sync::{Arc, Mutex};

const BIN: &str = env!("CARGO_BIN_EXE_hgauss");

macro_rules! resource {
    ($name:literal) => { concat!(env!("CARGO_MANIFEST_DIR"), "/tests/resources/", $name) };
}

#[test]
fn solve_system_file() {
    CliTest::binary(BIN)
        .arg("--system").arg(resource!("simple.json"))
        .args(&["--workers", "2", "-o", "out.json"])
        .check(|dir| {
            let out = SolutionFile::load(dir.join("out.json"))?;
            assert_close!(abs=1e-9, out.solution.clone(), vec![8.0, -8.0, 2.5]);
            assert_eq!(out.dim, 3);
            assert_eq!(out.workers, 2);
            assert_eq!(out.pivoting, Pivoting::Natural);
            assert_eq!(out.max_deviation, Some(0.0));

            let text = ::std::fs::read_to_string(dir.join("out.json"))?;
            let value: ::serde_json::Value = ::serde_json::from_str(&text)?;
            for key in &["solution", "dim", "workers", "pivoting", "max_deviation"] {
                assert!(value.get(key).is_some(), "missing {}", key);
            }
            Ok(())
        })
        .run().unwrap();
}

#[test]
fn more_workers_than_rows() {
    CliTest::binary(BIN)
        .arg("--system").arg(resource!("simple.json"))
        .args(&["--workers", "7", "-o", "out.json"])
        .check(|dir| {
            let out = SolutionFile::load(dir.join("out.json"))?;
            assert_close!(abs=1e-9, out.solution.clone(), vec![8.0, -8.0, 2.5]);
            assert_eq!(out.workers, 7);
            Ok(())
        })
        .run().unwrap();
}

#[test]
fn seeded_random_systems() {
    let solutions = Arc::new(Mutex::new(vec![]));
    for &workers in &["1", "4"] {
        let solutions = solutions.clone();
        CliTest::binary(BIN)
            .args(&["-c", "random-system: {dim: 12, seed: 42}"])
            .args(&["--workers", workers, "-o", "out.json"])
            .check(move |dir| {
                let out = SolutionFile::load(dir.join("out.json"))?;
                assert_eq!(out.dim, 12);
                assert_eq!(out.max_deviation, Some(0.0));
                solutions.lock().unwrap().push(out.solution);
                Ok(())
            })
            .run().unwrap();
    }

    let solutions = solutions.lock().unwrap();
    assert_eq!(solutions.len(), 2);
    assert_eq!(solutions[0], solutions[1]);
}

#[test]
fn partial_pivoting_from_config_file() {
    CliTest::binary(BIN)
        .args(&["-c", resource!("partial.yaml")])
        .arg("--system").arg(resource!("zero-leading-pivot.json"))
        .args(&["--workers", "2", "-o", "out.json"])
        .check(|dir| {
            let out = SolutionFile::load(dir.join("out.json"))?;
            assert_eq!(out.solution, vec![3.0, 2.0]);
            assert_eq!(out.pivoting, Pivoting::Partial);
            Ok(())
        })
        .run().unwrap();
}

#[test]
fn config_literals_override_files() {
    CliTest::binary(BIN)
        .args(&["-c", resource!("partial.yaml"), "-c", "pivoting: natural"])
        .arg("--system").arg(resource!("simple.json"))
        .args(&["--workers", "3", "-o", "out.json"])
        .check(|dir| {
            let out = SolutionFile::load(dir.join("out.json"))?;
            assert_eq!(out.pivoting, Pivoting::Natural);
            Ok(())
        })
        .run().unwrap();
}

#[test]
fn natural_pivoting_cannot_verify_a_zero_pivot() {
    // the solution is full of NaN, and so is its deviation from the sequential one
    CliTest::binary(BIN)
        .arg("--system").arg(resource!("zero-leading-pivot.json"))
        .args(&["--workers", "2", "-o", "out.json"])
        .expect_failure()
        .check(|dir| {
            assert!(!dir.join("out.json").exists());
            Ok(())
        })
        .run().unwrap();
}

#[test]
fn ragged_matrix() {
    CliTest::binary(BIN)
        .arg("--system").arg(resource!("ragged.json"))
        .expect_failure()
        .run().unwrap();
}

#[test]
fn invalid_config() {
    CliTest::binary(BIN)
        .args(&["-c", "workers: 0", "-c", "random-system.dim: 2"])
        .expect_failure()
        .run().unwrap();

    CliTest::binary(BIN)
        .args(&["--workers", "0"])
        .expect_failure()
        .run().unwrap();
}

#[test]
fn solution_is_logged_without_output() {
    CliTest::binary(BIN)
        .arg("--system").arg(resource!("simple.json"))
        .args(&["--workers", "2", "-v"])
        .check(|dir| {
            let stdout = captured_stdout(dir)?;
            assert!(stdout.contains("Solution:"), "{}", stdout);
            assert!(stdout.contains("DEBUG"), "{}", stdout);
            Ok(())
        })
        .run().unwrap();
}
