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

//! `main` functions of the binaries, which live in `src/binary-shims`.

use crate::FailResult;
use crate::cmd::{self, System};
use crate::env;
use crate::ui::cfg_merging::ConfigSources;
use crate::ui::logging::GlobalLogger;

use ::clap::{App, Arg, ArgMatches};
use ::hgauss_comm::{Communicator, LocalGroup, COORDINATOR};
use ::hgauss_tasks_config::Settings;
use ::std::ffi::OsStr;
use ::std::path::Path;

fn wrap_result_main<F>(main: F)
where F: FnOnce() -> FailResult<()>,
{
    main().unwrap_or_else(|e| {
        for cause in e.iter_chain() {
            error!("{}", cause);
        }

        if ::std::env::var_os("RUST_BACKTRACE") == Some(OsStr::new("1").to_owned()) {
            error!("{}", e.backtrace());
        } else {
            error!("\
                (If you found the above error message to be particularly lacking in \
                detail, try again with RUST_BACKTRACE=1)\
            ");
        }
        ::std::process::exit(1);
    });
}

const CONFIG_HELP: &str = "\
    config yaml, provided as either a filepath, or as an embedded literal \
    (via syntax described below). \
    When provided multiple times, the configs are merged with preference \
    to the values supplied in later arguments. \
    \n\n\
    Literals are written as '--config [NESTED_KEY]:VALID_YAML', \
    where NESTED_KEY is an optional '.'-separated sequence of string keys, \
    and the ':' is a literal colon. When provided, NESTED_KEY constructs a nested \
    mapping (so `--config a.b.c:[2]` is equivalent to `--config :{a: {b: {c: [2]}}}`.\
    \n\n\
    Note that detection of filepaths versus literals is based solely \
    on the presence of a colon, and no means of escaping one in a path \
    are currently provided.\
";

fn positive_integer(s: String) -> Result<(), String> {
    match s.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("expected a positive integer, got {:?}", s)),
        Ok(_) => Ok(()),
    }
}

#[allow(dangerous_implicit_autorefs)]
fn app<'a, 'b>() -> App<'a, 'b> {
    let app = App::new("hgauss")
        .version(crate_version!())
        .author(crate_authors!(", "))
        .about("Solve a dense linear system by Gaussian elimination over a group of workers.")
        .args(&[
            Arg::with_name("config")
                .short("c").long("config")
                .value_name("CONFIG")
                .takes_value(true).multiple(true).number_of_values(1)
                .help(CONFIG_HELP),
            Arg::with_name("system")
                .long("system")
                .value_name("FILE")
                .takes_value(true)
                .help("JSON file with a square 'matrix' (list of rows) and an 'rhs'. \
                       When absent, a random system is generated as described by the config."),
            Arg::with_name("output")
                .short("o").long("output")
                .value_name("FILE")
                .takes_value(true)
                .help("write the solution here as JSON, instead of logging it"),
            Arg::with_name("workers")
                .long("workers")
                .value_name("N")
                .takes_value(true)
                .validator(positive_integer)
                .help("number of in-process workers. \
                       [default: config 'workers', else $HGAUSS_WORKERS, else the number of CPUs]"),
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("log more (-vv for message passing)"),
            Arg::with_name("log")
                .long("log")
                .value_name("FILE")
                .takes_value(true)
                .help("also write the log to this file"),
        ]);

    #[cfg(feature = "mpi-support")]
    let app = app.arg({
        Arg::with_name("mpi")
            .long("mpi")
            .conflicts_with("workers")
            .help("run as one process of an MPI job (e.g. under mpirun), instead of using threads")
    });

    app
}

// %% CRATES: binary: hgauss %%
pub fn hgauss() {
    wrap_result_main(|| {
        let matches = app().get_matches();

        let mut logger = GlobalLogger::default();
        logger.verbosity(matches.occurrences_of("verbose") as i32);
        if let Some(path) = matches.value_of("log") {
            logger.path(path);
        }
        logger.apply()?;

        let sources = ConfigSources::resolve_from_args(matches.values_of("config").into_iter().flatten())?;
        for path in sources.files() {
            debug!("Using config file {}", path.display());
        }
        let settings = sources.into_settings()?;

        let system_path = matches.value_of("system").map(Path::new);
        let output = matches.value_of("output").map(Path::new);

        if use_mpi(&matches) {
            return run_mpi(&settings, system_path, output);
        }

        let workers = match matches.value_of("workers") {
            // (already validated by clap)
            Some(s) => s.parse()?,
            None => match settings.workers {
                Some(n) => n,
                None => env::default_workers()?,
            },
        };
        run_local(workers, &settings, system_path, output)
    });
}

fn run_local(
    workers: usize,
    settings: &Settings,
    system_path: Option<&Path>,
    output: Option<&Path>,
) -> FailResult<()>
{Ok({
    let system = System::obtain(settings, system_path)?;
    debug!("Starting {} worker(s)", workers);

    let mut results = LocalGroup::new(workers).run(|comm| {
        let system = match comm.rank() {
            COORDINATOR => Some(&system),
            _ => None,
        };
        cmd::solve(&comm, settings, system)
    }).into_iter();

    let coordinator = match results.next() {
        Some(result) => result,
        None => bail!("worker group was empty"),
    };
    for (i, result) in results.enumerate() {
        // (these are generally just the echo of a coordinator failure)
        if let Err(e) = result {
            debug!("rank {}: {}", i + 1, e);
        }
    }

    match coordinator? {
        Some(result) => cmd::report(&result, output)?,
        None => bail!("the coordinator produced no result"),
    }
})}

#[cfg(feature = "mpi-support")]
fn use_mpi(matches: &ArgMatches<'_>) -> bool { matches.is_present("mpi") }

#[cfg(not(feature = "mpi-support"))]
fn use_mpi(_: &ArgMatches<'_>) -> bool { false }

#[cfg(feature = "mpi-support")]
fn run_mpi(
    settings: &Settings,
    system_path: Option<&Path>,
    output: Option<&Path>,
) -> FailResult<()>
{Ok({
    let _universe = match ::mpi::initialize() {
        Some(universe) => universe,
        None => bail!("MPI was already initialized"),
    };
    let comm = ::hgauss_comm::MpiWorld::new();
    debug!("MPI rank {} of {}", comm.rank(), comm.size());

    let system = match comm.is_coordinator() {
        true => Some(System::obtain(settings, system_path)?),
        false => None,
    };
    if let Some(result) = cmd::solve(&comm, settings, system.as_ref())? {
        cmd::report(&result, output)?;
    }
})}

#[cfg(not(feature = "mpi-support"))]
fn run_mpi(_: &Settings, _: Option<&Path>, _: Option<&Path>) -> FailResult<()>
{ bail!("hgauss was built without MPI support") }
