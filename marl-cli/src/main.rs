use std::env;
use std::fs;
use std::io::Write;

use anyhow::{Context, Error};
use clap::App;
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use marl::solver::Solver;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{:#}", err);
            -1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

/// Prefix all log output with `c ` so it parses as DIMACS comment lines.
fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("MARL_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("marl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A CDCL based SAT solver")
        .arg_from_usage("<INPUT> 'The DIMACS CNF file to solve'")
        .get_matches_safe();

    // A usage error must not exit with the code reserved for satisfiable
    // inputs, while --help and --version still exit successfully.
    let matches = match matches {
        Ok(matches) => matches,
        Err(err) => {
            if err.use_stderr() {
                eprintln!("{}", err.message);
                return Ok(-1);
            }
            err.exit();
        }
    };

    init_logging();

    info!("This is marl {}", env!("CARGO_PKG_VERSION"));

    let path = matches.value_of("INPUT").unwrap();

    info!("Reading file '{}'", path);
    let file = fs::File::open(path).with_context(|| format!("cannot open '{}'", path))?;

    let mut solver = Solver::new();
    solver.add_dimacs_cnf(file)?;

    match solver.solve() {
        Some(true) => {
            let model = solver.model().unwrap();
            let mut line = String::from("sat");
            for lit in model {
                line.push(' ');
                line.push_str(&lit.to_string());
            }
            println!("{}", line);
            Ok(1)
        }
        Some(false) => {
            println!("unsat");
            Ok(0)
        }
        None => unreachable!("search ended without a verdict"),
    }
}
