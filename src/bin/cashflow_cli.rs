use std::{env, process};

use cashflow_planner::{cli::CliContext, init};

fn main() {
    init();

    let args: Vec<String> = env::args().skip(1).collect();
    match CliContext::from_env().run(&args) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}
