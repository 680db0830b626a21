#[macro_use]
extern crate log;

use std::{env, fs::File, io::Read};

use cube_eval::{eval::Evaluator, run};

fn main() {
    pretty_env_logger::init();
    debug!("Logging enabled");

    let mut args = env::args();
    let exec = args.next().unwrap_or_else(|| "cube".to_string());
    let Some(path) = args.next() else {
        println!("usage: {exec} [file.cb]");
        return;
    };
    run_file(&path);
}

fn run_file(path: &str) {
    if !path.ends_with(".cb") {
        println!("wrong file suffix in {path}");
        return;
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            println!("impossible to open the file {path}: {err}");
            return;
        }
    };
    let mut source = String::new();
    if file.read_to_string(&mut source).is_err() {
        println!("impossible to read file content");
        return;
    }

    let mut evaluator = Evaluator::new();
    match run(&source, &mut evaluator) {
        Ok(value) => {
            if value.is_error() {
                println!("{value}");
            }
        }
        Err(errors) => {
            println!("Errors found:");
            for (idx, msg) in errors.iter().enumerate() {
                println!("\t{idx}: {msg}");
            }
        }
    }
}
