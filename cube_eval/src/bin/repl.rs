#[macro_use]
extern crate log;

use std::io::{self, Write};

use cube_eval::{eval::Evaluator, run};

const PROMPT: &str = ">>";

fn main() {
    pretty_env_logger::init();
    debug!("Logging enabled");

    let (stdin, mut stdout) = (io::stdin(), io::stdout());
    let mut evaluator = Evaluator::new();
    loop {
        print!("{PROMPT}");
        stdout.flush().expect("failed to flush stdout");

        let mut line = String::default();
        let n = stdin.read_line(&mut line).expect("failed to read line");
        // Zero bytes read means end of input (usually Ctrl-D)
        if n == 0 {
            break;
        }

        match run(&line, &mut evaluator) {
            Ok(value) => println!("{value}"),
            Err(errors) => errors.iter().for_each(|msg| println!("\t{msg}")),
        }
    }
}
