mod ast;
mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod parser;
mod scanner;
mod token;
mod value;

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser as _;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

use builtins::register_builtins;
use config::{HELP_TEXT, VERSION, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use env::Environment;
use eval::{eval_program, eval_statement};
use parser::Parser;
use scanner::Scanner;

/// Interpreter for Thyddle, a small dynamically-typed scripting language
#[derive(clap::Parser, Debug)]
#[command(name = "thyddle")]
#[command(version = VERSION)]
#[command(about = "A tree-walking interpreter for the Thyddle scripting language")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Skip loading the native prelude of built-in functions and constants
    #[arg(long = "no-prelude")]
    no_prelude: bool,

    /// Echo extra diagnostics (parsed statement counts) to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let args = CliArgs::parse();

    let env = Environment::new();
    if !args.no_prelude {
        register_builtins(&env);
    }

    let exit_code = match &args.file {
        Some(path) => run_file(path, &env, args.verbose),
        None => {
            run_repl(&env, args.verbose);
            0
        }
    };
    std::process::exit(exit_code);
}

fn run_file(path: &PathBuf, env: &Rc<Environment>, verbose: bool) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot read {}: {}", path.display(), e);
            return 1;
        }
    };

    let (tokens, scan_errors) = Scanner::new(&source).scan();
    let (stmts, parse_errors) = Parser::new(tokens).parse();

    if !scan_errors.is_empty() || !parse_errors.is_empty() {
        for err in &scan_errors {
            eprintln!("{}", err);
        }
        for err in &parse_errors {
            eprintln!("{}", err);
        }
        return 1;
    }

    if verbose {
        eprintln!("parsed {} top-level statement(s)", stmts.len());
    }

    match eval_program(&stmts, env) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Runtime Error: {}", e);
            1
        }
    }
}

fn run_repl(env: &Rc<Environment>, verbose: bool) {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), _> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize REPL: {}", e);
            return;
        }
    };

    let history_file = ".thyddle_history";
    let _ = rl.load_history(history_file);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);
    println!("{}", WELCOME_FOOTER);

    loop {
        let readline = rl.readline("thyddle> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit()" {
                    break;
                }
                if trimmed == "help()" {
                    println!("{}", HELP_TEXT);
                    continue;
                }
                eval_line(trimmed, env, verbose);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}

fn eval_line(line: &str, env: &Rc<Environment>, verbose: bool) {
    let (tokens, scan_errors) = Scanner::new(line).scan();
    if !scan_errors.is_empty() {
        for err in &scan_errors {
            eprintln!("{}", err);
        }
        return;
    }

    let (stmts, parse_errors) = Parser::new(tokens).parse();
    if !parse_errors.is_empty() {
        for err in &parse_errors {
            eprintln!("{}", err);
        }
        return;
    }

    if verbose {
        eprintln!("parsed {} top-level statement(s)", stmts.len());
    }

    for stmt in &stmts {
        match eval_statement(stmt, env) {
            Ok(value) if value.is_truthy() => println!("{}", value),
            Ok(_) => {}
            Err(e) => {
                eprintln!("Runtime Error: {}", e);
                break;
            }
        }
    }
}
