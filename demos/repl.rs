use oklang::evaluator::Interpreter;
use oklang::io;
use oklang::value::Value;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = panic::catch_unwind(|| {
        let args: Vec<String> = std::env::args().skip(1).collect();
        match args.split_first() {
            Some((script, script_args)) => run_script(script, script_args),
            None => run_repl(),
        }
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn interpreter() -> Interpreter {
    let mut interp = Interpreter::new();
    if let Err(e) = io::install(&mut interp) {
        eprintln!("Could not install I/O verbs: {e}");
        process::exit(1);
    }
    interp
}

/// Run `script` with `x` bound to the remaining command-line arguments
fn run_script(script: &str, script_args: &[String]) {
    let source = match std::fs::read_to_string(script) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read {script}: {e}");
            process::exit(1);
        }
    };
    let interp = interpreter();
    let argv = Value::List(script_args.iter().map(|a| Value::from(a.as_str())).collect());
    interp.root().put("x", true, argv);
    match interp.eval(&source) {
        Ok(result) => println!("{result}"),
        Err(e) => {
            println!("{e}");
            process::exit(1);
        }
    }
}

fn run_repl() {
    println!("oklang (a K-family array language); \\h for help, \\\\ to exit");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let interp = interpreter();

    loop {
        match rl.readline(" ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let (source, timed) = match line.trim_start() {
                    "\\\\" => break,
                    "\\h" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&interp);
                        continue;
                    }
                    other => match other.strip_prefix("\\t") {
                        Some(rest) => (rest.to_owned(), true),
                        None => (line.clone(), false),
                    },
                };

                let started = Instant::now();
                match interp.eval(&source) {
                    Ok(Value::Nil) => {}
                    Ok(result) => println!("{result}"),
                    Err(e) => println!("{e}"),
                }
                if timed {
                    println!("completed in {}ms.", started.elapsed().as_millis());
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("atom 1 `c \"c\"   list (2;`c) 1 2 3   dict [a:1;b:2] `a`b!1 2");
    println!("func {{[x;y]x+y}}   view f::32+1.8*c   cond $[c;t;f]");
    println!();
    println!("verb   dyad      monad         adverb");
    println!("+      plus      flip          '   each");
    println!("-      minus     negate        /   over / fixed point");
    println!("*      times     first         \\   scan");
    println!("%      divide    sqrt          ':  each prior / stencil");
    println!("!      mod|dict  iota|keys     /:  each right");
    println!("&      min       where         \\:  each left");
    println!("|      max       reverse");
    println!("<      less      asc           I/O");
    println!(">      more      desc          0:  file lines r/w");
    println!("=      equal     group         1:  JSON r/w");
    println!("~      match     not           5:  printable form");
    println!(",      concat    enlist");
    println!("^      fill|out  null          commands");
    println!("#      take|rsh  count         \\t x  time x");
    println!("_      drop|cut  floor         \\h    this help");
    println!("$      cast|pad  string        :env  global bindings");
    println!("?      find|rnd  distinct      \\\\    exit");
    println!("@      at        type          @[x;i;[f;]y] amend");
    println!(".      dot       eval|val      .[x;i;[f;]y] deep amend");
    println!();
}

fn print_environment(interp: &Interpreter) {
    let Value::Dict(bindings) = interp.root().to_dict() else {
        return;
    };
    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }
    println!("Global bindings ({} total):", bindings.len());
    for (name, value) in bindings.iter() {
        println!("  {} = {value}", oklang::printer::format(name, true));
    }
}
