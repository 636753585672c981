use thforth::error::Xresult1;
use thforth::state::*;

use getopts::Options;
use tracing_subscriber::EnvFilter;

fn usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

fn make_state(matches: &getopts::Matches) -> Result<State, String> {
    let heap_size = match matches.opt_str("m") {
        Some(s) => s
            .parse::<usize>()
            .map_err(|e| format!("invalid heap size {}: {}", s, e))?,
        None => DEFAULT_HEAP_SIZE,
    };
    let booted: Xresult1<State> = if matches.opt_present("n") {
        State::new(heap_size)
    } else if let Some(lib) = matches.opt_str("l") {
        State::new(heap_size).and_then(|mut xs| xs.load_file(&lib).map(|_| xs))
    } else {
        State::boot_with_capacity(heap_size)
    };
    booted.map_err(|e| format!("bootstrap failed: {:?}", e))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options::new();
    opts.optopt("s", "", "run script file", "FILE");
    opts.optopt("l", "", "bootstrap library instead of the bundled one", "FILE");
    opts.optflag("n", "", "skip the bootstrap library");
    opts.optopt("m", "", "heap capacity in cells", "CELLS");
    opts.optflag("i", "", "enter the repl after the script");
    opts.optflag("h", "help", "print this help");
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            usage(&args[0], &opts);
            std::process::exit(2);
        }
    };
    if matches.opt_present("h") {
        usage(&args[0], &opts);
        return;
    }

    let mut xs = match make_state(&matches) {
        Ok(xs) => xs,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(1);
        }
    };

    if let Some(filename) = matches.opt_str("s") {
        if let Err(e) = xs.load_file(&filename) {
            xs.print_error(&e);
            std::process::exit(1);
        }
        if !matches.opt_present("i") {
            return;
        }
    }

    thforth::repl::console_repl(&mut xs, true);
}
