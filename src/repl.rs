use crate::state::*;
use rustyline::error::ReadlineError;
use rustyline::Editor;

const HISTORY_FILE: &str = "history.txt";

pub fn console_repl(xs: &mut State, load_history: bool) {
    let mut rl = Editor::<()>::new();
    if load_history {
        let _ = rl.load_history(HISTORY_FILE);
    }
    loop {
        let prompt = match xs.mode() {
            Mode::Interpret => "> ",
            Mode::Compile => "compile> ",
        };
        match rl.readline(prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str());
                if let Err(e) = xs.eval(line.as_str()) {
                    xs.print_error(&e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("bye");
                break;
            }
            Err(err) => {
                eprintln!("readline: {:?}", err);
                break;
            }
        }
    }
    if load_history {
        if let Err(e) = rl.save_history(HISTORY_FILE) {
            eprintln!("cannot save {}: {}", HISTORY_FILE, e);
        }
    }
}
