use crate::cell::*;
use crate::error::*;
use crate::lex::*;

use std::collections::HashSet;

/// Heap capacity in cells used by `boot`.
pub const DEFAULT_HEAP_SIZE: usize = 8192;

/// Return stack depth in cells before a call fails with `ReturnStackOverflow`.
pub const DEFAULT_RETURN_STACK_SIZE: usize = 1 << 20;

/// Bootstrap word library, evaluated by `boot`.
pub const CORE_LIB: &str = include_str!("../lib/core.fs");

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Interpret,
    Compile,
}

#[derive(Clone)]
struct DictEntry {
    name: Xstr,
    xf: Xfn,
}

#[derive(Clone)]
pub struct ErrorContext {
    pub err: Xerr,
    pub location: Option<TokenLocation>,
}

#[derive(Clone)]
pub struct State {
    dict: Vec<DictEntry>,
    immediate: HashSet<Xstr>,
    heap: Vec<Cell>,
    dp: usize,
    ip: usize,
    data_stack: Vec<Cell>,
    return_stack: Vec<Cell>,
    return_limit: usize,
    mode: Mode,
    last_word: Option<Xstr>,
    source: Option<Lex>,
    console: Option<String>,
    last_error: Option<ErrorContext>,
}

impl State {
    /// Machine with the primitive vocabulary only.
    pub fn new(heap_size: usize) -> Xresult1<State> {
        let mut xs = State {
            dict: Vec::new(),
            immediate: HashSet::new(),
            heap: vec![ZERO; heap_size],
            dp: 0,
            ip: 0,
            data_stack: Vec::new(),
            return_stack: Vec::new(),
            return_limit: DEFAULT_RETURN_STACK_SIZE,
            mode: Mode::Interpret,
            last_word: None,
            source: None,
            console: None,
            last_error: None,
        };
        xs.load_core()?;
        Ok(xs)
    }

    /// Machine with the bootstrap library already evaluated.
    pub fn boot() -> Xresult1<State> {
        Self::boot_with_capacity(DEFAULT_HEAP_SIZE)
    }

    pub fn boot_with_capacity(heap_size: usize) -> Xresult1<State> {
        let mut xs = State::new(heap_size)?;
        xs.eval_named(CORE_LIB, "lib/core.fs")?;
        Ok(xs)
    }

    fn load_core(&mut self) -> Xresult {
        crate::arith::load(self)?;
        self.defword("drop", |xs| xs.pop_data().map(|_| ()))?;
        self.defword("dup", core_word_dup)?;
        self.defword("swap", core_word_swap)?;
        self.defword("clear", |xs| {
            xs.data_stack.clear();
            OK
        })?;
        self.defword("here", |xs| xs.push_data(Cell::from(xs.dp)))?;
        self.defword("lit", core_word_lit)?;
        self.defword(">r", core_word_to_r)?;
        self.defword("r>", core_word_r_from)?;
        self.defword("i", |xs| core_word_rpeek(xs, 0))?;
        self.defword("j", |xs| core_word_rpeek(xs, 1))?;
        self.defword(",", core_word_comma)?;
        self.defword("!", core_word_store)?;
        self.defword("@", core_word_fetch)?;
        self.defword("[']", core_word_tick)?;
        self.def_immediate("immediate", core_word_immediate)?;
        self.define("exit", Xfn::Exit);
        self.defword(".", core_word_display_top)?;
        self.defword(".s", core_word_display_stack)?;
        self.defword("words", core_word_words)?;
        self.defword("jmp#f", core_word_jump_if_false)?;
        self.defword("jmp", core_word_jump)?;
        self.defword(":", core_word_def_begin)?;
        self.def_immediate(";", core_word_def_end)?;
        self.def_immediate("(", core_word_comment)?;
        OK
    }

    // dictionary ----------------------------------------------------------

    pub fn define(&mut self, name: &str, xf: Xfn) {
        tracing::debug!(name, ?xf, "define");
        self.dict.push(DictEntry {
            name: Xstr::from(name),
            xf,
        });
    }

    pub fn defword(&mut self, name: &str, f: XfnType) -> Xresult {
        self.define(name, Xfn::Native(XfnPtr(f)));
        OK
    }

    pub fn def_immediate(&mut self, name: &str, f: XfnType) -> Xresult {
        self.defword(name, f)?;
        self.mark_immediate(name);
        OK
    }

    pub fn lookup(&self, name: &str) -> Option<Xfn> {
        self.dict.iter().rfind(|e| e.name.as_str() == name).map(|e| e.xf)
    }

    /// Does nothing for unknown names.
    pub fn mark_immediate(&mut self, name: &str) {
        if let Some(e) = self.dict.iter().rfind(|e| e.name.as_str() == name) {
            tracing::debug!(name, "immediate");
            self.immediate.insert(e.name.clone());
        }
    }

    pub fn is_immediate(&self, name: &str) -> bool {
        self.immediate.contains(name)
    }

    /// Names in definition order, shadowed entries included.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.dict.iter().map(|e| e.name.as_str())
    }

    fn word_name(&self, xf: &Xfn) -> Option<&str> {
        self.dict
            .iter()
            .find(|e| &e.xf == xf)
            .map(|e| e.name.as_str())
    }

    // outer interpreter ---------------------------------------------------

    pub fn eval(&mut self, source: &str) -> Xresult {
        self.eval_named(source, "<buffer>")
    }

    pub fn load_file(&mut self, path: &str) -> Xresult {
        let buf = std::fs::read_to_string(path).map_err(|e| Xerr::IOError {
            filename: Xstr::from(path),
            reason: Xstr::from(e.to_string()),
        })?;
        self.eval_named(&buf, path)
    }

    fn eval_named(&mut self, source: &str, name: &str) -> Xresult {
        let lex = Lex::new(Xstr::from(source), name);
        let prev = self.source.replace(lex);
        let result = self.build();
        if let Err(e) = result.as_ref() {
            self.set_last_error(e.clone());
        }
        self.source = prev;
        result
    }

    fn build(&mut self) -> Xresult {
        loop {
            match self.next_token() {
                Tok::EndOfInput => break OK,
                Tok::Word(name) => self.dispatch_word(name.as_str())?,
            }
        }
    }

    fn dispatch_word(&mut self, name: &str) -> Xresult {
        match (self.mode, self.lookup(name)) {
            (Mode::Interpret, Some(xf)) => self.call_fn(xf),
            (Mode::Interpret, None) => {
                let n = parse_number(name)?;
                self.push_data(Cell::Int(n))
            }
            (Mode::Compile, Some(xf)) if self.is_immediate(name) => self.call_fn(xf),
            (Mode::Compile, Some(xf)) => self.heap_append(Cell::Fun(xf)),
            (Mode::Compile, None) => {
                let n = parse_number(name)?;
                self.heap_append(Cell::Fun(Xfn::Native(XfnPtr(core_word_lit))))?;
                self.heap_append(Cell::Int(n))
            }
        }
    }

    fn next_token(&mut self) -> Tok {
        match self.source.as_mut() {
            Some(lex) => lex.next(),
            None => Tok::EndOfInput,
        }
    }

    fn next_name(&mut self) -> Xresult1<Xstr> {
        match self.next_token() {
            Tok::Word(name) => Ok(Xstr::from(name.as_str())),
            Tok::EndOfInput => Err(Xerr::ExpectingName),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    // inner interpreter ---------------------------------------------------

    /// Executes an operation the same way regardless of its kind.
    pub fn call_fn(&mut self, xf: Xfn) -> Xresult {
        match xf {
            Xfn::Native(x) => x.0(self),
            Xfn::Interp(addr) => {
                tracing::trace!(addr, depth = self.return_stack.len(), "call");
                let ip = self.ip;
                self.push_return(Cell::from(ip))?;
                self.run(addr)?;
                self.ip = self.pop_return()?.to_address()?;
                OK
            }
            Xfn::Exit => OK,
        }
    }

    /// Threads through the body at `addr` until its exit marker.
    /// Nested definitions are entered in the same loop, their return
    /// addresses live on the return stack.
    pub fn run(&mut self, addr: usize) -> Xresult {
        self.ip = addr;
        let mut nested = 0usize;
        loop {
            let xf = self.heap_fetch(self.ip)?.to_fn()?;
            self.ip += 1;
            match xf {
                Xfn::Native(x) => x.0(self)?,
                Xfn::Interp(a) => {
                    tracing::trace!(addr = a, depth = self.return_stack.len(), "call");
                    let ret = self.ip;
                    self.push_return(Cell::from(ret))?;
                    self.ip = a;
                    nested += 1;
                }
                Xfn::Exit if nested == 0 => break OK,
                Xfn::Exit => {
                    self.ip = self.pop_return()?.to_address()?;
                    nested -= 1;
                }
            }
        }
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    fn jump_to(&mut self, offs: Xint) -> Xresult {
        let new_ip = (self.ip as Xint)
            .checked_add(offs)
            .filter(|a| *a >= 0)
            .ok_or(Xerr::InvalidAddress)?;
        self.ip = new_ip as usize;
        OK
    }

    // heap ----------------------------------------------------------------

    pub fn here(&self) -> usize {
        self.dp
    }

    pub fn heap_capacity(&self) -> usize {
        self.heap.len()
    }

    pub fn heap_fetch(&self, addr: usize) -> Xresult1<Cell> {
        self.heap.get(addr).cloned().ok_or(Xerr::InvalidAddress)
    }

    pub fn heap_store(&mut self, addr: usize, val: Cell) -> Xresult {
        let x = self.heap.get_mut(addr).ok_or(Xerr::InvalidAddress)?;
        *x = val;
        OK
    }

    pub fn heap_append(&mut self, val: Cell) -> Xresult {
        let x = self.heap.get_mut(self.dp).ok_or(Xerr::HeapOverflow)?;
        *x = val;
        self.dp += 1;
        OK
    }

    // stacks --------------------------------------------------------------

    pub fn push_data(&mut self, data: Cell) -> Xresult {
        self.data_stack.push(data);
        OK
    }

    pub fn pop_data(&mut self) -> Xresult1<Cell> {
        self.data_stack.pop().ok_or(Xerr::StackUnderflow)
    }

    fn top_data(&self) -> Option<&Cell> {
        self.data_stack.last()
    }

    pub fn data_depth(&self) -> usize {
        self.data_stack.len()
    }

    /// Bottom to top.
    pub fn data_stack(&self) -> &[Cell] {
        &self.data_stack
    }

    pub fn push_return(&mut self, val: Cell) -> Xresult {
        if self.return_stack.len() >= self.return_limit {
            return Err(Xerr::ReturnStackOverflow);
        }
        self.return_stack.push(val);
        OK
    }

    pub fn pop_return(&mut self) -> Xresult1<Cell> {
        self.return_stack.pop().ok_or(Xerr::StackUnderflow)
    }

    /// Bottom to top.
    pub fn return_stack(&self) -> &[Cell] {
        &self.return_stack
    }

    pub fn set_return_limit(&mut self, cells: usize) {
        self.return_limit = cells;
    }

    // output and errors ---------------------------------------------------

    pub fn format_cell(&self, val: &Cell) -> String {
        match val {
            Cell::Fun(xf @ Xfn::Native(_)) => self
                .word_name(xf)
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("{:?}", xf)),
            val => format!("{:?}", val),
        }
    }

    pub fn print(&mut self, msg: &str) {
        if let Some(out) = self.console.as_mut() {
            out.push_str(msg);
        } else {
            print!("{}", msg);
        }
    }

    pub fn log_error(&mut self, mut msg: String) {
        msg.push('\n');
        if let Some(out) = self.console.as_mut() {
            out.push_str(&msg);
        } else {
            eprint!("{}", msg);
        }
    }

    /// Collect printed output in memory instead of writing to stdout.
    pub fn capture_stdout(&mut self) {
        if self.console.is_none() {
            self.console = Some(String::new());
        }
    }

    pub fn console(&mut self) -> Option<&mut String> {
        self.console.as_mut()
    }

    pub fn last_error(&self) -> &Option<ErrorContext> {
        &self.last_error
    }

    pub fn format_error(&self, err: &Xerr) -> String {
        match self.last_error.as_ref() {
            Some(ErrorContext {
                err: last,
                location: Some(location),
            }) if last == err => format!("error: {:?}\n{:?}", err, location),
            _ => format!("error: {:?}", err),
        }
    }

    pub fn print_error(&mut self, err: &Xerr) {
        let msg = self.format_error(err);
        self.log_error(msg);
    }

    fn set_last_error(&mut self, err: Xerr) {
        tracing::debug!(?err, "evaluation failed");
        let location = self
            .source
            .as_ref()
            .and_then(|lex| lex.last_token().map(|tok| lex.location(tok)));
        self.last_error = Some(ErrorContext { err, location });
    }
}

fn parse_number(name: &str) -> Xresult1<Xint> {
    name.parse::<Xint>()
        .map_err(|_| Xerr::UndefinedWord(Xstr::from(name)))
}

fn core_word_dup(xs: &mut State) -> Xresult {
    let val = xs.top_data().cloned().ok_or(Xerr::StackUnderflow)?;
    xs.push_data(val)
}

fn core_word_swap(xs: &mut State) -> Xresult {
    let a = xs.pop_data()?;
    let b = xs.pop_data()?;
    xs.push_data(a)?;
    xs.push_data(b)
}

fn core_word_lit(xs: &mut State) -> Xresult {
    let val = xs.heap_fetch(xs.ip)?;
    xs.ip += 1;
    xs.push_data(val)
}

fn core_word_tick(xs: &mut State) -> Xresult {
    core_word_lit(xs)
}

fn core_word_to_r(xs: &mut State) -> Xresult {
    let val = xs.pop_data()?;
    xs.push_return(val)
}

fn core_word_r_from(xs: &mut State) -> Xresult {
    let val = xs.pop_return()?;
    xs.push_data(val)
}

fn core_word_rpeek(xs: &mut State, n: usize) -> Xresult {
    let val = xs
        .return_stack
        .iter()
        .nth_back(n)
        .cloned()
        .ok_or(Xerr::StackUnderflow)?;
    xs.push_data(val)
}

fn core_word_comma(xs: &mut State) -> Xresult {
    let val = xs.pop_data()?;
    xs.heap_append(val)
}

// ( val addr -- )
fn core_word_store(xs: &mut State) -> Xresult {
    let addr = xs.pop_data()?.to_address()?;
    let val = xs.pop_data()?;
    xs.heap_store(addr, val)
}

// ( addr -- val )
fn core_word_fetch(xs: &mut State) -> Xresult {
    let addr = xs.pop_data()?.to_address()?;
    let val = xs.heap_fetch(addr)?;
    xs.push_data(val)
}

fn core_word_jump(xs: &mut State) -> Xresult {
    let offs = xs.heap_fetch(xs.ip)?.to_int()?;
    xs.jump_to(offs)
}

fn core_word_jump_if_false(xs: &mut State) -> Xresult {
    if xs.pop_data()?.to_flag()? {
        xs.ip += 1;
        OK
    } else {
        core_word_jump(xs)
    }
}

fn core_word_def_begin(xs: &mut State) -> Xresult {
    let name = xs.next_name()?;
    let xf = Xfn::Interp(xs.here());
    xs.define(name.as_str(), xf);
    xs.last_word = Some(name);
    xs.mode = Mode::Compile;
    OK
}

fn core_word_def_end(xs: &mut State) -> Xresult {
    xs.heap_append(EXIT)?;
    xs.mode = Mode::Interpret;
    OK
}

fn core_word_immediate(xs: &mut State) -> Xresult {
    if let Some(name) = xs.last_word.clone() {
        xs.mark_immediate(name.as_str());
    }
    OK
}

fn core_word_comment(xs: &mut State) -> Xresult {
    loop {
        match xs.next_token() {
            Tok::Word(w) if w.as_str() == ")" => break OK,
            Tok::Word(_) => continue,
            Tok::EndOfInput => break OK,
        }
    }
}

fn core_word_display_top(xs: &mut State) -> Xresult {
    let val = xs.pop_data()?;
    let mut s = xs.format_cell(&val);
    s.push('\n');
    xs.print(&s);
    OK
}

fn core_word_display_stack(xs: &mut State) -> Xresult {
    let items: Vec<String> = xs.data_stack.iter().map(|x| xs.format_cell(x)).collect();
    let s = format!("<{}> {}\n", items.len(), items.join(" "));
    xs.print(&s);
    OK
}

fn core_word_words(xs: &mut State) -> Xresult {
    let mut s = xs.words().collect::<Vec<_>>().join(" ");
    s.push('\n');
    xs.print(&s);
    OK
}
