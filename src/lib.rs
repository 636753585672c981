pub mod lex;
mod arith;
pub mod error;
pub mod cell;
pub mod state;
#[cfg(feature = "stdio")]
pub mod repl;

pub mod prelude {
    pub type Xstate = crate::state::State;
    pub type Xcell = crate::cell::Cell;
    pub use crate::cell::{Xfn, Xint};
    pub use crate::error::{Xerr, Xresult, Xresult1, OK};
    pub use crate::state::{Mode, DEFAULT_HEAP_SIZE};
}
