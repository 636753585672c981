use crate::error::{Xerr, Xresult, Xresult1};
use crate::state::State;

use std::fmt;

pub type Xstr = arcstr::ArcStr;
pub type Xsubstr = arcstr::Substr;
pub type XfnType = fn(&mut State) -> Xresult;
pub type Xint = i64;

#[derive(Clone, Copy)]
pub struct XfnPtr(pub XfnType);

// Identity is the function address. Distinct primitives with identical
// bodies may share one address after codegen and then compare equal.
impl PartialEq for XfnPtr {
    fn eq(&self, other: &Self) -> bool {
        (self.0 as usize) == (other.0 as usize)
    }
}

impl fmt::Debug for XfnPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0 as usize)
    }
}

/// Executable operation stored in the dictionary and threaded into the heap.
#[derive(Clone, Copy, PartialEq)]
pub enum Xfn {
    /// Built-in behavior.
    Native(XfnPtr),
    /// Definition body starting at the heap address.
    Interp(usize),
    /// Terminates a threaded body.
    Exit,
}

impl fmt::Debug for Xfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Xfn::Native(x) => write!(f, "xf:{:?}", x),
            Xfn::Interp(a) => write!(f, "xt_{}", a),
            Xfn::Exit => f.write_str("exit"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub enum Cell {
    Int(Xint),
    Flag(bool),
    Fun(Xfn),
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Flag(x) => write!(f, "{}", if *x { "true" } else { "false" }),
            Cell::Fun(x) => write!(f, "{:?}", x),
        }
    }
}

const INT_TYPE_NAME: &str = "int";
const FLAG_TYPE_NAME: &str = "flag";
const FUN_TYPE_NAME: &str = "fun";

impl Cell {
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Int { .. } => INT_TYPE_NAME,
            Cell::Flag { .. } => FLAG_TYPE_NAME,
            Cell::Fun { .. } => FUN_TYPE_NAME,
        }
    }

    fn type_error(&self, expected: &'static str) -> Xerr {
        Xerr::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    pub fn to_int(&self) -> Xresult1<Xint> {
        match self {
            Cell::Int(x) => Ok(*x),
            _ => Err(self.type_error(INT_TYPE_NAME)),
        }
    }

    pub fn to_flag(&self) -> Xresult1<bool> {
        match self {
            Cell::Flag(x) => Ok(*x),
            _ => Err(self.type_error(FLAG_TYPE_NAME)),
        }
    }

    pub fn to_fn(&self) -> Xresult1<Xfn> {
        match self {
            Cell::Fun(x) => Ok(*x),
            _ => Err(self.type_error(FUN_TYPE_NAME)),
        }
    }

    /// Heap index, negative integers are never valid.
    pub fn to_address(&self) -> Xresult1<usize> {
        let n = self.to_int()?;
        if n < 0 {
            Err(Xerr::InvalidAddress)
        } else {
            Ok(n as usize)
        }
    }

    /// Equality of two values of the same kind.
    pub fn same_kind_eq(&self, other: &Cell) -> Xresult1<bool> {
        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => Ok(a == b),
            (Cell::Flag(a), Cell::Flag(b)) => Ok(a == b),
            (Cell::Fun(a), Cell::Fun(b)) => Ok(a == b),
            _ => Err(other.type_error(self.type_name())),
        }
    }
}

impl From<Xint> for Cell {
    fn from(x: Xint) -> Self {
        Cell::Int(x)
    }
}

impl From<usize> for Cell {
    fn from(x: usize) -> Self {
        Cell::Int(x as Xint)
    }
}

impl From<bool> for Cell {
    fn from(x: bool) -> Self {
        if x {
            TRUE
        } else {
            FALSE
        }
    }
}

impl From<Xfn> for Cell {
    fn from(x: Xfn) -> Self {
        Cell::Fun(x)
    }
}

pub const ZERO: Cell = Cell::Int(0);
pub const TRUE: Cell = Cell::Flag(true);
pub const FALSE: Cell = Cell::Flag(false);
pub const EXIT: Cell = Cell::Fun(Xfn::Exit);

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_: &mut State) -> Xresult {
        crate::error::OK
    }

    #[test]
    fn test_cell_casts() {
        assert_eq!(Ok(5), Cell::Int(5).to_int());
        assert_eq!(Ok(true), TRUE.to_flag());
        assert_eq!(Ok(Xfn::Exit), EXIT.to_fn());
        assert_eq!(
            Err(Xerr::TypeMismatch { expected: "int", found: "flag" }),
            FALSE.to_int()
        );
        assert_eq!(
            Err(Xerr::TypeMismatch { expected: "flag", found: "int" }),
            ZERO.to_flag()
        );
        assert_eq!(
            Err(Xerr::TypeMismatch { expected: "fun", found: "int" }),
            Cell::Int(1).to_fn()
        );
        assert_eq!(Ok(12), Cell::Int(12).to_address());
        assert_eq!(Err(Xerr::InvalidAddress), Cell::Int(-1).to_address());
    }

    #[test]
    fn test_cell_eq() {
        assert_eq!(Ok(true), Cell::Int(2).same_kind_eq(&Cell::Int(2)));
        assert_eq!(Ok(false), TRUE.same_kind_eq(&FALSE));
        let f = Cell::Fun(Xfn::Native(XfnPtr(nop)));
        assert_eq!(Ok(true), f.same_kind_eq(&f.clone()));
        assert_eq!(Ok(false), f.same_kind_eq(&EXIT));
        assert_eq!(Ok(false), Cell::Fun(Xfn::Interp(1)).same_kind_eq(&Cell::Fun(Xfn::Interp(2))));
        assert!(Cell::Int(1).same_kind_eq(&TRUE).is_err());
    }

    #[test]
    fn test_cell_format() {
        assert_eq!("-7", format!("{:?}", Cell::Int(-7)));
        assert_eq!("true", format!("{:?}", TRUE));
        assert_eq!("xt_42", format!("{:?}", Cell::Fun(Xfn::Interp(42))));
        assert_eq!("exit", format!("{:?}", EXIT));
    }
}
