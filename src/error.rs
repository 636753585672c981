use crate::cell::Xstr;

use std::fmt;

#[derive(PartialEq, Clone)]
pub enum Xerr {
    UndefinedWord(Xstr),
    StackUnderflow,
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    DivideByZero,
    HeapOverflow,
    ReturnStackOverflow,
    InvalidAddress,
    ExpectingName,
    IOError { filename: Xstr, reason: Xstr },
}

impl fmt::Debug for Xerr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Xerr::UndefinedWord(s) => write!(f, "undefined word {}", s),
            Xerr::StackUnderflow => f.write_str("StackUnderflow"),
            Xerr::TypeMismatch { expected, found } => {
                write!(f, "type mismatch, expected {} but got {}", expected, found)
            }
            Xerr::DivideByZero => f.write_str("division by zero"),
            Xerr::HeapOverflow => f.write_str("HeapOverflow"),
            Xerr::ReturnStackOverflow => f.write_str("ReturnStackOverflow"),
            Xerr::InvalidAddress => f.write_str("InvalidAddress"),
            Xerr::ExpectingName => f.write_str("ExpectingName"),
            Xerr::IOError { filename, reason } => write!(f, "{}: {}", filename, reason),
        }
    }
}

impl fmt::Display for Xerr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Xerr {}

pub type Xresult = Xresult1<()>;

pub type Xresult1<T> = Result<T, Xerr>;

pub const OK: Xresult = Ok(());
