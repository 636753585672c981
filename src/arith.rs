use crate::cell::*;
use crate::error::*;
use crate::state::*;

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("+", core_word_add)?;
    xs.defword("-", core_word_sub)?;
    xs.defword("*", core_word_mul)?;
    xs.defword("/", core_word_div)?;
    xs.defword("and", core_word_and)?;
    xs.defword("or", core_word_or)?;
    xs.defword("not", core_word_not)?;
    xs.defword("=", core_word_eq)?;
    xs.defword("<", core_word_less_than)?;
    xs.defword("true", |xs| xs.push_data(TRUE))?;
    xs.defword("false", |xs| xs.push_data(FALSE))?;
    OK
}

// ( a b -- a`op`b )
fn arithmetic_ops_int(xs: &mut State, ops_int: fn(Xint, Xint) -> Xint) -> Xresult {
    let b = xs.pop_data()?.to_int()?;
    let a = xs.pop_data()?.to_int()?;
    xs.push_data(Cell::Int(ops_int(a, b)))
}

fn logic_ops(xs: &mut State, ops: fn(bool, bool) -> bool) -> Xresult {
    let b = xs.pop_data()?.to_flag()?;
    let a = xs.pop_data()?.to_flag()?;
    xs.push_data(Cell::from(ops(a, b)))
}

pub fn core_word_add(xs: &mut State) -> Xresult {
    arithmetic_ops_int(xs, Xint::wrapping_add)
}

pub fn core_word_sub(xs: &mut State) -> Xresult {
    arithmetic_ops_int(xs, Xint::wrapping_sub)
}

pub fn core_word_mul(xs: &mut State) -> Xresult {
    arithmetic_ops_int(xs, Xint::wrapping_mul)
}

pub fn core_word_div(xs: &mut State) -> Xresult {
    let b = xs.pop_data()?.to_int()?;
    let a = xs.pop_data()?.to_int()?;
    if b == 0 {
        return Err(Xerr::DivideByZero);
    }
    xs.push_data(Cell::Int(a.wrapping_div(b)))
}

pub fn core_word_and(xs: &mut State) -> Xresult {
    logic_ops(xs, |a, b| a & b)
}

pub fn core_word_or(xs: &mut State) -> Xresult {
    logic_ops(xs, |a, b| a | b)
}

pub fn core_word_not(xs: &mut State) -> Xresult {
    let t = xs.pop_data()?.to_flag()?;
    xs.push_data(Cell::from(!t))
}

pub fn core_word_eq(xs: &mut State) -> Xresult {
    let b = xs.pop_data()?;
    let a = xs.pop_data()?;
    let t = a.same_kind_eq(&b)?;
    xs.push_data(Cell::from(t))
}

// top is popped first and compared as `top > second`
pub fn core_word_less_than(xs: &mut State) -> Xresult {
    let top = xs.pop_data()?.to_int()?;
    let second = xs.pop_data()?.to_int()?;
    xs.push_data(Cell::from(top > second))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_pop(xs: &mut State, src: &str) -> Cell {
        xs.eval(src).unwrap();
        xs.pop_data().unwrap()
    }

    #[test]
    fn test_arith() {
        let mut xs = State::new(64).unwrap();
        assert_eq!(Cell::Int(3), eval_pop(&mut xs, "1 2 +"));
        assert_eq!(Cell::Int(12), eval_pop(&mut xs, "3 4 *"));
        assert_eq!(Cell::Int(4), eval_pop(&mut xs, "6 2 -"));
        assert_eq!(Cell::Int(-3), eval_pop(&mut xs, "7 10 -"));
        assert_eq!(Cell::Int(2), eval_pop(&mut xs, "100 50 /"));
        assert_eq!(Cell::Int(-3), eval_pop(&mut xs, "-7 2 /"));
        assert_eq!(Cell::Int(14), eval_pop(&mut xs, "3 4 * 2 +"));
        assert_eq!(Cell::Int(Xint::MIN), eval_pop(&mut xs, "9223372036854775807 1 +"));
        assert_eq!(0, xs.data_depth());
    }

    #[test]
    fn test_arith_errors() {
        let mut xs = State::new(64).unwrap();
        assert_eq!(Err(Xerr::StackUnderflow), xs.eval("+"));
        assert_eq!(0, xs.data_depth());
        assert_eq!(Err(Xerr::StackUnderflow), xs.eval("1 +"));
        assert_eq!(Err(Xerr::DivideByZero), xs.eval("1 0 /"));
        assert_eq!(
            Err(Xerr::TypeMismatch { expected: "int", found: "flag" }),
            xs.eval("1 true +")
        );
        assert_eq!(
            Err(Xerr::TypeMismatch { expected: "flag", found: "int" }),
            xs.eval("1 true and")
        );
    }

    #[test]
    fn test_logic() {
        let mut xs = State::new(64).unwrap();
        let table = [
            ("true true", true, true),
            ("true false", false, true),
            ("false true", false, true),
            ("false false", false, false),
        ];
        for (args, and, or) in table.iter() {
            assert_eq!(Cell::from(*and), eval_pop(&mut xs, &format!("{} and", args)));
            assert_eq!(Cell::from(*or), eval_pop(&mut xs, &format!("{} or", args)));
        }
        assert_eq!(FALSE, eval_pop(&mut xs, "true not"));
        assert_eq!(TRUE, eval_pop(&mut xs, "false not"));
    }

    #[test]
    fn test_compare() {
        let mut xs = State::new(64).unwrap();
        assert_eq!(TRUE, eval_pop(&mut xs, "10 20 <"));
        assert_eq!(FALSE, eval_pop(&mut xs, "10 10 <"));
        assert_eq!(FALSE, eval_pop(&mut xs, "13 10 <"));
        assert_eq!(FALSE, eval_pop(&mut xs, "1 2 ="));
        assert_eq!(TRUE, eval_pop(&mut xs, "2 2 ="));
        assert_eq!(TRUE, eval_pop(&mut xs, "false false ="));
        assert_eq!(TRUE, eval_pop(&mut xs, "here here ="));
        assert!(xs.eval("1 true =").is_err());
        assert_eq!(
            Err(Xerr::TypeMismatch { expected: "int", found: "flag" }),
            xs.eval("true 1 <")
        );
    }
}
