// Built-in numeric functions and constants

use super::eval::CellError;

/// Named constants recognized by the parser.
///
/// These are folded into number literals at parse time and are therefore
/// never cell references. Names must be uppercase (as produced by the
/// tokenizer).
pub fn constant(name: &str) -> Option<f64> {
    Some(match name {
        "PI" => std::f64::consts::PI,
        "E" => std::f64::consts::E,
        "TAU" => std::f64::consts::TAU,
        "INF" => f64::INFINITY,
        "NAN" => f64::NAN,
        _ => return None,
    })
}

/// Check if a function name is a known built-in.
/// This is the single source of truth for supported functions.
pub fn is_known_function(name: &str) -> bool {
    arity(name).is_some()
}

/// Fixed argument count for each built-in function.
/// Function names must be uppercase (as produced by the tokenizer).
pub fn arity(name: &str) -> Option<usize> {
    Some(match name {
        // Number-theoretic and representation
        "ABS" | "FLOOR" | "CEIL" | "ROUND" | "TRUNC" | "SIGN" | "FACT" |
        // Exponential and logarithmic
        "SQRT" | "EXP" | "LN" | "LOG10" | "LOG2" |
        // Trigonometric and hyperbolic
        "SIN" | "COS" | "TAN" | "ASIN" | "ACOS" | "ATAN" |
        "SINH" | "COSH" | "TANH" |
        // Angular conversion
        "DEGREES" | "RADIANS" => 1,

        "POW" | "ATAN2" | "HYPOT" | "FMOD" | "MIN" | "MAX" | "GCD" => 2,

        "IF" => 3,

        _ => return None,
    })
}

/// Dispatch a call to a built-in function.
///
/// Unknown names and wrong argument counts yield `InvalidFunction`;
/// arguments outside a function's domain yield `DomainError`. Non-finite
/// results (overflow to infinity, NaN from POW) are legitimate values and
/// pass through unchanged.
pub fn call(name: &str, args: &[f64]) -> Result<f64, CellError> {
    let expected = arity(name).ok_or(CellError::InvalidFunction)?;
    if args.len() != expected {
        return Err(CellError::InvalidFunction);
    }

    let result = match name {
        "ABS" => args[0].abs(),
        "FLOOR" => args[0].floor(),
        "CEIL" => args[0].ceil(),
        "ROUND" => args[0].round(),
        "TRUNC" => args[0].trunc(),
        "SIGN" => {
            let x = args[0];
            if x == 0.0 { 0.0 } else { x.signum() }
        }
        "FACT" => fact(args[0])?,

        "SQRT" => {
            if args[0] < 0.0 {
                return Err(CellError::Domain);
            }
            args[0].sqrt()
        }
        "EXP" => args[0].exp(),
        "LN" => log_checked(args[0], f64::ln)?,
        "LOG10" => log_checked(args[0], f64::log10)?,
        "LOG2" => log_checked(args[0], f64::log2)?,

        "SIN" => args[0].sin(),
        "COS" => args[0].cos(),
        "TAN" => args[0].tan(),
        "ASIN" => {
            if args[0].abs() > 1.0 {
                return Err(CellError::Domain);
            }
            args[0].asin()
        }
        "ACOS" => {
            if args[0].abs() > 1.0 {
                return Err(CellError::Domain);
            }
            args[0].acos()
        }
        "ATAN" => args[0].atan(),
        "SINH" => args[0].sinh(),
        "COSH" => args[0].cosh(),
        "TANH" => args[0].tanh(),

        "DEGREES" => args[0].to_degrees(),
        "RADIANS" => args[0].to_radians(),

        "POW" => args[0].powf(args[1]),
        "ATAN2" => args[0].atan2(args[1]),
        "HYPOT" => args[0].hypot(args[1]),
        "FMOD" => {
            if args[1] == 0.0 {
                return Err(CellError::Domain);
            }
            args[0] % args[1]
        }
        "MIN" => args[0].min(args[1]),
        "MAX" => args[0].max(args[1]),
        "GCD" => gcd(args[0], args[1])?,

        // Condition is numeric: nonzero selects the second argument.
        // All three arguments are evaluated eagerly by the caller, so an
        // error in the untaken branch still propagates.
        "IF" => {
            if args[0] != 0.0 { args[1] } else { args[2] }
        }

        _ => unreachable!("arity() and call() must agree on known functions"),
    };

    Ok(result)
}

fn log_checked(x: f64, log: fn(f64) -> f64) -> Result<f64, CellError> {
    if x <= 0.0 {
        return Err(CellError::Domain);
    }
    Ok(log(x))
}

/// Factorial of a non-negative integer. Overflows to infinity for large
/// inputs, which is a value, not an error.
fn fact(x: f64) -> Result<f64, CellError> {
    if x < 0.0 || x.fract() != 0.0 || x.is_nan() {
        return Err(CellError::Domain);
    }
    if x.is_infinite() {
        return Ok(f64::INFINITY);
    }
    let mut result = 1.0f64;
    let mut k = 2.0f64;
    while k <= x && result.is_finite() {
        result *= k;
        k += 1.0;
    }
    Ok(result)
}

/// Greatest common divisor of two integral values.
fn gcd(x: f64, y: f64) -> Result<f64, CellError> {
    if !x.is_finite() || !y.is_finite() || x.fract() != 0.0 || y.fract() != 0.0 {
        return Err(CellError::Domain);
    }
    let mut a = x.abs();
    let mut b = y.abs();
    while b > 0.0 {
        let r = a % b;
        a = b;
        b = r;
    }
    Ok(a)
}
