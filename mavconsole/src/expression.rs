//! Custom display expressions.
//!
//! Users may add status entries computed from message fields, e.g.
//! `SYS_STATUS.voltage_battery*0.001` formatted with `%.2fV`. Expressions
//! use a small arithmetic grammar over `MESSAGE.field` references; nothing
//! else can be executed.
//!
//! # Grammar
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/" | "%") unary)*
//! unary   := "-" unary | power
//! power   := primary ("**" unary)?
//! primary := NUMBER | MESSAGE "." FIELD | FUNC "(" expr ("," expr)* ")" | "(" expr ")"
//! ```
//!
//! Functions: `abs`, `min`, `max`, `sqrt`, `degrees`, `radians`. `%` is a
//! floored remainder: the result takes the sign of the divisor.

use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write as _;

use crate::error::ExpressionError;
use crate::store::FieldSource;

/// Default row for user-added entries.
pub const DEFAULT_DISPLAY_ROW: u8 = 4;

/// Text shown when an expression cannot be evaluated.
pub const EVAL_FAILED_TEXT: &str = "????";

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Field { message: String, field: String },
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call { function: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
                let mut exp = pos + 1;
                if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                    exp += 1;
                }
                if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    pos = exp;
                    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
            }
            let text = &source[start..pos];
            let value = text.parse::<f64>().map_err(|_| ExpressionError::Parse {
                position: start,
                message: format!("bad number '{}'", text),
            })?;
            tokens.push((start, Token::Number(value)));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push((start, Token::Ident(source[start..pos].to_string())));
            continue;
        }

        let token = match c {
            '.' => Token::Dot,
            ',' => Token::Comma,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 1;
                Token::StarStar
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            other => {
                return Err(ExpressionError::Parse {
                    position: start,
                    message: format!("unexpected character '{}'", other),
                })
            }
        };
        pos += 1;
        tokens.push((start, token));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    index: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .map(|(p, _)| *p)
            .unwrap_or(self.end)
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Parse {
            position: self.position(),
            message: message.into(),
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(_, t)| t.clone());
        self.index += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ExpressionError> {
        if self.peek() == Some(&expected) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.index += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.index += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::Minus) {
            self.index += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::StarStar) {
            self.index += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let position = self.position();
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::Dot) {
                    self.index += 1;
                    match self.next() {
                        Some(Token::Ident(field)) => Ok(Expr::Field {
                            message: name,
                            field,
                        }),
                        _ => Err(ExpressionError::Parse {
                            position,
                            message: format!("expected field name after '{}.'", name),
                        }),
                    }
                } else if self.peek() == Some(&Token::LParen) {
                    self.index += 1;
                    let mut args = vec![self.expr()?];
                    while self.peek() == Some(&Token::Comma) {
                        self.index += 1;
                        args.push(self.expr()?);
                    }
                    self.expect(Token::RParen, "')'")?;
                    Ok(Expr::Call {
                        function: name,
                        args,
                    })
                } else {
                    Err(ExpressionError::Parse {
                        position,
                        message: format!("bare name '{}' (use MESSAGE.field)", name),
                    })
                }
            }
            Some(_) => Err(ExpressionError::Parse {
                position,
                message: "unexpected token".to_string(),
            }),
            None => Err(ExpressionError::Parse {
                position,
                message: "unexpected end of expression".to_string(),
            }),
        }
    }
}

impl Expr {
    /// Parse an expression.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            index: 0,
            end: source.len(),
        };
        let expr = parser.expr()?;
        if parser.peek().is_some() {
            return Err(parser.error("trailing input"));
        }
        Ok(expr)
    }

    /// Message names referenced by field lookups.
    pub fn message_types(&self) -> BTreeSet<String> {
        let mut types = BTreeSet::new();
        self.collect_types(&mut types);
        types
    }

    fn collect_types(&self, types: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Field { message, .. } => {
                types.insert(message.clone());
            }
            Expr::Neg(inner) => inner.collect_types(types),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_types(types);
                rhs.collect_types(types);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_types(types)),
        }
    }

    /// Evaluate against the latest known fields.
    pub fn evaluate(&self, fields: &dyn FieldSource) -> Result<f64, ExpressionError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Field { message, field } => fields.field(message, field),
            Expr::Neg(inner) => Ok(-inner.evaluate(fields)?),
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.evaluate(fields)?;
                let b = rhs.evaluate(fields)?;
                match op {
                    BinaryOp::Add => Ok(a + b),
                    BinaryOp::Sub => Ok(a - b),
                    BinaryOp::Mul => Ok(a * b),
                    BinaryOp::Div if b == 0.0 => Err(ExpressionError::DivisionByZero),
                    BinaryOp::Div => Ok(a / b),
                    BinaryOp::Rem if b == 0.0 => Err(ExpressionError::DivisionByZero),
                    BinaryOp::Rem => Ok(floored_rem(a, b)),
                    BinaryOp::Pow => Ok(a.powf(b)),
                }
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|a| a.evaluate(fields))
                    .collect::<Result<Vec<_>, _>>()?;
                call(function, &values)
            }
        }
    }
}

/// Remainder with the sign of the divisor, so `-7 % 3` is `2`.
fn floored_rem(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn call(function: &str, args: &[f64]) -> Result<f64, ExpressionError> {
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(ExpressionError::Arity {
            function: function.to_string(),
            expected: "1",
            found: args.len(),
        }),
    };

    match function {
        "abs" => unary(f64::abs),
        "sqrt" => unary(f64::sqrt),
        "degrees" => unary(f64::to_degrees),
        "radians" => unary(f64::to_radians),
        "min" | "max" => {
            if args.is_empty() {
                return Err(ExpressionError::Arity {
                    function: function.to_string(),
                    expected: "1+",
                    found: 0,
                });
            }
            let pick = if function == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().fold(args[0], |acc, &v| pick(acc, v)))
        }
        other => Err(ExpressionError::UnknownFunction(other.to_string())),
    }
}

/// A parsed `%` conversion of a display format.
#[derive(Debug, Clone, Default, PartialEq)]
struct Conversion {
    left_align: bool,
    zero_pad: bool,
    plus_sign: bool,
    width: Option<usize>,
    precision: Option<usize>,
    kind: char,
}

/// Render `value` through a printf-style `format` with one conversion.
///
/// Supports `%d %i %u %x %f %e %g %s` with `-`, `0`, `+`, width and
/// precision; `%%` is a literal percent sign. A format without any
/// conversion is returned unchanged.
pub fn format_value(format: &str, value: f64) -> Result<String, ExpressionError> {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    let mut used = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        if used {
            return Err(ExpressionError::Format(
                "only one conversion is supported".to_string(),
            ));
        }

        let mut conv = Conversion::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => conv.left_align = true,
                '0' => conv.zero_pad = true,
                '+' => conv.plus_sign = true,
                _ => break,
            }
            chars.next();
        }
        let mut width = String::new();
        while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            width.push(d);
            chars.next();
        }
        if !width.is_empty() {
            conv.width = width.parse().ok();
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                precision.push(d);
                chars.next();
            }
            conv.precision = Some(precision.parse().unwrap_or(0));
        }
        conv.kind = chars
            .next()
            .ok_or_else(|| ExpressionError::Format("incomplete conversion".to_string()))?;

        out.push_str(&render(&conv, value)?);
        used = true;
    }

    Ok(out)
}

fn render(conv: &Conversion, value: f64) -> Result<String, ExpressionError> {
    let mut body = match conv.kind {
        'd' | 'i' | 'u' | 'x' if !value.is_finite() => {
            return Err(ExpressionError::Format(format!(
                "cannot convert {} to integer",
                value
            )))
        }
        'd' | 'i' | 'u' => format!("{}", value.trunc() as i64),
        'x' => {
            let sign = if value <= -1.0 { "-" } else { "" };
            format!("{}{:x}", sign, value.trunc().abs() as u64)
        }
        'f' | 'F' | 'e' | 'g' if !value.is_finite() => non_finite(value),
        'f' | 'F' => format!("{:.*}", conv.precision.unwrap_or(6), value),
        'e' => exponent_form(value, conv.precision.unwrap_or(6)),
        'g' => general_form(value, conv.precision.unwrap_or(6)),
        's' => {
            let text = if value.is_finite() {
                repr_form(value)
            } else {
                non_finite(value)
            };
            match conv.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            }
        }
        other => {
            return Err(ExpressionError::Format(format!(
                "unsupported conversion '%{}'",
                other
            )))
        }
    };

    if conv.plus_sign && conv.kind != 's' && !body.starts_with('-') {
        body.insert(0, '+');
    }

    let width = conv.width.unwrap_or(0);
    let len = body.chars().count();
    if len >= width {
        return Ok(body);
    }
    let pad = width - len;
    if conv.left_align {
        body.push_str(&" ".repeat(pad));
    } else if conv.zero_pad && conv.kind != 's' && value.is_finite() {
        let sign_len = usize::from(body.starts_with(['-', '+']));
        body.insert_str(sign_len, &"0".repeat(pad));
    } else {
        body.insert_str(0, &" ".repeat(pad));
    }
    Ok(body)
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

/// Split Rust's `LowerExp` output (`1.5e-3`) into mantissa and exponent.
fn split_exponent(text: &str) -> (&str, i32) {
    match text.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (text, 0),
    }
}

fn join_exponent(mantissa: &str, exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
}

/// `%e`: exponent carries a sign and at least two digits.
fn exponent_form(value: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, value);
    let (mantissa, exp) = split_exponent(&text);
    join_exponent(mantissa, exp)
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// `%g`: fixed or exponent form depending on the decimal exponent after
/// rounding to `precision` significant digits, trailing zeros removed.
fn general_form(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    let rounded = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = split_exponent(&rounded);
    if exp >= -4 && exp < precision as i32 {
        let decimals = (precision as i32 - 1 - exp) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    } else {
        join_exponent(strip_fraction_zeros(mantissa), exp)
    }
}

/// `%s`: shortest round-trip text, always with a fractional part, using
/// exponent form outside `1e-4 ..< 1e16`.
fn repr_form(value: f64) -> String {
    let shortest = format!("{:e}", value);
    let (mantissa, exp) = split_exponent(&shortest);
    if !(-4..16).contains(&exp) {
        return join_exponent(mantissa, exp);
    }

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let mut out = String::from(sign);
    if exp < 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exp - 1) as usize));
        out.push_str(&digits);
    } else {
        let int_len = exp as usize + 1;
        if digits.len() <= int_len {
            let _ = write!(out, "{}{}.0", digits, "0".repeat(int_len - digits.len()));
        } else {
            let _ = write!(out, "{}.{}", &digits[..int_len], &digits[int_len..]);
        }
    }
    out
}

/// A user-registered status entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    /// Status key the result is shown under.
    pub id: String,
    /// printf-style format.
    pub format: String,
    /// Source text of the expression.
    pub source: String,
    pub expr: Expr,
    pub row: u8,
    /// Message types whose arrival triggers re-evaluation.
    pub message_types: BTreeSet<String>,
}

impl DisplayItem {
    /// Parse a display item. Surrounding quotes on `format` and
    /// `expression` are stripped.
    pub fn new(
        id: impl Into<String>,
        format: &str,
        expression: &str,
        row: u8,
    ) -> Result<Self, ExpressionError> {
        let format = strip_quotes(format).to_string();
        let source = strip_quotes(expression).to_string();
        let expr = Expr::parse(&source)?;
        let message_types = expr.message_types();
        Ok(Self {
            id: id.into(),
            format,
            source,
            expr,
            row,
            message_types,
        })
    }

    /// Whether a message named `message` should trigger re-evaluation.
    pub fn references(&self, message: &str) -> bool {
        self.message_types.contains(message)
    }

    /// Evaluate and format.
    pub fn render(&self, fields: &dyn FieldSource) -> Result<String, ExpressionError> {
        let value = self.expr.evaluate(fields)?;
        format_value(&self.format, value)
    }
}

impl fmt::Display for DisplayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : FMT={} EXPR={} ROW={}",
            self.id, self.format, self.source, self.row
        )
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fields(entries: &[(&str, &str, f64)]) -> HashMap<(String, String), f64> {
        entries
            .iter()
            .map(|(m, f, v)| ((m.to_string(), f.to_string()), *v))
            .collect()
    }

    fn eval(
        source: &str,
        source_fields: &HashMap<(String, String), f64>,
    ) -> Result<f64, ExpressionError> {
        Expr::parse(source)?.evaluate(source_fields)
    }

    #[test]
    fn test_arithmetic_precedence() {
        let empty = fields(&[]);
        assert_eq!(eval("1 + 2 * 3", &empty), Ok(7.0));
        assert_eq!(eval("(1 + 2) * 3", &empty), Ok(9.0));
        assert_eq!(eval("-2 ** 2", &empty), Ok(-4.0));
        assert_eq!(eval("2 ** 3 ** 2", &empty), Ok(512.0));
        assert_eq!(eval("7 % 4 - 1", &empty), Ok(2.0));
        assert_eq!(eval("1.5e2 / .5", &empty), Ok(300.0));
    }

    #[test]
    fn test_remainder_takes_divisor_sign() {
        let empty = fields(&[]);
        assert_eq!(eval("-7 % 3", &empty), Ok(2.0));
        assert_eq!(eval("7 % -3", &empty), Ok(-2.0));
        assert_eq!(eval("-7 % -3", &empty), Ok(-1.0));
        assert_eq!(eval("5.5 % 2", &empty), Ok(1.5));
        assert_eq!(eval("-6 % 3", &empty), Ok(0.0));
        assert_eq!(eval("1 % 0", &empty), Err(ExpressionError::DivisionByZero));
    }

    #[test]
    fn test_field_lookup_and_functions() {
        let f = fields(&[
            ("SYS_STATUS", "voltage_battery", 12_600.0),
            ("ATTITUDE", "roll", -0.5),
            ("VFR_HUD", "airspeed", 21.0),
            ("VFR_HUD", "groundspeed", 19.0),
        ]);
        assert_eq!(eval("SYS_STATUS.voltage_battery*0.001", &f), Ok(12.6));
        assert_eq!(eval("abs(degrees(ATTITUDE.roll))", &f).map(|v| v.round()), Ok(29.0));
        assert_eq!(eval("max(VFR_HUD.airspeed, VFR_HUD.groundspeed, 3)", &f), Ok(21.0));
        assert_eq!(eval("min(VFR_HUD.airspeed, VFR_HUD.groundspeed)", &f), Ok(19.0));
        assert_eq!(eval("sqrt(16)", &f), Ok(4.0));
    }

    #[test]
    fn test_evaluation_errors() {
        let f = fields(&[("VFR_HUD", "airspeed", 0.0)]);
        assert_eq!(eval("1 / VFR_HUD.airspeed", &f), Err(ExpressionError::DivisionByZero));
        assert!(matches!(
            eval("VFR_HUD.heading", &f),
            Err(ExpressionError::MissingField { .. })
        ));
        assert_eq!(
            eval("launch(1)", &f),
            Err(ExpressionError::UnknownFunction("launch".to_string()))
        );
        assert!(matches!(eval("abs(1, 2)", &f), Err(ExpressionError::Arity { .. })));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "1 +", "(1", "VFR_HUD.", "airspeed", "1 2", "a.b $ 3", "import os"] {
            assert!(
                matches!(Expr::parse(bad), Err(ExpressionError::Parse { .. })),
                "'{}' should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_message_types() {
        let expr =
            Expr::parse("VFR_HUD.airspeed - max(GPS_RAW_INT.vel * 0.01, VFR_HUD.groundspeed)")
                .unwrap();
        let types: Vec<_> = expr.message_types().into_iter().collect();
        assert_eq!(types, vec!["GPS_RAW_INT".to_string(), "VFR_HUD".to_string()]);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value("%.2fV", 12.6).unwrap(), "12.60V");
        assert_eq!(format_value("Sats %u", 9.7).unwrap(), "Sats 9");
        assert_eq!(format_value("%5.1f", 3.14159).unwrap(), "  3.1");
        assert_eq!(format_value("%-5d|", 42.0).unwrap(), "42   |");
        assert_eq!(format_value("%05d", -42.0).unwrap(), "-0042");
        assert_eq!(format_value("%+d", 3.0).unwrap(), "+3");
        assert_eq!(format_value("%x", 255.0).unwrap(), "ff");
        assert_eq!(format_value("%d%%", 55.0).unwrap(), "55%");
        assert_eq!(format_value("%s", 1.5).unwrap(), "1.5");
        assert_eq!(format_value("static", 1.0).unwrap(), "static");
    }

    #[test]
    fn test_format_conversions() {
        let cases: &[(&str, f64, &str)] = &[
            ("%d", -3.9, "-3"),
            ("%i", 42.2, "42"),
            ("%u", 7.0, "7"),
            ("%x", 255.0, "ff"),
            ("%x", -5.0, "-5"),
            ("%+x", 10.0, "+a"),
            ("%04x", 10.0, "000a"),
            ("%f", 2.5, "2.500000"),
            ("%+08.2f", 3.14159, "+0003.14"),
            ("%+08.2f", -3.14159, "-0003.14"),
            ("%e", 1234.5, "1.234500e+03"),
            ("%.2e", -0.000123, "-1.23e-04"),
            ("%.0e", 5.0e100, "5e+100"),
            ("%g", 100.0, "100"),
            ("%g", 0.0, "0"),
            ("%.2g", 3.14159, "3.1"),
            ("%g", 0.00001, "1e-05"),
            ("%g", 0.0001, "0.0001"),
            ("%g", 1234567.0, "1.23457e+06"),
            ("%g", 123456.0, "123456"),
            ("%.3g", 2.5e-7, "2.5e-07"),
            ("%s", 1.0, "1.0"),
            ("%s", 1234.5, "1234.5"),
            ("%s", 0.001, "0.001"),
            ("%s", 0.00001, "1e-05"),
            ("%s", 1e16, "1e+16"),
            ("%.3s", 3.14159, "3.1"),
            ("%6s|", 2.5, "   2.5|"),
        ];
        for (format, value, expected) in cases {
            assert_eq!(
                format_value(format, *value).as_deref(),
                Ok(*expected),
                "format_value({:?}, {})",
                format,
                value
            );
        }
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_value("%.1f", f64::NAN).unwrap(), "nan");
        assert_eq!(format_value("%e", f64::INFINITY).unwrap(), "inf");
        assert_eq!(format_value("%5g", f64::NEG_INFINITY).unwrap(), " -inf");
        assert_eq!(format_value("%s", f64::NAN).unwrap(), "nan");
        assert!(format_value("%d", f64::NAN).is_err());
        assert!(format_value("%x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_format_errors() {
        assert!(format_value("%q", 1.0).is_err());
        assert!(format_value("%d %d", 1.0).is_err());
        assert!(format_value("%", 1.0).is_err());
    }

    #[test]
    fn test_display_item_strips_quotes() {
        let item = DisplayItem::new("Batt", "\"%.1f\"", "'SYS_STATUS.voltage_battery*0.001'", 4)
            .unwrap();
        assert_eq!(item.format, "%.1f");
        assert_eq!(item.source, "SYS_STATUS.voltage_battery*0.001");
        assert!(item.references("SYS_STATUS"));
        assert!(!item.references("VFR_HUD"));

        let f = fields(&[("SYS_STATUS", "voltage_battery", 11_840.0)]);
        assert_eq!(item.render(&f).unwrap(), "11.8");
        assert_eq!(
            item.to_string(),
            "Batt : FMT=%.1f EXPR=SYS_STATUS.voltage_battery*0.001 ROW=4"
        );
    }
}
