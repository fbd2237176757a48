//! Expression languages compiled into predicates when a subscription is made.
//!
//! - `simple`: comparisons over `${body}` and `${header.NAME}` joined with `&&`, `||`, `!`
//!   and parentheses, e.g. `${body} regex '\d+' && ${header.kind} == 'number'`.
//! - `constant`: `true` or `false`.
//! - `header`: true when the named header is present and neither empty nor `false`.
//! - `regex`: the whole body matches the pattern.
//!
//! `regex` operators and the `regex` language always match the complete value.

use crate::message::Message;
use crate::routing::predicate::{
    ConstantPredicate, Predicate, PredicateError, PredicateResolveError,
};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::Arc;

pub const SIMPLE: &str = "simple";
pub const CONSTANT: &str = "constant";
pub const HEADER: &str = "header";
pub const REGEX: &str = "regex";

/// Language used when a control request does not name one.
pub const DEFAULT_LANGUAGE: &str = SIMPLE;

pub(crate) fn compile(
    language: &str,
    expression: &str,
) -> Result<Arc<dyn Predicate>, PredicateResolveError> {
    let invalid = |reason: String| PredicateResolveError::InvalidExpression {
        language: language.to_string(),
        reason,
    };

    match language.trim().to_ascii_lowercase().as_str() {
        SIMPLE => {
            let node = Parser::new(tokenize(expression).map_err(invalid)?)
                .parse()
                .map_err(invalid)?;
            Ok(Arc::new(SimplePredicate { node }))
        }
        CONSTANT => match expression.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Arc::new(ConstantPredicate(true))),
            "false" => Ok(Arc::new(ConstantPredicate(false))),
            other => Err(invalid(format!("expected true or false, got '{other}'"))),
        },
        HEADER => {
            let name = expression.trim();
            if name.is_empty() {
                return Err(invalid("header name is empty".to_string()));
            }
            Ok(Arc::new(HeaderPredicate {
                name: name.to_string(),
            }))
        }
        REGEX => {
            let regex = full_match_regex(expression).map_err(invalid)?;
            Ok(Arc::new(BodyRegexPredicate { regex }))
        }
        _ => Err(PredicateResolveError::UnknownLanguage(language.to_string())),
    }
}

fn full_match_regex(pattern: &str) -> Result<Regex, String> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| err.to_string())
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case("false"))
}

fn as_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

struct HeaderPredicate {
    name: String,
}

impl Predicate for HeaderPredicate {
    fn matches(&self, message: &Message) -> Result<bool, PredicateError> {
        Ok(is_truthy(message.header(&self.name)))
    }
}

struct BodyRegexPredicate {
    regex: Regex,
}

impl Predicate for BodyRegexPredicate {
    fn matches(&self, message: &Message) -> Result<bool, PredicateError> {
        Ok(self.regex.is_match(message.body()))
    }
}

struct SimplePredicate {
    node: Node,
}

impl Predicate for SimplePredicate {
    fn matches(&self, message: &Message) -> Result<bool, PredicateError> {
        Ok(self.node.evaluate(message))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Function(String),
    Literal(String),
    Number(String),
    Word(String),
    Symbol(&'static str),
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        let next = chars.get(pos + 1).copied();

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        match ch {
            '$' if next == Some('{') => {
                let start = pos + 2;
                let end = chars[start..]
                    .iter()
                    .position(|c| *c == '}')
                    .map(|offset| start + offset)
                    .ok_or_else(|| format!("unterminated function at position {pos}"))?;
                let inner: String = chars[start..end].iter().collect();
                tokens.push(Token::Function(inner.trim().to_string()));
                pos = end + 1;
            }
            '\'' | '"' => {
                let quote = ch;
                let mut literal = String::new();
                let mut cursor = pos + 1;
                let mut closed = false;
                while cursor < chars.len() {
                    let current = chars[cursor];
                    if current == '\\' && chars.get(cursor + 1) == Some(&quote) {
                        literal.push(quote);
                        cursor += 2;
                    } else if current == quote {
                        closed = true;
                        break;
                    } else {
                        literal.push(current);
                        cursor += 1;
                    }
                }
                if !closed {
                    return Err(format!("unterminated literal at position {pos}"));
                }
                tokens.push(Token::Literal(literal));
                pos = cursor + 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Symbol("=="));
                pos += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Symbol("!="));
                pos += 2;
            }
            '!' => {
                tokens.push(Token::Symbol("!"));
                pos += 1;
            }
            '<' | '>' => {
                let symbol = match (ch, next) {
                    ('<', Some('=')) => "<=",
                    ('>', Some('=')) => ">=",
                    ('<', _) => "<",
                    _ => ">",
                };
                tokens.push(Token::Symbol(symbol));
                pos += symbol.len();
            }
            '&' if next == Some('&') => {
                tokens.push(Token::Symbol("&&"));
                pos += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Symbol("||"));
                pos += 2;
            }
            c if c.is_ascii_digit()
                || (c == '-' && next.map_or(false, |n| n.is_ascii_digit())) =>
            {
                let start = pos;
                pos += 1;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                tokens.push(Token::Number(chars[start..pos].iter().collect()));
            }
            c if c.is_alphabetic() => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                tokens.push(Token::Word(chars[start..pos].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}' at position {pos}")),
        }
    }

    Ok(tokens)
}

#[derive(Debug)]
enum Operand {
    Body,
    Header(String),
    Literal(String),
    Null,
}

impl Operand {
    fn resolve<'a>(&'a self, message: &'a Message) -> Option<&'a str> {
        match self {
            Operand::Body => Some(message.body()),
            Operand::Header(name) => message.header(name),
            Operand::Literal(value) => Some(value),
            Operand::Null => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

#[derive(Debug)]
enum Test {
    Binary { op: BinaryOp, right: Operand },
    Regex { regex: Regex, negate: bool },
    In { values: Vec<String>, negate: bool },
}

#[derive(Debug)]
enum Node {
    Bool(bool),
    Truthy(Operand),
    Compare { left: Operand, test: Test },
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

impl Node {
    fn evaluate(&self, message: &Message) -> bool {
        match self {
            Node::Bool(value) => *value,
            Node::Truthy(operand) => is_truthy(operand.resolve(message)),
            Node::Compare { left, test } => compare(left.resolve(message), test, message),
            Node::Not(inner) => !inner.evaluate(message),
            Node::And(left, right) => left.evaluate(message) && right.evaluate(message),
            Node::Or(left, right) => left.evaluate(message) || right.evaluate(message),
        }
    }
}

fn ordering(left: &str, right: &str) -> Ordering {
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn compare(left: Option<&str>, test: &Test, message: &Message) -> bool {
    match test {
        Test::Regex { regex, negate } => left.map_or(false, |l| regex.is_match(l)) != *negate,
        Test::In { values, negate } => {
            left.map_or(false, |l| values.iter().any(|v| ordering(l, v).is_eq())) != *negate
        }
        Test::Binary { op, right } => {
            let right = right.resolve(message);
            match op {
                BinaryOp::Eq | BinaryOp::Ne => {
                    let equal = match (left, right) {
                        (Some(l), Some(r)) => ordering(l, r).is_eq(),
                        (None, None) => true,
                        _ => false,
                    };
                    equal == (*op == BinaryOp::Eq)
                }
                _ => {
                    let (Some(l), Some(r)) = (left, right) else {
                        return *op == BinaryOp::NotContains;
                    };
                    match op {
                        BinaryOp::Lt => ordering(l, r).is_lt(),
                        BinaryOp::Le => ordering(l, r).is_le(),
                        BinaryOp::Gt => ordering(l, r).is_gt(),
                        BinaryOp::Ge => ordering(l, r).is_ge(),
                        BinaryOp::Contains => l.contains(r),
                        BinaryOp::NotContains => !l.contains(r),
                        BinaryOp::StartsWith => l.starts_with(r),
                        BinaryOp::EndsWith => l.ends_with(r),
                        BinaryOp::Eq | BinaryOp::Ne => unreachable!("handled above"),
                    }
                }
            }
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Node, String> {
        if self.tokens.is_empty() {
            return Err("expression is empty".to_string());
        }
        let node = self.parse_or()?;
        match self.peek() {
            None => Ok(node),
            Some(token) => Err(format!("unexpected token {token:?}")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_symbol(&self, symbol: &str) -> bool {
        matches!(self.peek(), Some(Token::Symbol(s)) if *s == symbol)
    }

    fn peek_word(&self) -> Option<String> {
        match self.peek() {
            Some(Token::Word(word)) => Some(word.to_ascii_lowercase()),
            _ => None,
        }
    }

    fn expect_word(&mut self, expected: &str) -> Result<(), String> {
        match self.advance() {
            Some(Token::Word(word)) if word.eq_ignore_ascii_case(expected) => Ok(()),
            other => Err(format!("expected '{expected}', found {other:?}")),
        }
    }

    fn parse_or(&mut self) -> Result<Node, String> {
        let mut node = self.parse_and()?;
        while self.peek_symbol("||") {
            self.advance();
            let right = self.parse_and()?;
            node = Node::Or(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, String> {
        let mut node = self.parse_unary()?;
        while self.peek_symbol("&&") {
            self.advance();
            let right = self.parse_unary()?;
            node = Node::And(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, String> {
        if self.peek_symbol("!") {
            self.advance();
            return Ok(Node::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, String> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.advance();
            let node = self.parse_or()?;
            return match self.advance() {
                Some(Token::RParen) => Ok(node),
                other => Err(format!("expected ')', found {other:?}")),
            };
        }

        match self.peek_word().as_deref() {
            Some("true") => {
                self.advance();
                return Ok(Node::Bool(true));
            }
            Some("false") => {
                self.advance();
                return Ok(Node::Bool(false));
            }
            _ => {}
        }

        let left = self.parse_operand()?;
        match self.parse_test()? {
            Some(test) => Ok(Node::Compare { left, test }),
            None => Ok(Node::Truthy(left)),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, String> {
        match self.advance() {
            Some(Token::Function(function)) => parse_function(&function),
            Some(Token::Literal(value)) | Some(Token::Number(value)) => Ok(Operand::Literal(value)),
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("null") => Ok(Operand::Null),
            Some(Token::Word(word))
                if word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false") =>
            {
                Ok(Operand::Literal(word.to_ascii_lowercase()))
            }
            Some(other) => Err(format!("expected an operand, found {other:?}")),
            None => Err("expected an operand, found end of expression".to_string()),
        }
    }

    fn parse_literal(&mut self, operator: &str) -> Result<String, String> {
        match self.advance() {
            Some(Token::Literal(value)) | Some(Token::Number(value)) => Ok(value),
            other => Err(format!(
                "operator '{operator}' requires a literal, found {other:?}"
            )),
        }
    }

    fn parse_test(&mut self) -> Result<Option<Test>, String> {
        let op = match self.peek() {
            Some(Token::Symbol(symbol)) => match *symbol {
                "==" => BinaryOp::Eq,
                "!=" => BinaryOp::Ne,
                "<" => BinaryOp::Lt,
                "<=" => BinaryOp::Le,
                ">" => BinaryOp::Gt,
                ">=" => BinaryOp::Ge,
                _ => return Ok(None),
            },
            Some(Token::Word(_)) => {
                let Some(word) = self.peek_word() else {
                    return Ok(None);
                };
                let negate = word == "not";
                let keyword = if negate {
                    self.advance();
                    self.peek_word()
                        .ok_or_else(|| "expected an operator after 'not'".to_string())?
                } else {
                    word
                };
                match keyword.as_str() {
                    "regex" => {
                        self.advance();
                        let pattern = self.parse_literal("regex")?;
                        let regex = full_match_regex(&pattern)?;
                        return Ok(Some(Test::Regex { regex, negate }));
                    }
                    "in" => {
                        self.advance();
                        let values = self
                            .parse_literal("in")?
                            .split(',')
                            .map(|value| value.trim().to_string())
                            .collect();
                        return Ok(Some(Test::In { values, negate }));
                    }
                    "contains" if negate => BinaryOp::NotContains,
                    "contains" => BinaryOp::Contains,
                    "starts" if !negate => {
                        self.advance();
                        self.expect_word("with")?;
                        let right = self.parse_operand()?;
                        return Ok(Some(Test::Binary {
                            op: BinaryOp::StartsWith,
                            right,
                        }));
                    }
                    "ends" if !negate => {
                        self.advance();
                        self.expect_word("with")?;
                        let right = self.parse_operand()?;
                        return Ok(Some(Test::Binary {
                            op: BinaryOp::EndsWith,
                            right,
                        }));
                    }
                    other if negate => {
                        return Err(format!("operator 'not {other}' is not supported"))
                    }
                    _ => return Ok(None),
                }
            }
            _ => return Ok(None),
        };

        self.advance();
        let right = self.parse_operand()?;
        Ok(Some(Test::Binary { op, right }))
    }
}

fn parse_function(function: &str) -> Result<Operand, String> {
    let function = function.strip_prefix("in.").unwrap_or(function);
    if function == "body" {
        return Ok(Operand::Body);
    }

    let header = function
        .strip_prefix("headers.")
        .or_else(|| function.strip_prefix("header."));
    match header {
        Some(name) if !name.is_empty() => Ok(Operand::Header(name.to_string())),
        _ => Err(format!("unsupported function '${{{function}}}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::{compile, CONSTANT, HEADER, REGEX, SIMPLE};
    use crate::message::Message;
    use crate::routing::predicate::PredicateResolveError;

    fn simple(expression: &str, message: &Message) -> bool {
        compile(SIMPLE, expression)
            .unwrap_or_else(|err| panic!("'{expression}' should compile: {err}"))
            .matches(message)
            .expect("simple predicates do not fail")
    }

    #[test]
    fn regex_operator_matches_whole_body() {
        let even = r"${body} regex '^\d*[02468]$'";

        assert!(simple(even, &Message::new("10")));
        assert!(!simple(even, &Message::new("7")));
        assert!(!simple(r"${body} regex '\d'", &Message::new("12")));
        assert!(simple(r"${body} not regex '\d'", &Message::new("12")));
    }

    #[test]
    fn equality_is_numeric_when_both_sides_are_numbers() {
        assert!(simple("${body} == 10", &Message::new("10.0")));
        assert!(simple("${body} != 'ten'", &Message::new("10")));
        assert!(simple("${body} > 9", &Message::new("10")));
        assert!(!simple("${body} < '9'", &Message::new("10")));
        assert!(simple("${body} <= 'b'", &Message::new("a")));
        assert!(simple(
            "${header.enabled} == true",
            &Message::new("").with_header("enabled", "true")
        ));
    }

    #[test]
    fn header_functions_and_null_handling() {
        let message = Message::new("x").with_header("kind", "number");

        assert!(simple("${header.kind} == 'number'", &message));
        assert!(simple("${in.headers.kind} starts with 'num'", &message));
        assert!(simple("${header.kind} ends with 'ber'", &message));
        assert!(simple("${header.missing} == null", &message));
        assert!(!simple("${header.missing} contains 'a'", &message));
        assert!(simple("${header.missing} not contains 'a'", &message));
        assert!(simple("${header.kind}", &message));
        assert!(!simple("${header.missing}", &message));
    }

    #[test]
    fn boolean_composition_respects_precedence_and_parentheses() {
        let message = Message::new("5").with_header("region", "eu");

        assert!(simple(
            "${body} == 1 || ${body} == 5 && ${header.region} == 'eu'",
            &message
        ));
        assert!(!simple(
            "(${body} == 1 || ${body} == 5) && ${header.region} == 'us'",
            &message
        ));
        assert!(simple("!(${body} == 1)", &message));
        assert!(simple("${body} in '1, 3, 5'", &message));
        assert!(simple("${header.region} not in 'us,apac'", &message));
        assert!(simple("true", &message));
        assert!(!simple("false && true", &message));
    }

    #[test]
    fn quoted_literals_support_escaped_quotes() {
        assert!(simple(r"${body} == 'it\'s'", &Message::new("it's")));
        assert!(simple(r#"${body} == "double""#, &Message::new("double")));
    }

    #[test]
    fn malformed_simple_expressions_are_rejected() {
        for expression in [
            "",
            "${body",
            "${body} == 'open",
            "${body} ==",
            "${body} regex ${header.pattern}",
            "${body} regex '('",
            "${exchange} == 1",
            "(${body} == 1",
            "${body} == 1 1",
            "${body} # 1",
        ] {
            let error = compile(SIMPLE, expression)
                .err()
                .unwrap_or_else(|| panic!("'{expression}' should not compile"));
            assert!(
                matches!(error, PredicateResolveError::InvalidExpression { .. }),
                "{expression}: {error}"
            );
        }
    }

    #[test]
    fn constant_header_and_regex_languages() {
        let message = Message::new("abc").with_header("flag", "false");

        assert!(compile(CONSTANT, " TRUE ").unwrap().matches(&message).unwrap());
        assert!(!compile(CONSTANT, "false").unwrap().matches(&message).unwrap());
        assert!(compile(CONSTANT, "maybe").is_err());

        assert!(!compile(HEADER, "flag").unwrap().matches(&message).unwrap());
        assert!(!compile(HEADER, "absent").unwrap().matches(&message).unwrap());
        assert!(compile(HEADER, "  ").is_err());

        assert!(compile(REGEX, "[a-c]+").unwrap().matches(&message).unwrap());
        assert!(!compile(REGEX, "b").unwrap().matches(&message).unwrap());
    }

    #[test]
    fn unknown_language_is_reported() {
        let error = compile("groovy", "true").err().expect("groovy is unsupported");

        assert_eq!(
            error,
            PredicateResolveError::UnknownLanguage("groovy".to_string())
        );
    }
}
