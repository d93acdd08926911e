use larch::{Assoc, ParseError, Parser, ParserGenerator, Token};
use larch_lex::{Lexer, LexerBuilder};

#[derive(Debug)]
enum Value {
    Token(Token),
    Int(i64),
}

impl From<Token> for Value {
    fn from(token: Token) -> Value {
        Value::Token(token)
    }
}

impl Value {
    fn int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Token(t) => panic!("expected an integer, got token {t}"),
        }
    }
}

fn lexer() -> Lexer {
    let mut builder = LexerBuilder::new();
    builder.add("PLUS", r"\+").unwrap();
    builder.add("MINUS", r"-").unwrap();
    builder.add("NUMBER", r"\d+").unwrap();
    builder.ignore(r"\s+").unwrap();
    builder.build()
}

fn parser() -> Parser<Value> {
    let mut pg: ParserGenerator<Value> = ParserGenerator::new(["NUMBER", "PLUS", "MINUS"]);
    pg.set_precedence("PLUS", Assoc::Left, 1).unwrap();
    pg.set_precedence("MINUS", Assoc::Left, 1).unwrap();

    pg.production("main", &["expr"], |mut p| p.pop().unwrap()).unwrap();
    pg.production("expr", &["expr", "PLUS", "expr"], |p| {
        Value::Int(p[0].int() + p[2].int())
    })
    .unwrap();
    pg.production("expr", &["expr", "MINUS", "expr"], |p| {
        Value::Int(p[0].int() - p[2].int())
    })
    .unwrap();
    pg.production("expr", &["NUMBER"], |p| match &p[0] {
        Value::Token(t) => Value::Int(t.value.parse().unwrap()),
        other => panic!("expected a NUMBER token, got {other:?}"),
    })
    .unwrap();

    pg.build().unwrap()
}

fn evaluate(text: &str) -> Result<i64, ParseError> {
    let lexer = lexer();
    let parser = parser();
    parser.parse(lexer.lex(text)).map(|v| v.int())
}

#[test]
fn calculator_evaluates_left_to_right() {
    assert_eq!(evaluate("1 + 3 - 2+12-32").unwrap(), -18);
    assert_eq!(evaluate("7").unwrap(), 7);

    let parser = parser();
    assert!(parser.warnings().is_empty());
}

#[test]
fn lexing_failures_surface_through_the_parse() {
    let err = evaluate("1 + ?").unwrap_err();
    match err {
        ParseError::Lexing(lexing) => assert_eq!(lexing.source_pos.idx, 4),
        other => panic!("expected a lexing error, got {other:?}"),
    }
}

#[test]
fn syntax_errors_point_at_the_offending_token() {
    let err = evaluate("1 + + 2").unwrap_err();
    match err {
        ParseError::UnexpectedToken { token } => {
            assert_eq!(token.name, "PLUS");
            assert_eq!(token.source_pos.unwrap().idx, 4);
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn one_parser_serves_many_inputs() {
    let lexer = lexer();
    let parser = parser();
    for (text, expected) in [("1+1", 2), ("5 - 2 - 1", 2), ("10", 10)] {
        let value = parser.parse(lexer.lex(text)).unwrap();
        assert_eq!(value.int(), expected);
    }
}
