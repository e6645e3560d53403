mod token;

use log::{info, trace};
use logos::Logos;

use decaf_common::tac::BinaryOp;
use token::FreeToken;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    Goto,
    IfZ,
    BeginFunc,
    EndFunc,
    Return,
    PushParam,
    PopParams,
    LCall,
    ACall,
    VTable,
    Global,

    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    Equal,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqualEqual,
    Less,
    AndAnd,
    PipePipe,

    Name(String),
    Number(i32),
    Str(String),

    Invalid,
}

impl Token {
    /// The binary operator this token spells, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            Self::Plus => Some(BinaryOp::Add),
            Self::Minus => Some(BinaryOp::Sub),
            Self::Star => Some(BinaryOp::Mul),
            Self::Slash => Some(BinaryOp::Div),
            Self::Percent => Some(BinaryOp::Mod),
            Self::EqualEqual => Some(BinaryOp::Equal),
            Self::Less => Some(BinaryOp::Less),
            Self::AndAnd => Some(BinaryOp::And),
            Self::PipePipe => Some(BinaryOp::Or),
            _ => None,
        }
    }
}

pub fn lex(src: impl AsRef<str>) -> Vec<(Token, Span)> {
    let src = src.as_ref();
    info!("lexing {} bytes of three-address code", src.len());

    let res: Vec<_> = FreeToken::lexer(src)
        .spanned()
        .map(|(token, range)| (convert(token), Span::new(range.start, range.end)))
        .collect();

    trace!("done lexing ({} tokens)", res.len());
    res
}

fn convert(token: FreeToken) -> Token {
    match token {
        FreeToken::Goto => Token::Goto,
        FreeToken::IfZ => Token::IfZ,
        FreeToken::BeginFunc => Token::BeginFunc,
        FreeToken::EndFunc => Token::EndFunc,
        FreeToken::Return => Token::Return,
        FreeToken::PushParam => Token::PushParam,
        FreeToken::PopParams => Token::PopParams,
        FreeToken::LCall => Token::LCall,
        FreeToken::ACall => Token::ACall,
        FreeToken::VTable => Token::VTable,
        FreeToken::Global => Token::Global,

        FreeToken::LParen => Token::LParen,
        FreeToken::RParen => Token::RParen,
        FreeToken::Comma => Token::Comma,
        FreeToken::Colon => Token::Colon,
        FreeToken::Semicolon => Token::Semicolon,
        FreeToken::Equal => Token::Equal,

        FreeToken::Plus => Token::Plus,
        FreeToken::Minus => Token::Minus,
        FreeToken::Star => Token::Star,
        FreeToken::Slash => Token::Slash,
        FreeToken::Percent => Token::Percent,
        FreeToken::EqualEqual => Token::EqualEqual,
        FreeToken::Less => Token::Less,
        FreeToken::AndAnd => Token::AndAnd,
        FreeToken::PipePipe => Token::PipePipe,

        FreeToken::Name(name) => Token::Name(name.into()),
        FreeToken::DecNumber(number) => match number.parse() {
            Ok(number) => Token::Number(number),
            Err(_) => Token::Invalid,
        },
        FreeToken::Str(string) => Token::Str(string[1..string.len() - 1].into()),

        FreeToken::Error => Token::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::{lex, Token};

    #[test]
    fn lexes_an_instruction() {
        let tokens: Vec<_> = lex("\t_tmp2 = *(_tmp1 + -4) ; # a comment")
            .into_iter()
            .map(|(token, _)| token)
            .collect();

        let expected = vec![
            Token::Name("_tmp2".into()),
            Token::Equal,
            Token::Star,
            Token::LParen,
            Token::Name("_tmp1".into()),
            Token::Plus,
            Token::Number(-4),
            Token::RParen,
            Token::Semicolon,
        ];

        assert_eq!(expected, tokens);
    }

    #[test]
    fn keywords_win_over_names_but_not_prefixes() {
        let tokens: Vec<_> = lex("Goto Gotos _Cow.Moo \"hi there\"")
            .into_iter()
            .map(|(token, _)| token)
            .collect();

        let expected = vec![
            Token::Goto,
            Token::Name("Gotos".into()),
            Token::Name("_Cow.Moo".into()),
            Token::Str("hi there".into()),
        ];

        assert_eq!(expected, tokens);
    }
}
