use logos::Logos;

#[derive(Logos, Debug)]
pub enum FreeToken<'src> {
    #[token("Goto")]
    Goto,

    #[token("IfZ")]
    IfZ,

    #[token("BeginFunc")]
    BeginFunc,

    #[token("EndFunc")]
    EndFunc,

    #[token("Return")]
    Return,

    #[token("PushParam")]
    PushParam,

    #[token("PopParams")]
    PopParams,

    #[token("LCall")]
    LCall,

    #[token("ACall")]
    ACall,

    #[token("VTable")]
    VTable,

    #[token("Global")]
    Global,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("=")]
    Equal,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("==")]
    EqualEqual,

    #[token("<")]
    Less,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    PipePipe,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_.$]*")]
    Name(&'src str),

    #[regex(r"-?[0-9]+")]
    DecNumber(&'src str),

    #[regex(r#""[^"\n\r]*""#)]
    Str(&'src str),

    #[error]
    #[regex(r"[ \t\n\r\v\f]+", logos::skip)]
    #[regex(r"#[^\n\r]*", logos::skip)]
    Error,
}
