use crate::{
    codegen, driver, interpreter, lexer, parser,
    token::{Position, Spanned},
};

/// Any failure of a run, from reading the tokens to linking the executable.
///
/// Errors located in the source carry the position of the offending span.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{at}: {}", error.inner)]
    Lex {
        at: Position,
        error: Spanned<lexer::Error>,
    },
    #[error("{at}: syntax error: {}", error.inner)]
    Syntax {
        at: Position,
        error: Spanned<parser::Error>,
    },
    #[error("{at}: runtime error: {}", error.inner)]
    Runtime {
        at: Position,
        error: Spanned<interpreter::Error>,
    },
    #[error("{at}: {}", error.inner)]
    Codegen {
        at: Position,
        error: Spanned<codegen::Error>,
    },
    #[error(transparent)]
    Build(#[from] driver::Error),
}

impl Error {
    pub fn lex(src: &str, error: Spanned<lexer::Error>) -> Error {
        let at = error.span.position(src);
        Error::Lex { at, error }
    }

    pub fn syntax(src: &str, error: Spanned<parser::Error>) -> Error {
        let at = error.span.position(src);
        Error::Syntax { at, error }
    }

    pub fn runtime(src: &str, error: Spanned<interpreter::Error>) -> Error {
        let at = error.span.position(src);
        Error::Runtime { at, error }
    }

    pub fn codegen(src: &str, error: Spanned<codegen::Error>) -> Error {
        let at = error.span.position(src);
        Error::Codegen { at, error }
    }
}
