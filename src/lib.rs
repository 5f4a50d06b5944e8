/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The interpreter walks the AST, executing it directly.
pub mod interpreter;

/// The code generator walks the AST, lowering it to Cranelift IR.
pub mod codegen;

/// The driver takes lowered IR through verification, object emission and
/// linking, producing a freestanding executable.
pub mod driver;

pub mod ast;
pub mod token;

mod error;

pub use error::Error;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
