use crate::{
    lexer, parser,
    token::Spanned,
    util::{fmt::tree, intern::Interner},
};

/// What a tree test feeds to the parser.
pub enum Source {
    Program(&'static str),
    Expr(&'static str),
}

pub enum Expectation {
    Tree(&'static str),
    Errors(&'static [&'static str]),
}

/// The printed tree (empty on failure) and the errors, each as `lo..hi: msg`.
#[derive(Debug, Default)]
pub struct Rendered {
    pub tree: String,
    pub errors: Vec<String>,
}

impl Rendered {
    fn failed<E: std::fmt::Display>(Spanned { span, inner }: &Spanned<E>) -> Rendered {
        Rendered {
            tree: String::new(),
            errors: vec![format!("{span}: {inner}")],
        }
    }
}

pub fn render(source: &Source) -> Rendered {
    let mut tokens = Vec::with_capacity(256);
    let mut idents = Interner::with_capacity(16);

    let src = match *source {
        Source::Program(src) | Source::Expr(src) => src,
    };
    if let Err(error) = lexer::lex(src, &mut tokens) {
        return Rendered::failed(&error);
    }

    let tree = match source {
        Source::Program(_) => parser::parse_tokens(src, &tokens, &mut idents)
            .map(|program| tree::print_program_string(&idents, &program))
            .map_err(|error| Rendered::failed(&error)),
        Source::Expr(_) => {
            tokens.clear();
            match parser::parse_expr(src, &mut tokens, &mut idents) {
                Ok(expr) => Ok(tree::print_expr_string(&idents, &expr)),
                Err(crate::Error::Syntax { error, .. }) => Err(Rendered::failed(&error)),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    };
    tree.map_or_else(|failed| failed, |tree| Rendered { tree, errors: vec![] })
}

#[track_caller]
pub fn check(expectation: &Expectation, rendered: &Rendered) {
    match *expectation {
        Expectation::Tree(expected) => {
            let no_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(rendered.errors, no_errors);
            ::pretty_assertions::assert_eq!(rendered.tree.trim(), expected.trim());
        }
        Expectation::Errors(expected) => {
            ::pretty_assertions::assert_eq!(rendered.errors, expected);
        }
    }
}

/// Declares tests that parse a program or an expression and compare the
/// printed tree (`tree_ok`) or the errors (`expected_errors`).
macro_rules! tree_tests {
    (
        use $stage:ident;

        $(
            fn $name:ident() {
                let $kind:ident = $source:expr;
                $($expectations:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $name() {
                let source = tree_tests!(@source $stage $kind, $source);
                let rendered = crate::util::test_utils::render(&source);
                tree_tests!(@check rendered, [$($expectations)*]);
            }
        )*
    };

    (@check $rendered:ident, []) => {};
    (@check $rendered:ident, [
        let $expectation:ident = $expected:expr;
        $($rest:tt)*
    ]) => {
        crate::util::test_utils::check(
            &tree_tests!(@expect $expectation, $expected),
            &$rendered,
        );
        tree_tests!(@check $rendered, [$($rest)*]);
    };

    (@expect tree_ok, $expected:expr) => {
        crate::util::test_utils::Expectation::Tree(::indoc::indoc! { $expected })
    };
    (@expect expected_errors, $expected:expr) => {
        crate::util::test_utils::Expectation::Errors($expected)
    };

    (@source parser program, $source:expr) => {
        crate::util::test_utils::Source::Program($source)
    };
    (@source parser expr, $source:expr) => {
        crate::util::test_utils::Source::Expr($source)
    };
}
pub(crate) use tree_tests;
