//! Parsing pipeline for Curry source files.
//!
//! The pipeline runs the literate preprocessor, the layout-aware lexer and
//! the LL(1) grammar, producing a surface [`Module`] together with a list of
//! warning messages. The first fatal error aborts the translation unit and
//! is returned as a single in-band [`Message`].
//!
//! The combinator engine itself lives in [`combinator`]; the grammar in
//! [`grammar`].

pub mod combinator;
pub mod grammar;

pub use combinator::{choice, layout, layout_end, layout_off, layout_on, position, token, Cursor, Parser};

use curry_diagnostics::{Message, MessageResult};
use curry_lexer::{Lexer, Token};
use curry_syntax::ast::{Extension, Module, ModulePragma};
use curry_syntax::ident::ModuleIdent;
use std::path::Path;

/// Parse a source file into a surface module.
///
/// The module name defaults to `main` when the header is missing and is then
/// replaced by a name derived from the file's basename.
pub fn parse_module(file: &str, source: &str) -> MessageResult<Module> {
    let source = curry_preprocess::preprocess(file, source).map_err(|e| e.message())?;
    let mut cursor = Cursor::new(Lexer::new(file, &source));
    let mut module = grammar::module().run(&mut cursor).map_err(|e| e.message())?;

    if module.name.is_main() {
        if let Some(stem) = Path::new(file).file_stem().and_then(|s| s.to_str()) {
            module.name = ModuleIdent::from_dotted(stem, module.position.clone());
        }
    }

    let warnings = collect_warnings(&module);
    Ok((module, warnings))
}

/// Lex a source file into its raw token sequence (virtual layout tokens are
/// only produced during parsing, when layout contexts are open).
pub fn lex_source(file: &str, source: &str) -> Result<Vec<Token>, Message> {
    let source = curry_preprocess::preprocess(file, source).map_err(|e| e.message())?;
    Lexer::new(file, &source).tokenize().map_err(|e| e.message())
}

fn collect_warnings(module: &Module) -> Vec<Message> {
    let mut warnings = Vec::new();
    for pragma in &module.pragmas {
        if let ModulePragma::Language(_, extensions) = pragma {
            for extension in extensions {
                if let Extension::Unknown(position, name) = extension {
                    warnings.push(Message::at(
                        position.clone(),
                        format!("unknown language extension \"{name}\""),
                    ));
                }
            }
        }
    }
    warnings
}
