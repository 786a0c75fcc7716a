//! Call-range scanner for Rust sources
//!
//! Uses `syn` for parsing and `proc-macro2` span locations for line
//! numbers. Three call shapes are recognized:
//!
//! | Node | Name token | Argument list |
//! |------|------------|---------------|
//! | `recv.method(..)` | `method` | call arguments |
//! | `path::func(..)` | last path segment | call arguments |
//! | `name!(..)` | last path segment | macro body tokens |
//!
//! A closure with a block body passed as the last argument ends the
//! argument list at its `|..|` head (or return type). The block's lines
//! carry their own counts.

use super::{CallRange, CallScanner};
use crate::result::{HeatlineError, HeatlineResult};
use proc_macro2::TokenStream;
use quote::ToTokens;
use std::path::Path;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Expr, ExprCall, ExprMethodCall, Macro, ReturnType, Token};

/// Macros that define rather than call
const DEFINITION_MACROS: &[&str] = &["macro_rules"];

/// Scanner for `.rs` files
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCallScanner;

impl RustCallScanner {
    /// Create a scanner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CallScanner for RustCallScanner {
    fn scan(&self, path: &Path) -> HeatlineResult<Vec<CallRange>> {
        let source = std::fs::read_to_string(path)?;
        scan_source(&source, &path.to_string_lossy())
    }
}

/// Scan Rust source text; `label` names the file in parse errors
///
/// # Errors
///
/// Returns [`HeatlineError::Parse`] if the source is not valid Rust
pub fn scan_source(source: &str, label: &str) -> HeatlineResult<Vec<CallRange>> {
    let file = syn::parse_file(source).map_err(|e| {
        let at = e.span().start();
        HeatlineError::parse(label, format!("{e} (line {}, column {})", at.line, at.column))
    })?;
    let mut visitor = CallRangeVisitor::default();
    visitor.visit_file(&file);
    Ok(visitor.ranges)
}

#[derive(Debug, Default)]
struct CallRangeVisitor {
    ranges: Vec<CallRange>,
}

impl CallRangeVisitor {
    fn record(&mut self, name: String, start_line: usize, end_line: usize) {
        if start_line != end_line {
            self.ranges.push(CallRange {
                name,
                start_line,
                end_line,
            });
        }
    }
}

/// Line on which the last token of a token stream ends
fn last_token_line(tokens: TokenStream) -> Option<usize> {
    tokens
        .into_iter()
        .last()
        .map(|token| token.span().end().line)
}

/// Line on which the argument list ends, given its last argument
fn argument_end_line(last: &Expr) -> Option<usize> {
    if let Expr::Closure(closure) = last {
        if matches!(*closure.body, Expr::Block(_)) {
            return match &closure.output {
                ReturnType::Type(_, ty) => last_token_line(ty.to_token_stream()),
                ReturnType::Default => Some(closure.or2_token.span().end().line),
            };
        }
    }
    last_token_line(last.to_token_stream())
}

impl<'ast> Visit<'ast> for CallRangeVisitor {
    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        if let Some(last) = node.args.last() {
            if let Some(end_line) = argument_end_line(last) {
                let start_line = node.method.span().start().line;
                self.record(node.method.to_string(), start_line, end_line);
            }
        }
        visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_call(&mut self, node: &'ast ExprCall) {
        if let Some(last) = node.args.last() {
            let callee = match &*node.func {
                Expr::Path(path) => path
                    .path
                    .segments
                    .last()
                    .map(|segment| (segment.ident.to_string(), segment.ident.span().start().line)),
                _ => None,
            };
            let (name, start_line) = callee.unwrap_or_else(|| {
                let line = last_token_line(node.func.to_token_stream())
                    .unwrap_or_else(|| node.func.span().start().line);
                ("<call>".to_string(), line)
            });
            if let Some(end_line) = argument_end_line(last) {
                self.record(name, start_line, end_line);
            }
        }
        visit::visit_expr_call(self, node);
    }

    fn visit_macro(&mut self, node: &'ast Macro) {
        if let Some(segment) = node.path.segments.last() {
            let name = segment.ident.to_string();
            if !DEFINITION_MACROS.contains(&name.as_str()) {
                if let Some(end_line) = last_token_line(node.tokens.clone()) {
                    self.record(name, segment.ident.span().start().line, end_line);
                }
                // format!-style bodies are plain expressions; look inside them
                if let Ok(args) =
                    node.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
                {
                    for arg in &args {
                        self.visit_expr(arg);
                    }
                }
            }
        }
        visit::visit_macro(self, node);
    }
}
