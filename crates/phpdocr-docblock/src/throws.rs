//! Collects exception types raised by `throw` statements in one scope

use mago_syntax::ast::*;
use phpdocr_core::{visit_scope, Visitor};

use crate::return_type::instantiated_class;

/// Label used when the thrown expression does not name a class
pub const GENERIC_EXCEPTION: &str = "Exception";

/// Distinct exception type names thrown directly in this scope, first-seen order.
///
/// Throws inside nested functions, closures and classes belong to those
/// declarations and are not reported.
pub fn collect_thrown_exceptions<'a, 'b>(
    statements: impl IntoIterator<Item = &'b Statement<'a>>,
    source: &str,
) -> Vec<String>
where
    'a: 'b,
{
    let mut collector = ThrowCollector { types: Vec::new() };
    visit_scope(&mut collector, statements, source);
    collector.types
}

struct ThrowCollector {
    types: Vec<String>,
}

impl<'a> Visitor<'a> for ThrowCollector {
    fn visit_statement(&mut self, stmt: &Statement<'a>, source: &str) -> bool {
        if let Statement::Expression(expr_stmt) = stmt {
            if let Expression::Throw(throw) = expr_stmt.expression {
                let name = thrown_type_name(throw.exception, source);
                if !self.types.contains(&name) {
                    self.types.push(name);
                }
            }
            return false;
        }
        true
    }
}

fn thrown_type_name(expr: &Expression<'_>, source: &str) -> String {
    match expr {
        Expression::Instantiation(inst) => {
            instantiated_class(inst, source).unwrap_or_else(|| GENERIC_EXCEPTION.to_string())
        }
        Expression::Parenthesized(paren) => thrown_type_name(paren.expression, source),
        _ => GENERIC_EXCEPTION.to_string(),
    }
}
