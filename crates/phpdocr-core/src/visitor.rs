//! Statement visitor for walking one PHP scope
//!
//! Default implementations descend through control-flow containers only.
//! Function, method, closure and class-like bodies are never entered by the
//! default traversal; visitors that care about declarations handle them in
//! `visit_statement`.

use mago_syntax::ast::*;

/// Trait for visiting the statements of a single scope
pub trait Visitor<'a> {
    /// Called for each statement. Return `true` to continue traversal into children.
    fn visit_statement(&mut self, _stmt: &Statement<'a>, _source: &str) -> bool {
        true
    }

    /// Traverse a statement and its control-flow children
    fn traverse_statement(&mut self, stmt: &Statement<'a>, source: &str) {
        if !self.visit_statement(stmt, source) {
            return;
        }

        match stmt {
            Statement::Block(block) => {
                for inner in block.statements.iter() {
                    self.traverse_statement(inner, source);
                }
            }
            Statement::If(if_stmt) => {
                self.traverse_if_body(&if_stmt.body, source);
            }
            Statement::Foreach(foreach) => match &foreach.body {
                ForeachBody::Statement(inner) => {
                    self.traverse_statement(inner, source);
                }
                ForeachBody::ColonDelimited(body) => {
                    for inner in body.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
            },
            Statement::For(for_stmt) => match &for_stmt.body {
                ForBody::Statement(inner) => {
                    self.traverse_statement(inner, source);
                }
                ForBody::ColonDelimited(body) => {
                    for inner in body.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
            },
            Statement::While(while_stmt) => match &while_stmt.body {
                WhileBody::Statement(inner) => {
                    self.traverse_statement(inner, source);
                }
                WhileBody::ColonDelimited(body) => {
                    for inner in body.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
            },
            Statement::DoWhile(do_while) => {
                self.traverse_statement(do_while.statement, source);
            }
            Statement::Switch(switch) => {
                self.traverse_switch_body(&switch.body, source);
            }
            Statement::Try(try_stmt) => {
                for inner in try_stmt.block.statements.iter() {
                    self.traverse_statement(inner, source);
                }
                for catch in try_stmt.catch_clauses.iter() {
                    for inner in catch.block.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
                if let Some(finally) = &try_stmt.finally_clause {
                    for inner in finally.block.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
            }
            Statement::Namespace(namespace) => {
                for inner in namespace.statements().iter() {
                    self.traverse_statement(inner, source);
                }
            }
            _ => {}
        }
    }

    /// Traverse an if body, including every elseif and else branch
    fn traverse_if_body(&mut self, body: &IfBody<'a>, source: &str) {
        match body {
            IfBody::Statement(stmt_body) => {
                self.traverse_statement(stmt_body.statement, source);
                for else_if in stmt_body.else_if_clauses.iter() {
                    self.traverse_statement(else_if.statement, source);
                }
                if let Some(else_clause) = &stmt_body.else_clause {
                    self.traverse_statement(else_clause.statement, source);
                }
            }
            IfBody::ColonDelimited(block) => {
                for inner in block.statements.iter() {
                    self.traverse_statement(inner, source);
                }
                for else_if in block.else_if_clauses.iter() {
                    for inner in else_if.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
                if let Some(else_clause) = &block.else_clause {
                    for inner in else_clause.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
            }
        }
    }

    /// Traverse every case of a switch body
    fn traverse_switch_body(&mut self, body: &SwitchBody<'a>, source: &str) {
        match body {
            SwitchBody::BraceDelimited(block) => {
                for case in block.cases.iter() {
                    for stmt in case.statements().iter() {
                        self.traverse_statement(stmt, source);
                    }
                }
            }
            SwitchBody::ColonDelimited(block) => {
                for case in block.cases.iter() {
                    for stmt in case.statements().iter() {
                        self.traverse_statement(stmt, source);
                    }
                }
            }
        }
    }
}

/// Run a visitor over a list of statements forming one scope
pub fn visit_scope<'a, 'b, V>(
    visitor: &mut V,
    statements: impl IntoIterator<Item = &'b Statement<'a>>,
    source: &str,
) where
    'a: 'b,
    V: Visitor<'a>,
{
    for stmt in statements {
        visitor.traverse_statement(stmt, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mago_database::file::FileId;

    struct ReturnCounter {
        returns: usize,
    }

    impl<'a> Visitor<'a> for ReturnCounter {
        fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
            if let Statement::Return(_) = stmt {
                self.returns += 1;
            }
            true
        }
    }

    fn count_returns(source: &str) -> usize {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        let mut counter = ReturnCounter { returns: 0 };
        visit_scope(&mut counter, program.statements.iter(), source);
        counter.returns
    }

    #[test]
    fn test_descends_into_control_flow() {
        let source = r#"<?php
if ($a) { return 1; } elseif ($b) { return 2; } else { return 3; }
while ($x) { return 4; }
foreach ($items as $item) { return 5; }
switch ($y) { case 1: return 6; default: return 7; }
try { return 8; } catch (Exception $e) { return 9; } finally { return 10; }
"#;
        assert_eq!(count_returns(source), 10);
    }

    #[test]
    fn test_does_not_enter_declarations() {
        let source = r#"<?php
function inner() { return 1; }
class Foo { public function bar() { return 2; } }
$fn = function () { return 3; };
"#;
        assert_eq!(count_returns(source), 0);
    }
}
