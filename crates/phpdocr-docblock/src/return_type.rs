//! Return type inference for function and method bodies
//!
//! Walks the top-level control flow of a body and classifies every `return`
//! by the syntactic shape of its value. Nested functions, closures and
//! class bodies are not entered, so their returns never leak into the
//! enclosing function.

use mago_span::HasSpan;
use mago_syntax::ast::*;
use phpdocr_core::{visit_scope, Visitor};

/// Coarse value category of a single `return`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Null,
    Bool,
    Array,
    Int,
    Float,
    String,
    /// `new ClassName(...)`
    Named(String),
    Mixed,
}

impl ReturnKind {
    pub fn as_str(&self) -> &str {
        match self {
            ReturnKind::Void => "void",
            ReturnKind::Null => "null",
            ReturnKind::Bool => "bool",
            ReturnKind::Array => "array",
            ReturnKind::Int => "int",
            ReturnKind::Float => "float",
            ReturnKind::String => "string",
            ReturnKind::Named(name) => name,
            ReturnKind::Mixed => "mixed",
        }
    }
}

/// Infer the documented return type of a body.
///
/// No returns at all yields `void`; any unclassifiable branch yields `mixed`.
pub fn infer_return_type<'a, 'b>(
    statements: impl IntoIterator<Item = &'b Statement<'a>>,
    source: &str,
) -> String
where
    'a: 'b,
{
    join_return_kinds(&collect_return_kinds(statements, source))
}

/// Distinct return kinds reachable in this scope, in first-seen order
pub fn collect_return_kinds<'a, 'b>(
    statements: impl IntoIterator<Item = &'b Statement<'a>>,
    source: &str,
) -> Vec<ReturnKind>
where
    'a: 'b,
{
    let mut collector = ReturnCollector { kinds: Vec::new() };
    visit_scope(&mut collector, statements, source);
    collector.kinds
}

/// Render a kind set as a union; empty means `void`
pub fn join_return_kinds(kinds: &[ReturnKind]) -> String {
    if kinds.is_empty() {
        return ReturnKind::Void.as_str().to_string();
    }
    let union = kinds
        .iter()
        .map(ReturnKind::as_str)
        .collect::<Vec<_>>()
        .join("|");
    collapse_mixed(&union)
}

/// A union with a `mixed` member carries no information beyond `mixed`.
///
/// Shared by the declared-type and the inferred-type paths.
pub fn collapse_mixed(union: &str) -> String {
    let has_mixed = union
        .split('|')
        .map(|member| member.trim().trim_start_matches('?'))
        .any(|member| member.eq_ignore_ascii_case("mixed"));
    if has_mixed {
        "mixed".to_string()
    } else {
        union.trim().to_string()
    }
}

struct ReturnCollector {
    kinds: Vec<ReturnKind>,
}

impl<'a> Visitor<'a> for ReturnCollector {
    fn visit_statement(&mut self, stmt: &Statement<'a>, source: &str) -> bool {
        if let Statement::Return(ret) = stmt {
            let kind = match &ret.value {
                Some(value) => classify_expression(value, source),
                None => ReturnKind::Void,
            };
            if !self.kinds.contains(&kind) {
                self.kinds.push(kind);
            }
            return false;
        }
        true
    }
}

/// Classify a returned expression by its syntactic shape
pub fn classify_expression(expr: &Expression<'_>, source: &str) -> ReturnKind {
    match expr {
        Expression::Literal(literal) => match literal {
            Literal::String(_) => ReturnKind::String,
            Literal::Integer(_) => ReturnKind::Int,
            Literal::Float(_) => ReturnKind::Float,
            Literal::True(_) | Literal::False(_) => ReturnKind::Bool,
            Literal::Null(_) => ReturnKind::Null,
            #[allow(unreachable_patterns)]
            _ => ReturnKind::Mixed,
        },
        Expression::Array(_) | Expression::LegacyArray(_) => ReturnKind::Array,
        Expression::Parenthesized(paren) => classify_expression(paren.expression, source),
        Expression::Instantiation(inst) => instantiated_class(inst, source)
            .map(ReturnKind::Named)
            .unwrap_or(ReturnKind::Mixed),
        _ => ReturnKind::Mixed,
    }
}

/// Class named by `new X(...)`, including `self`, `static` and `parent`.
///
/// Dynamic class expressions such as `new $class` yield `None`.
pub(crate) fn instantiated_class(inst: &Instantiation<'_>, source: &str) -> Option<String> {
    match inst.class {
        Expression::Identifier(_)
        | Expression::Self_(_)
        | Expression::Static(_)
        | Expression::Parent(_) => {
            let span = inst.class.span();
            Some(source[span.start.offset as usize..span.end.offset as usize].to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mago_database::file::FileId;

    /// Infer the return type of the first function declared in `source`
    fn infer(source: &str) -> String {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        for stmt in program.statements.iter() {
            if let Statement::Function(func) = stmt {
                return infer_return_type(func.body.statements.iter(), source);
            }
        }
        panic!("no function in test source");
    }

    #[test]
    fn test_no_return_is_void() {
        assert_eq!(infer("<?php function a() { echo 1; }"), "void");
    }

    #[test]
    fn test_bare_return_is_void() {
        assert_eq!(infer("<?php function a() { return; }"), "void");
    }

    #[test]
    fn test_literal_kinds() {
        assert_eq!(infer("<?php function a() { return 'x'; }"), "string");
        assert_eq!(infer("<?php function a() { return 42; }"), "int");
        assert_eq!(infer("<?php function a() { return 4.2; }"), "float");
        assert_eq!(infer("<?php function a() { return true; }"), "bool");
        assert_eq!(infer("<?php function a() { return null; }"), "null");
        assert_eq!(infer("<?php function a() { return [1, 2]; }"), "array");
        assert_eq!(infer("<?php function a() { return array(); }"), "array");
    }

    #[test]
    fn test_instantiation_is_named_type() {
        assert_eq!(infer("<?php function a() { return new Foo(); }"), "Foo");
        assert_eq!(
            infer("<?php function a() { return new \\App\\Models\\User(1); }"),
            "\\App\\Models\\User"
        );
    }

    #[test]
    fn test_union_in_first_seen_order() {
        let source = r#"<?php
function a($x) {
    if ($x) {
        return 1;
    } elseif ($x > 2) {
        return 'two';
    } else {
        return 3;
    }
    return null;
}
"#;
        assert_eq!(infer(source), "int|string|null");
    }

    #[test]
    fn test_unknown_branch_collapses_to_mixed() {
        let source = r#"<?php
function a($x) {
    if ($x) {
        return 1;
    }
    return $x;
}
"#;
        assert_eq!(infer(source), "mixed");
    }

    #[test]
    fn test_calls_and_access_are_mixed() {
        assert_eq!(infer("<?php function a() { return foo(); }"), "mixed");
        assert_eq!(infer("<?php function a() { return $this->x; }"), "mixed");
        assert_eq!(infer("<?php function a() { return PHP_EOL; }"), "mixed");
        assert_eq!(infer("<?php function a($a, $b) { return $a + $b; }"), "mixed");
    }

    #[test]
    fn test_loops_switch_and_try_are_visited() {
        let source = r#"<?php
function a($items) {
    foreach ($items as $item) {
        return 1;
    }
    while (true) {
        return 'a';
    }
    switch ($items) {
        case 1:
            return false;
    }
    try {
        return [];
    } catch (Exception $e) {
        return null;
    } finally {
        return 1.5;
    }
}
"#;
        assert_eq!(infer(source), "int|string|bool|array|null|float");
    }

    #[test]
    fn test_nested_function_is_ignored() {
        let source = r#"<?php
function a() {
    function b() {
        return 1.5;
    }
}
"#;
        assert_eq!(infer(source), "void");
    }

    #[test]
    fn test_closure_return_is_ignored() {
        let source = r#"<?php
function a() {
    $fn = function () {
        return 'x';
    };
    return 1;
}
"#;
        assert_eq!(infer(source), "int");
    }

    #[test]
    fn test_collapse_mixed() {
        assert_eq!(collapse_mixed("int|string|mixed"), "mixed");
        assert_eq!(collapse_mixed("?mixed"), "mixed");
        assert_eq!(collapse_mixed("int|string"), "int|string");
        assert_eq!(collapse_mixed("MixedBag"), "MixedBag");
    }

    #[test]
    fn test_join_return_kinds() {
        assert_eq!(join_return_kinds(&[]), "void");
        assert_eq!(
            join_return_kinds(&[ReturnKind::Int, ReturnKind::Mixed, ReturnKind::Null]),
            "mixed"
        );
        assert_eq!(
            join_return_kinds(&[ReturnKind::Named("Foo".into()), ReturnKind::Null]),
            "Foo|null"
        );
    }
}
