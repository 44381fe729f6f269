//! Block extraction: turns a parsed program into a tree of documentable blocks

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;
use phpdocr_core::{visit_scope, LineIndex, Visitor};

use crate::block::{BlockKind, DocumentableBlock, Parameter};
use crate::return_type::infer_return_type;
use crate::throws::collect_thrown_exceptions;

/// Extract the forest of documentable blocks from `program`, in source order
pub fn extract_blocks(program: &Program<'_>, source: &str) -> Vec<DocumentableBlock> {
    let lines = LineIndex::new(source);
    extract_from_statements(program.statements.as_slice(), source, &lines)
}

fn extract_from_statements<'a>(
    statements: &[Statement<'a>],
    source: &str,
    lines: &LineIndex,
) -> Vec<DocumentableBlock> {
    let mut extractor = BlockExtractor {
        lines,
        blocks: Vec::new(),
    };
    visit_scope(&mut extractor, statements.iter(), source);
    extractor.blocks
}

struct BlockExtractor<'l> {
    lines: &'l LineIndex,
    blocks: Vec<DocumentableBlock>,
}

impl<'a> Visitor<'a> for BlockExtractor<'_> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, source: &str) -> bool {
        match stmt {
            Statement::Function(func) => {
                let mut block = self.function_like(
                    BlockKind::Function,
                    func.name.value,
                    func.span(),
                    parameters(&func.parameter_list, source),
                    func.return_type_hint
                        .as_ref()
                        .map(|rth| span_text(source, rth.hint.span())),
                    Some(func.body.statements.as_slice()),
                    source,
                );
                block.children = extract_from_statements(
                    func.body.statements.as_slice(),
                    source,
                    self.lines,
                );
                self.blocks.push(block);
                false
            }
            Statement::Class(class) => {
                let block = self.class_like(
                    BlockKind::Class,
                    class.name.value,
                    class.span(),
                    class.members.iter(),
                    source,
                );
                self.blocks.push(block);
                false
            }
            Statement::Interface(iface) => {
                let block = self.class_like(
                    BlockKind::Interface,
                    iface.name.value,
                    iface.span(),
                    iface.members.iter(),
                    source,
                );
                self.blocks.push(block);
                false
            }
            Statement::Trait(trait_def) => {
                let block = self.class_like(
                    BlockKind::Trait,
                    trait_def.name.value,
                    trait_def.span(),
                    trait_def.members.iter(),
                    source,
                );
                self.blocks.push(block);
                false
            }
            Statement::Enum(enum_def) => {
                // Enums are not documented themselves; their methods are.
                for member in enum_def.members.iter() {
                    if let Some(block) = self.member_block(member, source) {
                        if block.kind == BlockKind::Method {
                            self.blocks.push(block);
                        }
                    }
                }
                false
            }
            _ => true,
        }
    }
}

impl BlockExtractor<'_> {
    #[allow(clippy::too_many_arguments)]
    fn function_like(
        &self,
        kind: BlockKind,
        name: &str,
        span: Span,
        parameters: Vec<Parameter>,
        declared_return_type: Option<String>,
        body: Option<&[Statement<'_>]>,
        source: &str,
    ) -> DocumentableBlock {
        let (start_line, end_line) = self.line_range(span);
        let mut block = DocumentableBlock::new(kind, name, start_line, end_line);
        block.parameters = parameters;
        block.has_body = body.is_some();

        if let Some(statements) = body {
            if declared_return_type.is_none() {
                block.inferred_return_type = Some(infer_return_type(statements.iter(), source));
            }
            block.thrown_exceptions = collect_thrown_exceptions(statements.iter(), source);
        }
        block.declared_return_type = declared_return_type;
        block
    }

    fn class_like<'b, 'a: 'b>(
        &self,
        kind: BlockKind,
        name: &str,
        span: Span,
        members: impl Iterator<Item = &'b ClassLikeMember<'a>>,
        source: &str,
    ) -> DocumentableBlock {
        let (start_line, end_line) = self.line_range(span);
        let mut block = DocumentableBlock::new(kind, name, start_line, end_line);
        block.children = members
            .filter_map(|member| self.member_block(member, source))
            .collect();
        block
    }

    fn member_block(&self, member: &ClassLikeMember<'_>, source: &str) -> Option<DocumentableBlock> {
        match member {
            ClassLikeMember::Method(method) => {
                let body = match &method.body {
                    MethodBody::Concrete(block) => Some(block.statements.as_slice()),
                    MethodBody::Abstract(_) => None,
                };
                let mut block = self.function_like(
                    BlockKind::Method,
                    method.name.value,
                    member.span(),
                    parameters(&method.parameter_list, source),
                    method
                        .return_type_hint
                        .as_ref()
                        .map(|rth| span_text(source, rth.hint.span())),
                    body,
                    source,
                );
                if let Some(statements) = body {
                    block.children = extract_from_statements(statements, source, self.lines);
                }
                Some(block)
            }
            ClassLikeMember::Property(property) => {
                let name = property
                    .variables()
                    .iter()
                    .next()
                    .map(|var| var.name.trim_start_matches('$').to_string())
                    .unwrap_or_default();
                let (start_line, end_line) = self.line_range(member.span());
                let mut block =
                    DocumentableBlock::new(BlockKind::Property, name, start_line, end_line);
                block.type_hint = property.hint().map(|hint| span_text(source, hint.span()));
                Some(block)
            }
            _ => None,
        }
    }

    fn line_range(&self, span: Span) -> (usize, usize) {
        let start = span.start.offset as usize;
        let end = (span.end.offset as usize).max(start + 1);
        (self.lines.line_of(start), self.lines.line_of(end - 1))
    }
}

fn parameters(list: &FunctionLikeParameterList<'_>, source: &str) -> Vec<Parameter> {
    list.parameters
        .iter()
        .map(|param| Parameter {
            name: param.variable.name.trim_start_matches('$').to_string(),
            declared_type: param
                .hint
                .as_ref()
                .map(|hint| span_text(source, hint.span())),
        })
        .collect()
}

fn span_text(source: &str, span: Span) -> String {
    source[span.start.offset as usize..span.end.offset as usize].to_string()
}
