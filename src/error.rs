use crate::ast::{NodeId, Pos};
use std::fmt;

/// User-facing fault categories. Internal invariant violations (front-end
/// mismatch, querying an unvisited expression's type) panic instead; they
/// indicate a compiler defect, never a problem with the input program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateName,
    InvalidVariableReference,
    NestedFunction,
    Type,
    Codegen,
}

impl ErrorKind {
    fn name(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateName => "DuplicateNameError",
            ErrorKind::InvalidVariableReference => "InvalidVariableReferenceError",
            ErrorKind::NestedFunction => "NestedFunctionError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Codegen => "CodegenError",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub node: NodeId,
    pub pos: Pos,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, node: NodeId, pos: Pos, message: impl Into<String>) -> Self {
        Self {
            kind,
            node,
            pos,
            message: message.into(),
        }
    }

    pub fn duplicate_name(node: NodeId, pos: Pos, name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateName,
            node,
            pos,
            format!("the variable {} has already been declared", name),
        )
    }

    pub fn invalid_reference(node: NodeId, pos: Pos, name: &str) -> Self {
        Self::new(
            ErrorKind::InvalidVariableReference,
            node,
            pos,
            format!("the variable {} does not exist", name),
        )
    }

    pub fn nested_function(node: NodeId, pos: Pos) -> Self {
        Self::new(
            ErrorKind::NestedFunction,
            node,
            pos,
            "function declarations are only allowed at the top level",
        )
    }

    pub fn type_error(node: NodeId, pos: Pos, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, node, pos, message)
    }

    pub fn codegen(node: NodeId, pos: Pos, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Codegen, node, pos, message)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on line {}:{}: {}",
            self.kind.name(),
            self.pos.line,
            self.pos.col,
            self.message
        )
    }
}

impl std::error::Error for CompileError {}
