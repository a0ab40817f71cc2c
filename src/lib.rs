pub mod ast;
pub mod codegen;
pub mod error;
pub mod infer;

use ast::Program;
use error::CompileError;

/// Runs the full back end over an AST handed over by the front end: type
/// inference followed by code generation, aborting on the first fault.
pub fn compile(program: &Program) -> Result<String, CompileError> {
    let types = infer::infer(program)?;
    codegen::Generator::new(program, &types).emit()
}
