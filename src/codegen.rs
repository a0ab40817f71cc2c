use crate::ast::{
    AssignOp, AssignOpToken, BinaryOp, BinaryOpToken, BoolOp, CompOp, DataType, Expr, ExprKind,
    Fixity, ForInit, MathOp, NodeId, Param, Program, Stmt, StmtKind, UnaryOp, UnaryOpToken,
    VariableType,
};
use crate::error::CompileError;
use crate::infer::Types;
use std::collections::HashMap;

/// Interpreter marker plus strict-mode directives, prepended only when
/// requested via `Generator::header`.
const HEADER: &str = "#!/bin/bash\nset -u\nset -e\nset -o pipefail\n\n";

const INDENT: &str = "\t";

/// Exit-status encoding of booleans: success is true.
const TRUE: &str = "0";
const FALSE: &str = "1";

/// Lowering context for one expression. The surrounding construct decides
/// which textual encoding a subexpression must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Raw arithmetic text, as inside a for-loop header or a bc pipe.
    /// Only variable references, literals, binary expressions and update
    /// expressions are legal here.
    Bc,
    /// Operand of a string `+`: references interpolate in place and string
    /// literals drop their quotes; the caller adds one outer pair.
    StringConcat,
}

/// Renders a type-checked program as bash text. One instance per
/// compilation; the synthesized-node type cache never outlives `emit`.
pub struct Generator<'a> {
    program: &'a Program,
    types: &'a Types,
    header: bool,
    /// Types of expressions this generator synthesized itself (compound
    /// assignment desugaring). Consulted before the main type map.
    synth_types: HashMap<NodeId, DataType>,
    next_synth: u32,
}

impl<'a> Generator<'a> {
    pub fn new(program: &'a Program, types: &'a Types) -> Self {
        Self {
            program,
            types,
            header: false,
            synth_types: HashMap::new(),
            next_synth: program.nodes,
        }
    }

    /// Opt into the boilerplate header. Off by default.
    pub fn header(mut self, on: bool) -> Self {
        self.header = on;
        self
    }

    pub fn emit(mut self) -> Result<String, CompileError> {
        let program = self.program;
        let body = self.visit_statements(&program.statements)?;
        if self.header {
            Ok(format!("{HEADER}{body}"))
        } else {
            Ok(body)
        }
    }

    fn visit_statements(&mut self, statements: &[Stmt]) -> Result<String, CompileError> {
        let mut lines = Vec::with_capacity(statements.len());
        for stmt in statements {
            lines.push(self.visit_statement(stmt)?);
        }
        Ok(lines.join("\n"))
    }

    fn visit_statement(&mut self, stmt: &Stmt) -> Result<String, CompileError> {
        match &stmt.kind {
            StmtKind::VarDecl { .. } => self.visit_var_decl(stmt),
            StmtKind::Expr(expr) => self.visit_expr(expr, Mode::Normal, true),
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.visit_for(init.as_ref(), cond.as_ref(), update.as_ref(), body),
            StmtKind::Block(statements) => {
                let body = self.visit_statements(statements)?;
                Ok(format!("{{\n{}\n}}", indent(&body)))
            }
            StmtKind::If { cond, body } => self.visit_if(cond, body),
            StmtKind::Return(expr) => {
                let value = self.visit_expr(expr, Mode::Normal, false)?;
                Ok(format!("return {}", value))
            }
            StmtKind::Break => Ok("break".to_string()),
            StmtKind::Continue => Ok("continue".to_string()),
            StmtKind::NoOp => Ok(String::new()),
            StmtKind::FuncDecl { name, params, body } => self.visit_func_decl(name, params, body),
        }
    }

    /// Like `visit_statement`, except a block contributes its statements
    /// without braces. Used for bodies of constructs that bring their own
    /// delimiters (if/fi, do/done, function braces).
    fn visit_unpacked(&mut self, stmt: &Stmt) -> Result<String, CompileError> {
        match &stmt.kind {
            StmtKind::Block(statements) => self.visit_statements(statements),
            _ => self.visit_statement(stmt),
        }
    }

    fn visit_func_decl(
        &mut self,
        name: &str,
        params: &[Param],
        body: &Stmt,
    ) -> Result<String, CompileError> {
        let mut inner = String::new();
        // Bind each positional argument to its parameter name first.
        for (i, param) in params.iter().enumerate() {
            inner.push_str(&format!("{}=${}\n", param.name, i + 1));
        }
        inner.push_str(&self.visit_unpacked(body)?);
        Ok(format!("function {} {{\n{}\n}}", name, indent(&inner)))
    }

    fn visit_if(&mut self, cond: &Expr, body: &Stmt) -> Result<String, CompileError> {
        let test = self.visit_expr(cond, Mode::Normal, false)?;
        let body = self.visit_unpacked(body)?;
        Ok(format!("if {}; then\n{}\nfi", test, indent(&body)))
    }

    fn visit_for(
        &mut self,
        init: Option<&ForInit>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<String, CompileError> {
        let init = match init {
            Some(ForInit::Decl(decl)) => self.visit_statement(decl)?,
            Some(ForInit::Expr(expr)) => self.visit_expr(expr, Mode::Normal, false)?,
            None => String::new(),
        };
        // The loop header is already a raw arithmetic context, so the
        // condition must not wrap itself in another substitution.
        let cond = match cond {
            Some(expr) => self.visit_expr(expr, Mode::Bc, false)?,
            None => String::new(),
        };
        let update = match update {
            Some(expr) => self.visit_expr(expr, Mode::Normal, false)?,
            None => String::new(),
        };
        let body = self.visit_unpacked(body)?;
        Ok(format!(
            "for (( {}; {}; {} )); do\n{}\ndone",
            init,
            cond,
            update,
            indent(&body)
        ))
    }

    fn visit_var_decl(&mut self, stmt: &Stmt) -> Result<String, CompileError> {
        let (var_type, name, value) = match &stmt.kind {
            StmtKind::VarDecl {
                var_type,
                name,
                value,
            } => (*var_type, name, value),
            other => panic!("expected a variable declaration, found {:?}", other),
        };
        let value = self.visit_expr(value, Mode::Normal, false)?;
        let prefix = match var_type {
            VariableType::Const => "declare -r ",
            VariableType::Var => "",
        };
        if is_test(&value) {
            // A test command has no value of its own; store its exit
            // status instead.
            Ok(format!("{}{}=$({}; echo $?)", prefix, name, value))
        } else {
            Ok(format!("{}{}={}", prefix, name, value))
        }
    }

    /// The resolved type of an expression, looking at synthesized nodes
    /// first since the inferencer never saw those.
    fn expr_type(&self, expr: &Expr) -> DataType {
        match self.synth_types.get(&expr.id) {
            Some(ty) => *ty,
            None => self.types.expr_type(expr),
        }
    }

    fn synth_id(&mut self) -> NodeId {
        let id = NodeId(self.next_synth);
        self.next_synth += 1;
        id
    }

    /// `is_stmt` is true when the expression is the whole content of an
    /// expression statement or the stored right-hand side of an
    /// assignment; it controls whether a boolean rendering is captured as
    /// an exit status and whether a call needs a substitution wrapper.
    fn visit_expr(&mut self, expr: &Expr, mode: Mode, is_stmt: bool) -> Result<String, CompileError> {
        if mode == Mode::Bc {
            if let ExprKind::Call { .. } | ExprKind::Assign { .. } = expr.kind {
                return Err(CompileError::codegen(
                    expr.id,
                    expr.pos,
                    "expression is not supported in an arithmetic context",
                ));
            }
        }
        match &expr.kind {
            ExprKind::Var(name) => Ok(self.visit_var(expr, name, mode)),
            ExprKind::Int(value) => Ok(value.to_string()),
            ExprKind::Float(value) => Ok(value.to_string()),
            ExprKind::Str(value) => {
                if mode == Mode::StringConcat {
                    Ok(value.clone())
                } else {
                    Ok(format!("\"{}\"", value))
                }
            }
            ExprKind::Bool(value) => {
                let status = if *value { TRUE } else { FALSE };
                Ok(status.to_string())
            }
            ExprKind::Binary { op, left, right } => {
                self.visit_binary(expr, op, left, right, mode, is_stmt)
            }
            ExprKind::Update { target, op, fixity } => {
                self.visit_update(target, op, *fixity, mode)
            }
            ExprKind::Call { name, args } => self.visit_call(name, args, is_stmt),
            ExprKind::Assign { op, target, value } => {
                self.visit_assign(expr, op, target, value, is_stmt)
            }
        }
    }

    fn visit_var(&self, expr: &Expr, name: &str, mode: Mode) -> String {
        if mode == Mode::StringConcat {
            // In-place interpolation; the concatenation adds the quotes.
            return format!("${{{}}}", name);
        }
        if self.expr_type(expr) == DataType::Bool {
            // A boolean variable holds an exit status; reading it means
            // testing it.
            return format!("[ ${} -eq 0 ]", name);
        }
        format!("${}", name)
    }

    fn visit_update(
        &mut self,
        target: &Expr,
        op: &UnaryOpToken,
        fixity: Fixity,
        mode: Mode,
    ) -> Result<String, CompileError> {
        match op.op {
            UnaryOp::Inc | UnaryOp::Dec => {
                let sym = if op.op == UnaryOp::Inc { "++" } else { "--" };
                let name = target.var_name();
                Ok(match fixity {
                    Fixity::Prefix => format!("{}{}", sym, name),
                    Fixity::Suffix => format!("{}{}", name, sym),
                })
            }
            UnaryOp::Not => {
                if mode == Mode::Bc {
                    return Err(CompileError::codegen(
                        op.id,
                        op.pos,
                        "boolean operators are not supported in an arithmetic context",
                    ));
                }
                let test = self.visit_expr(target, Mode::Normal, false)?;
                Ok(format!("! {}", test))
            }
        }
    }

    fn visit_call(
        &mut self,
        name: &str,
        args: &[Expr],
        is_stmt: bool,
    ) -> Result<String, CompileError> {
        let mut call = name.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(&self.visit_expr(arg, Mode::Normal, false)?);
        }
        if is_stmt {
            Ok(call)
        } else {
            Ok(format!("$({})", call))
        }
    }

    fn visit_assign(
        &mut self,
        expr: &Expr,
        op: &AssignOpToken,
        target: &Expr,
        value: &Expr,
        is_stmt: bool,
    ) -> Result<String, CompileError> {
        if !is_stmt {
            // The target shell has no assignment expressions; an
            // assignment nested inside another expression cannot be
            // rendered at all.
            return Err(CompileError::codegen(
                expr.id,
                expr.pos,
                "assignment expressions are not allowed inside other expressions",
            ));
        }
        let name = target.var_name();
        if op.op == AssignOp::Assign {
            let value = self.visit_expr(value, Mode::Normal, true)?;
            // Negations come back as bare tests even in statement
            // position; capture them like the declaration path does.
            if is_test(&value) {
                return Ok(format!("{}=$({}; echo $?)", name, value));
            }
            return Ok(format!("{}={}", name, value));
        }
        // Compound assignment desugars to `name OP value` built from the
        // operands' already-resolved types.
        let math = match op.op {
            AssignOp::AddAssign => MathOp::Add,
            AssignOp::SubAssign => MathOp::Sub,
            AssignOp::MulAssign => MathOp::Mul,
            AssignOp::DivAssign => MathOp::Div,
            AssignOp::Assign => unreachable!("plain assignment handled above"),
        };
        let var_ref = Expr {
            id: self.synth_id(),
            pos: target.pos,
            kind: ExprKind::Var(name.to_string()),
        };
        self.synth_types.insert(var_ref.id, self.expr_type(target));
        let token = BinaryOpToken {
            id: self.synth_id(),
            pos: op.pos,
            op: BinaryOp::Math(math),
        };
        let desugared = Expr {
            id: self.synth_id(),
            pos: expr.pos,
            kind: ExprKind::Binary {
                op: token,
                left: Box::new(var_ref),
                right: Box::new(value.clone()),
            },
        };
        self.synth_types
            .insert(desugared.id, self.expr_type(value));
        let value = self.visit_expr(&desugared, Mode::Normal, false)?;
        Ok(format!("{}={}", name, value))
    }

    fn visit_binary(
        &mut self,
        expr: &Expr,
        token: &BinaryOpToken,
        left: &Expr,
        right: &Expr,
        mode: Mode,
        is_stmt: bool,
    ) -> Result<String, CompileError> {
        match token.op {
            BinaryOp::Math(op) => self.visit_math(expr, token, op, left, right, mode),
            BinaryOp::Comp(op) => self.visit_comparison(token, op, left, right, mode, is_stmt),
            BinaryOp::Bool(op) => self.visit_bool(token, op, left, right, mode, is_stmt),
        }
    }

    fn visit_math(
        &mut self,
        expr: &Expr,
        token: &BinaryOpToken,
        op: MathOp,
        left: &Expr,
        right: &Expr,
        mode: Mode,
    ) -> Result<String, CompileError> {
        let ty = self.expr_type(expr);
        if ty == DataType::String && op == MathOp::Add {
            let lhs = self.visit_expr(left, Mode::StringConcat, false)?;
            let rhs = self.visit_expr(right, Mode::StringConcat, false)?;
            return Ok(format!("\"{}{}\"", lhs, rhs));
        }
        if mode == Mode::Bc {
            let lhs = self.bc_operand(token.op, left)?;
            let rhs = self.bc_operand(token.op, right)?;
            return Ok(format!("{} {} {}", lhs, op, rhs));
        }
        match ty {
            DataType::Int => {
                let lhs = self.visit_expr(left, Mode::Normal, false)?;
                let rhs = self.visit_expr(right, Mode::Normal, false)?;
                Ok(format!("$(( {} {} {} ))", lhs, op, rhs))
            }
            DataType::Float => {
                // The shell has no float arithmetic; delegate to bc.
                let lhs = self.bc_operand(token.op, left)?;
                let rhs = self.bc_operand(token.op, right)?;
                Ok(format!("$(echo '{} {} {}' | bc)", lhs, op, rhs))
            }
            other => panic!("math expression of type {:?} reached the generator", other),
        }
    }

    fn visit_bool(
        &mut self,
        token: &BinaryOpToken,
        op: BoolOp,
        left: &Expr,
        right: &Expr,
        mode: Mode,
        is_stmt: bool,
    ) -> Result<String, CompileError> {
        if mode == Mode::Bc {
            return Err(CompileError::codegen(
                token.id,
                token.pos,
                "boolean operators are not supported in an arithmetic context",
            ));
        }
        let sym = match op {
            BoolOp::And => " && ",
            BoolOp::Or => " || ",
        };
        let lhs = self.visit_expr(left, Mode::Normal, false)?;
        let rhs = self.visit_expr(right, Mode::Normal, false)?;
        let test = format!("{}{}{}", lhs, sym, rhs);
        if is_stmt {
            Ok(format!("$({}; echo $?)", test))
        } else {
            Ok(test)
        }
    }

    fn visit_comparison(
        &mut self,
        token: &BinaryOpToken,
        op: CompOp,
        left: &Expr,
        right: &Expr,
        mode: Mode,
        is_stmt: bool,
    ) -> Result<String, CompileError> {
        let lhs_ty = self.expr_type(left);
        let rhs_ty = self.expr_type(right);
        let needs_bc = mode == Mode::Bc || lhs_ty == DataType::Float || rhs_ty == DataType::Float;
        // String operands and raw arithmetic contexts use the symbolic
        // operator; the test command wants its flag form.
        let symbolic = lhs_ty == DataType::String || needs_bc;
        let op_src = match (op, symbolic) {
            (CompOp::Lt, false) => "-lt",
            (CompOp::Lt, true) => "<",
            (CompOp::Gt, false) => "-gt",
            (CompOp::Gt, true) => ">",
            (CompOp::Eq, false) => "-eq",
            (CompOp::Eq, true) => "=",
            (CompOp::NotEq, false) => "-ne",
            (CompOp::NotEq, true) => "!=",
            (CompOp::Le, false) => "-le",
            (CompOp::Ge, false) => "-ge",
            (CompOp::Le | CompOp::Ge, true) => {
                if lhs_ty == DataType::String || rhs_ty == DataType::String {
                    return Err(CompileError::codegen(
                        token.id,
                        token.pos,
                        format!("comparator {} is not available for string operands", op),
                    ));
                }
                if op == CompOp::Le { "<=" } else { ">=" }
            }
        };
        if mode == Mode::Bc {
            let lhs = self.bc_operand(token.op, left)?;
            let rhs = self.bc_operand(token.op, right)?;
            return Ok(format!("{} {} {}", lhs, op_src, rhs));
        }
        let test = if needs_bc {
            // Float comparisons go through bc; its textual output `1`
            // means the relation holds.
            let lhs = self.bc_operand(token.op, left)?;
            let rhs = self.bc_operand(token.op, right)?;
            format!("[ $(echo \"{} {} {}\" | bc -l) -eq 1 ]", lhs, op_src, rhs)
        } else {
            let lhs = self.visit_expr(left, Mode::Normal, false)?;
            let rhs = self.visit_expr(right, Mode::Normal, false)?;
            format!("[ {} {} {} ]", lhs, op_src, rhs)
        };
        if is_stmt {
            Ok(format!("$({}; echo $?)", test))
        } else {
            Ok(test)
        }
    }

    /// Renders a child of an arithmetic expression in BC mode, adding
    /// parentheses when an additive child sits under a multiplicative
    /// parent; every other combination already matches emission order.
    fn bc_operand(&mut self, parent: BinaryOp, child: &Expr) -> Result<String, CompileError> {
        let src = self.visit_expr(child, Mode::Bc, false)?;
        if needs_parens(parent, child) {
            Ok(format!("({})", src))
        } else {
            Ok(src)
        }
    }
}

/// True when a rendered value is a test command, either a plain `[ ... ]`
/// or its negation. Literals and substitutions never start this way.
fn is_test(value: &str) -> bool {
    value.starts_with('[') || value.starts_with("! ")
}

fn needs_parens(parent: BinaryOp, child: &Expr) -> bool {
    if !matches!(parent, BinaryOp::Math(MathOp::Mul) | BinaryOp::Math(MathOp::Div)) {
        return false;
    }
    match &child.kind {
        ExprKind::Binary { op, .. } => {
            matches!(op.op, BinaryOp::Math(MathOp::Add) | BinaryOp::Math(MathOp::Sub))
        }
        _ => false,
    }
}

/// Prefixes every line of a nested body with one indent unit.
fn indent(src: &str) -> String {
    src.split('\n')
        .map(|line| format!("{}{}", INDENT, line))
        .collect::<Vec<_>>()
        .join("\n")
}
