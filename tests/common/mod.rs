#![allow(dead_code)]

use lashc::ast::{
    AssignOp, AssignOpToken, BinaryOp, BinaryOpToken, BoolOp, CompOp, DataType, Expr, ExprKind,
    Fixity, ForInit, MathOp, NodeId, Param, Pos, Program, Stmt, StmtKind, UnaryOp, UnaryOpToken,
    VariableType,
};
use std::fs;
use std::process::Command;

/// Stand-in for the external front end: builds positioned AST nodes with
/// fresh ids. Each statement advances the source line so diagnostics have
/// distinct positions.
pub struct Builder {
    next: u32,
    line: u32,
}

impl Builder {
    pub fn new() -> Self {
        Builder { next: 0, line: 1 }
    }

    pub fn finish(self, statements: Vec<Stmt>) -> Program {
        Program {
            statements,
            nodes: self.next,
        }
    }

    fn id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, 1)
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.id(),
            pos: self.pos(),
            kind,
        }
    }

    fn stmt(&mut self, kind: StmtKind) -> Stmt {
        let stmt = Stmt {
            id: self.id(),
            pos: self.pos(),
            kind,
        };
        self.line += 1;
        stmt
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Int(value))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Float(value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::Str(value.to_string()))
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Bool(value))
    }

    pub fn var(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Var(name.to_string()))
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let token = BinaryOpToken {
            id: self.id(),
            pos: self.pos(),
            op,
        };
        self.expr(ExprKind::Binary {
            op: token,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn math(&mut self, op: MathOp, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOp::Math(op), left, right)
    }

    pub fn comp(&mut self, op: CompOp, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOp::Comp(op), left, right)
    }

    pub fn logic(&mut self, op: BoolOp, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOp::Bool(op), left, right)
    }

    pub fn call(&mut self, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            name: name.to_string(),
            args,
        })
    }

    pub fn assign(&mut self, op: AssignOp, name: &str, value: Expr) -> Expr {
        let target = self.var(name);
        let token = AssignOpToken {
            id: self.id(),
            pos: self.pos(),
            op,
        };
        self.expr(ExprKind::Assign {
            op: token,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn update(&mut self, op: UnaryOp, fixity: Fixity, name: &str) -> Expr {
        let target = self.var(name);
        let token = UnaryOpToken {
            id: self.id(),
            pos: self.pos(),
            op,
        };
        self.expr(ExprKind::Update {
            target: Box::new(target),
            op: token,
            fixity,
        })
    }

    pub fn var_decl(&mut self, name: &str, value: Expr) -> Stmt {
        self.stmt(StmtKind::VarDecl {
            var_type: VariableType::Var,
            name: name.to_string(),
            value,
        })
    }

    pub fn const_decl(&mut self, name: &str, value: Expr) -> Stmt {
        self.stmt(StmtKind::VarDecl {
            var_type: VariableType::Const,
            name: name.to_string(),
            value,
        })
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn block(&mut self, statements: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(statements))
    }

    pub fn if_stmt(&mut self, cond: Expr, body: Vec<Stmt>) -> Stmt {
        let body = self.block(body);
        self.stmt(StmtKind::If {
            cond,
            body: Box::new(body),
        })
    }

    pub fn for_loop(
        &mut self,
        init: Option<ForInit>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    ) -> Stmt {
        let body = self.block(body);
        self.stmt(StmtKind::For {
            init,
            cond,
            update,
            body: Box::new(body),
        })
    }

    pub fn for_init_decl(&mut self, name: &str, value: Expr) -> ForInit {
        let decl = self.var_decl(name, value);
        ForInit::Decl(Box::new(decl))
    }

    pub fn ret(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Return(expr))
    }

    pub fn brk(&mut self) -> Stmt {
        self.stmt(StmtKind::Break)
    }

    pub fn cont(&mut self) -> Stmt {
        self.stmt(StmtKind::Continue)
    }

    pub fn noop(&mut self) -> Stmt {
        self.stmt(StmtKind::NoOp)
    }

    pub fn func(&mut self, name: &str, params: &[(&str, DataType)], body: Vec<Stmt>) -> Stmt {
        let params = params
            .iter()
            .map(|(name, ty)| Param {
                id: self.id(),
                pos: self.pos(),
                name: name.to_string(),
                ty: *ty,
            })
            .collect();
        let body = self.block(body);
        self.stmt(StmtKind::FuncDecl {
            name: name.to_string(),
            params,
            body: Box::new(body),
        })
    }
}

pub fn compile_ok(program: &Program) -> String {
    lashc::compile(program).expect("program should compile")
}

/// Writes the generated script to a temp dir and runs it under bash.
pub fn run_bash(script: &str) -> (String, i32) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("script.sh");
    fs::write(&path, script).expect("failed to write temp script");

    let output = Command::new("bash")
        .arg(&path)
        .output()
        .expect("failed to execute bash");

    let stdout = String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n");
    (stdout, output.status.code().unwrap_or(0))
}
