use crate::ast::{
    AssignOpToken, BinaryOp, BinaryOpToken, CompOp, DataType, Expr, ExprKind, ForInit, MathOp,
    NodeId, Param, Program, Stmt, StmtKind, UnaryOp, UnaryOpToken,
};
use crate::error::CompileError;
use std::collections::HashMap;

/// Result of a completed inference pass: every expression node the
/// traversal visited is mapped to exactly one resolved type.
#[derive(Debug)]
pub struct Types {
    map: HashMap<NodeId, DataType>,
}

impl Types {
    pub fn expr_type(&self, expr: &Expr) -> DataType {
        self.type_of(expr.id)
    }

    /// Panics when the node was never visited. That can only happen when
    /// the generator is handed an AST the inferencer did not see, which is
    /// an implementation defect rather than a user error.
    pub fn type_of(&self, id: NodeId) -> DataType {
        match self.map.get(&id) {
            Some(ty) => *ty,
            None => panic!("no inferred type recorded for node {:?}", id),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Runs scope resolution and type inference over the whole program and
/// either yields the finished type map or the first semantic fault.
pub fn infer(program: &Program) -> Result<Types, CompileError> {
    let mut inferencer = TypeInferencer::new();
    inferencer.visit_statements(&program.statements)?;
    Ok(Types {
        map: inferencer.types,
    })
}

type Scope = HashMap<String, DataType>;

/// Single depth-first traversal that resolves names and computes a type
/// for every expression. The scope stack starts with the global scope; a
/// function body pushes exactly one flat local scope on top (no nested
/// block scoping), so a stack deeper than two means a nested function
/// declaration.
struct TypeInferencer {
    scopes: Vec<Scope>,
    types: HashMap<NodeId, DataType>,
}

impl TypeInferencer {
    fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
            types: HashMap::new(),
        }
    }

    /// The scope declarations currently bind into: the local scope while
    /// inside a function body, the global scope otherwise.
    fn active_scope(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    /// Resolves a name against the local scope first, then the global one.
    fn var_type(&self, expr: &Expr, name: &str) -> Result<DataType, CompileError> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return Ok(*ty);
            }
        }
        Err(CompileError::invalid_reference(expr.id, expr.pos, name))
    }

    fn visit_statements(&mut self, statements: &[Stmt]) -> Result<(), CompileError> {
        for stmt in statements {
            self.visit_statement(stmt)?;
        }
        Ok(())
    }

    fn visit_statement(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match &stmt.kind {
            StmtKind::VarDecl { .. } => self.visit_var_decl(stmt),
            StmtKind::Expr(expr) => self.visit_expression(expr).map(|_| ()),
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.visit_for(init.as_ref(), cond.as_ref(), update.as_ref(), body),
            StmtKind::Block(statements) => self.visit_statements(statements),
            StmtKind::If { cond, body } => self.visit_if(cond, body),
            StmtKind::Return(expr) => self.visit_expression(expr).map(|_| ()),
            StmtKind::Break | StmtKind::Continue | StmtKind::NoOp => Ok(()),
            StmtKind::FuncDecl { params, body, .. } => self.visit_func_decl(stmt, params, body),
        }
    }

    fn visit_func_decl(
        &mut self,
        stmt: &Stmt,
        params: &[Param],
        body: &Stmt,
    ) -> Result<(), CompileError> {
        if self.scopes.len() > 1 {
            return Err(CompileError::nested_function(stmt.id, stmt.pos));
        }
        let mut scope = Scope::new();
        for param in params {
            scope.insert(param.name.clone(), param.ty);
        }
        self.scopes.push(scope);
        self.visit_statement(body)?;
        self.scopes.pop();
        Ok(())
    }

    fn visit_if(&mut self, cond: &Expr, body: &Stmt) -> Result<(), CompileError> {
        let ty = self.visit_expression(cond)?;
        if ty != DataType::Bool {
            return Err(CompileError::type_error(
                cond.id,
                cond.pos,
                "boolean expression expected",
            ));
        }
        self.visit_statement(body)
    }

    fn visit_for(
        &mut self,
        init: Option<&ForInit>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<(), CompileError> {
        match init {
            Some(ForInit::Decl(decl)) => self.visit_var_decl(decl)?,
            Some(ForInit::Expr(expr)) => {
                self.visit_expression(expr)?;
            }
            None => {}
        }
        if let Some(cond) = cond {
            self.visit_expression(cond)?;
        }
        if let Some(update) = update {
            self.visit_expression(update)?;
        }
        self.visit_statement(body)
    }

    fn visit_var_decl(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let (name, value) = match &stmt.kind {
            StmtKind::VarDecl { name, value, .. } => (name, value),
            other => panic!("expected a variable declaration, found {:?}", other),
        };
        // The initializer is visited before the duplicate check so that a
        // reference fault inside it wins over the duplicate fault.
        let ty = self.visit_expression(value)?;
        let scope = self.active_scope();
        if scope.contains_key(name) {
            return Err(CompileError::duplicate_name(stmt.id, stmt.pos, name));
        }
        scope.insert(name.clone(), ty);
        Ok(())
    }

    fn visit_expression(&mut self, expr: &Expr) -> Result<DataType, CompileError> {
        let ty = match &expr.kind {
            ExprKind::Var(name) => self.var_type(expr, name)?,
            ExprKind::Int(_) => DataType::Int,
            ExprKind::Float(_) => DataType::Float,
            ExprKind::Str(_) => DataType::String,
            ExprKind::Bool(_) => DataType::Bool,
            ExprKind::Binary { op, left, right } => self.visit_binary(op, left, right)?,
            ExprKind::Update { target, op, .. } => self.visit_update(target, op)?,
            ExprKind::Call { args, .. } => self.visit_call(args)?,
            ExprKind::Assign { op, target, value } => self.visit_assign(op, target, value)?,
        };
        self.types.insert(expr.id, ty);
        Ok(ty)
    }

    fn visit_assign(
        &mut self,
        op: &AssignOpToken,
        target: &Expr,
        value: &Expr,
    ) -> Result<DataType, CompileError> {
        let rhs_ty = self.visit_expression(value)?;
        let name = target.var_name();
        let var_ty = self.var_type(target, name)?;
        // The generator reads the target's type when desugaring compound
        // assignments, so record it even though the target is not visited
        // as a full expression.
        self.types.insert(target.id, var_ty);
        if rhs_ty != var_ty {
            return Err(CompileError::type_error(
                op.id,
                op.pos,
                format!(
                    "trying to assign {} to variable {} of type {}",
                    rhs_ty, name, var_ty
                ),
            ));
        }
        Ok(var_ty)
    }

    fn visit_update(
        &mut self,
        target: &Expr,
        op: &UnaryOpToken,
    ) -> Result<DataType, CompileError> {
        let ty = self.var_type(target, target.var_name())?;
        // The generator renders a negation by revisiting its operand, so
        // the operand needs a recorded type just like an assignment target.
        self.types.insert(target.id, ty);
        match op.op {
            UnaryOp::Inc | UnaryOp::Dec => {
                if ty != DataType::Int {
                    return Err(CompileError::type_error(
                        op.id,
                        op.pos,
                        "increment and decrement require an operand of type int",
                    ));
                }
                Ok(DataType::Int)
            }
            UnaryOp::Not => {
                if ty != DataType::Bool {
                    return Err(CompileError::type_error(
                        op.id,
                        op.pos,
                        "negation can only be applied to boolean values",
                    ));
                }
                Ok(DataType::Bool)
            }
        }
    }

    fn visit_binary(
        &mut self,
        token: &BinaryOpToken,
        left: &Expr,
        right: &Expr,
    ) -> Result<DataType, CompileError> {
        let lhs = self.visit_expression(left)?;
        let rhs = self.visit_expression(right)?;
        match token.op {
            BinaryOp::Math(math) => self.check_math(token, math, lhs, rhs),
            BinaryOp::Comp(comp) => self.check_comparison(token, comp, lhs, rhs),
            BinaryOp::Bool(op) => {
                if lhs != DataType::Bool || rhs != DataType::Bool {
                    return Err(CompileError::type_error(
                        token.id,
                        token.pos,
                        format!("operator {} can only be applied to boolean values", op),
                    ));
                }
                Ok(DataType::Bool)
            }
        }
    }

    fn check_math(
        &self,
        token: &BinaryOpToken,
        op: MathOp,
        lhs: DataType,
        rhs: DataType,
    ) -> Result<DataType, CompileError> {
        if lhs == DataType::String || rhs == DataType::String {
            if op != MathOp::Add {
                return Err(CompileError::type_error(
                    token.id,
                    token.pos,
                    format!("the operator {} does not allow string operands", op),
                ));
            }
            if lhs != rhs {
                return Err(CompileError::type_error(
                    token.id,
                    token.pos,
                    "string concatenation only supports string operands",
                ));
            }
            return Ok(DataType::String);
        }
        if lhs != DataType::Int && lhs != DataType::Float {
            return Err(CompileError::type_error(
                token.id,
                token.pos,
                format!("left hand side must be numeric for operator {}", op),
            ));
        }
        if rhs != DataType::Int && rhs != DataType::Float {
            return Err(CompileError::type_error(
                token.id,
                token.pos,
                format!("right hand side must be numeric for operator {}", op),
            ));
        }
        if lhs == DataType::Float || rhs == DataType::Float {
            Ok(DataType::Float)
        } else {
            Ok(DataType::Int)
        }
    }

    fn check_comparison(
        &self,
        token: &BinaryOpToken,
        op: CompOp,
        lhs: DataType,
        rhs: DataType,
    ) -> Result<DataType, CompileError> {
        match op {
            // Preserved asymmetry: <= and >= accept int operands only,
            // while the other comparators also take float and string.
            CompOp::Le | CompOp::Ge => {
                if lhs != DataType::Int || rhs != DataType::Int {
                    return Err(CompileError::type_error(
                        token.id,
                        token.pos,
                        format!("comparator {} only works with int operands", op),
                    ));
                }
                Ok(DataType::Bool)
            }
            CompOp::Eq | CompOp::NotEq | CompOp::Lt | CompOp::Gt => {
                let comparable =
                    |ty: DataType| matches!(ty, DataType::Int | DataType::Float | DataType::String);
                if !comparable(lhs) {
                    return Err(CompileError::type_error(
                        token.id,
                        token.pos,
                        format!(
                            "left hand side must be int, float or string for comparator {}",
                            op
                        ),
                    ));
                }
                if !comparable(rhs) {
                    return Err(CompileError::type_error(
                        token.id,
                        token.pos,
                        format!(
                            "right hand side must be int, float or string for comparator {}",
                            op
                        ),
                    ));
                }
                if (lhs == DataType::String) != (rhs == DataType::String) {
                    return Err(CompileError::type_error(
                        token.id,
                        token.pos,
                        format!("comparator {} can only compare values of the same type", op),
                    ));
                }
                Ok(DataType::Bool)
            }
        }
    }

    fn visit_call(&mut self, args: &[Expr]) -> Result<DataType, CompileError> {
        for arg in args {
            self.visit_expression(arg)?;
        }
        // Preserved limitation: a call's result is always reported as int,
        // whatever the callee actually returns.
        Ok(DataType::Int)
    }
}
