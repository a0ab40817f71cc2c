use std::fmt;

/// Stable identity of an AST node, assigned by the front end at
/// construction. All side tables (type map, synthesized-node cache) are
/// keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Source position of a node's first token. Line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Pos { line, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    String,
    Bool,
    Any,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::String => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
            DataType::Any => write!(f, "any"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Var,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Inc,
    Dec,
    Not,
}

/// The operator of a binary expression. Assignment operators are carried by
/// `ExprKind::Assign` instead, so they do not appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Math(MathOp),
    Comp(CompOp),
    Bool(BoolOp),
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathOp::Add => write!(f, "+"),
            MathOp::Sub => write!(f, "-"),
            MathOp::Mul => write!(f, "*"),
            MathOp::Div => write!(f, "/"),
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompOp::Lt => write!(f, "<"),
            CompOp::Gt => write!(f, ">"),
            CompOp::Le => write!(f, "<="),
            CompOp::Ge => write!(f, ">="),
            CompOp::Eq => write!(f, "=="),
            CompOp::NotEq => write!(f, "!="),
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "&&"),
            BoolOp::Or => write!(f, "||"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Math(op) => op.fmt(f),
            BinaryOp::Comp(op) => op.fmt(f),
            BinaryOp::Bool(op) => op.fmt(f),
        }
    }
}

/// Operator tokens carry their own position so diagnostics can point at the
/// operator rather than at the whole expression that uses it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryOpToken {
    pub id: NodeId,
    pub pos: Pos,
    pub op: BinaryOp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignOpToken {
    pub id: NodeId,
    pub pos: Pos,
    pub op: AssignOp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryOpToken {
    pub id: NodeId,
    pub pos: Pos,
    pub op: UnaryOp,
}

/// Whether an update operator was written before or after its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub pos: Pos,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Var(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Binary {
        op: BinaryOpToken,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `++x`, `x--`, `!flag`. The target must be a variable reference.
    Update {
        target: Box<Expr>,
        op: UnaryOpToken,
        fixity: Fixity,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// The target must be a variable reference.
    Assign {
        op: AssignOpToken,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    /// The referenced variable's name. Panics on any other node kind; the
    /// front end guarantees assignment and update targets are references.
    pub fn var_name(&self) -> &str {
        match &self.kind {
            ExprKind::Var(name) => name,
            other => panic!("expected a variable reference, found {:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: NodeId,
    pub pos: Pos,
    pub name: String,
    pub ty: DataType,
}

/// The first slot of a for-loop header.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// The inner statement must be a `VarDecl`.
    Decl(Box<Stmt>),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub pos: Pos,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl {
        var_type: VariableType,
        name: String,
        value: Expr,
    },
    Expr(Expr),
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    If {
        cond: Expr,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Return(Expr),
    Break,
    Continue,
    /// A blank source line, preserved so output lines track input lines.
    NoOp,
    FuncDecl {
        name: String,
        params: Vec<Param>,
        body: Box<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// One past the highest `NodeId` the front end allocated. The code
    /// generator hands out ids for synthesized nodes starting here, so they
    /// can never collide with front-end ids.
    pub nodes: u32,
}
