//! The syntax tree as it comes out of the parser. Names are interned
//! but not resolved, type annotations are carried as unchecked syntax,
//! and patterns may still be arbitrarily nested; the `nopat` pass is
//! what reduces them to simple variables.

use rill_common::message::{Located, Span};
use rill_common::names::Name;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Pattern {
    Var(Name),
    Wildcard,
    Tuple(Vec<Pattern>),
    List(Vec<Pattern>),

    /// Named fields, in source order.
    Record(Vec<(Name, Pattern)>),

    Typed(Box<Pattern>, Type),

    /// Bit-concatenation `p1 # p2`.
    Split(Box<Pattern>, Box<Pattern>),

    Located(Box<Pattern>, Span),
}

impl Pattern {
    /// Is this a variable, possibly wrapped in type annotations and
    /// location markers?
    pub fn is_simple(&self) -> bool {
        match self {
            Self::Var(_) => true,
            Self::Typed(pat, _) | Self::Located(pat, _) => pat.is_simple(),
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Literal {
    Int(u64),
    Bit(bool),
}

/// A component projection, as produced for synthetic bindings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selector {
    Tuple {
        index: usize,
        arity: Option<usize>,
    },

    Record(Name),

    List {
        index: usize,
        length: Option<usize>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Var(Name),
    Lit(Literal),

    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Record(Vec<(Name, Expr)>),

    Select(Box<Expr>, Selector),

    App(Box<Expr>, Box<Expr>),
    Lambda(Vec<Pattern>, Box<Expr>),

    If(Box<Expr>, Box<Expr>, Box<Expr>),

    /// An expression with local declarations in scope.
    Where(Box<Expr>, Vec<Decl>),

    /// A comprehension: head expression and one or more parallel arms.
    Comp(Box<Expr>, Vec<Vec<Match>>),

    Typed(Box<Expr>, Type),

    /// The bit-split primitive: turns a word into a pair of its two
    /// halves. Projection bindings for `#`-patterns select out of this.
    Split(Box<Expr>),

    Located(Box<Expr>, Span),
}

/// One step in a comprehension arm.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Match {
    /// `p <- e`
    From(Pattern, Expr),

    /// `let x = e`
    Let(Bind),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Type {
    /// A type variable, bound by a schema or a parameter declaration.
    Var(Name),

    /// A named type, possibly applied to arguments.
    User(Name, Vec<Type>),

    Tuple(Vec<Type>),
    Record(Vec<(Name, Type)>),

    /// `[len] elem`
    Seq(Box<Type>, Box<Type>),

    Fun(Box<Type>, Box<Type>),

    Num(u64),

    /// A type to be filled in by the type checker.
    Wildcard,

    Located(Box<Type>, Span),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    pub params: Vec<Located<Name>>,
    pub props: Vec<Type>,
    pub ty: Type,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Assoc {
    Left,
    Right,
    None,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fixity {
    pub assoc: Assoc,
    pub level: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Pragma {
    Property,
    Note(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindDef {
    Expr(Expr),

    /// Implemented by the runtime rather than by an expression.
    Prim,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bind {
    pub name: Located<Name>,
    pub params: Vec<Pattern>,
    pub def: BindDef,
    pub signature: Option<Schema>,
    pub pragmas: Vec<Pragma>,

    /// If set, this binding is never generalized to a polymorphic
    /// schema.
    pub mono: bool,

    pub fixity: Option<Fixity>,
    pub doc: Option<Located<String>>,
    pub span: Span,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub names: Vec<Located<Name>>,
    pub schema: Schema,
    pub doc: Option<Located<String>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TySyn {
    pub name: Located<Name>,
    pub params: Vec<Located<Name>>,
    pub def: Type,
    pub fixity: Option<Fixity>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropSyn {
    pub name: Located<Name>,
    pub params: Vec<Located<Name>>,
    pub props: Vec<Type>,
    pub fixity: Option<Fixity>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decl {
    Bind(Bind),
    Signature(Signature),
    Pragma(Vec<Located<Name>>, Pragma),
    Fixity(Vec<Located<Name>>, Fixity),

    /// `pattern = expr` at declaration level, to be split into simple
    /// bindings by `nopat`.
    PatternBind(Pattern, Expr),

    TySyn(TySyn),
    PropSyn(PropSyn),

    Located(Box<Decl>, Span),
}

/// A primitive type, declared but not defined.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrimType {
    pub name: Located<Name>,
    pub fixity: Option<Fixity>,
}

/// A module-parameter type: filled in when the module is instantiated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamType {
    pub name: Located<Name>,
    pub fixity: Option<Fixity>,
    pub doc: Option<Located<String>>,
}

/// A module-parameter value: its definition is supplied by whoever
/// instantiates the module, so only its schema is known here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamFun {
    pub name: Located<Name>,
    pub schema: Schema,
    pub doc: Option<Located<String>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Newtype {
    pub name: Located<Name>,
    pub params: Vec<Located<Name>>,
    pub body: Vec<(Name, Type)>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopDecl {
    Decl(Decl),
    PrimType(PrimType),
    ParamType(ParamType),
    ParamConstraint(Vec<Located<Type>>),
    ParamFun(ParamFun),
    Newtype(Newtype),
    Include(Located<String>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    pub decls: Vec<TopDecl>,
}
