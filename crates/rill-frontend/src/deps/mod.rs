//! Free-variable analysis and the module-level dependency closure.
//!
//! `FreeVars` computes, bottom-up, the names a node depends on, with
//! binding forms removing the names they introduce. `module_deps`
//! iterates the per-declaration results to a fixpoint, so that each
//! top-level name ends up mapped to its complete external dependency
//! surface. That map is what drives module-parameter instantiation
//! downstream.


use std::collections::{BTreeSet, HashMap};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use log::{debug, trace};

use rill_common::names::Name;

use crate::ast::{
    Bind, BindDef, Decl, Expr, Match, Pattern, Program, Schema, TopDecl, Type,
};

/// The dependencies of a node: the value names, type names and type
/// parameters it mentions. Union (`+`) is the only combinator; it is
/// associative and commutative with the empty triple as identity, so
/// aggregates can simply be summed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Deps {
    pub values: BTreeSet<Name>,
    pub types: BTreeSet<Name>,
    pub type_params: BTreeSet<Name>,
}

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(name: Name) -> Self {
        Self {
            values: BTreeSet::from([name]),
            ..Self::default()
        }
    }

    pub fn ty(name: Name) -> Self {
        Self {
            types: BTreeSet::from([name]),
            ..Self::default()
        }
    }

    pub fn type_param(name: Name) -> Self {
        Self {
            type_params: BTreeSet::from([name]),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.types.is_empty() && self.type_params.is_empty()
    }

    fn without_values(mut self, names: &BTreeSet<Name>) -> Self {
        self.values.retain(|name| !names.contains(name));
        self
    }

    fn without_types(mut self, names: &BTreeSet<Name>) -> Self {
        self.types.retain(|name| !names.contains(name));
        self
    }

    fn without_type_params(mut self, names: &BTreeSet<Name>) -> Self {
        self.type_params.retain(|name| !names.contains(name));
        self
    }
}

impl Add for Deps {
    type Output = Deps;

    fn add(mut self, rhs: Deps) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for Deps {
    fn add_assign(&mut self, rhs: Deps) {
        self.values.extend(rhs.values);
        self.types.extend(rhs.types);
        self.type_params.extend(rhs.type_params);
    }
}

impl Sum for Deps {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::add)
    }
}

pub trait FreeVars {
    fn free_vars(&self) -> Deps;
}

impl<T: FreeVars> FreeVars for [T] {
    fn free_vars(&self) -> Deps {
        self.iter().map(T::free_vars).sum()
    }
}

impl<T: FreeVars> FreeVars for Option<T> {
    fn free_vars(&self) -> Deps {
        self.iter().map(T::free_vars).sum()
    }
}

impl FreeVars for Expr {
    fn free_vars(&self) -> Deps {
        match self {
            Expr::Var(name) => Deps::value(*name),
            Expr::Lit(_) => Deps::new(),

            Expr::Tuple(exprs) | Expr::List(exprs) => exprs.free_vars(),

            Expr::Record(fields) => fields.iter().map(|(_, expr)| expr.free_vars()).sum(),

            Expr::Select(expr, _) | Expr::Split(expr) | Expr::Located(expr, _) => expr.free_vars(),

            Expr::App(fun, arg) => fun.free_vars() + arg.free_vars(),

            Expr::Lambda(params, body) => {
                let mut bound = BTreeSet::new();
                for param in params {
                    pattern_binders(param, &mut bound);
                }

                params.free_vars() + body.free_vars().without_values(&bound)
            }

            Expr::If(cond, then, other) => {
                cond.free_vars() + then.free_vars() + other.free_vars()
            }

            Expr::Where(body, decls) => {
                let mut values = BTreeSet::new();
                let mut types = BTreeSet::new();
                for decl in decls {
                    decl_binders(decl, &mut values, &mut types);
                }

                // The group is recursive: its own names are not free
                // anywhere within it.
                (body.free_vars() + decls.free_vars())
                    .without_values(&values)
                    .without_types(&types)
            }

            Expr::Comp(head, arms) => {
                let mut deps = Deps::new();
                let mut all_bound = BTreeSet::new();

                for arm in arms {
                    let mut bound = BTreeSet::new();

                    for step in arm {
                        match step {
                            Match::From(pat, expr) => {
                                deps += pat.free_vars() + expr.free_vars().without_values(&bound);
                                pattern_binders(pat, &mut bound);
                            }

                            Match::Let(bind) => {
                                deps += bind.free_vars().without_values(&bound);
                                bound.insert(bind.name.value);
                            }
                        }
                    }

                    all_bound.extend(bound);
                }

                deps + head.free_vars().without_values(&all_bound)
            }

            Expr::Typed(expr, ty) => expr.free_vars() + ty.free_vars(),
        }
    }
}

impl FreeVars for Type {
    fn free_vars(&self) -> Deps {
        match self {
            Type::Var(name) => Deps::type_param(*name),

            Type::User(name, args) => Deps::ty(*name) + args.free_vars(),

            Type::Tuple(tys) => tys.free_vars(),

            Type::Record(fields) => fields.iter().map(|(_, ty)| ty.free_vars()).sum(),

            Type::Seq(len, elem) => len.free_vars() + elem.free_vars(),
            Type::Fun(arg, res) => arg.free_vars() + res.free_vars(),

            Type::Num(_) | Type::Wildcard => Deps::new(),

            Type::Located(ty, _) => ty.free_vars(),
        }
    }
}

impl FreeVars for Schema {
    fn free_vars(&self) -> Deps {
        let quantified = self.params.iter().map(|param| param.value).collect();

        (self.props.free_vars() + self.ty.free_vars()).without_type_params(&quantified)
    }
}

/// A pattern's free variables are the ones in its type annotations;
/// the names it binds are handled by [`pattern_binders`].
impl FreeVars for Pattern {
    fn free_vars(&self) -> Deps {
        match self {
            Pattern::Var(_) | Pattern::Wildcard => Deps::new(),

            Pattern::Tuple(pats) | Pattern::List(pats) => pats.free_vars(),

            Pattern::Record(fields) => fields.iter().map(|(_, pat)| pat.free_vars()).sum(),

            Pattern::Typed(pat, ty) => pat.free_vars() + ty.free_vars(),

            Pattern::Split(left, right) => left.free_vars() + right.free_vars(),

            Pattern::Located(pat, _) => pat.free_vars(),
        }
    }
}

impl FreeVars for Bind {
    fn free_vars(&self) -> Deps {
        let mut bound = BTreeSet::new();
        for param in &self.params {
            pattern_binders(param, &mut bound);
        }

        let def = match &self.def {
            BindDef::Expr(expr) => expr.free_vars(),
            BindDef::Prim => Deps::new(),
        };

        self.params.free_vars() + self.signature.free_vars() + def.without_values(&bound)
    }
}

impl FreeVars for Decl {
    fn free_vars(&self) -> Deps {
        match self {
            Decl::Bind(bind) => bind.free_vars(),

            Decl::Signature(sig) => sig.schema.free_vars(),

            Decl::Pragma(..) | Decl::Fixity(..) => Deps::new(),

            Decl::PatternBind(pat, expr) => pat.free_vars() + expr.free_vars(),

            Decl::TySyn(syn) => {
                let params = syn.params.iter().map(|param| param.value).collect();
                syn.def.free_vars().without_type_params(&params)
            }

            Decl::PropSyn(syn) => {
                let params = syn.params.iter().map(|param| param.value).collect();
                syn.props.free_vars().without_type_params(&params)
            }

            Decl::Located(decl, _) => decl.free_vars(),
        }
    }
}

impl FreeVars for TopDecl {
    fn free_vars(&self) -> Deps {
        match self {
            TopDecl::Decl(decl) => decl.free_vars(),

            TopDecl::PrimType(_) | TopDecl::ParamType(_) | TopDecl::Include(_) => Deps::new(),

            TopDecl::ParamConstraint(props) => {
                props.iter().map(|prop| prop.value.free_vars()).sum()
            }

            TopDecl::ParamFun(param) => param.schema.free_vars(),

            TopDecl::Newtype(newtype) => {
                let params = newtype.params.iter().map(|param| param.value).collect();
                newtype
                    .body
                    .iter()
                    .map(|(_, ty)| ty.free_vars())
                    .sum::<Deps>()
                    .without_type_params(&params)
            }
        }
    }
}

/// The names a pattern introduces.
pub fn pattern_binders(pat: &Pattern, into: &mut BTreeSet<Name>) {
    match pat {
        Pattern::Var(name) => {
            into.insert(*name);
        }

        Pattern::Wildcard => {}

        Pattern::Tuple(pats) | Pattern::List(pats) => {
            for pat in pats {
                pattern_binders(pat, into);
            }
        }

        Pattern::Record(fields) => {
            for (_, pat) in fields {
                pattern_binders(pat, into);
            }
        }

        Pattern::Typed(pat, _) | Pattern::Located(pat, _) => pattern_binders(pat, into),

        Pattern::Split(left, right) => {
            pattern_binders(left, into);
            pattern_binders(right, into);
        }
    }
}

/// The value and type names a declaration defines.
fn decl_binders(decl: &Decl, values: &mut BTreeSet<Name>, types: &mut BTreeSet<Name>) {
    match decl {
        Decl::Bind(bind) => {
            values.insert(bind.name.value);
        }

        Decl::PatternBind(pat, _) => pattern_binders(pat, values),

        Decl::TySyn(syn) => {
            types.insert(syn.name.value);
        }

        Decl::PropSyn(syn) => {
            types.insert(syn.name.value);
        }

        Decl::Located(decl, _) => decl_binders(decl, values, types),

        Decl::Signature(_) | Decl::Pragma(..) | Decl::Fixity(..) => {}
    }
}

/// Compute, for every top-level name, the transitive closure of its
/// dependencies. Module-parameter names have no definition here, so
/// they stay in the result as themselves; locally defined names are
/// dropped once the closure is stable, leaving only each name's
/// external dependency surface.
pub fn module_deps(program: &Program) -> HashMap<Name, Deps> {
    debug!("computing module dependency closure");

    let mut deps: im::HashMap<Name, Deps> = im::HashMap::new();
    for decl in &program.decls {
        if let Some(bind) = top_bind(decl) {
            let entry = deps.entry(bind.name.value).or_default();
            *entry = std::mem::take(entry) + bind.free_vars();
        }
    }

    let top_level: BTreeSet<Name> = deps.keys().copied().collect();

    // Each round reads the previous round's complete map; sets only
    // grow, so the loop is bounded by the universe of names. The last
    // round is always a fully stable one.
    let mut rounds = 0;
    loop {
        rounds += 1;

        let mut next = deps.clone();
        for (name, of) in deps.iter() {
            let mut grown = of.clone();
            for reached in &of.values {
                if let Some(full) = deps.get(reached) {
                    grown += full.clone();
                }
            }

            next.insert(*name, grown);
        }

        if next == deps {
            break;
        }

        deps = next;
    }

    trace!("dependency closure stable after {} rounds", rounds);

    deps.into_iter()
        .map(|(name, of)| (name, of.without_values(&top_level)))
        .collect()
}

fn top_bind(decl: &TopDecl) -> Option<&Bind> {
    fn peel(decl: &Decl) -> &Decl {
        match decl {
            Decl::Located(decl, _) => peel(decl),
            _ => decl,
        }
    }

    match decl {
        TopDecl::Decl(decl) => match peel(decl) {
            Decl::Bind(bind) => Some(bind),
            _ => None,
        },

        _ => None,
    }
}
