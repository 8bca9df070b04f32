//! The per-shape pattern rewrites. Each rule turns one pattern
//! constructor into a fresh variable (typed with a shape witness where
//! the shape is known) plus projection bindings for its components.

use rill_common::message::Located;
use rill_common::names::Name;

use crate::ast::{Bind, BindDef, Expr, Pattern, Selector, Type};

use super::NoPat;

impl NoPat<'_> {
    /// Normalize a pattern into a simple one, producing the synthetic
    /// bindings that project its components back out. Fresh names are
    /// consumed depth-first, left to right: sub-patterns allocate
    /// before the enclosing shape's own variables.
    pub(super) fn pattern(&mut self, pat: Pattern) -> (Pattern, Vec<Bind>) {
        match pat {
            Pattern::Var(_) => (pat, Vec::new()),

            Pattern::Wildcard => {
                let x = self.fresh();
                (Pattern::Var(x), Vec::new())
            }

            Pattern::Tuple(pats) => {
                let arity = pats.len();
                let (simples, rest) = self.patterns(pats);

                let x = self.fresh();
                let ty = Type::Tuple(vec![Type::Wildcard; arity]);

                let mut bindings = Vec::with_capacity(arity + rest.len());
                for (index, simple) in simples.into_iter().enumerate() {
                    let selector = Selector::Tuple {
                        index,
                        arity: Some(arity),
                    };
                    bindings.push(self.select_bind(simple, x, selector));
                }

                bindings.extend(rest);

                (self.typed_var(x, ty), bindings)
            }

            Pattern::List(pats) => {
                let length = pats.len();
                let (simples, rest) = self.patterns(pats);

                let x = self.fresh();
                let ty = Type::Seq(
                    Box::new(Type::Num(length as u64)),
                    Box::new(Type::Wildcard),
                );

                let mut bindings = Vec::with_capacity(length + rest.len());
                for (index, simple) in simples.into_iter().enumerate() {
                    let selector = Selector::List {
                        index,
                        length: Some(length),
                    };
                    bindings.push(self.select_bind(simple, x, selector));
                }

                bindings.extend(rest);

                (self.typed_var(x, ty), bindings)
            }

            Pattern::Record(fields) => {
                let mut simples = Vec::with_capacity(fields.len());
                let mut rest = Vec::new();
                let mut shape = Vec::with_capacity(fields.len());

                for (field, pat) in fields {
                    let (simple, mut more) = self.pattern(pat);
                    simples.push((field, simple));
                    rest.append(&mut more);
                    shape.push((field, Type::Wildcard));
                }

                let x = self.fresh();
                let ty = Type::Record(shape);

                let mut bindings = Vec::with_capacity(simples.len() + rest.len());
                for (field, simple) in simples {
                    bindings.push(self.select_bind(simple, x, Selector::Record(field)));
                }

                bindings.extend(rest);

                (self.typed_var(x, ty), bindings)
            }

            Pattern::Typed(pat, ty) => {
                let (pat, bindings) = self.pattern(*pat);
                (Pattern::Typed(Box::new(pat), ty), bindings)
            }

            Pattern::Split(left, right) => {
                let (left, left_bindings) = self.pattern(*left);
                let (right, right_bindings) = self.pattern(*right);

                let x = self.fresh();
                let tmp = self.fresh();

                let temp_bind = self.simple_bind(
                    Located::new(self.span, tmp),
                    Expr::Split(Box::new(Expr::Var(x))),
                );

                let left_bind = self.select_bind(
                    left,
                    tmp,
                    Selector::Tuple {
                        index: 0,
                        arity: Some(2),
                    },
                );
                let right_bind = self.select_bind(
                    right,
                    tmp,
                    Selector::Tuple {
                        index: 1,
                        arity: Some(2),
                    },
                );

                let mut bindings = vec![temp_bind, left_bind, right_bind];
                bindings.extend(left_bindings);
                bindings.extend(right_bindings);

                (Pattern::Var(x), bindings)
            }

            Pattern::Located(pat, span) => {
                let saved = std::mem::replace(&mut self.span, span);
                let (pat, bindings) = self.pattern(*pat);
                self.span = saved;

                (Pattern::Located(Box::new(pat), span), bindings)
            }
        }
    }

    /// Normalize a sequence of sub-patterns, concatenating their
    /// bindings left to right.
    fn patterns(&mut self, pats: Vec<Pattern>) -> (Vec<Pattern>, Vec<Bind>) {
        let mut simples = Vec::with_capacity(pats.len());
        let mut bindings = Vec::new();

        for pat in pats {
            let (simple, mut more) = self.pattern(pat);
            simples.push(simple);
            bindings.append(&mut more);
        }

        (simples, bindings)
    }

    /// Strip a normalized pattern down to its variable, collecting its
    /// type annotations outermost-first.
    ///
    /// Anything else here means a pattern survived normalization, which
    /// breaks the contract with the parser.
    pub(super) fn split_simple(&self, pat: Pattern) -> (Located<Name>, Vec<Type>) {
        let mut types = Vec::new();
        let mut span = self.span;
        let mut pat = pat;

        loop {
            match pat {
                Pattern::Var(name) => return (Located::new(span, name), types),

                Pattern::Typed(inner, ty) => {
                    types.push(ty);
                    pat = *inner;
                }

                Pattern::Located(inner, at) => {
                    span = at;
                    pat = *inner;
                }

                _ => unreachable!("non-simple pattern after normalization"),
            }
        }
    }

    /// Re-apply stripped annotations to an expression, outermost last.
    pub(super) fn ascribe(expr: Expr, types: Vec<Type>) -> Expr {
        types
            .into_iter()
            .rev()
            .fold(expr, |expr, ty| Expr::Typed(Box::new(expr), ty))
    }

    /// Bind the (simple) pattern to the given projection out of `of`.
    fn select_bind(&mut self, pat: Pattern, of: Name, selector: Selector) -> Bind {
        let (name, types) = self.split_simple(pat);
        let expr = Expr::Select(Box::new(Expr::Var(of)), selector);

        self.simple_bind(name, Self::ascribe(expr, types))
    }

    fn typed_var(&self, x: Name, ty: Type) -> Pattern {
        Pattern::Typed(Box::new(Pattern::Var(x)), ty)
    }

    /// A synthetic binding: no parameters, no annotations, monomorphic.
    fn simple_bind(&self, name: Located<Name>, expr: Expr) -> Bind {
        Bind {
            name,
            params: Vec::new(),
            def: BindDef::Expr(expr),
            signature: None,
            pragmas: Vec::new(),
            mono: true,
            fixity: None,
            doc: None,
            span: self.span,
        }
    }
}
