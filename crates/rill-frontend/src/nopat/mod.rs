//! Rewrites every non-simple pattern into a simple variable pattern
//! plus synthetic projection bindings, and reconciles scattered
//! annotations (signatures, pragmas, fixities, doc comments) with the
//! bindings they belong to.
//!
//! After this pass, the only patterns left at binding sites are
//! variables, possibly wrapped in type annotations.

mod annot;
mod pattern;

#[cfg(test)]
mod tests;

use log::{debug, trace};

use rill_common::message::{Messages, Span};
use rill_common::names::{Name, Names};
use rill_common::Driver;

use crate::ast::{Bind, BindDef, Decl, Expr, Match, Pattern, Program, TopDecl};

pub fn remove_patterns(driver: &mut impl Driver, names: &mut Names, program: Program) -> Program {
    debug!("beginning pattern removal");

    let mut nopat = NoPat::new(names);
    let decls = nopat.top_decls(program.decls);

    driver.report(nopat.messages);

    trace!("done removing patterns");

    Program { decls }
}

/// The state threaded through one invocation of the pass: the name
/// interner (which owns the fresh-name counter), the accumulated
/// messages, and the source range fresh names and diagnostics are
/// attributed to.
struct NoPat<'a> {
    names: &'a mut Names,
    messages: Messages,
    span: Span,
}

impl<'a> NoPat<'a> {
    fn new(names: &'a mut Names) -> Self {
        Self {
            names,
            messages: Messages::new(),
            span: Span::new(0, 0, 0),
        }
    }

    fn fresh(&mut self) -> Name {
        self.names.fresh(self.span)
    }

    fn top_decls(&mut self, decls: Vec<TopDecl>) -> Vec<TopDecl> {
        let mut out = Vec::with_capacity(decls.len());

        for decl in decls {
            match decl {
                TopDecl::Decl(decl) => {
                    out.extend(self.decl(decl).into_iter().map(TopDecl::Decl));
                }

                other => out.push(other),
            }
        }

        self.annot_top_decls(out)
    }

    /// Normalize a declaration list, then merge annotations over the
    /// flattened result.
    fn decls(&mut self, decls: Vec<Decl>) -> Vec<Decl> {
        let mut flat = Vec::with_capacity(decls.len());
        for decl in decls {
            flat.extend(self.decl(decl));
        }

        self.annot_decls(flat)
    }

    /// Expand one declaration into declarations with simple patterns.
    fn decl(&mut self, decl: Decl) -> Vec<Decl> {
        match decl {
            Decl::Bind(bind) => vec![Decl::Bind(self.bind(bind))],

            Decl::PatternBind(pat, expr) => self.pattern_bind(pat, expr),

            Decl::Located(decl, span) => {
                let saved = std::mem::replace(&mut self.span, span);
                let decls = self.decl(*decl);
                self.span = saved;

                decls
                    .into_iter()
                    .map(|decl| Decl::Located(Box::new(decl), span))
                    .collect()
            }

            // Annotations are attached to their bindings afterwards.
            Decl::Signature(_) | Decl::Pragma(..) | Decl::Fixity(..) => vec![decl],

            Decl::TySyn(_) | Decl::PropSyn(_) => vec![decl],
        }
    }

    /// Normalize every parameter pattern of a binding. If any of them
    /// produce projection bindings, the body is wrapped in a scope over
    /// them.
    fn bind(&mut self, bind: Bind) -> Bind {
        let saved = std::mem::replace(&mut self.span, bind.span);

        let mut bindings = Vec::new();
        let params = bind
            .params
            .into_iter()
            .map(|param| {
                let (param, mut more) = self.pattern(param);
                bindings.append(&mut more);
                param
            })
            .collect();

        let def = match bind.def {
            BindDef::Expr(body) => {
                let body = self.expr(body);
                let body = if bindings.is_empty() {
                    body
                } else {
                    let bindings = bindings.into_iter().map(Decl::Bind).collect();
                    Expr::Where(Box::new(body), bindings)
                };

                BindDef::Expr(body)
            }

            BindDef::Prim => BindDef::Prim,
        };

        self.span = saved;

        Bind {
            params,
            def,
            ..bind
        }
    }

    /// Turn a destructuring binding like
    ///
    /// ```rill
    /// (a, b) = e
    /// ```
    ///
    /// into several simple disjoint bindings like
    ///
    /// ```rill
    /// _t0 : (_, _) = e
    /// a = _t0.0
    /// b = _t0.1
    /// ```
    fn pattern_bind(&mut self, pat: Pattern, expr: Expr) -> Vec<Decl> {
        let (pat, bindings) = self.pattern(pat);
        let (name, types) = self.split_simple(pat);

        let expr = self.expr(expr);
        let expr = Self::ascribe(expr, types);

        let primary = Bind {
            name,
            params: Vec::new(),
            def: BindDef::Expr(expr),
            signature: None,
            pragmas: Vec::new(),
            mono: false,
            fixity: None,
            doc: None,
            span: self.span,
        };

        let mut out = Vec::with_capacity(1 + bindings.len());
        out.push(Decl::Bind(primary));
        out.extend(bindings.into_iter().map(Decl::Bind));
        out
    }

    fn expr(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Var(_) | Expr::Lit(_) => expr,

            Expr::Tuple(exprs) => {
                Expr::Tuple(exprs.into_iter().map(|expr| self.expr(expr)).collect())
            }

            Expr::List(exprs) => {
                Expr::List(exprs.into_iter().map(|expr| self.expr(expr)).collect())
            }

            Expr::Record(fields) => Expr::Record(
                fields
                    .into_iter()
                    .map(|(field, expr)| (field, self.expr(expr)))
                    .collect(),
            ),

            Expr::Select(expr, selector) => {
                Expr::Select(Box::new(self.expr(*expr)), selector)
            }

            Expr::App(fun, arg) => {
                let fun = self.expr(*fun);
                let arg = self.expr(*arg);
                Expr::App(Box::new(fun), Box::new(arg))
            }

            Expr::Lambda(params, body) => {
                let mut bindings = Vec::new();
                let params = params
                    .into_iter()
                    .map(|param| {
                        let (param, mut more) = self.pattern(param);
                        bindings.append(&mut more);
                        param
                    })
                    .collect();

                let body = self.expr(*body);
                let body = if bindings.is_empty() {
                    body
                } else {
                    let bindings = bindings.into_iter().map(Decl::Bind).collect();
                    Expr::Where(Box::new(body), bindings)
                };

                Expr::Lambda(params, Box::new(body))
            }

            Expr::If(cond, then, other) => {
                let cond = self.expr(*cond);
                let then = self.expr(*then);
                let other = self.expr(*other);
                Expr::If(Box::new(cond), Box::new(then), Box::new(other))
            }

            Expr::Where(body, decls) => {
                let body = self.expr(*body);
                let decls = self.decls(decls);
                Expr::Where(Box::new(body), decls)
            }

            Expr::Comp(head, arms) => {
                let head = self.expr(*head);
                let arms = arms.into_iter().map(|arm| self.arm(arm)).collect();
                Expr::Comp(Box::new(head), arms)
            }

            Expr::Typed(expr, ty) => Expr::Typed(Box::new(self.expr(*expr)), ty),

            Expr::Split(expr) => Expr::Split(Box::new(self.expr(*expr))),

            Expr::Located(expr, span) => {
                let saved = std::mem::replace(&mut self.span, span);
                let expr = self.expr(*expr);
                self.span = saved;

                Expr::Located(Box::new(expr), span)
            }
        }
    }

    /// Normalize one comprehension arm. A `p <- e` step with a complex
    /// pattern becomes the simple step followed by `let` steps for its
    /// projection bindings.
    fn arm(&mut self, arm: Vec<Match>) -> Vec<Match> {
        let mut out = Vec::with_capacity(arm.len());

        for step in arm {
            match step {
                Match::From(pat, expr) => {
                    let (pat, bindings) = self.pattern(pat);
                    let expr = self.expr(expr);

                    out.push(Match::From(pat, expr));
                    out.extend(bindings.into_iter().map(Match::Let));
                }

                Match::Let(bind) => out.push(Match::Let(self.bind(bind))),
            }
        }

        out
    }
}
