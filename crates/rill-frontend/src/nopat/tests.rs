use std::collections::BTreeSet;

use rill_common::message::{
    Located, Messages, Span, FIXITY_NO_BIND, MULTIPLE_DOCS, MULTIPLE_FIXITIES,
    MULTIPLE_SIGNATURES, PRAGMA_NO_BIND, SIGNATURE_NO_BIND,
};
use rill_common::names::{Actual, Name, Names};
use rill_common::CollectingDriver;

use crate::ast::{
    Assoc, Bind, BindDef, Decl, Expr, Fixity, Literal, Pattern, Pragma, Program, Schema,
    Selector, Signature, TopDecl, TySyn, Type,
};

use super::{remove_patterns, NoPat};

fn span(at: usize) -> Span {
    Span::new(0, at, at + 1)
}

fn value_bind(name: Name, body: Expr) -> Bind {
    Bind {
        name: Located::new(span(0), name),
        params: Vec::new(),
        def: BindDef::Expr(body),
        signature: None,
        pragmas: Vec::new(),
        mono: false,
        fixity: None,
        doc: None,
        span: span(0),
    }
}

fn mono_schema(ty: Type) -> Schema {
    Schema {
        params: Vec::new(),
        props: Vec::new(),
        ty,
    }
}

/// Normalize a single pattern, asserting that doing so produced no
/// messages.
fn run_pattern(names: &mut Names, pat: Pattern) -> (Pattern, Vec<Bind>) {
    let mut nopat = NoPat::new(names);
    let res = nopat.pattern(pat);
    assert!(nopat.messages.is_empty());
    res
}

fn run_program(names: &mut Names, decls: Vec<TopDecl>) -> (Program, Messages) {
    let mut driver = CollectingDriver::new();
    let program = remove_patterns(&mut driver, names, Program { decls });
    (program, driver.messages)
}

fn codes(messages: &Messages) -> Vec<String> {
    messages
        .msgs
        .iter()
        .filter_map(|msg| msg.code.clone())
        .collect()
}

fn generated_index(names: &Names, name: Name) -> usize {
    match names.get(&name) {
        Actual::Generated(id) => id.index(),
        Actual::Lit(text) => panic!("expected a generated name, found '{}'", text),
    }
}

#[test]
fn simple_pattern_unchanged() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");

    let (pat, bindings) = run_pattern(&mut names, Pattern::Var(a));
    assert_eq!(Pattern::Var(a), pat);
    assert!(bindings.is_empty());
}

#[test]
fn typed_simple_pattern_unchanged() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let t = names.intern(span(1), "T");

    let typed = Pattern::Typed(Box::new(Pattern::Var(a)), Type::User(t, Vec::new()));
    let (pat, bindings) = run_pattern(&mut names, typed.clone());
    assert_eq!(typed, pat);
    assert!(bindings.is_empty());
}

#[test]
fn wildcard_becomes_fresh_variable() {
    let mut names = Names::new();

    let (pat, bindings) = run_pattern(&mut names, Pattern::Wildcard);
    match pat {
        Pattern::Var(x) => {
            generated_index(&names, x);
        }
        _ => panic!("expected a variable"),
    }

    assert!(bindings.is_empty());
}

#[test]
fn tuple_parameter_desugars() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let b = names.intern(span(1), "b");
    let add = names.intern(span(2), "+");
    let f = names.intern(span(3), "f");

    let body = Expr::App(
        Box::new(Expr::App(Box::new(Expr::Var(add)), Box::new(Expr::Var(a)))),
        Box::new(Expr::Var(b)),
    );

    let mut bind = value_bind(f, body.clone());
    bind.params = vec![Pattern::Tuple(vec![Pattern::Var(a), Pattern::Var(b)])];

    let mut nopat = NoPat::new(&mut names);
    let bind = nopat.bind(bind);
    assert!(nopat.messages.is_empty());

    let x = match &bind.params[..] {
        [Pattern::Typed(inner, Type::Tuple(shape))] => {
            assert_eq!(&vec![Type::Wildcard; 2], shape);
            match **inner {
                Pattern::Var(x) => x,
                _ => panic!("expected a variable under the annotation"),
            }
        }
        _ => panic!("expected a single typed variable parameter"),
    };
    generated_index(&names, x);

    match bind.def {
        BindDef::Expr(Expr::Where(inner, decls)) => {
            assert_eq!(body, *inner);
            assert_eq!(2, decls.len());

            for (index, (decl, target)) in decls.iter().zip([a, b]).enumerate() {
                match decl {
                    Decl::Bind(projection) => {
                        assert_eq!(target, projection.name.value);
                        assert!(projection.mono);

                        let expected = Expr::Select(
                            Box::new(Expr::Var(x)),
                            Selector::Tuple {
                                index,
                                arity: Some(2),
                            },
                        );
                        assert_eq!(BindDef::Expr(expected), projection.def);
                    }

                    _ => panic!("expected a synthetic binding"),
                }
            }
        }

        _ => panic!("expected the body to be wrapped in a local scope"),
    }
}

#[test]
fn simple_parameters_leave_body_alone() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let f = names.intern(span(1), "f");

    let mut bind = value_bind(f, Expr::Var(a));
    bind.params = vec![Pattern::Var(a)];

    let mut nopat = NoPat::new(&mut names);
    let bind = nopat.bind(bind);

    assert_eq!(vec![Pattern::Var(a)], bind.params);
    assert_eq!(BindDef::Expr(Expr::Var(a)), bind.def);
}

#[test]
fn split_pattern_desugars_in_order() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let b = names.intern(span(1), "b");

    let pat = Pattern::Split(Box::new(Pattern::Var(a)), Box::new(Pattern::Var(b)));
    let (pat, bindings) = run_pattern(&mut names, pat);

    let x = match pat {
        Pattern::Var(x) => x,
        _ => panic!("expected a variable"),
    };

    assert_eq!(3, bindings.len());

    // The whole-value variable is allocated before the temporary.
    let tmp = bindings[0].name.value;
    assert!(generated_index(&names, x) < generated_index(&names, tmp));
    assert_eq!(
        BindDef::Expr(Expr::Split(Box::new(Expr::Var(x)))),
        bindings[0].def
    );

    for (index, (binding, target)) in bindings[1..].iter().zip([a, b]).enumerate() {
        assert_eq!(target, binding.name.value);

        let expected = Expr::Select(
            Box::new(Expr::Var(tmp)),
            Selector::Tuple {
                index,
                arity: Some(2),
            },
        );
        assert_eq!(BindDef::Expr(expected), binding.def);
    }
}

#[test]
fn record_pattern_preserves_field_order() {
    let mut names = Names::new();
    let fx = names.intern(span(0), "x");
    let fy = names.intern(span(1), "y");
    let a = names.intern(span(2), "a");
    let b = names.intern(span(3), "b");

    let pat = Pattern::Record(vec![(fx, Pattern::Var(a)), (fy, Pattern::Var(b))]);
    let (pat, bindings) = run_pattern(&mut names, pat);

    match pat {
        Pattern::Typed(_, Type::Record(shape)) => {
            assert_eq!(vec![(fx, Type::Wildcard), (fy, Type::Wildcard)], shape);
        }
        _ => panic!("expected a record-typed variable"),
    }

    assert_eq!(2, bindings.len());
    assert_eq!(a, bindings[0].name.value);
    assert_eq!(b, bindings[1].name.value);

    for (binding, field) in bindings.iter().zip([fx, fy]) {
        match &binding.def {
            BindDef::Expr(Expr::Select(_, Selector::Record(selected))) => {
                assert_eq!(&field, selected);
            }
            _ => panic!("expected a record projection"),
        }
    }
}

#[test]
fn list_pattern_projects_by_position() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let b = names.intern(span(1), "b");

    let pat = Pattern::List(vec![Pattern::Var(a), Pattern::Var(b)]);
    let (pat, bindings) = run_pattern(&mut names, pat);

    match pat {
        Pattern::Typed(_, Type::Seq(len, elem)) => {
            assert_eq!(Type::Num(2), *len);
            assert_eq!(Type::Wildcard, *elem);
        }
        _ => panic!("expected a sequence-typed variable"),
    }

    assert_eq!(2, bindings.len());
    for (index, binding) in bindings.iter().enumerate() {
        match &binding.def {
            BindDef::Expr(Expr::Select(_, Selector::List { index: at, length })) => {
                assert_eq!(&index, at);
                assert_eq!(&Some(2), length);
            }
            _ => panic!("expected a positional projection"),
        }
    }
}

#[test]
fn empty_list_pattern_has_no_bindings() {
    let mut names = Names::new();

    let (pat, bindings) = run_pattern(&mut names, Pattern::List(Vec::new()));

    match pat {
        Pattern::Typed(_, Type::Seq(len, elem)) => {
            assert_eq!(Type::Num(0), *len);
            assert_eq!(Type::Wildcard, *elem);
        }
        _ => panic!("expected a sequence-typed variable"),
    }

    assert!(bindings.is_empty());
}

#[test]
fn located_pattern_keeps_its_range() {
    let mut names = Names::new();
    let inner = span(7);

    let (pat, bindings) =
        run_pattern(&mut names, Pattern::Located(Box::new(Pattern::Wildcard), inner));

    match pat {
        Pattern::Located(pat, at) => {
            assert_eq!(inner, at);
            match *pat {
                Pattern::Var(x) => assert_eq!(inner, names.get_span(&x)),
                _ => panic!("expected a variable"),
            }
        }
        _ => panic!("expected the location to be preserved"),
    }

    assert!(bindings.is_empty());
}

#[test]
fn pattern_binding_unwinds_annotations() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let t_in = names.intern(span(1), "Inner");
    let t_out = names.intern(span(2), "Outer");
    let e = Expr::Var(names.intern(span(3), "e"));

    let inner_ty = Type::User(t_in, Vec::new());
    let outer_ty = Type::User(t_out, Vec::new());

    let pat = Pattern::Typed(
        Box::new(Pattern::Typed(Box::new(Pattern::Var(a)), inner_ty.clone())),
        outer_ty.clone(),
    );

    let mut nopat = NoPat::new(&mut names);
    let decls = nopat.pattern_bind(pat, e.clone());
    assert!(nopat.messages.is_empty());

    assert_eq!(1, decls.len());
    match &decls[0] {
        Decl::Bind(bind) => {
            assert_eq!(a, bind.name.value);
            assert!(!bind.mono);

            // The outermost pattern annotation ends up outermost on
            // the right-hand side.
            let expected = Expr::Typed(
                Box::new(Expr::Typed(Box::new(e), inner_ty)),
                outer_ty,
            );
            assert_eq!(BindDef::Expr(expected), bind.def);
        }

        _ => panic!("expected a binding"),
    }
}

#[test]
fn pattern_binding_is_not_generalized() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let b = names.intern(span(1), "b");
    let e = Expr::Var(names.intern(span(2), "e"));

    let pat = Pattern::Tuple(vec![Pattern::Var(a), Pattern::Var(b)]);

    let mut nopat = NoPat::new(&mut names);
    let decls = nopat.pattern_bind(pat, e);
    assert!(nopat.messages.is_empty());

    assert_eq!(3, decls.len());
    match &decls[0] {
        Decl::Bind(primary) => {
            generated_index(&names, primary.name.value);
            assert!(!primary.mono);
        }
        _ => panic!("expected the primary binding first"),
    }

    for decl in &decls[1..] {
        match decl {
            Decl::Bind(projection) => assert!(projection.mono),
            _ => panic!("expected a projection binding"),
        }
    }
}

#[test]
fn user_variables_are_conserved() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let b = names.intern(span(1), "b");
    let c = names.intern(span(2), "c");

    let pat = Pattern::Tuple(vec![
        Pattern::Tuple(vec![Pattern::Var(a), Pattern::Var(b)]),
        Pattern::Var(c),
    ]);

    let (_, bindings) = run_pattern(&mut names, pat);

    let targets: BTreeSet<Name> = bindings
        .iter()
        .map(|binding| binding.name.value)
        .filter(|name| matches!(names.get(name), Actual::Lit(_)))
        .collect();

    assert_eq!(BTreeSet::from([a, b, c]), targets);
}

#[test]
fn normalization_is_deterministic() {
    fn build(names: &mut Names) -> Pattern {
        let a = names.intern(span(0), "a");
        Pattern::Tuple(vec![
            Pattern::Split(Box::new(Pattern::Var(a)), Box::new(Pattern::Wildcard)),
            Pattern::Wildcard,
        ])
    }

    let mut first_names = Names::new();
    let pat = build(&mut first_names);
    let first = run_pattern(&mut first_names, pat);

    let mut second_names = Names::new();
    let pat = build(&mut second_names);
    let second = run_pattern(&mut second_names, pat);

    assert_eq!(format!("{:?}", first), format!("{:?}", second));
}

#[test]
fn comprehension_patterns_become_let_steps() {
    let mut names = Names::new();
    let a = names.intern(span(0), "a");
    let b = names.intern(span(1), "b");
    let xs = names.intern(span(2), "xs");

    let expr = Expr::Comp(
        Box::new(Expr::Var(a)),
        vec![vec![crate::ast::Match::From(
            Pattern::Tuple(vec![Pattern::Var(a), Pattern::Var(b)]),
            Expr::Var(xs),
        )]],
    );

    let mut nopat = NoPat::new(&mut names);
    let expr = nopat.expr(expr);
    assert!(nopat.messages.is_empty());

    match expr {
        Expr::Comp(_, arms) => {
            assert_eq!(1, arms.len());
            let arm = &arms[0];
            assert_eq!(3, arm.len());

            match &arm[0] {
                crate::ast::Match::From(Pattern::Typed(..), Expr::Var(source)) => {
                    assert_eq!(&xs, source);
                }
                _ => panic!("expected the simple draw first"),
            }

            for (step, target) in arm[1..].iter().zip([a, b]) {
                match step {
                    crate::ast::Match::Let(binding) => {
                        assert_eq!(target, binding.name.value);
                    }
                    _ => panic!("expected a let step"),
                }
            }
        }

        _ => panic!("expected a comprehension"),
    }
}

#[test]
fn duplicate_signatures_report_and_first_wins() {
    let mut names = Names::new();
    let f = names.intern(span(0), "f");
    let first = names.intern(span(1), "First");
    let second = names.intern(span(2), "Second");

    let schema = mono_schema(Type::User(first, Vec::new()));

    let decls = vec![
        TopDecl::Decl(Decl::Signature(Signature {
            names: vec![Located::new(span(1), f)],
            schema: schema.clone(),
            doc: None,
        })),
        TopDecl::Decl(Decl::Signature(Signature {
            names: vec![Located::new(span(2), f)],
            schema: mono_schema(Type::User(second, Vec::new())),
            doc: None,
        })),
        TopDecl::Decl(Decl::Bind(value_bind(f, Expr::Lit(Literal::Int(0))))),
    ];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![MULTIPLE_SIGNATURES.to_string()], codes(&messages));

    assert_eq!(1, program.decls.len());
    match &program.decls[0] {
        TopDecl::Decl(Decl::Bind(bind)) => assert_eq!(Some(schema), bind.signature),
        _ => panic!("expected the binding to survive alone"),
    }
}

#[test]
fn orphaned_pragma_is_reported_and_dropped() {
    let mut names = Names::new();
    let g = names.intern(span(0), "g");

    let decls = vec![TopDecl::Decl(Decl::Pragma(
        vec![Located::new(span(1), g)],
        Pragma::Property,
    ))];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![PRAGMA_NO_BIND.to_string()], codes(&messages));
    assert!(program.decls.is_empty());
}

#[test]
fn orphaned_signature_is_reported() {
    let mut names = Names::new();
    let g = names.intern(span(0), "g");
    let t = names.intern(span(1), "T");

    let decls = vec![TopDecl::Decl(Decl::Signature(Signature {
        names: vec![Located::new(span(1), g)],
        schema: mono_schema(Type::User(t, Vec::new())),
        doc: None,
    }))];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![SIGNATURE_NO_BIND.to_string()], codes(&messages));
    assert!(program.decls.is_empty());
}

#[test]
fn pragmas_attach_in_source_order() {
    let mut names = Names::new();
    let f = names.intern(span(0), "f");

    let decls = vec![
        TopDecl::Decl(Decl::Pragma(
            vec![Located::new(span(1), f)],
            Pragma::Property,
        )),
        TopDecl::Decl(Decl::Pragma(
            vec![Located::new(span(2), f)],
            Pragma::Note("checked by hand".into()),
        )),
        TopDecl::Decl(Decl::Bind(value_bind(f, Expr::Lit(Literal::Int(0))))),
    ];

    let (program, messages) = run_program(&mut names, decls);

    assert!(messages.is_empty());
    assert_eq!(1, program.decls.len());
    match &program.decls[0] {
        TopDecl::Decl(Decl::Bind(bind)) => {
            assert_eq!(
                vec![Pragma::Property, Pragma::Note("checked by hand".into())],
                bind.pragmas
            );
        }
        _ => panic!("expected the binding"),
    }
}

#[test]
fn multiple_fixities_report_and_first_wins() {
    let mut names = Names::new();
    let op = names.intern(span(0), "<+>");

    let first = Fixity {
        assoc: Assoc::Left,
        level: 1,
    };
    let second = Fixity {
        assoc: Assoc::Right,
        level: 2,
    };

    let decls = vec![
        TopDecl::Decl(Decl::Fixity(vec![Located::new(span(1), op)], first)),
        TopDecl::Decl(Decl::Fixity(vec![Located::new(span(2), op)], second)),
        TopDecl::Decl(Decl::Bind(value_bind(op, Expr::Lit(Literal::Int(0))))),
    ];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![MULTIPLE_FIXITIES.to_string()], codes(&messages));
    match &program.decls[0] {
        TopDecl::Decl(Decl::Bind(bind)) => assert_eq!(Some(first), bind.fixity),
        _ => panic!("expected the binding"),
    }
}

#[test]
fn orphaned_fixity_is_reported() {
    let mut names = Names::new();
    let op = names.intern(span(0), "<+>");

    let decls = vec![TopDecl::Decl(Decl::Fixity(
        vec![Located::new(span(1), op)],
        Fixity {
            assoc: Assoc::Left,
            level: 1,
        },
    ))];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![FIXITY_NO_BIND.to_string()], codes(&messages));
    assert!(program.decls.is_empty());
}

/// A fixity claimed by declarations in both the value and the type
/// namespace is reported rather than silently accepted by either.
#[test]
fn fixity_drawn_by_both_namespaces_is_flagged() {
    let mut names = Names::new();
    let op = names.intern(span(0), "<+>");

    let fixity = Fixity {
        assoc: Assoc::Left,
        level: 3,
    };

    let decls = vec![
        TopDecl::Decl(Decl::Fixity(vec![Located::new(span(1), op)], fixity)),
        TopDecl::Decl(Decl::Bind(value_bind(op, Expr::Lit(Literal::Int(0))))),
        TopDecl::Decl(Decl::TySyn(TySyn {
            name: Located::new(span(2), op),
            params: Vec::new(),
            def: Type::Num(8),
            fixity: None,
        })),
    ];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![FIXITY_NO_BIND.to_string()], codes(&messages));

    assert_eq!(2, program.decls.len());
    match &program.decls[0] {
        TopDecl::Decl(Decl::Bind(bind)) => assert_eq!(Some(fixity), bind.fixity),
        _ => panic!("expected the binding"),
    }
    match &program.decls[1] {
        TopDecl::Decl(Decl::TySyn(syn)) => assert_eq!(Some(fixity), syn.fixity),
        _ => panic!("expected the type synonym"),
    }
}

#[test]
fn multiple_docs_report_and_first_wins() {
    let mut names = Names::new();
    let f = names.intern(span(0), "f");
    let t = names.intern(span(1), "T");

    let sig_doc = Located::new(span(1), "from the signature".to_string());
    let own_doc = Located::new(span(2), "on the binding".to_string());

    let mut bind = value_bind(f, Expr::Lit(Literal::Int(0)));
    bind.doc = Some(own_doc);

    let decls = vec![
        TopDecl::Decl(Decl::Signature(Signature {
            names: vec![Located::new(span(1), f)],
            schema: mono_schema(Type::User(t, Vec::new())),
            doc: Some(sig_doc),
        })),
        TopDecl::Decl(Decl::Bind(bind)),
    ];

    let (program, messages) = run_program(&mut names, decls);

    assert_eq!(vec![MULTIPLE_DOCS.to_string()], codes(&messages));
    match &program.decls[0] {
        TopDecl::Decl(Decl::Bind(bind)) => {
            assert_eq!(
                Some("from the signature"),
                bind.doc.as_ref().map(|doc| doc.value.as_str())
            );
            assert!(bind.signature.is_some());
        }
        _ => panic!("expected the binding"),
    }
}
