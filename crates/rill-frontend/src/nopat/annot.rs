//! Attaches free-standing annotations to the bindings they name.
//!
//! A first pass collects every signature, pragma, fixity and doc
//! comment into per-identifier tables in source order. A second pass
//! walks the declaration list: bindings pop their entries (duplicates
//! are reported, the earliest wins), pure annotation declarations are
//! dropped from the output, and whatever is left in the tables at the
//! end is reported as orphaned.
//!
//! Fixities are the one wrinkle: a single table serves operator names
//! in both the value and the type namespace, so entries are marked
//! rather than popped, and a name claimed by both namespaces is
//! reported as unresolved instead of silently accepted by either side.

use std::collections::{BTreeMap, BTreeSet};

use rill_common::message::{Located, Span};
use rill_common::names::Name;

use crate::ast::{Bind, Decl, Fixity, Pragma, Schema, TopDecl};

use super::NoPat;

#[derive(Debug, Default)]
struct AnnotMap {
    signatures: BTreeMap<Name, Vec<(Span, Schema)>>,
    pragmas: BTreeMap<Name, Vec<(Span, Pragma)>>,
    fixities: BTreeMap<Name, Vec<(Span, Fixity)>>,
    docs: BTreeMap<Name, Vec<Located<String>>>,

    /// Which namespaces have drawn each fixity name.
    value_fixities: BTreeSet<Name>,
    type_fixities: BTreeSet<Name>,
}

impl AnnotMap {
    fn collect<'a>(decls: impl Iterator<Item = &'a Decl>) -> Self {
        let mut map = Self::default();
        for decl in decls {
            map.collect_decl(decl);
        }

        map
    }

    fn collect_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Located(decl, _) => self.collect_decl(decl),

            Decl::Signature(sig) => {
                for name in &sig.names {
                    self.signatures
                        .entry(name.value)
                        .or_default()
                        .push((name.span, sig.schema.clone()));

                    if let Some(doc) = &sig.doc {
                        self.docs.entry(name.value).or_default().push(doc.clone());
                    }
                }
            }

            Decl::Pragma(names, pragma) => {
                for name in names {
                    self.pragmas
                        .entry(name.value)
                        .or_default()
                        .push((name.span, pragma.clone()));
                }
            }

            Decl::Fixity(names, fixity) => {
                for name in names {
                    self.fixities
                        .entry(name.value)
                        .or_default()
                        .push((name.span, *fixity));
                }
            }

            _ => {}
        }
    }

    fn drawn(&self, name: &Name) -> bool {
        self.value_fixities.contains(name) || self.type_fixities.contains(name)
    }
}

enum Leftover {
    Signature(Name),
    Pragma(Name),
    Fixity(Name),
    AmbiguousFixity(Name),
}

impl NoPat<'_> {
    pub(super) fn annot_top_decls(&mut self, decls: Vec<TopDecl>) -> Vec<TopDecl> {
        let mut annots = AnnotMap::collect(decls.iter().filter_map(|decl| match decl {
            TopDecl::Decl(decl) => Some(decl),
            _ => None,
        }));

        let mut out = Vec::with_capacity(decls.len());
        for decl in decls {
            match decl {
                TopDecl::Decl(decl) => {
                    if let Some(decl) = self.annot_decl(&mut annots, decl) {
                        out.push(TopDecl::Decl(decl));
                    }
                }

                TopDecl::PrimType(mut prim) => {
                    let drawn = self.draw_type_fixity(&mut annots, prim.name);
                    prim.fixity = drawn.or(prim.fixity);
                    out.push(TopDecl::PrimType(prim));
                }

                TopDecl::ParamType(mut param) => {
                    let drawn = self.draw_type_fixity(&mut annots, param.name);
                    param.fixity = drawn.or(param.fixity);
                    out.push(TopDecl::ParamType(param));
                }

                other => out.push(other),
            }
        }

        self.report_leftovers(annots);
        out
    }

    pub(super) fn annot_decls(&mut self, decls: Vec<Decl>) -> Vec<Decl> {
        let mut annots = AnnotMap::collect(decls.iter());

        let mut out = Vec::with_capacity(decls.len());
        for decl in decls {
            if let Some(decl) = self.annot_decl(&mut annots, decl) {
                out.push(decl);
            }
        }

        self.report_leftovers(annots);
        out
    }

    /// Returns `None` for pure annotation declarations, which do not
    /// survive this pass.
    fn annot_decl(&mut self, annots: &mut AnnotMap, decl: Decl) -> Option<Decl> {
        match decl {
            Decl::Located(decl, span) => {
                let saved = std::mem::replace(&mut self.span, span);
                let decl = self.annot_decl(annots, *decl);
                self.span = saved;

                decl.map(|decl| Decl::Located(Box::new(decl), span))
            }

            Decl::Bind(bind) => Some(Decl::Bind(self.annot_bind(annots, bind))),

            Decl::Signature(_) | Decl::Pragma(..) | Decl::Fixity(..) => None,

            Decl::TySyn(mut syn) => {
                let drawn = self.draw_type_fixity(annots, syn.name);
                syn.fixity = drawn.or(syn.fixity);
                Some(Decl::TySyn(syn))
            }

            Decl::PropSyn(mut syn) => {
                let drawn = self.draw_type_fixity(annots, syn.name);
                syn.fixity = drawn.or(syn.fixity);
                Some(Decl::PropSyn(syn))
            }

            Decl::PatternBind(..) => {
                unreachable!("pattern bindings are expanded before annotation merging")
            }
        }
    }

    fn annot_bind(&mut self, annots: &mut AnnotMap, mut bind: Bind) -> Bind {
        let name = bind.name.value;
        let text = self.names.show(&name);

        if let Some(mut sigs) = annots.signatures.remove(&name) {
            if sigs.len() > 1 {
                let spans: Vec<_> = sigs.iter().map(|(span, _)| *span).collect();
                self.messages
                    .at(bind.name.span)
                    .annot_multiple_signatures(&text, &spans);
            }

            let (_, schema) = sigs.swap_remove(0);
            bind.signature = Some(schema);
        }

        let mut docs = annots.docs.remove(&name).unwrap_or_default();
        if let Some(own) = bind.doc.take() {
            docs.push(own);
        }
        if docs.len() > 1 {
            let spans: Vec<_> = docs.iter().map(|doc| doc.span).collect();
            self.messages
                .at(bind.name.span)
                .annot_multiple_docs(&text, &spans);
        }
        bind.doc = docs.into_iter().next();

        if let Some(pragmas) = annots.pragmas.remove(&name) {
            bind.pragmas
                .extend(pragmas.into_iter().map(|(_, pragma)| pragma));
        }

        if let Some(fixity) = self.draw_fixity(annots, bind.name) {
            bind.fixity = Some(fixity);
            annots.value_fixities.insert(name);
        }

        bind
    }

    fn draw_type_fixity(&mut self, annots: &mut AnnotMap, name: Located<Name>) -> Option<Fixity> {
        let fixity = self.draw_fixity(annots, name)?;
        annots.type_fixities.insert(name.value);
        Some(fixity)
    }

    /// Look up (without popping) the fixity for a name, reporting
    /// duplicates the first time the name is drawn.
    fn draw_fixity(&mut self, annots: &AnnotMap, name: Located<Name>) -> Option<Fixity> {
        let entries = annots.fixities.get(&name.value)?;
        let fixity = entries[0].1;

        if entries.len() > 1 && !annots.drawn(&name.value) {
            let text = self.names.show(&name.value);
            let spans: Vec<_> = entries.iter().map(|(span, _)| *span).collect();
            self.messages
                .at(name.span)
                .annot_multiple_fixities(&text, &spans);
        }

        Some(fixity)
    }

    /// Report everything still sitting in the tables, in source order.
    fn report_leftovers(&mut self, annots: AnnotMap) {
        let mut leftovers = Vec::new();

        for (name, entries) in &annots.signatures {
            for (span, _) in entries {
                leftovers.push((*span, Leftover::Signature(*name)));
            }
        }

        for (name, entries) in &annots.pragmas {
            for (span, _) in entries {
                leftovers.push((*span, Leftover::Pragma(*name)));
            }
        }

        for (name, entries) in &annots.fixities {
            if annots.value_fixities.contains(name) && annots.type_fixities.contains(name) {
                leftovers.push((entries[0].0, Leftover::AmbiguousFixity(*name)));
            } else if !annots.drawn(name) {
                for (span, _) in entries {
                    leftovers.push((*span, Leftover::Fixity(*name)));
                }
            }
        }

        // Orphaned docs always come from orphaned signatures, which are
        // already reported above.

        leftovers.sort_by_key(|(span, _)| *span);

        for (span, leftover) in leftovers {
            match leftover {
                Leftover::Signature(name) => {
                    let text = self.names.show(&name);
                    self.messages.at(span).annot_signature_no_bind(&text);
                }

                Leftover::Pragma(name) => {
                    let text = self.names.show(&name);
                    self.messages.at(span).annot_pragma_no_bind(&text);
                }

                Leftover::Fixity(name) => {
                    let text = self.names.show(&name);
                    self.messages.at(span).annot_fixity_no_bind(&text);
                }

                Leftover::AmbiguousFixity(name) => {
                    let text = self.names.show(&name);
                    self.messages.at(span).annot_fixity_ambiguous(&text);
                }
            }
        }
    }
}
