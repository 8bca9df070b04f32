//! Messages produced while reconciling scattered annotations
//! (signatures, pragmas, fixities, doc comments) with their bindings.

use super::{Diagnostic, Label, MessageAdder, Span};

pub const MULTIPLE_SIGNATURES: &str = "EA00";
pub const SIGNATURE_NO_BIND: &str = "EA01";
pub const PRAGMA_NO_BIND: &str = "EA02";
pub const MULTIPLE_FIXITIES: &str = "EA03";
pub const FIXITY_NO_BIND: &str = "EA04";
pub const MULTIPLE_DOCS: &str = "EA05";

impl<'a> MessageAdder<'a> {
    pub fn annot_multiple_signatures(&mut self, name: &str, occurrences: &[Span]) {
        let mut labels = vec![Label::primary(self.at)];
        labels.extend(
            occurrences
                .iter()
                .map(|span| Label::secondary(*span).with_message("signature here")),
        );

        self.add(
            Diagnostic::error()
                .with_code(MULTIPLE_SIGNATURES)
                .with_message(format!("multiple type signatures for '{}'", name))
                .with_labels(labels)
                .with_notes(vec!["the first signature is used".into()]),
        );
    }

    pub fn annot_signature_no_bind(&mut self, name: &str) {
        self.add(
            Diagnostic::error()
                .with_code(SIGNATURE_NO_BIND)
                .with_message(format!("type signature for '{}' without a binding", name))
                .with_labels(vec![Label::primary(self.at)]),
        );
    }

    pub fn annot_pragma_no_bind(&mut self, name: &str) {
        self.add(
            Diagnostic::error()
                .with_code(PRAGMA_NO_BIND)
                .with_message(format!("pragma for '{}' without a binding", name))
                .with_labels(vec![Label::primary(self.at)]),
        );
    }

    pub fn annot_multiple_fixities(&mut self, name: &str, occurrences: &[Span]) {
        let mut labels = vec![Label::primary(self.at)];
        labels.extend(
            occurrences
                .iter()
                .map(|span| Label::secondary(*span).with_message("fixity here")),
        );

        self.add(
            Diagnostic::error()
                .with_code(MULTIPLE_FIXITIES)
                .with_message(format!("multiple fixity declarations for '{}'", name))
                .with_labels(labels)
                .with_notes(vec!["the first fixity is used".into()]),
        );
    }

    pub fn annot_fixity_no_bind(&mut self, name: &str) {
        self.add(
            Diagnostic::error()
                .with_code(FIXITY_NO_BIND)
                .with_message(format!("fixity declaration for '{}' without a binding", name))
                .with_labels(vec![Label::primary(self.at)]),
        );
    }

    /// A fixity declaration was claimed by both a value-level and a
    /// type-level declaration of the same operator name.
    pub fn annot_fixity_ambiguous(&mut self, name: &str) {
        self.add(
            Diagnostic::error()
                .with_code(FIXITY_NO_BIND)
                .with_message(format!(
                    "fixity declaration for '{}' matches both a value and a type",
                    name
                ))
                .with_labels(vec![Label::primary(self.at)]),
        );
    }

    pub fn annot_multiple_docs(&mut self, name: &str, occurrences: &[Span]) {
        let mut labels = vec![Label::primary(self.at)];
        labels.extend(
            occurrences
                .iter()
                .map(|span| Label::secondary(*span).with_message("documentation here")),
        );

        self.add(
            Diagnostic::error()
                .with_code(MULTIPLE_DOCS)
                .with_message(format!("multiple documentation comments for '{}'", name))
                .with_labels(labels)
                .with_notes(vec!["the first comment is kept".into()]),
        );
    }
}
