use std::collections::HashMap;

use bimap::BiMap;

use crate::message::Span;

/// A synthetic identifier made up by a pass. The index is allocated
/// monotonically, so generated names are globally distinct from each
/// other and, by construction, from every user-written name.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GeneratedName(usize);

impl GeneratedName {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<GeneratedName> for String {
    fn from(name: GeneratedName) -> Self {
        format!("_t{}", name.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Name(usize);

/// What a [`Name`] actually stands for: either the text the user
/// wrote, or a generated identifier.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Actual {
    Lit(String),
    Generated(GeneratedName),
}

/// The name interner. Two occurrences of the same user-written text
/// intern to the same `Name`, which is what lets annotation tables and
/// dependency sets compare names cheaply. Passes take this by `&mut`,
/// which also makes the fresh-name counter linear: only one pass at a
/// time can allocate.
#[derive(Debug, Default)]
pub struct Names {
    names: BiMap<Name, Actual>,
    decls: HashMap<Name, Span>,
    curr_gen: usize,
}

impl Names {
    pub fn new() -> Self {
        Self {
            names: BiMap::new(),
            decls: HashMap::new(),
            curr_gen: 0,
        }
    }

    pub fn add(&mut self, at: Span, actual: Actual) -> Name {
        if let Some(id) = self.names.get_by_right(&actual) {
            *id
        } else {
            let id = Name(self.names.len());
            self.names.insert(id, actual);
            self.decls.insert(id, at);
            id
        }
    }

    /// Intern a user-written identifier.
    pub fn intern(&mut self, at: Span, text: impl Into<String>) -> Name {
        self.add(at, Actual::Lit(text.into()))
    }

    /// Generate a unique name.
    pub fn fresh(&mut self, at: Span) -> Name {
        let id = GeneratedName(self.curr_gen);
        self.curr_gen += 1;

        self.add(at, Actual::Generated(id))
    }

    pub fn get(&self, name: &Name) -> &Actual {
        // Only one `Names` should be able to produce names, so this should never fail.
        self.names.get_by_left(name).unwrap()
    }

    pub fn get_span(&self, name: &Name) -> Span {
        *self.decls.get(name).unwrap()
    }

    /// The text of a name, suitable for diagnostics.
    pub fn show(&self, name: &Name) -> String {
        match self.get(name) {
            Actual::Lit(text) => text.clone(),
            Actual::Generated(id) => String::from(*id),
        }
    }
}
