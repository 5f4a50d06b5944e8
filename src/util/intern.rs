use std::{collections::HashMap, fmt, num::NonZeroU32, rc::Rc};

/// A handle to an interned identifier. To retrieve its name, use
/// [`Interner::get`].
///
/// Handles compare and hash as integers, so variable environments can be
/// keyed by them directly.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(NonZeroU32);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl From<&Symbol> for Symbol {
    fn from(value: &Symbol) -> Self {
        *value
    }
}

/// Identifier names, in the order they were first seen.
pub struct Interner {
    map: HashMap<Rc<str>, Symbol>,
    names: Vec<Rc<str>>,
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.names.iter().enumerate().map(|(i, name)| (i + 1, name)))
            .finish()
    }
}

impl Interner {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the symbol for `name`, allocating one the first time it is
    /// seen.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(symbol) = self.map.get(name) {
            return *symbol;
        }
        let symbol = u32::try_from(self.names.len() + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Symbol)
            .expect("too many identifiers");
        let name: Rc<str> = name.into();
        self.names.push(Rc::clone(&name));
        self.map.insert(name, symbol);
        symbol
    }

    /// Returns the symbol for `name` if it was interned.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.map.get(name).copied()
    }

    /// Returns the name behind `symbol`. Panics if it came from another
    /// interner.
    pub fn get(&self, symbol: impl Into<Symbol>) -> &str {
        let Symbol(i) = symbol.into();
        &self.names[i.get() as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_interner() {
        let mut i = Interner::with_capacity(3);
        assert!(i.is_empty());

        let count1 = i.intern("COUNT");
        let name1 = i.intern("NAME$");
        let count2 = i.intern("COUNT");

        assert_eq!(count1, count2);
        assert_ne!(count1, name1);
        assert_eq!(i.get(count1), "COUNT");
        assert_eq!(i.get(&name1), "NAME$");
        assert_eq!(i.len(), 2);
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let mut i = Interner::with_capacity(1);
        let x = i.intern("X");
        assert_eq!(i.lookup("X"), Some(x));
        assert_eq!(i.lookup("Y"), None);
        assert_eq!(i.len(), 1);
        assert_eq!(format!("{i:?}"), r#"{1: "X"}"#);
    }
}
