//! Interning of object property names into single-bit sets, so the
//! `required` keyword can check an instance's membership with one mask
//! comparison instead of scanning its own name list against the instance's
//! fields. `schema::build::build_required` interns each `required` name
//! once per compiled keyword and freezes the table; the validator then
//! ORs the interned bit of every instance field into a second mask and
//! compares the two.

use fxhash::FxHashMap as HashMap;

/// A set of interned names, one bit per name. Never has more bits set than
/// the table that produced it has entries.
pub type Set = u64;

/// The number of distinct names a single `Table` can hold — one per bit of
/// `Set`. A `required` list longer than this is split across several
/// tables rather than rejected outright; see `build_required`.
pub const MAX_TABLE_SIZE: usize = std::mem::size_of::<Set>() * 8;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("a sub-schema references more than {MAX_TABLE_SIZE} distinct property names")]
    Overflow,
}

/// Assigns each distinct string it sees the next free bit, up to
/// `MAX_TABLE_SIZE`. Immutable after `freeze`; `lookup` never allocates.
#[derive(Debug, Default)]
pub struct Table {
    m: HashMap<String, Set>,
}

impl Table {
    pub fn new() -> Table {
        Table { m: HashMap::default() }
    }

    /// Interns `s`, returning a `Set` with exactly one bit set. Repeated
    /// interns of the same string return the same bit, even after the
    /// table has reached `MAX_TABLE_SIZE` — only a genuinely new name can
    /// overflow it.
    pub fn intern(&mut self, s: &str) -> Result<Set, Error> {
        if let Some(&v) = self.m.get(s) {
            return Ok(v);
        }
        let l = self.m.len();
        if l == MAX_TABLE_SIZE {
            return Err(Error::Overflow);
        }
        let id: Set = 1 << (l as Set);
        self.m.insert(s.to_owned(), id);
        Ok(id)
    }

    /// Shrinks the backing map once interning is done. Called once per
    /// compiled `Required` keyword; `lookup` works the same with or
    /// without it.
    pub fn freeze(&mut self) {
        self.m.shrink_to_fit()
    }

    /// Looks up a previously interned name, or `0` if it was never
    /// interned into this table.
    pub fn lookup(&self, s: &str) -> Set {
        self.m.get(s).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_intern_and_lookup() {
        let mut t = Table::new();
        assert_eq!(t.intern("a").unwrap(), 0b0001);
        assert_eq!(t.intern("b").unwrap(), 0b0010);
        assert_eq!(t.intern("a").unwrap(), 0b0001);
        assert_eq!(t.lookup("b"), 0b0010);
        assert_eq!(t.lookup("missing"), 0);
    }

    #[test]
    fn test_overflow_rejects_only_new_names() {
        let mut t = Table::new();
        for i in 0..MAX_TABLE_SIZE {
            t.intern(&format!("prop{i}")).unwrap();
        }
        assert_eq!(t.intern("prop0").unwrap(), 1);
        assert!(matches!(t.intern("one_too_many"), Err(Error::Overflow)));
    }
}
