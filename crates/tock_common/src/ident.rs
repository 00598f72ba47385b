//! Interned names for signals, ports, and model instances.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// The local name of a signal or model instance.
///
/// Names are interned once while a design is built, so comparing two names
/// or copying one never touches the string data.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32` which always fits in `usize` on supported
// platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// String interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner lives inside each design. Port arrays such as `done[3]`
/// intern each element name separately.
#[derive(Debug)]
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. Re-interning a known
    /// string returns the existing identifier.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Joins names outermost first into a dotted path such as `top.reg1.out`.
    pub fn path(&self, names: impl IntoIterator<Item = Ident>) -> String {
        let mut out = String::new();
        for name in names {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(self.resolve(name));
        }
        out
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
