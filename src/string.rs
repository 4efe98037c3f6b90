//! `JsString`: the UTF-16 code-unit string type required by spec.md §4.1.
//!
//! ECMAScript strings are sequences of 16-bit code units, not Unicode
//! scalar values; `"length"` counts code units and indexing yields a
//! one-unit string, surrogate pairs included. Rust's `String`/`str` are
//! UTF-8, so we store code units directly rather than paying a UTF-8 round
//! trip (and getting the indexing semantics wrong) on every string op.
//!
//! We keep a "cheap-to-clone, reference-counted, Trace/Finalize" shape,
//! backed by `Rc<[u16]>` rather than a hand-rolled inline allocator, for
//! simplicity given we can't verify unsafe code by running it.

use gc::{custom_trace, Finalize, Trace};
use rustc_hash::FxHasher;
use std::{
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

#[derive(Debug, Clone, Eq, Finalize)]
pub struct JsString {
    units: Rc<[u16]>,
}

unsafe impl Trace for JsString {
    custom_trace!(this, {
        // `Rc<[u16]>` holds no `Gc` pointers; nothing to mark.
        let _ = this;
    });
}

impl JsString {
    pub fn from_utf16(units: impl Into<Rc<[u16]>>) -> Self {
        Self {
            units: units.into(),
        }
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.units
    }

    /// Number of UTF-16 code units, i.e. the value of JS `.length`.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The one-unit string at `index`, or `None` if out of range, per the
    /// indexing semantics of spec.md §4.1.
    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        self.units.get(index).copied()
    }

    /// Lossy conversion to a Rust `String`, replacing unpaired surrogates
    /// with U+FFFD. Used for host-facing `Display`/diagnostics, never for
    /// JS-observable semantics.
    pub fn to_string_lossy(&self) -> String {
        char::decode_utf16(self.units.iter().copied())
            .map(|r| r.unwrap_or('\u{FFFD}'))
            .collect()
    }

    pub fn concat(&self, other: &Self) -> Self {
        let mut v = Vec::with_capacity(self.units.len() + other.units.len());
        v.extend_from_slice(&self.units);
        v.extend_from_slice(&other.units);
        Self::from_utf16(v)
    }

    pub fn repeat(&self, count: usize) -> Self {
        let mut v = Vec::with_capacity(self.units.len() * count);
        for _ in 0..count {
            v.extend_from_slice(&self.units);
        }
        Self::from_utf16(v)
    }

    /// Index-of search over code units (no surrogate-aware grapheme
    /// logic; matches JS `String.prototype.indexOf`, which is also
    /// code-unit based).
    pub fn find(&self, needle: &Self) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.units
            .windows(needle.units.len())
            .position(|w| w == &*needle.units)
    }

    /// The canonical array-index value this string denotes, if any: `"0"`
    /// is valid, anything with a leading zero or a non-digit is not, and
    /// the value must fit below `2^32 - 1` (spec.md §3 "array index").
    pub fn as_array_index_str(&self) -> Option<u32> {
        let text = self.to_string_lossy();
        if text == "0" {
            return Some(0);
        }
        if text.is_empty() || text.starts_with('0') || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u32 = text.parse().ok()?;
        if n != u32::MAX {
            Some(n)
        } else {
            None
        }
    }
}

impl PartialEq for JsString {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
    }
}

impl Hash for JsString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut h = FxHasher::default();
        self.units.hash(&mut h);
        state.write_u64(h.finish());
    }
}

impl PartialOrd for JsString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.units.cmp(&other.units)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self::from_utf16(s.encode_utf16().collect::<Vec<_>>())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl Default for JsString {
    fn default() -> Self {
        Self::from_utf16(Vec::new())
    }
}

impl From<&String> for JsString {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

/// Convenience macro for a `js_string!` literal: builds a [`JsString`]
/// from a Rust string literal at the call site.
#[macro_export]
macro_rules! js_string {
    ($s:expr) => {
        $crate::string::JsString::from($s)
    };
}
