//! Fixed-width unsigned bit-vectors with hardware truncation semantics.

use crate::error::{MalformedValue, RangeError, WidthOverflow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Shl, Shr, Sub};

/// An unsigned bit-vector of a fixed width.
///
/// Bits are packed 64 per `u64` word, least significant word first. Every
/// constructor and operation masks the result to its width, so the stored
/// magnitude never exceeds `2^width - 1`. Arithmetic wraps exactly like a
/// hardware register of the same width: overflow is dropped silently.
///
/// Binary operators between two values produce a result as wide as the
/// wider operand, zero-extending the narrower one. Operators taking a `u64`
/// right-hand side keep the width of the left operand.
///
/// Deserialization rejects a zero width or a word list of the wrong length
/// and masks off any bits above the width.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PackedWords")]
pub struct Value {
    width: u32,
    words: Vec<u64>,
}

/// Wire form of a [`Value`], checked before it becomes one.
#[derive(Deserialize)]
struct PackedWords {
    width: u32,
    words: Vec<u64>,
}

impl TryFrom<PackedWords> for Value {
    type Error = MalformedValue;

    fn try_from(raw: PackedWords) -> Result<Self, Self::Error> {
        if raw.width == 0 {
            return Err(MalformedValue::ZeroWidth);
        }
        let expected = word_count(raw.width);
        if raw.words.len() != expected {
            return Err(MalformedValue::WordCount {
                width: raw.width,
                expected,
                found: raw.words.len(),
            });
        }
        let mut value = Value {
            width: raw.width,
            words: raw.words,
        };
        value.mask();
        Ok(value)
    }
}

/// Number of bits packed per storage word.
const WORD_BITS: u32 = 64;

impl Value {
    /// Creates a zero value of the given width.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    pub fn new(width: u32) -> Self {
        assert!(width > 0, "values must be at least one bit wide");
        Self {
            width,
            words: vec![0; word_count(width)],
        }
    }

    /// Creates a value from a `u64`, keeping only the low `width` bits.
    pub fn from_u64(magnitude: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        v.words[0] = magnitude;
        v.mask();
        v
    }

    /// Creates a single-bit value.
    pub fn from_bool(bit: bool) -> Self {
        Self::from_u64(u64::from(bit), 1)
    }

    /// Creates a value with every bit set.
    pub fn ones(width: u32) -> Self {
        let mut v = Self::new(width);
        v.words.iter_mut().for_each(|w| *w = u64::MAX);
        v.mask();
        v
    }

    /// Returns the width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the magnitude if it fits in a `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        if self.words[1..].iter().any(|&w| w != 0) {
            None
        } else {
            Some(self.words[0])
        }
    }

    /// Returns the low 64 bits of the magnitude.
    pub fn as_u64(&self) -> u64 {
        self.words[0]
    }

    /// Returns bit 0 as a boolean.
    pub fn as_bool(&self) -> bool {
        self.words[0] & 1 != 0
    }

    /// Returns true if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Overwrites the magnitude, truncating to the width.
    ///
    /// The stored value is always the truncated magnitude. When bits were
    /// dropped the returned [`WidthOverflow`] describes them so the caller
    /// can report it.
    pub fn write(&mut self, magnitude: u64) -> Option<WidthOverflow> {
        self.words.iter_mut().for_each(|w| *w = 0);
        self.words[0] = magnitude;
        self.mask();
        if self.words[0] != magnitude {
            Some(WidthOverflow {
                width: self.width,
                magnitude,
            })
        } else {
            None
        }
    }

    /// Returns the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn bit(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "bit {index} out of bounds for width {}",
            self.width
        );
        (self.words[(index / WORD_BITS) as usize] >> (index % WORD_BITS)) & 1 != 0
    }

    /// Sets the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set_bit(&mut self, index: u32, bit: bool) {
        assert!(
            index < self.width,
            "bit {index} out of bounds for width {}",
            self.width
        );
        let word = &mut self.words[(index / WORD_BITS) as usize];
        let mask = 1u64 << (index % WORD_BITS);
        if bit {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Extracts bits `[lo, hi)` as a new value of width `hi - lo`.
    pub fn slice(&self, lo: u32, hi: u32) -> Result<Value, RangeError> {
        if lo >= hi || hi > self.width {
            return Err(RangeError {
                lo,
                hi,
                width: self.width,
            });
        }
        let width = hi - lo;
        let mut v = Self {
            width,
            words: shift_right(&self.words, lo, word_count(width)),
        };
        v.mask();
        Ok(v)
    }

    /// Concatenates `high` above `self`: `self` occupies the low bits.
    pub fn concat(&self, high: &Value) -> Value {
        let width = self.width + high.width;
        let len = word_count(width);
        let mut words = self.words.clone();
        words.resize(len, 0);
        for (w, h) in words.iter_mut().zip(shift_left(&high.words, self.width, len)) {
            *w |= h;
        }
        Self { width, words }
    }

    /// Zero-extends to `width` bits. Narrowing is not allowed here.
    ///
    /// # Panics
    ///
    /// Panics if `width` is smaller than the current width.
    pub fn zext(&self, width: u32) -> Value {
        assert!(
            width >= self.width,
            "cannot zero-extend {} bits to {width}",
            self.width
        );
        self.resize(width)
    }

    /// Truncates to the low `width` bits.
    ///
    /// # Panics
    ///
    /// Panics if `width` is larger than the current width, or zero.
    pub fn trunc(&self, width: u32) -> Value {
        assert!(
            width <= self.width,
            "cannot truncate {} bits to {width}",
            self.width
        );
        self.resize(width)
    }

    /// Resizes to `width` bits, zero-extending or truncating as needed.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    pub fn resize(&self, width: u32) -> Value {
        assert!(width > 0, "values must be at least one bit wide");
        let mut words = self.words.clone();
        words.resize(word_count(width), 0);
        let mut v = Self { width, words };
        v.mask();
        v
    }

    /// Returns true if the magnitude fits in `width` bits.
    pub fn fits_in(&self, width: u32) -> bool {
        width >= self.width || self.resize(width).resize(self.width) == *self
    }

    /// Adds a `u64`, wrapping at the current width.
    pub fn wrapping_add_u64(&self, rhs: u64) -> Value {
        self + &Value::from_u64(rhs, self.width)
    }

    /// AND of all bits, as a 1-bit value.
    pub fn reduce_and(&self) -> Value {
        Value::from_bool(*self == Value::ones(self.width))
    }

    /// OR of all bits, as a 1-bit value.
    pub fn reduce_or(&self) -> Value {
        Value::from_bool(!self.is_zero())
    }

    /// XOR of all bits, as a 1-bit value.
    pub fn reduce_xor(&self) -> Value {
        let ones: u32 = self.words.iter().map(|w| w.count_ones()).sum();
        Value::from_bool(ones % 2 == 1)
    }

    /// Compares magnitudes, ignoring widths.
    pub fn cmp_magnitude(&self, other: &Value) -> Ordering {
        let len = self.words.len().max(other.words.len());
        for i in (0..len).rev() {
            let a = self.words.get(i).copied().unwrap_or(0);
            let b = other.words.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Clears storage bits above the width.
    fn mask(&mut self) {
        let rem = self.width % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    fn zip_with(&self, rhs: &Value, f: impl Fn(u64, u64) -> u64) -> Value {
        let width = self.width.max(rhs.width);
        let a = self.resize(width);
        let b = rhs.resize(width);
        let mut v = Self {
            width,
            words: a.words.iter().zip(&b.words).map(|(&x, &y)| f(x, y)).collect(),
        };
        v.mask();
        v
    }
}

fn word_count(width: u32) -> usize {
    width.div_ceil(WORD_BITS).max(1) as usize
}

/// Shifts packed words right by `n` bits into a buffer of `len` words.
fn shift_right(words: &[u64], n: u32, len: usize) -> Vec<u64> {
    let ws = (n / WORD_BITS) as usize;
    let bs = n % WORD_BITS;
    (0..len)
        .map(|i| {
            let lo = words.get(i + ws).copied().unwrap_or(0);
            if bs == 0 {
                lo
            } else {
                let hi = words.get(i + ws + 1).copied().unwrap_or(0);
                (lo >> bs) | (hi << (WORD_BITS - bs))
            }
        })
        .collect()
}

/// Shifts packed words left by `n` bits into a buffer of `len` words.
fn shift_left(words: &[u64], n: u32, len: usize) -> Vec<u64> {
    let ws = (n / WORD_BITS) as usize;
    let bs = n % WORD_BITS;
    let get = |i: usize| -> u64 {
        i.checked_sub(ws)
            .and_then(|j| words.get(j).copied())
            .unwrap_or(0)
    };
    (0..len)
        .map(|i| {
            if bs == 0 {
                get(i)
            } else {
                let prev = if i == 0 { 0 } else { get(i - 1) };
                (get(i) << bs) | (prev >> (WORD_BITS - bs))
            }
        })
        .collect()
}

impl Add for &Value {
    type Output = Value;

    fn add(self, rhs: &Value) -> Value {
        let width = self.width.max(rhs.width);
        let a = self.resize(width);
        let b = rhs.resize(width);
        let mut carry = false;
        let words = a
            .words
            .iter()
            .zip(&b.words)
            .map(|(&x, &y)| {
                let (s1, c1) = x.overflowing_add(y);
                let (s2, c2) = s1.overflowing_add(u64::from(carry));
                carry = c1 || c2;
                s2
            })
            .collect();
        let mut v = Value { width, words };
        v.mask();
        v
    }
}

impl Sub for &Value {
    type Output = Value;

    fn sub(self, rhs: &Value) -> Value {
        let width = self.width.max(rhs.width);
        let a = self.resize(width);
        let b = rhs.resize(width);
        let mut borrow = false;
        let words = a
            .words
            .iter()
            .zip(&b.words)
            .map(|(&x, &y)| {
                let (d1, b1) = x.overflowing_sub(y);
                let (d2, b2) = d1.overflowing_sub(u64::from(borrow));
                borrow = b1 || b2;
                d2
            })
            .collect();
        let mut v = Value { width, words };
        v.mask();
        v
    }
}

impl Add<u64> for &Value {
    type Output = Value;

    fn add(self, rhs: u64) -> Value {
        self + &Value::from_u64(rhs, self.width)
    }
}

impl Sub<u64> for &Value {
    type Output = Value;

    fn sub(self, rhs: u64) -> Value {
        self - &Value::from_u64(rhs, self.width)
    }
}

impl BitAnd for &Value {
    type Output = Value;

    fn bitand(self, rhs: &Value) -> Value {
        self.zip_with(rhs, |a, b| a & b)
    }
}

impl BitOr for &Value {
    type Output = Value;

    fn bitor(self, rhs: &Value) -> Value {
        self.zip_with(rhs, |a, b| a | b)
    }
}

impl BitXor for &Value {
    type Output = Value;

    fn bitxor(self, rhs: &Value) -> Value {
        self.zip_with(rhs, |a, b| a ^ b)
    }
}

impl Not for &Value {
    type Output = Value;

    fn not(self) -> Value {
        let mut v = Value {
            width: self.width,
            words: self.words.iter().map(|w| !w).collect(),
        };
        v.mask();
        v
    }
}

impl Shl<u32> for &Value {
    type Output = Value;

    fn shl(self, n: u32) -> Value {
        let mut v = Value {
            width: self.width,
            words: shift_left(&self.words, n, self.words.len()),
        };
        v.mask();
        v
    }
}

impl Shr<u32> for &Value {
    type Output = Value;

    fn shr(self, n: u32) -> Value {
        Value {
            width: self.width,
            words: shift_right(&self.words, n, self.words.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(bit: bool) -> Self {
        Value::from_bool(bit)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h", self.width)?;
        let mut started = false;
        for &w in self.words.iter().rev() {
            if started {
                write!(f, "{w:016x}")?;
            } else if w != 0 {
                write!(f, "{w:x}")?;
                started = true;
            }
        }
        if !started {
            write!(f, "0")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
