// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;

/// Fixed-point decimal: an i128 mantissa scaled by a power of ten. Scale is
/// carried per value, not per column, so a decimal vector can hold mixed
/// scales. All arithmetic is checked; overflow surfaces as `None`.
#[derive(Debug, Clone, Copy)]
pub struct DecimalScalar {
    mantissa: i128,
    scale: u8,
}

/// Result scale floor for divisions, so `1 / 4` keeps its fraction.
const DIV_MIN_SCALE: u8 = 6;

fn pow10(n: u8) -> Option<i128> {
    10i128.checked_pow(n as u32)
}

impl DecimalScalar {
    pub fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }
    }

    pub fn from_i128(value: i128) -> Self {
        Self::new(value, 0)
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Raise the scale, multiplying the mantissa accordingly. Lowering the
    /// scale succeeds only when no digits are lost.
    pub fn rescale(&self, scale: u8) -> Option<DecimalScalar> {
        match scale.cmp(&self.scale) {
            Ordering::Equal => Some(*self),
            Ordering::Greater => {
                let factor = pow10(scale - self.scale)?;
                Some(Self::new(self.mantissa.checked_mul(factor)?, scale))
            }
            Ordering::Less => {
                let factor = pow10(self.scale - scale)?;
                if self.mantissa % factor != 0 {
                    return None;
                }
                Some(Self::new(self.mantissa / factor, scale))
            }
        }
    }

    /// Strip trailing zero digits. Used to canonicalize for equality/hashing.
    pub fn normalized(&self) -> DecimalScalar {
        let mut mantissa = self.mantissa;
        let mut scale = self.scale;
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Self::new(mantissa, scale)
    }

    fn aligned(self, other: DecimalScalar) -> Option<(i128, i128, u8)> {
        let scale = self.scale.max(other.scale);
        let lhs = self.rescale(scale)?;
        let rhs = other.rescale(scale)?;
        Some((lhs.mantissa, rhs.mantissa, scale))
    }

    pub fn checked_add(self, other: DecimalScalar) -> Option<DecimalScalar> {
        let (lhs, rhs, scale) = self.aligned(other)?;
        Some(Self::new(lhs.checked_add(rhs)?, scale))
    }

    pub fn checked_sub(self, other: DecimalScalar) -> Option<DecimalScalar> {
        let (lhs, rhs, scale) = self.aligned(other)?;
        Some(Self::new(lhs.checked_sub(rhs)?, scale))
    }

    pub fn checked_mul(self, other: DecimalScalar) -> Option<DecimalScalar> {
        let scale = self.scale.checked_add(other.scale)?;
        Some(Self::new(self.mantissa.checked_mul(other.mantissa)?, scale))
    }

    pub fn checked_div(self, other: DecimalScalar) -> Option<DecimalScalar> {
        if other.mantissa == 0 {
            return None;
        }
        let scale = self.scale.max(other.scale).max(DIV_MIN_SCALE);
        // numerator scale becomes `scale + other.scale` so the quotient keeps
        // exactly `scale` fractional digits.
        let factor = pow10(scale + other.scale - self.scale)?;
        let numerator = self.mantissa.checked_mul(factor)?;
        Some(Self::new(numerator / other.mantissa, scale).normalized())
    }

    /// Floor modulus over aligned mantissas; the result follows the sign of
    /// the divisor.
    pub fn checked_rem(self, other: DecimalScalar) -> Option<DecimalScalar> {
        if other.mantissa == 0 {
            return None;
        }
        let (lhs, rhs, scale) = self.aligned(other)?;
        let mut rem = lhs % rhs;
        if rem != 0 && (rem < 0) != (rhs < 0) {
            rem += rhs;
        }
        Some(Self::new(rem, scale))
    }

    pub fn checked_neg(self) -> Option<DecimalScalar> {
        Some(Self::new(self.mantissa.checked_neg()?, self.scale))
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    pub fn try_from_f64(value: f64) -> Option<DecimalScalar> {
        if !value.is_finite() {
            return None;
        }
        Self::parse(&format!("{}", value))
    }

    pub fn parse(text: &str) -> Option<DecimalScalar> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        if digits.is_empty() {
            return None;
        }
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if frac_part.len() > u8::MAX as usize {
            return None;
        }
        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10)? as i128;
            mantissa = mantissa.checked_mul(10)?.checked_add(digit)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Some(Self::new(mantissa, frac_part.len() as u8))
    }
}

impl PartialEq for DecimalScalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DecimalScalar {}

impl PartialOrd for DecimalScalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecimalScalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.aligned(*other) {
            Some((lhs, rhs, _)) => lhs.cmp(&rhs),
            // Alignment overflowed i128; magnitudes this far apart are safe to
            // order through f64.
            None => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl Hash for DecimalScalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalized();
        normalized.mantissa.hash(state);
        normalized.scale.hash(state);
    }
}

impl Display for DecimalScalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let abs = self.mantissa.unsigned_abs();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        if self.scale == 0 {
            return write!(f, "{}{}", sign, abs);
        }
        match 10u128.checked_pow(self.scale as u32) {
            Some(pow) => write!(
                f,
                "{}{}.{:0width$}",
                sign,
                abs / pow,
                abs % pow,
                width = self.scale as usize
            ),
            // scale beyond the mantissa width, the value is a pure fraction
            None => write!(f, "{}{}e-{}", sign, abs, self.scale),
        }
    }
}
