//! `BigInt`: arbitrary-precision signed integers (spec.md §3). Wraps
//! `num_bigint::BigInt`.

use gc::{custom_trace, Finalize, Trace};
use num_bigint::BigInt;
use std::{fmt, rc::Rc};

#[derive(Debug, Clone, Finalize)]
pub struct JsBigInt(Rc<BigInt>);

unsafe impl Trace for JsBigInt {
    custom_trace!(this, {
        let _ = this;
    });
}

impl JsBigInt {
    pub fn new(value: BigInt) -> Self {
        Self(Rc::new(value))
    }

    pub fn as_inner(&self) -> &BigInt {
        &self.0
    }

    pub fn from_i64(n: i64) -> Self {
        Self::new(BigInt::from(n))
    }

    /// `ToString` for a BigInt never uses scientific notation or a
    /// trailing `n`; the `n` suffix is only added when stringifying a
    /// BigInt *literal* (`JsValue::Display`).
    pub fn to_js_string(&self) -> String {
        self.0.to_string()
    }
}

impl PartialEq for JsBigInt {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for JsBigInt {}

impl fmt::Display for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for &JsBigInt {
    type Output = JsBigInt;
    fn add(self, rhs: Self) -> JsBigInt {
        JsBigInt::new(&*self.0 + &*rhs.0)
    }
}
impl std::ops::Sub for &JsBigInt {
    type Output = JsBigInt;
    fn sub(self, rhs: Self) -> JsBigInt {
        JsBigInt::new(&*self.0 - &*rhs.0)
    }
}
impl std::ops::Mul for &JsBigInt {
    type Output = JsBigInt;
    fn mul(self, rhs: Self) -> JsBigInt {
        JsBigInt::new(&*self.0 * &*rhs.0)
    }
}
