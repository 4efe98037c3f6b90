//! `Math` (spec.md §4.3): a plain object of constants and pure numeric
//! functions, no constructor.

use super::install_global;
use crate::{context::Context, error::JsResult, object::JsObject, property::Attribute, value::JsValue};

pub fn init(context: &mut Context) {
    let math = JsObject::ordinary(Some(context.intrinsics().object_prototype()));

    math.create_data_property("PI", std::f64::consts::PI, Attribute::default());
    math.create_data_property("E", std::f64::consts::E, Attribute::default());
    math.create_data_property("LN2", std::f64::consts::LN_2, Attribute::default());
    math.create_data_property("LN10", std::f64::consts::LN_10, Attribute::default());
    math.create_data_property("LOG2E", std::f64::consts::LOG2_E, Attribute::default());
    math.create_data_property("LOG10E", std::f64::consts::LOG10_E, Attribute::default());
    math.create_data_property("SQRT2", std::f64::consts::SQRT_2, Attribute::default());
    math.create_data_property("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2, Attribute::default());

    macro_rules! unary {
        ($name:literal, $f:expr) => {
            math.create_method($name, 1, |_this: &JsValue, args: &[JsValue], ctx: &mut Context| -> JsResult<JsValue> {
                let n = args.first().cloned().unwrap_or_else(JsValue::undefined).to_number(ctx)?;
                let f: fn(f64) -> f64 = $f;
                Ok(JsValue::from(f(n)))
            }, context);
        };
    }

    unary!("abs", f64::abs);
    unary!("floor", f64::floor);
    unary!("ceil", f64::ceil);
    unary!("trunc", f64::trunc);
    unary!("sqrt", f64::sqrt);
    unary!("cbrt", f64::cbrt);
    unary!("sign", f64::signum_js);
    unary!("sin", f64::sin);
    unary!("cos", f64::cos);
    unary!("tan", f64::tan);
    unary!("asin", f64::asin);
    unary!("acos", f64::acos);
    unary!("atan", f64::atan);
    unary!("sinh", f64::sinh);
    unary!("cosh", f64::cosh);
    unary!("tanh", f64::tanh);
    unary!("log", f64::ln);
    unary!("log2", f64::log2);
    unary!("log10", f64::log10);
    unary!("exp", f64::exp);
    unary!("round", round_half_up);

    math.create_method("pow", 2, pow, context);
    math.create_method("atan2", 2, atan2, context);
    math.create_method("max", 2, max, context);
    math.create_method("min", 2, min, context);
    math.create_method("random", 0, random, context);
    math.create_method("hypot", 2, hypot, context);

    install_global("Math", math, context);
}

/// `f64::signum` disagrees with `Math.sign` on `0`/`NaN` (spec.md's `Sign`
/// special-cases both), so this isn't just `f64::signum`.
fn signum_js_impl(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        n
    } else if n > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// JS `Math.round` rounds half-up, not half-away-from-zero like
/// `f64::round`, so `-0.5` rounds to `-0` and `0.5` to `1`.
fn round_half_up(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    (n + 0.5).floor()
}

trait SignumJs {
    fn signum_js(self) -> f64;
}
impl SignumJs for f64 {
    fn signum_js(self) -> f64 {
        signum_js_impl(self)
    }
}

fn pow(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let base = args.first().cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    let exp = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    Ok(JsValue::from(base.powf(exp)))
}

fn atan2(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let y = args.first().cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    let x = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    Ok(JsValue::from(y.atan2(x)))
}

fn max(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut best = f64::NEG_INFINITY;
    for arg in args {
        let n = arg.to_number(context)?;
        if n.is_nan() {
            return Ok(JsValue::nan());
        }
        if n > best || (n == 0.0 && best == 0.0 && n.is_sign_positive()) {
            best = n;
        }
    }
    Ok(JsValue::from(best))
}

fn min(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut best = f64::INFINITY;
    for arg in args {
        let n = arg.to_number(context)?;
        if n.is_nan() {
            return Ok(JsValue::nan());
        }
        if n < best || (n == 0.0 && best == 0.0 && n.is_sign_negative()) {
            best = n;
        }
    }
    Ok(JsValue::from(best))
}

fn random(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(rand::random::<f64>()))
}

fn hypot(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut sum = 0.0;
    for arg in args {
        let n = arg.to_number(context)?;
        sum += n * n;
    }
    Ok(JsValue::from(sum.sqrt()))
}
