//! Non-standard `globalThis` utilities (spec.md §4.3's L3 supplement):
//! `globalThis` itself, the coercing top-level `isNaN`/`isFinite`, aliases
//! for `Number.parseInt`/`Number.parseFloat`, and — behind the `console`
//! feature — the `console` host object (`log`/`error`/`assert`/`count`/
//! `time*`, state kept per-label in a map rather than attached to the
//! object itself, since this engine has no `InternalState`/
//! `with_internal_state_mut` mechanism).

use super::install_global;
use crate::{context::Context, error::JsResult, object::JsObject, property::Attribute, value::JsValue};

pub fn init(context: &mut Context) {
    let global = context.global_object();
    global.create_data_property("globalThis", global.clone(), Attribute::builtin());
    global.create_method("isNaN", 1, is_nan, context);
    global.create_method("isFinite", 1, is_finite, context);
    global.create_method("parseInt", 2, super::number::parse_int, context);
    global.create_method("parseFloat", 1, super::number::parse_float, context);

    #[cfg(feature = "console")]
    console::init(context);
}

fn is_nan(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let n = args.first().cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    Ok(JsValue::from(n.is_nan()))
}

fn is_finite(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let n = args.first().cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    Ok(JsValue::from(n.is_finite()))
}

#[cfg(feature = "console")]
mod console {
    use super::*;
    use std::time::SystemTime;

    pub(super) fn init(context: &mut Context) {
        let console = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
        console.create_method("log", 0, log, context);
        console.create_method("info", 0, log, context);
        console.create_method("warn", 0, error, context);
        console.create_method("error", 0, error, context);
        console.create_method("exception", 0, error, context);
        console.create_method("assert", 0, assert, context);
        console.create_method("count", 1, count, context);
        console.create_method("countReset", 1, count_reset, context);
        console.create_method("time", 1, time, context);
        console.create_method("timeLog", 1, time_log, context);
        console.create_method("timeEnd", 1, time_end, context);
        install_global("console", console, context);
    }

    fn format(args: &[JsValue]) -> String {
        args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
    }

    /// <https://console.spec.whatwg.org/#logger>
    fn log(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        println!("{}", format(args));
        Ok(JsValue::undefined())
    }

    fn error(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        eprintln!("{}", format(args));
        Ok(JsValue::undefined())
    }

    /// <https://console.spec.whatwg.org/#assert>
    fn assert(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        let assertion = args.first().map(JsValue::to_boolean).unwrap_or(false);
        if !assertion {
            eprintln!("Assertion failed:{}{}", if args.len() > 1 { " " } else { "" }, format(&args[1.min(args.len())..]));
        }
        Ok(JsValue::undefined())
    }

    fn label_of(args: &[JsValue]) -> String {
        args.first().map(ToString::to_string).unwrap_or_else(|| "default".to_string())
    }

    /// <https://console.spec.whatwg.org/#count>
    fn count(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let label = label_of(args);
        let c = context.console_mut().count_map.entry(label.clone()).or_insert(0);
        *c += 1;
        println!("{}: {}", label, c);
        Ok(this.clone())
    }

    /// <https://console.spec.whatwg.org/#countreset>
    fn count_reset(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let label = label_of(args);
        context.console_mut().count_map.remove(&label);
        Ok(JsValue::undefined())
    }

    fn now_millis() -> u128 {
        SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
    }

    /// <https://console.spec.whatwg.org/#time>
    fn time(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let label = label_of(args);
        if context.console_mut().timer_map.contains_key(&label) {
            eprintln!("Timer '{}' already exists", label);
        } else {
            let now = now_millis();
            context.console_mut().timer_map.insert(label, now);
        }
        Ok(JsValue::undefined())
    }

    /// <https://console.spec.whatwg.org/#timelog>
    fn time_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let label = label_of(args);
        match context.console_mut().timer_map.get(&label).copied() {
            Some(start) => println!("{}: {}ms {}", label, now_millis() - start, format(&args[1.min(args.len())..])),
            None => eprintln!("Timer '{}' does not exist", label),
        }
        Ok(JsValue::undefined())
    }

    /// <https://console.spec.whatwg.org/#timeend>
    fn time_end(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let label = label_of(args);
        match context.console_mut().timer_map.remove(&label) {
            Some(start) => println!("{}: {}ms", label, now_millis() - start),
            None => eprintln!("Timer '{}' does not exist", label),
        }
        Ok(JsValue::undefined())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn count_increments_per_label() {
            let mut context = Context::default();
            let this = JsValue::undefined();
            count(&this, &[JsValue::string("hits")], &mut context).unwrap();
            count(&this, &[JsValue::string("hits")], &mut context).unwrap();
            assert_eq!(*context.console_mut().count_map.get("hits").unwrap(), 2);

            count_reset(&this, &[JsValue::string("hits")], &mut context).unwrap();
            assert!(!context.console_mut().count_map.contains_key("hits"));
        }

        #[test]
        fn time_end_removes_the_label_on_first_use() {
            let mut context = Context::default();
            let this = JsValue::undefined();
            time(&this, &[JsValue::string("work")], &mut context).unwrap();
            assert!(context.console_mut().timer_map.contains_key("work"));
            time_end(&this, &[JsValue::string("work")], &mut context).unwrap();
            assert!(!context.console_mut().timer_map.contains_key("work"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_nan_coerces_its_argument() {
        let mut context = Context::default();
        let result = is_nan(&JsValue::undefined(), &[JsValue::string("not a number")], &mut context).unwrap();
        assert!(result.to_boolean());
        let result = is_nan(&JsValue::undefined(), &[JsValue::string("42")], &mut context).unwrap();
        assert!(!result.to_boolean());
    }

    #[test]
    fn is_finite_coerces_its_argument() {
        let mut context = Context::default();
        let result = is_finite(&JsValue::undefined(), &[JsValue::string("1")], &mut context).unwrap();
        assert!(result.to_boolean());
        let result = is_finite(&JsValue::undefined(), &[JsValue::undefined()], &mut context).unwrap();
        assert!(!result.to_boolean());
    }

    #[test]
    fn global_this_points_back_at_the_global_object() {
        let mut context = Context::default();
        let global = context.global_object();
        let value = global.get("globalThis", &mut context).unwrap();
        assert!(value.as_object().unwrap().ptr_eq(&global));
    }
}
