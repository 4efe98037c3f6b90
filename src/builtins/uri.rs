//! Global URI encode/decode functions (spec.md §4.3's non-standard
//! `globalThis` utilities, grouped here since they share one escaping
//! policy): `encodeURIComponent`/`decodeURIComponent`/`encodeURI`/`decodeURI`,
//! built on the `percent-encoding` crate rather than a hand-rolled escaper.

use crate::{context::Context, error::JsResult, object::JsObject, value::JsValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters `encodeURIComponent` leaves alone: unreserved marks plus
/// letters/digits (ASCII alnum is never in any percent-encoding `AsciiSet`
/// by construction, so only the marks need listing).
const COMPONENT_UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// `encodeURI` additionally leaves the URI-reserved/special characters
/// unescaped, so its charset only blocks what never belongs in a URI at all.
const URI_UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub fn init(context: &mut Context) {
    let global = context.global_object();
    global.create_method("encodeURIComponent", 1, encode_uri_component, context);
    global.create_method("decodeURIComponent", 1, decode_uri_component, context);
    global.create_method("encodeURI", 1, encode_uri, context);
    global.create_method("decodeURI", 1, decode_uri, context);
}

fn encode(set: &'static AsciiSet) -> impl Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue> {
    move |_this, args, context| {
        let text = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
        Ok(JsValue::string(utf8_percent_encode(&text, set).to_string()))
    }
}

fn encode_uri_component(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    encode(COMPONENT_UNRESERVED)(this, args, context)
}

fn encode_uri(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    encode(URI_UNRESERVED)(this, args, context)
}

fn decode_impl(text: &str) -> JsResult<String> {
    percent_decode_str(text)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|e| crate::error::JsNativeError::uri().with_message(e.to_string()).into())
}

fn decode_uri_component(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let text = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    Ok(JsValue::string(decode_impl(&text)?))
}

fn decode_uri(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let text = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    Ok(JsValue::string(decode_impl(&text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_component() {
        let mut context = Context::default();
        let encoded = encode_uri_component(
            &JsValue::undefined(),
            &[JsValue::string("a b&c")],
            &mut context,
        )
        .unwrap();
        assert_eq!(encoded.to_js_string(&mut context).unwrap().to_string_lossy(), "a%20b%26c");
        let decoded = decode_uri_component(&JsValue::undefined(), &[encoded], &mut context).unwrap();
        assert_eq!(decoded.to_js_string(&mut context).unwrap().to_string_lossy(), "a b&c");
    }
}
