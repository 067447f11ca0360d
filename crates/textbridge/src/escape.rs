//! HTML, JavaScript and URL-query escaping.
//!
//! The `*_escape_string` functions escape a single string. The `*_escaper`
//! functions take host values, concatenate their text and escape the result.
//! Scalars are written the way the host prints them (`true`, `null`, `1e+21`).
//! Arrays and objects are marshaled into the engine and written as the engine
//! renders them, so values with no engine mapping are rejected the same way
//! render data is.

use std::fmt::Write;

use textbridge_host::HostValue;

use crate::engine::value::to_value;
use crate::error::Result;
use crate::marshal::to_engine;

/// Escapes `<`, `>`, `&`, `'`, `"` and NUL for HTML text and attributes.
pub fn html_escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

/// Escapes text for embedding in a JavaScript string literal.
pub fn js_escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '=' => out.push_str("\\u003D"),
            c if c.is_control() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Escapes text for use as a URL query component.
pub fn url_query_escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

pub fn html_escaper(args: &[HostValue]) -> Result<String> {
    Ok(html_escape_string(&concat(args)?))
}

pub fn js_escaper(args: &[HostValue]) -> Result<String> {
    Ok(js_escape_string(&concat(args)?))
}

pub fn url_query_escaper(args: &[HostValue]) -> Result<String> {
    Ok(url_query_escape_string(&concat(args)?))
}

fn concat(args: &[HostValue]) -> Result<String> {
    let mut text = String::new();
    for arg in args {
        match arg {
            HostValue::Undefined => text.push_str("undefined"),
            HostValue::Null => text.push_str("null"),
            HostValue::Bool(b) => {
                let _ = write!(text, "{b}");
            }
            HostValue::Number(n) => text.push_str(&host_number(*n)),
            HostValue::BigInt(n) => {
                let _ = write!(text, "{n}");
            }
            HostValue::String(s) => text.push_str(s),
            other => {
                let value = to_value(&to_engine(other)?)?;
                let _ = write!(text, "{value}");
            }
        }
    }
    Ok(text)
}

/// Formats a number the way the host's `String(n)` does.
fn host_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&n.abs()) {
        return format!("{n}");
    }
    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textbridge_host::Symbol;

    #[test]
    fn test_html_escape_string() {
        assert_eq!(
            html_escape_string("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(html_escape_string("a\0b"), "a\u{FFFD}b");
    }

    #[test]
    fn test_js_escape_string() {
        assert_eq!(
            js_escape_string("alert('x' + \"y\") <b>&=\\"),
            "alert(\\'x\\' + \\\"y\\\") \\u003Cb\\u003E\\u0026\\u003D\\\\"
        );
        assert_eq!(js_escape_string("line\nbreak"), "line\\u000Abreak");
    }

    #[test]
    fn test_url_query_escape_string() {
        assert_eq!(
            url_query_escape_string("a b&c=d/é~"),
            "a+b%26c%3Dd%2F%C3%A9~"
        );
    }

    #[test]
    fn test_escapers_concatenate_arguments() {
        let args = [
            HostValue::from("<b>"),
            HostValue::from(42),
            HostValue::Bool(true),
            HostValue::Null,
        ];
        assert_eq!(html_escaper(&args).unwrap(), "&lt;b&gt;42truenull");
        assert_eq!(
            url_query_escaper(&[HostValue::Bool(false), HostValue::Undefined]).unwrap(),
            "falseundefined"
        );
    }

    #[test]
    fn test_numbers_print_like_the_host() {
        assert_eq!(host_number(42.0), "42");
        assert_eq!(host_number(-0.0), "0");
        assert_eq!(host_number(2.5), "2.5");
        assert_eq!(host_number(1e21), "1e+21");
        assert_eq!(host_number(1.5e-7), "1.5e-7");
        assert_eq!(host_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(host_number(f64::NAN), "NaN");
        assert_eq!(host_number(123456789012345680000.0), "123456789012345680000");
    }

    #[test]
    fn test_structures_render_through_the_engine() {
        let args = [HostValue::from(vec![HostValue::from(1), HostValue::from("a")])];
        assert_eq!(js_escaper(&args).unwrap(), r#"[1, \"a\"]"#);
    }

    #[test]
    fn test_escapers_reject_unsupported_values() {
        let args = [HostValue::from("ok"), HostValue::from(Symbol::new(None))];
        assert_eq!(
            js_escaper(&args).unwrap_err().to_string(),
            "Unsupported value type"
        );
    }
}
