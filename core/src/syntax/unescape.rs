//! Escape sequences in string literals and quoted identifiers.

/// Decodes backslash escapes in the body of a quoted literal.
///
/// Recognises `\" \\ \/ \' \n \r \t \b \f \0`, `\uXXXX` and `\u{X...}`. Any
/// other escape is an error.
pub(crate) fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or("dangling backslash")?;
        let decoded = match escaped {
            '"' | '\\' | '/' | '\'' => escaped,
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            'u' => unicode(&mut chars)?,
            other => return Err(format!("unknown escape \\{other}")),
        };
        out.push(decoded);
    }
    Ok(out)
}

fn unicode(chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    let rest = chars.as_str();
    let (hex, consumed) = if let Some(braced) = rest.strip_prefix('{') {
        let end = braced.find('}').ok_or("unterminated \\u{...} escape")?;
        (&braced[..end], end + 2)
    } else {
        let hex = rest.get(..4).ok_or("\\u escape needs four hex digits")?;
        (hex, 4)
    };
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid unicode escape {hex:?}"));
    }
    let code = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
    let decoded = char::from_u32(code).ok_or_else(|| format!("invalid code point {code:#x}"))?;
    for _ in 0..consumed {
        chars.next();
    }
    Ok(decoded)
}
