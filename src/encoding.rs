use std::borrow::Cow;

use encoding_rs::Encoding;
use xhtmlchardet::detect;

use crate::error::Error;

pub(crate) fn encoding(data: &[u8], hint: Option<String>) -> Option<&'static Encoding> {
    let mut cursor = std::io::Cursor::new(data);
    let charsets = detect(&mut cursor, hint).ok()?;
    // no encoding detected
    let label = if charsets.is_empty() {
        "UTF-8"
    } else {
        &charsets[0]
    };
    Encoding::for_label(label.as_bytes())
}

/// Decode XML bytes to text, using the byte order mark or the encoding
/// declaration to pick the encoding.
pub(crate) fn decode(data: &[u8]) -> Result<Cow<str>, Error> {
    let encoding = encoding(data, None)
        .ok_or_else(|| Error::UnsupportedEncoding("unrecognized encoding".to_string()))?;
    let (text, used, had_errors) = encoding.decode(data);
    if had_errors {
        return Err(Error::UnsupportedEncoding(used.name().to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        let data = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>";
        let enc = encoding(data, None).unwrap();
        assert_eq!(enc.name(), "UTF-8");
    }

    #[test]
    fn test_utf8_without_declaration() {
        let data = b"<a/>";
        let enc = encoding(data, None).unwrap();
        assert_eq!(enc.name(), "UTF-8");
    }

    #[test]
    fn test_iso8859_1() {
        let data = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a/>";
        let enc = encoding(data, None).unwrap();
        // windows-1252 is a superset of 8859-1
        assert_eq!(enc.name(), "windows-1252");
    }

    #[test]
    fn test_decode_latin1() {
        let data = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>\xe9</a>";
        let text = decode(data).unwrap();
        assert!(text.ends_with("<a>\u{e9}</a>"));
    }
}
