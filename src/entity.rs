use std::borrow::Cow;

use crate::error::Error;

/// Decode the predefined entities and character references in text or an
/// attribute value. Borrows the input if there is nothing to decode.
pub(crate) fn parse_entities(content: &str) -> Result<Cow<str>, Error> {
    if !content.contains('&') {
        return Ok(Cow::Borrowed(content));
    }
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '&' {
            result.push(c);
            continue;
        }
        let mut entity = String::new();
        let mut is_complete = false;
        for c in chars.by_ref() {
            if c == ';' {
                is_complete = true;
                break;
            }
            entity.push(c);
        }
        if !is_complete {
            return Err(Error::UnclosedEntity(entity));
        }
        match entity.as_str() {
            "amp" => result.push('&'),
            "apos" => result.push('\''),
            "gt" => result.push('>'),
            "lt" => result.push('<'),
            "quot" => result.push('"'),
            _ => match character_reference(&entity) {
                Some(c) => result.push(c),
                None => return Err(Error::InvalidEntity(entity)),
            },
        }
    }
    Ok(Cow::Owned(result))
}

fn character_reference(entity: &str) -> Option<char> {
    let reference = entity.strip_prefix('#')?;
    let code = match reference.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => reference.parse::<u32>().ok()?,
    };
    char::from_u32(code).filter(|c| *c != '\0')
}
