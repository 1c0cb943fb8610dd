/// Removes markup tags from `input`, keeping the text between them.
///
/// A `<` only opens a tag when it is followed by an ASCII letter, `/`, `!`
/// or `?`, so comparisons such as `a < b` survive. Inside a tag a `>` that
/// sits within single or double quotes does not close it. A tag that is
/// never closed swallows the rest of the input.
pub fn strip_tags(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' && opens_tag(bytes.get(i + 1).copied()) {
            out.push_str(&input[text_start..i]);
            i = skip_tag(bytes, i + 1);
            text_start = i;
        } else {
            i += 1;
        }
    }

    out.push_str(&input[text_start..]);
    out
}

fn opens_tag(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

// Index just past the closing `>`, or the input length for an unclosed tag.
fn skip_tag(bytes: &[u8], mut i: usize) -> usize {
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return i + 1,
            None => {}
        }
        i += 1;
    }

    bytes.len()
}
