#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}

/// Scan a bind name (`[A-Za-z_][A-Za-z0-9_]*`) starting at `start`.
pub(super) fn scan_ident(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
        idx += 1;
    }
    std::str::from_utf8(&bytes[start..idx])
        .ok()
        .map(|name| (idx, name))
}

/// Enter a literal/comment state from `Normal` if one starts at `idx`.
///
/// Returns the index of the last byte consumed, or `None` when `idx` starts nothing.
pub(super) fn enter_literal(state: &mut State, bytes: &[u8], idx: usize) -> Option<usize> {
    match bytes[idx] {
        b'\'' => *state = State::SingleQuoted,
        b'"' => *state = State::DoubleQuoted,
        _ if is_line_comment_start(bytes, idx) => *state = State::LineComment,
        _ if is_block_comment_start(bytes, idx) => {
            *state = State::BlockComment(1);
            return Some(idx + 1);
        }
        b'$' => {
            let (tag, advance) = try_start_dollar_quote(bytes, idx)?;
            *state = State::DollarQuoted(tag);
            return Some(advance);
        }
        _ => return None,
    }
    Some(idx)
}

/// Advance through a non-`Normal` state by one byte (or one escape/terminator).
///
/// Returns the index of the last byte consumed.
pub(super) fn step_literal(state: &mut State, bytes: &[u8], mut idx: usize) -> usize {
    let b = bytes[idx];
    match state {
        State::Normal => {}
        State::SingleQuoted => {
            if b == b'\'' {
                if bytes.get(idx + 1) == Some(&b'\'') {
                    idx += 1; // skip escaped quote
                } else {
                    *state = State::Normal;
                }
            }
        }
        State::DoubleQuoted => {
            if b == b'"' {
                if bytes.get(idx + 1) == Some(&b'"') {
                    idx += 1; // skip escaped quote
                } else {
                    *state = State::Normal;
                }
            }
        }
        State::LineComment => {
            if b == b'\n' {
                *state = State::Normal;
            }
        }
        State::BlockComment(depth) => {
            if is_block_comment_start(bytes, idx) {
                *state = State::BlockComment(*depth + 1);
                idx += 1;
            } else if is_block_comment_end(bytes, idx) {
                idx += 1;
                if *depth == 1 {
                    *state = State::Normal;
                } else {
                    *state = State::BlockComment(*depth - 1);
                }
            }
        }
        State::DollarQuoted(tag) => {
            if b == b'$' && matches_tag(bytes, idx, tag) {
                idx += tag.len() + 1;
                *state = State::Normal;
            }
        }
    }
    idx
}

fn pair_at(bytes: &[u8], idx: usize, pair: [u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(&pair[..])
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, *b"--")
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, *b"/*")
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, *b"*/")
}

/// Recognize `$tag$` (or `$$`) at `start`. Returns the tag and the index of the
/// closing `$`. Tags cannot start with a digit, so `$1` stays a placeholder.
fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let body = start + 1;
    if bytes.get(body).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let len = bytes
        .get(body..)?
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    let close = body + len;
    if bytes.get(close) != Some(&b'$') {
        return None;
    }
    let tag = std::str::from_utf8(&bytes[body..close]).ok()?.to_string();
    Some((tag, close))
}

/// True if the closing `$tag$` starts at `idx`.
fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let body = idx + 1;
    let close = body + tag.len();
    bytes.get(body..close) == Some(tag.as_bytes()) && bytes.get(close) == Some(&b'$')
}
