/// Text normalization applied to every expansion.
///
/// Four passes, in order:
/// 1. whitespace runs collapse to one space
/// 2. the space before `. , ; : ? !` is dropped
/// 3. `^` joins its neighbours, eating whitespace on both sides
/// 4. `\` uppercases the next non-whitespace character

/// Characters that never take a space before them.
pub const PUNCTUATION: [char; 6] = ['.', ',', ';', ':', '?', '!'];
/// Glues the surrounding words: `cat ^ s` → `cats`.
pub const CONCAT_MARKER: char = '^';
/// Capitalizes what follows: `\ hello` → `Hello`.
pub const CASE_SHIFT_MARKER: char = '\\';

/// Normalize raw expansion output.
///
/// The passes are repeated until the text stops changing, so
/// `normalize(normalize(x)) == normalize(x)` for any input.
pub fn normalize(raw: &str) -> String {
    let mut text = apply_passes(raw);
    loop {
        let next = apply_passes(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn apply_passes(text: &str) -> String {
    let text = collapse_whitespace(text);
    let text = strip_space_before_punctuation(&text);
    let text = join_concatenations(&text);
    shift_case(&text)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn strip_space_before_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let before_punctuation = chars.peek().is_some_and(|next| PUNCTUATION.contains(next));
        if c.is_whitespace() && before_punctuation {
            continue;
        }
        out.push(c);
    }
    out
}

fn join_concatenations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != CONCAT_MARKER {
            out.push(c);
            continue;
        }
        let kept = out.trim_end().len();
        out.truncate(kept);
        while chars.next_if(|next| next.is_whitespace()).is_some() {}
    }
    out
}

fn shift_case(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != CASE_SHIFT_MARKER {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let target = chars[i + 1..]
            .iter()
            .position(|c| !c.is_whitespace())
            .map(|offset| i + 1 + offset);
        match target {
            Some(at) => {
                out.extend(chars[at].to_uppercase());
                i = at + 1;
            }
            // Trailing marker with nothing to shift stays as written.
            None => {
                out.extend(&chars[i..]);
                break;
            }
        }
    }

    out
}
