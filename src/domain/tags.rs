use std::collections::BTreeSet;

/// Splits a free-form tag line into a sorted, de-duplicated list of tag names.
///
/// Input without commas or double quotes is split on spaces. Double-quoted
/// groups always form a single tag. Whatever is left over is split on commas
/// when a loose comma was seen, otherwise on spaces. An unterminated quote is
/// treated as unquoted text.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }

    if !input.contains(',') && !input.contains('"') {
        return sorted_unique(split_strip(input, ' '));
    }

    let mut words = Vec::new();
    let mut to_be_split = Vec::new();
    let mut buffer = String::new();
    let mut saw_loose_comma = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '"' {
            if ch == ',' {
                saw_loose_comma = true;
            }
            buffer.push(ch);
            continue;
        }

        if !buffer.is_empty() {
            to_be_split.push(std::mem::take(&mut buffer));
        }
        let mut closed = false;
        for quoted in chars.by_ref() {
            if quoted == '"' {
                closed = true;
                break;
            }
            buffer.push(quoted);
        }
        if !closed {
            if buffer.contains(',') {
                saw_loose_comma = true;
            }
            break;
        }
        let word = buffer.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
        buffer.clear();
    }

    if !buffer.is_empty() {
        to_be_split.push(buffer);
    }

    let delimiter = if saw_loose_comma { ',' } else { ' ' };
    for chunk in &to_be_split {
        words.extend(split_strip(chunk, delimiter));
    }
    sorted_unique(words)
}

fn split_strip(input: &str, delimiter: char) -> Vec<String> {
    input
        .split(delimiter)
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn sorted_unique(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
