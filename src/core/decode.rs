//! Purpose: Schema-less decoding of SOAP response fragments into `DecodedValue`.
//! Exports: `decode`, `decode_scalar`, `MAX_DECODE_DEPTH`.
//! Role: Shape inference over `item` blocks found by the tag scanner; never fails.
//! Invariants: Recursion stops past `MAX_DECODE_DEPTH`; deeper content stays an opaque string.
//! Invariants: A fragment is map-shaped iff its first block has direct `key` and `value` children.
//! Invariants: Keys of an object under `msg` are copied up unless the parent already has them.
//! Invariants: Numeric text becomes a number only if formatting it back reproduces the text.
use super::escape::unescape;
use super::scan::{
    Span, expand_self_closing, find_close_tag, find_open_tag, is_nil_tag, scan_balanced,
    scan_top_level_blocks, split_element,
};
use super::value::{DecodedValue, Object};

pub const MAX_DECODE_DEPTH: u32 = 7;

const PAIRED_TAGS: [&str; 3] = ["item", "key", "value"];
const MERGE_KEY: &str = "msg";

/// Decodes `fragment` found at nesting level `depth` (callers start at 0).
pub fn decode(fragment: &str, depth: u32) -> DecodedValue {
    if depth > MAX_DECODE_DEPTH || find_open_tag(fragment, "item", 0).is_none() {
        return decode_scalar(fragment);
    }
    let normalized = expand_self_closing(fragment, &PAIRED_TAGS);
    decode_blocks(&normalized, depth)
}

/// Decodes text that contains no markup of interest.
pub fn decode_scalar(text: &str) -> DecodedValue {
    let trimmed = text.trim();
    match trimmed {
        "" => return DecodedValue::Null,
        "true" => return DecodedValue::Bool(true),
        "false" => return DecodedValue::Bool(false),
        _ => {}
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        if number.is_finite() && number.to_string() == trimmed {
            return DecodedValue::Number(number);
        }
    }
    DecodedValue::Str(unescape(trimmed))
}

// Recursion entry for text that has already been through `expand_self_closing`.
fn decode_normalized(fragment: &str, depth: u32) -> DecodedValue {
    if depth > MAX_DECODE_DEPTH || find_open_tag(fragment, "item", 0).is_none() {
        return decode_scalar(fragment);
    }
    decode_blocks(fragment, depth)
}

fn decode_blocks(fragment: &str, depth: u32) -> DecodedValue {
    let blocks = scan_top_level_blocks(fragment);
    let Some(first) = blocks.first() else {
        return decode_scalar(fragment);
    };
    if is_map_block(fragment, *first) {
        decode_map(fragment, &blocks, depth)
    } else {
        decode_list(fragment, &blocks, depth)
    }
}

fn is_map_block(fragment: &str, block: Span) -> bool {
    let (_, inner) = split_element(fragment, block);
    let Some(key) = find_open_tag(inner, "key", 0) else {
        return false;
    };
    if find_open_tag(inner, "value", key.end).is_none() {
        return false;
    }
    find_open_tag(inner, "item", 0).is_none_or(|nested| key.start < nested.start)
}

fn decode_list(fragment: &str, blocks: &[Span], depth: u32) -> DecodedValue {
    let items = blocks
        .iter()
        .map(|block| {
            let (open, inner) = split_element(fragment, *block);
            if is_nil_tag(open) {
                DecodedValue::Null
            } else {
                decode_normalized(inner, depth + 1)
            }
        })
        .collect();
    DecodedValue::List(items)
}

fn decode_map(fragment: &str, blocks: &[Span], depth: u32) -> DecodedValue {
    let mut object = Object::new();
    for block in blocks {
        let (_, inner) = split_element(fragment, *block);
        let Some(key_open) = find_open_tag(inner, "key", 0) else {
            continue;
        };
        let Some(key_close) = find_close_tag(inner, "key", key_open.end) else {
            continue;
        };
        let key = unescape(inner[key_open.end..key_close.start].trim());
        let value = decode_map_value(inner, key_close.end, depth);
        object.insert(key, value);
    }
    merge_nested_msg(&mut object);
    DecodedValue::Object(object)
}

// The entry's own value is the first `value` element after the key, delimited by tag balance
// because nested maps carry their own `value` tags.
fn decode_map_value(entry: &str, after_key: usize, depth: u32) -> DecodedValue {
    let Some(value_open) = find_open_tag(entry, "value", after_key) else {
        return DecodedValue::Null;
    };
    let element = &entry[value_open.start..];
    let Some(span) = scan_balanced(element, "value").into_iter().next() else {
        return DecodedValue::Null;
    };
    let (open, body) = split_element(element, span);
    if is_nil_tag(open) {
        return DecodedValue::Null;
    }
    decode_normalized(body, depth + 1)
}

fn merge_nested_msg(object: &mut Object) {
    let Some(DecodedValue::Object(nested)) = object.get(MERGE_KEY) else {
        return;
    };
    let missing: Vec<(String, DecodedValue)> = nested
        .iter()
        .filter(|(key, _)| !object.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    object.extend(missing);
}
