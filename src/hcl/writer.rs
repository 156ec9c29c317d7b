//! HCL serialization in `terraform fmt` style.

use super::block::{Block, BodyItem, Value};

const INDENT: &str = "  ";

pub(crate) fn write_block(out: &mut String, block: &Block, depth: usize) {
    push_indent(out, depth);
    out.push_str(block.kind());
    for label in block.labels() {
        out.push(' ');
        push_quoted(out, label);
    }

    if block.body().is_empty() {
        out.push_str(" {}\n");
        return;
    }

    out.push_str(" {\n");
    write_body(out, block.body(), depth + 1);
    push_indent(out, depth);
    out.push_str("}\n");
}

fn write_body(out: &mut String, body: &[BodyItem], depth: usize) {
    let mut index = 0;
    while let Some(item) = body.get(index) {
        if index > 0 {
            out.push('\n');
        }
        match item {
            BodyItem::Block(block) => {
                write_block(out, block, depth);
                index += 1;
            }
            BodyItem::Attribute { .. } => {
                let run = body
                    .iter()
                    .skip(index)
                    .take_while(|entry| matches!(entry, BodyItem::Attribute { .. }))
                    .filter_map(|entry| match entry {
                        BodyItem::Attribute { name, value } => Some((name.as_str(), value)),
                        BodyItem::Block(_) => None,
                    })
                    .collect::<Vec<_>>();
                write_attributes(out, &run, depth);
                index += run.len();
            }
        }
    }
}

fn write_attributes(out: &mut String, run: &[(&str, &Value)], depth: usize) {
    let width = run
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or_default();
    for (name, value) in run {
        push_indent(out, depth);
        out.push_str(name);
        out.push_str(&" ".repeat(width - name.chars().count()));
        out.push_str(" = ");
        write_value(out, value, depth);
        out.push('\n');
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Str(text) => push_quoted(out, text),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Reference(reference) => out.push_str(reference.as_str()),
        Value::Interpolation(reference) => {
            out.push_str("\"${");
            out.push_str(reference.as_str());
            out.push_str("}\"");
        }
        Value::List(items) => {
            out.push('[');
            for (position, item) in items.iter().enumerate() {
                if position > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, depth);
            }
            out.push(']');
        }
        Value::Map(entries) if entries.is_empty() => out.push_str("{}"),
        Value::Map(entries) => {
            out.push_str("{\n");
            let width = entries
                .iter()
                .map(|(key, _)| map_key(key).chars().count())
                .max()
                .unwrap_or_default();
            for (key, entry) in entries {
                let rendered = map_key(key);
                push_indent(out, depth + 1);
                out.push_str(&rendered);
                out.push_str(&" ".repeat(width - rendered.chars().count()));
                out.push_str(" = ");
                write_value(out, entry, depth + 1);
                out.push('\n');
            }
            push_indent(out, depth);
            out.push('}');
        }
    }
}

fn map_key(key: &str) -> String {
    let bare = key
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if bare {
        key.to_owned()
    } else {
        let mut quoted = String::new();
        push_quoted(&mut quoted, key);
        quoted
    }
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                // Literal strings must not open a template sequence.
                out.push(ch);
                out.push(ch);
            }
            other => out.push(other),
        }
    }
    out.push('"');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
