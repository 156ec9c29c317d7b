//! Rewrites Go-style template actions into minijinja source.
//!
//! Literal text passes through unchanged apart from escaping Jinja's own
//! block and comment openers. Newlines inside actions are carried into the
//! emitted tags, so line numbers reported by the engine match the input.

use super::error::RenderError;

/// Loop variable bound to the current element inside `range` bodies.
pub(crate) const DOT: &str = "__dot__";

/// Context name under which the fixture map is exposed to the engine.
pub(crate) const FIXTURES: &str = "fixture";

/// How an action uses a fixture key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Usage {
    /// `{{.Key}}`
    Value,
    /// Operand of `if`, `else if`, `not`, `or` or `and`.
    Condition,
    /// `{{range .Key}}`
    Range,
}

/// A fixture key named by an action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Reference {
    pub(crate) key: String,
    pub(crate) line: usize,
    pub(crate) usage: Usage,
}

/// Engine source plus every key the template names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Translation {
    pub(crate) source: String,
    pub(crate) references: Vec<Reference>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BlockKind {
    If,
    Range,
}

impl BlockKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Range => "range",
        }
    }

    const fn closing_tag(self) -> &'static str {
        match self {
            Self::If => "endif",
            Self::Range => "endfor",
        }
    }
}

#[derive(Debug)]
struct Frame {
    kind: BlockKind,
    line: usize,
    has_else: bool,
}

struct Action<'a> {
    body: &'a str,
    line: usize,
    trim_before: bool,
    trim_after: bool,
    newlines: usize,
}

impl<'a> Action<'a> {
    /// Splits `{{- body -}}` trim markers off the raw action text. A dash
    /// only trims when followed (or preceded) by whitespace, so `{{-3}}`
    /// stays a malformed operand.
    fn split(raw: &'a str, line: usize) -> Self {
        let (trim_before, without_left) = match raw.strip_prefix('-') {
            Some(stripped) if stripped.starts_with(char::is_whitespace) => (true, stripped),
            _ => (false, raw),
        };
        let (trim_after, body) = match without_left.strip_suffix('-') {
            Some(stripped) if stripped.ends_with(char::is_whitespace) => (true, stripped),
            _ => (false, without_left),
        };
        Self {
            body: body.trim(),
            line,
            trim_before,
            trim_after,
            newlines: raw.matches('\n').count(),
        }
    }
}

/// Translates Go-style template source into engine source.
pub(crate) fn translate(source: &str) -> Result<Translation, RenderError> {
    let mut translator = Translator::default();
    let mut rest = source;
    let mut line = 1;

    while let Some((text, after_open)) = rest.split_once("{{") {
        translator.text(text);
        line += text.matches('\n').count();

        let Some((raw, after_close)) = after_open.split_once("}}") else {
            return Err(RenderError::malformed(line, "unterminated action"));
        };
        translator.action(&Action::split(raw, line))?;
        line += raw.matches('\n').count();
        rest = after_close;
    }

    translator.text(rest);
    translator.finish()
}

#[derive(Debug, Default)]
struct Translator {
    out: String,
    references: Vec<Reference>,
    stack: Vec<Frame>,
}

impl Translator {
    fn text(&mut self, text: &str) {
        let escaped = text
            .replace("{%", "{{ '{%' }}")
            .replace("{#", "{{ '{#' }}");
        self.out.push_str(&escaped);
    }

    fn tag(&mut self, action: &Action<'_>, (open, close): (char, char), body: &str) {
        self.out.push('{');
        self.out.push(open);
        if action.trim_before {
            self.out.push('-');
        }
        self.out.push(' ');
        self.out.push_str(body);
        self.out.extend(std::iter::repeat_n('\n', action.newlines));
        self.out.push(' ');
        if action.trim_after {
            self.out.push('-');
        }
        self.out.push(close);
        self.out.push('}');
    }

    fn statement(&mut self, action: &Action<'_>, body: &str) {
        self.tag(action, ('%', '%'), body);
    }

    fn action(&mut self, action: &Action<'_>) -> Result<(), RenderError> {
        let line = action.line;
        let body = action.body;

        if body.starts_with("/*") {
            if !body.ends_with("*/") {
                return Err(RenderError::malformed(line, "unterminated comment"));
            }
            self.tag(action, ('#', '#'), "");
            return Ok(());
        }

        let (keyword, argument) = body
            .split_once(char::is_whitespace)
            .map_or((body, ""), |(head, tail)| (head, tail.trim()));

        match keyword {
            "end" if argument.is_empty() => {
                let frame = self.stack.pop().ok_or_else(|| {
                    RenderError::malformed(line, "unexpected {{end}} without an open block")
                })?;
                self.statement(action, frame.kind.closing_tag());
            }
            "else" if argument.is_empty() => {
                self.claim_else(line)?;
                self.statement(action, "else");
            }
            "else" => {
                let Some(condition) = argument.strip_prefix("if ") else {
                    return Err(RenderError::malformed(
                        line,
                        format!("unexpected {{{{else {argument}}}}}"),
                    ));
                };
                self.check_else_if(line)?;
                let expression = self.condition(condition.trim(), line)?;
                self.statement(action, &format!("elif {expression}"));
            }
            "if" => {
                let expression = self.condition(argument, line)?;
                self.push(BlockKind::If, line);
                self.statement(action, &format!("if {expression}"));
            }
            "range" => {
                if argument == "." {
                    return Err(RenderError::malformed(line, "{{range}} needs a .Key operand"));
                }
                let iterable = self.field(argument, line, Usage::Range)?;
                self.push(BlockKind::Range, line);
                self.statement(action, &format!("for {DOT} in {iterable}"));
            }
            _ => {
                let expression = self.operand(body, line, Usage::Value)?;
                self.tag(action, ('{', '}'), &expression);
            }
        }
        Ok(())
    }

    fn push(&mut self, kind: BlockKind, line: usize) {
        self.stack.push(Frame {
            kind,
            line,
            has_else: false,
        });
    }

    fn claim_else(&mut self, line: usize) -> Result<(), RenderError> {
        let Some(frame) = self.stack.last_mut() else {
            return Err(RenderError::malformed(
                line,
                "unexpected {{else}} outside of a block",
            ));
        };
        if frame.has_else {
            return Err(RenderError::malformed(
                line,
                format!("second {{{{else}}}} in {{{{{}}}}}", frame.kind.keyword()),
            ));
        }
        frame.has_else = true;
        Ok(())
    }

    fn check_else_if(&self, line: usize) -> Result<(), RenderError> {
        match self.stack.last() {
            None => Err(RenderError::malformed(
                line,
                "unexpected {{else}} outside of a block",
            )),
            Some(frame) if frame.kind == BlockKind::Range => Err(RenderError::malformed(
                line,
                "{{else if}} is not allowed inside {{range}}",
            )),
            Some(frame) if frame.has_else => Err(RenderError::malformed(
                line,
                "second {{else}} in {{if}}",
            )),
            Some(_) => Ok(()),
        }
    }

    fn condition(&mut self, text: &str, line: usize) -> Result<String, RenderError> {
        let mut words = text.split_whitespace();
        let Some(head) = words.next() else {
            return Err(RenderError::malformed(line, "{{if}} needs a condition"));
        };
        let operands = words
            .map(|word| self.operand(word, line, Usage::Condition))
            .collect::<Result<Vec<_>, _>>()?;

        match (head, operands.as_slice()) {
            ("not", [operand]) => Ok(format!("not {operand}")),
            ("not", _) => Err(RenderError::malformed(line, "`not` takes one operand")),
            ("or" | "and", [_, _, ..]) => Ok(format!("({})", operands.join(format!(" {head} ").as_str()))),
            ("or" | "and", _) => Err(RenderError::malformed(
                line,
                format!("`{head}` takes at least two operands"),
            )),
            (_, []) => self.operand(head, line, Usage::Condition),
            _ => Err(RenderError::malformed(
                line,
                format!("unknown function `{head}`"),
            )),
        }
    }

    fn operand(&mut self, text: &str, line: usize, usage: Usage) -> Result<String, RenderError> {
        if text != "." {
            return self.field(text, line, usage);
        }
        if self.stack.iter().any(|frame| frame.kind == BlockKind::Range) {
            Ok(DOT.to_owned())
        } else {
            Err(RenderError::DotOutsideRange { line })
        }
    }

    fn field(&mut self, text: &str, line: usize, usage: Usage) -> Result<String, RenderError> {
        let Some(key) = text.strip_prefix('.') else {
            return Err(RenderError::malformed(
                line,
                format!("unknown action `{text}`"),
            ));
        };
        let mut chars = key.chars();
        let valid_head = chars
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
        if !valid_head || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(RenderError::malformed(
                line,
                format!("invalid field name `{text}`"),
            ));
        }
        self.references.push(Reference {
            key: key.to_owned(),
            line,
            usage,
        });
        Ok(format!("{FIXTURES}[\"{key}\"]"))
    }

    fn finish(self) -> Result<Translation, RenderError> {
        if let Some(frame) = self.stack.last() {
            return Err(RenderError::malformed(
                frame.line,
                format!("unclosed {{{{{}}}}}", frame.kind.keyword()),
            ));
        }
        Ok(Translation {
            source: self.out,
            references: self.references,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn source(template: &str) -> String {
        translate(template).expect("translate").source
    }

    #[test]
    fn rewrites_fields_as_fixture_lookups() {
        assert_eq!(
            source("name = \"{{.TGName}}\""),
            "name = \"{{ fixture[\"TGName\"] }}\""
        );
    }

    #[test]
    fn rewrites_blocks_into_engine_statements() {
        assert_eq!(
            source("{{if or .A .B}}x{{else if not .C}}y{{else}}z{{end}}"),
            "{% if (fixture[\"A\"] or fixture[\"B\"]) %}x\
             {% elif not fixture[\"C\"] %}y{% else %}z{% endif %}"
        );
        assert_eq!(
            source("{{range .Targets}}{{.}}{{end}}"),
            "{% for __dot__ in fixture[\"Targets\"] %}{{ __dot__ }}{% endfor %}"
        );
    }

    #[test]
    fn carries_trim_markers_and_drops_comments() {
        assert_eq!(source("a {{- .X -}} b"), "a {{- fixture[\"X\"] -}} b");
        assert_eq!(source("a{{/* note */}}b"), "a{#  #}b");
    }

    #[test]
    fn keeps_line_count_of_multiline_actions() {
        let translated = source("{{/* one\ntwo */}}\n{{.X}}");
        assert_eq!(translated.matches('\n').count(), 2);
    }

    #[test]
    fn escapes_engine_delimiters_in_literal_text() {
        assert_eq!(source("a {% b {# c"), "a {{ '{%' }} b {{ '{#' }} c");
    }

    #[test]
    fn records_every_reference_with_its_usage() {
        let translation =
            translate("{{if .On}}{{range .Items}}{{.Name}}{{end}}{{end}}").expect("translate");
        let usages = translation
            .references
            .iter()
            .map(|reference| (reference.key.as_str(), reference.usage))
            .collect::<Vec<_>>();
        assert_eq!(
            usages,
            [
                ("On", Usage::Condition),
                ("Items", Usage::Range),
                ("Name", Usage::Value),
            ]
        );
    }

    #[test]
    fn negative_numbers_are_not_trim_markers() {
        let err = translate("{{-3}}").expect_err("not a field");
        assert!(matches!(err, RenderError::Malformed { .. }));
    }

    #[rstest]
    #[case("{{if .A}}open", "unclosed {{if}}")]
    #[case("{{range .A}}open", "unclosed {{range}}")]
    #[case("text{{end}}", "unexpected {{end}}")]
    #[case("{{else}}", "unexpected {{else}}")]
    #[case("{{if .A}}a{{else}}b{{else}}c{{end}}", "second {{else}}")]
    #[case("{{if .A}}a{{else}}b{{else if .B}}c{{end}}", "second {{else}}")]
    #[case("{{range .A}}a{{else if .B}}b{{end}}", "not allowed inside {{range}}")]
    #[case("{{ .A ", "unterminated action")]
    #[case("{{template \"x\"}}", "unknown action")]
    #[case("{{.1abc}}", "invalid field name")]
    #[case("{{if}}x{{end}}", "needs a condition")]
    #[case("{{if or .A}}x{{end}}", "at least two operands")]
    #[case("{{if not .A .B}}x{{end}}", "one operand")]
    #[case("{{if eq .A .B}}x{{end}}", "unknown function")]
    #[case("{{range .}}x{{end}}", "needs a .Key operand")]
    #[case("{{/* open }}", "unterminated comment")]
    fn rejects_malformed_templates(#[case] template: &str, #[case] fragment: &str) {
        let err = translate(template).expect_err("template should be rejected");
        let RenderError::Malformed { message, .. } = &err else {
            panic!("expected malformed error, got {err:?}");
        };
        assert!(
            message.contains(fragment),
            "`{message}` should mention `{fragment}`"
        );
    }

    #[test]
    fn reports_line_of_unclosed_block() {
        let err = translate("line one\nline two\n{{ if .IsDataSource }}\nbody\n")
            .expect_err("unclosed");
        assert_eq!(err, RenderError::malformed(3, "unclosed {{if}}"));
    }

    #[test]
    fn dot_is_only_valid_inside_range() {
        assert_eq!(
            translate("x\n{{.}}"),
            Err(RenderError::DotOutsideRange { line: 2 })
        );
        assert!(translate("{{range .L}}{{if .}}{{.}}{{end}}{{end}}").is_ok());
    }
}
