//! Text templates with value interpolation and conditional fragments.
//!
//! The accepted syntax is a small subset of Go's `text/template`, which is
//! what HCL fixtures for provider acceptance tests are usually written in:
//!
//! - `{{.Key}}` interpolates a fixture value;
//! - `{{if .Flag}} ... {{else}} ... {{end}}` gates a fragment, with `not`,
//!   `or` and `and` available as condition functions;
//! - `{{range .List}} ... {{.}} ... {{end}}` repeats a fragment per element;
//! - `{{/* ... */}}` comments and `{{-` / `-}}` whitespace trimming.
//!
//! Actions are rewritten into minijinja statements and rendered with strict
//! undefined handling, so any evaluated reference to an absent key fails the
//! render. Rendering is all-or-nothing: on error no partial document is
//! returned.

mod error;
mod fixtures;
mod translate;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use minijinja::value::{Object, Value};
use minijinja::{Environment, ErrorKind, UndefinedBehavior, context};

pub use error::RenderError;
pub use fixtures::{FixtureMap, FixtureValue};

use crate::names::{NameGenerator, RandomNames};
use translate::{Reference, Usage};

/// Parsed template ready to be rendered against any number of fixture maps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    source: String,
    references: Vec<Reference>,
}

impl Template {
    /// Parses template source.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Malformed`] for unbalanced blocks or unknown
    /// actions and [`RenderError::DotOutsideRange`] for `{{.}}` outside a
    /// `range` body.
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        let translation = translate::translate(source)?;
        environment()
            .template_from_str(&translation.source)
            .map_err(|err| RenderError::Engine {
                line: err.line().unwrap_or(1),
                message: err.to_string(),
            })?;
        Ok(Self {
            source: translation.source,
            references: translation.references,
        })
    }

    /// Renders with random name suffixes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when a referenced key is missing or a value
    /// has the wrong shape for its action.
    pub fn render(&self, fixtures: &FixtureMap) -> Result<String, RenderError> {
        self.render_with(fixtures, &mut RandomNames)
    }

    /// Renders using `names` to resolve random-with-prefix placeholders.
    /// Each placeholder is resolved once, so repeated references to the same
    /// key produce the same name.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when a referenced key is missing or a value
    /// has the wrong shape for its action.
    pub fn render_with(
        &self,
        fixtures: &FixtureMap,
        names: &mut impl NameGenerator,
    ) -> Result<String, RenderError> {
        let resolved = fixtures.resolve(names);
        check_shapes(&self.references, &resolved)?;

        let scope = Arc::new(FixtureScope::new(&resolved));
        let output = environment()
            .render_str(
                &self.source,
                context! { fixture => Value::from_dyn_object(Arc::clone(&scope)) },
            )
            .map_err(|err| scope.failure(&err))?;
        tracing::debug!(
            keys = fixtures.len(),
            bytes = output.len(),
            "rendered template"
        );
        Ok(output)
    }

    /// Keys referenced anywhere in the template, including inside blocks
    /// that a given fixture map might disable.
    #[must_use]
    pub fn referenced_keys(&self) -> BTreeSet<String> {
        self.references
            .iter()
            .map(|reference| reference.key.clone())
            .collect()
    }
}

/// Parses and renders `template` in one step with random name suffixes.
///
/// # Errors
///
/// Returns [`RenderError`] on malformed templates or missing keys.
pub fn render(template: &str, fixtures: &FixtureMap) -> Result<String, RenderError> {
    Template::parse(template)?.render(fixtures)
}

/// Parses and renders `template` with an explicit name generator.
///
/// # Errors
///
/// Returns [`RenderError`] on malformed templates or missing keys.
pub fn render_with(
    template: &str,
    fixtures: &FixtureMap,
    names: &mut impl NameGenerator,
) -> Result<String, RenderError> {
    Template::parse(template)?.render_with(fixtures, names)
}

/// Concatenates independently rendered documents, one blank line apart.
///
/// The declarative target resolves references by name, so part order only
/// affects layout.
#[must_use]
pub fn compose<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = parts
        .into_iter()
        .map(|part| part.as_ref().trim().to_owned())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

/// Shape errors are raised for every reference to a present key, including
/// references inside fragments the fixture map disables.
fn check_shapes(references: &[Reference], fixtures: &FixtureMap) -> Result<(), RenderError> {
    for reference in references {
        let Some(value) = fixtures.get(&reference.key) else {
            continue;
        };
        let is_list = matches!(value, FixtureValue::List(_));
        match reference.usage {
            Usage::Value if is_list => {
                return Err(RenderError::NotScalar {
                    key: reference.key.clone(),
                    line: reference.line,
                });
            }
            Usage::Range if !is_list => {
                return Err(RenderError::NotIterable {
                    key: reference.key.clone(),
                    line: reference.line,
                });
            }
            Usage::Value | Usage::Condition | Usage::Range => {}
        }
    }
    Ok(())
}

/// Resolved fixtures as seen by the engine. Remembers the last key that was
/// looked up and found absent, which is the key a strict-mode undefined
/// error is about.
#[derive(Debug)]
struct FixtureScope {
    values: BTreeMap<String, Value>,
    missing: Mutex<Option<String>>,
}

impl FixtureScope {
    fn new(fixtures: &FixtureMap) -> Self {
        let values = fixtures
            .iter()
            .map(|(key, value)| (key.clone(), engine_value(value)))
            .collect();
        Self {
            values,
            missing: Mutex::new(None),
        }
    }

    fn failure(&self, err: &minijinja::Error) -> RenderError {
        let line = err.line().unwrap_or(1);
        let missing = self.missing.lock().ok().and_then(|mut slot| slot.take());
        match missing {
            Some(key) if err.kind() == ErrorKind::UndefinedError => {
                RenderError::MissingKey { key, line }
            }
            _ => RenderError::Engine {
                line,
                message: err.to_string(),
            },
        }
    }
}

impl Object for FixtureScope {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        let found = self.values.get(name).cloned();
        if found.is_none()
            && let Ok(mut missing) = self.missing.lock()
        {
            *missing = Some(name.to_owned());
        }
        found
    }
}

fn engine_value(value: &FixtureValue) -> Value {
    match value {
        FixtureValue::Bool(flag) => Value::from(*flag),
        FixtureValue::Int(number) => Value::from(*number),
        FixtureValue::Str(text) => Value::from(text.as_str()),
        FixtureValue::List(items) => Value::from(items.clone()),
        FixtureValue::Random { random_with_prefix } => Value::from(random_with_prefix.as_str()),
    }
}
