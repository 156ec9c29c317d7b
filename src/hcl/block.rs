//! Blocks, attribute values, and references.

/// A traversal such as `yandex_vpc_subnet.test-subnet.id`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Reference(String);

impl Reference {
    /// Wraps a traversal expression.
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// The traversal as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address of the block this reference points at: `TYPE.NAME` for
    /// resources and `data.TYPE.NAME` for data sources. Variables, locals and
    /// other namespaces yield `None`.
    #[must_use]
    pub fn target_address(&self) -> Option<String> {
        let mut segments = self.0.split('.');
        let head = segments.next()?;
        match head {
            "var" | "local" | "module" | "path" | "each" | "count" | "self" => None,
            "data" => {
                let kind = segments.next()?;
                let name = segments.next()?;
                Some(format!("data.{kind}.{name}"))
            }
            kind => {
                let name = segments.next()?;
                Some(format!("{kind}.{name}"))
            }
        }
    }
}

/// Attribute value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// Quoted literal string.
    Str(String),
    /// Integer literal.
    Number(i64),
    /// Boolean literal.
    Bool(bool),
    /// Bare traversal, e.g. `yandex_vpc_network.test-network.id`.
    Reference(Reference),
    /// Traversal wrapped in a string template, e.g. `"${...}"`.
    Interpolation(Reference),
    /// Tuple of values.
    List(Vec<Value>),
    /// Object with ordered keys.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Builds a bare reference value.
    #[must_use]
    pub fn reference(expression: impl Into<String>) -> Self {
        Self::Reference(Reference::new(expression))
    }

    /// Builds an interpolated reference value.
    #[must_use]
    pub fn interpolation(expression: impl Into<String>) -> Self {
        Self::Interpolation(Reference::new(expression))
    }

    /// Builds a map from key/value pairs, keeping their order.
    #[must_use]
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub(crate) fn collect_references<'a>(&'a self, into: &mut Vec<&'a Reference>) {
        match self {
            Self::Reference(reference) | Self::Interpolation(reference) => into.push(reference),
            Self::List(items) => items.iter().for_each(|item| item.collect_references(into)),
            Self::Map(entries) => entries
                .iter()
                .for_each(|(_, value)| value.collect_references(into)),
            Self::Str(_) | Self::Number(_) | Self::Bool(_) => {}
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

/// Entry in a block body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BodyItem {
    /// `name = value`.
    Attribute {
        /// Attribute name.
        name: String,
        /// Attribute value.
        value: Value,
    },
    /// Nested block.
    Block(Block),
}

/// A block such as `resource "TYPE" "NAME" { ... }` or a nested `target { }`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    kind: String,
    labels: Vec<String>,
    body: Vec<BodyItem>,
}

impl Block {
    /// Creates an unlabelled block, typically nested.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            labels: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a `resource "TYPE" "NAME"` block.
    #[must_use]
    pub fn resource(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new("resource").label(resource_type).label(name)
    }

    /// Creates a `data "TYPE" "NAME"` block.
    #[must_use]
    pub fn data(data_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new("data").label(data_type).label(name)
    }

    /// Appends a label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Appends an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.push(BodyItem::Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a nested block.
    #[must_use]
    pub fn block(mut self, block: Self) -> Self {
        self.body.push(BodyItem::Block(block));
        self
    }

    /// Appends a nested block only when `include` holds. The closure is not
    /// called otherwise, so a disabled block contributes nothing.
    #[must_use]
    pub fn block_if(self, include: bool, build: impl FnOnce() -> Self) -> Self {
        if include { self.block(build()) } else { self }
    }

    /// Appends every block produced by `blocks`.
    #[must_use]
    pub fn blocks(mut self, blocks: impl IntoIterator<Item = Self>) -> Self {
        self.body.extend(blocks.into_iter().map(BodyItem::Block));
        self
    }

    /// Block keyword, e.g. `resource`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Block labels in order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Body items in order.
    #[must_use]
    pub fn body(&self) -> &[BodyItem] {
        &self.body
    }

    /// Value of a direct attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.body.iter().find_map(|item| match item {
            BodyItem::Attribute { name: key, value } if key == name => Some(value),
            _ => None,
        })
    }

    /// Direct nested blocks of the given kind.
    pub fn nested<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.body.iter().filter_map(move |item| match item {
            BodyItem::Block(block) if block.kind == kind => Some(block),
            _ => None,
        })
    }

    /// Configuration address for top-level `resource` and `data` blocks.
    #[must_use]
    pub fn address(&self) -> Option<String> {
        let mut labels = self.labels.iter();
        match self.kind.as_str() {
            "resource" => {
                let kind = labels.next()?;
                let name = labels.next()?;
                Some(format!("{kind}.{name}"))
            }
            "data" => {
                let kind = labels.next()?;
                let name = labels.next()?;
                Some(format!("data.{kind}.{name}"))
            }
            _ => None,
        }
    }

    /// Every reference in this block and its nested blocks.
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, into: &mut Vec<&'a Reference>) {
        for item in &self.body {
            match item {
                BodyItem::Attribute { value, .. } => value.collect_references(into),
                BodyItem::Block(block) => block.collect_references(into),
            }
        }
    }
}
