//! Structured HCL document builder.
//!
//! Documents are assembled as a tree of blocks where optional sub-blocks are
//! gated by booleans, then serialized in one pass. Gating whole blocks
//! rather than lines keeps the output syntactically valid, and [`Document::render`]
//! refuses to emit a document whose references name blocks that were
//! switched off.

mod block;
mod writer;

use std::collections::BTreeSet;

use thiserror::Error;

pub use block::{Block, BodyItem, Reference, Value};

/// Errors raised while validating a document before serialization.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DocumentError {
    /// Raised when a reference points at a block absent from the document.
    #[error("{from} references {reference}, but {target} is not declared")]
    DanglingReference {
        /// Address of the block holding the reference.
        from: String,
        /// Reference as written.
        reference: String,
        /// Address the reference resolves to.
        target: String,
    },
    /// Raised when two top-level blocks share an address.
    #[error("{address} is declared more than once")]
    DuplicateAddress {
        /// Repeated address.
        address: String,
    },
}

/// Ordered collection of top-level blocks.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a top-level block.
    #[must_use]
    pub fn with(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Appends a top-level block when `include` holds.
    #[must_use]
    pub fn with_if(self, include: bool, build: impl FnOnce() -> Block) -> Self {
        if include { self.with(build()) } else { self }
    }

    /// Appends every block of `other`.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.blocks.extend(other.blocks);
        self
    }

    /// Top-level blocks in order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Finds a top-level block by address.
    #[must_use]
    pub fn find(&self, address: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|block| block.address().as_deref() == Some(address))
    }

    /// Addresses of every top-level `resource` and `data` block.
    #[must_use]
    pub fn addresses(&self) -> BTreeSet<String> {
        self.blocks.iter().filter_map(Block::address).collect()
    }

    /// Checks addresses are unique and every reference resolves.
    ///
    /// # Errors
    ///
    /// Returns the first [`DocumentError`] found, in block order.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut declared = BTreeSet::new();
        for address in self.blocks.iter().filter_map(Block::address) {
            if !declared.insert(address.clone()) {
                return Err(DocumentError::DuplicateAddress { address });
            }
        }

        for block in &self.blocks {
            for reference in block.references() {
                let Some(target) = reference.target_address() else {
                    continue;
                };
                if !declared.contains(&target) {
                    return Err(DocumentError::DanglingReference {
                        from: block.address().unwrap_or_else(|| block.kind().to_owned()),
                        reference: reference.as_str().to_owned(),
                        target,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validates and serializes the document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when validation fails; nothing is emitted.
    pub fn render(&self) -> Result<String, DocumentError> {
        self.validate()?;
        let mut out = String::new();
        for (position, block) in self.blocks.iter().enumerate() {
            if position > 0 {
                out.push('\n');
            }
            writer::write_block(&mut out, block, 0);
        }
        tracing::debug!(
            blocks = self.blocks.len(),
            bytes = out.len(),
            "rendered document"
        );
        Ok(out)
    }
}
