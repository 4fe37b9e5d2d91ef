use super::{
    scope::Scope,
    tree::{Block, Call, Tree},
};
use crate::region::Region;

/// A block that has been opened, but not yet closed.
#[derive(Debug)]
pub struct BlockState {
    /// The head of the block.
    pub call: Call,
    /// True for blocks opened with `{{^`.
    pub negated: bool,
    /// True for blocks opened by an `{{else NAME}}` tag, which are closed
    /// together with the block they are chained to.
    pub chained: bool,
    /// The finished body, set once an `else` switches to the inverse.
    pub body: Option<Scope>,
    /// Area of the opening tag.
    pub region: Region,
}

impl BlockState {
    /// Create a new [`BlockState`].
    pub fn new(call: Call, negated: bool, chained: bool, region: Region) -> Self {
        Self {
            call,
            negated,
            chained,
            body: None,
            region,
        }
    }

    /// Return the name that closes this block.
    pub fn name<'source>(&self, source: &'source str) -> &'source str {
        self.call.head.get_region().literal(source)
    }

    /// Finish the block with the last open [`Scope`], which is the body, or
    /// the inverse when an `else` was seen.
    pub fn finish(self, scope: Scope) -> Tree {
        let (body, inverse) = match self.body {
            Some(body) => (body, Some(scope)),
            None => (scope, None),
        };

        Tree::Block(Block {
            call: self.call,
            negated: self.negated,
            body,
            inverse,
            region: self.region,
        })
    }
}
