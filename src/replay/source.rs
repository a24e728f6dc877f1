//! Sources of recorded block triples

use crate::Result;
use crate::protocol::BlockTriple;
use std::collections::VecDeque;

/// Trait for replay data sources
///
/// A source hands out recorded block triples in order. Pacing is the engine's job;
/// sources just read as fast as they are asked.
#[async_trait::async_trait]
pub trait TripleSource: Send + 'static {
    /// Get the next recorded block
    ///
    /// Returns:
    /// - `Ok(Some(triple))` - Next block in recording order
    /// - `Ok(None)` - End of the recording
    /// - `Err(e)` - Entry could not be read; the source has moved past it
    async fn next_triple(&mut self) -> Result<Option<BlockTriple>>;
}

/// In-memory source, for tests and synthetic playback.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    triples: VecDeque<BlockTriple>,
}

impl MemorySource {
    pub fn new(triples: impl IntoIterator<Item = BlockTriple>) -> Self {
        Self { triples: triples.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.triples.len()
    }
}

#[async_trait::async_trait]
impl TripleSource for MemorySource {
    async fn next_triple(&mut self) -> Result<Option<BlockTriple>> {
        Ok(self.triples.pop_front())
    }
}
