use std::ops::Range;

use fsblob_types::BlobKey;

use crate::error::{StoreError, StoreResult};
use crate::writer::BlobWriter;

/// What a resolve, read, or remove operates on.
#[derive(Clone, Copy, Debug)]
pub enum BlobRef<'a> {
    /// A key string as returned by a completed write.
    Key(&'a str),
    /// A finished write handle, standing in for its own key.
    Handle(&'a BlobWriter),
}

impl BlobRef<'_> {
    /// Parsed key. A malformed key string is `None` (nothing can exist
    /// under it); an unfinished handle is an error.
    pub(crate) fn to_key(self) -> StoreResult<Option<BlobKey>> {
        match self {
            Self::Key(s) => Ok(BlobKey::parse(s).ok()),
            Self::Handle(writer) => writer
                .key()
                .cloned()
                .map(Some)
                .ok_or(StoreError::InvalidState("blob write has not finished")),
        }
    }

    /// Human-readable form for error messages.
    pub(crate) fn describe(self) -> String {
        match self {
            Self::Key(s) => s.to_string(),
            Self::Handle(writer) => writer
                .key()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<unfinished write>".into()),
        }
    }
}

impl<'a> From<&'a str> for BlobRef<'a> {
    fn from(key: &'a str) -> Self {
        Self::Key(key)
    }
}

impl<'a> From<&'a String> for BlobRef<'a> {
    fn from(key: &'a String) -> Self {
        Self::Key(key)
    }
}

impl<'a> From<&'a BlobWriter> for BlobRef<'a> {
    fn from(writer: &'a BlobWriter) -> Self {
        Self::Handle(writer)
    }
}

/// Target of a read plus an optional byte range `[start, end)`.
#[derive(Clone, Copy, Debug)]
pub struct ReadSelector<'a> {
    pub target: BlobRef<'a>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl<'a> ReadSelector<'a> {
    /// Read the whole blob.
    pub fn new(target: impl Into<BlobRef<'a>>) -> Self {
        Self {
            target: target.into(),
            start: None,
            end: None,
        }
    }

    /// First byte to produce.
    pub fn start(mut self, offset: u64) -> Self {
        self.start = Some(offset);
        self
    }

    /// Exclusive end offset.
    pub fn end(mut self, offset: u64) -> Self {
        self.end = Some(offset);
        self
    }

    pub fn range(self, range: Range<u64>) -> Self {
        self.start(range.start).end(range.end)
    }
}

impl<'a> From<BlobRef<'a>> for ReadSelector<'a> {
    fn from(target: BlobRef<'a>) -> Self {
        Self::new(target)
    }
}
