//! Conflict resolution
//!
//! Last-writer-wins on timestamps: a remote document replaces the local record
//! only when it is strictly newer.

use chrono::{DateTime, Utc};

use crate::local::LocalRecord;
use crate::remote::Document;

use super::decode::{lookup, LAST_MODIFIED};
use super::descriptor::EntityDescriptor;

/// Action to take for a pulled document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Insert,
    Overwrite,
    Skip,
}

/// Timestamp-based resolver for pulled records
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    descriptor: &'static EntityDescriptor,
}

impl ConflictResolver {
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Decide between inserting, overwriting or keeping the local record
    pub fn resolve(remote_ts: i64, local_present: bool, local_ts: i64) -> Resolution {
        if !local_present {
            Resolution::Insert
        } else if remote_ts > local_ts {
            Resolution::Overwrite
        } else {
            Resolution::Skip
        }
    }

    /// Remote write time carried by the document: `lastModified`, then the
    /// business timestamp
    pub fn remote_timestamp(&self, doc: &Document) -> Option<i64> {
        doc.get(LAST_MODIFIED)
            .and_then(|v| v.timestamp_millis())
            .or_else(|| {
                lookup(&doc.fields, self.descriptor.timestamp_names()).and_then(|v| v.timestamp_millis())
            })
    }

    /// Timestamp to compare against the local one. Documents without any
    /// timestamp count as written `now`, so they always win.
    pub fn effective_timestamp(carried: Option<i64>, now: DateTime<Utc>) -> i64 {
        carried.unwrap_or_else(|| now.timestamp_millis())
    }

    /// Local business timestamp, epoch zero when absent
    pub fn local_timestamp(&self, record: &LocalRecord) -> i64 {
        lookup(&record.fields, self.descriptor.timestamp_names())
            .and_then(|v| v.timestamp_millis())
            .unwrap_or(0)
    }
}
