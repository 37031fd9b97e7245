//! Centralized default constants for the almacen backend.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page number (1-based).
pub const PAGE: i64 = 1;

/// Default page size for the materials listing.
pub const PER_PAGE: i64 = 20;

/// Upper clamp for caller-supplied page sizes.
pub const PER_PAGE_MAX: i64 = 200;

// =============================================================================
// MOVEMENTS
// =============================================================================

/// Default number of recent movements returned per material.
pub const MOVEMENTS_LIMIT: i64 = 5;

// =============================================================================
// CHAT MAILBOX
// =============================================================================

/// Maximum queued messages per session; oldest are dropped past this.
pub const MAILBOX_CAPACITY: usize = 100;

// =============================================================================
// BLOB UPLOADS
// =============================================================================

/// Size cap for remotely-fetched cover images (bytes).
pub const COVER_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for remote cover-image downloads (seconds).
pub const COVER_FETCH_TIMEOUT_SECS: u64 = 15;

/// Request body limit for upload endpoints (bytes).
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;
