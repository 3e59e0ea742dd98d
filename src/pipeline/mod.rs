//! Pipeline stages for turning converter markdown into a post body.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own. The order is fixed by [`crate::convert`]:
//!
//! ## Data Flow
//!
//! ```text
//! protect ──▶ reformat ──▶ assets ──▶ inline ──▶ disclosure ──▶ protect
//! (extract)   (lines)      (images)   (captions)  (details)      (restore)
//! ```
//!
//! 1. [`protect`]    — lift code fences and `<details>` blocks out as
//!    placeholder tokens
//! 2. [`reformat`]   — blockquote, paragraph-break and blank-line rules on
//!    the remaining text
//! 3. [`assets`]     — mirror transient upload-host images; the only stage
//!    with network I/O
//! 4. [`inline`]     — inline markdown inside top-level `<summary>` captions
//!    to HTML
//! 5. [`disclosure`] — finish each protected `<details>` block
//! 6. [`protect`]    — put every region back

pub mod assets;
pub mod disclosure;
pub mod inline;
pub mod protect;
pub mod reformat;
