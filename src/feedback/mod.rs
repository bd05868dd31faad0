// src/feedback/mod.rs
// =============================================================================
// Feedback links for rendered documentation pages.
//
// link.rs holds the whole feature: recognizing the edit anchor, classifying
// the hosting provider and building the prefilled issue URL.
// =============================================================================

pub mod link;
