// src/bitbucket/mod.rs
// =============================================================================
// Repository discovery against Bitbucket-style providers.
//
// How the pieces fit together:
// - types.rs: wire shapes for both API generations, plus RepoDescriptor
// - client.rs: the authenticated HTTP client and its endpoints
// - paging.rs: cursor-following page streams the client builds on
// - parser.rs: turns raw repository JSON into RepoDescriptor values
// =============================================================================

pub mod client;
pub mod paging;
pub mod parser;
pub mod types;
