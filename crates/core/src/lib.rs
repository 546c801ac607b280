//! Core library for the LibraryHub client
//!
//! This crate implements the **Functional Core** of the LibraryHub client,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The workspace uses a two-crate architecture:
//!
//! - **`libraryhub_core`** (this crate): Wire models and pure transformation
//!   functions with zero I/O
//! - **`libraryhub`**: HTTP calls, the shared session store and the CLI
//!   (the Imperative Shell)
//!
//! Every decision the request layer makes about a response (is it empty, is
//! it a success envelope, which error kind does it map to) is taken here, on
//! plain bytes and status codes, so it can be tested with fixture data.
//!
//! # Module Organization
//!
//! - [`envelope`]: The `{code, data, errMessage, isSuccess}` response contract
//! - [`error`]: The API error taxonomy
//! - [`session`]: Session state and its transitions
//! - [`cookies`]: Cookie header parsing and URL helpers
//! - [`auth`]: Authentication request bodies and user identity
//! - [`books`]: Book, borrowing, review and favorite models
//! - [`articles`]: Announcements and presigned object-storage uploads
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use libraryhub_core::envelope::decode_response;
//!
//! let body = br#"{"code":200,"data":{"tokenValue":"abc"},"errMessage":null,"isSuccess":true}"#;
//! let data = decode_response(200, Some("OK"), false, body)?;
//!
//! assert_eq!(data.unwrap()["tokenValue"], "abc");
//! ```

pub mod articles;
pub mod auth;
pub mod books;
pub mod cookies;
pub mod envelope;
pub mod error;
pub mod session;
