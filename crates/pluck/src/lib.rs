// ABOUTME: Main library entry point for the pluck field extractor.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, requests, rules, results, errors.

//! pluck - A selector-driven field extractor for web pages.
//!
//! This crate fetches a page, parses it, and resolves a fallback chain of
//! selectors against it, returning the field's normalized text or a typed
//! failure. "Not found" is a normal outcome, distinct from fetch and parse
//! errors.
//!
//! # Example
//!
//! ```no_run
//! use pluck::{Client, ExtractError, ExtractionRequest, SelectorSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ExtractError> {
//!     let client = Client::builder().build();
//!     let request = ExtractionRequest::with_selector(
//!         "https://example.test/p/1",
//!         SelectorSpec::id("priceblock_ourprice"),
//!     );
//!     match client.extract(&request).await? {
//!         pluck::Extraction::Found(price) => println!("{}", price),
//!         pluck::Extraction::NotFound => eprintln!("no price on page"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod fetch;
pub mod options;
pub mod query;
pub mod request;
pub mod result;
pub mod retry;
pub mod selector;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::options::{ClientBuilder, Options};
pub use crate::request::ExtractionRequest;
pub use crate::result::Extraction;
pub use crate::retry::RetryPolicy;
pub use crate::selector::{builtin_rules, DomainRules, FieldRule, RuleRegistry, SelectorSpec};
