//! Storefront page behaviors over a deterministic in-memory document.
//!
//! A [`Page`] is built from markup; the storefront scripts it references
//! (`product_filters.js`, `cart.js`, ...) are installed as Rust behaviors
//! and react to the same events the browser would deliver. The filter
//! rules themselves are available as a pure function in [`filters`].

use std::error::Error as StdError;
use std::fmt;

mod dom;
pub mod filters;
mod html;
mod page;
pub mod scripts;
mod selector;

pub use filters::{
    AttributeField, CATEGORY_RULES, Category, CategoryRule, FilterOutcome, FilterState,
    MissingControl, SyncOutcome, synchronize,
};
pub use page::{FormSubmission, Page};
pub use scripts::Script;
pub use scripts::cart_ajax::{CartEndpoint, EndpointResponse};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    OptionNotFound {
        selector: String,
        value: String,
    },
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
    Dom(String),
    /// A rejected page setting.
    Config(String),
    /// A built-in text pattern failed to compile or to run.
    Pattern(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::OptionNotFound { selector, value } => {
                write!(f, "no option with value {value:?} in {selector}")
            }
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Pattern(msg) => write!(f, "pattern error: {msg}"),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
