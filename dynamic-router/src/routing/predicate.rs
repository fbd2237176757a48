//! Predicate capability and the subscribe-time sources it is resolved from.

use crate::message::Message;
use crate::routing::expression;
use crate::routing::predicate_bean_registry::PredicateBeanRegistry;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Boolean test applied to a message while routing.
pub trait Predicate: Send + Sync {
    fn matches(&self, message: &Message) -> Result<bool, PredicateError>;
}

/// Failure raised while a predicate evaluates a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PredicateError {
    reason: String,
}

impl PredicateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for PredicateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "predicate evaluation failed: {}", self.reason)
    }
}

impl Error for PredicateError {}

/// Adapts a closure into a [`Predicate`].
pub struct FnPredicate<F> {
    test: F,
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&Message) -> bool + Send + Sync,
{
    fn matches(&self, message: &Message) -> Result<bool, PredicateError> {
        Ok((self.test)(message))
    }
}

/// Wraps an infallible closure as a shareable predicate.
///
/// ```
/// use dynamic_router::{predicate_fn, Message, Predicate};
///
/// let even = predicate_fn(|message: &Message| message.body().len() % 2 == 0);
/// assert!(even.matches(&Message::new("ab")).unwrap());
/// ```
pub fn predicate_fn<F>(test: F) -> Arc<dyn Predicate>
where
    F: Fn(&Message) -> bool + Send + Sync + 'static,
{
    Arc::new(FnPredicate { test })
}

/// Predicate that always answers the same value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConstantPredicate(pub bool);

impl Predicate for ConstantPredicate {
    fn matches(&self, _message: &Message) -> Result<bool, PredicateError> {
        Ok(self.0)
    }
}

/// Shareable predicate handle that can travel inside control requests.
#[derive(Clone)]
pub struct PredicateRef(pub Arc<dyn Predicate>);

impl Debug for PredicateRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("PredicateRef(<predicate instance>)")
    }
}

impl From<Arc<dyn Predicate>> for PredicateRef {
    fn from(predicate: Arc<dyn Predicate>) -> Self {
        Self(predicate)
    }
}

/// Failures resolving a [`PredicateSource`] into a predicate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PredicateResolveError {
    UnknownLanguage(String),
    InvalidExpression { language: String, reason: String },
    UnknownBean(String),
}

impl Display for PredicateResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PredicateResolveError::UnknownLanguage(language) => {
                write!(f, "unknown expression language '{language}'")
            }
            PredicateResolveError::InvalidExpression { language, reason } => {
                write!(f, "invalid {language} expression: {reason}")
            }
            PredicateResolveError::UnknownBean(name) => {
                write!(f, "no predicate bean registered as '{name}'")
            }
        }
    }
}

impl Error for PredicateResolveError {}

/// The three ways a subscriber can supply its predicate.
#[derive(Clone)]
pub enum PredicateSource {
    Expression { expression: String, language: String },
    Bean(String),
    Instance(Arc<dyn Predicate>),
}

impl Debug for PredicateSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PredicateSource::Expression {
                expression,
                language,
            } => f
                .debug_struct("Expression")
                .field("expression", expression)
                .field("language", language)
                .finish(),
            PredicateSource::Bean(name) => f.debug_tuple("Bean").field(name).finish(),
            PredicateSource::Instance(_) => f.write_str("Instance(<predicate instance>)"),
        }
    }
}

impl PredicateSource {
    /// Resolves the source once, at subscribe time.
    pub(crate) fn resolve(
        &self,
        beans: &PredicateBeanRegistry,
    ) -> Result<Arc<dyn Predicate>, PredicateResolveError> {
        match self {
            PredicateSource::Expression {
                expression,
                language,
            } => expression::compile(language, expression),
            PredicateSource::Bean(name) => beans
                .lookup(name)
                .ok_or_else(|| PredicateResolveError::UnknownBean(name.clone())),
            PredicateSource::Instance(predicate) => Ok(predicate.clone()),
        }
    }

    /// Human readable origin, kept on the filter for listings.
    pub fn describe(&self) -> String {
        match self {
            PredicateSource::Expression {
                expression,
                language,
            } => format!("{language}: {expression}"),
            PredicateSource::Bean(name) => format!("bean: {name}"),
            PredicateSource::Instance(_) => "predicate instance".to_string(),
        }
    }
}
