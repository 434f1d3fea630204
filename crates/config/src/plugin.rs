//! Interceptor chain.
//!
//! An [`Interceptor`] declares the methods it wants to see through [`Signature`]s. Wrapping a
//! [`Target`] produces a [`Plugin`] that routes matching calls to the interceptor and every
//! other call straight to the target. [`InterceptorChain::plugin_all`] applies every
//! interceptor in declaration order, so the last declared interceptor is the outermost layer.

use mapr_parsing::Properties;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::sync::Arc;
use strum_macros::{Display, EnumString, IntoStaticStr};
use tracing::debug;

#[mapr_derive::mapr_error]
pub enum InvocationError {
    #[error("Method {method} is not supported by {target}{}", format_context(.context))]
    UnsupportedMethod { target: TargetKind, method: String, context: Option<Cow<'static, str>> },

    #[error("Invocation failed{}: {message}", format_context(.context))]
    Failed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal invocation error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// The core execution objects that can be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum TargetKind {
    Executor,
    StatementHandler,
    ParameterHandler,
    ResultSetHandler,
}

/// One intercepted method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub target: TargetKind,
    pub method: Cow<'static, str>,
}

impl Signature {
    #[must_use]
    pub fn new(target: TargetKind, method: impl Into<Cow<'static, str>>) -> Self {
        Self { target, method: method.into() }
    }
}

/// An object whose calls can be intercepted.
pub trait Target: Debug + Send + Sync {
    fn kind(&self) -> TargetKind;

    /// # Errors
    /// [`InvocationError::UnsupportedMethod`] for a method the target does not have.
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError>;
}

/// A call captured by a [`Plugin`].
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    target: &'a dyn Target,
    method: &'a str,
    args: &'a [Value],
}

impl<'a> Invocation<'a> {
    #[must_use]
    pub const fn target(&self) -> &'a dyn Target {
        self.target
    }

    #[must_use]
    pub const fn method(&self) -> &'a str {
        self.method
    }

    #[must_use]
    pub const fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Runs the call on the wrapped target.
    ///
    /// # Errors
    /// Whatever the target returns.
    pub fn proceed(&self) -> Result<Value, InvocationError> {
        self.target.invoke(self.method, self.args)
    }

    /// Runs the call on the wrapped target with replaced arguments.
    ///
    /// # Errors
    /// Whatever the target returns.
    pub fn proceed_with(&self, args: &[Value]) -> Result<Value, InvocationError> {
        self.target.invoke(self.method, args)
    }
}

#[doc(hidden)]
pub trait AsInterceptor {
    fn as_interceptor(self: Arc<Self>) -> Arc<dyn Interceptor>;
}

impl<T: Interceptor + 'static> AsInterceptor for T {
    fn as_interceptor(self: Arc<Self>) -> Arc<dyn Interceptor> {
        self
    }
}

/// Cross-cutting behavior around target calls.
///
/// ```rust
/// use mapr_config::plugin::{Interceptor, InvocationError, Invocation, Signature, TargetKind};
/// use serde_json::Value;
///
/// #[derive(Debug, Default)]
/// struct Timing;
///
/// impl Interceptor for Timing {
///     fn signatures(&self) -> Vec<Signature> {
///         vec![Signature::new(TargetKind::Executor, "query")]
///     }
///
///     fn intercept(&self, invocation: Invocation<'_>) -> Result<Value, InvocationError> {
///         let started = std::time::Instant::now();
///         let result = invocation.proceed();
///         tracing::debug!(elapsed = ?started.elapsed(), "query finished");
///         result
///     }
/// }
/// ```
pub trait Interceptor: AsInterceptor + Debug + Send + Sync {
    /// Receives the `<property>` children of the `<plugin>` element.
    fn set_properties(&mut self, _properties: Properties) {}

    fn signatures(&self) -> Vec<Signature>;

    /// # Errors
    /// Whatever the interceptor or the wrapped target report.
    fn intercept(&self, invocation: Invocation<'_>) -> Result<Value, InvocationError>;

    /// Wraps `target` when any signature names its kind, otherwise returns it unchanged.
    fn plugin(self: Arc<Self>, target: Arc<dyn Target>) -> Arc<dyn Target> {
        Plugin::wrap(target, self.as_interceptor())
    }
}

/// A target decorated with one interceptor.
pub struct Plugin {
    target: Arc<dyn Target>,
    interceptor: Arc<dyn Interceptor>,
    methods: Vec<Cow<'static, str>>,
}

impl Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("interceptor", &self.interceptor)
            .field("methods", &self.methods)
            .field("target", &self.target)
            .finish()
    }
}

impl Plugin {
    #[must_use]
    pub fn wrap(target: Arc<dyn Target>, interceptor: Arc<dyn Interceptor>) -> Arc<dyn Target> {
        let kind = target.kind();
        let methods: Vec<_> = interceptor
            .signatures()
            .into_iter()
            .filter(|signature| signature.target == kind)
            .map(|signature| signature.method)
            .collect();
        if methods.is_empty() {
            return target;
        }
        debug!(target = %kind, interceptor = ?interceptor, "Wrapping target");
        Arc::new(Self { target, interceptor, methods })
    }
}

impl Target for Plugin {
    fn kind(&self) -> TargetKind {
        self.target.kind()
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
        if self.methods.iter().any(|m| m == method) {
            self.interceptor.intercept(Invocation { target: self.target.as_ref(), method, args })
        } else {
            self.target.invoke(method, args)
        }
    }
}

/// Interceptors in declaration order.
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn add(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    #[must_use]
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Applies every interceptor to `target`, first declared innermost.
    #[must_use]
    pub fn plugin_all(&self, target: Arc<dyn Target>) -> Arc<dyn Target> {
        self.interceptors
            .iter()
            .fold(target, |target, interceptor| Arc::clone(interceptor).plugin(target))
    }
}
