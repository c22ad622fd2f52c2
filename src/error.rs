//! Some common error types.

use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display, Formatter},
};

use http::{Method, StatusCode};

macro_rules! define_error {
    ($($(#[$docs:meta])* ($name:ident, $status:ident);)*) => {
        $(
        $(#[$docs])*
        #[inline]
        pub fn $name(err: impl StdError + Send + Sync + 'static) -> Self {
            Self::new(StatusCode::$status).with_reason(err)
        }
        )*
    };
}

/// General error raised by a handler chain.
#[derive(Debug)]
pub struct Error {
    status: StatusCode,
    reason: anyhow::Error,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.reason())
    }
}

#[derive(Debug)]
struct StatusError(StatusCode);

impl Display for StatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for StatusError {}

impl Error {
    /// Create a new error with status code.
    #[inline]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: anyhow::Error::from(StatusError(status)),
        }
    }

    /// Sets the reason for this error.
    #[inline]
    pub fn with_reason(self, reason: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            reason: anyhow::Error::from(reason),
            ..self
        }
    }

    /// Returns the status code of this error.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason of this error.
    #[inline]
    pub fn reason(&self) -> &impl Display {
        &self.reason
    }

    /// Returns `true` if the reason is of type `T`.
    pub fn is<T: Display + Debug + Send + Sync + 'static>(&self) -> bool {
        self.reason.is::<T>()
    }

    define_error!(
        /// Wraps any error into [`Error`] and the status code is [`StatusCode::BAD_REQUEST`].
        (bad_request, BAD_REQUEST);
        /// Wraps any error into [`Error`] and the status code is [`StatusCode::NOT_FOUND`].
        (not_found, NOT_FOUND);
        /// Wraps any error into [`Error`] and the status code is [`StatusCode::METHOD_NOT_ALLOWED`].
        (method_not_allowed, METHOD_NOT_ALLOWED);
        /// Wraps any error into [`Error`] and the status code is [`StatusCode::INTERNAL_SERVER_ERROR`].
        (internal_server_error, INTERNAL_SERVER_ERROR);
    );
}

/// A specialized Result type for Stanza.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

macro_rules! define_simple_errors {
    ($($(#[$docs:meta])* ($name:ident, $status:ident, $err_msg:literal);)*) => {
        $(
        $(#[$docs])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq)]
        pub struct $name;

        impl From<$name> for Error {
            fn from(_: $name) -> Error {
                Error::new(StatusCode::$status).with_reason(SimpleError($err_msg))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", $err_msg)
            }
        }

        impl StdError for $name {}
        )*
    };
}

#[derive(Debug)]
struct SimpleError(&'static str);

impl Display for SimpleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for SimpleError {}

define_simple_errors!(
    /// Raised by the stock handler returned when no route matches the request path.
    (NotFoundError, NOT_FOUND, "not found");
    /// Raised by the stock handler returned when a route matches the request path
    /// but not the request method.
    (MethodNotAllowedError, METHOD_NOT_ALLOWED, "method not allowed");
);

/// A possible error value when registering or removing a route.
///
/// Every variant carries the method and path of the offending route so mass
/// registration failures stay diagnosable.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The `(method, path)` pair is already registered and
    /// [`allow_overwriting_route`](crate::RouterConfig::allow_overwriting_route)
    /// is disabled.
    #[error("{method} {path}: adding duplicate route (same method+path) is not allowed")]
    Duplicate {
        /// Method of the rejected route.
        method: Method,
        /// Path of the rejected route.
        path: String,
    },

    /// The route was registered without a handler.
    #[error("{method} {path}: adding route without handler")]
    MissingHandler {
        /// Method of the rejected route.
        method: Method,
        /// Path of the rejected route.
        path: String,
    },

    /// No registered route matches the `(method, path)` given to
    /// [`Router::remove`](crate::Router::remove).
    #[error("{method} {path}: no matching route to remove")]
    NotRegistered {
        /// Method of the missing route.
        method: Method,
        /// Path of the missing route.
        path: String,
    },
}

impl RouteError {
    /// The method of the route that could not be registered or removed.
    pub fn method(&self) -> &Method {
        match self {
            RouteError::Duplicate { method, .. }
            | RouteError::MissingHandler { method, .. }
            | RouteError::NotRegistered { method, .. } => method,
        }
    }

    /// The path of the route that could not be registered or removed.
    pub fn path(&self) -> &str {
        match self {
            RouteError::Duplicate { path, .. }
            | RouteError::MissingHandler { path, .. }
            | RouteError::NotRegistered { path, .. } => path,
        }
    }
}
