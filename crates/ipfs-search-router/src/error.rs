use thiserror::Error;

/// Errors raised while building, installing or navigating a route table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Two routes in the same table share a name
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    /// A route pattern breaks a structural rule
    #[error("invalid route pattern `{path}`: {reason}")]
    InvalidPattern { path: String, reason: String },

    /// Navigation to a name that is not in the table
    #[error("no route named `{0}`")]
    UnknownRoute(String),

    /// URL generation without a value for a required parameter
    #[error("route `{route}` requires parameter `{param}`")]
    MissingParam { route: String, param: String },

    /// A route names a component the host has no view for
    #[error("route `{route}` renders component `{component}`, which has no registered view")]
    UnboundComponent { route: String, component: String },
}
