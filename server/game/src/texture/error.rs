use std::{error::Error, fmt::Display};

use masquerade_shared::reqwest::{self, StatusCode};

/// Why a skin reference could not be turned into a texture. Cloned to every waiter of a shared lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Timeout,                      // the resolver did not answer in time
    Request(String),              // error making the request
    NotFound,                     // no player with that name or uuid
    Upstream(StatusCode, String), // non 2xx status code
    Malformed(String),            // response did not contain a usable texture
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("texture lookup timed out"),
            Self::Request(err) => write!(f, "error making web request: {err}"),
            Self::NotFound => f.write_str("no such player"),
            Self::Upstream(status, response) => write!(f, "texture service error {status}: {response}"),
            Self::Malformed(msg) => write!(f, "malformed texture service response: {msg}"),
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(value.to_string())
        }
    }
}

impl Error for ResolveError {}
