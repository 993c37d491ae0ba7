// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Host-supplied I/O seams.
//!
//! The auth stack never opens sockets or reads the wall clock directly:
//! the embedding server injects an [`HttpClient`] and a [`Clock`] at
//! construction, and tests substitute fakes.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;

/// HTTP verbs the auth stack uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound HTTP request.
#[derive(Debug)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    pub headers: &'a [(&'a str, String)],
    pub body: Option<&'a [u8]>,
}

/// Status plus raw body; header inspection is never needed here.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure. Cancellation of an in-flight request
/// surfaces through this same kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("network error: {0}")]
pub struct HttpError(pub String);

/// Host HTTP transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch(&self, request: HttpRequest<'_>) -> Result<HttpResponse, HttpError>;
}

/// Wall clock in Unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Production clock backed by the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64)
    }
}
