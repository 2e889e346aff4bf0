//! Kernel authentication via bearer tokens.
//!
//! Provides token generation, persistence, and middleware for validating
//! `Authorization: Bearer <token>` headers on privileged kernel routes. The
//! Brain reads the same token file to authenticate its bridge.

use std::path::Path;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;

use crate::error::ApiError;
use crate::state::KernelState;

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Read a token file. Missing, unreadable, or blank files yield `None`.
pub fn read_token(token_path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(token_path).ok()?;
    let token = contents.trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Load token from file, or generate and save a new one.
pub fn load_or_generate_token(token_path: &Path) -> String {
    if let Some(token) = read_token(token_path) {
        tracing::info!("Kernel token loaded from {}", token_path.display());
        return token;
    }

    let token = generate_token();

    if let Some(parent) = token_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(token_path, &token) {
        tracing::warn!(error = %e, "Failed to save kernel token to {}", token_path.display());
    } else {
        // Restrict token file to owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(token_path, std::fs::Permissions::from_mode(0o600));
        }
        tracing::info!("Kernel token saved to {}", token_path.display());
    }

    token
}

/// Middleware that validates Bearer token authentication.
///
/// Passes everything through when the kernel runs without a token.
pub async fn require_auth(State(state): State<KernelState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_token.as_deref() else {
        return next.run(req).await;
    };

    let authorized = match req.headers().get(axum::http::header::AUTHORIZATION) {
        None => {
            return ApiError::Unauthorized("Missing Authorization header".to_string())
                .into_response();
        }
        Some(value) => match value.to_str() {
            Ok(value) => value.strip_prefix("Bearer ") == Some(expected),
            Err(_) => {
                return ApiError::Unauthorized("Invalid Authorization header encoding".to_string())
                    .into_response();
            }
        },
    };

    if authorized {
        next.run(req).await
    } else {
        tracing::warn!(target: "audit", path = %req.uri().path(), "Rejected kernel request with bad token");
        ApiError::Unauthorized("Invalid bearer token".to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_32_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_load_or_generate_persists_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kernel.token");

        let first = load_or_generate_token(&path);
        assert_eq!(read_token(&path).as_deref(), Some(first.as_str()));
        assert_eq!(load_or_generate_token(&path), first);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_read_token_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernel.token");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_token(&path), None);
        assert_eq!(read_token(&dir.path().join("missing")), None);
    }
}
