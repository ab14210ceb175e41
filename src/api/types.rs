//! Shared types for the API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::state::AppState;

/// Session lifetime: 24 hours of validity from sign-in.
const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `AppState` plus the in-memory session store.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Auth context — injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware after successful token validation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub profile_id: Uuid,
}

// ═══════════════════════════════════════════════════════════
// Session store — bearer tokens, hashed server-side
// ═══════════════════════════════════════════════════════════

struct SessionEntry {
    profile_id: Uuid,
    expires: Instant,
}

/// In-memory bearer-token sessions with TTL. Only the SHA-256 hash of a
/// token is ever stored.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Register a session. Returns nothing; the caller hands the raw
    /// token to the client exactly once.
    pub fn insert(&mut self, token_hash: [u8; 32], profile_id: Uuid) {
        // Opportunistic cleanup when the map grows
        if self.sessions.len() > 1000 {
            let now = Instant::now();
            self.sessions.retain(|_, entry| entry.expires > now);
        }
        self.sessions.insert(
            token_hash,
            SessionEntry {
                profile_id,
                expires: Instant::now() + Duration::from_secs(SESSION_TTL_SECS),
            },
        );
    }

    /// Validate a token hash. Expired sessions validate as absent.
    pub fn validate(&self, token_hash: &[u8; 32]) -> Option<Uuid> {
        let entry = self.sessions.get(token_hash)?;
        if entry.expires <= Instant::now() {
            return None;
        }
        Some(entry.profile_id)
    }

    /// Drop a session (sign-out).
    pub fn remove(&mut self, token_hash: &[u8; 32]) {
        self.sessions.remove(token_hash);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
