//! Back-office sign-in: verify an API key behind a per-client attempt budget.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::api_keys::{ApiAuthError, ApiKeyService, ApiPrincipal};
use crate::rate_limit::{RateLimitBudget, RateLimiter};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("too many login attempts")]
    RateLimited { retry_after_secs: u64 },
    #[error(transparent)]
    Auth(#[from] ApiAuthError),
}

#[derive(Clone)]
pub struct LoginService {
    api_keys: ApiKeyService,
    limiter: Arc<RateLimiter>,
    budget: RateLimitBudget,
}

impl LoginService {
    pub fn new(api_keys: ApiKeyService, limiter: Arc<RateLimiter>, budget: RateLimitBudget) -> Self {
        Self {
            api_keys,
            limiter,
            budget,
        }
    }

    /// Every attempt counts against `login:<client_ip>`, successful or not.
    pub async fn login(&self, client_ip: &str, token: &str) -> Result<ApiPrincipal, LoginError> {
        let decision = self.limiter.check(&format!("login:{client_ip}"), self.budget);
        if !decision.success {
            warn!(
                target = "namngam::application::login",
                client_ip, "login attempts exhausted"
            );
            return Err(LoginError::RateLimited {
                retry_after_secs: self.budget.retry_after_secs(),
            });
        }

        let principal = self.api_keys.authenticate(token).await?;
        info!(
            target = "namngam::application::login",
            client_ip,
            key_prefix = %principal.prefix,
            remaining = decision.remaining,
            "admin login"
        );
        Ok(principal)
    }
}
