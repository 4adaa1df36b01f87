//! Profile of the logged-in user, kept in step with the token.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::backend::StakingBackend;
use crate::error::{RstakeError, Result};
use crate::types::Profile;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub profile: Option<Profile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct ProfileSession<B> {
    backend: Arc<B>,
    tokens: TokenStore,
    state: Arc<watch::Sender<ProfileState>>,
}

impl<B> Clone for ProfileSession<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            tokens: self.tokens.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: StakingBackend> ProfileSession<B> {
    pub fn new(backend: Arc<B>, tokens: TokenStore) -> Self {
        let (state, _) = watch::channel(ProfileState::default());
        Self {
            backend,
            tokens,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    /// Load the profile, or drop it when there is no token.
    pub async fn reload(&self) -> Result<Option<Profile>> {
        if self.tokens.get().is_none() {
            self.state.send_modify(|s| {
                s.profile = None;
                s.is_loading = false;
            });
            return Ok(None);
        }

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let loaded = match self.backend.profile().await {
            Ok(resp) if resp.success && resp.data.is_some() => Ok(resp.data),
            Ok(resp) => Err(RstakeError::Api {
                status: resp.status,
                message: if resp.message.is_empty() {
                    "Failed to load profile".into()
                } else {
                    resp.message
                },
            }),
            Err(e) => Err(e),
        };

        match loaded {
            Ok(profile) => {
                if let Some(p) = &profile {
                    debug!(puid = %p.puid, lang = %p.lang, "profile loaded");
                }
                self.state.send_modify(|s| {
                    s.profile = profile.clone();
                    s.is_loading = false;
                });
                Ok(profile)
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.is_loading = false;
                });
                Err(e)
            }
        }
    }

    /// Load now and again on every token change, until `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let session = self.clone();
        let mut token_rx = self.tokens.subscribe();

        tokio::spawn(async move {
            session.reload_quietly().await;
            loop {
                tokio::select! {
                    changed = token_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        session.reload_quietly().await;
                    }
                    _ = cancel.cancelled() => {
                        debug!("profile listener stopped");
                        return;
                    }
                }
            }
        })
    }

    async fn reload_quietly(&self) {
        if let Err(e) = self.reload().await {
            warn!(error = %e, "profile reload failed");
        }
    }
}
