use tracing::info;

use crate::credential::{Credential, CredentialStore, TOKEN_KEY};

/// Sends the user back to wherever they sign in.
pub trait Navigator {
    fn redirect_to_entry(&self);
}

/// Guards entry to the conversation screen.
pub struct SessionGate<'a, S: ?Sized, N: ?Sized> {
    store: &'a S,
    navigator: &'a N,
}

impl<'a, S, N> SessionGate<'a, S, N>
where
    S: CredentialStore + ?Sized,
    N: Navigator + ?Sized,
{
    pub fn new(store: &'a S, navigator: &'a N) -> Self {
        Self { store, navigator }
    }

    /// Returns the credential to mount the conversation with, or redirects.
    ///
    /// A missing or empty token means "not signed in": the navigator is asked
    /// to redirect and nothing else happens.
    pub fn check_access(&self) -> Option<Credential> {
        match self.store.get(TOKEN_KEY) {
            Some(token) if !token.is_empty() => Some(Credential::new(token)),
            _ => {
                info!("No stored credential, redirecting to entry");
                self.navigator.redirect_to_entry();
                None
            }
        }
    }
}
