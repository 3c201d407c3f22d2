use store::{Gateway, GatewayResult, Profile, Session};

use super::{describe, keep_edit, Screen, ViewStatus};

/// Email and password sign-in (`/login`).
#[derive(Clone, Debug)]
pub struct LoginForm<G> {
    gateway: G,
    pub email: String,
    pub password: String,
    pub status: ViewStatus,
}

impl<G: Clone + 'static> Screen for LoginForm<G> {
    fn status(&self) -> &ViewStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ViewStatus {
        &mut self.status
    }

    fn keep_edits(&mut self, started: &Self, current: &Self) {
        keep_edit(&mut self.email, &started.email, &current.email);
        keep_edit(&mut self.password, &started.password, &current.password);
    }
}

impl<G: Gateway> LoginForm<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            email: String::new(),
            password: String::new(),
            status: ViewStatus::default(),
        }
    }

    /// Sign in. The session is returned so the caller can persist it and navigate.
    pub async fn submit(&mut self) -> Option<Session> {
        if !self.status.begin("login") {
            return None;
        }
        match self
            .gateway
            .sign_in(self.email.trim(), &self.password)
            .await
        {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "signed in");
                self.password.clear();
                self.status.end();
                Some(session)
            }
            Err(err) => {
                self.status.fail(describe(&err));
                None
            }
        }
    }
}

/// Account creation (`/register`).
#[derive(Clone, Debug)]
pub struct RegisterForm<G> {
    gateway: G,
    pub username: String,
    pub email: String,
    pub password: String,
    pub status: ViewStatus,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl<G: Clone + 'static> Screen for RegisterForm<G> {
    fn status(&self) -> &ViewStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ViewStatus {
        &mut self.status
    }

    fn keep_edits(&mut self, started: &Self, current: &Self) {
        keep_edit(&mut self.username, &started.username, &current.username);
        keep_edit(&mut self.email, &started.email, &current.email);
        keep_edit(&mut self.password, &started.password, &current.password);
    }
}

impl<G: Gateway> RegisterForm<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            status: ViewStatus::default(),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("Le nom d'utilisateur est requis.");
        }
        if !self.email.contains('@') {
            return Err("Adresse email invalide.");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Le mot de passe doit contenir au moins 6 caractères.");
        }
        Ok(())
    }

    /// Create the identity, then its profile. Returns `true` once both exist.
    ///
    /// The two writes are independent: when the profile insert fails the
    /// identity stays without a profile and the error is shown.
    pub async fn submit(&mut self) -> bool {
        if let Err(message) = self.validate() {
            self.status.clear_messages();
            self.status.error = Some(message.to_string());
            return false;
        }
        if !self.status.begin("register") {
            return false;
        }

        let identity = match self
            .gateway
            .sign_up(self.email.trim(), &self.password)
            .await
        {
            Ok(identity) => identity,
            Err(err) => {
                self.status.fail(describe(&err));
                return false;
            }
        };

        match self.insert_profile(&identity.id).await {
            Ok(()) => {
                tracing::info!(user_id = %identity.id, "account created");
                self.password.clear();
                self.status
                    .succeed("Compte créé, vous pouvez vous connecter.");
                true
            }
            Err(err) => {
                tracing::error!(user_id = %identity.id, "profile insert failed after sign-up: {err}");
                self.status.fail(format!(
                    "Compte créé, mais le profil n'a pas pu être enregistré : {}",
                    describe(&err)
                ));
                false
            }
        }
    }

    async fn insert_profile(&self, user_id: &str) -> GatewayResult<()> {
        let profile = Profile {
            username: Some(self.username.trim().to_string()),
            ..Profile::empty(user_id)
        };
        self.gateway
            .insert::<Profile, _>(std::slice::from_ref(&profile))
            .await?;
        Ok(())
    }
}
