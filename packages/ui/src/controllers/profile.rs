use store::{Gateway, GatewayResult, Identity, Post, Profile, Query, UploadOptions};

use super::{describe, keep_edit, Screen, ViewStatus};

/// The viewer's editable profile (`/profil`).
#[derive(Clone, Debug)]
pub struct ProfileController<G> {
    gateway: G,
    avatars_bucket: String,
    pub user: Option<Identity>,
    /// Last saved state, with a freshly uploaded avatar URL patched in.
    pub profile: Profile,
    pub username: String,
    pub bio: String,
    pub post_count: usize,
    pub status: ViewStatus,
}

/// File extension used for an uploaded avatar, `jpg` when the name has none.
pub fn avatar_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<G: Clone + 'static> Screen for ProfileController<G> {
    fn status(&self) -> &ViewStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ViewStatus {
        &mut self.status
    }

    fn keep_edits(&mut self, started: &Self, current: &Self) {
        keep_edit(&mut self.username, &started.username, &current.username);
        keep_edit(&mut self.bio, &started.bio, &current.bio);
    }
}

impl<G: Gateway> ProfileController<G> {
    pub fn new(gateway: G, avatars_bucket: impl Into<String>) -> Self {
        Self {
            gateway,
            avatars_bucket: avatars_bucket.into(),
            user: None,
            profile: Profile::default(),
            username: String::new(),
            bio: String::new(),
            post_count: 0,
            status: ViewStatus::loading(),
        }
    }

    /// Email of the signed-in account, when the platform has one.
    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|user| user.email.as_deref())
    }

    pub async fn load(&mut self) {
        self.status.loading = true;
        let user = match self.gateway.require_user().await {
            Ok(user) => user,
            Err(err) => {
                return self
                    .status
                    .fail_load("Erreur lors de la récupération de l'utilisateur.", &err)
            }
        };

        match self.fetch(&user).await {
            Ok((profile, post_count)) => {
                self.username = profile.username.clone().unwrap_or_default();
                self.bio = profile.bio.clone().unwrap_or_default();
                self.profile = profile;
                self.post_count = post_count;
                self.user = Some(user);
                self.status.loading = false;
            }
            Err(err) => self
                .status
                .fail_load("Erreur lors de la récupération du profil.", &err),
        }
    }

    async fn fetch(&self, user: &Identity) -> GatewayResult<(Profile, usize)> {
        // a member whose profile insert failed at sign-up has no row yet
        let profile = self
            .gateway
            .maybe_single::<Profile>(&Query::new().eq("id", user.id.as_str()))
            .await?
            .unwrap_or_else(|| Profile::empty(user.id.as_str()));
        let post_count = self
            .gateway
            .count::<Post>(&Query::new().eq("user_id", user.id.as_str()))
            .await?;
        Ok((profile, post_count))
    }

    /// Upload a new avatar. Only the local URL changes until [`save`](Self::save).
    pub async fn upload_avatar(&mut self, file_name: &str, bytes: Vec<u8>) {
        if !self.status.begin("avatar") {
            return;
        }
        match self.store_avatar(file_name, bytes).await {
            Ok(url) => {
                self.profile.avatar_url = Some(url);
                self.status
                    .succeed("Photo chargée, enregistrez pour la conserver.");
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    async fn store_avatar(&self, file_name: &str, bytes: Vec<u8>) -> GatewayResult<String> {
        let user = self.gateway.require_user().await?;
        let extension = avatar_extension(file_name);
        let path = format!("{}/{}.{extension}", user.id, uuid::Uuid::new_v4());
        let options = UploadOptions::overwrite().with_content_type(content_type(&extension));
        self.gateway
            .upload(&self.avatars_bucket, &path, bytes, options)
            .await
    }

    /// Write username, bio and avatar, creating the row if it is missing.
    pub async fn save(&mut self) {
        if !self.status.begin("save") {
            return;
        }
        match self.upsert_profile().await {
            Ok(profile) => {
                self.username = profile.username.clone().unwrap_or_default();
                self.bio = profile.bio.clone().unwrap_or_default();
                self.profile = profile;
                tracing::info!("profile saved");
                self.status.succeed("Profil mis à jour avec succès !");
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    async fn upsert_profile(&self) -> GatewayResult<Profile> {
        let user = self.gateway.require_user().await?;
        let profile = Profile {
            id: user.id,
            username: non_empty(&self.username),
            bio: non_empty(&self.bio),
            avatar_url: self.profile.avatar_url.clone(),
        };
        self.gateway.upsert::<Profile, _>(&profile).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures::{candidate, member, StaticSearch};
    use crate::controllers::{settled, LibraryController};
    use store::{MemoryGateway, ReadStatus, Table};

    #[test]
    fn test_avatar_extension() {
        assert_eq!(avatar_extension("me.PNG"), "png");
        assert_eq!(avatar_extension("archive.tar.gz"), "gz");
        assert_eq!(avatar_extension("photo"), "jpg");
        assert_eq!(avatar_extension("weird."), "jpg");
    }

    #[tokio::test]
    async fn test_load_counts_posts() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut library =
            LibraryController::new(gw.clone(), StaticSearch::default(), Default::default());
        library.add(&candidate("v1", "Dune"), ReadStatus::Read).await;
        library.add(&candidate("v2", "Ubik"), ReadStatus::WantToRead).await;

        let mut page = ProfileController::new(gw.clone(), "avatars");
        page.load().await;
        assert_eq!(page.username, "ana");
        assert_eq!(page.email(), Some("ana@example.com"));
        assert_eq!(page.post_count, 2);
    }

    #[tokio::test]
    async fn test_missing_profile_is_repaired_by_save() {
        let gw = MemoryGateway::new();
        let identity = gw.sign_up("ghost@example.com", "secret123").await.unwrap();

        let mut page = ProfileController::new(gw.clone(), "avatars");
        page.load().await;
        assert_eq!(page.status.error, None);
        assert_eq!(page.profile, Profile::empty(identity.id.as_str()));

        page.username = "  ghost ".to_string();
        page.bio = "   ".to_string();
        page.save().await;

        let rows = gw.rows(Table::Profiles);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "ghost");
        assert!(rows[0]["bio"].is_null());
        assert_eq!(page.username, "ghost");
    }

    #[tokio::test]
    async fn test_avatar_upload_patches_local_url_only() {
        let gw = MemoryGateway::new();
        let ana = member(&gw, "ana").await;
        let mut page = ProfileController::new(gw.clone(), "avatars");
        page.load().await;

        page.upload_avatar("portrait.png", vec![1, 2, 3]).await;
        let url = page.profile.avatar_url.clone().unwrap();
        assert!(url.starts_with(&format!("memory://storage/avatars/{ana}/")));
        assert!(url.ends_with(".png"));
        assert!(gw.rows(Table::Profiles)[0]["avatar_url"].is_null());

        page.save().await;
        assert_eq!(gw.rows(Table::Profiles)[0]["avatar_url"], url.as_str());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_avatar() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut page = ProfileController::new(gw.clone(), "avatars");
        page.load().await;
        page.profile.avatar_url = Some("https://cdn.example/old.jpg".to_string());

        gw.sign_out().await.unwrap();
        page.upload_avatar("new.jpg", vec![9]).await;
        assert_eq!(
            page.profile.avatar_url.as_deref(),
            Some("https://cdn.example/old.jpg")
        );
        assert!(page.status.error.is_some());
    }

    #[tokio::test]
    async fn test_typing_during_upload_is_kept() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut page = ProfileController::new(gw.clone(), "avatars");
        page.load().await;

        let started = page.clone();
        let mut current = page.clone();
        current.username = "anastasia".to_string();
        current.bio = "Lectrice du dimanche".to_string();

        page.upload_avatar("portrait.png", vec![1]).await;
        let merged = settled(&started, &current, page);
        assert_eq!(merged.username, "anastasia");
        assert_eq!(merged.bio, "Lectrice du dimanche");
        assert!(merged.profile.avatar_url.is_some());
        assert!(merged.status.success.is_some());
    }

    #[tokio::test]
    async fn test_saved_values_replace_the_form() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut page = ProfileController::new(gw.clone(), "avatars");
        page.load().await;
        page.username = "  ana b ".to_string();

        let started = page.clone();
        let current = page.clone();
        page.save().await;
        let merged = settled(&started, &current, page);
        assert_eq!(merged.username, "ana b");
    }
}
