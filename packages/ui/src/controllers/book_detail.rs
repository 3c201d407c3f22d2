use serde_json::{json, Value};
use store::{
    Book, Gateway, GatewayError, GatewayResult, NewPost, Post, Profile, Query, ReadStatus, Record,
};

use super::{describe, ViewStatus};
use crate::star_rating::normalize_rating;

/// One book as seen by the viewer (`/livres/:book_id`), either through their own
/// post or, with `?uid=`, through another member's.
#[derive(Clone, Debug)]
pub struct BookDetailController<G> {
    gateway: G,
    pub book_id: String,
    /// Member whose post is shown, `None` for the viewer's own.
    pub member_id: Option<String>,
    pub viewer_id: Option<String>,
    pub book: Option<Book>,
    pub post: Option<Post>,
    /// Profile of `member_id` when viewing someone else's post.
    pub member: Option<Profile>,
    pub status: ViewStatus,
}

impl<G: Gateway> BookDetailController<G> {
    /// `uid` is the `?uid=` query value; empty means the viewer's own post.
    pub fn new(gateway: G, book_id: impl Into<String>, uid: Option<String>) -> Self {
        Self {
            gateway,
            book_id: book_id.into(),
            member_id: uid.filter(|id| !id.trim().is_empty()),
            viewer_id: None,
            book: None,
            post: None,
            member: None,
            status: ViewStatus::loading(),
        }
    }

    /// Whether the shown post belongs to the viewer.
    pub fn is_own(&self) -> bool {
        match (&self.member_id, &self.viewer_id) {
            (None, _) => true,
            (Some(member), Some(viewer)) => member == viewer,
            (Some(_), None) => false,
        }
    }

    fn owner_id(&self) -> Option<&str> {
        if self.is_own() {
            self.viewer_id.as_deref()
        } else {
            self.member_id.as_deref()
        }
    }

    pub async fn load(&mut self) {
        self.status.loading = true;

        let viewer = match self.gateway.require_user().await {
            Ok(user) => user,
            Err(err) => return self.status.fail_load(&describe(&err), &err),
        };
        self.viewer_id = Some(viewer.id);

        let by_id = Query::new().eq("id", self.book_id.as_str());
        match self.gateway.single::<Book>(&by_id).await {
            Ok(book) => self.book = Some(book),
            Err(err) => return self.status.fail_load("Livre introuvable.", &err),
        }

        if let Err(err) = self.load_post_and_member().await {
            return self
                .status
                .fail_load("Erreur lors du chargement de la critique.", &err);
        }
        self.status.loading = false;
    }

    async fn load_post_and_member(&mut self) -> GatewayResult<()> {
        self.post = self.fetch_post().await?;
        if !self.is_own() {
            if let Some(member_id) = self.member_id.clone() {
                let query = Query::new().eq("id", member_id);
                self.member = self.gateway.maybe_single::<Profile>(&query).await?;
            }
        }
        Ok(())
    }

    async fn fetch_post(&self) -> GatewayResult<Option<Post>> {
        let Some(owner) = self.owner_id() else {
            return Ok(None);
        };
        let query = Query::new()
            .eq("book_id", self.book_id.as_str())
            .eq("user_id", owner);
        self.gateway.maybe_single::<Post>(&query).await
    }

    /// Name shown above a post that is not the viewer's.
    pub fn member_name(&self) -> &str {
        self.member
            .as_ref()
            .map_or("Utilisateur", Profile::display_name)
    }

    /// Rate the book. Ignored on another member's post.
    pub async fn set_rating(&mut self, value: f32) {
        if !self.is_own() {
            return;
        }
        let rating = normalize_rating(value);
        self.write(
            "rating",
            json!({ "rating": rating }),
            |entry| entry.rating = Some(rating),
            "Note enregistrée.",
        )
        .await;
    }

    /// Save the review text; blank text clears it. Ignored on another member's post.
    pub async fn set_review(&mut self, text: &str) {
        if !self.is_own() {
            return;
        }
        let comment = Some(text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let stored = comment.clone();
        self.write(
            "review",
            json!({ "comment": comment }),
            move |entry| entry.comment = stored,
            "Critique enregistrée.",
        )
        .await;
    }

    async fn write(
        &mut self,
        key: &str,
        patch: Value,
        fill: impl FnOnce(&mut NewPost),
        done: &str,
    ) {
        if !self.status.begin(key) {
            return;
        }
        match self.save_post(patch, fill).await {
            Ok(post) => {
                self.post = post;
                self.status.succeed(done);
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    /// Update the viewer's post or create it, then read it back.
    async fn save_post(
        &self,
        patch: Value,
        fill: impl FnOnce(&mut NewPost),
    ) -> GatewayResult<Option<Post>> {
        let viewer = self.gateway.require_user().await?;

        match &self.post {
            Some(post) => {
                let query = Query::new()
                    .eq("id", post.id.as_str())
                    .eq("user_id", viewer.id.as_str());
                self.gateway.update::<Post>(&query, &patch).await?;
            }
            None => {
                let book = self
                    .book
                    .as_ref()
                    .ok_or(GatewayError::NotFound { table: Book::TABLE })?;
                let mut entry = NewPost::for_book(viewer.id.as_str(), book, ReadStatus::Read);
                fill(&mut entry);
                self.gateway.insert::<Post, _>(&[entry]).await?;
            }
        }

        let query = Query::new()
            .eq("book_id", self.book_id.as_str())
            .eq("user_id", viewer.id);
        self.gateway.maybe_single::<Post>(&query).await
    }
}
