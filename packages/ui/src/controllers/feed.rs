use std::collections::HashSet;

use store::{Follow, Gateway, GatewayResult, Order, Post, Profile, Query};

use super::ViewStatus;

/// A post in the feed with its author.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedEntry {
    pub post: Post,
    pub author: Profile,
}

/// Latest activity of the members the viewer follows (`/`).
#[derive(Clone, Debug)]
pub struct FeedController<G> {
    gateway: G,
    /// At most one entry per followed member, newest first.
    pub entries: Vec<FeedEntry>,
    pub status: ViewStatus,
}

/// Keep only the most recent post of each author, newest first.
pub fn latest_per_author(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut seen = HashSet::new();
    posts.retain(|post| seen.insert(post.user_id.clone()));
    posts
}

impl<G: Gateway> FeedController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            entries: Vec::new(),
            status: ViewStatus::loading(),
        }
    }

    pub async fn load(&mut self) {
        self.status.loading = true;
        match self.fetch().await {
            Ok(entries) => {
                self.entries = entries;
                self.status.loading = false;
            }
            Err(err) => self
                .status
                .fail_load("Erreur lors du chargement du flux d'activité.", &err),
        }
    }

    async fn fetch(&self) -> GatewayResult<Vec<FeedEntry>> {
        let viewer = self.gateway.require_user().await?;

        let edges = Query::new()
            .columns(&["follower_id", "followed_id"])
            .eq("follower_id", viewer.id);
        let mut followed: Vec<String> = Vec::new();
        for edge in self.gateway.select::<Follow>(&edges).await? {
            if !followed.contains(&edge.followed_id) {
                followed.push(edge.followed_id);
            }
        }
        if followed.is_empty() {
            return Ok(Vec::new());
        }

        let posts = Query::new()
            .in_("user_id", followed)
            .order("created_at", Order::Desc);
        let latest = latest_per_author(self.gateway.select::<Post>(&posts).await?);
        if latest.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<&str> = latest.iter().map(|p| p.user_id.as_str()).collect();
        let authors = self
            .gateway
            .select::<Profile>(&Query::new().in_("id", author_ids))
            .await?;

        Ok(latest
            .into_iter()
            .map(|post| {
                let author = authors
                    .iter()
                    .find(|p| p.id == post.user_id)
                    .cloned()
                    .unwrap_or_else(|| Profile::empty(post.user_id.as_str()));
                FeedEntry { post, author }
            })
            .collect())
    }
}
