use store::{Gateway, Order, Post, Profile, Query, ReadStatus};

use super::ViewStatus;

/// Read-only view of another member (`/membre/:id`).
#[derive(Clone, Debug)]
pub struct MemberController<G> {
    gateway: G,
    pub member_id: String,
    pub profile: Option<Profile>,
    /// Newest first.
    pub posts: Vec<Post>,
    pub status: ViewStatus,
}

impl<G: Gateway> MemberController<G> {
    pub fn new(gateway: G, member_id: impl Into<String>) -> Self {
        Self {
            gateway,
            member_id: member_id.into(),
            profile: None,
            posts: Vec::new(),
            status: ViewStatus::loading(),
        }
    }

    pub async fn load(&mut self) {
        self.status.loading = true;

        let by_id = Query::new().eq("id", self.member_id.as_str());
        match self.gateway.single::<Profile>(&by_id).await {
            Ok(profile) => self.profile = Some(profile),
            Err(err) => return self.status.fail_load("Utilisateur introuvable.", &err),
        }

        let posts = Query::new()
            .eq("user_id", self.member_id.as_str())
            .order("created_at", Order::Desc);
        match self.gateway.select::<Post>(&posts).await {
            Ok(posts) => {
                self.posts = posts;
                self.status.loading = false;
            }
            Err(err) => self
                .status
                .fail_load("Erreur lors du chargement de ses livres.", &err),
        }
    }

    pub fn shelf(&self, status: ReadStatus) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.status == status).collect()
    }

    pub fn count(&self, status: ReadStatus) -> usize {
        self.posts.iter().filter(|p| p.status == status).count()
    }
}
