use std::collections::HashSet;

use store::{Follow, Gateway, GatewayResult, Order, Profile, Query};

use super::{describe, ViewStatus};

/// Member directory with follow toggles (`/amis`).
#[derive(Clone, Debug)]
pub struct FriendsController<G> {
    gateway: G,
    /// Every member except the viewer.
    pub members: Vec<Profile>,
    /// Ids the viewer follows.
    pub following: HashSet<String>,
    pub status: ViewStatus,
}

impl<G: Gateway> FriendsController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            members: Vec::new(),
            following: HashSet::new(),
            status: ViewStatus::loading(),
        }
    }

    pub async fn load(&mut self) {
        self.status.loading = true;
        let viewer = match self.gateway.require_user().await {
            Ok(user) => user,
            Err(err) => {
                return self
                    .status
                    .fail_load("Erreur lors de la récupération de l'utilisateur.", &err)
            }
        };

        let others = Query::new()
            .neq("id", viewer.id.as_str())
            .order("username", Order::Asc);
        match self.gateway.select::<Profile>(&others).await {
            Ok(members) => self.members = members,
            Err(err) => {
                return self
                    .status
                    .fail_load("Erreur lors de la récupération des profils.", &err)
            }
        }

        let edges = Query::new().eq("follower_id", viewer.id);
        match self.gateway.select::<Follow>(&edges).await {
            Ok(follows) => {
                self.following = follows.into_iter().map(|f| f.followed_id).collect();
                self.status.loading = false;
            }
            Err(err) => self
                .status
                .fail_load("Erreur lors de la récupération des abonnements.", &err),
        }
    }

    pub fn is_following(&self, member_id: &str) -> bool {
        self.following.contains(member_id)
    }

    pub async fn follow(&mut self, member_id: &str) {
        if !self.status.begin(format!("follow:{member_id}")) {
            return;
        }
        match self.insert_edge(member_id).await {
            Ok(()) => {
                self.following.insert(member_id.to_string());
                self.status.succeed("Vous suivez maintenant cet utilisateur.");
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    async fn insert_edge(&self, member_id: &str) -> GatewayResult<()> {
        let viewer = self.gateway.require_user().await?;
        match self
            .gateway
            .insert::<Follow, _>(&[Follow::new(viewer.id, member_id)])
            .await
        {
            Ok(_) => Ok(()),
            // already following
            Err(err) if err.is_duplicate_key() => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub async fn unfollow(&mut self, member_id: &str) {
        if !self.status.begin(format!("unfollow:{member_id}")) {
            return;
        }
        match self.delete_edge(member_id).await {
            Ok(()) => {
                self.following.remove(member_id);
                self.status.succeed("Vous ne suivez plus cet utilisateur.");
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    async fn delete_edge(&self, member_id: &str) -> GatewayResult<()> {
        let viewer = self.gateway.require_user().await?;
        let query = Query::new()
            .eq("follower_id", viewer.id)
            .eq("followed_id", member_id);
        self.gateway.delete::<Follow>(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures::member;
    use store::{MemoryGateway, Table};

    #[tokio::test]
    async fn test_lists_other_members() {
        let gw = MemoryGateway::new();
        member(&gw, "bo").await;
        member(&gw, "cy").await;
        let ana = member(&gw, "ana").await;

        let mut friends = FriendsController::new(gw.clone());
        friends.load().await;
        let names: Vec<_> = friends.members.iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["bo", "cy"]);
        assert!(friends.members.iter().all(|p| p.id != ana));
        assert!(!friends.status.loading);
    }

    #[tokio::test]
    async fn test_follow_then_unfollow_restores_edges() {
        let gw = MemoryGateway::new();
        let bo = member(&gw, "bo").await;
        member(&gw, "ana").await;

        let mut friends = FriendsController::new(gw.clone());
        friends.load().await;
        let before = gw.rows(Table::Follow);

        friends.follow(&bo).await;
        assert!(friends.is_following(&bo));
        assert_eq!(gw.rows(Table::Follow).len(), 1);
        assert_eq!(
            friends.status.success.as_deref(),
            Some("Vous suivez maintenant cet utilisateur.")
        );

        // reload sees the persisted edge
        let mut reloaded = FriendsController::new(gw.clone());
        reloaded.load().await;
        assert!(reloaded.is_following(&bo));

        friends.unfollow(&bo).await;
        assert!(!friends.is_following(&bo));
        assert_eq!(gw.rows(Table::Follow), before);
    }

    #[tokio::test]
    async fn test_follow_twice_keeps_one_edge() {
        let gw = MemoryGateway::new();
        let bo = member(&gw, "bo").await;
        member(&gw, "ana").await;
        let mut friends = FriendsController::new(gw.clone());
        friends.follow(&bo).await;
        friends.follow(&bo).await;
        assert_eq!(gw.rows(Table::Follow).len(), 1);
        assert_eq!(friends.status.error, None);
    }

    #[tokio::test]
    async fn test_failed_follow_leaves_state() {
        let gw = MemoryGateway::new();
        let bo = member(&gw, "bo").await;
        member(&gw, "ana").await;
        let mut friends = FriendsController::new(gw.clone());
        gw.fail_next(Table::Follow, "permission denied");
        friends.follow(&bo).await;
        assert!(!friends.is_following(&bo));
        assert!(friends.status.error.is_some());
        assert_eq!(friends.status.action_loading, None);
    }
}
