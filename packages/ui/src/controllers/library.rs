use api::{BookSearch, SearchOptions};
use serde_json::json;
use store::{
    Book, CandidateBook, Gateway, GatewayError, GatewayResult, NewBook, NewPost, Order, Post,
    Query, ReadStatus,
};

use super::{describe, ViewStatus};

/// The signed-in member's library (`/livres`): two shelves, a search box and
/// add / remove / move operations.
#[derive(Clone, Debug)]
pub struct LibraryController<G, S> {
    gateway: G,
    finder: S,
    options: SearchOptions,
    /// Newest first.
    pub posts: Vec<Post>,
    pub candidates: Vec<CandidateBook>,
    pub status: ViewStatus,
}

impl<G: Gateway, S: BookSearch> LibraryController<G, S> {
    pub fn new(gateway: G, finder: S, options: SearchOptions) -> Self {
        Self {
            gateway,
            finder,
            options,
            posts: Vec::new(),
            candidates: Vec::new(),
            status: ViewStatus::loading(),
        }
    }

    pub async fn load(&mut self) {
        self.status.loading = true;
        match self.fetch_posts().await {
            Ok(posts) => {
                self.posts = posts;
                self.status.loading = false;
            }
            Err(err) => self
                .status
                .fail_load("Erreur lors du chargement de vos livres.", &err),
        }
    }

    async fn fetch_posts(&self) -> GatewayResult<Vec<Post>> {
        let user = self.gateway.require_user().await?;
        let query = Query::new()
            .eq("user_id", user.id)
            .order("created_at", Order::Desc);
        self.gateway.select::<Post>(&query).await
    }

    /// Posts split into (read, to read), each keeping the newest-first order.
    pub fn partition(&self) -> (Vec<&Post>, Vec<&Post>) {
        self.posts
            .iter()
            .partition(|post| post.status == ReadStatus::Read)
    }

    pub fn shelf(&self, status: ReadStatus) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.status == status).collect()
    }

    pub fn count(&self, status: ReadStatus) -> usize {
        self.posts.iter().filter(|p| p.status == status).count()
    }

    pub async fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.candidates.clear();
            return;
        }
        if !self.status.begin("search") {
            return;
        }
        self.candidates = self.finder.search(query, &self.options).await;
        if self.candidates.is_empty() {
            self.status.fail("Aucun résultat.");
        } else {
            self.status.end();
        }
    }

    /// Add a search result to the library with `status`.
    pub async fn add(&mut self, candidate: &CandidateBook, status: ReadStatus) {
        if !self.status.begin(format!("add:{}", candidate.external_id)) {
            return;
        }
        match self.add_post(candidate, status).await {
            Ok(Some(post)) => {
                tracing::info!(book = %post.book_title, "book added to library");
                self.posts.insert(0, post);
                self.candidates.clear();
                self.status.succeed("Livre ajouté à votre bibliothèque.");
            }
            Ok(None) => self.status.end(),
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    /// `None` when the member already has this book.
    async fn add_post(
        &self,
        candidate: &CandidateBook,
        status: ReadStatus,
    ) -> GatewayResult<Option<Post>> {
        let user = self.gateway.require_user().await?;
        let book = self.resolve_book(candidate).await?;

        let entry = NewPost::for_book(user.id, &book, status);
        match self.gateway.insert::<Post, _>(&[entry]).await {
            Ok(mut rows) if !rows.is_empty() => Ok(Some(rows.swap_remove(0))),
            Ok(_) => Err(GatewayError::Decode("insert returned no post".to_string())),
            Err(err) if err.is_duplicate_key() => {
                tracing::debug!(book_id = %book.id, "book already in library");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// The shared catalog row for `candidate`, created on first use.
    async fn resolve_book(&self, candidate: &CandidateBook) -> GatewayResult<Book> {
        let by_external_id = Query::new().eq("google_id", candidate.external_id.as_str());
        if let Some(book) = self.gateway.maybe_single::<Book>(&by_external_id).await? {
            return Ok(book);
        }

        match self
            .gateway
            .insert::<Book, _>(&[NewBook::from(candidate)])
            .await
        {
            Ok(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            Ok(_) => Err(GatewayError::Decode("insert returned no book".to_string())),
            // another member created it in the meantime
            Err(err) if err.is_duplicate_key() => self.gateway.single::<Book>(&by_external_id).await,
            Err(err) => Err(err),
        }
    }

    /// Delete a post once the member confirmed.
    pub async fn remove(&mut self, post_id: &str, confirmed: bool) {
        if !confirmed || !self.status.begin(format!("remove:{post_id}")) {
            return;
        }
        match self.delete_post(post_id).await {
            Ok(()) => {
                self.posts.retain(|p| p.id != post_id);
                self.status.succeed("Livre retiré de votre bibliothèque.");
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    async fn delete_post(&self, post_id: &str) -> GatewayResult<()> {
        let user = self.gateway.require_user().await?;
        let query = Query::new().eq("id", post_id).eq("user_id", user.id);
        self.gateway.delete::<Post>(&query).await
    }

    /// Move a post to the other shelf.
    pub async fn set_status(&mut self, post_id: &str, status: ReadStatus) {
        let unchanged = self
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map_or(true, |p| p.status == status);
        if unchanged || !self.status.begin(format!("status:{post_id}")) {
            return;
        }
        match self.update_status(post_id, status).await {
            Ok(()) => {
                if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
                    post.status = status;
                }
                self.status
                    .succeed(format!("Déplacé dans « {} ».", status.label()));
            }
            Err(err) => self.status.fail(describe(&err)),
        }
    }

    async fn update_status(&self, post_id: &str, status: ReadStatus) -> GatewayResult<()> {
        let user = self.gateway.require_user().await?;
        let query = Query::new().eq("id", post_id).eq("user_id", user.id);
        self.gateway
            .update::<Post>(&query, &json!({ "status": status }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures::{candidate, member, StaticSearch};
    use store::{MemoryGateway, Table};

    fn controller(
        gateway: &MemoryGateway,
        results: Vec<CandidateBook>,
    ) -> LibraryController<MemoryGateway, StaticSearch> {
        LibraryController::new(
            gateway.clone(),
            StaticSearch { results },
            SearchOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_add_creates_book_and_prepends_post() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let dune = candidate("vol-dune", "Dune");
        let mut library = controller(&gw, vec![dune.clone()]);
        library.load().await;
        assert!(library.posts.is_empty());

        library.search("dune").await;
        assert_eq!(library.candidates.len(), 1);

        library.add(&dune, ReadStatus::WantToRead).await;
        assert_eq!(library.status.error, None);
        assert!(library.candidates.is_empty());
        assert_eq!(library.posts.len(), 1);
        let post = &library.posts[0];
        assert_eq!(post.book_title, "Dune");
        assert_eq!(post.book_author.as_deref(), Some("Frank Herbert"));
        assert_eq!(post.status, ReadStatus::WantToRead);

        let books = gw.rows(Table::Books);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["google_id"], "vol-dune");
    }

    #[tokio::test]
    async fn test_two_members_share_one_book() {
        let gw = MemoryGateway::new();
        let dune = candidate("vol-dune", "Dune");

        member(&gw, "ana").await;
        let mut first = controller(&gw, vec![]);
        first.add(&dune, ReadStatus::Read).await;

        member(&gw, "bo").await;
        let mut second = controller(&gw, vec![]);
        second.add(&dune, ReadStatus::WantToRead).await;

        assert_eq!(gw.rows(Table::Books).len(), 1);
        assert_eq!(gw.rows(Table::Posts).len(), 2);
        assert_eq!(first.posts[0].book_id, second.posts[0].book_id);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_silent() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let dune = candidate("vol-dune", "Dune");
        let mut library = controller(&gw, vec![]);
        library.add(&dune, ReadStatus::Read).await;
        library.add(&dune, ReadStatus::Read).await;

        assert_eq!(library.status.error, None);
        assert_eq!(library.status.action_loading, None);
        assert_eq!(library.posts.len(), 1);
        assert_eq!(gw.rows(Table::Posts).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_post_insert_is_surfaced() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        gw.fail_next(Table::Posts, "quota exceeded");
        let mut library = controller(&gw, vec![]);
        library.add(&candidate("vol-dune", "Dune"), ReadStatus::Read).await;

        assert!(library.posts.is_empty());
        assert!(library
            .status
            .error
            .as_deref()
            .is_some_and(|e| e.contains("quota exceeded")));
        // the catalog row stays behind
        assert_eq!(gw.rows(Table::Books).len(), 1);
    }

    #[tokio::test]
    async fn test_partition_and_status_moves() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut library = controller(&gw, vec![]);
        library.add(&candidate("v1", "Dune"), ReadStatus::Read).await;
        library.add(&candidate("v2", "Hyperion"), ReadStatus::WantToRead).await;
        library.add(&candidate("v3", "Solaris"), ReadStatus::Read).await;

        library.load().await;
        let titles: Vec<_> = library.posts.iter().map(|p| p.book_title.as_str()).collect();
        assert_eq!(titles, vec!["Solaris", "Hyperion", "Dune"]);

        let (read, to_read) = library.partition();
        assert_eq!(read.len() + to_read.len(), library.posts.len());
        assert!(read.iter().all(|p| !to_read.iter().any(|q| q.id == p.id)));
        assert_eq!(library.count(ReadStatus::Read), 2);

        let hyperion = library.shelf(ReadStatus::WantToRead)[0].id.clone();
        library.set_status(&hyperion, ReadStatus::Read).await;
        assert_eq!(library.count(ReadStatus::WantToRead), 0);

        library.load().await;
        assert_eq!(library.count(ReadStatus::Read), 3);
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut library = controller(&gw, vec![]);
        library.add(&candidate("v1", "Dune"), ReadStatus::Read).await;
        let post_id = library.posts[0].id.clone();

        let writes = gw.write_count();
        library.remove(&post_id, false).await;
        assert_eq!(gw.write_count(), writes);
        assert_eq!(library.posts.len(), 1);

        library.remove(&post_id, true).await;
        assert!(library.posts.is_empty());
        assert!(gw.rows(Table::Posts).is_empty());
    }

    #[tokio::test]
    async fn test_cannot_remove_another_members_post() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut ana = controller(&gw, vec![]);
        ana.add(&candidate("v1", "Dune"), ReadStatus::Read).await;
        let post_id = ana.posts[0].id.clone();

        member(&gw, "bo").await;
        let mut bo = controller(&gw, vec![]);
        bo.remove(&post_id, true).await;

        assert_eq!(gw.rows(Table::Posts).len(), 1);
    }

    #[tokio::test]
    async fn test_busy_controller_refuses_actions() {
        let gw = MemoryGateway::new();
        member(&gw, "ana").await;
        let mut library = controller(&gw, vec![]);
        library.status.action_loading = Some("search".to_string());

        library.add(&candidate("v1", "Dune"), ReadStatus::Read).await;
        assert!(gw.rows(Table::Posts).is_empty());
        assert!(library.status.is_running("search"));
    }

    #[tokio::test]
    async fn test_empty_search() {
        let gw = MemoryGateway::new();
        let mut library = controller(&gw, vec![]);
        library.search("   ").await;
        assert!(library.candidates.is_empty());
        assert_eq!(library.status.error, None);

        library.search("introuvable").await;
        assert_eq!(library.status.error.as_deref(), Some("Aucun résultat."));
        assert_eq!(library.status.action_loading, None);
    }
}
