use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::gateway::{Gateway, GatewayError, GatewayResult, UploadOptions};
use crate::models::{Identity, Record, Session, Table};
use crate::query::Query;

/// In-memory Gateway for tests and offline demos.
///
/// Emulates what the hosted platform enforces: generated ids and timestamps,
/// unique constraints, password accounts, one current session and a public
/// object store. Clones share all state.
#[derive(Clone, Debug, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<Table, Vec<Value>>,
    accounts: Vec<Account>,
    session: Option<Session>,
    objects: HashMap<(String, String), Vec<u8>>,
    failures: HashMap<Table, String>,
    last_created_at: Option<DateTime<Utc>>,
    writes: usize,
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

const PUBLIC_URL_BASE: &str = "memory://storage";

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next call touching `table` fail with `message`.
    pub fn fail_next(&self, table: Table, message: impl Into<String>) {
        self.lock().failures.insert(table, message.into());
    }

    /// Number of successful or attempted row and file writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Raw rows of a table, in insertion order.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Stored bytes of an uploaded object.
    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Sign in as an existing identity without a password, for test setup.
    pub fn act_as(&self, user_id: &str) -> GatewayResult<Session> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .iter()
            .find(|a| a.identity.id == user_id)
            .cloned()
            .ok_or_else(|| GatewayError::Auth("User not found".to_string()))?;
        let session = new_session(account.identity);
        inner.session = Some(session.clone());
        Ok(session)
    }
}

impl Inner {
    fn take_failure(&mut self, table: Table) -> GatewayResult<()> {
        match self.failures.remove(&table) {
            Some(message) => Err(GatewayError::Rejected {
                code: None,
                message,
            }),
            None => Ok(()),
        }
    }

    /// Strictly increasing timestamps so recency ordering is deterministic.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_created_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created_at = Some(now);
        now
    }

    fn check_unique(&self, table: Table, candidate: &Value, skip: Option<usize>) -> GatewayResult<()> {
        let rows = self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[]);
        for key in table.unique_keys() {
            let values: Vec<&Value> = key.iter().map(|c| candidate.get(*c).unwrap_or(&Value::Null)).collect();
            // NULLs never collide, as in SQL
            if values.iter().any(|v| v.is_null()) {
                continue;
            }
            let clash = rows.iter().enumerate().any(|(index, row)| {
                Some(index) != skip
                    && key
                        .iter()
                        .zip(&values)
                        .all(|(c, v)| row.get(*c).unwrap_or(&Value::Null) == *v)
            });
            if clash {
                return Err(GatewayError::Conflict {
                    table,
                    message: format!("{}_{}_key", table.name(), key.join("_")),
                });
            }
        }
        Ok(())
    }

    fn prepare_insert(&mut self, table: Table, row: Value) -> GatewayResult<Value> {
        let Value::Object(mut map) = row else {
            return Err(GatewayError::Rejected {
                code: None,
                message: format!("rows for {table} must be objects"),
            });
        };
        if table.generates_id() && map.get("id").map_or(true, Value::is_null) {
            map.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if table.has_created_at() && map.get("created_at").map_or(true, Value::is_null) {
            let ts = self.next_timestamp();
            map.insert("created_at".to_string(), serde_json::to_value(ts)?);
        }
        for column in table.primary_key() {
            if map.get(*column).map_or(true, Value::is_null) {
                return Err(GatewayError::Rejected {
                    code: Some("23502".to_string()),
                    message: format!("null value in column \"{column}\" of relation \"{table}\""),
                });
            }
        }
        Ok(Value::Object(map))
    }
}

fn new_session(identity: Identity) -> Session {
    Session {
        access_token: uuid::Uuid::new_v4().to_string(),
        refresh_token: Some(uuid::Uuid::new_v4().to_string()),
        expires_at: Some((Utc::now() + Duration::hours(1)).timestamp()),
        user: identity,
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn decode<R: Record>(rows: Vec<Value>) -> GatewayResult<Vec<R>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
        .collect()
}

impl Gateway for MemoryGateway {
    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<Identity> {
        let mut inner = self.lock();
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(GatewayError::Auth("Unable to validate email address: invalid format".to_string()));
        }
        if password.len() < 6 {
            return Err(GatewayError::Auth("Password should be at least 6 characters.".to_string()));
        }
        if inner
            .accounts
            .iter()
            .any(|a| a.identity.email.as_deref() == Some(email.as_str()))
        {
            return Err(GatewayError::Auth("User already registered".to_string()));
        }
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email),
            created_at: Utc::now(),
        };
        inner.accounts.push(Account {
            identity: identity.clone(),
            password: password.to_string(),
        });
        inner.session = Some(new_session(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<Session> {
        let mut inner = self.lock();
        let email = email.trim().to_lowercase();
        let account = inner
            .accounts
            .iter()
            .find(|a| a.identity.email.as_deref() == Some(email.as_str()) && a.password == password)
            .cloned()
            .ok_or_else(|| GatewayError::Auth("Invalid login credentials".to_string()))?;
        let session = new_session(account.identity);
        inner.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.lock().session = None;
        Ok(())
    }

    async fn session(&self) -> GatewayResult<Option<Session>> {
        let now = Utc::now();
        Ok(self
            .lock()
            .session
            .clone()
            .filter(|s| !s.is_expired_at(now)))
    }

    async fn current_user(&self) -> GatewayResult<Option<Identity>> {
        Ok(self.session().await?.map(|s| s.user))
    }

    async fn select<R: Record>(&self, query: &Query) -> GatewayResult<Vec<R>> {
        let mut inner = self.lock();
        inner.take_failure(R::TABLE)?;
        let rows = inner.tables.get(&R::TABLE).map(Vec::as_slice).unwrap_or(&[]);
        decode(query.apply(rows))
    }

    async fn count<R: Record>(&self, query: &Query) -> GatewayResult<usize> {
        let mut inner = self.lock();
        inner.take_failure(R::TABLE)?;
        Ok(inner
            .tables
            .get(&R::TABLE)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).count())
            .unwrap_or(0))
    }

    async fn insert<R: Record, N: Serialize>(&self, rows: &[N]) -> GatewayResult<Vec<R>> {
        let mut inner = self.lock();
        inner.writes += 1;
        inner.take_failure(R::TABLE)?;

        // Validate the whole batch before storing anything
        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let row = inner.prepare_insert(R::TABLE, serde_json::to_value(row)?)?;
            inner.check_unique(R::TABLE, &row, None)?;
            let batch = Inner {
                tables: HashMap::from([(R::TABLE, prepared.clone())]),
                ..Inner::default()
            };
            batch.check_unique(R::TABLE, &row, None)?;
            prepared.push(row);
        }

        inner
            .tables
            .entry(R::TABLE)
            .or_default()
            .extend(prepared.iter().cloned());
        decode(prepared)
    }

    async fn update<R: Record>(&self, query: &Query, patch: &Value) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.writes += 1;
        inner.take_failure(R::TABLE)?;

        let mut rows = inner.tables.get(&R::TABLE).cloned().unwrap_or_default();
        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| query.matches(row))
            .map(|(index, _)| index)
            .collect();
        for index in &targets {
            merge(&mut rows[*index], patch);
        }

        let snapshot = Inner {
            tables: HashMap::from([(R::TABLE, rows.clone())]),
            ..Inner::default()
        };
        for index in &targets {
            snapshot.check_unique(R::TABLE, &rows[*index], Some(*index))?;
        }

        inner.tables.insert(R::TABLE, rows);
        Ok(())
    }

    async fn delete<R: Record>(&self, query: &Query) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.writes += 1;
        inner.take_failure(R::TABLE)?;
        if let Some(rows) = inner.tables.get_mut(&R::TABLE) {
            rows.retain(|row| !query.matches(row));
        }
        Ok(())
    }

    async fn upsert<R: Record, N: Serialize>(&self, row: &N) -> GatewayResult<()> {
        let mut inner = self.lock();
        inner.writes += 1;
        inner.take_failure(R::TABLE)?;

        let row = serde_json::to_value(row)?;
        let key = R::TABLE.primary_key();
        let existing = inner.tables.get(&R::TABLE).and_then(|rows| {
            rows.iter().position(|stored| {
                key.iter()
                    .all(|c| stored.get(*c).is_some() && stored.get(*c) == row.get(*c))
            })
        });

        match existing {
            Some(index) => {
                let rows = inner.tables.entry(R::TABLE).or_default();
                merge(&mut rows[index], &row);
            }
            None => {
                let row = inner.prepare_insert(R::TABLE, row)?;
                inner.check_unique(R::TABLE, &row, None)?;
                inner.tables.entry(R::TABLE).or_default().push(row);
            }
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> GatewayResult<String> {
        let mut inner = self.lock();
        inner.writes += 1;
        if inner.session.is_none() {
            return Err(GatewayError::Unauthenticated);
        }
        let key = (bucket.to_string(), path.to_string());
        if !options.overwrite && inner.objects.contains_key(&key) {
            return Err(GatewayError::Storage("The resource already exists".to_string()));
        }
        inner.objects.insert(key, bytes);
        Ok(format!("{PUBLIC_URL_BASE}/{bucket}/{path}"))
    }
}

impl MemoryGateway {
    /// Seed a row directly, bypassing constraints and failure injection.
    pub fn seed<N: Serialize>(&self, table: Table, row: &N) -> GatewayResult<()> {
        let mut inner = self.lock();
        let row = inner.prepare_insert(table, serde_json::to_value(row)?)?;
        inner.tables.entry(table).or_default().push(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Cardinality;
    use crate::models::{Book, Follow, NewBook, NewPost, Post, Profile, ReadStatus};
    use crate::query::Order;
    use serde_json::json;

    fn new_book(google_id: &str) -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover_url: None,
            description: None,
            google_id: Some(google_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let gateway = MemoryGateway::new();
        assert!(gateway.current_user().await.unwrap().is_none());

        let identity = gateway.sign_up("Alice@Example.com", "secret1").await.unwrap();
        assert_eq!(identity.email.as_deref(), Some("alice@example.com"));
        assert!(gateway.session().await.unwrap().is_some());

        gateway.sign_out().await.unwrap();
        assert!(gateway.session().await.unwrap().is_none());

        let err = gateway.sign_in("alice@example.com", "wrong").await.unwrap_err();
        assert!(err.is_auth());

        let session = gateway.sign_in("alice@example.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, identity.id);
        assert_eq!(gateway.current_user().await.unwrap().unwrap().id, identity.id);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_rejected() {
        let gateway = MemoryGateway::new();
        gateway.sign_up("bob@example.com", "secret1").await.unwrap();
        assert!(gateway.sign_up("bob@example.com", "other12").await.is_err());
    }

    #[tokio::test]
    async fn test_insert_generates_columns() {
        let gateway = MemoryGateway::new();
        let books: Vec<Book> = gateway.insert(&[new_book("g1")]).await.unwrap();
        assert_eq!(books.len(), 1);
        assert!(!books[0].id.is_empty());

        let post = NewPost::for_book("u1", &books[0], ReadStatus::Read);
        let first: Vec<Post> = gateway.insert(&[post.clone()]).await.unwrap();
        let other = NewPost {
            user_id: "u2".to_string(),
            ..post
        };
        let second: Vec<Post> = gateway.insert(&[other]).await.unwrap();
        assert!(second[0].created_at > first[0].created_at);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let gateway = MemoryGateway::new();
        let _: Vec<Book> = gateway.insert(&[new_book("g1")]).await.unwrap();
        let err = gateway.insert::<Book, _>(&[new_book("g1")]).await.unwrap_err();
        assert!(err.is_duplicate_key());

        let _: Vec<Follow> = gateway.insert(&[Follow::new("a", "b")]).await.unwrap();
        let err = gateway
            .insert::<Follow, _>(&[Follow::new("a", "b")])
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());

        // A batch with an internal duplicate stores nothing
        let err = gateway
            .insert::<Follow, _>(&[Follow::new("c", "d"), Follow::new("c", "d")])
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(gateway.rows(Table::Follow).len(), 1);
    }

    #[tokio::test]
    async fn test_books_without_google_id_do_not_collide() {
        let gateway = MemoryGateway::new();
        let mut book = new_book("ignored");
        book.google_id = None;
        let _: Vec<Book> = gateway.insert(&[book.clone(), book]).await.unwrap();
        assert_eq!(gateway.rows(Table::Books).len(), 2);
    }

    #[tokio::test]
    async fn test_select_one_cardinality() {
        let gateway = MemoryGateway::new();
        let _: Vec<Follow> = gateway
            .insert(&[Follow::new("a", "b"), Follow::new("a", "c")])
            .await
            .unwrap();
        let query = Query::new().eq("follower_id", "a");

        let strict = gateway
            .select_one::<Follow>(&query, Cardinality::Strict)
            .await;
        assert!(matches!(strict, Err(GatewayError::MultipleRows { count: 2, .. })));

        let lenient = gateway.maybe_single::<Follow>(&query).await.unwrap();
        assert_eq!(lenient.unwrap().followed_id, "b");

        let missing = gateway
            .single::<Follow>(&Query::new().eq("follower_id", "z"))
            .await;
        assert!(matches!(missing, Err(GatewayError::NotFound { table: Table::Follow })));
    }

    #[tokio::test]
    async fn test_update_delete_and_count() {
        let gateway = MemoryGateway::new();
        let books: Vec<Book> = gateway.insert(&[new_book("g1")]).await.unwrap();
        let posts: Vec<Post> = gateway
            .insert(&[NewPost::for_book("u1", &books[0], ReadStatus::WantToRead)])
            .await
            .unwrap();

        gateway
            .update::<Post>(
                &Query::new().eq("id", posts[0].id.as_str()),
                &json!({"rating": 4.5, "status": "lu"}),
            )
            .await
            .unwrap();
        let post: Post = gateway
            .single(&Query::new().eq("id", posts[0].id.as_str()))
            .await
            .unwrap();
        assert_eq!(post.rating, Some(4.5));
        assert_eq!(post.status, ReadStatus::Read);

        let by_user = Query::new().eq("user_id", "u1");
        assert_eq!(gateway.count::<Post>(&by_user).await.unwrap(), 1);
        gateway.delete::<Post>(&by_user).await.unwrap();
        assert_eq!(gateway.count::<Post>(&by_user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_merges_by_primary_key() {
        let gateway = MemoryGateway::new();
        gateway
            .upsert::<Profile, _>(&json!({"id": "u1", "username": "alice"}))
            .await
            .unwrap();
        gateway
            .upsert::<Profile, _>(&json!({"id": "u1", "bio": "Lectrice"}))
            .await
            .unwrap();

        let profiles: Vec<Profile> = gateway.select(&Query::new()).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].username.as_deref(), Some("alice"));
        assert_eq!(profiles[0].bio.as_deref(), Some("Lectrice"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let gateway = MemoryGateway::new();
        gateway.fail_next(Table::Posts, "boom");
        let err = gateway.select::<Post>(&Query::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(gateway.select::<Post>(&Query::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_requires_session_and_respects_overwrite() {
        let gateway = MemoryGateway::new();
        let denied = gateway
            .upload("avatars", "u1/a.png", vec![1], UploadOptions::default())
            .await;
        assert_eq!(denied, Err(GatewayError::Unauthenticated));

        gateway.sign_up("carol@example.com", "secret1").await.unwrap();
        let url = gateway
            .upload("avatars", "u1/a.png", vec![1, 2], UploadOptions::default())
            .await
            .unwrap();
        assert_eq!(url, "memory://storage/avatars/u1/a.png");

        let again = gateway
            .upload("avatars", "u1/a.png", vec![3], UploadOptions::default())
            .await;
        assert!(matches!(again, Err(GatewayError::Storage(_))));

        gateway
            .upload("avatars", "u1/a.png", vec![3], UploadOptions::overwrite())
            .await
            .unwrap();
        assert_eq!(gateway.object("avatars", "u1/a.png"), Some(vec![3]));
    }

    #[tokio::test]
    async fn test_seeded_rows_keep_explicit_timestamps() {
        let gateway = MemoryGateway::new();
        gateway
            .seed(
                Table::Posts,
                &json!({
                    "id": "old", "user_id": "u1", "book_title": "A",
                    "created_at": "2020-01-01T00:00:00Z"
                }),
            )
            .unwrap();
        gateway
            .seed(Table::Posts, &json!({"id": "new", "user_id": "u1", "book_title": "B"}))
            .unwrap();
        let posts: Vec<Post> = gateway
            .select(&Query::new().order("created_at", Order::Desc))
            .await
            .unwrap();
        assert_eq!(posts[0].id, "new");
        assert_eq!(posts[1].id, "old");
    }
}
