//! Antenna matching and the cached antenna directory.

use std::sync::Arc;
use std::time::Duration;

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use noteread_common::AppResult;
use noteread_db::entities::antenna::{self, AntennaSource};
use noteread_db::repositories::{AntennaRepository, FollowingRepository, UserListRepository};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::note_read::{NoteAuthor, ReadableNote};
use super::stores::AntennaDirectory;

/// Stateless part of the antenna predicate.
///
/// Everything except the `home` and `list` sources, which need follow and
/// list-membership lookups, is decided here.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntennaMatcher;

impl AntennaMatcher {
    /// Check if a note passes the antenna's filters and keywords.
    #[must_use]
    pub fn matches_note(
        &self,
        antenna: &antenna::Model,
        note: &ReadableNote,
        author: &NoteAuthor,
    ) -> bool {
        if !antenna.is_active {
            return false;
        }

        if antenna.local_only && author.host.is_some() {
            return false;
        }

        if !antenna.with_replies && note.reply_id.is_some() {
            return false;
        }

        if antenna.with_file && !note.has_files {
            return false;
        }

        match antenna.src {
            AntennaSource::Users => {
                let users: Vec<String> =
                    serde_json::from_value(antenna.users.clone()).unwrap_or_default();
                if !users.contains(&author.id) {
                    return false;
                }
            }
            AntennaSource::Instances => {
                let instances: Vec<String> =
                    serde_json::from_value(antenna.instances.clone()).unwrap_or_default();
                // Local authors never match an instance filter
                let Some(host) = &author.host else {
                    return false;
                };
                if !instances.iter().any(|i| i.eq_ignore_ascii_case(host)) {
                    return false;
                }
            }
            AntennaSource::All | AntennaSource::Home | AntennaSource::List => {}
        }

        let keywords: Vec<Vec<String>> =
            serde_json::from_value(antenna.keywords.clone()).unwrap_or_default();
        let exclude_keywords: Vec<Vec<String>> =
            serde_json::from_value(antenna.exclude_keywords.clone()).unwrap_or_default();

        let text = note.searchable_text();
        let text = if antenna.case_sensitive {
            text
        } else {
            text.to_lowercase()
        };

        if has_keywords(&exclude_keywords)
            && self.matches_keywords(&text, &exclude_keywords, antenna.case_sensitive)
        {
            return false;
        }

        if has_keywords(&keywords) && !self.matches_keywords(&text, &keywords, antenna.case_sensitive)
        {
            return false;
        }

        true
    }

    /// Check if text matches keyword groups (OR of ANDs).
    fn matches_keywords(&self, text: &str, keywords: &[Vec<String>], case_sensitive: bool) -> bool {
        for and_group in keywords {
            let patterns: Vec<String> = and_group
                .iter()
                .filter(|k| !k.is_empty())
                .map(|k| {
                    if case_sensitive {
                        k.clone()
                    } else {
                        k.to_lowercase()
                    }
                })
                .collect();

            if patterns.is_empty() {
                continue;
            }

            let Ok(ac) = AhoCorasick::new(&patterns) else {
                continue;
            };

            let mut matched = vec![false; patterns.len()];
            for mat in ac.find_overlapping_iter(text) {
                matched[mat.pattern().as_usize()] = true;
            }

            if matched.iter().all(|&m| m) {
                return true;
            }
        }

        false
    }
}

fn has_keywords(groups: &[Vec<String>]) -> bool {
    groups.iter().flatten().any(|k| !k.is_empty())
}

/// Antenna directory backed by the database, with a short-lived cache of
/// active antennas.
pub struct DbAntennaDirectory {
    antenna_repo: AntennaRepository,
    following_repo: FollowingRepository,
    user_list_repo: UserListRepository,
    matcher: AntennaMatcher,
    cache_ttl: Duration,
    cache: RwLock<Option<(Instant, Arc<Vec<antenna::Model>>)>>,
}

impl DbAntennaDirectory {
    /// Create a new antenna directory.
    #[must_use]
    pub fn new(
        antenna_repo: AntennaRepository,
        following_repo: FollowingRepository,
        user_list_repo: UserListRepository,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            antenna_repo,
            following_repo,
            user_list_repo,
            matcher: AntennaMatcher,
            cache_ttl,
            cache: RwLock::new(None),
        }
    }

    /// Active antennas, from the cache while it is fresh.
    pub async fn active_antennas(&self) -> AppResult<Arc<Vec<antenna::Model>>> {
        if let Some((fetched_at, antennas)) = self.cache.read().await.as_ref() {
            if fetched_at.elapsed() < self.cache_ttl {
                return Ok(Arc::clone(antennas));
            }
        }

        let antennas = Arc::new(self.antenna_repo.find_all_active().await?);
        debug!(count = antennas.len(), "Refreshed antenna cache");
        *self.cache.write().await = Some((Instant::now(), Arc::clone(&antennas)));

        Ok(antennas)
    }
}

#[async_trait]
impl AntennaDirectory for DbAntennaDirectory {
    async fn list_antennas(&self) -> AppResult<Vec<antenna::Model>> {
        Ok(self.active_antennas().await?.as_ref().clone())
    }

    async fn matches(
        &self,
        antenna: &antenna::Model,
        note: &ReadableNote,
        author: &NoteAuthor,
    ) -> AppResult<bool> {
        if !self.matcher.matches_note(antenna, note, author) {
            return Ok(false);
        }

        match antenna.src {
            AntennaSource::Home => {
                if author.id == antenna.user_id {
                    return Ok(true);
                }
                self.following_repo
                    .is_following(&antenna.user_id, &author.id)
                    .await
            }
            AntennaSource::List => match &antenna.user_list_id {
                Some(list_id) => self.user_list_repo.is_member(list_id, &author.id).await,
                None => Ok(false),
            },
            AntennaSource::All | AntennaSource::Users | AntennaSource::Instances => Ok(true),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::readable_note;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;

    fn create_test_antenna(id: &str, user_id: &str, name: &str) -> antenna::Model {
        antenna::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            src: AntennaSource::All,
            user_list_id: None,
            keywords: json!([["test"]]),
            exclude_keywords: json!([]),
            users: json!([]),
            instances: json!([]),
            case_sensitive: false,
            with_replies: false,
            with_file: false,
            notify: false,
            local_only: false,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn local(id: &str) -> NoteAuthor {
        NoteAuthor {
            id: id.to_string(),
            host: None,
        }
    }

    fn remote(id: &str, host: &str) -> NoteAuthor {
        NoteAuthor {
            id: id.to_string(),
            host: Some(host.to_string()),
        }
    }

    fn text_note(text: &str) -> ReadableNote {
        let mut note = readable_note("note1", "user2");
        note.text = Some(text.to_string());
        note
    }

    fn directory(db: DatabaseConnection) -> DbAntennaDirectory {
        let db = Arc::new(db);
        DbAntennaDirectory::new(
            AntennaRepository::new(Arc::clone(&db)),
            FollowingRepository::new(Arc::clone(&db)),
            UserListRepository::new(db),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_matches_keywords_and_or() {
        let matcher = AntennaMatcher;
        let keywords = vec![
            vec!["rust".to_string(), "async".to_string()],
            vec!["tokio".to_string()],
        ];

        assert!(matcher.matches_keywords("async rust is fun", &keywords, false));
        assert!(matcher.matches_keywords("tokio 1.0 released", &keywords, false));
        assert!(!matcher.matches_keywords("rust only", &keywords, false));
    }

    #[test]
    fn test_matches_keywords_overlapping() {
        let matcher = AntennaMatcher;
        let keywords = vec![vec!["foo".to_string(), "oob".to_string()]];

        assert!(matcher.matches_keywords("foob", &keywords, true));
    }

    #[test]
    fn test_case_sensitivity() {
        let matcher = AntennaMatcher;
        let mut antenna = create_test_antenna("ant1", "user1", "Case");
        antenna.keywords = json!([["Hello"]]);

        assert!(matcher.matches_note(&antenna, &text_note("hello world"), &local("user2")));

        antenna.case_sensitive = true;
        assert!(matcher.matches_note(&antenna, &text_note("Hello world"), &local("user2")));
        assert!(!matcher.matches_note(&antenna, &text_note("hello world"), &local("user2")));
    }

    #[test]
    fn test_exclude_keywords_veto() {
        let matcher = AntennaMatcher;
        let mut antenna = create_test_antenna("ant1", "user1", "Exclude");
        antenna.exclude_keywords = json!([["spoiler"]]);

        assert!(matcher.matches_note(&antenna, &text_note("test post"), &local("user2")));
        assert!(!matcher.matches_note(&antenna, &text_note("test spoiler"), &local("user2")));
    }

    #[test]
    fn test_keywords_search_content_warning() {
        let matcher = AntennaMatcher;
        let antenna = create_test_antenna("ant1", "user1", "CW");

        let mut note = text_note("nothing here");
        note.cw = Some("test".to_string());
        assert!(matcher.matches_note(&antenna, &note, &local("user2")));
    }

    #[test]
    fn test_inactive_antenna_never_matches() {
        let matcher = AntennaMatcher;
        let mut antenna = create_test_antenna("ant1", "user1", "Off");
        antenna.is_active = false;

        assert!(!matcher.matches_note(&antenna, &text_note("test"), &local("user2")));
    }

    #[test]
    fn test_local_only_rejects_remote() {
        let matcher = AntennaMatcher;
        let mut antenna = create_test_antenna("ant1", "user1", "Local Antenna");
        antenna.local_only = true;
        antenna.keywords = json!([]);

        assert!(matcher.matches_note(&antenna, &text_note("x"), &local("user2")));
        assert!(!matcher.matches_note(
            &antenna,
            &text_note("x"),
            &remote("user2", "remote.example")
        ));
    }

    #[test]
    fn test_replies_and_files() {
        let matcher = AntennaMatcher;
        let mut antenna = create_test_antenna("ant1", "user1", "Filters");
        antenna.keywords = json!([]);

        let mut reply = text_note("x");
        reply.reply_id = Some("parent".to_string());
        assert!(!matcher.matches_note(&antenna, &reply, &local("user2")));
        antenna.with_replies = true;
        assert!(matcher.matches_note(&antenna, &reply, &local("user2")));

        antenna.with_file = true;
        assert!(!matcher.matches_note(&antenna, &reply, &local("user2")));
        reply.has_files = true;
        assert!(matcher.matches_note(&antenna, &reply, &local("user2")));
    }

    #[test]
    fn test_users_and_instances_sources() {
        let matcher = AntennaMatcher;
        let mut antenna = create_test_antenna("ant1", "user1", "Sources");
        antenna.keywords = json!([]);

        antenna.src = AntennaSource::Users;
        antenna.users = json!(["user2"]);
        assert!(matcher.matches_note(&antenna, &text_note("x"), &local("user2")));
        assert!(!matcher.matches_note(&antenna, &text_note("x"), &local("user3")));

        antenna.src = AntennaSource::Instances;
        antenna.instances = json!(["Remote.Example"]);
        assert!(matcher.matches_note(
            &antenna,
            &text_note("x"),
            &remote("user2", "remote.example")
        ));
        assert!(!matcher.matches_note(&antenna, &text_note("x"), &local("user2")));
    }

    #[tokio::test]
    async fn test_home_source_checks_following() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(0))
            }]])
            .into_connection();
        let directory = directory(db);

        let mut antenna = create_test_antenna("ant1", "user1", "Home");
        antenna.src = AntennaSource::Home;
        let note = text_note("test");

        // Owner's own notes match without a lookup
        assert!(directory.matches(&antenna, &note, &local("user1")).await.unwrap());
        assert!(directory.matches(&antenna, &note, &local("user2")).await.unwrap());
        assert!(!directory.matches(&antenna, &note, &local("user3")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_source_without_list_never_matches() {
        let directory = directory(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut antenna = create_test_antenna("ant1", "user1", "List");
        antenna.src = AntennaSource::List;

        assert!(!directory
            .matches(&antenna, &text_note("test"), &local("user2"))
            .await
            .unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_antenna_cache_expires() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_antenna("ant1", "user1", "First")]])
            .append_query_results([[
                create_test_antenna("ant1", "user1", "First"),
                create_test_antenna("ant2", "user1", "Second"),
            ]])
            .into_connection();
        let directory = directory(db);

        assert_eq!(directory.list_antennas().await.unwrap().len(), 1);

        // Served from cache
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(directory.list_antennas().await.unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(directory.list_antennas().await.unwrap().len(), 2);
    }
}
