#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        quiz::models::{GameSession, PlayerInfo},
        server::error::ServerError,
        session::store::{SessionStore, StoreError},
        tests::support::{settings, setup_logging, test_store},
    };

    fn empty_session() -> GameSession {
        GameSession::single_player(PlayerInfo::new("Misty", true), vec![], settings(5))
    }

    #[tokio::test]
    async fn concurrent_mutations_never_lose_updates() {
        setup_logging();
        let store = test_store();
        let session = empty_session();
        let id = session.session_id.clone();
        store.create(session).unwrap();

        let mut handles = Vec::new();
        for _ in 0..100 {
            let store = store.clone();
            let id = id.clone();

            handles.push(tokio::spawn(async move {
                store
                    .mutate(&id, |session| -> Result<(), StoreError> {
                        session.players[0].score += 1;
                        Ok(())
                    })
                    .await
            }));
        }

        let results = futures::future::join_all(handles).await;
        for result in results {
            result.unwrap().unwrap();
        }

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.players[0].score, 100);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_session_untouched() {
        let store = test_store();
        let session = empty_session();
        let id = session.session_id.clone();
        store.create(session).unwrap();

        let result: Result<(), ServerError> = store
            .mutate(&id, |session| {
                session.players[0].score = 999;
                Err(ServerError::Conflict("rejected".into()))
            })
            .await;

        assert!(matches!(result, Err(ServerError::Conflict(_))));
        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.players[0].score, 0);
    }

    #[tokio::test]
    async fn mutate_returns_closure_value() {
        let store = test_store();
        let session = empty_session();
        let id = session.session_id.clone();
        store.create(session).unwrap();

        let name: String = store
            .mutate(&id, |session| -> Result<String, StoreError> {
                Ok(session.players[0].name.clone())
            })
            .await
            .unwrap();

        assert_eq!(name, "Misty");
    }

    #[tokio::test]
    async fn duplicate_create_and_missing_keys_fail() {
        let store = test_store();
        let session = empty_session();
        let id = session.session_id.clone();
        store.create(session.clone()).unwrap();

        assert!(matches!(
            store.create(session),
            Err(StoreError::AlreadyExists(_))
        ));

        let missing: Result<(), StoreError> = store.mutate("nope", |_| Ok(())).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_sessions_are_absent_and_evicted() {
        let store = SessionStore::new(chrono::Duration::milliseconds(50), Duration::from_secs(1));
        let session = empty_session();
        let id = session.session_id.clone();
        store.create(session).unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.get(&id).await.unwrap().is_none());
        let result: Result<(), StoreError> = store.mutate(&id, |_| Ok(())).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        assert_eq!(store.evict_expired(), 1);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn lock_acquisition_is_bounded() {
        let store = SessionStore::new(chrono::Duration::hours(1), Duration::from_millis(50));
        let session = empty_session();
        let id = session.session_id.clone();
        store.create(session).unwrap();

        let slow_store = store.clone();
        let slow_id = id.clone();
        let slow = tokio::spawn(async move {
            slow_store
                .mutate(&slow_id, |_| -> Result<(), StoreError> {
                    std::thread::sleep(Duration::from_millis(400));
                    Ok(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        let blocked: Result<(), StoreError> = store.mutate(&id, |_| Ok(())).await;
        assert!(matches!(blocked, Err(StoreError::LockTimeout(_))));

        slow.await.unwrap().unwrap();
        let after: Result<(), StoreError> = store.mutate(&id, |_| Ok(())).await;
        assert!(after.is_ok());
    }
}
