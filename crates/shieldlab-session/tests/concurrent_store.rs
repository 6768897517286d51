//! The store shared the way the server shares it: behind a Tokio mutex,
//! hit from many tasks at once.

use std::sync::Arc;

use shieldlab_session::{SessionConfig, SessionStore};
use tokio::sync::Mutex;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_of_one_id_share_one_session() {
    let store = Arc::new(Mutex::new(SessionStore::new(SessionConfig::default())));
    let (id, token) = {
        let mut store = store.lock().await;
        let (id, session) = store.get_or_create(None);
        (id, session.csrf_token().expose().to_owned())
    };

    let mut handles = Vec::new();
    for _ in 0..64 {
        let store = Arc::clone(&store);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let mut store = store.lock().await;
            let (got, session) = store.get_or_create(Some(&id));
            (got, session.csrf_token().expose().to_owned())
        }));
    }

    for handle in handles {
        let (got, got_token) = handle.await.expect("task should not panic");
        assert_eq!(got, id);
        assert_eq!(got_token, token);
    }
    assert_eq!(store.lock().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_anonymous_requests_each_get_own_session() {
    let store = Arc::new(Mutex::new(SessionStore::new(SessionConfig::default())));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.lock().await.get_or_create(None).0
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.expect("task should not panic"));
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(store.lock().await.len(), 32);
}
