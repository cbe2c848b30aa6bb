//! Whole-lifecycle scenarios for the friendship engine over the in-memory store.


use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;

use crate::{
    api::error::SystemError,
    modules::friendship::{
        access::ConnectionGate,
        repository::{BlockRepository, FriendRequestRepository, FriendshipRepository},
        repository_memory::FriendshipRepositoryMemory,
        service::FriendshipService,
    },
};

type Svc = FriendshipService<FriendshipRepositoryMemory>;

fn setup() -> (Svc, Arc<FriendshipRepositoryMemory>) {
    let store = Arc::new(FriendshipRepositoryMemory::new());
    (FriendshipService::with_dependencies(store.clone()), store)
}

fn users<const N: usize>() -> [Uuid; N] {
    std::array::from_fn(|_| Uuid::new_v4())
}

async fn befriend(svc: &Svc, a: Uuid, b: Uuid) {
    svc.add_friend(a, b, None).await.unwrap();
    svc.accept(b, a).await.unwrap();
}

async fn assert_symmetric(store: &FriendshipRepositoryMemory, a: Uuid, b: Uuid) {
    let forward = store.friendship_exists(&a, &b).await.unwrap();
    let backward = store.friendship_exists(&b, &a).await.unwrap();
    assert_eq!(forward, backward, "friendship rows between {a} and {b} are not paired");
}

#[tokio::test]
async fn end_to_end_request_accept_block() {
    let (svc, store) = setup();
    let [u1, u2] = users();

    svc.add_friend(u1, u2, None).await.unwrap();
    assert!(store.find_friend_request(&u1, &u2).await.unwrap().is_some());

    assert!(svc.accept(u2, u1).await.unwrap());
    assert!(svc.are_friends(u1, u2).await.unwrap());
    assert!(svc.are_friends(u2, u1).await.unwrap());
    assert!(store.find_friend_request(&u1, &u2).await.unwrap().is_none());

    svc.add_block(u1, u2).await.unwrap();
    assert!(!store.friendship_exists(&u1, &u2).await.unwrap());
    assert!(!store.friendship_exists(&u2, &u1).await.unwrap());
    assert!(store.block_exists(&u1, &u2).await.unwrap());

    assert!(matches!(svc.add_friend(u2, u1, None).await, Err(SystemError::Blocked)));
}

#[tokio::test]
async fn symmetry_holds_through_every_transition() {
    let (svc, store) = setup();
    let [a, b, c] = users();

    svc.add_friend(a, b, None).await.unwrap();
    assert_symmetric(&store, a, b).await;

    svc.accept(b, a).await.unwrap();
    assert_symmetric(&store, a, b).await;
    assert!(store.friendship_exists(&a, &b).await.unwrap());

    befriend(&svc, b, c).await;
    svc.remove_friend(c, b).await.unwrap();
    assert_symmetric(&store, b, c).await;

    svc.add_block(b, a).await.unwrap();
    assert_symmetric(&store, a, b).await;
    assert!(!store.friendship_exists(&a, &b).await.unwrap());
}

#[tokio::test]
async fn self_relations_are_refused() {
    let (svc, store) = setup();
    let [a] = users();

    assert!(matches!(svc.add_friend(a, a, None).await, Err(SystemError::SelfReference)));
    assert!(matches!(svc.add_block(a, a).await, Err(SystemError::SelfReference)));
    assert!(matches!(svc.accept(a, a).await, Err(SystemError::SelfReference)));

    assert!(store.find_friend_request(&a, &a).await.unwrap().is_none());
    assert!(!store.block_exists(&a, &a).await.unwrap());
    assert!(!store.friendship_exists(&a, &a).await.unwrap());
    assert_eq!(store.friendship_row_count(), 0);
}

#[tokio::test]
async fn remove_friend_twice_is_a_no_op() {
    let (svc, _) = setup();
    let [a, b] = users();

    befriend(&svc, a, b).await;

    assert!(svc.remove_friend(a, b).await.unwrap());
    assert!(!svc.remove_friend(a, b).await.unwrap());
    assert!(!svc.are_friends(a, b).await.unwrap());
}

#[tokio::test]
async fn block_supersedes_friendship() {
    let (svc, _) = setup();
    let [a, b] = users();

    befriend(&svc, a, b).await;
    assert!(svc.are_connected(a, b).await);

    svc.add_block(a, b).await.unwrap();
    assert!(!svc.are_friends(a, b).await.unwrap());
    assert!(!svc.are_connected(b, a).await);
}

#[tokio::test]
async fn duplicate_request_and_reverse_request() {
    let (svc, store) = setup();
    let [a, b] = users();

    svc.add_friend(a, b, None).await.unwrap();
    assert!(matches!(svc.add_friend(a, b, None).await, Err(SystemError::AlreadyExists)));

    // the reverse direction is an independent pending request
    svc.add_friend(b, a, None).await.unwrap();
    assert!(store.find_friend_request(&a, &b).await.unwrap().is_some());
    assert!(store.find_friend_request(&b, &a).await.unwrap().is_some());
    assert!(!svc.are_friends(a, b).await.unwrap());
}

#[tokio::test]
async fn mutual_friends_scenario() {
    let (svc, _) = setup();
    let [a, b, c, d] = users();

    befriend(&svc, a, b).await;
    befriend(&svc, a, c).await;
    befriend(&svc, b, c).await;
    befriend(&svc, b, d).await;

    let mutual = svc.mutual_friends(a, b).await.unwrap();
    assert_eq!(mutual, HashSet::from([c]));
    assert!(!mutual.contains(&a));
    assert!(!mutual.contains(&b));
}

#[tokio::test]
async fn accept_cleans_up_crossed_requests() {
    let (svc, store) = setup();
    let [a, b] = users();

    svc.add_friend(a, b, None).await.unwrap();
    svc.add_friend(b, a, None).await.unwrap();

    svc.accept(b, a).await.unwrap();

    assert!(store.friendship_exists(&a, &b).await.unwrap());
    assert!(store.friendship_exists(&b, &a).await.unwrap());
    assert!(store.find_friend_request(&a, &b).await.unwrap().is_none());
    assert!(store.find_friend_request(&b, &a).await.unwrap().is_none());

    // nothing left to accept from the other side
    assert!(matches!(svc.accept(a, b).await, Err(SystemError::NotFound(_))));
}

#[tokio::test]
async fn block_drops_pending_requests() {
    let (svc, store) = setup();
    let [a, b] = users();

    svc.add_friend(b, a, None).await.unwrap();
    svc.add_block(a, b).await.unwrap();

    assert!(store.find_friend_request(&b, &a).await.unwrap().is_none());
    assert!(matches!(svc.accept(a, b).await, Err(SystemError::NotFound(_))));

    svc.remove_block(a, b).await.unwrap();
    svc.add_friend(b, a, None).await.unwrap();
    svc.accept(a, b).await.unwrap();
    assert!(svc.are_friends(a, b).await.unwrap());
}

#[tokio::test]
async fn concurrent_accepts_leave_a_full_pair() {
    let (svc, store) = setup();
    let [a, b] = users();

    svc.add_friend(a, b, None).await.unwrap();
    svc.add_friend(b, a, None).await.unwrap();

    let first = tokio::spawn({
        let svc = svc.clone();
        async move { svc.accept(b, a).await }
    });
    let second = tokio::spawn({
        let svc = svc.clone();
        async move { svc.accept(a, b).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert!(results.iter().any(|r| r.is_ok()));

    assert!(svc.are_friends(a, b).await.unwrap());
    assert_eq!(store.friendship_row_count(), 2);
}
