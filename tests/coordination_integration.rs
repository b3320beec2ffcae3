//! Integration tests for the coordination engine services
//!
//! These tests drive the router, lock manager, transition engine,
//! mention scanner, and change feed directly against SQLite, including
//! the one genuinely concurrent path: simultaneous lock acquisition over
//! separate pool connections.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use swarmdeck_api::coordination::{ChangeFeed, LockManager, MentionScanner, TransitionEngine};
use swarmdeck_api::domain::agent::{Agent, AgentId, AgentRole, ConnectionType, SkillLevel};
use swarmdeck_api::domain::document::SourceType;
use swarmdeck_api::domain::errors::CoordinationError;
use swarmdeck_api::domain::project::{Epic, Feature, Project};
use swarmdeck_api::domain::repositories::{
    AgentRepository, MentionRepository, ProjectRepository, TaskRepository,
};
use swarmdeck_api::domain::task::{Complexity, Task, TaskStatus};
use swarmdeck_api::infrastructure::db;
use swarmdeck_api::infrastructure::repositories::{
    SqliteAgentRepository, SqliteMentionRepository, SqliteProjectRepository, SqliteTaskRepository,
};

async fn setup_pool() -> SqlitePool {
    db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database")
}

async fn register(pool: &SqlitePool, id: &str, role: AgentRole, level: SkillLevel) -> AgentId {
    let agent_id = AgentId::new(id).unwrap();
    let agent = Agent::register(agent_id.clone(), role, level, ConnectionType::Automated);
    SqliteAgentRepository::new(pool.clone())
        .upsert(&agent)
        .await
        .expect("Failed to register agent");
    agent_id
}

/// Seed a project -> epic -> feature chain and return the feature id
async fn seed_feature(pool: &SqlitePool) -> Uuid {
    let repo = SqliteProjectRepository::new(pool.clone());

    let project = Project::new("Test Project".to_string(), None).unwrap();
    repo.create(&project).await.expect("Failed to create project");

    let epic = Epic::new(project.id, "Test Epic".to_string(), None).unwrap();
    repo.create_epic(&epic).await.expect("Failed to create epic");

    let feature = Feature::new(epic.id, "Test Feature".to_string(), None).unwrap();
    repo.create_feature(&feature)
        .await
        .expect("Failed to create feature");

    feature.id
}

async fn seed_task(
    pool: &SqlitePool,
    feature_id: Uuid,
    role: AgentRole,
    difficulty: SkillLevel,
    created_by: &AgentId,
) -> Uuid {
    let (task, initial) = Task::new(
        feature_id,
        "Implement endpoint".to_string(),
        None,
        role,
        difficulty,
        Complexity::Minor,
        None,
        created_by,
    )
    .unwrap();

    SqliteTaskRepository::new(pool.clone())
        .create(&task, &initial)
        .await
        .expect("Failed to create task");

    task.id()
}

#[tokio::test]
async fn concurrent_lock_attempts_yield_exactly_one_winner() {
    // A file-backed database so the two contenders really do arrive over
    // separate connections.
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("engine.db").display());
    let pool = db::connect(&url).await.expect("Failed to open database");
    db::init_schema(&pool).await.expect("Failed to init schema");

    let manager = register(&pool, "manager_001", AgentRole::Manager, SkillLevel::Principal).await;
    let a = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;
    let b = register(&pool, "backend_b", AgentRole::BackendDev, SkillLevel::Senior).await;

    let feature_id = seed_feature(&pool).await;
    let task_id = seed_task(
        &pool,
        feature_id,
        AgentRole::BackendDev,
        SkillLevel::Senior,
        &manager,
    )
    .await;

    let locks_a = LockManager::new(pool.clone());
    let locks_b = LockManager::new(pool.clone());
    let (first, second) = tokio::join!(locks_a.lock(task_id, &a), locks_b.lock(task_id, &b));

    let winners = [&first, &second]
        .iter()
        .filter(|result| result.is_ok())
        .count();
    assert_eq!(winners, 1, "exactly one contender may win the lock");

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser.unwrap_err(),
        CoordinationError::LockConflict(_)
    ));

    let task = SqliteTaskRepository::new(pool.clone())
        .find_by_id(task_id)
        .await
        .unwrap()
        .unwrap();
    assert!(task.locked_by() == Some(&a) || task.locked_by() == Some(&b));
}

#[tokio::test]
async fn transition_releases_lock_and_resets_agent() {
    let pool = setup_pool().await;

    let manager = register(&pool, "manager_001", AgentRole::Manager, SkillLevel::Principal).await;
    let dev = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;

    let feature_id = seed_feature(&pool).await;
    let task_id = seed_task(
        &pool,
        feature_id,
        AgentRole::BackendDev,
        SkillLevel::Senior,
        &manager,
    )
    .await;

    let locks = LockManager::new(pool.clone());
    let engine = TransitionEngine::new(pool.clone());

    locks.lock(task_id, &dev).await.unwrap();
    engine
        .transition(task_id, &dev, TaskStatus::UnderWork, None)
        .await
        .unwrap();

    let agents = SqliteAgentRepository::new(pool.clone());
    let working = agents.find_by_id(&dev).await.unwrap().unwrap();
    assert_eq!(working.current_task_id, Some(task_id));

    let done = engine
        .transition(task_id, &dev, TaskStatus::DevDone, None)
        .await
        .unwrap();
    assert_eq!(done.status(), TaskStatus::DevDone);
    assert!(done.locked_by().is_none());
    assert!(done.locked_at().is_none());

    let idle = agents.find_by_id(&dev).await.unwrap().unwrap();
    assert!(idle.current_task_id.is_none());
}

#[tokio::test]
async fn transition_to_under_work_without_lock_is_rejected() {
    let pool = setup_pool().await;

    let manager = register(&pool, "manager_001", AgentRole::Manager, SkillLevel::Principal).await;
    let dev = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;

    let feature_id = seed_feature(&pool).await;
    let task_id = seed_task(
        &pool,
        feature_id,
        AgentRole::BackendDev,
        SkillLevel::Senior,
        &manager,
    )
    .await;

    let engine = TransitionEngine::new(pool.clone());
    let result = engine
        .transition(task_id, &dev, TaskStatus::UnderWork, None)
        .await;

    assert!(matches!(result, Err(CoordinationError::LockConflict(_))));

    // The task did not move.
    let task = SqliteTaskRepository::new(pool)
        .find_by_id(task_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.status(), TaskStatus::Created);
}

#[tokio::test]
async fn rescanning_the_same_content_creates_no_duplicate_mentions() {
    let pool = setup_pool().await;

    let author = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;
    register(&pool, "qa_001", AgentRole::Qa, SkillLevel::Senior).await;

    let scanner = MentionScanner::new(pool.clone());
    let source_id = Uuid::new_v4();
    let content = "ready for review @qa_001, also @qa_001 again";

    let first = scanner
        .scan_and_record(SourceType::Document, source_id, &author, content)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let second = scanner
        .scan_and_record(SourceType::Document, source_id, &author, content)
        .await
        .unwrap();
    assert!(second.is_empty());

    let qa = AgentId::new("qa_001").unwrap();
    let stored = SqliteMentionRepository::new(pool)
        .for_agent(&qa, true)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn stale_locks_are_reclaimed_by_managers_only() {
    let pool = setup_pool().await;

    let manager = register(&pool, "manager_001", AgentRole::Manager, SkillLevel::Principal).await;
    let dev = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;

    let feature_id = seed_feature(&pool).await;
    let task_id = seed_task(
        &pool,
        feature_id,
        AgentRole::BackendDev,
        SkillLevel::Senior,
        &manager,
    )
    .await;

    // Backdate the lock acquisition, then start the work.
    let tasks = SqliteTaskRepository::new(pool.clone());
    let three_hours_ago = Utc::now() - Duration::hours(3);
    assert!(tasks.try_lock(task_id, &dev, three_hours_ago).await.unwrap());

    let engine = TransitionEngine::new(pool.clone());
    engine
        .transition(task_id, &dev, TaskStatus::UnderWork, None)
        .await
        .unwrap();

    let locks = LockManager::new(pool.clone());

    // Non-managers may not sweep.
    let refused = locks.reclaim_stale(&dev, Duration::hours(2)).await;
    assert!(matches!(refused, Err(CoordinationError::Forbidden(_))));

    // A recent-enough cutoff reclaims nothing.
    let untouched = locks
        .reclaim_stale(&manager, Duration::hours(4))
        .await
        .unwrap();
    assert!(untouched.is_empty());

    let reclaimed = locks
        .reclaim_stale(&manager, Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].status(), TaskStatus::Created);
    assert!(reclaimed[0].locked_by().is_none());

    // The reset shows up in the audit trail and the holder went idle.
    let entries = tasks.changelog_for(task_id).await.unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last.old_status, Some(TaskStatus::UnderWork));
    assert_eq!(last.new_status, TaskStatus::Created);
    assert_eq!(last.notes.as_deref(), Some("stale lock reclaimed"));

    let holder = SqliteAgentRepository::new(pool)
        .find_by_id(&dev)
        .await
        .unwrap()
        .unwrap();
    assert!(holder.current_task_id.is_none());
}

#[tokio::test]
async fn change_feed_snapshot_is_taken_before_the_queries() {
    let pool = setup_pool().await;

    let manager = register(&pool, "manager_001", AgentRole::Manager, SkillLevel::Principal).await;
    let dev = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;

    let feature_id = seed_feature(&pool).await;
    let before = Utc::now();
    let task_id = seed_task(
        &pool,
        feature_id,
        AgentRole::BackendDev,
        SkillLevel::Senior,
        &manager,
    )
    .await;

    let feed = ChangeFeed::new(pool.clone());
    let changes = feed.poll(before, &dev, None).await.unwrap();

    assert!(changes.tasks.iter().any(|t| t.id() == task_id));
    assert!(changes.timestamp >= before);

    // The returned cursor does not replay what it already delivered.
    let replay = feed.poll(changes.timestamp, &dev, None).await.unwrap();
    assert!(replay.tasks.is_empty());
}

#[tokio::test]
async fn change_feed_scopes_tasks_to_the_requested_project() {
    let pool = setup_pool().await;

    let manager = register(&pool, "manager_001", AgentRole::Manager, SkillLevel::Principal).await;
    let dev = register(&pool, "backend_a", AgentRole::BackendDev, SkillLevel::Senior).await;

    let repo = SqliteProjectRepository::new(pool.clone());
    let other_project = Project::new("Other".to_string(), None).unwrap();
    repo.create(&other_project).await.unwrap();

    let feature_id = seed_feature(&pool).await;
    let epoch = Utc::now() - Duration::days(1);
    seed_task(
        &pool,
        feature_id,
        AgentRole::BackendDev,
        SkillLevel::Senior,
        &manager,
    )
    .await;

    let feed = ChangeFeed::new(pool);

    let scoped = feed
        .poll(epoch, &dev, Some(other_project.id))
        .await
        .unwrap();
    assert!(scoped.tasks.is_empty());

    let unscoped = feed.poll(epoch, &dev, None).await.unwrap();
    assert_eq!(unscoped.tasks.len(), 1);
}
