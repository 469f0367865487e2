//! Repository Integration Tests
//!
//! Tests for the category repositories with in-memory backends.

#[cfg(test)]
mod tests {
    use crate::domain::{
        AuditAction, CategoryColor, CategoryIcon, CategoryId, CategoryRecord, DomainError, StoreId,
    };
    use crate::repository::category::{CategoryAuditOperations, CategoryStoreOperations};
    use crate::repository::{
        init_db, CategoryRepository, MemoryCategoryRepository, MemoryStoreDirectory, Repository,
        SqliteCategoryRepository, StoreDirectory,
    };
    use std::path::PathBuf;

    async fn setup_test_db() -> SqliteCategoryRepository {
        // Use in-memory database for tests
        let db_path = PathBuf::from(":memory:");
        let db_state = init_db(&db_path).await.expect("Failed to init test DB");
        assert!(db_state.is_initialized().await);
        SqliteCategoryRepository::new(db_state.conn.clone())
    }

    fn sample(name: &str) -> CategoryRecord {
        let mut record = CategoryRecord::new(CategoryId::new(), name, "alice");
        record.color = CategoryColor::Teal;
        record.icon = CategoryIcon::Drink;
        record.stores.insert(StoreId::new("store-1"));
        let at = record.audit.created_at;
        record.record_action("alice", AuditAction::Created, at);
        record
    }

    async fn exercise_crud<R: Repository<CategoryRecord>>(repo: &R) {
        let parent = repo.create(&sample("Beverages")).await.expect("Failed to create");
        let mut child = sample("Juice");
        child.parent_id = Some(parent.id);
        let child = repo.create(&child).await.expect("Failed to create child");

        let found = repo.find_by_id(child.id).await.expect("Find failed");
        assert_eq!(found, Some(child.clone()));

        let all = repo.list().await.expect("List failed");
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Beverages", "Juice"]);

        let mut edited = child.clone();
        edited.name = "Fresh Juice".to_string();
        edited.is_active = false;
        edited.stores.insert(StoreId::new("store-2"));
        let at = edited.audit.updated_at;
        edited.record_action("bob", AuditAction::Updated, at);
        let saved = repo.update(&edited).await.expect("Update failed");
        assert_eq!(saved.version(), child.version() + 1);

        let reloaded = repo.find_by_id(child.id).await.unwrap().unwrap();
        assert_eq!(reloaded, saved);
        assert_eq!(reloaded.audit.log.len(), 2);

        // Writing from the stale copy loses the race
        let err = repo.update(&edited).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::ConcurrentModification {
                id: child.id,
                expected: edited.version(),
                actual: saved.version(),
            }
        );

        repo.delete(child.id).await.expect("Delete failed");
        assert!(repo.find_by_id(child.id).await.unwrap().is_none());
        assert_eq!(repo.delete(child.id).await, Err(DomainError::NotFound(child.id)));
        assert_eq!(repo.get(child.id).await, Err(DomainError::NotFound(child.id)));
    }

    #[tokio::test]
    async fn test_memory_repository_crud() {
        exercise_crud(&MemoryCategoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_repository_crud() {
        exercise_crud(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let record = sample("Snacks");

        let memory = MemoryCategoryRepository::new();
        memory.create(&record).await.unwrap();
        assert!(matches!(memory.create(&record).await, Err(DomainError::Conflict(_))));

        let sqlite = setup_test_db().await;
        sqlite.create(&record).await.unwrap();
        assert!(matches!(sqlite.create(&record).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_memory_repository_write_failures() {
        let repo = MemoryCategoryRepository::new();
        let record = repo.create(&sample("Dairy")).await.unwrap();

        repo.set_fail_writes(true);
        assert!(matches!(repo.update(&record).await, Err(DomainError::Repository(_))));
        assert!(repo.find_by_id(record.id).await.unwrap().is_some());

        repo.set_fail_writes(false);
        assert!(repo.update(&record).await.is_ok());
    }

    #[tokio::test]
    async fn test_sqlite_store_lookup_and_audit_trail() {
        let repo = setup_test_db().await;
        let a = repo.create(&sample("Bakery")).await.unwrap();
        let mut b = sample("Frozen");
        b.stores.clear();
        b.stores.insert(StoreId::new("store-9"));
        let b = repo.create(&b).await.unwrap();

        let ids = repo.category_ids_for_store(&StoreId::new("store-1")).await.unwrap();
        assert_eq!(ids, vec![a.id]);
        let ids = repo.category_ids_for_store(&StoreId::new("store-9")).await.unwrap();
        assert_eq!(ids, vec![b.id]);

        let trail = repo.audit_trail(a.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::Created);
    }

    #[tokio::test]
    async fn test_uninitialized_sqlite_repository() {
        let state = crate::repository::DbState::new();
        assert!(!state.is_initialized().await);
        let repo = SqliteCategoryRepository::new(state.conn);
        assert!(matches!(repo.list().await, Err(DomainError::Repository(_))));
    }

    #[tokio::test]
    async fn test_memory_store_directory() {
        let directory = MemoryStoreDirectory::with_stores([(StoreId::new("s1"), "Downtown")]);
        directory.insert(StoreId::new("s2"), "Airport").await;

        assert!(directory.exists(&StoreId::new("s2")).await.unwrap());
        assert!(!directory.exists(&StoreId::new("s3")).await.unwrap());
        assert_eq!(
            directory.display_name(&StoreId::new("s1")).await.unwrap(),
            Some("Downtown".to_string())
        );
    }
}
