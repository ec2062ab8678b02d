use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;
use cmse_market::domain::types::{Broadcast, RequestStatus};
use cmse_market::error::MarketError;
use cmse_market::usecase::broadcast::{
    CreateBroadcastInput, ListActiveBroadcastsUseCase, ManageBroadcastsUseCase,
};
use cmse_market::usecase::moderation::{
    ReviewProfileImageUseCase, SetUserLockedUseCase, SetUserRoleUseCase,
};
use cmse_market::usecase::page::{GetPageUseCase, ListPagesUseCase, ManagePagesUseCase, PageInput};
use cmse_market::usecase::store::{
    CreateMyStoreUseCase, CreateStoreInput, SetStoreActiveUseCase, UpdateMyStoreUseCase,
    UpdateStoreInput,
};
use cmse_market::usecase::unlock::{DecideUnlockRequestUseCase, SubmitUnlockRequestUseCase};

use crate::helpers::{
    MockAccountRepo, MockAuditRepo, MockBroadcastRepo, MockPageRepo, MockStorage,
    MockStoreRepo, MockUnlockRepo, anyone, identity, test_profile, test_store, test_user,
};

// ── Stores ───────────────────────────────────────────────────────────────────

fn lamp_loft() -> CreateStoreInput {
    CreateStoreInput {
        name: " Lamp Loft ".to_owned(),
        description: Some("Lamps and shades".to_owned()),
        contact_email: Some("Hello@Loft.Example".to_owned()),
    }
}

#[tokio::test]
async fn should_open_store_for_seller_without_one() {
    let seller = anyone(UserRole::Seller);
    let stores = MockStoreRepo::empty();
    let stored = stores.stores_handle();
    let usecase = CreateMyStoreUseCase { stores };

    let store = usecase.execute(&seller, lamp_loft()).await.unwrap();

    assert_eq!(store.owner_id, seller.user_id);
    assert_eq!(store.name, "Lamp Loft");
    assert_eq!(store.slug, "lamp-loft");
    assert_eq!(store.contact_email.as_deref(), Some("hello@loft.example"));
    assert!(store.is_active);
    assert_eq!(stored.lock().unwrap().len(), 1);

    let again = usecase.execute(&seller, lamp_loft()).await;
    assert!(
        matches!(again, Err(MarketError::StoreAlreadyExists)),
        "expected StoreAlreadyExists, got {again:?}"
    );
}

#[tokio::test]
async fn should_reject_store_with_taken_slug_or_for_customer() {
    let mut taken = test_store(Uuid::new_v4());
    taken.slug = "lamp-loft".to_owned();
    let usecase = CreateMyStoreUseCase {
        stores: MockStoreRepo::new(vec![taken]),
    };

    let result = usecase.execute(&anyone(UserRole::Seller), lamp_loft()).await;
    assert!(
        matches!(result, Err(MarketError::StoreSlugTaken)),
        "expected StoreSlugTaken, got {result:?}"
    );
    let customer = usecase.execute(&anyone(UserRole::Customer), lamp_loft()).await;
    assert!(
        matches!(customer, Err(MarketError::Forbidden)),
        "expected Forbidden, got {customer:?}"
    );
}

#[tokio::test]
async fn should_reslug_store_on_rename() {
    let seller = test_user(UserRole::Seller);
    let usecase = UpdateMyStoreUseCase {
        stores: MockStoreRepo::new(vec![test_store(seller.id)]),
    };
    let input = UpdateStoreInput {
        name: Some("  Lamp & Light Co ".to_owned()),
        contact_email: Some(" Sales@Lamps.Example ".to_owned()),
        ..Default::default()
    };

    let store = usecase.execute(seller.id, input).await.unwrap();

    assert_eq!(store.name, "Lamp & Light Co");
    assert_eq!(store.slug, "lamp-light-co");
    assert_eq!(store.contact_email.as_deref(), Some("sales@lamps.example"));
}

#[tokio::test]
async fn should_reject_rename_onto_taken_slug() {
    let seller = test_user(UserRole::Seller);
    let mut other = test_store(Uuid::new_v4());
    other.slug = "other-shop".to_owned();
    let usecase = UpdateMyStoreUseCase {
        stores: MockStoreRepo::new(vec![test_store(seller.id), other]),
    };
    let input = UpdateStoreInput {
        name: Some("Other Shop".to_owned()),
        ..Default::default()
    };

    let result = usecase.execute(seller.id, input).await;
    assert!(
        matches!(result, Err(MarketError::StoreSlugTaken)),
        "expected StoreSlugTaken, got {result:?}"
    );
}

#[tokio::test]
async fn should_require_some_field_to_update_store() {
    let seller = test_user(UserRole::Seller);
    let usecase = UpdateMyStoreUseCase {
        stores: MockStoreRepo::new(vec![test_store(seller.id)]),
    };

    let result = usecase.execute(seller.id, UpdateStoreInput::default()).await;
    assert!(
        matches!(result, Err(MarketError::MissingData)),
        "expected MissingData, got {result:?}"
    );
}

#[tokio::test]
async fn should_let_only_admin_toggle_store() {
    let store = test_store(Uuid::new_v4());
    let usecase = SetStoreActiveUseCase {
        stores: MockStoreRepo::new(vec![store.clone()]),
    };

    let result = usecase
        .execute(&anyone(UserRole::Seller), store.id, false)
        .await;
    assert!(
        matches!(result, Err(MarketError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
    usecase
        .execute(&anyone(UserRole::Admin), store.id, false)
        .await
        .unwrap();

    let missing = usecase
        .execute(&anyone(UserRole::Admin), Uuid::new_v4(), false)
        .await;
    assert!(
        matches!(missing, Err(MarketError::StoreNotFound)),
        "expected StoreNotFound, got {missing:?}"
    );
}

// ── Profile images ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_promote_pending_image_and_delete_old_file() {
    let user = test_user(UserRole::Customer);
    let mut profile = test_profile(user.id);
    profile.profile_image = Some("profiles/old.png".to_owned());
    profile.pending_profile_image = Some("profiles/new.png".to_owned());
    let accounts = MockAccountRepo::new(vec![user.clone()], vec![profile]);
    let profiles = Arc::clone(&accounts.profiles);
    let storage = MockStorage::default();
    let deleted = storage.deleted_handle();
    let usecase = ReviewProfileImageUseCase { accounts, storage };

    usecase
        .approve(&anyone(UserRole::Admin), user.id)
        .await
        .unwrap();

    let profile = profiles.lock().unwrap()[0].clone();
    assert_eq!(profile.profile_image.as_deref(), Some("profiles/new.png"));
    assert!(profile.pending_profile_image.is_none());
    assert_eq!(*deleted.lock().unwrap(), vec!["profiles/old.png".to_owned()]);
}

#[tokio::test]
async fn should_discard_rejected_image_and_keep_approved_one() {
    let user = test_user(UserRole::Customer);
    let mut profile = test_profile(user.id);
    profile.profile_image = Some("profiles/old.png".to_owned());
    profile.pending_profile_image = Some("profiles/new.png".to_owned());
    let accounts = MockAccountRepo::new(vec![user.clone()], vec![profile]);
    let profiles = Arc::clone(&accounts.profiles);
    let storage = MockStorage::default();
    let deleted = storage.deleted_handle();
    let usecase = ReviewProfileImageUseCase { accounts, storage };

    usecase
        .reject(&anyone(UserRole::Admin), user.id)
        .await
        .unwrap();

    let profile = profiles.lock().unwrap()[0].clone();
    assert_eq!(profile.profile_image.as_deref(), Some("profiles/old.png"));
    assert!(profile.pending_profile_image.is_none());
    assert_eq!(*deleted.lock().unwrap(), vec!["profiles/new.png".to_owned()]);

    let again = usecase.reject(&anyone(UserRole::Admin), user.id).await;
    assert!(
        matches!(again, Err(MarketError::InvalidState)),
        "expected InvalidState, got {again:?}"
    );
}

// ── Users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_lock_lower_role_only() {
    let admin = test_user(UserRole::Admin);
    let customer = test_user(UserRole::Customer);
    let peer = test_user(UserRole::Admin);
    let accounts = MockAccountRepo::new(
        vec![admin.clone(), customer.clone(), peer.clone()],
        vec![],
    );
    let users = accounts.users_handle();
    let usecase = SetUserLockedUseCase { accounts };

    usecase
        .execute(&identity(&admin), customer.id, true)
        .await
        .unwrap();
    assert!(users.lock().unwrap()[1].is_locked);

    for target in [admin.id, peer.id] {
        let result = usecase.execute(&identity(&admin), target, true).await;
        assert!(
            matches!(result, Err(MarketError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_require_its_number_to_make_seller() {
    let superadmin = test_user(UserRole::SuperAdmin);
    let customer = test_user(UserRole::Customer);
    let accounts = MockAccountRepo::new(vec![superadmin.clone(), customer.clone()], vec![]);
    let users = accounts.users_handle();
    let usecase = SetUserRoleUseCase { accounts };

    let result = usecase
        .execute(&identity(&superadmin), customer.id, UserRole::Seller)
        .await;
    assert!(
        matches!(result, Err(MarketError::InvalidItsNumber)),
        "expected InvalidItsNumber, got {result:?}"
    );

    usecase
        .execute(&identity(&superadmin), customer.id, UserRole::Admin)
        .await
        .unwrap();
    assert_eq!(users.lock().unwrap()[1].role, UserRole::Admin);

    let own = usecase
        .execute(&identity(&superadmin), superadmin.id, UserRole::Customer)
        .await;
    assert!(
        matches!(own, Err(MarketError::Forbidden)),
        "expected Forbidden, got {own:?}"
    );
}

// ── Unlock requests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_only_accept_unlock_request_for_locked_account() {
    let user = test_user(UserRole::Customer);
    let accounts = MockAccountRepo::new(vec![user.clone()], vec![]);
    let usecase = SubmitUnlockRequestUseCase {
        unlocks: MockUnlockRepo::new(accounts.users_handle()),
        accounts,
    };

    let result = usecase.execute(&user.email, "please").await;
    assert!(
        matches!(result, Err(MarketError::AccountNotLocked)),
        "expected AccountNotLocked, got {result:?}"
    );
}

#[tokio::test]
async fn should_unlock_account_on_approval() {
    let mut user = test_user(UserRole::Customer);
    user.is_locked = true;
    let accounts = MockAccountRepo::new(vec![user.clone()], vec![]);
    let users = accounts.users_handle();
    let unlocks = MockUnlockRepo::new(users.clone());
    let requests = unlocks.requests_handle();
    let submit = SubmitUnlockRequestUseCase { accounts, unlocks };

    let request = submit
        .execute(&user.email.to_uppercase(), "  I forgot my password  ")
        .await
        .unwrap();
    assert_eq!(request.reason, "I forgot my password");

    let duplicate = submit.execute(&user.email, "again").await;
    assert!(
        matches!(duplicate, Err(MarketError::RequestAlreadyPending)),
        "expected RequestAlreadyPending, got {duplicate:?}"
    );

    let decide = DecideUnlockRequestUseCase {
        unlocks: MockUnlockRepo {
            requests: requests.clone(),
            users: users.clone(),
        },
    };
    decide
        .approve(&anyone(UserRole::Admin), request.id)
        .await
        .unwrap();

    assert!(!users.lock().unwrap()[0].is_locked);
    assert_eq!(requests.lock().unwrap()[0].status, RequestStatus::Approved);

    let again = decide.reject(&anyone(UserRole::Admin), request.id).await;
    assert!(
        matches!(again, Err(MarketError::InvalidState)),
        "expected InvalidState, got {again:?}"
    );
}

// ── Broadcasts ───────────────────────────────────────────────────────────────

fn broadcast(starts_in_hours: i64, expires_in_hours: Option<i64>) -> Broadcast {
    let now = Utc::now();
    Broadcast {
        id: Uuid::new_v4(),
        title: "Maintenance".to_owned(),
        body: "Checkout is offline tonight".to_owned(),
        created_by: Uuid::new_v4(),
        starts_at: now + Duration::hours(starts_in_hours),
        expires_at: expires_in_hours.map(|h| now + Duration::hours(h)),
        is_active: true,
        created_at: now,
    }
}

#[tokio::test]
async fn should_list_only_broadcasts_inside_their_window() {
    let current = broadcast(-1, Some(1));
    let open_ended = broadcast(-1, None);
    let usecase = ListActiveBroadcastsUseCase {
        broadcasts: MockBroadcastRepo::new(vec![
            current.clone(),
            open_ended.clone(),
            broadcast(1, Some(2)),
            broadcast(-2, Some(-1)),
        ]),
    };

    let ids: Vec<Uuid> = usecase.execute().await.unwrap().iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![current.id, open_ended.id]);
}

#[tokio::test]
async fn should_reject_broadcast_expiring_before_start() {
    let usecase = ManageBroadcastsUseCase {
        broadcasts: MockBroadcastRepo::default(),
        audit: MockAuditRepo::empty(),
    };
    let now = Utc::now();
    let input = CreateBroadcastInput {
        title: "Sale".to_owned(),
        body: "Everything half off".to_owned(),
        starts_at: Some(now + Duration::hours(2)),
        expires_at: Some(now + Duration::hours(1)),
    };

    let result = usecase
        .create(&anyone(UserRole::SuperAdmin), input)
        .await;
    assert!(
        matches!(result, Err(MarketError::InvalidInput(_))),
        "expected InvalidInput, got {result:?}"
    );
}

#[tokio::test]
async fn should_let_only_superadmin_manage_broadcasts() {
    let usecase = ManageBroadcastsUseCase {
        broadcasts: MockBroadcastRepo::default(),
        audit: MockAuditRepo::empty(),
    };
    let input = || CreateBroadcastInput {
        title: "Sale".to_owned(),
        body: "Everything half off".to_owned(),
        starts_at: None,
        expires_at: None,
    };

    let result = usecase.create(&anyone(UserRole::Admin), input()).await;
    assert!(
        matches!(result, Err(MarketError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );

    let superadmin = anyone(UserRole::SuperAdmin);
    let created = usecase.create(&superadmin, input()).await.unwrap();
    usecase.deactivate(&superadmin, created.id).await.unwrap();
    let listed = usecase
        .list(&superadmin, PageRequest::default())
        .await
        .unwrap();
    assert!(!listed[0].is_active);
}

// ── Pages ────────────────────────────────────────────────────────────────────

fn about_page() -> PageInput {
    PageInput {
        title: Some("About Us".to_owned()),
        content: Some("We sell lamps.".to_owned()),
        ..Default::default()
    }
}

#[tokio::test]
async fn should_keep_drafts_from_public_view() {
    let pages = MockPageRepo::default();
    let stored = pages.pages_handle();
    let manage = ManagePagesUseCase {
        pages,
        audit: MockAuditRepo::empty(),
    };
    let page = manage
        .create(&anyone(UserRole::Admin), about_page())
        .await
        .unwrap();
    assert_eq!(page.slug, "about-us");
    assert!(!page.is_published);

    let get = GetPageUseCase {
        pages: MockPageRepo {
            pages: stored.clone(),
        },
    };
    let result = get.execute("about-us").await;
    assert!(
        matches!(result, Err(MarketError::PageNotFound)),
        "expected PageNotFound, got {result:?}"
    );

    let list = ListPagesUseCase {
        pages: MockPageRepo {
            pages: stored.clone(),
        },
    };
    assert!(list.execute(None).await.unwrap().is_empty());
    let admin = anyone(UserRole::Admin);
    assert_eq!(list.execute(Some(&admin)).await.unwrap().len(), 1);

    let publish = PageInput {
        is_published: Some(true),
        ..Default::default()
    };
    manage.update(&admin, page.id, publish).await.unwrap();
    assert_eq!(get.execute("about-us").await.unwrap().id, page.id);
}

#[tokio::test]
async fn should_reject_duplicate_page_slug() {
    let manage = ManagePagesUseCase {
        pages: MockPageRepo::default(),
        audit: MockAuditRepo::empty(),
    };
    let admin = anyone(UserRole::Admin);
    manage.create(&admin, about_page()).await.unwrap();

    let result = manage.create(&admin, about_page()).await;
    assert!(
        matches!(result, Err(MarketError::PageSlugTaken)),
        "expected PageSlugTaken, got {result:?}"
    );
}
