use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use cmse_domain::user::UserRole;
use cmse_market::domain::types::{
    DEFAULT_PRODUCT_LIMIT, RequestStatus, SubscriptionRequest, SubscriptionState,
};
use cmse_market::error::MarketError;
use cmse_market::usecase::subscription::{
    ApproveRequestUseCase, QuoteUpgradeUseCase, RejectRequestUseCase, RequestUpgradeUseCase,
    RevertRequestUseCase,
};

use crate::helpers::{
    MockAccountRepo, MockSubscriptionRepo, anyone, subscribed_profile, test_profile, test_tier,
    test_user,
};

fn request(user_id: Uuid, tier_id: i32, status: RequestStatus) -> SubscriptionRequest {
    SubscriptionRequest {
        id: Uuid::new_v4(),
        user_id,
        requested_tier_id: tier_id,
        status,
        prorated_credit: Decimal::ZERO,
        amount_due: Decimal::ZERO,
        note: Some("please".to_owned()),
        previous: None,
        decided_by: None,
        decided_at: None,
        created_at: Utc::now(),
    }
}

fn approved(
    user_id: Uuid,
    tier_id: i32,
    previous: SubscriptionState,
    days_ago: i64,
) -> SubscriptionRequest {
    SubscriptionRequest {
        previous: Some(previous),
        decided_at: Some(Utc::now() - Duration::days(days_ago)),
        ..request(user_id, tier_id, RequestStatus::Approved)
    }
}

fn unsubscribed(role: UserRole) -> SubscriptionState {
    SubscriptionState {
        tier_id: None,
        role,
        product_limit: DEFAULT_PRODUCT_LIMIT,
        started_at: None,
        expires_at: None,
    }
}

// ── QuoteUpgradeUseCase / RequestUpgradeUseCase ──────────────────────────────

#[tokio::test]
async fn should_charge_full_price_without_subscription() {
    let user = test_user(UserRole::Customer);
    let gold = test_tier(2, 5000, 20, 30);
    let subscriptions = MockSubscriptionRepo::new(vec![gold.clone()], vec![]);
    let stored = subscriptions.requests_handle();
    let usecase = RequestUpgradeUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![test_profile(user.id)]),
        subscriptions,
    };

    let request = usecase.execute(user.id, gold.id, Some(" upgrade ")).await.unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.prorated_credit, Decimal::ZERO);
    assert_eq!(request.amount_due, Decimal::new(5000, 2));
    assert_eq!(request.note.as_deref(), Some("upgrade"));
    assert_eq!(stored.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_credit_unused_days_of_current_tier() {
    let user = test_user(UserRole::Seller);
    let silver = test_tier(1, 3000, 10, 30);
    let gold = test_tier(2, 5000, 20, 30);
    let usecase = QuoteUpgradeUseCase {
        accounts: MockAccountRepo::new(
            vec![user.clone()],
            vec![subscribed_profile(user.id, &silver, 10)],
        ),
        subscriptions: MockSubscriptionRepo::new(vec![silver, gold.clone()], vec![]),
    };

    let quote = usecase.execute(user.id, gold.id).await.unwrap();

    assert_eq!(quote.proration.remaining_days, 10);
    assert_eq!(quote.proration.credit, Decimal::new(1000, 2));
    assert_eq!(quote.proration.amount_due, Decimal::new(4000, 2));
    assert_eq!(quote.current.map(|t| t.id), Some(1));
}

#[tokio::test]
async fn should_reject_downgrade_while_subscribed() {
    let user = test_user(UserRole::Seller);
    let silver = test_tier(1, 3000, 10, 30);
    let gold = test_tier(2, 5000, 20, 30);
    let usecase = RequestUpgradeUseCase {
        accounts: MockAccountRepo::new(
            vec![user.clone()],
            vec![subscribed_profile(user.id, &gold, 10)],
        ),
        subscriptions: MockSubscriptionRepo::new(vec![silver.clone(), gold.clone()], vec![]),
    };

    for tier_id in [silver.id, gold.id] {
        let result = usecase.execute(user.id, tier_id, None).await;
        assert!(
            matches!(result, Err(MarketError::NotAnUpgrade)),
            "expected NotAnUpgrade for tier {tier_id}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_allow_any_tier_after_expiry() {
    let user = test_user(UserRole::Seller);
    let silver = test_tier(1, 3000, 10, 30);
    let gold = test_tier(2, 5000, 20, 30);
    let mut profile = subscribed_profile(user.id, &gold, 10);
    profile.subscription_expires_at = Some(Utc::now() - Duration::days(1));
    let usecase = RequestUpgradeUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![profile]),
        subscriptions: MockSubscriptionRepo::new(vec![silver.clone(), gold], vec![]),
    };

    let request = usecase.execute(user.id, silver.id, None).await.unwrap();
    assert_eq!(request.amount_due, Decimal::new(3000, 2));
}

#[tokio::test]
async fn should_reject_same_tier_after_expiry() {
    let user = test_user(UserRole::Seller);
    let gold = test_tier(2, 5000, 20, 30);
    let mut profile = subscribed_profile(user.id, &gold, 10);
    profile.subscription_expires_at = Some(Utc::now() - Duration::days(1));
    let usecase = RequestUpgradeUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![profile]),
        subscriptions: MockSubscriptionRepo::new(vec![gold.clone()], vec![]),
    };

    let result = usecase.execute(user.id, gold.id, None).await;
    assert!(
        matches!(result, Err(MarketError::NotAnUpgrade)),
        "expected NotAnUpgrade, got {result:?}"
    );
}

#[tokio::test]
async fn should_allow_only_one_pending_request() {
    let user = test_user(UserRole::Customer);
    let gold = test_tier(2, 5000, 20, 30);
    let usecase = RequestUpgradeUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![test_profile(user.id)]),
        subscriptions: MockSubscriptionRepo::new(
            vec![gold.clone()],
            vec![request(user.id, gold.id, RequestStatus::Pending)],
        ),
    };

    let result = usecase.execute(user.id, gold.id, None).await;
    assert!(
        matches!(result, Err(MarketError::RequestAlreadyPending)),
        "expected RequestAlreadyPending, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_offer_inactive_tier() {
    let user = test_user(UserRole::Customer);
    let mut retired = test_tier(3, 9000, 50, 30);
    retired.is_active = false;
    let usecase = RequestUpgradeUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![test_profile(user.id)]),
        subscriptions: MockSubscriptionRepo::new(vec![retired], vec![]),
    };

    let result = usecase.execute(user.id, 3, None).await;
    assert!(
        matches!(result, Err(MarketError::TierNotFound)),
        "expected TierNotFound, got {result:?}"
    );
}

// ── ApproveRequestUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_promote_customer_and_grant_tier_limit() {
    let user = test_user(UserRole::Customer);
    let gold = test_tier(2, 5000, 20, 30);
    let pending = request(user.id, gold.id, RequestStatus::Pending);
    let subscriptions = MockSubscriptionRepo::new(vec![gold.clone()], vec![pending.clone()]);
    let stored = subscriptions.requests_handle();
    let applied = subscriptions.applied_handle();
    let usecase = ApproveRequestUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![test_profile(user.id)]),
        subscriptions,
    };

    let grant = usecase
        .execute(&anyone(UserRole::Admin), pending.id)
        .await
        .unwrap();

    assert_eq!(grant.role, UserRole::Seller);
    assert_eq!(grant.tier_id, Some(gold.id));
    assert_eq!(grant.product_limit, 20);
    let (started, expires) = (grant.started_at.unwrap(), grant.expires_at.unwrap());
    assert_eq!(expires - started, Duration::days(30));

    let stored = stored.lock().unwrap();
    assert_eq!(stored[0].status, RequestStatus::Approved);
    assert_eq!(stored[0].previous, Some(unsubscribed(UserRole::Customer)));
    assert_eq!(applied.lock().unwrap()[0], (user.id, grant));
}

#[tokio::test]
async fn should_keep_admin_role_on_approval() {
    let user = test_user(UserRole::Admin);
    let gold = test_tier(2, 5000, 20, 30);
    let pending = request(user.id, gold.id, RequestStatus::Pending);
    let usecase = ApproveRequestUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![test_profile(user.id)]),
        subscriptions: MockSubscriptionRepo::new(vec![gold], vec![pending.clone()]),
    };

    let grant = usecase
        .execute(&anyone(UserRole::SuperAdmin), pending.id)
        .await
        .unwrap();
    assert_eq!(grant.role, UserRole::Admin);
}

#[tokio::test]
async fn should_forbid_approval_by_seller() {
    let user = test_user(UserRole::Customer);
    let gold = test_tier(2, 5000, 20, 30);
    let pending = request(user.id, gold.id, RequestStatus::Pending);
    let usecase = ApproveRequestUseCase {
        accounts: MockAccountRepo::new(vec![user], vec![]),
        subscriptions: MockSubscriptionRepo::new(vec![gold], vec![pending.clone()]),
    };

    let result = usecase.execute(&anyone(UserRole::Seller), pending.id).await;
    assert!(
        matches!(result, Err(MarketError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_approve_twice() {
    let user = test_user(UserRole::Customer);
    let gold = test_tier(2, 5000, 20, 30);
    let done = approved(user.id, gold.id, unsubscribed(UserRole::Customer), 1);
    let usecase = ApproveRequestUseCase {
        accounts: MockAccountRepo::new(vec![user], vec![]),
        subscriptions: MockSubscriptionRepo::new(vec![gold], vec![done.clone()]),
    };

    let result = usecase.execute(&anyone(UserRole::Admin), done.id).await;
    assert!(
        matches!(result, Err(MarketError::InvalidState)),
        "expected InvalidState, got {result:?}"
    );
}

// ── RejectRequestUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_reject_reason_as_note() {
    let admin = anyone(UserRole::Admin);
    let pending = request(Uuid::new_v4(), 2, RequestStatus::Pending);
    let subscriptions =
        MockSubscriptionRepo::new(vec![test_tier(2, 5000, 20, 30)], vec![pending.clone()]);
    let stored = subscriptions.requests_handle();
    let usecase = RejectRequestUseCase { subscriptions };

    usecase
        .execute(&admin, pending.id, Some("payment not received"))
        .await
        .unwrap();

    let stored = stored.lock().unwrap();
    assert_eq!(stored[0].status, RequestStatus::Rejected);
    assert_eq!(stored[0].note.as_deref(), Some("payment not received"));
    assert_eq!(stored[0].decided_by, Some(admin.user_id));
}

// ── RevertRequestUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_restore_previous_state_on_revert() {
    let user_id = Uuid::new_v4();
    let gold = test_tier(2, 5000, 20, 30);
    let latest = approved(user_id, gold.id, unsubscribed(UserRole::Customer), 0);
    let subscriptions = MockSubscriptionRepo::new(vec![gold], vec![latest.clone()]);
    let stored = subscriptions.requests_handle();
    let applied = subscriptions.applied_handle();
    let usecase = RevertRequestUseCase { subscriptions };

    let restored = usecase
        .execute(&anyone(UserRole::SuperAdmin), latest.id)
        .await
        .unwrap();

    assert_eq!(restored, unsubscribed(UserRole::Customer));
    assert_eq!(stored.lock().unwrap()[0].status, RequestStatus::Reverted);
    assert_eq!(applied.lock().unwrap()[0], (user_id, restored));
}

#[tokio::test]
async fn should_restore_current_limit_of_previous_tier() {
    let user_id = Uuid::new_v4();
    let mut silver = test_tier(1, 3000, 10, 30);
    let gold = test_tier(2, 5000, 20, 30);
    let previous = SubscriptionState {
        tier_id: Some(silver.id),
        role: UserRole::Seller,
        product_limit: 10,
        started_at: Some(Utc::now() - Duration::days(5)),
        expires_at: Some(Utc::now() + Duration::days(25)),
    };
    // Silver's limit was raised after the upgrade.
    silver.product_limit = 12;
    let latest = approved(user_id, gold.id, previous.clone(), 0);
    let usecase = RevertRequestUseCase {
        subscriptions: MockSubscriptionRepo::new(vec![silver, gold], vec![latest.clone()]),
    };

    let restored = usecase
        .execute(&anyone(UserRole::SuperAdmin), latest.id)
        .await
        .unwrap();

    assert_eq!(restored.product_limit, 12);
    assert_eq!(restored.tier_id, previous.tier_id);
    assert_eq!(restored.expires_at, previous.expires_at);
}

#[tokio::test]
async fn should_only_revert_latest_approval() {
    let user_id = Uuid::new_v4();
    let silver = test_tier(1, 3000, 10, 30);
    let gold = test_tier(2, 5000, 20, 30);
    let older = approved(user_id, silver.id, unsubscribed(UserRole::Customer), 10);
    let newer = approved(user_id, gold.id, unsubscribed(UserRole::Seller), 1);
    let usecase = RevertRequestUseCase {
        subscriptions: MockSubscriptionRepo::new(vec![silver, gold], vec![older.clone(), newer]),
    };

    let result = usecase.execute(&anyone(UserRole::SuperAdmin), older.id).await;
    assert!(
        matches!(result, Err(MarketError::InvalidState)),
        "expected InvalidState, got {result:?}"
    );
}

#[tokio::test]
async fn should_forbid_revert_by_admin() {
    let latest = approved(Uuid::new_v4(), 2, unsubscribed(UserRole::Customer), 0);
    let usecase = RevertRequestUseCase {
        subscriptions: MockSubscriptionRepo::new(
            vec![test_tier(2, 5000, 20, 30)],
            vec![latest.clone()],
        ),
    };

    let result = usecase.execute(&anyone(UserRole::Admin), latest.id).await;
    assert!(
        matches!(result, Err(MarketError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
}
