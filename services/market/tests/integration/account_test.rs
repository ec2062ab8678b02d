use cmse_auth_types::token::validate_access_token;
use cmse_domain::user::UserRole;
use cmse_market::error::MarketError;
use cmse_market::usecase::account::{
    LoginUseCase, RefreshTokenUseCase, RegisterCustomerInput, RegisterCustomerUseCase,
    RegisterSellerInput, RegisterSellerUseCase,
};
use cmse_testing::auth::TEST_JWT_SECRET;

use crate::helpers::{MockAccountRepo, MockHasher, MockStoreRepo, test_store, test_user};

fn customer_input(email: &str) -> RegisterCustomerInput {
    RegisterCustomerInput {
        email: email.to_owned(),
        password: "correct horse battery".to_owned(),
        full_name: "Amina Patel".to_owned(),
    }
}

fn seller_input(email: &str, its_number: &str) -> RegisterSellerInput {
    RegisterSellerInput {
        email: email.to_owned(),
        password: "correct horse battery".to_owned(),
        full_name: "Yusuf Rao".to_owned(),
        its_number: its_number.to_owned(),
        store_name: "Rao Textiles".to_owned(),
        store_description: Some("  Cotton and silk  ".to_owned()),
    }
}

// ── RegisterCustomerUseCase ──────────────────────────────────────────────────

#[tokio::test]
async fn should_register_customer_with_normalized_email() {
    let accounts = MockAccountRepo::empty();
    let users = accounts.users_handle();
    let usecase = RegisterCustomerUseCase {
        accounts,
        hasher: MockHasher,
    };

    let user = usecase
        .execute(customer_input("  Amina@Example.COM "))
        .await
        .unwrap();

    assert_eq!(user.email, "amina@example.com");
    assert_eq!(user.role, UserRole::Customer);
    assert_ne!(user.password_hash, "correct horse battery");
    assert_eq!(users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_duplicate_email() {
    let mut existing = test_user(UserRole::Customer);
    existing.email = "amina@example.com".to_owned();
    let usecase = RegisterCustomerUseCase {
        accounts: MockAccountRepo::new(vec![existing], vec![]),
        hasher: MockHasher,
    };

    let result = usecase.execute(customer_input("AMINA@example.com")).await;
    assert!(
        matches!(result, Err(MarketError::EmailAlreadyExists)),
        "expected EmailAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_short_password() {
    let usecase = RegisterCustomerUseCase {
        accounts: MockAccountRepo::empty(),
        hasher: MockHasher,
    };

    let result = usecase
        .execute(RegisterCustomerInput {
            password: "short".to_owned(),
            ..customer_input("amina@example.com")
        })
        .await;
    assert!(
        matches!(result, Err(MarketError::WeakPassword)),
        "expected WeakPassword, got {result:?}"
    );
}

// ── RegisterSellerUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_seller_with_store() {
    let accounts = MockAccountRepo::empty();
    let stores = accounts.stores_handle();
    let usecase = RegisterSellerUseCase {
        accounts,
        stores: MockStoreRepo::empty(),
        hasher: MockHasher,
    };

    let (user, store) = usecase
        .execute(seller_input("yusuf@example.com", " 12345678 "))
        .await
        .unwrap();

    assert_eq!(user.role, UserRole::Seller);
    assert_eq!(user.its_number.as_deref(), Some("12345678"));
    assert_eq!(store.owner_id, user.id);
    assert_eq!(store.slug, "rao-textiles");
    assert_eq!(store.description.as_deref(), Some("Cotton and silk"));
    assert!(store.is_active);
    assert_eq!(stores.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_malformed_its_number() {
    let usecase = RegisterSellerUseCase {
        accounts: MockAccountRepo::empty(),
        stores: MockStoreRepo::empty(),
        hasher: MockHasher,
    };

    for its in ["1234567", "123456789", "1234abcd"] {
        let result = usecase.execute(seller_input("yusuf@example.com", its)).await;
        assert!(
            matches!(result, Err(MarketError::InvalidItsNumber)),
            "expected InvalidItsNumber for {its}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_duplicate_its_number() {
    let existing = test_user(UserRole::Seller);
    let usecase = RegisterSellerUseCase {
        accounts: MockAccountRepo::new(vec![existing], vec![]),
        stores: MockStoreRepo::empty(),
        hasher: MockHasher,
    };

    let result = usecase
        .execute(seller_input("yusuf@example.com", "12345678"))
        .await;
    assert!(
        matches!(result, Err(MarketError::ItsNumberAlreadyExists)),
        "expected ItsNumberAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_taken_store_slug() {
    let mut store = test_store(uuid::Uuid::new_v4());
    store.slug = "rao-textiles".to_owned();
    let usecase = RegisterSellerUseCase {
        accounts: MockAccountRepo::empty(),
        stores: MockStoreRepo::new(vec![store]),
        hasher: MockHasher,
    };

    let result = usecase
        .execute(seller_input("yusuf@example.com", "87654321"))
        .await;
    assert!(
        matches!(result, Err(MarketError::StoreSlugTaken)),
        "expected StoreSlugTaken, got {result:?}"
    );
}

// ── LoginUseCase ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_login_and_issue_token_for_role() {
    let user = test_user(UserRole::Seller);
    let usecase = LoginUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![]),
        hasher: MockHasher,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let output = usecase
        .execute(&user.email.to_uppercase(), "correct horse battery")
        .await
        .unwrap();

    let info = validate_access_token(&output.tokens.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.role, UserRole::Seller);
}

#[tokio::test]
async fn should_not_distinguish_unknown_email_from_wrong_password() {
    let user = test_user(UserRole::Customer);
    let usecase = LoginUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![]),
        hasher: MockHasher,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let wrong_password = usecase.execute(&user.email, "incorrect password").await;
    let unknown_email = usecase
        .execute("nobody@example.com", "correct horse battery")
        .await;
    assert!(matches!(wrong_password, Err(MarketError::InvalidCredentials)));
    assert!(matches!(unknown_email, Err(MarketError::InvalidCredentials)));
}

#[tokio::test]
async fn should_refuse_locked_account_only_with_correct_password() {
    let mut user = test_user(UserRole::Customer);
    user.is_locked = true;
    let usecase = LoginUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![]),
        hasher: MockHasher,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let wrong = usecase.execute(&user.email, "incorrect password").await;
    assert!(matches!(wrong, Err(MarketError::InvalidCredentials)));

    let right = usecase.execute(&user.email, "correct horse battery").await;
    assert!(
        matches!(right, Err(MarketError::AccountLocked)),
        "expected AccountLocked, got {:?}",
        right.map(|o| o.user.id)
    );
}

// ── RefreshTokenUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_refresh_with_current_role() {
    let mut user = test_user(UserRole::Customer);
    let login = LoginUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![]),
        hasher: MockHasher,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let tokens = login
        .execute(&user.email, "correct horse battery")
        .await
        .unwrap()
        .tokens;

    // Promoted after the refresh token was issued.
    user.role = UserRole::Seller;
    let usecase = RefreshTokenUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![]),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let pair = usecase.execute(&tokens.refresh_token).await.unwrap();

    let info = validate_access_token(&pair.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.role, UserRole::Seller);
}

#[tokio::test]
async fn should_reject_access_token_as_refresh_token() {
    let user = test_user(UserRole::Customer);
    let login = LoginUseCase {
        accounts: MockAccountRepo::new(vec![user.clone()], vec![]),
        hasher: MockHasher,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let tokens = login
        .execute(&user.email, "correct horse battery")
        .await
        .unwrap()
        .tokens;

    let usecase = RefreshTokenUseCase {
        accounts: MockAccountRepo::new(vec![user], vec![]),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = usecase.execute(&tokens.access_token).await;
    assert!(
        matches!(result, Err(MarketError::Unauthorized)),
        "expected Unauthorized, got {result:?}"
    );
}
