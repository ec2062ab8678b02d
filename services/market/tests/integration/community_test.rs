use rust_decimal::Decimal;
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;
use cmse_market::domain::order::OrderStatus;
use cmse_market::domain::types::ProductStatus;
use cmse_market::error::MarketError;
use cmse_market::usecase::chat::{InboxUseCase, MarkReadUseCase, SendMessageUseCase};
use cmse_market::usecase::review::{
    CreateReviewInput, CreateReviewUseCase, DeleteReviewUseCase, ListReviewsUseCase,
};

use crate::helpers::{
    MockAccountRepo, MockAuditRepo, MockChatRepo, MockOrderRepo, MockProductRepo,
    MockReviewRepo, anyone, test_order, test_product, test_user,
};

fn five_stars() -> CreateReviewInput {
    CreateReviewInput {
        rating: 5,
        comment: Some("  Bright and sturdy  ".to_owned()),
    }
}

// ── CreateReviewUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_review_after_purchase() {
    let buyer = test_user(UserRole::Customer);
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let order = test_order(buyer.id, &lamp, OrderStatus::Completed);
    let usecase = CreateReviewUseCase {
        reviews: MockReviewRepo::default(),
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::with_orders(vec![order], vec![lamp.clone()]),
    };

    let review = usecase.execute(buyer.id, lamp.id, five_stars()).await.unwrap();

    assert_eq!(review.rating, 5);
    assert_eq!(review.comment.as_deref(), Some("Bright and sturdy"));
}

#[tokio::test]
async fn should_reject_review_without_purchase() {
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let usecase = CreateReviewUseCase {
        reviews: MockReviewRepo::default(),
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::new(vec![lamp.clone()]),
    };

    let result = usecase.execute(Uuid::new_v4(), lamp.id, five_stars()).await;
    assert!(
        matches!(result, Err(MarketError::NotPurchased)),
        "expected NotPurchased, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_count_cancelled_order_as_purchase() {
    let buyer = test_user(UserRole::Customer);
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let order = test_order(buyer.id, &lamp, OrderStatus::Cancelled);
    let usecase = CreateReviewUseCase {
        reviews: MockReviewRepo::default(),
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::with_orders(vec![order], vec![lamp.clone()]),
    };

    let result = usecase.execute(buyer.id, lamp.id, five_stars()).await;
    assert!(
        matches!(result, Err(MarketError::NotPurchased)),
        "expected NotPurchased, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_second_review_of_same_product() {
    let buyer = test_user(UserRole::Customer);
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let order = test_order(buyer.id, &lamp, OrderStatus::Shipped);
    let usecase = CreateReviewUseCase {
        reviews: MockReviewRepo::default(),
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::with_orders(vec![order], vec![lamp.clone()]),
    };
    usecase.execute(buyer.id, lamp.id, five_stars()).await.unwrap();

    let result = usecase.execute(buyer.id, lamp.id, five_stars()).await;
    assert!(
        matches!(result, Err(MarketError::ReviewAlreadyExists)),
        "expected ReviewAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_rating_out_of_range() {
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let usecase = CreateReviewUseCase {
        reviews: MockReviewRepo::default(),
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::new(vec![lamp.clone()]),
    };

    for rating in [0, 6] {
        let input = CreateReviewInput {
            rating,
            comment: None,
        };
        let result = usecase.execute(Uuid::new_v4(), lamp.id, input).await;
        assert!(
            matches!(result, Err(MarketError::InvalidInput(_))),
            "expected InvalidInput for {rating}, got {result:?}"
        );
    }
}

// ── ListReviewsUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_average_ratings_for_product() {
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let reviews = MockReviewRepo::default();
    let stored = reviews.reviews_handle();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let create = CreateReviewUseCase {
        reviews,
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::with_orders(
            vec![
                test_order(alice, &lamp, OrderStatus::Completed),
                test_order(bob, &lamp, OrderStatus::Completed),
            ],
            vec![lamp.clone()],
        ),
    };
    for (user, rating) in [(alice, 5), (bob, 2)] {
        let input = CreateReviewInput {
            rating,
            comment: None,
        };
        create.execute(user, lamp.id, input).await.unwrap();
    }
    let usecase = ListReviewsUseCase {
        reviews: MockReviewRepo {
            reviews: stored,
        },
        products: MockProductRepo::new(vec![lamp.clone()]),
    };

    let listed = usecase.execute(lamp.id, PageRequest::default()).await.unwrap();

    assert_eq!(listed.reviews.len(), 2);
    assert_eq!(listed.stats.count, 2);
    assert_eq!(listed.stats.average, Some(Decimal::new(350, 2)));
}

// ── DeleteReviewUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_only_author_or_admin_delete_review() {
    let buyer = test_user(UserRole::Customer);
    let lamp = test_product(Uuid::new_v4(), 1250, 5, ProductStatus::Approved);
    let reviews = MockReviewRepo::default();
    let stored = reviews.reviews_handle();
    let review = CreateReviewUseCase {
        reviews,
        products: MockProductRepo::new(vec![lamp.clone()]),
        orders: MockOrderRepo::with_orders(
            vec![test_order(buyer.id, &lamp, OrderStatus::Completed)],
            vec![lamp.clone()],
        ),
    }
    .execute(buyer.id, lamp.id, five_stars())
    .await
    .unwrap();
    let audit = MockAuditRepo::empty();
    let entries = audit.entries_handle();
    let usecase = DeleteReviewUseCase {
        reviews: MockReviewRepo {
            reviews: stored.clone(),
        },
        audit,
    };

    let result = usecase
        .execute(&anyone(UserRole::Customer), review.id)
        .await;
    assert!(
        matches!(result, Err(MarketError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );

    usecase
        .execute(&anyone(UserRole::Admin), review.id)
        .await
        .unwrap();
    assert!(stored.lock().unwrap().is_empty());
    assert_eq!(entries.lock().unwrap()[0].action, "review.delete");
}

// ── Chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_trimmed_message_to_existing_user() {
    let (alice, bob) = (test_user(UserRole::Customer), test_user(UserRole::Seller));
    let usecase = SendMessageUseCase {
        chat: MockChatRepo::default(),
        accounts: MockAccountRepo::new(vec![alice.clone(), bob.clone()], vec![]),
    };

    let message = usecase
        .execute(alice.id, bob.id, "  Is the lamp still available?  ")
        .await
        .unwrap();
    assert_eq!(message.body, "Is the lamp still available?");
    assert!(message.read_at.is_none());
}

#[tokio::test]
async fn should_reject_message_to_self_unknown_or_blank() {
    let alice = test_user(UserRole::Customer);
    let usecase = SendMessageUseCase {
        chat: MockChatRepo::default(),
        accounts: MockAccountRepo::new(vec![alice.clone()], vec![]),
    };

    let to_self = usecase.execute(alice.id, alice.id, "hi").await;
    assert!(
        matches!(to_self, Err(MarketError::InvalidInput(_))),
        "expected InvalidInput, got {to_self:?}"
    );
    let unknown = usecase.execute(alice.id, Uuid::new_v4(), "hi").await;
    assert!(
        matches!(unknown, Err(MarketError::UserNotFound)),
        "expected UserNotFound, got {unknown:?}"
    );
    let blank = usecase.execute(alice.id, Uuid::new_v4(), "   ").await;
    assert!(
        matches!(blank, Err(MarketError::MissingData)),
        "expected MissingData, got {blank:?}"
    );
}

#[tokio::test]
async fn should_mark_read_only_for_recipient() {
    let (alice, bob) = (test_user(UserRole::Customer), test_user(UserRole::Seller));
    let chat = MockChatRepo::default();
    let messages = chat.messages_handle();
    let message = SendMessageUseCase {
        chat,
        accounts: MockAccountRepo::new(vec![alice.clone(), bob.clone()], vec![]),
    }
    .execute(alice.id, bob.id, "hello")
    .await
    .unwrap();
    let usecase = MarkReadUseCase {
        chat: MockChatRepo {
            messages: messages.clone(),
        },
    };

    let by_sender = usecase.execute(alice.id, message.id).await;
    assert!(
        matches!(by_sender, Err(MarketError::Forbidden)),
        "expected Forbidden, got {by_sender:?}"
    );
    let by_stranger = usecase.execute(Uuid::new_v4(), message.id).await;
    assert!(
        matches!(by_stranger, Err(MarketError::MessageNotFound)),
        "expected MessageNotFound, got {by_stranger:?}"
    );

    usecase.execute(bob.id, message.id).await.unwrap();
    let first_read = messages.lock().unwrap()[0].read_at;
    assert!(first_read.is_some());

    usecase.execute(bob.id, message.id).await.unwrap();
    assert_eq!(messages.lock().unwrap()[0].read_at, first_read);
}

#[tokio::test]
async fn should_count_unread_in_inbox() {
    let (alice, bob) = (test_user(UserRole::Customer), test_user(UserRole::Seller));
    let chat = MockChatRepo::default();
    let messages = chat.messages_handle();
    let send = SendMessageUseCase {
        chat,
        accounts: MockAccountRepo::new(vec![alice.clone(), bob.clone()], vec![]),
    };
    let first = send.execute(alice.id, bob.id, "one").await.unwrap();
    send.execute(alice.id, bob.id, "two").await.unwrap();
    send.execute(bob.id, alice.id, "reply").await.unwrap();
    MarkReadUseCase {
        chat: MockChatRepo {
            messages: messages.clone(),
        },
    }
    .execute(bob.id, first.id)
    .await
    .unwrap();

    let inbox = InboxUseCase {
        chat: MockChatRepo { messages },
    }
    .execute(bob.id, PageRequest::default())
    .await
    .unwrap();

    assert_eq!(inbox.messages.len(), 2);
    assert_eq!(inbox.messages[0].body, "two");
    assert_eq!(inbox.unread, 1);
}

#[tokio::test]
async fn should_hide_message_from_uninvolved_admin() {
    let (alice, bob) = (test_user(UserRole::Customer), test_user(UserRole::Seller));
    let chat = MockChatRepo::default();
    let messages = chat.messages_handle();
    let message = SendMessageUseCase {
        chat,
        accounts: MockAccountRepo::new(vec![alice.clone(), bob.clone()], vec![]),
    }
    .execute(alice.id, bob.id, "private")
    .await
    .unwrap();

    let admin = anyone(UserRole::Admin);
    let result = MarkReadUseCase {
        chat: MockChatRepo { messages },
    }
    .execute(admin.user_id, message.id)
    .await;
    assert!(
        matches!(result, Err(MarketError::MessageNotFound)),
        "expected MessageNotFound, got {result:?}"
    );
}
