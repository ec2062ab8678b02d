use chrono::Utc;
use uuid::Uuid;

use cmse_auth_types::token::{TokenKind, issue_token, validate_refresh_token};
use cmse_domain::account::{is_acceptable_password, is_valid_its_number, normalize_email};
use cmse_domain::slug::slugify;
use cmse_domain::user::UserRole;

use crate::domain::repository::{
    AccountRepository, FileStorage, NewAccount, PasswordHasher, StoreRepository,
    SubscriptionRepository,
};
use crate::domain::types::{DEFAULT_PRODUCT_LIMIT, Profile, ProfileUpdate, Store, Tier, User};
use crate::domain::upload::{UploadKind, check_size, image_extension, storage_key};
use crate::error::MarketError;
use crate::usecase::{optional_text, required_text};

const MAX_NAME_CHARS: usize = 200;

/// Email, password and display name shared by both registration flows.
struct Credentials {
    email: String,
    password_hash: String,
    full_name: String,
}

async fn check_credentials<A: AccountRepository, H: PasswordHasher>(
    accounts: &A,
    hasher: &H,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<Credentials, MarketError> {
    let email = normalize_email(email).ok_or(MarketError::InvalidEmail)?;
    if !is_acceptable_password(password) {
        return Err(MarketError::WeakPassword);
    }
    let full_name = required_text(full_name, MAX_NAME_CHARS, "full name is too long")?;
    if accounts.find_user_by_email(&email).await?.is_some() {
        return Err(MarketError::EmailAlreadyExists);
    }
    Ok(Credentials {
        email,
        password_hash: hasher.hash(password)?,
        full_name,
    })
}

fn new_user(credentials: Credentials, role: UserRole, its_number: Option<String>) -> User {
    let now = Utc::now();
    User {
        id: Uuid::now_v7(),
        email: credentials.email,
        password_hash: credentials.password_hash,
        full_name: credentials.full_name,
        role,
        its_number,
        is_locked: false,
        created_at: now,
        updated_at: now,
    }
}

// ── RegisterCustomer ─────────────────────────────────────────────────────────

pub struct RegisterCustomerInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub struct RegisterCustomerUseCase<A: AccountRepository, H: PasswordHasher> {
    pub accounts: A,
    pub hasher: H,
}

impl<A: AccountRepository, H: PasswordHasher> RegisterCustomerUseCase<A, H> {
    pub async fn execute(&self, input: RegisterCustomerInput) -> Result<User, MarketError> {
        let credentials = check_credentials(
            &self.accounts,
            &self.hasher,
            &input.email,
            &input.password,
            &input.full_name,
        )
        .await?;
        let user = new_user(credentials, UserRole::Customer, None);
        let account = NewAccount {
            profile: Profile::empty(user.id, DEFAULT_PRODUCT_LIMIT, user.created_at),
            user,
            store: None,
        };
        self.accounts.create_account(&account).await?;
        tracing::info!(user_id = %account.user.id, "customer registered");
        Ok(account.user)
    }
}

// ── RegisterSeller ───────────────────────────────────────────────────────────

pub struct RegisterSellerInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub its_number: String,
    pub store_name: String,
    pub store_description: Option<String>,
}

pub struct RegisterSellerUseCase<A: AccountRepository, S: StoreRepository, H: PasswordHasher> {
    pub accounts: A,
    pub stores: S,
    pub hasher: H,
}

impl<A: AccountRepository, S: StoreRepository, H: PasswordHasher> RegisterSellerUseCase<A, S, H> {
    pub async fn execute(&self, input: RegisterSellerInput) -> Result<(User, Store), MarketError> {
        let its_number = input.its_number.trim().to_owned();
        if !is_valid_its_number(&its_number) {
            return Err(MarketError::InvalidItsNumber);
        }
        let store_name = required_text(&input.store_name, 120, "store name is too long")?;
        let slug = slugify(&store_name);
        if slug.is_empty() {
            return Err(MarketError::InvalidInput(
                "store name must contain letters or digits",
            ));
        }
        let description = optional_text(
            input.store_description.as_deref(),
            4000,
            "store description is too long",
        )?;

        let credentials = check_credentials(
            &self.accounts,
            &self.hasher,
            &input.email,
            &input.password,
            &input.full_name,
        )
        .await?;
        if self.accounts.its_number_exists(&its_number).await? {
            return Err(MarketError::ItsNumberAlreadyExists);
        }
        if self.stores.slug_taken(&slug, None).await? {
            return Err(MarketError::StoreSlugTaken);
        }

        let contact_email = credentials.email.clone();
        let user = new_user(credentials, UserRole::Seller, Some(its_number));
        let store = Store {
            id: Uuid::now_v7(),
            owner_id: user.id,
            name: store_name,
            slug,
            description,
            contact_email: Some(contact_email),
            is_active: true,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        let account = NewAccount {
            profile: Profile::empty(user.id, DEFAULT_PRODUCT_LIMIT, user.created_at),
            user,
            store: Some(store.clone()),
        };
        self.accounts.create_account(&account).await?;
        tracing::info!(user_id = %account.user.id, store_id = %store.id, "seller registered");
        Ok((account.user, store))
    }
}

// ── Login / Refresh ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

pub fn issue_token_pair(user: &User, jwt_secret: &str) -> Result<TokenPair, MarketError> {
    let sign = |kind| {
        issue_token(user.id, user.role, kind, jwt_secret)
            .map_err(|e| MarketError::Internal(anyhow::Error::new(e).context("issue token")))
    };
    let (access_token, access_token_exp) = sign(TokenKind::Access)?;
    let (refresh_token, _) = sign(TokenKind::Refresh)?;
    Ok(TokenPair {
        access_token,
        access_token_exp,
        refresh_token,
    })
}

pub struct LoginOutput {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct LoginUseCase<A: AccountRepository, H: PasswordHasher> {
    pub accounts: A,
    pub hasher: H,
    pub jwt_secret: String,
}

impl<A: AccountRepository, H: PasswordHasher> LoginUseCase<A, H> {
    pub async fn execute(&self, email: &str, password: &str) -> Result<LoginOutput, MarketError> {
        let email = normalize_email(email).ok_or(MarketError::InvalidCredentials)?;
        let user = self
            .accounts
            .find_user_by_email(&email)
            .await?
            .ok_or(MarketError::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(MarketError::InvalidCredentials);
        }
        // Lock status is only revealed to someone who knows the password.
        if user.is_locked {
            return Err(MarketError::AccountLocked);
        }
        let tokens = issue_token_pair(&user, &self.jwt_secret)?;
        Ok(LoginOutput { user, tokens })
    }
}

pub struct RefreshTokenUseCase<A: AccountRepository> {
    pub accounts: A,
    pub jwt_secret: String,
}

impl<A: AccountRepository> RefreshTokenUseCase<A> {
    pub async fn execute(&self, refresh_token: &str) -> Result<TokenPair, MarketError> {
        let info = validate_refresh_token(refresh_token, &self.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "rejected refresh token");
            MarketError::Unauthorized
        })?;
        let user = self
            .accounts
            .find_user(info.user_id)
            .await?
            .ok_or(MarketError::Unauthorized)?;
        if user.is_locked {
            return Err(MarketError::AccountLocked);
        }
        issue_token_pair(&user, &self.jwt_secret)
    }
}

// ── Me / UpdateProfile ───────────────────────────────────────────────────────

pub struct MeOutput {
    pub user: User,
    pub profile: Profile,
    pub tier: Option<Tier>,
}

pub struct GetMeUseCase<A: AccountRepository, T: SubscriptionRepository> {
    pub accounts: A,
    pub subscriptions: T,
}

impl<A: AccountRepository, T: SubscriptionRepository> GetMeUseCase<A, T> {
    pub async fn execute(&self, user_id: Uuid) -> Result<MeOutput, MarketError> {
        let user = self
            .accounts
            .find_user(user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;
        let profile = self
            .accounts
            .find_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id, DEFAULT_PRODUCT_LIMIT, user.created_at));
        let tier = match profile.tier_id {
            Some(id) => self.subscriptions.find_tier(id).await?,
            None => None,
        };
        Ok(MeOutput {
            user,
            profile,
            tier,
        })
    }
}

pub struct UpdateProfileUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> UpdateProfileUseCase<A> {
    pub async fn execute(&self, user_id: Uuid, input: ProfileUpdate) -> Result<(), MarketError> {
        if input.is_empty() {
            return Err(MarketError::MissingData);
        }
        let update = ProfileUpdate {
            full_name: input
                .full_name
                .as_deref()
                .map(|n| required_text(n, MAX_NAME_CHARS, "full name is too long"))
                .transpose()?,
            phone: input
                .phone
                .as_deref()
                .map(|p| p.trim().chars().take(32).collect()),
            address: input.address.as_deref().map(|a| a.trim().to_owned()),
        };
        if self.accounts.find_user(user_id).await?.is_none() {
            return Err(MarketError::UserNotFound);
        }
        self.accounts.update_profile(user_id, &update).await
    }
}

// ── UploadProfileImage ───────────────────────────────────────────────────────

pub struct UploadProfileImageUseCase<A: AccountRepository, F: FileStorage> {
    pub accounts: A,
    pub storage: F,
    pub max_upload_bytes: usize,
}

impl<A: AccountRepository, F: FileStorage> UploadProfileImageUseCase<A, F> {
    /// Saves the file as the pending image and returns its key.
    pub async fn execute(
        &self,
        user_id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, MarketError> {
        let ext = image_extension(filename)?;
        check_size(bytes.len(), self.max_upload_bytes)?;
        let key = storage_key(UploadKind::Profile, user_id, &ext);
        self.storage.save(&key, bytes).await?;
        let replaced = self.accounts.set_pending_image(user_id, &key).await?;
        if let Some(old) = replaced {
            if let Err(e) = self.storage.delete(&old).await {
                tracing::warn!(error = ?e, key = %old, "failed to delete replaced pending image");
            }
        }
        Ok(key)
    }
}
