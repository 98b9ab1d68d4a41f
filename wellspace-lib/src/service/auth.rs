//! Registration, login and identity

use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::auth::TokenSigner;
use crate::auth::verify_request_token;
use crate::error::Error;
use crate::error::StoreError;
use crate::model::LoginInput;
use crate::model::RegisterInput;
use crate::model::User;
use crate::model::UserId;
use crate::model::normalize_email;
use crate::response::AuthPayload;
use crate::store::NewUser;
use crate::store::UserStore;
use crate::validation::sanitize_input;
use crate::validation::schemas;
use crate::validation::server_validation_failure;
use crate::validation::validate_form;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "User with this email already exists";

/// Account operations.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    signer: TokenSigner,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, signer: TokenSigner) -> Self {
        Self {
            users,
            signer,
            hasher: PasswordHasher::default(),
        }
    }

    /// Replaces the password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Creates an account and signs it in.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthPayload, Error> {
        let input = RegisterInput {
            name: sanitize_input(&input.name),
            email: normalize_email(&input.email),
            ..input
        };
        let result = validate_form(&input.to_form_data(), &schemas::register());
        if !result.is_valid {
            return Err(server_validation_failure(result.errors));
        }

        if self.users.find_user_by_email(&input.email).await?.is_some() {
            return Err(Error::invalid_field(schemas::EMAIL, EMAIL_TAKEN));
        }

        let password_hash = self.hasher.hash_async(&input.password).await?;
        let user = self
            .users
            .create_user(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => Error::invalid_field(schemas::EMAIL, EMAIL_TAKEN),
                other => other.into(),
            })?;

        log::info!("Registered user {}", user.id);
        let token = self.signer.issue(user.id)?;
        Ok(AuthPayload { user, token })
    }

    /// Checks credentials and issues a token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, input: LoginInput) -> Result<AuthPayload, Error> {
        let input = LoginInput {
            email: normalize_email(&input.email),
            ..input
        };
        let result = validate_form(&input.to_form_data(), &schemas::login());
        if !result.is_valid {
            return Err(server_validation_failure(result.errors));
        }

        let Some(record) = self.users.find_user_by_email(&input.email).await? else {
            log::debug!("Login for unknown email");
            return Err(Error::Authentication(INVALID_CREDENTIALS.to_string()));
        };
        if !self
            .hasher
            .verify_async(&input.password, &record.password_hash)
            .await?
        {
            log::debug!("Wrong password for user {}", record.user.id);
            return Err(Error::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.signer.issue(record.user.id)?;
        Ok(AuthPayload {
            user: record.user,
            token,
        })
    }

    /// Returns the user behind an authenticated request.
    pub async fn me(&self, user: UserId) -> Result<User, Error> {
        self.users
            .find_user_by_id(user)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Resolves the caller from the `Authorization` and `Cookie` headers.
    pub fn authenticate(&self, authorization: Option<&str>, cookie: Option<&str>) -> Option<UserId> {
        verify_request_token(&self.signer, authorization, cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::store::InMemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryStore::new()),
            TokenSigner::new("test-secret").unwrap(),
        )
        .with_hasher(PasswordHasher::with_params(1024, 1, 1).unwrap())
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            name: "  Ada   Lovelace ".into(),
            email: email.into(),
            password: "Secret123".into(),
            confirm_password: "Secret123".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let registered = service
            .register(register_input("Ada@Example.com "))
            .await
            .unwrap();
        assert_eq!(registered.user.name, "Ada Lovelace");
        assert_eq!(registered.user.email, "ada@example.com");
        assert_eq!(
            service.signer().verify(&registered.token).unwrap().user_id().unwrap(),
            registered.user.id
        );

        let login = service
            .login(LoginInput {
                email: "ADA@example.com".into(),
                password: "Secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user, registered.user);

        let header = format!("Bearer {}", login.token);
        let id = service.authenticate(Some(&header), None).unwrap();
        assert_eq!(service.me(id).await.unwrap(), registered.user);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let mut input = register_input("ada@example.com");
        input.confirm_password = "Other123".into();
        input.password = "weak".into();
        let err = service().register(input).await.unwrap_err();

        let errors = err.field_errors().unwrap();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let service = service();
        service.register(register_input("ada@example.com")).await.unwrap();
        let err = service
            .register(register_input("ADA@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.field_errors().and_then(|e| e.get("email")), Some(EMAIL_TAKEN));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(register_input("ada@example.com")).await.unwrap();

        let wrong_password = service
            .login(LoginInput {
                email: "ada@example.com".into(),
                password: "Wrong123".into(),
            })
            .await
            .unwrap_err();
        let unknown = service
            .login(LoginInput {
                email: "bob@example.com".into(),
                password: "Secret123".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.kind(), ErrorKind::Authentication);
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_me_for_unknown_user() {
        let err = service().me(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
