//! Authentication route handlers.
//!
//! Login (by username or email), signup, logout and the password reset flow.
//! Form failures redirect back to the form with an `error` code in the query
//! string; the page turns the code into a message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::found;
use crate::services::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data. `login` is a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<&'static str>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "forgot-password.html")]
pub struct ForgotPasswordTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "reset-password.html")]
pub struct ResetPasswordTemplate {
    pub user: Option<CurrentUser>,
    pub token: String,
    /// `false` when the link is unknown or expired; the form is hidden.
    pub token_valid: bool,
    pub error: Option<&'static str>,
}

fn message(code: Option<&str>) -> Option<&'static str> {
    let text = match code? {
        "credentials" => "Nom d'utilisateur ou mot de passe incorrect.",
        "password_mismatch" => "Les mots de passe ne correspondent pas.",
        "password_too_short" => "Le mot de passe doit contenir au moins 8 caractères.",
        "invalid_email" => "Adresse e-mail invalide.",
        "invalid_username" => "Nom d'utilisateur invalide.",
        "user_exists" => "Ce nom d'utilisateur ou cet e-mail est déjà utilisé.",
        "invalid_token" => "Ce lien de réinitialisation est invalide ou a expiré.",
        "sent" => "Si un compte existe pour cette adresse, un lien vous a été envoyé.",
        "password_reset" => "Votre mot de passe a été modifié. Vous pouvez vous connecter.",
        _ => "Une erreur est survenue. Veuillez réessayer.",
    };
    Some(text)
}

/// Map a service error to the code shown on the form, or pass it on.
fn error_code(err: AuthError) -> Result<&'static str, AppError> {
    match err {
        AuthError::InvalidCredentials => Ok("credentials"),
        AuthError::WeakPassword(_) => Ok("password_too_short"),
        AuthError::InvalidEmail(_) => Ok("invalid_email"),
        AuthError::InvalidUsername(_) => Ok("invalid_username"),
        AuthError::UserAlreadyExists => Ok("user_exists"),
        AuthError::InvalidToken | AuthError::ExpiredToken => Ok("invalid_token"),
        other => Err(other.into()),
    }
}

async fn log_in(session: &Session, user: CurrentUser) -> Result<Response, AppError> {
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(found("/"))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return found("/");
    }

    LoginTemplate {
        user,
        error: message(query.error.as_deref()),
        success: message(query.success.as_deref()),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.store())
        .authenticate(&form.login, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user logged in");
            log_in(&session, CurrentUser::from(&user)).await
        }
        Err(e) => {
            let code = error_code(e)?;
            tracing::info!(code, "login failed");
            Ok(found(&format!("/login?error={code}")))
        }
    }
}

/// Log the user out.
pub async fn logout(session: Session) -> Result<Response, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(found("/login"))
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn signup_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return found("/");
    }

    RegisterTemplate {
        user,
        error: message(query.error.as_deref()),
    }
    .into_response()
}

/// Handle registration form submission. A new account is logged in at once.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(found("/signup?error=password_mismatch"));
    }

    let registration = Registration {
        username: form.username,
        email: form.email,
        password: form.password,
        first_name: form.first_name,
        last_name: form.last_name,
    };

    match AuthService::new(state.store()).register(&registration).await {
        Ok(user) => log_in(&session, CurrentUser::from(&user)).await,
        Err(e) => {
            let code = error_code(e)?;
            Ok(found(&format!("/signup?error={code}")))
        }
    }
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return found("/");
    }

    ForgotPasswordTemplate {
        user,
        error: message(query.error.as_deref()),
        success: message(query.success.as_deref()),
    }
    .into_response()
}

/// Issue a reset token and mail the link.
///
/// The response is the same whether or not the address has an account.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    let issued = match AuthService::new(state.store())
        .request_password_reset(&form.email)
        .await
    {
        Ok(issued) => issued,
        Err(e) => {
            let code = error_code(e)?;
            return Ok(found(&format!("/forgot-password?error={code}")));
        }
    };

    if let Some((user, token)) = issued {
        let reset_url = format!(
            "{}/reset-password/{}",
            state.config().base_url,
            token.token
        );

        match state.email() {
            Some(mailer) => {
                if let Err(e) = mailer
                    .send_password_reset(user.email.as_str(), &user.display_name(), &reset_url)
                    .await
                {
                    tracing::error!(error = %e, user_id = %user.id, "failed to send reset email");
                }
            }
            None => {
                tracing::info!(user_id = %user.id, %reset_url, "SMTP not configured; reset link");
            }
        }
    }

    Ok(found("/forgot-password?success=sent"))
}

/// Display the reset password form if the token is still valid.
pub async fn reset_password_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(token): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let token_valid = match AuthService::new(state.store())
        .validate_reset_token(&token)
        .await
    {
        Ok(_) => true,
        Err(AuthError::InvalidToken | AuthError::ExpiredToken) => false,
        Err(e) => return Err(e.into()),
    };

    let error = if token_valid {
        message(query.error.as_deref())
    } else {
        message(Some("invalid_token"))
    };

    Ok(ResetPasswordTemplate {
        user,
        token,
        token_valid,
        error,
    }
    .into_response())
}

/// Set the new password and send the user to the login page.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let back = |code: &str| {
        found(&format!(
            "/reset-password/{}?error={code}",
            urlencoding::encode(&token)
        ))
    };

    if form.password != form.password_confirm {
        return Ok(back("password_mismatch"));
    }

    match AuthService::new(state.store())
        .reset_password(&token, &form.password)
        .await
    {
        Ok(_) => Ok(found("/login?success=password_reset")),
        Err(e) => Ok(back(error_code(e)?)),
    }
}
